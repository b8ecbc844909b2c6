use crate::models::{ExercisePlanEntry, Level};
use strsim::levenshtein;

const fn entry(
    name: &'static str,
    reps: u32,
    sets: u32,
    calories_per_rep: f64,
    is_duration: bool,
) -> ExercisePlanEntry {
    ExercisePlanEntry {
        name,
        reps,
        sets,
        calories_per_rep,
        is_duration,
    }
}

const BEGINNER: &[ExercisePlanEntry] = &[
    entry("Push-ups", 10, 3, 0.5, false),
    entry("Squats", 15, 3, 0.6, false),
    entry("Plank", 30, 3, 0.4, true),
    entry("Jumping Jacks", 20, 3, 0.3, false),
    entry("Crunches", 12, 3, 0.25, false),
];

const INTERMEDIATE: &[ExercisePlanEntry] = &[
    entry("Push-ups", 15, 4, 0.5, false),
    entry("Squats", 20, 4, 0.6, false),
    entry("Plank", 45, 4, 0.4, true),
    entry("Burpees", 12, 3, 1.0, false),
    entry("Mountain Climbers", 30, 3, 0.3, false),
    entry("Lunges", 10, 3, 0.4, false),
];

const ADVANCED: &[ExercisePlanEntry] = &[
    entry("Push-ups", 25, 4, 0.5, false),
    entry("Squats", 30, 4, 0.6, false),
    entry("Plank", 60, 3, 0.4, true),
    entry("Burpees", 20, 4, 1.0, false),
    entry("Pull-ups", 8, 3, 1.0, false),
    entry("Box Jumps", 15, 4, 0.7, false),
    entry("Diamond Push-ups", 12, 3, 0.6, false),
];

/// Maximum edit distance accepted for a "did you mean" suggestion.
const SUGGESTION_DISTANCE: usize = 3;

pub fn plan_for(level: Level) -> &'static [ExercisePlanEntry] {
    match level {
        Level::Beginner => BEGINNER,
        Level::Intermediate => INTERMEDIATE,
        Level::Advanced => ADVANCED,
    }
}

pub fn total_sets(plan: &[ExercisePlanEntry]) -> u32 {
    plan.iter().map(|e| e.sets).sum()
}

/// Calories for the whole plan when every set is done.
pub fn full_calories(plan: &[ExercisePlanEntry]) -> f64 {
    plan.iter()
        .map(|e| e.reps as f64 * e.calories_per_rep * e.sets as f64)
        .sum()
}

pub fn render_plan(level: Level) -> String {
    let plan = plan_for(level);
    let mut out = format!(
        "{} ({} exercises, {} sets, up to {:.1} kcal)\n",
        level,
        plan.len(),
        total_sets(plan),
        full_calories(plan)
    );
    for entry in plan {
        out.push_str(&format!(
            "  {:<18} {} sets of {}\n",
            entry.name,
            entry.sets,
            entry.rep_label()
        ));
    }
    out
}

fn normalize(name: &str) -> String {
    name.trim()
        .to_uppercase()
        .replace([' ', '-', '_'], "")
}

/// Finds `input` among `names`: exact match first, then ignoring case,
/// spaces, dashes and underscores ("push ups" finds "Push-ups").
pub fn find_exercise<'a, I>(input: &str, names: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    if let Some(idx) = names.clone().into_iter().position(|n| n == input) {
        return Some(idx);
    }
    let wanted = normalize(input);
    names.into_iter().position(|n| normalize(n) == wanted)
}

/// Closest name within a small edit distance, used for error hints.
pub fn suggest_exercise<'a, I>(input: &str, names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let wanted = normalize(input);
    let mut best: Option<(&'a str, usize)> = None;

    for name in names {
        let distance = levenshtein(&wanted, &normalize(name));
        if distance <= SUGGESTION_DISTANCE && best.map_or(true, |(_, d)| distance < d) {
            best = Some((name, distance));
        }
    }

    if let Some((name, distance)) = best {
        tracing::debug!("Fuzzy match: '{}' -> '{}' (distance: {})", input, name, distance);
    }
    best.map(|(name, _)| name)
}
