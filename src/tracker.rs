use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{
    CompletionStatus, ExercisePlanEntry, Level, NewExerciseResult, NewWorkout, RECORD_DATE_FORMAT,
};
use crate::plans;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("a {0} workout is already in progress")]
    StartWhileActive(Level),
    #[error("unknown workout level `{0}` (expected Beginner, Intermediate or Advanced)")]
    UnknownLevel(String),
    #[error("no workout in progress")]
    CompleteSetWhenNotActive,
    #[error(
        "`{name}` is not part of the current workout{}",
        .suggestion.as_ref().map(|s| format!(" (did you mean `{s}`?)")).unwrap_or_default()
    )]
    UnknownExercise {
        name: String,
        suggestion: Option<String>,
    },
    #[error("no workout in progress to end")]
    EndWhenNotActive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseProgress {
    pub name: String,
    pub target_sets: u32,
    pub completed_sets: u32,
    pub reps: u32,
    pub calories_per_rep: f64,
    pub is_duration: bool,
}

impl ExerciseProgress {
    fn from_plan(entry: &ExercisePlanEntry) -> Self {
        Self {
            name: entry.name.to_string(),
            target_sets: entry.sets,
            completed_sets: 0,
            reps: entry.reps,
            calories_per_rep: entry.calories_per_rep,
            is_duration: entry.is_duration,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed_sets >= self.target_sets
    }

    pub fn calories(&self) -> f64 {
        self.reps as f64 * self.calories_per_rep * self.completed_sets as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutSession {
    pub level: Level,
    pub started_at: DateTime<Local>,
    pub exercises: Vec<ExerciseProgress>,
}

impl WorkoutSession {
    pub fn completed_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.completed_sets).sum()
    }

    pub fn target_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.target_sets).sum()
    }

    /// Always recomputed from the per-exercise counters.
    pub fn calories_burned(&self) -> f64 {
        self.exercises.iter().map(ExerciseProgress::calories).sum()
    }

    pub fn completion_percentage(&self) -> f64 {
        let target = self.target_sets();
        if target == 0 {
            return 0.0;
        }
        self.completed_sets() as f64 / target as f64 * 100.0
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            level: self.level,
            completed_sets: self.completed_sets(),
            target_sets: self.target_sets(),
            progress_percentage: self.completion_percentage(),
            calories_burned: self.calories_burned(),
            exercises: self.exercises.clone(),
        }
    }
}

/// What the display side renders after every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub level: Level,
    pub completed_sets: u32,
    pub target_sets: u32,
    pub progress_percentage: f64,
    pub calories_burned: f64,
    pub exercises: Vec<ExerciseProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseResult {
    pub name: String,
    pub completed_sets: u32,
    pub target_sets: u32,
    pub reps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutSummary {
    pub level: Level,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    pub duration_minutes: f64,
    pub calories_burned: f64,
    pub completion_percentage: f64,
    pub status: CompletionStatus,
    pub exercises: Vec<ExerciseResult>,
}

impl WorkoutSummary {
    /// Shape the summary into the rows the history store keeps.
    pub fn to_new_workout(&self, username: &str) -> NewWorkout {
        NewWorkout {
            username: username.to_string(),
            date: self.ended_at.format(RECORD_DATE_FORMAT).to_string(),
            level: self.level.to_string(),
            duration_minutes: self.duration_minutes,
            calories_burned: self.calories_burned,
            completed: self.status == CompletionStatus::Completed,
            exercises: self
                .exercises
                .iter()
                .map(|e| NewExerciseResult {
                    exercise_name: e.name.clone(),
                    sets: e.completed_sets,
                    reps: e.reps,
                })
                .collect(),
        }
    }
}

/// Owns the single active workout, if any.
#[derive(Debug, Default)]
pub struct WorkoutTracker {
    active: Option<WorkoutSession>,
}

impl WorkoutTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn session(&self) -> Option<&WorkoutSession> {
        self.active.as_ref()
    }

    pub fn snapshot(&self) -> Option<ProgressSnapshot> {
        self.active.as_ref().map(WorkoutSession::snapshot)
    }

    pub fn start(&mut self, level: &str) -> Result<&WorkoutSession, TrackerError> {
        self.start_at(level, Local::now())
    }

    pub fn start_at(
        &mut self,
        level: &str,
        now: DateTime<Local>,
    ) -> Result<&WorkoutSession, TrackerError> {
        if let Some(active) = &self.active {
            return Err(TrackerError::StartWhileActive(active.level));
        }
        let level: Level = level.parse().map_err(TrackerError::UnknownLevel)?;

        let exercises = plans::plan_for(level)
            .iter()
            .map(ExerciseProgress::from_plan)
            .collect();

        info!("Starting {} workout", level);
        Ok(self.active.insert(WorkoutSession {
            level,
            started_at: now,
            exercises,
        }))
    }

    /// Marks one more set done. Once an exercise reaches its target the call
    /// is accepted and leaves the counter where it is.
    pub fn complete_set(&mut self, exercise_name: &str) -> Result<ProgressSnapshot, TrackerError> {
        let session = self
            .active
            .as_mut()
            .ok_or(TrackerError::CompleteSetWhenNotActive)?;

        let names = session.exercises.iter().map(|e| e.name.as_str());
        let idx = match plans::find_exercise(exercise_name, names.clone()) {
            Some(idx) => idx,
            None => {
                return Err(TrackerError::UnknownExercise {
                    name: exercise_name.to_string(),
                    suggestion: plans::suggest_exercise(exercise_name, names).map(str::to_string),
                })
            }
        };

        let exercise = &mut session.exercises[idx];
        if exercise.is_complete() {
            debug!("{} already at {} sets, ignoring", exercise.name, exercise.target_sets);
        } else {
            exercise.completed_sets += 1;
            debug!(
                "{}: set {}/{}",
                exercise.name, exercise.completed_sets, exercise.target_sets
            );
        }

        Ok(session.snapshot())
    }

    /// Computes what `end_at(now)` would return without clearing the session,
    /// so a caller can persist first and only end once the write succeeded.
    pub fn summarize_at(&self, now: DateTime<Local>) -> Result<WorkoutSummary, TrackerError> {
        let session = self.active.as_ref().ok_or(TrackerError::EndWhenNotActive)?;

        let elapsed_ms = (now - session.started_at).num_milliseconds().max(0);
        let completion_percentage = session.completion_percentage();

        Ok(WorkoutSummary {
            level: session.level,
            started_at: session.started_at,
            ended_at: now,
            duration_minutes: elapsed_ms as f64 / 60_000.0,
            calories_burned: session.calories_burned(),
            completion_percentage,
            status: CompletionStatus::classify(completion_percentage),
            exercises: session
                .exercises
                .iter()
                .map(|e| ExerciseResult {
                    name: e.name.clone(),
                    completed_sets: e.completed_sets,
                    target_sets: e.target_sets,
                    reps: e.reps,
                })
                .collect(),
        })
    }

    pub fn end(&mut self) -> Result<WorkoutSummary, TrackerError> {
        self.end_at(Local::now())
    }

    pub fn end_at(&mut self, now: DateTime<Local>) -> Result<WorkoutSummary, TrackerError> {
        let summary = self.summarize_at(now)?;
        self.active = None;
        info!(
            "Ended {} workout: {:.1} min, {:.1} kcal, {}",
            summary.level, summary.duration_minutes, summary.calories_burned, summary.status
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn complete_all(tracker: &mut WorkoutTracker, name: &str, times: usize) -> ProgressSnapshot {
        let mut last = None;
        for _ in 0..times {
            last = Some(tracker.complete_set(name).unwrap());
        }
        last.expect("at least one set")
    }

    #[test]
    fn start_builds_one_record_per_plan_entry() {
        for level in Level::ALL {
            let mut tracker = WorkoutTracker::new();
            let session = tracker.start(level.as_str()).unwrap();
            let plan = plans::plan_for(level);
            assert_eq!(session.exercises.len(), plan.len());
            for (progress, entry) in session.exercises.iter().zip(plan) {
                assert_eq!(progress.name, entry.name);
                assert_eq!(progress.completed_sets, 0);
                assert_eq!(progress.target_sets, entry.sets);
                assert_eq!(progress.reps, entry.reps);
            }
        }
    }

    #[test]
    fn start_rejects_unknown_level_and_second_session() {
        let mut tracker = WorkoutTracker::new();
        assert_eq!(
            tracker.start("Expert").unwrap_err(),
            TrackerError::UnknownLevel("Expert".to_string())
        );
        assert!(!tracker.is_active());

        tracker.start("Beginner").unwrap();
        assert_eq!(
            tracker.start("Advanced").unwrap_err(),
            TrackerError::StartWhileActive(Level::Beginner)
        );
        assert_eq!(tracker.session().unwrap().level, Level::Beginner);
    }

    #[test]
    fn idle_tracker_rejects_sets_and_end() {
        let mut tracker = WorkoutTracker::new();
        assert_eq!(
            tracker.complete_set("Push-ups").unwrap_err(),
            TrackerError::CompleteSetWhenNotActive
        );
        assert_eq!(tracker.end().unwrap_err(), TrackerError::EndWhenNotActive);
        assert!(tracker.snapshot().is_none());
    }

    #[test]
    fn unknown_exercise_carries_suggestion() {
        let mut tracker = WorkoutTracker::new();
        tracker.start("Beginner").unwrap();

        let err = tracker.complete_set("Crunchs").unwrap_err();
        assert_eq!(
            err,
            TrackerError::UnknownExercise {
                name: "Crunchs".to_string(),
                suggestion: Some("Crunches".to_string()),
            }
        );
        assert!(err.to_string().contains("did you mean `Crunches`"));

        let err = tracker.complete_set("Burpees").unwrap_err();
        assert!(matches!(err, TrackerError::UnknownExercise { suggestion: None, .. }));
    }

    #[test]
    fn completing_beyond_target_saturates() {
        let mut tracker = WorkoutTracker::new();
        tracker.start("Beginner").unwrap();

        let snapshot = complete_all(&mut tracker, "Push-ups", 10);
        let push_ups = &snapshot.exercises[0];
        assert_eq!(push_ups.completed_sets, 3);
        assert!(approx(snapshot.calories_burned, 15.0));
        assert_eq!(snapshot.completed_sets, 3);
    }

    #[test]
    fn lenient_name_matching() {
        let mut tracker = WorkoutTracker::new();
        tracker.start("Beginner").unwrap();
        let snapshot = tracker.complete_set("jumping jacks").unwrap();
        assert_eq!(snapshot.exercises[3].completed_sets, 1);
    }

    #[test]
    fn calories_match_recomputation_for_any_sequence() {
        let mut tracker = WorkoutTracker::new();
        tracker.start("Intermediate").unwrap();
        let order = [
            "Burpees", "Plank", "Burpees", "Lunges", "Squats", "Burpees", "Burpees", "Plank",
            "Mountain Climbers", "Push-ups",
        ];

        let mut counted: std::collections::HashMap<&str, u32> = Default::default();
        for name in order {
            let snapshot = tracker.complete_set(name).unwrap();
            let entry = plans::plan_for(Level::Intermediate)
                .iter()
                .find(|e| e.name == name)
                .unwrap();
            let count = counted.entry(name).or_default();
            *count = (*count + 1).min(entry.sets);

            let expected: f64 = plans::plan_for(Level::Intermediate)
                .iter()
                .map(|e| {
                    e.reps as f64 * e.calories_per_rep * *counted.get(e.name).unwrap_or(&0) as f64
                })
                .sum();
            assert!(approx(snapshot.calories_burned, expected));
        }
        // Burpees target is 3, the fourth call saturated.
        assert_eq!(counted["Burpees"], 3);
    }

    #[test]
    fn progress_is_monotonic_and_reaches_100_only_when_done() {
        let mut tracker = WorkoutTracker::new();
        tracker.start("Beginner").unwrap();

        let mut previous = 0.0;
        for entry in plans::plan_for(Level::Beginner) {
            for _ in 0..entry.sets + 1 {
                let snapshot = tracker.complete_set(entry.name).unwrap();
                assert!(snapshot.progress_percentage >= previous);
                previous = snapshot.progress_percentage;
                let all_done = snapshot.exercises.iter().all(ExerciseProgress::is_complete);
                assert_eq!(snapshot.progress_percentage == 100.0, all_done);
            }
        }
        assert_eq!(previous, 100.0);
    }

    #[test]
    fn eight_of_fifteen_sets_is_half_done() {
        let mut tracker = WorkoutTracker::new();
        tracker.start("Beginner").unwrap();
        complete_all(&mut tracker, "Push-ups", 3);
        complete_all(&mut tracker, "Squats", 3);
        complete_all(&mut tracker, "Plank", 2);

        let summary = tracker.end().unwrap();
        assert!((summary.completion_percentage - 53.333).abs() < 0.01);
        assert_eq!(summary.status, CompletionStatus::HalfDone);
        assert!(!tracker.is_active());
    }

    #[test]
    fn full_beginner_session() {
        let mut tracker = WorkoutTracker::new();
        tracker.start("Beginner").unwrap();

        let snapshot = complete_all(&mut tracker, "Push-ups", 3);
        assert!(approx(snapshot.calories_burned, 15.0));

        for name in ["Squats", "Plank", "Jumping Jacks", "Crunches"] {
            complete_all(&mut tracker, name, 3);
        }

        let summary = tracker.end().unwrap();
        assert_eq!(summary.completion_percentage, 100.0);
        assert_eq!(summary.status, CompletionStatus::Completed);
        assert!(approx(summary.calories_burned, 105.0));
        assert_eq!(summary.exercises.len(), 5);
        assert!(summary.exercises.iter().all(|e| e.completed_sets == 3));
    }

    #[test]
    fn duration_follows_clock() {
        let mut tracker = WorkoutTracker::new();
        let start = Local::now();
        tracker.start_at("Advanced", start).unwrap();

        let summary = tracker
            .end_at(start + Duration::seconds(90))
            .unwrap();
        assert!(approx(summary.duration_minutes, 1.5));
        assert_eq!(summary.status, CompletionStatus::Partial);
    }

    #[test]
    fn duration_never_negative() {
        let mut tracker = WorkoutTracker::new();
        let start = Local::now();
        tracker.start_at("Beginner", start).unwrap();
        let summary = tracker.end_at(start - Duration::seconds(5)).unwrap();
        assert_eq!(summary.duration_minutes, 0.0);
    }

    #[test]
    fn wall_clock_duration_is_small_and_non_negative() {
        let mut tracker = WorkoutTracker::new();
        tracker.start("Beginner").unwrap();
        let summary = tracker.end().unwrap();
        assert!(summary.duration_minutes >= 0.0);
        assert!(summary.duration_minutes < 1.0);
    }

    #[test]
    fn summarize_keeps_session_active() {
        let mut tracker = WorkoutTracker::new();
        let start = Local::now();
        tracker.start_at("Beginner", start).unwrap();
        tracker.complete_set("Squats").unwrap();

        let now = start + Duration::minutes(10);
        let preview = tracker.summarize_at(now).unwrap();
        assert!(tracker.is_active());
        assert_eq!(tracker.end_at(now).unwrap(), preview);
    }

    #[test]
    fn summary_maps_to_history_rows() {
        let mut tracker = WorkoutTracker::new();
        let start = Local::now();
        tracker.start_at("Beginner", start).unwrap();
        complete_all(&mut tracker, "Push-ups", 2);
        let summary = tracker.end_at(start + Duration::minutes(20)).unwrap();

        let row = summary.to_new_workout("ana");
        assert_eq!(row.username, "ana");
        assert_eq!(row.level, "Beginner");
        assert!(!row.completed);
        assert!(approx(row.duration_minutes, 20.0));
        assert_eq!(row.exercises.len(), 5);
        assert_eq!(row.exercises[0].sets, 2);
        assert_eq!(row.exercises[0].reps, 10);
        assert_eq!(row.date.len(), "2024-01-01 00:00:00".len());
    }
}
