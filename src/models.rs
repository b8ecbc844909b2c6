use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Difficulty tier that selects one of the fixed exercise plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| needle.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExercisePlanEntry {
    pub name: &'static str,
    /// Repetitions per set, or seconds when `is_duration` is set.
    pub reps: u32,
    pub sets: u32,
    pub calories_per_rep: f64,
    pub is_duration: bool,
}

impl ExercisePlanEntry {
    pub fn rep_label(&self) -> String {
        format!(
            "{} {}",
            self.reps,
            if self.is_duration { "seconds" } else { "reps" }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    Completed,
    #[serde(rename = "Mostly Done")]
    MostlyDone,
    #[serde(rename = "Half Done")]
    HalfDone,
    Partial,
}

impl CompletionStatus {
    /// Thresholds are checked top-down, first match wins.
    pub fn classify(completion_percentage: f64) -> Self {
        if completion_percentage == 100.0 {
            CompletionStatus::Completed
        } else if completion_percentage >= 75.0 {
            CompletionStatus::MostlyDone
        } else if completion_percentage >= 50.0 {
            CompletionStatus::HalfDone
        } else {
            CompletionStatus::Partial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Completed => "Completed",
            CompletionStatus::MostlyDone => "Mostly Done",
            CompletionStatus::HalfDone => "Half Done",
            CompletionStatus::Partial => "Partial",
        }
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Persisted workout history ---

pub const RECORD_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub id: i64,
    pub username: String,
    pub date: String,
    pub level: String,
    pub duration_minutes: f64,
    pub calories_burned: f64,
    pub completed: bool,
}

impl WorkoutRecord {
    /// History only keeps the completed flag, so anything short of 100% reads as partial.
    pub fn status_label(&self) -> &'static str {
        if self.completed {
            CompletionStatus::Completed.as_str()
        } else {
            CompletionStatus::Partial.as_str()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseResultRecord {
    pub workout_id: i64,
    pub exercise_name: String,
    pub sets: u32,
    pub reps: u32,
}

/// A workout about to be written: the record row plus its exercise rows.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkout {
    pub username: String,
    pub date: String,
    pub level: String,
    pub duration_minutes: f64,
    pub calories_burned: f64,
    pub completed: bool,
    pub exercises: Vec<NewExerciseResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExerciseResult {
    pub exercise_name: String,
    pub sets: u32,
    pub reps: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutDetails {
    pub record: WorkoutRecord,
    pub exercises: Vec<ExerciseResultRecord>,
}

// --- Profile ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    /// Centimetres.
    pub height: f64,
    /// Kilograms.
    pub weight: f64,
    /// Minutes of exercise per day.
    pub daily_workout_goal: u32,
}

// --- Diet ---

pub const DAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        MealType::ALL
            .into_iter()
            .find(|meal| meal.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| needle.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    pub date: String,
    pub meal_type: String,
    pub food_name: String,
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMeal {
    pub username: String,
    pub date: String,
    pub meal_type: MealType,
    pub food_name: String,
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietGoals {
    /// kcal per day.
    pub calorie_goal: u32,
    /// Millilitres per day.
    pub hydration_goal: u32,
    pub protein_goal: u32,
    pub carbs_goal: u32,
    pub fats_goal: u32,
}

impl Default for DietGoals {
    fn default() -> Self {
        Self {
            calorie_goal: 2000,
            hydration_goal: 2000,
            protein_goal: 50,
            carbs_goal: 250,
            fats_goal: 70,
        }
    }
}

// --- Sleep ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SleepQuality {
    Good,
    Average,
    Poor,
}

impl SleepQuality {
    pub const ALL: [SleepQuality; 3] = [SleepQuality::Good, SleepQuality::Average, SleepQuality::Poor];

    pub fn as_str(&self) -> &'static str {
        match self {
            SleepQuality::Good => "Good",
            SleepQuality::Average => "Average",
            SleepQuality::Poor => "Poor",
        }
    }
}

impl fmt::Display for SleepQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SleepQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        SleepQuality::ALL
            .into_iter()
            .find(|q| q.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| needle.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    pub id: i64,
    /// `YYYY-MM-DD`, one record per user per day.
    pub date: String,
    pub hours: f64,
    pub quality: SleepQuality,
    pub notes: String,
}

/// A validated night of sleep, ready to be upserted.
#[derive(Debug, Clone, PartialEq)]
pub struct SleepEntry {
    pub username: String,
    pub date: String,
    pub hours: f64,
    pub quality: SleepQuality,
    pub notes: String,
}
