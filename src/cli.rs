use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fitness_tracker", version, about = "Track workouts, diet, sleep and profile")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Account to act as; commands that need one prompt for the password.
    #[arg(global = true, short, long, env = "FITNESS_USER")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account
    Register {
        /// Email address for the new account
        #[arg(short, long)]
        email: String,
    },

    /// Check credentials
    Login,

    /// List workout levels and their exercises
    Plans {
        /// Show a single level
        level: Option<String>,
    },

    /// Run an interactive workout session
    #[command(visible_alias = "w")]
    Workout,

    /// Recent workouts and a calories chart
    #[command(visible_alias = "h")]
    History {
        /// Number of workouts to show (defaults to the configured limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Details of a single workout
    Show {
        /// Workout id, as listed by `history`
        id: i64,
    },

    /// Write the full workout history as CSV
    Export {
        /// Output file
        path: PathBuf,
    },

    /// View or edit the profile
    #[command(subcommand)]
    Profile(ProfileCmd),

    /// Meals, diet goals and hydration
    #[command(subcommand)]
    Diet(DietCmd),

    /// Sleep log and analytics
    #[command(subcommand)]
    Sleep(SleepCmd),

    /// Serve the JSON API for the logged-in user
    Serve,
}

#[derive(Subcommand)]
pub enum ProfileCmd {
    /// Show profile, BMI and today's goal progress
    Show,

    /// Create or replace the profile
    Set(ProfileArgs),
}

#[derive(Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub age: u32,

    #[arg(long)]
    pub gender: String,

    /// Height in centimetres
    #[arg(long)]
    pub height: f64,

    /// Weight in kilograms
    #[arg(long)]
    pub weight: f64,

    /// Minutes of exercise per day to aim for
    #[arg(long, default_value = "30")]
    pub daily_workout_goal: u32,
}

#[derive(Subcommand)]
pub enum DietCmd {
    /// Meals, calories, macros and hydration for a day
    Show {
        /// YYYY-MM-DD, defaults to today
        #[arg(short, long)]
        date: Option<String>,
    },

    /// List the common foods available to `quick`
    Foods,

    /// Log a meal
    Add(MealArgs),

    /// Log a common food by its number in `foods`
    Quick {
        number: usize,

        /// Breakfast, Lunch, Dinner or Snack
        #[arg(short, long, default_value = "Breakfast")]
        meal: String,

        #[arg(short, long)]
        date: Option<String>,
    },

    /// Remove a meal by id
    Delete { id: i64 },

    /// Change the daily calorie and/or hydration goal
    Goal {
        /// kcal per day
        #[arg(long)]
        calories: Option<u32>,

        /// Millilitres per day
        #[arg(long)]
        hydration: Option<u32>,
    },

    /// Record water intake in millilitres
    Water {
        amount: u32,

        #[arg(short, long)]
        date: Option<String>,
    },
}

#[derive(Args)]
pub struct MealArgs {
    /// Breakfast, Lunch, Dinner or Snack
    #[arg(short, long, default_value = "Breakfast")]
    pub meal: String,

    #[arg(long)]
    pub food: String,

    #[arg(long, default_value = "0")]
    pub calories: u32,

    /// Grams
    #[arg(long, default_value = "0")]
    pub protein: f64,

    /// Grams
    #[arg(long, default_value = "0")]
    pub carbs: f64,

    /// Grams
    #[arg(long, default_value = "0")]
    pub fats: f64,

    /// YYYY-MM-DD, defaults to today
    #[arg(short, long)]
    pub date: Option<String>,
}

#[derive(Subcommand)]
pub enum SleepCmd {
    /// Record a night; logging the same date again replaces it
    Log(SleepArgs),

    /// Change hours, quality and notes of a record
    Edit {
        id: i64,

        #[command(flatten)]
        night: NightArgs,
    },

    /// Remove a record by id
    Delete { id: i64 },

    /// Recent nights, newest first
    History {
        #[arg(short, long, default_value = "30")]
        limit: usize,
    },

    /// Averages, consistency and recommendations
    Stats,
}

#[derive(Args)]
pub struct SleepArgs {
    /// YYYY-MM-DD, defaults to today
    #[arg(short, long)]
    pub date: Option<String>,

    #[command(flatten)]
    pub night: NightArgs,
}

#[derive(Args)]
pub struct NightArgs {
    #[arg(long)]
    pub hours: u32,

    /// 0, 15, 30 or 45
    #[arg(long, default_value = "0")]
    pub minutes: u32,

    /// Good, Average or Poor
    #[arg(short, long, default_value = "Average")]
    pub quality: String,

    #[arg(short, long, default_value = "")]
    pub notes: String,
}
