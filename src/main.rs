mod api;
mod auth;
mod cli;
mod config;
mod console;
mod db;
mod diet;
mod history;
mod models;
mod plans;
mod profile;
mod sleep;
mod tracker;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::auth::{Authenticator, Registration};
use crate::cli::{Cli, Commands, DietCmd, ProfileCmd, SleepCmd};
use crate::config::AppConfig;
use crate::db::{Database, Upsert, WorkoutStore};
use crate::diet::MealInput;
use crate::models::{Level, MealType, SleepQuality, DAY_FORMAT};
use crate::profile::ProfileInput;
use crate::sleep::SleepInput;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;

    let mut database = Database::open(&config.database_url)
        .with_context(|| format!("Failed to open database at {}", config.database_url))?;
    let authenticator = Authenticator::from_config(&config);

    match cli.cmd {
        Commands::Register { email } => {
            let username = require_user(&cli.user)?;
            let password = rpassword::prompt_password("Password: ")?;
            let confirm_password = rpassword::prompt_password("Confirm password: ")?;
            authenticator.register(
                &database,
                &Registration {
                    username,
                    email: &email,
                    password: &password,
                    confirm_password: &confirm_password,
                },
            )?;
            println!("Account created successfully! You can now log in.");
        }

        Commands::Login => {
            let username = login(&authenticator, &database, &cli.user)?;
            println!("Login successful! Welcome back, {}.", username);
        }

        Commands::Plans { level } => match level {
            Some(level) => {
                let level: Level = level
                    .parse()
                    .map_err(|l| anyhow!("unknown workout level `{}`", l))?;
                print!("{}", plans::render_plan(level));
            }
            None => {
                for level in Level::ALL {
                    print!("{}", plans::render_plan(level));
                }
            }
        },

        Commands::Workout => {
            let username = login(&authenticator, &database, &cli.user)?;
            let stdin = std::io::stdin();
            console::Console::new(&mut database, &username, stdin.lock(), std::io::stdout())
                .with_history(config.history_limit, config.chart_width)
                .run()?;
        }

        Commands::History { limit } => {
            let username = login(&authenticator, &database, &cli.user)?;
            let limit = limit.unwrap_or(config.history_limit);
            let recent = database.get_recent_workouts(&username, limit)?;
            print!("{}", history::render_history_table(&recent));
            let series = database.load_calorie_series(&username, limit)?;
            print!("{}", history::render_calorie_chart(&series, config.chart_width));
        }

        Commands::Show { id } => {
            let username = login(&authenticator, &database, &cli.user)?;
            let details = database
                .get_workout_details(&username, id)?
                .ok_or_else(|| anyhow!("workout {} not found", id))?;
            print!("{}", history::render_details(&details));
        }

        Commands::Export { path } => {
            let username = login(&authenticator, &database, &cli.user)?;
            let all = database.get_all_workouts(&username)?;
            let written = history::export_csv(&path, &all)?;
            println!("Exported {} workouts to {}", written, path.display());
        }

        Commands::Profile(cmd) => {
            let username = login(&authenticator, &database, &cli.user)?;
            match cmd {
                ProfileCmd::Show => match database.get_profile(&username)? {
                    Some(profile) => {
                        let minutes = database.workout_minutes_on(&username, &today())?;
                        print!("{}", profile::render_profile(&profile, minutes));
                    }
                    None => println!("No profile yet. Create one with `profile set`."),
                },
                ProfileCmd::Set(args) => {
                    let profile = ProfileInput {
                        name: args.name,
                        age: args.age,
                        gender: args.gender,
                        height: args.height,
                        weight: args.weight,
                        daily_workout_goal: args.daily_workout_goal,
                    }
                    .validate(&username)?;
                    database
                        .upsert_profile(&profile)
                        .context("Could not save profile")?;
                    println!("Profile saved.");
                }
            }
        }

        Commands::Diet(cmd) => {
            let username = login(&authenticator, &database, &cli.user)?;
            run_diet(&database, &username, cmd)?;
        }

        Commands::Sleep(cmd) => {
            let username = login(&authenticator, &database, &cli.user)?;
            run_sleep(&mut database, &username, cmd)?;
        }

        Commands::Serve => {
            let username = login(&authenticator, &database, &cli.user)?;
            let state = api::ApiState::new(database, &username, &config);
            api::run_server(state, &config).await?;
        }
    }

    Ok(())
}

fn require_user(user: &Option<String>) -> Result<&str> {
    user.as_deref()
        .ok_or_else(|| anyhow!("this command needs an account; pass --user <name>"))
}

fn login(authenticator: &Authenticator, database: &Database, user: &Option<String>) -> Result<String> {
    let username = require_user(user)?;
    let password = rpassword::prompt_password(format!("Password for {}: ", username))?;
    Ok(authenticator.login(database, username, &password)?)
}

fn today() -> String {
    chrono::Local::now().format(DAY_FORMAT).to_string()
}

/// A `YYYY-MM-DD` argument, or today when absent.
fn day_or_today(date: Option<String>) -> Result<String> {
    match date {
        Some(date) => {
            let date = date.trim();
            chrono::NaiveDate::parse_from_str(date, DAY_FORMAT)
                .with_context(|| format!("invalid date `{}`, expected YYYY-MM-DD", date))?;
            Ok(date.to_string())
        }
        None => Ok(today()),
    }
}

fn parse_meal_type(meal: &str) -> Result<MealType> {
    meal.parse()
        .map_err(|m| anyhow!("unknown meal type `{}` (Breakfast, Lunch, Dinner, Snack)", m))
}

fn parse_quality(quality: &str) -> Result<SleepQuality> {
    quality
        .parse()
        .map_err(|q| anyhow!("unknown sleep quality `{}` (Good, Average, Poor)", q))
}

fn run_diet(database: &Database, username: &str, cmd: DietCmd) -> Result<()> {
    match cmd {
        DietCmd::Show { date } => {
            let day = day_or_today(date)?;
            let meals = database.get_meals_on(username, &day)?;
            let goals = database.get_diet_goals(username)?;
            let water = database.hydration_total_on(username, &day)?;
            print!("{}", diet::render_day(&day, &meals, &goals, water));
        }
        DietCmd::Foods => print!("{}", diet::render_foods()),
        DietCmd::Add(args) => {
            let day = day_or_today(args.date)?;
            let meal = MealInput {
                meal_type: parse_meal_type(&args.meal)?,
                food_name: args.food,
                calories: args.calories,
                protein: args.protein,
                carbs: args.carbs,
                fats: args.fats,
            }
            .validate(username, &day)?;
            let id = database.insert_meal(&meal).context("Could not save meal")?;
            println!("Logged {} as meal #{} on {}.", meal.food_name, id, day);
        }
        DietCmd::Quick { number, meal, date } => {
            let day = day_or_today(date)?;
            let meal = MealInput::common(parse_meal_type(&meal)?, number)?.validate(username, &day)?;
            let id = database.insert_meal(&meal).context("Could not save meal")?;
            println!("Logged {} as meal #{} on {}.", meal.food_name, id, day);
        }
        DietCmd::Delete { id } => {
            if !database.delete_meal(username, id)? {
                return Err(anyhow!("meal {} not found", id));
            }
            println!("Meal #{} deleted.", id);
        }
        DietCmd::Goal {
            calories,
            hydration,
        } => {
            let current = database.get_diet_goals(username)?;
            let goals = diet::update_goals(current, calories, hydration)?;
            database
                .upsert_diet_goals(username, &goals)
                .context("Could not save diet goals")?;
            println!(
                "Daily goals: {} kcal, {} ml water.",
                goals.calorie_goal, goals.hydration_goal
            );
        }
        DietCmd::Water { amount, date } => {
            let day = day_or_today(date)?;
            let amount = diet::validate_water(amount)?;
            database.add_water(username, &day, amount)?;
            let total = database.hydration_total_on(username, &day)?;
            let goal = database.get_diet_goals(username)?.hydration_goal;
            println!("Hydration on {}: {}/{} ml", day, total, goal);
        }
    }
    Ok(())
}

fn run_sleep(database: &mut Database, username: &str, cmd: SleepCmd) -> Result<()> {
    match cmd {
        SleepCmd::Log(args) => {
            let entry = SleepInput {
                date: day_or_today(args.date)?,
                hours: args.night.hours,
                minutes: args.night.minutes,
                quality: parse_quality(&args.night.quality)?,
                notes: args.night.notes,
            }
            .validate(username)?;
            match database.upsert_sleep(&entry)? {
                Upsert::Inserted => println!("Sleep record saved successfully!"),
                Upsert::Updated => println!("Sleep record updated successfully!"),
            }
        }
        SleepCmd::Edit { id, night } => {
            let existing = database
                .get_sleep(username, id)?
                .ok_or_else(|| anyhow!("sleep record {} not found", id))?;
            let entry = SleepInput {
                date: existing.date,
                hours: night.hours,
                minutes: night.minutes,
                quality: parse_quality(&night.quality)?,
                notes: night.notes,
            }
            .validate(username)?;
            if !database.update_sleep(username, id, &entry)? {
                return Err(anyhow!("sleep record {} not found", id));
            }
            println!("Sleep record updated successfully!");
        }
        SleepCmd::Delete { id } => {
            if !database.delete_sleep(username, id)? {
                return Err(anyhow!("sleep record {} not found", id));
            }
            println!("Sleep record deleted successfully!");
        }
        SleepCmd::History { limit } => {
            let records = database.get_sleep_history(username, limit)?;
            print!("{}", sleep::render_history(&records));
        }
        SleepCmd::Stats => {
            let records = database.get_all_sleep(username)?;
            print!("{}", sleep::render_analytics(&records));
        }
    }
    Ok(())
}
