use crate::models::{
    DietGoals, ExerciseResultRecord, Meal, NewMeal, NewWorkout, Profile, SleepEntry, SleepRecord,
    WorkoutDetails, WorkoutRecord,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::path::Path;

/// Persistence seam between a finished workout and wherever history lives.
pub trait WorkoutStore {
    fn save_workout(&mut self, workout: &NewWorkout) -> Result<i64>;
    fn load_history(&self, username: &str, limit: usize) -> Result<Vec<WorkoutRecord>>;
    fn load_details(&self, username: &str, workout_id: i64) -> Result<Option<WorkoutDetails>>;

    /// The most recent `limit` workouts, oldest first, for charting.
    fn load_calorie_series(&self, username: &str, limit: usize) -> Result<Vec<WorkoutRecord>> {
        let mut history = self.load_history(username, limit)?;
        history.reverse();
        Ok(history)
    }
}

/// Whether an upsert created a new row or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(db_path: &str) -> Result<Self> {
        let path = db_path.trim_start_matches("sqlite://");
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    rusqlite::Error::InvalidPath(format!("{}: {}", parent.display(), e).into())
                })?;
            }
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                salt TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS profile (
                id INTEGER PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                name TEXT NOT NULL,
                age INTEGER NOT NULL,
                gender TEXT NOT NULL,
                height REAL NOT NULL,
                weight REAL NOT NULL,
                daily_workout_goal INTEGER NOT NULL
            )",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS workouts (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL,
                date TEXT NOT NULL,
                level TEXT NOT NULL,
                duration REAL NOT NULL,
                calories_burned REAL NOT NULL,
                completed INTEGER NOT NULL
            )",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS workout_exercises (
                id INTEGER PRIMARY KEY,
                workout_id INTEGER NOT NULL REFERENCES workouts (id) ON DELETE CASCADE,
                exercise_name TEXT NOT NULL,
                sets INTEGER NOT NULL,
                reps INTEGER NOT NULL
            )",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS meals (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL,
                date TEXT NOT NULL,
                meal_type TEXT NOT NULL,
                food_name TEXT NOT NULL,
                calories INTEGER NOT NULL,
                protein REAL NOT NULL,
                carbs REAL NOT NULL,
                fats REAL NOT NULL
            )",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS hydration (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL,
                date TEXT NOT NULL,
                amount INTEGER NOT NULL
            )",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS diet_goals (
                id INTEGER PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                calorie_goal INTEGER NOT NULL,
                hydration_goal INTEGER NOT NULL,
                protein_goal INTEGER NOT NULL,
                carbs_goal INTEGER NOT NULL,
                fats_goal INTEGER NOT NULL
            )",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS sleep (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                date TEXT NOT NULL,
                hours REAL NOT NULL,
                quality TEXT NOT NULL,
                notes TEXT,
                UNIQUE(username, date)
            )",
            (),
        )?;

        Ok(Database { conn })
    }

    // --- Users ---

    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        salt: &str,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (username, email, password_hash, salt) VALUES (?1, ?2, ?3, ?4)",
            params![username, email, password_hash, salt],
        )?;
        Ok(())
    }

    /// Stored `(password_hash, salt)` for a user.
    pub fn get_credentials(&self, username: &str) -> Result<Option<(String, String)>> {
        self.conn
            .query_row(
                "SELECT password_hash, salt FROM users WHERE username = ?1",
                params![username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
    }

    // --- Workouts ---

    pub fn insert_workout(&mut self, workout: &NewWorkout) -> Result<i64> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO workouts (username, date, level, duration, calories_burned, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                workout.username,
                workout.date,
                workout.level,
                workout.duration_minutes,
                workout.calories_burned,
                workout.completed,
            ],
        )?;
        let workout_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO workout_exercises (workout_id, exercise_name, sets, reps)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for exercise in &workout.exercises {
                stmt.execute(params![
                    workout_id,
                    exercise.exercise_name,
                    exercise.sets,
                    exercise.reps
                ])?;
            }
        }

        tx.commit()?;
        Ok(workout_id)
    }

    fn workout_from_row(row: &Row) -> Result<WorkoutRecord> {
        Ok(WorkoutRecord {
            id: row.get(0)?,
            username: row.get(1)?,
            date: row.get(2)?,
            level: row.get(3)?,
            duration_minutes: row.get(4)?,
            calories_burned: row.get(5)?,
            completed: row.get(6)?,
        })
    }

    /// Newest first.
    pub fn get_recent_workouts(&self, username: &str, limit: usize) -> Result<Vec<WorkoutRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, date, level, duration, calories_burned, completed
             FROM workouts
             WHERE username = ?1
             ORDER BY date DESC, id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![username, limit as i64], Self::workout_from_row)?;
        rows.collect()
    }

    pub fn get_all_workouts(&self, username: &str) -> Result<Vec<WorkoutRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, date, level, duration, calories_burned, completed
             FROM workouts
             WHERE username = ?1
             ORDER BY date ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![username], Self::workout_from_row)?;
        rows.collect()
    }

    pub fn get_workout_details(
        &self,
        username: &str,
        workout_id: i64,
    ) -> Result<Option<WorkoutDetails>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, username, date, level, duration, calories_burned, completed
                 FROM workouts
                 WHERE id = ?1 AND username = ?2",
                params![workout_id, username],
                Self::workout_from_row,
            )
            .optional()?;

        let Some(record) = record else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT workout_id, exercise_name, sets, reps
             FROM workout_exercises
             WHERE workout_id = ?1
             ORDER BY id ASC",
        )?;
        let exercises = stmt
            .query_map(params![workout_id], |row| {
                Ok(ExerciseResultRecord {
                    workout_id: row.get(0)?,
                    exercise_name: row.get(1)?,
                    sets: row.get(2)?,
                    reps: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(WorkoutDetails { record, exercises }))
    }

    /// Minutes of workouts logged on a given `YYYY-MM-DD` day.
    pub fn workout_minutes_on(&self, username: &str, day: &str) -> Result<f64> {
        self.conn.query_row(
            "SELECT COALESCE(SUM(duration), 0.0) FROM workouts
             WHERE username = ?1 AND date LIKE ?2 || '%'",
            params![username, day],
            |row| row.get(0),
        )
    }

    // --- Profile ---

    pub fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        self.conn.execute(
            "INSERT INTO profile (username, name, age, gender, height, weight, daily_workout_goal)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(username) DO UPDATE SET
             name = excluded.name,
             age = excluded.age,
             gender = excluded.gender,
             height = excluded.height,
             weight = excluded.weight,
             daily_workout_goal = excluded.daily_workout_goal",
            params![
                profile.username,
                profile.name,
                profile.age,
                profile.gender,
                profile.height,
                profile.weight,
                profile.daily_workout_goal,
            ],
        )?;
        Ok(())
    }

    pub fn get_profile(&self, username: &str) -> Result<Option<Profile>> {
        self.conn
            .query_row(
                "SELECT username, name, age, gender, height, weight, daily_workout_goal
                 FROM profile WHERE username = ?1",
                params![username],
                |row| {
                    Ok(Profile {
                        username: row.get(0)?,
                        name: row.get(1)?,
                        age: row.get(2)?,
                        gender: row.get(3)?,
                        height: row.get(4)?,
                        weight: row.get(5)?,
                        daily_workout_goal: row.get(6)?,
                    })
                },
            )
            .optional()
    }

    // --- Diet ---

    pub fn insert_meal(&self, meal: &NewMeal) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO meals (username, date, meal_type, food_name, calories, protein, carbs, fats)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                meal.username,
                meal.date,
                meal.meal_type.as_str(),
                meal.food_name,
                meal.calories,
                meal.protein,
                meal.carbs,
                meal.fats,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_meals_on(&self, username: &str, day: &str) -> Result<Vec<Meal>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, meal_type, food_name, calories, protein, carbs, fats
             FROM meals
             WHERE username = ?1 AND date = ?2
             ORDER BY meal_type, id",
        )?;
        let rows = stmt.query_map(params![username, day], |row| {
            Ok(Meal {
                id: row.get(0)?,
                date: row.get(1)?,
                meal_type: row.get(2)?,
                food_name: row.get(3)?,
                calories: row.get(4)?,
                protein: row.get(5)?,
                carbs: row.get(6)?,
                fats: row.get(7)?,
            })
        })?;
        rows.collect()
    }

    /// Returns false when no meal with that id belongs to the user.
    pub fn delete_meal(&self, username: &str, meal_id: i64) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM meals WHERE id = ?1 AND username = ?2",
            params![meal_id, username],
        )?;
        Ok(deleted > 0)
    }

    /// Stored goals, or the defaults when the user never set any.
    pub fn get_diet_goals(&self, username: &str) -> Result<DietGoals> {
        let goals = self
            .conn
            .query_row(
                "SELECT calorie_goal, hydration_goal, protein_goal, carbs_goal, fats_goal
                 FROM diet_goals WHERE username = ?1",
                params![username],
                |row| {
                    Ok(DietGoals {
                        calorie_goal: row.get(0)?,
                        hydration_goal: row.get(1)?,
                        protein_goal: row.get(2)?,
                        carbs_goal: row.get(3)?,
                        fats_goal: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(goals.unwrap_or_default())
    }

    pub fn upsert_diet_goals(&self, username: &str, goals: &DietGoals) -> Result<()> {
        self.conn.execute(
            "INSERT INTO diet_goals (username, calorie_goal, hydration_goal, protein_goal, carbs_goal, fats_goal)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(username) DO UPDATE SET
             calorie_goal = excluded.calorie_goal,
             hydration_goal = excluded.hydration_goal,
             protein_goal = excluded.protein_goal,
             carbs_goal = excluded.carbs_goal,
             fats_goal = excluded.fats_goal",
            params![
                username,
                goals.calorie_goal,
                goals.hydration_goal,
                goals.protein_goal,
                goals.carbs_goal,
                goals.fats_goal,
            ],
        )?;
        Ok(())
    }

    pub fn add_water(&self, username: &str, day: &str, amount_ml: u32) -> Result<()> {
        self.conn.execute(
            "INSERT INTO hydration (username, date, amount) VALUES (?1, ?2, ?3)",
            params![username, day, amount_ml],
        )?;
        Ok(())
    }

    pub fn hydration_total_on(&self, username: &str, day: &str) -> Result<u32> {
        self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM hydration WHERE username = ?1 AND date = ?2",
            params![username, day],
            |row| row.get(0),
        )
    }

    // --- Sleep ---

    /// One record per user and day; logging the same day again replaces it.
    pub fn upsert_sleep(&mut self, entry: &SleepEntry) -> Result<Upsert> {
        let tx = self.conn.transaction()?;
        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM sleep WHERE username = ?1 AND date = ?2",
                params![entry.username, entry.date],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE sleep SET hours = ?1, quality = ?2, notes = ?3 WHERE id = ?4",
                    params![entry.hours, entry.quality.as_str(), entry.notes, id],
                )?;
                Upsert::Updated
            }
            None => {
                tx.execute(
                    "INSERT INTO sleep (username, date, hours, quality, notes)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        entry.username,
                        entry.date,
                        entry.hours,
                        entry.quality.as_str(),
                        entry.notes
                    ],
                )?;
                Upsert::Inserted
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    /// Rewrites hours, quality and notes of an existing record. False when not found.
    pub fn update_sleep(&self, username: &str, record_id: i64, entry: &SleepEntry) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE sleep SET hours = ?1, quality = ?2, notes = ?3 WHERE id = ?4 AND username = ?5",
            params![
                entry.hours,
                entry.quality.as_str(),
                entry.notes,
                record_id,
                username
            ],
        )?;
        Ok(updated > 0)
    }

    pub fn get_sleep(&self, username: &str, record_id: i64) -> Result<Option<SleepRecord>> {
        self.conn
            .query_row(
                "SELECT id, date, hours, quality, notes FROM sleep WHERE id = ?1 AND username = ?2",
                params![record_id, username],
                Self::sleep_from_row,
            )
            .optional()
    }

    pub fn delete_sleep(&self, username: &str, record_id: i64) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM sleep WHERE id = ?1 AND username = ?2",
            params![record_id, username],
        )?;
        Ok(deleted > 0)
    }

    fn sleep_from_row(row: &Row) -> Result<SleepRecord> {
        let quality: String = row.get(3)?;
        let quality = quality.parse().map_err(|q| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                Type::Text,
                format!("unknown sleep quality `{}`", q).into(),
            )
        })?;
        Ok(SleepRecord {
            id: row.get(0)?,
            date: row.get(1)?,
            hours: row.get(2)?,
            quality,
            notes: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        })
    }

    /// Newest first.
    pub fn get_sleep_history(&self, username: &str, limit: usize) -> Result<Vec<SleepRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, hours, quality, notes
             FROM sleep
             WHERE username = ?1
             ORDER BY date DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![username, limit as i64], Self::sleep_from_row)?;
        rows.collect()
    }

    /// Every record, oldest first, for analytics.
    pub fn get_all_sleep(&self, username: &str) -> Result<Vec<SleepRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, hours, quality, notes
             FROM sleep
             WHERE username = ?1
             ORDER BY date ASC",
        )?;
        let rows = stmt.query_map(params![username], Self::sleep_from_row)?;
        rows.collect()
    }
}

impl WorkoutStore for Database {
    fn save_workout(&mut self, workout: &NewWorkout) -> Result<i64> {
        self.insert_workout(workout)
    }

    fn load_history(&self, username: &str, limit: usize) -> Result<Vec<WorkoutRecord>> {
        self.get_recent_workouts(username, limit)
    }

    fn load_details(&self, username: &str, workout_id: i64) -> Result<Option<WorkoutDetails>> {
        self.get_workout_details(username, workout_id)
    }
}
