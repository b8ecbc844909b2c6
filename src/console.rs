use anyhow::Result;
use chrono::Local;
use std::io::{BufRead, Write};
use tracing::error;

use crate::db::WorkoutStore;
use crate::history;
use crate::models::Level;
use crate::plans;
use crate::tracker::{ProgressSnapshot, WorkoutSummary, WorkoutTracker};

const PROGRESS_WIDTH: usize = 30;

const HELP: &str = "\
Commands:
  plans                 list workout levels
  start <level>         begin a workout (Beginner, Intermediate, Advanced)
  set <exercise|number> complete one set of an exercise
  status                show current progress
  end                   finish and save the workout
  history               recent workouts and calories chart
  help                  show this message
  quit                  leave the console
";

pub fn progress_bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

/// Line-oriented workout console: each command runs to completion before the
/// next line is read.
pub struct Console<'a, S, R, W> {
    tracker: WorkoutTracker,
    store: &'a mut S,
    username: String,
    history_limit: usize,
    chart_width: usize,
    input: R,
    out: W,
}

impl<'a, S, R, W> Console<'a, S, R, W>
where
    S: WorkoutStore,
    R: BufRead,
    W: Write,
{
    pub fn new(store: &'a mut S, username: &str, input: R, out: W) -> Self {
        Self {
            tracker: WorkoutTracker::new(),
            store,
            username: username.to_string(),
            history_limit: 10,
            chart_width: 40,
            input,
            out,
        }
    }

    pub fn with_history(mut self, limit: usize, chart_width: usize) -> Self {
        self.history_limit = limit;
        self.chart_width = chart_width;
        self
    }

    pub fn run(&mut self) -> Result<()> {
        writeln!(self.out, "Welcome, {}! Type `help` for commands.", self.username)?;

        let mut line = String::new();
        loop {
            write!(self.out, "> ")?;
            self.out.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }

            let trimmed = line.trim();
            let (command, arg) = match trimmed.split_once(char::is_whitespace) {
                Some((cmd, rest)) => (cmd, rest.trim()),
                None => (trimmed, ""),
            };

            match command.to_ascii_lowercase().as_str() {
                "" => continue,
                "help" | "?" => write!(self.out, "{}", HELP)?,
                "plans" => self.show_plans()?,
                "start" => self.start(arg)?,
                "set" | "s" | "done" => self.complete_set(arg)?,
                "status" => self.status()?,
                "end" => self.end()?,
                "history" => self.show_history()?,
                "quit" | "exit" | "q" => break,
                other => writeln!(self.out, "Unknown command `{}`. Type `help`.", other)?,
            }
        }

        if let Some(session) = self.tracker.session() {
            writeln!(
                self.out,
                "Leaving with the {} workout unfinished; it was not saved.",
                session.level
            )?;
        }
        Ok(())
    }

    fn show_plans(&mut self) -> Result<()> {
        for level in Level::ALL {
            write!(self.out, "{}", plans::render_plan(level))?;
        }
        Ok(())
    }

    fn start(&mut self, level: &str) -> Result<()> {
        let session = match self.tracker.start(level) {
            Ok(session) => session,
            Err(e) => {
                writeln!(self.out, "Error: {}", e)?;
                return Ok(());
            }
        };

        writeln!(self.out, "Started {} workout.", session.level)?;
        for (idx, exercise) in session.exercises.iter().enumerate() {
            writeln!(
                self.out,
                "  {}. {:<18} {} sets of {} {}",
                idx + 1,
                exercise.name,
                exercise.target_sets,
                exercise.reps,
                if exercise.is_duration { "seconds" } else { "reps" }
            )?;
        }
        Ok(())
    }

    /// Accepts an exercise name or its 1-based position in the plan.
    fn resolve_exercise(&self, arg: &str) -> String {
        if let (Ok(n), Some(session)) = (arg.parse::<usize>(), self.tracker.session()) {
            if let Some(exercise) = n.checked_sub(1).and_then(|i| session.exercises.get(i)) {
                return exercise.name.clone();
            }
        }
        arg.to_string()
    }

    fn complete_set(&mut self, arg: &str) -> Result<()> {
        if arg.is_empty() {
            writeln!(self.out, "Usage: set <exercise|number>")?;
            return Ok(());
        }
        let name = self.resolve_exercise(arg);
        match self.tracker.complete_set(&name) {
            Ok(snapshot) => self.print_progress(&snapshot),
            Err(e) => {
                writeln!(self.out, "Error: {}", e)?;
                Ok(())
            }
        }
    }

    fn status(&mut self) -> Result<()> {
        match self.tracker.snapshot() {
            Some(snapshot) => {
                for (idx, exercise) in snapshot.exercises.iter().enumerate() {
                    writeln!(
                        self.out,
                        "  {}. {:<18} {}/{}",
                        idx + 1,
                        exercise.name,
                        exercise.completed_sets,
                        exercise.target_sets
                    )?;
                }
                self.print_progress(&snapshot)
            }
            None => {
                writeln!(self.out, "No workout in progress.")?;
                Ok(())
            }
        }
    }

    fn print_progress(&mut self, snapshot: &ProgressSnapshot) -> Result<()> {
        writeln!(
            self.out,
            "Progress: {} {:.1}% | Calories Burned: {:.1}",
            progress_bar(snapshot.progress_percentage, PROGRESS_WIDTH),
            snapshot.progress_percentage,
            snapshot.calories_burned
        )?;
        Ok(())
    }

    /// Saves before clearing, so a failed write leaves the workout in
    /// progress and `end` can simply be retried.
    fn end(&mut self) -> Result<()> {
        let now = Local::now();
        let summary = match self.tracker.summarize_at(now) {
            Ok(summary) => summary,
            Err(e) => {
                writeln!(self.out, "Error: {}", e)?;
                return Ok(());
            }
        };

        let row = summary.to_new_workout(&self.username);
        match self.store.save_workout(&row) {
            Ok(id) => {
                self.tracker.end_at(now)?;
                self.print_summary(id, &summary)?;
                self.show_history()
            }
            Err(e) => {
                error!("Failed to save workout for {}: {}", self.username, e);
                writeln!(
                    self.out,
                    "Database error: {}. The workout is still in progress; run `end` again to retry.",
                    e
                )?;
                Ok(())
            }
        }
    }

    fn print_summary(&mut self, id: i64, summary: &WorkoutSummary) -> Result<()> {
        writeln!(self.out, "Workout ended! (saved as #{})", id)?;
        writeln!(self.out, "Duration: {:.1} minutes", summary.duration_minutes)?;
        writeln!(self.out, "Calories Burned: {:.1}", summary.calories_burned)?;
        writeln!(
            self.out,
            "Completion: {:.1}% ({})",
            summary.completion_percentage, summary.status
        )?;
        Ok(())
    }

    fn show_history(&mut self) -> Result<()> {
        let recent = match self.store.load_history(&self.username, self.history_limit) {
            Ok(recent) => recent,
            Err(e) => {
                error!("Failed to load history for {}: {}", self.username, e);
                writeln!(self.out, "Database error: {}", e)?;
                return Ok(());
            }
        };
        write!(self.out, "{}", history::render_history_table(&recent))?;

        match self.store.load_calorie_series(&self.username, self.history_limit) {
            Ok(series) => write!(
                self.out,
                "{}",
                history::render_calorie_chart(&series, self.chart_width)
            )?,
            Err(e) => {
                error!("Failed to load calorie series for {}: {}", self.username, e);
                writeln!(self.out, "Database error: {}", e)?;
            }
        }
        Ok(())
    }
}
