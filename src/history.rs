use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::io::Write;
use std::path::Path;

use crate::models::{WorkoutDetails, WorkoutRecord, RECORD_DATE_FORMAT};

fn parse_date(date: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(date, RECORD_DATE_FORMAT).ok()
}

/// `Mar 01, 2024 07:30 AM`; unparseable dates are shown as stored.
pub fn format_record_date(date: &str) -> String {
    parse_date(date)
        .map(|d| d.format("%b %d, %Y %I:%M %p").to_string())
        .unwrap_or_else(|| date.to_string())
}

fn short_date(date: &str) -> String {
    parse_date(date)
        .map(|d| d.format("%m/%d").to_string())
        .unwrap_or_else(|| date.chars().take(10).collect())
}

pub fn render_history_table(records: &[WorkoutRecord]) -> String {
    if records.is_empty() {
        return "No workouts yet.\n".to_string();
    }

    let mut out = format!(
        "{:>5}  {:<22} {:<13} {:>9} {:>9}  {}\n",
        "ID", "Date", "Level", "Minutes", "Calories", "Status"
    );
    for record in records {
        out.push_str(&format!(
            "{:>5}  {:<22} {:<13} {:>9.1} {:>9.1}  {}\n",
            record.id,
            format_record_date(&record.date),
            record.level,
            record.duration_minutes,
            record.calories_burned,
            record.status_label()
        ));
    }
    out
}

/// Horizontal bars scaled so the largest value spans `width` cells.
pub fn render_calorie_chart(series: &[WorkoutRecord], width: usize) -> String {
    if series.is_empty() {
        return "Complete workouts to see your progress graph.\n".to_string();
    }

    let max = series
        .iter()
        .map(|r| r.calories_burned)
        .fold(0.0_f64, f64::max);

    let mut out = String::from("Calories Burned per Workout\n");
    for record in series {
        let cells = if max > 0.0 {
            ((record.calories_burned / max) * width as f64).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "{:>5} | {:<width$} {:.1}\n",
            short_date(&record.date),
            "#".repeat(cells),
            record.calories_burned,
            width = width
        ));
    }
    out
}

pub fn render_details(details: &WorkoutDetails) -> String {
    let record = &details.record;
    let mut out = String::new();
    out.push_str(&format!("Workout #{}\n", record.id));
    out.push_str(&format!("Date: {}\n", format_record_date(&record.date)));
    out.push_str(&format!("Level: {}\n", record.level));
    out.push_str(&format!("Duration: {:.1} minutes\n", record.duration_minutes));
    out.push_str(&format!("Calories Burned: {:.1}\n", record.calories_burned));
    out.push_str(&format!("Status: {}\n", record.status_label()));
    out.push_str("Exercises:\n");
    for exercise in &details.exercises {
        out.push_str(&format!(
            "  - {}: {} sets x {}\n",
            exercise.exercise_name, exercise.sets, exercise.reps
        ));
    }
    out
}

pub fn write_csv<W: Write>(writer: W, records: &[WorkoutRecord]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(records.len())
}

pub fn export_csv(path: &Path, records: &[WorkoutRecord]) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let written = write_csv(file, records)?;
    tracing::info!("Exported {} workouts to {}", written, path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExerciseResultRecord;

    fn record(id: i64, date: &str, calories: f64, completed: bool) -> WorkoutRecord {
        WorkoutRecord {
            id,
            username: "ana".to_string(),
            date: date.to_string(),
            level: "Beginner".to_string(),
            duration_minutes: 20.25,
            calories_burned: calories,
            completed,
        }
    }

    #[test]
    fn formats_dates_like_the_history_view() {
        assert_eq!(
            format_record_date("2024-03-01 19:05:00"),
            "Mar 01, 2024 07:05 PM"
        );
        assert_eq!(format_record_date("yesterday"), "yesterday");
    }

    #[test]
    fn table_lists_status_from_flag() {
        let table = render_history_table(&[
            record(2, "2024-03-02 08:00:00", 105.0, true),
            record(1, "2024-03-01 08:00:00", 40.0, false),
        ]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("105.0") && lines[1].ends_with("Completed"));
        assert!(lines[2].ends_with("Partial"));
        assert_eq!(render_history_table(&[]), "No workouts yet.\n");
    }

    #[test]
    fn chart_scales_to_largest_bar() {
        let chart = render_calorie_chart(
            &[
                record(1, "2024-03-01 08:00:00", 50.0, false),
                record(2, "2024-03-02 08:00:00", 100.0, true),
            ],
            10,
        );
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines[1], "03/01 | #####      50.0");
        assert_eq!(lines[2], "03/02 | ########## 100.0");
    }

    #[test]
    fn details_list_exercises() {
        let details = WorkoutDetails {
            record: record(7, "2024-03-01 08:00:00", 15.0, false),
            exercises: vec![ExerciseResultRecord {
                workout_id: 7,
                exercise_name: "Push-ups".to_string(),
                sets: 3,
                reps: 10,
            }],
        };
        let text = render_details(&details);
        assert!(text.starts_with("Workout #7\n"));
        assert!(text.contains("  - Push-ups: 3 sets x 10\n"));
    }

    #[test]
    fn csv_has_header_and_rows() {
        let mut buf = Vec::new();
        let written = write_csv(&mut buf, &[record(1, "2024-03-01 08:00:00", 15.0, true)]).unwrap();
        assert_eq!(written, 1);
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,username,date,level,duration_minutes,calories_burned,completed")
        );
        assert_eq!(
            lines.next(),
            Some("1,ana,2024-03-01 08:00:00,Beginner,20.25,15.0,true")
        );
    }
}
