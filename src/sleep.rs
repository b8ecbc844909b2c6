use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use thiserror::Error;

use crate::models::{SleepEntry, SleepQuality, SleepRecord, DAY_FORMAT};

const MAX_HOURS: u32 = 12;
const MINUTE_STEPS: [u32; 4] = [0, 15, 30, 45];
const NOTES_PREVIEW: usize = 40;

/// Healthy nightly range used by the recommendations.
const RECOMMENDED_MIN: f64 = 7.0;
const RECOMMENDED_MAX: f64 = 9.0;
const RECOMMENDED_TARGET: f64 = 7.5;
const RECENT_NIGHTS: usize = 14;
const VARIANCE_LIMIT: f64 = 1.5;
const POOR_SHARE_LIMIT: f64 = 25.0;
const SOCIAL_JET_LAG_HOURS: f64 = 1.5;

const SLEEP_TIPS: [&str; 5] = [
    "Avoid caffeine and alcohol before bedtime.",
    "Create a relaxing bedtime routine.",
    "Keep your bedroom cool, dark, and quiet.",
    "Limit screen time at least 1 hour before bed.",
    "Consider relaxation techniques like meditation or deep breathing.",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SleepError {
    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("hours must be between 0 and 12")]
    HoursOutOfRange,
    #[error("minutes must be one of 0, 15, 30 or 45")]
    InvalidMinutes,
}

/// Unvalidated sleep form values.
#[derive(Debug, Clone)]
pub struct SleepInput {
    pub date: String,
    pub hours: u32,
    pub minutes: u32,
    pub quality: SleepQuality,
    pub notes: String,
}

impl SleepInput {
    pub fn validate(self, username: &str) -> Result<SleepEntry, SleepError> {
        let date = self.date.trim();
        NaiveDate::parse_from_str(date, DAY_FORMAT)
            .map_err(|_| SleepError::InvalidDate(date.to_string()))?;
        if self.hours > MAX_HOURS {
            return Err(SleepError::HoursOutOfRange);
        }
        if !MINUTE_STEPS.contains(&self.minutes) {
            return Err(SleepError::InvalidMinutes);
        }

        Ok(SleepEntry {
            username: username.to_string(),
            date: date.to_string(),
            hours: self.hours as f64 + self.minutes as f64 / 60.0,
            quality: self.quality,
            notes: self.notes.trim().to_string(),
        })
    }
}

fn is_weekend(date: &str) -> Option<bool> {
    let day = NaiveDate::parse_from_str(date, DAY_FORMAT).ok()?;
    Some(matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepStats {
    pub total_hours: f64,
    pub nights: usize,
    pub average_hours: f64,
    /// 0-100, how close each night is to the average.
    pub consistency: u32,
    pub weekday_average: f64,
    pub weekend_average: f64,
    pub good: usize,
    pub average: usize,
    pub poor: usize,
}

impl SleepStats {
    /// None without any records.
    pub fn from_records(records: &[SleepRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let hours: Vec<f64> = records.iter().map(|r| r.hours).collect();
        let total_hours: f64 = hours.iter().sum();
        let average_hours = total_hours / hours.len() as f64;

        let consistency = if average_hours > 0.0 {
            let scores: Vec<f64> = hours
                .iter()
                .map(|h| (1.0 - (h - average_hours).abs() / average_hours).max(0.0))
                .collect();
            (mean(&scores) * 100.0) as u32
        } else {
            0
        };

        let (weekend, weekday): (Vec<&SleepRecord>, Vec<&SleepRecord>) = records
            .iter()
            .filter(|r| is_weekend(&r.date).is_some())
            .partition(|r| is_weekend(&r.date) == Some(true));
        let weekday_hours: Vec<f64> = weekday.iter().map(|r| r.hours).collect();
        let weekend_hours: Vec<f64> = weekend.iter().map(|r| r.hours).collect();

        let count = |q: SleepQuality| records.iter().filter(|r| r.quality == q).count();

        Some(Self {
            total_hours,
            nights: records.len(),
            average_hours,
            consistency,
            weekday_average: mean(&weekday_hours),
            weekend_average: mean(&weekend_hours),
            good: count(SleepQuality::Good),
            average: count(SleepQuality::Average),
            poor: count(SleepQuality::Poor),
        })
    }
}

/// Advice derived from all records, oldest first. Empty without records.
pub fn recommendations(records: &[SleepRecord]) -> Vec<String> {
    let Some(stats) = SleepStats::from_records(records) else {
        return Vec::new();
    };
    let avg = stats.average_hours;
    let mut advice = Vec::new();

    if avg < RECOMMENDED_MIN {
        advice.push(format!(
            "Your average sleep duration ({:.1} hours) is below the recommended 7-9 hours. \
             Try to sleep {:.1} hours more each night for better health.",
            avg,
            RECOMMENDED_TARGET - avg
        ));
    } else if avg > RECOMMENDED_MAX {
        advice.push(format!(
            "Your average sleep duration ({:.1} hours) is above the recommended 7-9 hours. \
             While this may be normal for some people, consider if you're spending too much time in bed.",
            avg
        ));
    } else {
        advice.push(format!(
            "Great job! Your average sleep duration ({:.1} hours) is within the recommended 7-9 hours range.",
            avg
        ));
    }

    let recent = &records[records.len().saturating_sub(RECENT_NIGHTS)..];
    let variance = mean(
        &recent
            .iter()
            .map(|r| (r.hours - avg).powi(2))
            .collect::<Vec<_>>(),
    );
    if variance > VARIANCE_LIMIT {
        advice.push(
            "Your sleep duration varies significantly from day to day. Try to maintain a more \
             consistent sleep schedule by going to bed and waking up at the same time each day."
                .to_string(),
        );
    } else {
        advice.push(
            "You have a consistent sleep schedule. This is excellent for your circadian rhythm \
             and overall health."
                .to_string(),
        );
    }

    let poor_share = stats.poor as f64 / stats.nights as f64 * 100.0;
    if poor_share > POOR_SHARE_LIMIT {
        advice.push(format!(
            "You're experiencing frequent nights of poor sleep quality ({:.1}% of recorded nights). \
             Consider factors that might be affecting your sleep, such as noise, light, temperature, \
             caffeine intake, screen time, or stress.",
            poor_share
        ));
        let tips: Vec<String> = SLEEP_TIPS.iter().map(|t| format!("  - {}", t)).collect();
        advice.push(format!(
            "Some tips to improve your sleep quality:\n{}",
            tips.join("\n")
        ));
    }

    let has_weekday = records.iter().any(|r| is_weekend(&r.date) == Some(false));
    let has_weekend = records.iter().any(|r| is_weekend(&r.date) == Some(true));
    if has_weekday
        && has_weekend
        && (stats.weekday_average - stats.weekend_average).abs() > SOCIAL_JET_LAG_HOURS
    {
        advice.push(format!(
            "Your sleep schedule differs significantly between weekdays ({:.1} hours) and weekends \
             ({:.1} hours). This 'social jet lag' can disrupt your body clock. Try to maintain a \
             more consistent schedule throughout the week.",
            stats.weekday_average, stats.weekend_average
        ));
    }

    advice
}

fn preview(notes: &str) -> String {
    if notes.chars().count() > NOTES_PREVIEW {
        let cut: String = notes.chars().take(NOTES_PREVIEW).collect();
        format!("{}...", cut)
    } else {
        notes.to_string()
    }
}

pub fn render_history(records: &[SleepRecord]) -> String {
    if records.is_empty() {
        return "No sleep records yet.\n".to_string();
    }
    let mut out = format!(
        "{:<5} {:<12} {:>6} {:<8} {}\n",
        "ID", "Date", "Hours", "Quality", "Notes"
    );
    for record in records {
        out.push_str(&format!(
            "{:<5} {:<12} {:>6.1} {:<8} {}\n",
            record.id,
            record.date,
            record.hours,
            record.quality,
            preview(&record.notes)
        ));
    }
    out
}

pub fn render_analytics(records: &[SleepRecord]) -> String {
    let Some(stats) = SleepStats::from_records(records) else {
        return "No sleep data available. Start logging your sleep to get personalized recommendations.\n"
            .to_string();
    };

    let mut out = String::from("Sleep Summary\n");
    out.push_str(&format!("  Total Sleep:       {:.1} hours\n", stats.total_hours));
    out.push_str(&format!("  Total Days:        {}\n", stats.nights));
    out.push_str(&format!("  Average Sleep:     {:.1} hours\n", stats.average_hours));
    out.push_str(&format!("  Sleep Consistency: {}%\n", stats.consistency));
    out.push_str(&format!("  Weekday Average:   {:.1} hours\n", stats.weekday_average));
    out.push_str(&format!("  Weekend Average:   {:.1} hours\n", stats.weekend_average));
    out.push_str(&format!(
        "  Quality:           Good {} | Average {} | Poor {}\n",
        stats.good, stats.average, stats.poor
    ));

    out.push_str("\nBased on your sleep data:\n");
    for (idx, advice) in recommendations(records).iter().enumerate() {
        out.push_str(&format!("{}. {}\n", idx + 1, advice));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, hours: f64, quality: SleepQuality) -> SleepRecord {
        SleepRecord {
            id: 0,
            date: date.to_string(),
            hours,
            quality,
            notes: String::new(),
        }
    }

    fn input() -> SleepInput {
        SleepInput {
            date: "2024-03-01".to_string(),
            hours: 7,
            minutes: 30,
            quality: SleepQuality::Good,
            notes: " slept well ".to_string(),
        }
    }

    #[test]
    fn minutes_become_fractional_hours() {
        let entry = input().validate("ana").unwrap();
        assert_eq!(entry.hours, 7.5);
        assert_eq!(entry.notes, "slept well");
    }

    #[test]
    fn rejects_bad_dates_and_durations() {
        let mut bad = input();
        bad.date = "2024-02-30".to_string();
        assert_eq!(
            bad.validate("ana"),
            Err(SleepError::InvalidDate("2024-02-30".to_string()))
        );

        let mut bad = input();
        bad.hours = 13;
        assert_eq!(bad.validate("ana"), Err(SleepError::HoursOutOfRange));

        let mut bad = input();
        bad.minutes = 20;
        assert_eq!(bad.validate("ana"), Err(SleepError::InvalidMinutes));
    }

    #[test]
    fn stats_split_weekdays_and_weekends() {
        // 2024-03-01 is a Friday, 03-02 and 03-03 the weekend.
        let records = [
            record("2024-03-01", 6.0, SleepQuality::Poor),
            record("2024-03-02", 9.0, SleepQuality::Good),
            record("2024-03-03", 9.0, SleepQuality::Average),
        ];
        let stats = SleepStats::from_records(&records).unwrap();
        assert_eq!(stats.total_hours, 24.0);
        assert_eq!(stats.nights, 3);
        assert_eq!(stats.average_hours, 8.0);
        assert_eq!(stats.weekday_average, 6.0);
        assert_eq!(stats.weekend_average, 9.0);
        // scores 0.75, 0.875, 0.875
        assert_eq!(stats.consistency, 83);
        assert_eq!((stats.good, stats.average, stats.poor), (1, 1, 1));

        assert!(SleepStats::from_records(&[]).is_none());
    }

    #[test]
    fn short_sleep_gets_duration_advice() {
        let records = [
            record("2024-03-04", 6.0, SleepQuality::Average),
            record("2024-03-05", 6.0, SleepQuality::Average),
        ];
        let advice = recommendations(&records);
        assert_eq!(advice.len(), 2);
        assert!(advice[0].contains("(6.0 hours) is below"));
        assert!(advice[0].contains("sleep 1.5 hours more"));
        assert!(advice[1].starts_with("You have a consistent sleep schedule"));
    }

    #[test]
    fn poor_quality_and_social_jet_lag_are_flagged() {
        let records = [
            record("2024-03-01", 5.0, SleepQuality::Poor),
            record("2024-03-02", 10.0, SleepQuality::Good),
            record("2024-03-03", 10.0, SleepQuality::Good),
            record("2024-03-04", 5.0, SleepQuality::Poor),
        ];
        let advice = recommendations(&records);
        assert!(advice[0].starts_with("Great job!"));
        assert!(advice[1].contains("varies significantly"));
        assert!(advice[2].contains("(50.0% of recorded nights)"));
        assert_eq!(advice[3].lines().count(), 6);
        assert!(advice[4].contains("weekdays (5.0 hours) and weekends (10.0 hours)"));
        assert!(recommendations(&[]).is_empty());
    }

    #[test]
    fn history_truncates_long_notes() {
        let mut long = record("2024-03-01", 7.0, SleepQuality::Good);
        long.notes = "a".repeat(45);
        let text = render_history(&[long]);
        assert!(text.contains(&format!("{}...", "a".repeat(40))));
        assert_eq!(render_history(&[]), "No sleep records yet.\n");
    }

    #[test]
    fn analytics_without_data() {
        assert!(render_analytics(&[]).starts_with("No sleep data available."));
        let text = render_analytics(&[record("2024-03-04", 8.0, SleepQuality::Good)]);
        assert!(text.contains("Sleep Consistency: 100%"));
        assert!(text.contains("1. Great job!"));
    }
}
