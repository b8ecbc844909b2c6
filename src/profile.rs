use serde::Serialize;
use thiserror::Error;

use crate::models::Profile;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("name cannot be empty")]
    EmptyName,
    #[error("age must be positive")]
    InvalidAge,
    #[error("please select a gender")]
    MissingGender,
    #[error("height must be positive")]
    InvalidHeight,
    #[error("weight must be positive")]
    InvalidWeight,
}

/// Unvalidated profile form values.
#[derive(Debug, Clone)]
pub struct ProfileInput {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
    /// Minutes.
    pub daily_workout_goal: u32,
}

impl ProfileInput {
    pub fn validate(self, username: &str) -> Result<Profile, ProfileError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        if self.age == 0 {
            return Err(ProfileError::InvalidAge);
        }
        let gender = self.gender.trim();
        if gender.is_empty() {
            return Err(ProfileError::MissingGender);
        }
        if !(self.height > 0.0) {
            return Err(ProfileError::InvalidHeight);
        }
        if !(self.weight > 0.0) {
            return Err(ProfileError::InvalidWeight);
        }

        Ok(Profile {
            username: username.to_string(),
            name: name.to_string(),
            age: self.age,
            gender: gender.to_string(),
            height: self.height,
            weight: self.weight,
            daily_workout_goal: self.daily_workout_goal,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }
}

/// Height is stored in centimetres.
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// `minutes_today` is the summed duration of today's workouts.
pub fn render_profile(profile: &Profile, minutes_today: f64) -> String {
    let value = bmi(profile.weight, profile.height);
    let mut out = String::new();
    out.push_str(&format!("Name: {}\n", profile.name));
    out.push_str(&format!("Age: {}\n", profile.age));
    out.push_str(&format!("Gender: {}\n", profile.gender));
    out.push_str(&format!("Height: {:.1} cm\n", profile.height));
    out.push_str(&format!("Weight: {:.1} kg\n", profile.weight));
    out.push_str(&format!(
        "Daily workout goal: {:.0} of {} minutes today\n",
        minutes_today, profile.daily_workout_goal
    ));
    out.push_str(&format!(
        "BMI: {:.1} - {}\n",
        value,
        BmiCategory::from_bmi(value).label()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ProfileInput {
        ProfileInput {
            name: " Ana ".to_string(),
            age: 30,
            gender: "Female".to_string(),
            height: 170.0,
            weight: 65.0,
            daily_workout_goal: 30,
        }
    }

    #[test]
    fn valid_input_is_trimmed() {
        let profile = input().validate("ana").unwrap();
        assert_eq!(profile.name, "Ana");
        assert_eq!(profile.username, "ana");
    }

    #[test]
    fn rejects_bad_values() {
        let mut bad = input();
        bad.name = "  ".to_string();
        assert_eq!(bad.validate("ana"), Err(ProfileError::EmptyName));

        let mut bad = input();
        bad.age = 0;
        assert_eq!(bad.validate("ana"), Err(ProfileError::InvalidAge));

        let mut bad = input();
        bad.gender.clear();
        assert_eq!(bad.validate("ana"), Err(ProfileError::MissingGender));

        let mut bad = input();
        bad.height = 0.0;
        assert_eq!(bad.validate("ana"), Err(ProfileError::InvalidHeight));

        let mut bad = input();
        bad.weight = f64::NAN;
        assert_eq!(bad.validate("ana"), Err(ProfileError::InvalidWeight));
    }

    #[test]
    fn bmi_categories() {
        let value = bmi(65.0, 170.0);
        assert!((value - 22.49).abs() < 0.01);
        assert_eq!(BmiCategory::from_bmi(value), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
    }

    #[test]
    fn renders_goal_and_bmi() {
        let profile = input().validate("ana").unwrap();
        let text = render_profile(&profile, 45.2);
        assert!(text.contains("Daily workout goal: 45 of 30 minutes today"));
        assert!(!text.contains("done today"));
        assert!(text.contains("BMI: 22.5 - Normal weight"));
    }
}
