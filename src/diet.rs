use serde::Serialize;
use thiserror::Error;

use crate::models::{DietGoals, Meal, MealType, NewMeal};

const HYDRATION_GOAL_RANGE: std::ops::RangeInclusive<u32> = 500..=10_000;
const WATER_AMOUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=5_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DietError {
    #[error("please enter a food name")]
    EmptyFoodName,
    #[error("{0} cannot be negative")]
    NegativeMacro(&'static str),
    #[error("please enter a positive calorie goal")]
    InvalidCalorieGoal,
    #[error("hydration goal must be between 500 and 10000 ml")]
    HydrationGoalOutOfRange,
    #[error("water amount must be between 1 and 5000 ml")]
    WaterAmountOutOfRange,
    #[error("unknown food #{0}; run `diet foods` for the list")]
    UnknownFood(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CommonFood {
    pub name: &'static str,
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

const fn food(name: &'static str, calories: u32, protein: f64, carbs: f64, fats: f64) -> CommonFood {
    CommonFood {
        name,
        calories,
        protein,
        carbs,
        fats,
    }
}

/// Quick-add list.
pub const COMMON_FOODS: &[CommonFood] = &[
    food("Chicken Breast (100g)", 165, 31.0, 0.0, 3.6),
    food("Brown Rice (100g cooked)", 112, 2.6, 23.0, 0.9),
    food("Egg (large)", 70, 6.0, 0.6, 5.0),
    food("Banana (medium)", 105, 1.3, 27.0, 0.4),
    food("Greek Yogurt (100g)", 59, 10.0, 3.6, 0.4),
    food("Oatmeal (100g cooked)", 71, 2.5, 12.0, 1.5),
    food("Salmon (100g)", 206, 22.0, 0.0, 13.0),
    food("Apple (medium)", 95, 0.5, 25.0, 0.3),
    food("Avocado (half)", 160, 2.0, 8.5, 15.0),
    food("Whole Wheat Bread (slice)", 81, 4.0, 13.8, 1.1),
];

/// Unvalidated meal form values.
#[derive(Debug, Clone)]
pub struct MealInput {
    pub meal_type: MealType,
    pub food_name: String,
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl MealInput {
    /// `number` is the 1-based position in [`COMMON_FOODS`].
    pub fn common(meal_type: MealType, number: usize) -> Result<Self, DietError> {
        let food = number
            .checked_sub(1)
            .and_then(|i| COMMON_FOODS.get(i))
            .ok_or(DietError::UnknownFood(number))?;
        Ok(Self {
            meal_type,
            food_name: food.name.to_string(),
            calories: food.calories,
            protein: food.protein,
            carbs: food.carbs,
            fats: food.fats,
        })
    }

    pub fn validate(self, username: &str, date: &str) -> Result<NewMeal, DietError> {
        let food_name = self.food_name.trim();
        if food_name.is_empty() {
            return Err(DietError::EmptyFoodName);
        }
        for (label, value) in [("protein", self.protein), ("carbs", self.carbs), ("fats", self.fats)] {
            if !(value >= 0.0) {
                return Err(DietError::NegativeMacro(label));
            }
        }

        Ok(NewMeal {
            username: username.to_string(),
            date: date.to_string(),
            meal_type: self.meal_type,
            food_name: food_name.to_string(),
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fats: self.fats,
        })
    }
}

/// Applies optional goal changes on top of the current goals.
pub fn update_goals(
    current: DietGoals,
    calorie_goal: Option<u32>,
    hydration_goal: Option<u32>,
) -> Result<DietGoals, DietError> {
    let mut goals = current;
    if let Some(calories) = calorie_goal {
        if calories == 0 {
            return Err(DietError::InvalidCalorieGoal);
        }
        goals.calorie_goal = calories;
    }
    if let Some(ml) = hydration_goal {
        if !HYDRATION_GOAL_RANGE.contains(&ml) {
            return Err(DietError::HydrationGoalOutOfRange);
        }
        goals.hydration_goal = ml;
    }
    Ok(goals)
}

pub fn validate_water(amount_ml: u32) -> Result<u32, DietError> {
    if WATER_AMOUNT_RANGE.contains(&amount_ml) {
        Ok(amount_ml)
    } else {
        Err(DietError::WaterAmountOutOfRange)
    }
}

/// Share of a goal reached, capped at 100.
pub fn goal_percentage(total: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 0.0;
    }
    (total / goal * 100.0).min(100.0)
}

/// Energy split between protein, carbs and fats, in kcal and percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroSplit {
    pub protein_kcal: f64,
    pub carbs_kcal: f64,
    pub fats_kcal: f64,
}

impl MacroSplit {
    /// None when the meals carry no macronutrients at all.
    pub fn from_meals(meals: &[Meal]) -> Option<Self> {
        let protein: f64 = meals.iter().map(|m| m.protein).sum();
        let carbs: f64 = meals.iter().map(|m| m.carbs).sum();
        let fats: f64 = meals.iter().map(|m| m.fats).sum();

        let split = Self {
            protein_kcal: protein * 4.0,
            carbs_kcal: carbs * 4.0,
            fats_kcal: fats * 9.0,
        };
        (split.total() > 0.0).then_some(split)
    }

    pub fn total(&self) -> f64 {
        self.protein_kcal + self.carbs_kcal + self.fats_kcal
    }

    /// (protein, carbs, fats) percentages.
    pub fn percentages(&self) -> (f64, f64, f64) {
        let total = self.total();
        (
            self.protein_kcal / total * 100.0,
            self.carbs_kcal / total * 100.0,
            self.fats_kcal / total * 100.0,
        )
    }
}

pub fn render_foods() -> String {
    let mut out = format!(
        "{:<3} {:<27} {:>5} {:>8} {:>6} {:>6}\n",
        "#", "Food", "kcal", "Protein", "Carbs", "Fats"
    );
    for (idx, food) in COMMON_FOODS.iter().enumerate() {
        out.push_str(&format!(
            "{:<3} {:<27} {:>5} {:>8.1} {:>6.1} {:>6.1}\n",
            idx + 1,
            food.name,
            food.calories,
            food.protein,
            food.carbs,
            food.fats
        ));
    }
    out
}

pub fn render_day(day: &str, meals: &[Meal], goals: &DietGoals, water_ml: u32) -> String {
    let mut out = format!("Diet for {}\n", day);

    if meals.is_empty() {
        out.push_str("No meals logged.\n");
    } else {
        out.push_str(&format!(
            "{:<5} {:<10} {:<27} {:>5} {:>8} {:>6} {:>6}\n",
            "ID", "Meal", "Food", "kcal", "Protein", "Carbs", "Fats"
        ));
        for meal in meals {
            out.push_str(&format!(
                "{:<5} {:<10} {:<27} {:>5} {:>8.1} {:>6.1} {:>6.1}\n",
                meal.id, meal.meal_type, meal.food_name, meal.calories, meal.protein, meal.carbs, meal.fats
            ));
        }
    }

    let calories: u32 = meals.iter().map(|m| m.calories).sum();
    out.push_str(&format!(
        "Calories: {}/{} kcal ({:.0}%)\n",
        calories,
        goals.calorie_goal,
        goal_percentage(calories as f64, goals.calorie_goal as f64)
    ));

    match MacroSplit::from_meals(meals) {
        Some(split) => {
            let (protein, carbs, fats) = split.percentages();
            out.push_str(&format!(
                "Macros: protein {:.1}% | carbs {:.1}% | fats {:.1}%\n",
                protein, carbs, fats
            ));
        }
        None => out.push_str("Macros: no macronutrient data\n"),
    }

    out.push_str(&format!(
        "Hydration: {}/{} ml ({:.0}%)\n",
        water_ml,
        goals.hydration_goal,
        goal_percentage(water_ml as f64, goals.hydration_goal as f64)
    ));
    out
}
