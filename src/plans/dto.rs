use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProfileError;

/// Which of the two plan artifacts a request refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Meal,
    Workout,
}

impl PlanType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Meal => "meal",
            Self::Workout => "workout",
        }
    }
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one generation unit. `Generating` is the sole initial state;
/// the terminal states are final until a fresh submission supersedes the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Generating,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weight input: the client populates exactly one of the two units.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightInput {
    pub kg: Option<f64>,
    pub lbs: Option<f64>,
}

/// Resolved weight with the representation the user actually entered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Weight {
    Kilograms(f64),
    Pounds(f64),
}

pub const KG_PER_LB: f64 = 1.0 / 2.204_622_621_8;

impl WeightInput {
    pub fn resolve(&self, field: &'static str) -> Result<Weight, ProfileError> {
        match (self.kg, self.lbs) {
            (Some(kg), None) => Ok(Weight::Kilograms(kg)),
            (None, Some(lbs)) => Ok(Weight::Pounds(lbs)),
            (None, None) => Err(ProfileError::MissingMeasurement(field)),
            (Some(_), Some(_)) => Err(ProfileError::AmbiguousMeasurement(field)),
        }
    }

    pub fn resolve_optional(&self, field: &'static str) -> Result<Option<Weight>, ProfileError> {
        match (self.kg, self.lbs) {
            (None, None) => Ok(None),
            _ => self.resolve(field).map(Some),
        }
    }
}

impl Weight {
    pub fn kilograms(self) -> f64 {
        match self {
            Self::Kilograms(kg) => kg,
            Self::Pounds(lbs) => lbs * KG_PER_LB,
        }
    }

    pub fn display(self) -> String {
        match self {
            Self::Kilograms(kg) => format!("{kg} kg"),
            Self::Pounds(lbs) => format!("{lbs} lbs"),
        }
    }
}

/// Length input: metric centimeters or imperial feet + inches, never both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LengthInput {
    pub cm: Option<f64>,
    pub ft: Option<f64>,
    #[serde(rename = "inch")]
    pub inches: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Centimeters(f64),
    FeetInches { ft: f64, inches: f64 },
}

impl LengthInput {
    pub fn resolve(&self, field: &'static str) -> Result<Length, ProfileError> {
        let imperial = self.ft.is_some() || self.inches.is_some();
        match (self.cm, imperial) {
            (Some(cm), false) => Ok(Length::Centimeters(cm)),
            (None, true) => Ok(Length::FeetInches {
                ft: self.ft.unwrap_or(0.0),
                inches: self.inches.unwrap_or(0.0),
            }),
            (None, false) => Err(ProfileError::MissingMeasurement(field)),
            (Some(_), true) => Err(ProfileError::AmbiguousMeasurement(field)),
        }
    }

    pub fn resolve_optional(&self, field: &'static str) -> Result<Option<Length>, ProfileError> {
        if self.cm.is_none() && self.ft.is_none() && self.inches.is_none() {
            return Ok(None);
        }
        self.resolve(field).map(Some)
    }
}

impl Length {
    pub fn centimeters(self) -> f64 {
        match self {
            Self::Centimeters(cm) => cm,
            Self::FeetInches { ft, inches } => ft * 30.48 + inches * 2.54,
        }
    }

    pub fn display(self) -> String {
        match self {
            Self::Centimeters(cm) => format!("{cm} cm"),
            Self::FeetInches { ft, inches } => format!("{}'{}\"", ft as i64, inches as i64),
        }
    }
}

/// Complete quiz answers from the user, immutable after submission.
///
/// Field names mirror the quiz wire contract, which is camelCase apart from
/// two historical snake_case stragglers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswers {
    pub age: i64,
    pub gender: String,
    pub country: Option<String>,

    pub height: LengthInput,
    pub current_weight: WeightInput,
    #[serde(default)]
    pub target_weight: WeightInput,
    #[serde(default)]
    pub neck: LengthInput,
    #[serde(default)]
    pub waist: LengthInput,
    #[serde(default)]
    pub hip: LengthInput,
    pub body_fat: Option<f64>,

    pub main_goal: String,
    pub secondary_goals: Option<Vec<String>>,
    pub time_frame: String,
    pub body_type: Option<String>,

    pub lifestyle: String,
    #[serde(rename = "occupation_activity")]
    pub occupation_activity: Option<String>,
    pub grocery_budget: String,
    pub dietary_style: String,
    pub meals_per_day: String,
    pub motivation_level: u8,
    pub stress_level: u8,
    pub sleep_quality: String,

    pub health_conditions: Option<Vec<String>>,
    #[serde(rename = "healthConditions_other")]
    pub health_conditions_other: Option<String>,
    pub medications: Option<String>,
    pub injuries: Option<String>,
    pub food_allergies: Option<String>,

    pub exercise_frequency: String,
    pub preferred_exercise: Vec<String>,
    pub training_environment: Vec<String>,
    pub equipment: Option<Vec<String>>,

    pub disliked_foods: Option<String>,
    pub cooking_skill: String,
    pub cooking_time: String,

    pub challenges: Option<Vec<String>>,
}

/// Calculated macronutrient targets, whole grams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macros {
    pub protein_g: i32,
    pub carbs_g: i32,
    pub fat_g: i32,
    pub protein_pct_of_calories: i32,
    pub carbs_pct_of_calories: i32,
    pub fat_pct_of_calories: i32,
}

/// Human-facing measurement strings in the units the user entered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayStrings {
    pub weight: String,
    pub height: String,
    pub target_weight: String,
}

/// All derived metrics for one quiz submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionProfile {
    pub bmi: f64,
    pub bmr: f64,
    pub tdee: f64,
    pub body_fat_percentage: Option<f64>,
    pub macros: Macros,
    pub goal_calories: i32,
    pub goal_weight: f64,
    pub estimated_weeks_to_goal: Option<f64>,
    pub display: DisplayStrings,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratePlansRequest {
    pub user_id: Uuid,
    pub quiz_result_id: Uuid,
    pub answers: QuizAnswers,
    #[serde(default = "default_provider")]
    pub ai_provider: String,
    #[serde(default = "default_model")]
    pub model_name: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratePlansResponse {
    pub success: bool,
    pub calculations: NutritionProfile,
    pub macros: Macros,
    pub meal_plan_status: GenerationStatus,
    pub workout_plan_status: GenerationStatus,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PlanStatusResponse {
    pub success: bool,
    pub meal_plan_status: String,
    pub workout_plan_status: String,
    pub meal_plan_error: Option<String>,
    pub workout_plan_error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InvalidateCacheRequest {
    pub plan_type: PlanType,
    pub answers: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct InvalidateCacheResponse {
    pub invalidated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_resolution_picks_the_populated_unit() {
        let metric = WeightInput { kg: Some(80.0), lbs: None };
        assert_eq!(metric.resolve("currentWeight").expect("resolve"), Weight::Kilograms(80.0));

        let imperial = WeightInput { kg: None, lbs: Some(176.0) };
        let w = imperial.resolve("currentWeight").expect("resolve");
        assert!((w.kilograms() - 79.83).abs() < 0.01);
    }

    #[test]
    fn weight_resolution_rejects_empty_and_ambiguous() {
        let empty = WeightInput::default();
        assert!(matches!(
            empty.resolve("currentWeight"),
            Err(ProfileError::MissingMeasurement("currentWeight"))
        ));

        let both = WeightInput { kg: Some(80.0), lbs: Some(176.0) };
        assert!(matches!(
            both.resolve("currentWeight"),
            Err(ProfileError::AmbiguousMeasurement("currentWeight"))
        ));
    }

    #[test]
    fn length_resolution_converts_feet_and_inches() {
        let input = LengthInput { cm: None, ft: Some(5.0), inches: Some(10.0) };
        let l = input.resolve("height").expect("resolve");
        assert!((l.centimeters() - 177.8).abs() < 0.01);
        assert_eq!(l.display(), "5'10\"");
    }

    #[test]
    fn optional_length_resolves_to_none_when_empty() {
        let empty = LengthInput::default();
        assert!(empty.resolve_optional("neck").expect("resolve").is_none());
    }

    #[test]
    fn quiz_answers_accept_wire_field_names() {
        let json = serde_json::json!({
            "age": 30,
            "gender": "male",
            "height": {"cm": 180},
            "currentWeight": {"kg": 85},
            "targetWeight": {"kg": 75},
            "mainGoal": "Weight loss",
            "timeFrame": "6 months",
            "lifestyle": "mostly sedentary",
            "occupation_activity": "software developer",
            "groceryBudget": "medium",
            "dietaryStyle": "balanced",
            "mealsPerDay": "3",
            "motivationLevel": 8,
            "stressLevel": 4,
            "sleepQuality": "good",
            "healthConditions_other": "none",
            "bodyFat": null,
            "exerciseFrequency": "3-4 times/week",
            "preferredExercise": ["weightlifting"],
            "trainingEnvironment": ["gym"],
            "cookingSkill": "intermediate",
            "cookingTime": "30 minutes",
        });
        let answers: QuizAnswers = serde_json::from_value(json).expect("deserialize");
        assert_eq!(answers.occupation_activity.as_deref(), Some("software developer"));
        assert_eq!(answers.health_conditions_other.as_deref(), Some("none"));
    }
}
