//! Structural validation of AI-generated plans.
//!
//! Validation walks the parsed JSON field by field and collects every
//! violated constraint, so a single repair prompt can list them all.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::plans::dto::PlanType;

lazy_static! {
    static ref WEEKDAY_RE: Regex =
        Regex::new(r"^(monday|tuesday|wednesday|thursday|friday|saturday|sunday)$").unwrap();
    static ref MEAL_TYPE_RE: Regex = Regex::new(r"^(breakfast|lunch|dinner|snack)$").unwrap();
    static ref INTENSITY_RE: Regex = Regex::new(r"^(low|moderate|high)$").unwrap();
    static ref DIFFICULTY_RE: Regex = Regex::new(r"^(beginner|intermediate|advanced)$").unwrap();
}

const WEEKDAYS: [&str; 7] = [
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

const JSON_PREVIEW_LEN: usize = 200;

/// One violated constraint, with the JSON path it was found at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

// ========================
// Typed plan structures
// ========================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealItem {
    pub name: String,
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub meal_type: String,
    pub prep_time: Option<i64>,
    pub cook_time: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayMeals {
    pub day: String,
    pub breakfast: MealItem,
    pub lunch: MealItem,
    pub dinner: MealItem,
    #[serde(default)]
    pub snacks: Vec<MealItem>,
    pub total_calories: i64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fats: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub avg_daily_calories: i64,
    pub avg_daily_protein: f64,
    pub avg_daily_carbs: f64,
    pub avg_daily_fats: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlan {
    pub weekly_plan: Vec<DayMeals>,
    pub weekly_summary: WeeklySummary,
    #[serde(default)]
    pub shopping_list: Vec<String>,
    #[serde(default)]
    pub meal_prep_tips: Vec<String>,
    pub nutritional_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub sets: i64,
    pub reps: Option<String>,
    pub duration: Option<i64>,
    pub rest: Option<i64>,
    pub intensity: Option<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub target_muscles: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub day: String,
    pub workout_name: String,
    pub focus: Option<String>,
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub warm_up: Vec<String>,
    #[serde(default)]
    pub cool_down: Vec<String>,
    pub estimated_duration: Option<i64>,
    pub difficulty: Option<String>,
    pub calories_burned: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestDay {
    pub day: String,
    #[serde(default = "default_true")]
    pub is_rest_day: bool,
    #[serde(default)]
    pub active_recovery: Vec<String>,
    pub notes: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutWeeklySummary {
    pub total_workout_days: i64,
    pub total_rest_days: i64,
    pub avg_workout_duration: Option<i64>,
    pub total_weekly_calories_burned: Option<i64>,
    pub primary_focus: Option<String>,
    #[serde(default)]
    pub equipment_needed: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub weekly_plan: Vec<WorkoutDay>,
    #[serde(default)]
    pub rest_days: Vec<RestDay>,
    pub weekly_summary: WorkoutWeeklySummary,
    #[serde(default)]
    pub progression_notes: Vec<String>,
    #[serde(default)]
    pub safety_tips: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ValidatedPlan {
    Meal(MealPlan),
    Workout(WorkoutPlan),
}

/// Parse and validate raw model output for one plan type.
///
/// Returns the typed plan, or every violated constraint found.
pub fn validate_plan(plan_type: PlanType, raw: &str) -> Result<ValidatedPlan, Vec<ValidationIssue>> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            let preview: String = raw.chars().take(JSON_PREVIEW_LEN).collect();
            return Err(vec![ValidationIssue::new(
                "$",
                format!("response is not valid JSON ({e}); starts with: {preview:?}"),
            )]);
        }
    };

    let mut issues = Vec::new();
    match plan_type {
        PlanType::Meal => check_meal_plan(&value, &mut issues),
        PlanType::Workout => check_workout_plan(&value, &mut issues),
    }
    if !issues.is_empty() {
        return Err(issues);
    }

    let typed = match plan_type {
        PlanType::Meal => serde_json::from_value(value).map(ValidatedPlan::Meal),
        PlanType::Workout => serde_json::from_value(value).map(ValidatedPlan::Workout),
    };
    typed.map_err(|e| vec![ValidationIssue::new("$", format!("failed to decode plan: {e}"))])
}

// ========================
// Value-walk helpers
// ========================

fn get_object<'a>(value: &'a Value, path: &str, issues: &mut Vec<ValidationIssue>) -> Option<&'a serde_json::Map<String, Value>> {
    match value.as_object() {
        Some(map) => Some(map),
        None => {
            issues.push(ValidationIssue::new(path, "must be a JSON object"));
            None
        }
    }
}

fn require<'a>(
    obj: &'a serde_json::Map<String, Value>,
    path: &str,
    key: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<&'a Value> {
    match obj.get(key) {
        Some(Value::Null) | None => {
            issues.push(ValidationIssue::new(format!("{path}.{key}"), "is required"));
            None
        }
        Some(v) => Some(v),
    }
}

fn require_str<'a>(
    obj: &'a serde_json::Map<String, Value>,
    path: &str,
    key: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<&'a str> {
    let value = require(obj, path, key, issues)?;
    match value.as_str() {
        Some(s) if !s.trim().is_empty() => Some(s),
        Some(_) => {
            issues.push(ValidationIssue::new(format!("{path}.{key}"), "must not be empty"));
            None
        }
        None => {
            issues.push(ValidationIssue::new(format!("{path}.{key}"), "must be a string"));
            None
        }
    }
}

fn require_int(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<i64> {
    let value = require(obj, path, key, issues)?;
    match value.as_i64() {
        Some(n) if range.contains(&n) => Some(n),
        Some(n) => {
            issues.push(ValidationIssue::new(
                format!("{path}.{key}"),
                format!("{n} is outside the allowed range {}..={}", range.start(), range.end()),
            ));
            None
        }
        None => {
            issues.push(ValidationIssue::new(format!("{path}.{key}"), "must be an integer"));
            None
        }
    }
}

fn require_number(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    key: &str,
    range: std::ops::RangeInclusive<f64>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<f64> {
    let value = require(obj, path, key, issues)?;
    match value.as_f64() {
        Some(n) if range.contains(&n) => Some(n),
        Some(n) => {
            issues.push(ValidationIssue::new(
                format!("{path}.{key}"),
                format!("{n} is outside the allowed range {}..={}", range.start(), range.end()),
            ));
            None
        }
        None => {
            issues.push(ValidationIssue::new(format!("{path}.{key}"), "must be a number"));
            None
        }
    }
}

fn optional_int(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    issues: &mut Vec<ValidationIssue>,
) {
    if let Some(value) = obj.get(key).filter(|v| !v.is_null()) {
        match value.as_i64() {
            Some(n) if range.contains(&n) => {}
            Some(n) => issues.push(ValidationIssue::new(
                format!("{path}.{key}"),
                format!("{n} is outside the allowed range {}..={}", range.start(), range.end()),
            )),
            None => issues.push(ValidationIssue::new(format!("{path}.{key}"), "must be an integer")),
        }
    }
}

fn optional_enum(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    key: &str,
    pattern: &Regex,
    allowed: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    if let Some(value) = obj.get(key).filter(|v| !v.is_null()) {
        match value.as_str() {
            Some(s) if pattern.is_match(s) => {}
            Some(s) => issues.push(ValidationIssue::new(
                format!("{path}.{key}"),
                format!("'{s}' is not one of {allowed}"),
            )),
            None => issues.push(ValidationIssue::new(format!("{path}.{key}"), "must be a string")),
        }
    }
}

fn require_string_array(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    key: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    match require(obj, path, key, issues) {
        Some(Value::Array(items)) if !items.is_empty() => {
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    issues.push(ValidationIssue::new(
                        format!("{path}.{key}[{i}]"),
                        "must be a string",
                    ));
                }
            }
        }
        Some(Value::Array(_)) => {
            issues.push(ValidationIssue::new(format!("{path}.{key}"), "must not be empty"));
        }
        Some(_) => {
            issues.push(ValidationIssue::new(format!("{path}.{key}"), "must be an array"));
        }
        None => {}
    }
}

fn check_weekday(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    let day = require_str(obj, path, "day", issues)?;
    let normalized = day.to_lowercase();
    if WEEKDAY_RE.is_match(&normalized) {
        Some(normalized)
    } else {
        issues.push(ValidationIssue::new(
            format!("{path}.day"),
            format!("'{day}' is not a weekday name"),
        ));
        None
    }
}

// ========================
// Meal plan checks
// ========================

fn check_meal_plan(value: &Value, issues: &mut Vec<ValidationIssue>) {
    let Some(root) = get_object(value, "$", issues) else { return };

    match require(root, "$", "weekly_plan", issues) {
        Some(Value::Array(days)) => {
            if days.len() != 7 {
                issues.push(ValidationIssue::new(
                    "$.weekly_plan",
                    format!("must contain exactly 7 days, got {}", days.len()),
                ));
            }
            let mut seen_days = Vec::new();
            for (i, day) in days.iter().enumerate() {
                let path = format!("$.weekly_plan[{i}]");
                if let Some(label) = check_day_meals(day, &path, issues) {
                    seen_days.push(label);
                }
            }
            let missing: Vec<&str> = WEEKDAYS
                .iter()
                .filter(|d| !seen_days.iter().any(|s| s == *d))
                .copied()
                .collect();
            if days.len() == 7 && !missing.is_empty() {
                issues.push(ValidationIssue::new(
                    "$.weekly_plan",
                    format!("must cover all 7 distinct weekdays; missing: {}", missing.join(", ")),
                ));
            }
        }
        Some(_) => issues.push(ValidationIssue::new("$.weekly_plan", "must be an array")),
        None => {}
    }

    match require(root, "$", "weekly_summary", issues) {
        Some(summary) => {
            if let Some(summary) = get_object(summary, "$.weekly_summary", issues) {
                require_int(summary, "$.weekly_summary", "avg_daily_calories", 800..=8000, issues);
                require_number(summary, "$.weekly_summary", "avg_daily_protein", 0.0..=f64::MAX, issues);
                require_number(summary, "$.weekly_summary", "avg_daily_carbs", 0.0..=f64::MAX, issues);
                require_number(summary, "$.weekly_summary", "avg_daily_fats", 0.0..=f64::MAX, issues);
            }
        }
        None => {}
    }
}

fn check_day_meals(value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) -> Option<String> {
    let obj = get_object(value, path, issues)?;
    let label = check_weekday(obj, path, issues);

    let mut calories_sum: i64 = 0;
    let mut protein_sum = 0.0;
    let mut carbs_sum = 0.0;
    let mut fats_sum = 0.0;
    let mut all_meals_ok = true;

    for slot in ["breakfast", "lunch", "dinner"] {
        let meal_path = format!("{path}.{slot}");
        match require(obj, path, slot, issues) {
            Some(meal) => match check_meal_item(meal, &meal_path, slot, issues) {
                Some((cal, p, c, f)) => {
                    calories_sum += cal;
                    protein_sum += p;
                    carbs_sum += c;
                    fats_sum += f;
                }
                None => all_meals_ok = false,
            },
            None => all_meals_ok = false,
        }
    }

    if let Some(Value::Array(snacks)) = obj.get("snacks") {
        for (i, snack) in snacks.iter().enumerate() {
            let snack_path = format!("{path}.snacks[{i}]");
            match check_meal_item(snack, &snack_path, "snack", issues) {
                Some((cal, p, c, f)) => {
                    calories_sum += cal;
                    protein_sum += p;
                    carbs_sum += c;
                    fats_sum += f;
                }
                None => all_meals_ok = false,
            }
        }
    }

    let total_calories = require_int(obj, path, "total_calories", 0..=10_000, issues);
    let total_protein = require_number(obj, path, "total_protein", 0.0..=f64::MAX, issues);
    let total_carbs = require_number(obj, path, "total_carbs", 0.0..=f64::MAX, issues);
    let total_fats = require_number(obj, path, "total_fats", 0.0..=f64::MAX, issues);

    // Totals must be the exact sum of the day's meals, not approximately.
    if all_meals_ok {
        if let Some(total) = total_calories {
            if total != calories_sum {
                issues.push(ValidationIssue::new(
                    format!("{path}.total_calories"),
                    format!("is {total} but the day's meals sum to {calories_sum}"),
                ));
            }
        }
        for (key, declared, actual) in [
            ("total_protein", total_protein, protein_sum),
            ("total_carbs", total_carbs, carbs_sum),
            ("total_fats", total_fats, fats_sum),
        ] {
            if let Some(declared) = declared {
                if declared != actual {
                    issues.push(ValidationIssue::new(
                        format!("{path}.{key}"),
                        format!("is {declared} but the day's meals sum to {actual}"),
                    ));
                }
            }
        }
    }

    label
}

fn check_meal_item(
    value: &Value,
    path: &str,
    expected_type: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<(i64, f64, f64, f64)> {
    let obj = get_object(value, path, issues)?;
    let before = issues.len();

    require_str(obj, path, "name", issues);
    let calories = require_int(obj, path, "calories", 0..=5000, issues);
    let protein = require_number(obj, path, "protein", 0.0..=500.0, issues);
    let carbs = require_number(obj, path, "carbs", 0.0..=500.0, issues);
    let fats = require_number(obj, path, "fats", 0.0..=300.0, issues);
    require_string_array(obj, path, "ingredients", issues);
    require_string_array(obj, path, "instructions", issues);
    if let Some(meal_type) = require_str(obj, path, "meal_type", issues) {
        if !MEAL_TYPE_RE.is_match(meal_type) {
            issues.push(ValidationIssue::new(
                format!("{path}.meal_type"),
                format!("'{meal_type}' is not one of breakfast/lunch/dinner/snack"),
            ));
        } else if meal_type != expected_type {
            issues.push(ValidationIssue::new(
                format!("{path}.meal_type"),
                format!("is '{meal_type}' but this slot is '{expected_type}'"),
            ));
        }
    }
    optional_int(obj, path, "prep_time", 0..=300, issues);
    optional_int(obj, path, "cook_time", 0..=480, issues);

    if issues.len() > before {
        return None;
    }
    Some((calories?, protein?, carbs?, fats?))
}

// ========================
// Workout plan checks
// ========================

fn check_workout_plan(value: &Value, issues: &mut Vec<ValidationIssue>) {
    let Some(root) = get_object(value, "$", issues) else { return };

    let mut workout_day_count = None;
    let mut seen_days: Vec<String> = Vec::new();

    match require(root, "$", "weekly_plan", issues) {
        Some(Value::Array(days)) => {
            if days.is_empty() || days.len() > 7 {
                issues.push(ValidationIssue::new(
                    "$.weekly_plan",
                    format!("must contain 1-7 workout days, got {}", days.len()),
                ));
            } else {
                workout_day_count = Some(days.len() as i64);
            }
            for (i, day) in days.iter().enumerate() {
                let path = format!("$.weekly_plan[{i}]");
                if let Some(label) = check_workout_day(day, &path, issues) {
                    if seen_days.contains(&label) {
                        issues.push(ValidationIssue::new(
                            format!("{path}.day"),
                            format!("'{label}' appears more than once"),
                        ));
                    } else {
                        seen_days.push(label);
                    }
                }
            }
        }
        Some(_) => issues.push(ValidationIssue::new("$.weekly_plan", "must be an array")),
        None => {}
    }

    let mut rest_day_count: i64 = 0;
    if let Some(Value::Array(rest_days)) = root.get("rest_days") {
        rest_day_count = rest_days.len() as i64;
        for (i, rest) in rest_days.iter().enumerate() {
            let path = format!("$.rest_days[{i}]");
            if let Some(label) = check_rest_day(rest, &path, issues) {
                if seen_days.contains(&label) {
                    issues.push(ValidationIssue::new(
                        format!("{path}.day"),
                        format!("'{label}' appears more than once"),
                    ));
                } else {
                    seen_days.push(label);
                }
            }
        }
    }

    match require(root, "$", "weekly_summary", issues) {
        Some(summary) => {
            if let Some(summary) = get_object(summary, "$.weekly_summary", issues) {
                let declared_workout =
                    require_int(summary, "$.weekly_summary", "total_workout_days", 1..=7, issues);
                let declared_rest =
                    require_int(summary, "$.weekly_summary", "total_rest_days", 0..=6, issues);

                if let (Some(declared), Some(actual)) = (declared_workout, workout_day_count) {
                    if declared != actual {
                        issues.push(ValidationIssue::new(
                            "$.weekly_summary.total_workout_days",
                            format!("is {declared} but the plan lists {actual} workout days"),
                        ));
                    }
                }
                if let Some(declared) = declared_rest {
                    if declared != rest_day_count {
                        issues.push(ValidationIssue::new(
                            "$.weekly_summary.total_rest_days",
                            format!("is {declared} but the plan lists {rest_day_count} rest days"),
                        ));
                    }
                }
            }
        }
        None => {}
    }
}

fn check_workout_day(value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) -> Option<String> {
    let obj = get_object(value, path, issues)?;
    let label = check_weekday(obj, path, issues);

    require_str(obj, path, "workout_name", issues);

    match require(obj, path, "exercises", issues) {
        Some(Value::Array(exercises)) => {
            if exercises.is_empty() {
                issues.push(ValidationIssue::new(
                    format!("{path}.exercises"),
                    "a workout day must have at least one exercise",
                ));
            }
            for (i, exercise) in exercises.iter().enumerate() {
                check_exercise(exercise, &format!("{path}.exercises[{i}]"), issues);
            }
        }
        Some(_) => issues.push(ValidationIssue::new(format!("{path}.exercises"), "must be an array")),
        None => {}
    }

    optional_int(obj, path, "estimated_duration", 10..=300, issues);
    optional_enum(obj, path, "difficulty", &DIFFICULTY_RE, "beginner/intermediate/advanced", issues);
    optional_int(obj, path, "calories_burned", 0..=2000, issues);

    label
}

fn check_exercise(value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) {
    let Some(obj) = get_object(value, path, issues) else { return };
    require_str(obj, path, "name", issues);
    require_int(obj, path, "sets", 1..=20, issues);
    optional_int(obj, path, "duration", 0..=600, issues);
    optional_int(obj, path, "rest", 0..=600, issues);
    optional_enum(obj, path, "intensity", &INTENSITY_RE, "low/moderate/high", issues);
}

fn check_rest_day(value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) -> Option<String> {
    let obj = get_object(value, path, issues)?;
    let label = check_weekday(obj, path, issues);

    // A rest day carries no training work.
    if let Some(Value::Array(exercises)) = obj.get("exercises") {
        if !exercises.is_empty() {
            issues.push(ValidationIssue::new(
                format!("{path}.exercises"),
                "a rest day must not contain exercises",
            ));
        }
    }
    if let Some(flag) = obj.get("is_rest_day").and_then(Value::as_bool) {
        if !flag {
            issues.push(ValidationIssue::new(
                format!("{path}.is_rest_day"),
                "must be true for entries in rest_days",
            ));
        }
    }

    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meal(meal_type: &str, calories: i64, protein: f64, carbs: f64, fats: f64) -> Value {
        json!({
            "name": format!("Test {meal_type}"),
            "calories": calories,
            "protein": protein,
            "carbs": carbs,
            "fats": fats,
            "ingredients": ["ingredient"],
            "instructions": ["step"],
            "meal_type": meal_type,
            "prep_time": 10,
            "cook_time": 20
        })
    }

    fn day(label: &str) -> Value {
        json!({
            "day": label,
            "breakfast": meal("breakfast", 400, 30.0, 40.0, 12.0),
            "lunch": meal("lunch", 600, 45.0, 60.0, 18.0),
            "dinner": meal("dinner", 700, 50.0, 70.0, 22.0),
            "snacks": [meal("snack", 200, 10.0, 25.0, 6.0)],
            "total_calories": 1900,
            "total_protein": 135.0,
            "total_carbs": 195.0,
            "total_fats": 58.0
        })
    }

    fn valid_meal_plan() -> Value {
        let days: Vec<Value> = [
            "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
        ]
        .iter()
        .map(|d| day(d))
        .collect();
        json!({
            "weekly_plan": days,
            "weekly_summary": {
                "avg_daily_calories": 1900,
                "avg_daily_protein": 135.0,
                "avg_daily_carbs": 195.0,
                "avg_daily_fats": 58.0
            },
            "shopping_list": ["oats"],
            "meal_prep_tips": ["batch cook"],
            "nutritional_notes": "stay hydrated"
        })
    }

    fn workout_day(label: &str) -> Value {
        json!({
            "day": label,
            "workout_name": "Full Body",
            "focus": "Strength",
            "exercises": [{
                "name": "Squat",
                "sets": 4,
                "reps": "8-10",
                "rest": 90,
                "intensity": "moderate",
                "instructions": ["brace"],
                "target_muscles": ["quads"],
                "equipment": ["barbell"]
            }],
            "warm_up": ["bike"],
            "cool_down": ["stretch"],
            "estimated_duration": 60,
            "difficulty": "intermediate",
            "calories_burned": 400
        })
    }

    fn valid_workout_plan() -> Value {
        json!({
            "weekly_plan": [
                workout_day("monday"),
                workout_day("wednesday"),
                workout_day("friday")
            ],
            "rest_days": [
                {"day": "tuesday", "is_rest_day": true, "active_recovery": ["walk"]},
                {"day": "thursday", "is_rest_day": true},
                {"day": "saturday", "is_rest_day": true},
                {"day": "sunday", "is_rest_day": true}
            ],
            "weekly_summary": {
                "total_workout_days": 3,
                "total_rest_days": 4,
                "avg_workout_duration": 60,
                "total_weekly_calories_burned": 1200,
                "primary_focus": "Strength",
                "equipment_needed": ["barbell"]
            },
            "progression_notes": ["add 2.5kg weekly"],
            "safety_tips": ["warm up"]
        })
    }

    #[test]
    fn accepts_a_consistent_seven_day_meal_plan() {
        let raw = valid_meal_plan().to_string();
        let plan = validate_plan(PlanType::Meal, &raw).expect("valid plan");
        match plan {
            ValidatedPlan::Meal(p) => assert_eq!(p.weekly_plan.len(), 7),
            ValidatedPlan::Workout(_) => panic!("wrong variant"),
        }
    }

    #[test]
    fn rejects_a_six_day_meal_plan() {
        let mut value = valid_meal_plan();
        value["weekly_plan"].as_array_mut().expect("array").pop();
        let issues = validate_plan(PlanType::Meal, &value.to_string()).expect_err("must fail");
        assert!(issues.iter().any(|i| i.message.contains("exactly 7 days")));
    }

    #[test]
    fn rejects_duplicate_weekdays_in_meal_plan() {
        let mut value = valid_meal_plan();
        value["weekly_plan"][1] = day("monday");
        let issues = validate_plan(PlanType::Meal, &value.to_string()).expect_err("must fail");
        assert!(issues.iter().any(|i| i.message.contains("missing: tuesday")));
    }

    #[test]
    fn rejects_day_totals_that_do_not_match_the_meal_sum() {
        let mut value = valid_meal_plan();
        value["weekly_plan"][0]["total_calories"] = json!(1800);
        let issues = validate_plan(PlanType::Meal, &value.to_string()).expect_err("must fail");
        assert!(issues
            .iter()
            .any(|i| i.path == "$.weekly_plan[0].total_calories" && i.message.contains("1900")));
    }

    #[test]
    fn malformed_json_yields_a_single_issue_with_preview() {
        let issues =
            validate_plan(PlanType::Meal, "Sure! Here is your plan: {").expect_err("must fail");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("not valid JSON"));
        assert!(issues[0].message.contains("Sure! Here is your plan"));
    }

    #[test]
    fn collects_every_violation_not_just_the_first() {
        let mut value = valid_meal_plan();
        value["weekly_plan"][0]["breakfast"]["calories"] = json!(9000);
        value["weekly_plan"][2]["lunch"]["meal_type"] = json!("brunch");
        value["weekly_plan"][4]["dinner"]["ingredients"] = json!([]);
        let issues = validate_plan(PlanType::Meal, &value.to_string()).expect_err("must fail");
        assert!(issues.len() >= 3, "got {issues:?}");
        assert!(issues.iter().any(|i| i.path.contains("breakfast.calories")));
        assert!(issues.iter().any(|i| i.path.contains("lunch.meal_type")));
        assert!(issues.iter().any(|i| i.path.contains("dinner.ingredients")));
    }

    #[test]
    fn accepts_a_consistent_workout_plan() {
        let raw = valid_workout_plan().to_string();
        let plan = validate_plan(PlanType::Workout, &raw).expect("valid plan");
        match plan {
            ValidatedPlan::Workout(p) => {
                assert_eq!(p.weekly_plan.len(), 3);
                assert_eq!(p.rest_days.len(), 4);
            }
            ValidatedPlan::Meal(_) => panic!("wrong variant"),
        }
    }

    #[test]
    fn rejects_summary_counts_that_disagree_with_entries() {
        let mut value = valid_workout_plan();
        value["weekly_summary"]["total_workout_days"] = json!(5);
        let issues = validate_plan(PlanType::Workout, &value.to_string()).expect_err("must fail");
        assert!(issues
            .iter()
            .any(|i| i.path == "$.weekly_summary.total_workout_days" && i.message.contains("3")));
    }

    #[test]
    fn rejects_a_workout_day_without_exercises() {
        let mut value = valid_workout_plan();
        value["weekly_plan"][0]["exercises"] = json!([]);
        let issues = validate_plan(PlanType::Workout, &value.to_string()).expect_err("must fail");
        assert!(issues.iter().any(|i| i.message.contains("at least one exercise")));
    }

    #[test]
    fn rejects_out_of_range_sets() {
        let mut value = valid_workout_plan();
        value["weekly_plan"][0]["exercises"][0]["sets"] = json!(25);
        let issues = validate_plan(PlanType::Workout, &value.to_string()).expect_err("must fail");
        assert!(issues.iter().any(|i| i.path.contains("sets")));
    }

    #[test]
    fn rejects_a_rest_day_with_exercises() {
        let mut value = valid_workout_plan();
        value["rest_days"][0]["exercises"] = json!([{"name": "Squat", "sets": 3}]);
        let issues = validate_plan(PlanType::Workout, &value.to_string()).expect_err("must fail");
        assert!(issues.iter().any(|i| i.message.contains("must not contain exercises")));
    }

    #[test]
    fn rejects_duplicate_days_across_workout_and_rest() {
        let mut value = valid_workout_plan();
        value["rest_days"][0]["day"] = json!("monday");
        let issues = validate_plan(PlanType::Workout, &value.to_string()).expect_err("must fail");
        assert!(issues.iter().any(|i| i.message.contains("appears more than once")));
    }
}
