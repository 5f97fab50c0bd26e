//! Prompt templates for plan generation.
//!
//! Rendering is plain string substitution over `{name}` placeholders; the
//! orchestrator treats the templates as opaque.

use crate::plans::dto::{NutritionProfile, PlanType, QuizAnswers};
use crate::plans::validate::ValidationIssue;

pub const SYSTEM_PREAMBLE: &str =
    "You are a professional nutritionist and fitness trainer. Return only valid JSON.";

const MEAL_PLAN_TEMPLATE: &str = r#"You are a professional nutrition assistant and meal designer, helping create realistic, evidence-based plans.
Create a deeply personalized 7-day meal plan optimized for the user's preferences, goals, and calorie/macro targets.

User Profile:
- Age: {age} years | Gender: {gender} | Body Type: {body_type}
- Height: {height} | Current Weight: {current_weight} | Target Weight: {target_weight}
- Body Fat Percentage: {body_fat}
- Primary Goal: {main_goal} | Secondary Goals: {secondary_goals} | Timeframe: {time_frame}
- Motivation Level: {motivation_level}/10 | Main Challenges: {challenges}
- Health Conditions: {health_conditions} | Medications: {medications}
- Food Allergies: {food_allergies} | Disliked Foods: {disliked_foods}
- Dietary Style: {dietary_style} | Meals per Day: {meals_per_day}
- Cooking Skill: {cooking_skill} | Cooking Time: {cooking_time} | Budget: {grocery_budget}
- Location: {country} | Lifestyle: {lifestyle}
- Exercise Frequency: {exercise_frequency}

Calculated Nutrition Targets:
- Daily Calories: {daily_calories} kcal
- Protein: {protein}g ({protein_pct}% of calories)
- Carbohydrates: {carbs}g ({carbs_pct}% of calories)
- Fats: {fats}g ({fat_pct}% of calories)

Requirements:
1. Respect every reported health condition, allergy and dislike; suggest safe substitutions.
2. Adapt recipes to ingredient availability in {country} and the stated budget and cooking-time limits.
3. Every day's meals must add up to the daily calorie and macro targets above.
4. Cover all seven weekdays, each with breakfast, lunch and dinner (snacks optional).

{json_format}

Double-check all values align with the user's calorie/macro targets before finalizing the JSON output."#;

const WORKOUT_PLAN_TEMPLATE: &str = r#"You are a certified fitness coach and strength & conditioning specialist.
Create a comprehensive, science-based 7-day workout plan that maximizes results while respecting the user's limitations and lifestyle.

User Profile:
- Age: {age} years | Gender: {gender} | Body Type: {body_type}
- Height: {height} | Current Weight: {current_weight} | Target Weight: {target_weight}
- Body Fat Percentage: {body_fat}
- Primary Goal: {main_goal} | Secondary Goals: {secondary_goals} | Timeframe: {time_frame}
- Motivation Level: {motivation_level}/10 | Main Challenges: {challenges}
- Health Conditions: {health_conditions} | Injuries: {injuries} | Medications: {medications}
- Sleep Quality: {sleep_quality} | Stress Level: {stress_level}/10
- Current Activity Level: {exercise_frequency}
- Preferred Exercise Types: {preferred_exercise}
- Training Locations: {training_environment}
- Available Equipment: {equipment}
- Occupation: {occupation} | Lifestyle: {lifestyle}

Programming principles:
1. Match volume and intensity to the primary goal and current activity level.
2. Only program exercises that fit the listed locations and equipment.
3. Schedule recovery: every rest day is an explicit entry with no exercises.
4. The weekly summary counts must match the listed workout and rest days exactly.

{json_format}"#;

const MEAL_PLAN_JSON_FORMAT: &str = r#"Return ONLY valid JSON - no markdown fences or extra explanations.
Use this exact structure and field names:

{
  "weekly_plan": [
    {
      "day": "monday",
      "breakfast": {
        "name": "Meal name",
        "calories": 450,
        "protein": 30.0,
        "carbs": 45.0,
        "fats": 15.0,
        "ingredients": ["item 1", "item 2"],
        "instructions": ["step 1", "step 2"],
        "meal_type": "breakfast",
        "prep_time": 10,
        "cook_time": 15
      },
      "lunch": { "same shape, meal_type": "lunch" },
      "dinner": { "same shape, meal_type": "dinner" },
      "snacks": [ { "same shape, meal_type": "snack" } ],
      "total_calories": 2100,
      "total_protein": 150.0,
      "total_carbs": 220.0,
      "total_fats": 70.0
    }
  ],
  "weekly_summary": {
    "avg_daily_calories": 2100,
    "avg_daily_protein": 150.0,
    "avg_daily_carbs": 220.0,
    "avg_daily_fats": 70.0
  },
  "shopping_list": ["..."],
  "meal_prep_tips": ["..."],
  "nutritional_notes": "..."
}

weekly_plan must contain exactly 7 entries, one per weekday (monday..sunday).
Each day's total_* fields must equal the exact sum of that day's meals."#;

const WORKOUT_PLAN_JSON_FORMAT: &str = r#"Return ONLY valid JSON - no markdown fences or extra explanations.
Use this exact structure and field names:

{
  "weekly_plan": [
    {
      "day": "monday",
      "workout_name": "Upper Body Strength",
      "focus": "Upper Body",
      "exercises": [
        {
          "name": "Bench Press",
          "sets": 4,
          "reps": "8-12",
          "rest": 90,
          "intensity": "moderate",
          "instructions": ["cue 1"],
          "target_muscles": ["chest"],
          "equipment": ["barbell"]
        }
      ],
      "warm_up": ["5 min light cardio"],
      "cool_down": ["stretching"],
      "estimated_duration": 60,
      "difficulty": "intermediate",
      "calories_burned": 400
    }
  ],
  "rest_days": [
    { "day": "sunday", "is_rest_day": true, "active_recovery": ["light walking"], "notes": "..." }
  ],
  "weekly_summary": {
    "total_workout_days": 5,
    "total_rest_days": 2,
    "avg_workout_duration": 60,
    "total_weekly_calories_burned": 2000,
    "primary_focus": "...",
    "equipment_needed": ["..."]
  },
  "progression_notes": ["..."],
  "safety_tips": ["..."]
}

total_workout_days must equal the number of weekly_plan entries and
total_rest_days the number of rest_days entries; no weekday may appear twice."#;

/// Substitute `{name}` placeholders. Unknown placeholders are left in place.
fn render(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

fn join_or(list: Option<&Vec<String>>, fallback: &str) -> String {
    match list {
        Some(items) if !items.is_empty() => items.join(", "),
        _ => fallback.to_string(),
    }
}

fn text_or(value: Option<&String>, fallback: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.clone(),
        _ => fallback.to_string(),
    }
}

fn body_fat_display(profile: &NutritionProfile) -> String {
    profile
        .body_fat_percentage
        .map(|bf| format!("{bf}%"))
        .unwrap_or_else(|| "Not provided".to_string())
}

fn shared_vars(answers: &QuizAnswers, profile: &NutritionProfile) -> Vec<(&'static str, String)> {
    vec![
        ("age", answers.age.to_string()),
        ("gender", answers.gender.clone()),
        ("height", profile.display.height.clone()),
        ("current_weight", profile.display.weight.clone()),
        ("target_weight", profile.display.target_weight.clone()),
        ("body_fat", body_fat_display(profile)),
        ("main_goal", answers.main_goal.clone()),
        ("secondary_goals", join_or(answers.secondary_goals.as_ref(), "None")),
        ("time_frame", answers.time_frame.clone()),
        ("body_type", text_or(answers.body_type.as_ref(), "Not specified")),
        ("motivation_level", answers.motivation_level.to_string()),
        ("challenges", join_or(answers.challenges.as_ref(), "None reported")),
        ("health_conditions", join_or(answers.health_conditions.as_ref(), "None reported")),
        ("medications", text_or(answers.medications.as_ref(), "None")),
        ("country", text_or(answers.country.as_ref(), "Not specified")),
        ("lifestyle", answers.lifestyle.clone()),
        ("exercise_frequency", answers.exercise_frequency.clone()),
    ]
}

pub fn plan_prompt(plan_type: PlanType, answers: &QuizAnswers, profile: &NutritionProfile) -> String {
    match plan_type {
        PlanType::Meal => meal_plan_prompt(answers, profile),
        PlanType::Workout => workout_plan_prompt(answers, profile),
    }
}

pub fn meal_plan_prompt(answers: &QuizAnswers, profile: &NutritionProfile) -> String {
    let mut vars = shared_vars(answers, profile);
    vars.extend([
        ("food_allergies", text_or(answers.food_allergies.as_ref(), "None")),
        ("disliked_foods", text_or(answers.disliked_foods.as_ref(), "None")),
        ("dietary_style", answers.dietary_style.clone()),
        ("meals_per_day", answers.meals_per_day.clone()),
        ("cooking_skill", answers.cooking_skill.clone()),
        ("cooking_time", answers.cooking_time.clone()),
        ("grocery_budget", answers.grocery_budget.clone()),
        ("daily_calories", profile.goal_calories.to_string()),
        ("protein", profile.macros.protein_g.to_string()),
        ("carbs", profile.macros.carbs_g.to_string()),
        ("fats", profile.macros.fat_g.to_string()),
        ("protein_pct", profile.macros.protein_pct_of_calories.to_string()),
        ("carbs_pct", profile.macros.carbs_pct_of_calories.to_string()),
        ("fat_pct", profile.macros.fat_pct_of_calories.to_string()),
        ("json_format", MEAL_PLAN_JSON_FORMAT.to_string()),
    ]);
    render(MEAL_PLAN_TEMPLATE, &vars)
}

pub fn workout_plan_prompt(answers: &QuizAnswers, profile: &NutritionProfile) -> String {
    let mut vars = shared_vars(answers, profile);
    vars.extend([
        ("injuries", text_or(answers.injuries.as_ref(), "None")),
        ("sleep_quality", answers.sleep_quality.clone()),
        ("stress_level", answers.stress_level.to_string()),
        ("preferred_exercise", answers.preferred_exercise.join(", ")),
        ("training_environment", answers.training_environment.join(", ")),
        ("equipment", join_or(answers.equipment.as_ref(), "Bodyweight only")),
        ("occupation", text_or(answers.occupation_activity.as_ref(), "Not specified")),
        ("json_format", WORKOUT_PLAN_JSON_FORMAT.to_string()),
    ]);
    render(WORKOUT_PLAN_TEMPLATE, &vars)
}

/// Build the follow-up prompt after a failed validation pass: the base
/// prompt plus the concrete field-level problems from the previous attempt.
pub fn repair_prompt(base_prompt: &str, attempt: u32, issues: &[ValidationIssue]) -> String {
    let mut out = String::with_capacity(base_prompt.len() + 512);
    out.push_str(base_prompt);
    out.push_str("\n\nYour previous response (attempt ");
    out.push_str(&attempt.to_string());
    out.push_str(") was rejected because of these problems:\n");
    for issue in issues {
        out.push_str("- ");
        out.push_str(&issue.to_string());
        out.push('\n');
    }
    out.push_str("Produce a corrected response that fixes every listed problem. Return only valid JSON.");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plans::profile;

    fn answers_and_profile() -> (QuizAnswers, NutritionProfile) {
        let json = serde_json::json!({
            "age": 30,
            "gender": "male",
            "height": {"cm": 180},
            "currentWeight": {"kg": 85},
            "targetWeight": {"kg": 75},
            "mainGoal": "Weight loss",
            "timeFrame": "6 months",
            "lifestyle": "busy",
            "groceryBudget": "medium",
            "dietaryStyle": "balanced",
            "mealsPerDay": "3",
            "motivationLevel": 8,
            "stressLevel": 4,
            "sleepQuality": "good",
            "exerciseFrequency": "3-4 times/week",
            "preferredExercise": ["weightlifting"],
            "trainingEnvironment": ["gym"],
            "cookingSkill": "intermediate",
            "cookingTime": "30 minutes",
        });
        let answers: QuizAnswers = serde_json::from_value(json).expect("answers");
        let profile = profile::compute(&answers).expect("profile");
        (answers, profile)
    }

    #[test]
    fn meal_prompt_substitutes_all_placeholders() {
        let (answers, profile) = answers_and_profile();
        let prompt = meal_plan_prompt(&answers, &profile);
        assert!(prompt.contains("180 cm"));
        assert!(prompt.contains(&profile.goal_calories.to_string()));
        assert!(prompt.contains("weekly_plan"));
        assert!(!prompt.contains("{age}"));
        assert!(!prompt.contains("{daily_calories}"));
    }

    #[test]
    fn workout_prompt_substitutes_all_placeholders() {
        let (answers, profile) = answers_and_profile();
        let prompt = workout_plan_prompt(&answers, &profile);
        assert!(prompt.contains("weightlifting"));
        assert!(prompt.contains("total_workout_days"));
        assert!(!prompt.contains("{equipment}"));
        assert!(!prompt.contains("{occupation}"));
    }

    #[test]
    fn repair_prompt_lists_every_issue_and_the_attempt() {
        let issues = vec![
            ValidationIssue::new("weekly_plan", "must contain exactly 7 days, got 6"),
            ValidationIssue::new("weekly_plan[0].breakfast.calories", "must be between 0 and 5000"),
        ];
        let repaired = repair_prompt("BASE", 2, &issues);
        assert!(repaired.starts_with("BASE"));
        assert!(repaired.contains("attempt 2"));
        assert!(repaired.contains("exactly 7 days"));
        assert!(repaired.contains("breakfast.calories"));
    }
}
