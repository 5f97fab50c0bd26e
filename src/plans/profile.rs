use tracing::warn;

use crate::error::ProfileError;
use crate::plans::dto::{DisplayStrings, Macros, NutritionProfile, QuizAnswers};

/// Activity multiplier lookup keyed by substrings of the exercise-frequency
/// answer. First match wins.
const ACTIVITY_MULTIPLIERS: &[(&str, f64)] = &[
    ("never", 1.2),
    ("rarely", 1.2),
    ("sedentary", 1.2),
    ("1-2", 1.375),
    ("once", 1.375),
    ("3-4", 1.55),
    ("5-6", 1.725),
    ("every day", 1.9),
    ("daily", 1.9),
    ("7", 1.9),
];

const DEFAULT_ACTIVITY_MULTIPLIER: f64 = 1.375;

/// Occupation keywords that shift the activity multiplier. Physically
/// demanding jobs push it up, desk jobs pull it down; the result is clamped
/// to [1.2, 1.9] either way.
const PHYSICAL_OCCUPATION_KEYWORDS: &[&str] = &[
    "construction", "warehouse", "farm", "nurse", "labor", "labour", "landscap",
    "waiter", "waitress", "delivery", "mechanic", "cleaner", "chef", "builder",
];

const SEDENTARY_OCCUPATION_KEYWORDS: &[&str] = &[
    "desk", "office", "driver", "programmer", "developer", "accountant",
    "writer", "remote", "analyst",
];

const PHYSICAL_NUDGE: f64 = 0.15;
const SEDENTARY_NUDGE: f64 = -0.10;
const ACTIVITY_MIN: f64 = 1.2;
const ACTIVITY_MAX: f64 = 1.9;

/// Goal-calorie multiplier keyed by substrings of the main goal. First match
/// wins; anything unmatched is maintenance.
const GOAL_MULTIPLIERS: &[(&str, f64)] = &[
    ("lose weight", 0.8),
    ("weight loss", 0.8),
    ("lose fat", 0.8),
    ("lose", 0.8),
    ("cut", 0.85),
    ("shred", 0.85),
    ("build muscle", 1.1),
    ("muscle gain", 1.1),
    ("gain weight", 1.15),
    ("bulk", 1.15),
    ("gain", 1.1),
    ("recomposition", 1.0),
    ("tone", 0.9),
    ("maintain", 1.0),
];

/// Kcal per kg of body weight change, used for the weeks-to-goal estimate.
const KCAL_PER_KG: f64 = 7700.0;

/// Safety headroom above TDEE for surplus goals.
const SURPLUS_CAP: f64 = 700.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sex {
    Male,
    Female,
    Other,
}

fn parse_sex(raw: &str) -> Result<Sex, ProfileError> {
    let token = raw.trim().to_lowercase();
    if token.is_empty() {
        return Err(ProfileError::UnsupportedSex);
    }
    match token.as_str() {
        "male" => Ok(Sex::Male),
        "female" => Ok(Sex::Female),
        other => {
            warn!(sex = other, "unrecognized sex token, applying non-male defaults");
            Ok(Sex::Other)
        }
    }
}

/// Compute the full nutrition profile for one quiz submission.
///
/// Pure and deterministic: same answers, same profile.
pub fn compute(answers: &QuizAnswers) -> Result<NutritionProfile, ProfileError> {
    if !(10..=120).contains(&answers.age) {
        return Err(ProfileError::InvalidAge(answers.age));
    }
    let age = answers.age as f64;
    let sex = parse_sex(&answers.gender)?;

    let height = answers.height.resolve("height")?;
    let height_cm = height.centimeters();
    if height_cm <= 0.0 {
        return Err(ProfileError::ImplausibleMeasurement { field: "height", value: height_cm });
    }

    let weight = answers.current_weight.resolve("currentWeight")?;
    let weight_kg = weight.kilograms();
    if weight_kg <= 0.0 {
        return Err(ProfileError::ImplausibleMeasurement { field: "currentWeight", value: weight_kg });
    }

    let target = answers.target_weight.resolve_optional("targetWeight")?;
    let target_kg = target.map(|t| t.kilograms());

    let height_m = height_cm / 100.0;
    let bmi = round1(weight_kg / (height_m * height_m));

    let body_fat = body_fat_percentage(answers, sex, height_cm);
    let bmr = round1(bmr_kcal(sex, age, weight_kg, height_cm, body_fat));

    let activity = activity_multiplier(&answers.exercise_frequency, answers.occupation_activity.as_deref());
    let tdee = round1(bmr * activity);

    let raw_goal = tdee * goal_multiplier(&answers.main_goal);

    // Hard safety bound: never below max(1.1*BMR, sex floor), never more
    // than 700 kcal above TDEE.
    let floor = (bmr * 1.1).max(calorie_floor(sex));
    let cap = (tdee + SURPLUS_CAP).max(floor);
    let goal_target = raw_goal.clamp(floor, cap);

    let (macros, goal_calories) = macro_split(answers, weight_kg, goal_target, floor, cap)?;

    let estimated_weeks_to_goal = target_kg.and_then(|t| {
        let daily_delta = (tdee - goal_calories as f64).abs();
        let weight_delta = (t - weight_kg).abs();
        if daily_delta == 0.0 || weight_delta == 0.0 {
            None
        } else {
            Some(round1(weight_delta * KCAL_PER_KG / (daily_delta * 7.0)))
        }
    });

    Ok(NutritionProfile {
        bmi,
        bmr,
        tdee,
        body_fat_percentage: body_fat,
        macros,
        goal_calories,
        goal_weight: target_kg.unwrap_or(weight_kg),
        estimated_weeks_to_goal,
        display: DisplayStrings {
            weight: weight.display(),
            height: height.display(),
            target_weight: target.map(|t| t.display()).unwrap_or_else(|| weight.display()),
        },
    })
}

/// User-supplied body fat when plausible, otherwise the Navy circumference
/// estimate. Unknown (None) for unrecognized sex tokens or missing tapes.
fn body_fat_percentage(answers: &QuizAnswers, sex: Sex, height_cm: f64) -> Option<f64> {
    if let Some(bf) = answers.body_fat {
        if (2.0..=60.0).contains(&bf) {
            return Some(bf);
        }
    }
    navy_body_fat(answers, sex, height_cm)
}

fn navy_body_fat(answers: &QuizAnswers, sex: Sex, height_cm: f64) -> Option<f64> {
    let neck = answers.neck.resolve_optional("neck").ok()??.centimeters();
    let waist = answers.waist.resolve_optional("waist").ok()??.centimeters();

    let estimate = match sex {
        Sex::Male => {
            if waist <= neck {
                return None;
            }
            495.0
                / (1.0324 - 0.19077 * (waist - neck).log10() + 0.15456 * height_cm.log10())
                - 450.0
        }
        Sex::Female => {
            let hip = answers.hip.resolve_optional("hip").ok()??.centimeters();
            if waist + hip <= neck {
                return None;
            }
            495.0
                / (1.29579 - 0.35004 * (waist + hip - neck).log10() + 0.22100 * height_cm.log10())
                - 450.0
        }
        Sex::Other => return None,
    };

    if estimate.is_finite() && (2.0..=60.0).contains(&estimate) {
        Some(round1(estimate))
    } else {
        None
    }
}

/// Katch-McArdle when a usable body-fat estimate exists, otherwise
/// Mifflin-St Jeor with the sex constant.
fn bmr_kcal(sex: Sex, age: f64, weight_kg: f64, height_cm: f64, body_fat: Option<f64>) -> f64 {
    if let Some(bf) = body_fat {
        if (2.0..=60.0).contains(&bf) {
            let lean_mass = weight_kg * (1.0 - bf / 100.0);
            return 370.0 + 21.6 * lean_mass;
        }
    }
    let sex_constant = match sex {
        Sex::Male => 5.0,
        Sex::Female => -161.0,
        Sex::Other => -78.0,
    };
    10.0 * weight_kg + 6.25 * height_cm - 5.0 * age + sex_constant
}

fn activity_multiplier(exercise_frequency: &str, occupation: Option<&str>) -> f64 {
    let frequency = exercise_frequency.to_lowercase();
    let mut multiplier = ACTIVITY_MULTIPLIERS
        .iter()
        .find(|(needle, _)| frequency.contains(needle))
        .map(|(_, m)| *m)
        .unwrap_or(DEFAULT_ACTIVITY_MULTIPLIER);

    if let Some(occupation) = occupation {
        let occupation = occupation.to_lowercase();
        if PHYSICAL_OCCUPATION_KEYWORDS.iter().any(|k| occupation.contains(k)) {
            multiplier += PHYSICAL_NUDGE;
        } else if SEDENTARY_OCCUPATION_KEYWORDS.iter().any(|k| occupation.contains(k)) {
            multiplier += SEDENTARY_NUDGE;
        }
    }

    multiplier.clamp(ACTIVITY_MIN, ACTIVITY_MAX)
}

fn goal_multiplier(main_goal: &str) -> f64 {
    let goal = main_goal.to_lowercase();
    GOAL_MULTIPLIERS
        .iter()
        .find(|(needle, _)| goal.contains(needle))
        .map(|(_, m)| *m)
        .unwrap_or(1.0)
}

const fn calorie_floor(sex: Sex) -> f64 {
    match sex {
        Sex::Male => 1500.0,
        // Open question upstream: any unrecognized token gets the
        // conservative non-male floor.
        Sex::Female | Sex::Other => 1200.0,
    }
}

/// Split the calorie target into whole-gram macros. The carb bucket absorbs
/// the rounding residual, so the returned goal is the exact calorie sum of
/// the three buckets and still sits inside [floor, cap].
fn macro_split(
    answers: &QuizAnswers,
    weight_kg: f64,
    goal_target: f64,
    floor: f64,
    cap: f64,
) -> Result<(Macros, i32), ProfileError> {
    let style = answers.dietary_style.to_lowercase();
    let fat_fraction = if style.contains("keto") {
        0.35
    } else if style.contains("vegan") {
        0.25
    } else {
        0.28
    };

    let protein_per_kg = if answers.main_goal.to_lowercase().contains("recomposition") {
        2.0
    } else {
        1.8
    };

    let protein_g = (weight_kg * protein_per_kg).round() as i32;
    let fat_g = (goal_target * fat_fraction / 9.0).round() as i32;
    let remainder = goal_target - f64::from(protein_g * 4) - f64::from(fat_g * 9);
    let mut carbs_g = ((remainder / 4.0).round() as i32).max(0);

    let mut goal_calories = protein_g * 4 + fat_g * 9 + carbs_g * 4;
    // The exact integer sum lands within 2 kcal of the clamped target; one
    // whole-gram carb nudge is enough if that crossed a bound.
    let floor_i = floor.ceil() as i32;
    let cap_i = (cap.floor() as i32).max(floor_i);
    if goal_calories < floor_i {
        carbs_g += 1;
        goal_calories += 4;
    } else if goal_calories > cap_i && carbs_g > 0 {
        carbs_g -= 1;
        goal_calories -= 4;
    }

    if goal_calories <= 0 {
        return Err(ProfileError::ZeroCalorieTarget);
    }

    let pct = |cal: i32| ((f64::from(cal) / f64::from(goal_calories)) * 100.0).round() as i32;
    let macros = Macros {
        protein_g,
        carbs_g,
        fat_g,
        protein_pct_of_calories: pct(protein_g * 4),
        carbs_pct_of_calories: pct(carbs_g * 4),
        fat_pct_of_calories: pct(fat_g * 9),
    };

    Ok((macros, goal_calories))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
