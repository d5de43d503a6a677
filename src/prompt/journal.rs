use crate::prompt::common::STRICT_JSON;

/// Prompt turning a free-text food description into macro nutrients.
pub fn food_nutrition_prompt(food_input: &str) -> String {
    format!(
        r#"You are a strict JSON API. Given this food input: '{food}', respond ONLY with this exact format:
{{ "item": ..., "quantity": ..., "calories": ..., "fat": ..., "carbs": ..., "protein": ... }}
Calories are kcal; fat, carbs and protein are grams.
{strict_json}"#,
        food = food_input,
        strict_json = STRICT_JSON
    )
}

/// Prompt estimating the calories burned by a fully described workout.
pub fn exercise_calories_prompt(exercise: &str, duration_minutes: u32, intensity: &str) -> String {
    format!(
        r#"You are a strict JSON API. Estimate the calories burned by an average adult doing {exercise} for {duration} minutes at {intensity} intensity.
Respond ONLY with this exact format:
{{ "exercise": ..., "calories": ... }}
{strict_json}"#,
        exercise = exercise,
        duration = duration_minutes,
        intensity = intensity,
        strict_json = STRICT_JSON
    )
}
