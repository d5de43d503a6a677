// Declare submodules
mod common;
mod journal;
mod summarization;

pub use common::*;
pub use journal::{exercise_calories_prompt, food_nutrition_prompt};
pub use summarization::{keywords_prompt, summary_prompt};
