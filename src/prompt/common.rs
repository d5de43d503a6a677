// System instructions shared by the news prompts.
pub const CRYPTO_SUMMARIZER_SYSTEM: &str =
    "You summarize top crypto news articles using full article content.";

pub const NUTRITIONIST_SYSTEM: &str = "You are a nutritionist.";

pub const TRAINER_SYSTEM: &str =
    "You are a personal trainer who estimates energy expenditure for workouts.";

pub const STRICT_JSON: &str = r#"
Respond ONLY with a single JSON object in exactly the format shown.
Do not add commentary, Markdown code fences, or any text before or after the JSON.
"#;
