use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use super::{one_decimal, BotHandler, Command, Completion, Reply};
use crate::dialogue::Clock;
use crate::llm::{extract_json_object, numeric_field, text_field, LlmJsonError};
use crate::prompt::{food_nutrition_prompt, NUTRITIONIST_SYSTEM};
use crate::sheets::{delete_rows_for_date, rows_for_date, Spreadsheet};

pub const WORKSHEET: &str = "Calories";

/// Daily intake goals the summary reports progress against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DailyTargets {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

pub const DAILY_TARGETS: DailyTargets = DailyTargets {
    calories: 2130.0,
    protein: 160.0,
    fat: 60.0,
    carbs: 240.0,
};

const WELCOME: &str = "🥗 Welcome to NutritionBot! Send me what you ate, like '1 banana' or '2 eggs'.";

const HELP: &str = "Here are the available commands:\n\n\
/start - Welcome message and bot introduction.\n\
/summary - Get today's nutrition summary (calories, protein, fat, carbs).\n\
/close_day - Finalize today's progress and get a summary.\n\
/reset_day - Reset today's logged data (start fresh for the new day).\n\n\
You can also log your meals by simply typing them (e.g., '1 apple', '200g chicken').";

/// One food item as estimated by the model.
#[derive(Clone, Debug, PartialEq)]
pub struct NutritionEntry {
    pub item: String,
    pub quantity: String,
    pub calories: f64,
    pub fat: f64,
    pub carbs: f64,
    pub protein: f64,
}

impl NutritionEntry {
    pub fn from_reply(reply: &str) -> Result<Self, LlmJsonError> {
        let map = extract_json_object(reply)?;
        Ok(Self {
            item: text_field(&map, "item")?,
            quantity: text_field(&map, "quantity")?,
            calories: numeric_field(&map, "calories")?,
            fat: numeric_field(&map, "fat")?,
            carbs: numeric_field(&map, "carbs")?,
            protein: numeric_field(&map, "protein")?,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Totals {
    pub calories: f64,
    pub fat: f64,
    pub carbs: f64,
    pub protein: f64,
}

/// Sums today's rows; rows whose numbers do not parse are skipped.
pub fn daily_totals(rows: &[Vec<String>], date: &str) -> Totals {
    let mut totals = Totals::default();
    for row in rows_for_date(rows, date) {
        let cell = |i: usize| row.get(i).and_then(|v| v.trim().parse::<f64>().ok());
        if let (Some(calories), Some(fat), Some(carbs), Some(protein)) =
            (cell(3), cell(4), cell(5), cell(6))
        {
            totals.calories += calories;
            totals.fat += fat;
            totals.carbs += carbs;
            totals.protein += protein;
        }
    }
    totals
}

fn percent(value: f64, target: f64) -> String {
    one_decimal(value / target * 100.0)
}

pub fn render_summary(totals: &Totals, targets: &DailyTargets) -> String {
    format!(
        "📊 *Today's Nutrition Summary*\n\
         - Calories: {} kcal ({}%)\n\
         - Protein: {}g ({}%)\n\
         - Fat: {}g ({}%)\n\
         - Carbs: {}g ({}%)",
        one_decimal(totals.calories),
        percent(totals.calories, targets.calories),
        one_decimal(totals.protein),
        percent(totals.protein, targets.protein),
        one_decimal(totals.fat),
        percent(totals.fat, targets.fat),
        one_decimal(totals.carbs),
        percent(totals.carbs, targets.carbs),
    )
}

pub struct NutritionBot {
    sheet: Arc<dyn Spreadsheet>,
    llm: Arc<dyn Completion>,
    clock: Arc<dyn Clock>,
    targets: DailyTargets,
}

impl NutritionBot {
    pub fn new(sheet: Arc<dyn Spreadsheet>, llm: Arc<dyn Completion>, clock: Arc<dyn Clock>) -> Self {
        Self {
            sheet,
            llm,
            clock,
            targets: DAILY_TARGETS,
        }
    }

    fn today(&self) -> String {
        self.clock.today().to_string()
    }

    async fn log_food(&self, food_input: &str) -> Result<NutritionEntry> {
        let reply = self
            .llm
            .complete(NUTRITIONIST_SYSTEM, &food_nutrition_prompt(food_input))
            .await
            .ok_or_else(|| anyhow!("the language model did not respond"))?;
        let entry = NutritionEntry::from_reply(&reply)?;

        self.sheet
            .append_row(vec![
                json!(self.today()),
                json!(entry.item),
                json!(entry.quantity),
                json!(entry.calories),
                json!(entry.fat),
                json!(entry.carbs),
                json!(entry.protein),
            ])
            .await?;
        info!("Logged {} {} ({} kcal)", entry.quantity, entry.item, entry.calories);
        Ok(entry)
    }

    async fn summary(&self) -> Result<String> {
        let rows = self.sheet.rows().await?;
        Ok(render_summary(&daily_totals(&rows, &self.today()), &self.targets))
    }
}

#[async_trait]
impl BotHandler for NutritionBot {
    fn name(&self) -> &str {
        "NutritionBot"
    }

    async fn handle_command(&self, _chat_id: i64, command: Command) -> Reply {
        match command {
            Command::Start => Reply::plain(WELCOME),
            Command::Help => Reply::plain(HELP),
            Command::Summary => match self.summary().await {
                Ok(summary) => Reply::markdown(summary),
                Err(e) => {
                    error!("Could not build nutrition summary: {:?}", e);
                    Reply::plain(format!("❌ Could not get summary. Error: {}", e))
                }
            },
            Command::CloseDay => match self.summary().await {
                Ok(summary) => Reply::markdown(format!(
                    "{}\n\n🌙 Day closed. Great work today, see you tomorrow!",
                    summary
                )),
                Err(e) => {
                    error!("Could not close the day: {:?}", e);
                    Reply::plain(format!("❌ Could not close the day. Error: {}", e))
                }
            },
            Command::ResetDay => match delete_rows_for_date(self.sheet.as_ref(), &self.today()).await {
                Ok(_) => Reply::plain("✅ Today's log has been reset. You can start logging again!"),
                Err(e) => {
                    error!("Error resetting the day: {:?}", e);
                    Reply::plain(format!("❌ Could not reset the day. Error: {}", e))
                }
            },
        }
    }

    async fn handle_text(&self, _chat_id: i64, text: &str) -> Reply {
        let food_input = text.trim().to_lowercase();
        match self.log_food(&food_input).await {
            Ok(entry) => Reply::plain(format!(
                "✅ Logged: {} {}\nCalories: {} kcal\nFat: {}g, Carbs: {}g, Protein: {}g",
                entry.quantity, entry.item, entry.calories, entry.fat, entry.carbs, entry.protein
            )),
            Err(e) => {
                error!("Error logging nutrition data: {:?}", e);
                Reply::plain(format!("❌ Could not log nutrition data. Error: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::testing::CannedCompletion;
    use crate::dialogue::ManualClock;
    use crate::sheets::memory::MemorySheet;
    use chrono::{TimeZone, Utc};

    const APPLE: &str = r#"Sure! {"item": "apple", "quantity": "1 medium", "calories": 95, "fat": "0.3g", "carbs": "25g", "protein": "0.5 g"}"#;
    const CHICKEN: &str = r#"{"item": "chicken breast", "quantity": "200g", "calories": "330 kcal", "fat": 7.2, "carbs": 0, "protein": "62g"}"#;

    fn bot(replies: Vec<Option<&str>>) -> (Arc<MemorySheet>, Arc<CannedCompletion>, NutritionBot) {
        let sheet = Arc::new(MemorySheet::with_header(&[
            "Date", "Item", "Quantity", "Calories", "Fat", "Carbs", "Protein",
        ]));
        let llm = Arc::new(CannedCompletion::new(replies));
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap(),
        ));
        let bot = NutritionBot::new(sheet.clone(), llm.clone(), clock);
        (sheet, llm, bot)
    }

    #[test]
    fn test_entry_from_reply_cleans_units() {
        let entry = NutritionEntry::from_reply(APPLE).unwrap();
        assert_eq!(entry.item, "apple");
        assert_eq!(entry.quantity, "1 medium");
        assert_eq!(entry.fat, 0.3);
        assert_eq!(entry.protein, 0.5);

        assert!(matches!(
            NutritionEntry::from_reply("I am not sure"),
            Err(LlmJsonError::NoJsonObject)
        ));
        assert!(matches!(
            NutritionEntry::from_reply(r#"{"item": "tea", "quantity": "1 cup"}"#),
            Err(LlmJsonError::MissingField(field)) if field == "calories"
        ));
    }

    #[tokio::test]
    async fn test_log_food_and_summarize() {
        let (sheet, llm, bot) = bot(vec![Some(APPLE), Some(CHICKEN)]);
        sheet
            .append_row(vec![
                json!("2026-10-18"),
                json!("pizza"),
                json!("1 slice"),
                json!(285),
                json!(10),
                json!(36),
                json!(12),
            ])
            .await
            .unwrap();

        let reply = bot.handle_text(1, "  1 Apple ").await;
        assert!(reply.text.starts_with("✅ Logged: 1 medium apple"));
        assert!(llm.prompts.lock().unwrap()[0].contains("'1 apple'"));
        dispatch_text(&bot, "200g chicken").await;

        let rows = sheet.rows().await.unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2], vec!["2026-10-19", "apple", "1 medium", "95.0", "0.3", "25.0", "0.5"]);

        let summary = bot.handle_command(1, Command::Summary).await;
        assert!(summary.markdown);
        assert_eq!(
            summary.text,
            "📊 *Today's Nutrition Summary*\n\
             - Calories: 425.0 kcal (20.0%)\n\
             - Protein: 62.5g (39.1%)\n\
             - Fat: 7.5g (12.5%)\n\
             - Carbs: 25.0g (10.4%)"
        );

        let closed = bot.handle_command(1, Command::CloseDay).await;
        assert!(closed.text.starts_with("📊 *Today's Nutrition Summary*"));
        assert!(closed.text.contains("Day closed"));
    }

    async fn dispatch_text(bot: &NutritionBot, text: &str) {
        let reply = crate::bot::dispatch(bot, 1, text).await;
        assert!(reply.text.starts_with("✅"), "unexpected reply: {}", reply.text);
    }

    #[tokio::test]
    async fn test_bad_model_reply_is_reported() {
        let (sheet, _, bot) = bot(vec![Some("no idea, sorry"), None]);

        let reply = bot.handle_text(1, "mystery stew").await;
        assert_eq!(
            reply.text,
            "❌ Could not log nutrition data. Error: No valid JSON object found in response."
        );
        let reply = bot.handle_text(1, "mystery stew").await;
        assert!(reply.text.starts_with("❌ Could not log nutrition data."));
        assert_eq!(sheet.rows().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_day_keeps_other_days() {
        let (sheet, _, bot) = bot(vec![Some(APPLE)]);
        sheet
            .append_row(vec![json!("2026-10-18"), json!("soup"), json!("1 bowl"), json!(150), json!(5), json!(20), json!(6)])
            .await
            .unwrap();
        bot.handle_text(1, "1 apple").await;

        let reply = bot.handle_command(1, Command::ResetDay).await;
        assert_eq!(reply.text, "✅ Today's log has been reset. You can start logging again!");

        let rows = sheet.rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], "soup");
        assert_eq!(daily_totals(&rows, "2026-10-19"), Totals::default());
    }

    #[test]
    fn test_daily_totals_skip_malformed_rows() {
        let rows = vec![
            vec!["Date".to_string()],
            vec!["2026-10-19", "egg", "1", "70", "5", "0.5", "6"]
                .into_iter()
                .map(String::from)
                .collect(),
            vec!["2026-10-19", "???", "1", "lots", "5", "1", "1"]
                .into_iter()
                .map(String::from)
                .collect(),
            vec!["2026-10-19".to_string(), "short".to_string()],
        ];
        let totals = daily_totals(&rows, "2026-10-19");
        assert_eq!(totals.calories, 70.0);
        assert_eq!(totals.protein, 6.0);
    }
}
