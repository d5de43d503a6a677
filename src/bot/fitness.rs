use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use super::{one_decimal, BotHandler, Command, Completion, Reply};
use crate::dialogue::{Clock, ExerciseRequest, SessionStore, SlotOutcome};
use crate::llm::{extract_json_object, numeric_field};
use crate::prompt::{exercise_calories_prompt, TRAINER_SYSTEM};
use crate::sheets::{delete_rows_for_date, rows_for_date, Spreadsheet};

pub const WORKSHEET: &str = "Workouts";

const WELCOME: &str = "🏋️ Welcome to FitnessBot! Tell me about your workout, like 'swimming 30 minutes moderate'.";

const HELP: &str = "Here are the available commands:\n\n\
/start - Welcome message and bot introduction.\n\
/summary - Get today's workout summary (sessions, minutes, calories burned).\n\
/close_day - Finalize today's progress and get a summary.\n\
/reset_day - Reset today's logged workouts.\n\n\
Log a workout by describing it (e.g., 'running 45 minutes high'). \
If something is missing I will ask for it.";

const NOT_UNDERSTOOD: &str =
    "I didn't catch a workout there. Try something like 'cycling 1 hour moderate'.";

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorkoutTotals {
    pub sessions: usize,
    pub minutes: f64,
    pub calories: f64,
}

/// Sums today's workouts; rows with unreadable numbers are skipped.
pub fn workout_totals(rows: &[Vec<String>], date: &str) -> WorkoutTotals {
    let mut totals = WorkoutTotals::default();
    for row in rows_for_date(rows, date) {
        let cell = |i: usize| row.get(i).and_then(|v| v.trim().parse::<f64>().ok());
        if let (Some(minutes), Some(calories)) = (cell(2), cell(4)) {
            totals.sessions += 1;
            totals.minutes += minutes;
            totals.calories += calories;
        }
    }
    totals
}

pub fn render_summary(totals: &WorkoutTotals) -> String {
    format!(
        "📊 *Today's Workout Summary*\n\
         - Sessions: {}\n\
         - Duration: {} min\n\
         - Calories burned: {} kcal",
        totals.sessions,
        one_decimal(totals.minutes),
        one_decimal(totals.calories),
    )
}

pub struct FitnessBot {
    sheet: Arc<dyn Spreadsheet>,
    llm: Arc<dyn Completion>,
    clock: Arc<dyn Clock>,
    sessions: SessionStore,
}

impl FitnessBot {
    pub fn new(
        sheet: Arc<dyn Spreadsheet>,
        llm: Arc<dyn Completion>,
        clock: Arc<dyn Clock>,
        session_ttl: std::time::Duration,
    ) -> Self {
        let sessions = SessionStore::new(clock.clone(), session_ttl);
        Self {
            sheet,
            llm,
            clock,
            sessions,
        }
    }

    fn today(&self) -> String {
        self.clock.today().to_string()
    }

    async fn estimate_calories(&self, request: &ExerciseRequest) -> Result<f64> {
        let prompt = exercise_calories_prompt(
            &request.exercise,
            request.duration_minutes,
            request.intensity.as_str(),
        );
        let reply = self
            .llm
            .complete(TRAINER_SYSTEM, &prompt)
            .await
            .ok_or_else(|| anyhow!("the language model did not respond"))?;
        let map = extract_json_object(&reply)?;
        Ok(numeric_field(&map, "calories")?)
    }

    async fn log_workout(&self, request: &ExerciseRequest) -> Result<f64> {
        let calories = self.estimate_calories(request).await?;
        self.sheet
            .append_row(vec![
                json!(self.today()),
                json!(request.exercise),
                json!(request.duration_minutes),
                json!(request.intensity.as_str()),
                json!(calories),
            ])
            .await?;
        info!(
            "Logged {} min of {} at {} intensity ({} kcal)",
            request.duration_minutes, request.exercise, request.intensity, calories
        );
        Ok(calories)
    }

    async fn summary(&self) -> Result<String> {
        let rows = self.sheet.rows().await?;
        Ok(render_summary(&workout_totals(&rows, &self.today())))
    }
}

#[async_trait]
impl BotHandler for FitnessBot {
    fn name(&self) -> &str {
        "FitnessBot"
    }

    async fn handle_command(&self, chat_id: i64, command: Command) -> Reply {
        match command {
            Command::Start => {
                self.sessions.clear(chat_id);
                Reply::plain(WELCOME)
            }
            Command::Help => Reply::plain(HELP),
            Command::Summary => match self.summary().await {
                Ok(summary) => Reply::markdown(summary),
                Err(e) => {
                    error!("Could not build workout summary: {:?}", e);
                    Reply::plain(format!("❌ Could not get summary. Error: {}", e))
                }
            },
            Command::CloseDay => match self.summary().await {
                Ok(summary) => Reply::markdown(format!(
                    "{}\n\n🌙 Day closed. Rest well, see you tomorrow!",
                    summary
                )),
                Err(e) => {
                    error!("Could not close the day: {:?}", e);
                    Reply::plain(format!("❌ Could not close the day. Error: {}", e))
                }
            },
            Command::ResetDay => {
                self.sessions.clear(chat_id);
                match delete_rows_for_date(self.sheet.as_ref(), &self.today()).await {
                    Ok(_) => Reply::plain("✅ Today's workouts have been reset. You can start logging again!"),
                    Err(e) => {
                        error!("Error resetting the day: {:?}", e);
                        Reply::plain(format!("❌ Could not reset the day. Error: {}", e))
                    }
                }
            }
        }
    }

    async fn handle_text(&self, chat_id: i64, text: &str) -> Reply {
        match self.sessions.handle_message(chat_id, text) {
            SlotOutcome::Ignored => Reply::plain(NOT_UNDERSTOOD),
            SlotOutcome::Incomplete { missing } => {
                let question = missing
                    .first()
                    .map(|slot| slot.question())
                    .unwrap_or(NOT_UNDERSTOOD);
                Reply::plain(question)
            }
            SlotOutcome::Complete(request) => match self.log_workout(&request).await {
                Ok(calories) => Reply::plain(format!(
                    "✅ Logged: {} min of {} ({} intensity)\nCalories burned: {} kcal",
                    request.duration_minutes, request.exercise, request.intensity, calories
                )),
                Err(e) => {
                    error!("Error logging workout: {:?}", e);
                    Reply::plain(format!("❌ Could not log workout. Error: {}", e))
                }
            },
        }
    }
}
