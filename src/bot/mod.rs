//! Telegram journaling bots and the polling loop that drives them.

pub mod fitness;
pub mod nutrition;

pub use fitness::FitnessBot;
pub use nutrition::NutritionBot;

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::llm::generate_llm_response;
use crate::telegram::TelegramClient;
use crate::LLMParams;

const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Summary,
    CloseDay,
    ResetDay,
}

impl Command {
    /// Reads `/name` or `/name@BotName`, ignoring any arguments.
    ///
    /// Plain text is `None`; an unrecognized command comes back as `Err(name)`.
    pub fn parse(text: &str) -> Option<Result<Command, String>> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name).to_lowercase();
        Some(match name.as_str() {
            "start" => Ok(Command::Start),
            "help" => Ok(Command::Help),
            "summary" => Ok(Command::Summary),
            "close_day" => Ok(Command::CloseDay),
            "reset_day" => Ok(Command::ResetDay),
            _ => Err(name),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub text: String,
    pub markdown: bool,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markdown: false,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markdown: true,
        }
    }
}

/// Anything that turns a system + user prompt into model text.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Option<String>;
}

#[async_trait]
impl Completion for LLMParams {
    async fn complete(&self, system: &str, prompt: &str) -> Option<String> {
        generate_llm_response(system, prompt, self).await
    }
}

#[async_trait]
pub trait BotHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle_command(&self, chat_id: i64, command: Command) -> Reply;

    async fn handle_text(&self, chat_id: i64, text: &str) -> Reply;
}

/// Routes one incoming message to the handler.
pub async fn dispatch<H: BotHandler + ?Sized>(handler: &H, chat_id: i64, text: &str) -> Reply {
    match Command::parse(text) {
        Some(Ok(command)) => handler.handle_command(chat_id, command).await,
        Some(Err(name)) => {
            warn!("{}: unknown command /{}", handler.name(), name);
            Reply::plain("Unknown command. Send /help to see what I can do.")
        }
        None => handler.handle_text(chat_id, text).await,
    }
}

/// Long-polls Telegram and answers each text message in arrival order until `shutdown`.
pub async fn run_polling<H, F>(client: &TelegramClient, handler: &H, shutdown: F) -> Result<()>
where
    H: BotHandler + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut offset = 0;
    info!("{} is running", handler.name());

    loop {
        let updates = tokio::select! {
            _ = &mut shutdown => {
                info!("{} shutting down", handler.name());
                return Ok(());
            }
            result = client.get_updates(offset, POLL_TIMEOUT_SECS) => result,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                error!("Failed to fetch updates: {:?}", e);
                sleep(POLL_ERROR_BACKOFF).await;
                continue;
            }
        };

        for update in updates {
            offset = update.update_id + 1;
            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text.as_deref() else {
                continue;
            };

            let reply = dispatch(handler, message.chat.id, text).await;
            if let Err(e) = client
                .send_message(message.chat.id, &reply.text, reply.markdown)
                .await
            {
                error!("Failed to reply to chat {}: {:?}", message.chat.id, e);
            }
        }
    }
}

/// Formats a quantity the way the summaries show it: one decimal place.
pub(crate) fn one_decimal(value: f64) -> String {
    format!("{:.1}", (value * 10.0).round() / 10.0)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned model replies and records the prompts it was given.
    #[derive(Default)]
    pub struct CannedCompletion {
        replies: Mutex<VecDeque<Option<String>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl CannedCompletion {
        pub fn new(replies: Vec<Option<&str>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(|r| r.map(str::to_string)).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Completion for CannedCompletion {
        async fn complete(&self, _system: &str, prompt: &str) -> Option<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies.lock().unwrap().pop_front().flatten()
        }
    }
}
