use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use daybook::bot::{fitness, run_polling, FitnessBot};
use daybook::config::BotConfig;
use daybook::dialogue::SystemClock;
use daybook::environment::{load_dotenv, shutdown_signal};
use daybook::logging::configure_logging;
use daybook::sheets::{GoogleSheet, ServiceAccountKey};
use daybook::telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    configure_logging("fitness_bot");

    let config = BotConfig::from_env("TELEGRAM_BOT_TOKEN_FITNESS", "FITNESS_SPREADSHEET_ID")
        .inspect_err(|e| error!("Cannot start FitnessBot: {}", e))?;
    let key = ServiceAccountKey::from_file(&config.service_account_path)?;
    let sheet = GoogleSheet::new(key, &config.spreadsheet_id, fitness::WORKSHEET)?;
    let params = config.llm.params(0.2, None)?;

    let bot = FitnessBot::new(
        Arc::new(sheet),
        Arc::new(params),
        Arc::new(SystemClock),
        config.session_ttl,
    );
    let telegram = TelegramClient::new(&config.telegram_token)?;

    info!("FitnessBot is running. Talk to it on Telegram.");
    run_polling(&telegram, &bot, shutdown_signal()).await
}
