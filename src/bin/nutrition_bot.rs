use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use daybook::bot::{nutrition, run_polling, NutritionBot};
use daybook::config::BotConfig;
use daybook::dialogue::SystemClock;
use daybook::environment::{load_dotenv, shutdown_signal};
use daybook::logging::configure_logging;
use daybook::sheets::{GoogleSheet, ServiceAccountKey};
use daybook::telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    configure_logging("nutrition_bot");

    let config = BotConfig::from_env("TELEGRAM_BOT_TOKEN_NUTRITION", "NUTRITION_SPREADSHEET_ID")
        .inspect_err(|e| error!("Cannot start NutritionBot: {}", e))?;
    let key = ServiceAccountKey::from_file(&config.service_account_path)?;
    let sheet = GoogleSheet::new(key, &config.spreadsheet_id, nutrition::WORKSHEET)?;
    let params = config.llm.params(0.2, None)?;

    let bot = NutritionBot::new(Arc::new(sheet), Arc::new(params), Arc::new(SystemClock));
    let telegram = TelegramClient::new(&config.telegram_token)?;

    info!("NutritionBot is running. Talk to it on Telegram.");
    run_polling(&telegram, &bot, shutdown_signal()).await
}
