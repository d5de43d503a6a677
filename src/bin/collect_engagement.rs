use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use daybook::article::Article;
use daybook::config::PipelineConfig;
use daybook::environment::{load_dotenv, require_env, shutdown_signal};
use daybook::logging::configure_logging;
use daybook::pipeline::engagement::{collect_engagement, CollectorSettings};
use daybook::pipeline::{load_stage_input, DayArgs};
use daybook::twitter::TwitterClient;

#[derive(Parser, Debug)]
#[command(name = "collect_engagement", about = "Attach Twitter engagement to the day's summaries")]
struct Cli {
    #[command(flatten)]
    day: DayArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    configure_logging("collect_engagement");
    let cli = Cli::parse();

    let Ok(bearer_token) = require_env(&["TWITTER_BEARER_TOKEN"]) else {
        error!("TWITTER_BEARER_TOKEN not set.");
        return Ok(());
    };

    let config = PipelineConfig::from_env();
    let paths = cli.day.paths(&config)?;
    let Some(mut articles) = load_stage_input::<Article>(&paths.summary_json())? else {
        return Ok(());
    };

    let client = TwitterClient::new(&bearer_token)?;
    let settings = CollectorSettings::from(&config);
    let output = paths.engagement_json();

    info!("Collecting engagement for {} articles", articles.len());
    let summary =
        collect_engagement(&mut articles, &client, &output, &settings, shutdown_signal()).await?;

    info!(
        "Done: {} processed, {} failed, {} rate limits{}",
        summary.processed,
        summary.failed,
        summary.rate_limited,
        if summary.interrupted { " (interrupted)" } else { "" }
    );
    Ok(())
}
