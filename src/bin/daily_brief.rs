use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use daybook::article::save_json;
use daybook::config::{LlmConfig, PipelineConfig};
use daybook::environment::{load_dotenv, require_env, shutdown_signal};
use daybook::logging::configure_logging;
use daybook::pipeline::engagement::{collect_engagement, CollectorSettings};
use daybook::pipeline::newsletter::render_newsletter;
use daybook::pipeline::select::select_top_articles;
use daybook::pipeline::summarize::{summarize_sources, write_summary};
use daybook::pipeline::DayArgs;
use daybook::twitter::TwitterClient;

#[derive(Parser, Debug)]
#[command(
    name = "daily_brief",
    about = "Run the whole pipeline: summarize, collect engagement, select, render"
)]
struct Cli {
    #[command(flatten)]
    day: DayArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    configure_logging("daily_brief");
    let cli = Cli::parse();

    let config = PipelineConfig::from_env();
    let paths = cli.day.paths(&config)?;
    let llm = LlmConfig::from_env(&["OPENAI_API_KEY"], "gpt-4o");
    let params = llm
        .params(0.5, None)
        .inspect_err(|e| error!("Cannot start daily brief: {}", e))?;

    info!("Daily brief for {} in {}", paths.day, paths.dir.display());

    let mut articles =
        summarize_sources(&paths, &config.sources, config.count_per_source, &params).await?;
    write_summary(&paths, &articles)?;
    if articles.is_empty() {
        warn!("No articles summarized; nothing more to do");
        return Ok(());
    }

    match require_env(&["TWITTER_BEARER_TOKEN"]) {
        Ok(bearer_token) => {
            let client = TwitterClient::new(&bearer_token)?;
            let settings = CollectorSettings::from(&config);
            let summary = collect_engagement(
                &mut articles,
                &client,
                &paths.engagement_json(),
                &settings,
                shutdown_signal(),
            )
            .await?;
            if summary.interrupted {
                warn!("Interrupted during engagement collection; partial results saved");
                return Ok(());
            }
        }
        Err(_) => {
            warn!("TWITTER_BEARER_TOKEN not set; ranking without engagement");
        }
    }

    let selected = select_top_articles(
        articles,
        &params.llm_client,
        &llm.embedding_model,
        config.embedding_batch_size,
        config.similarity_threshold,
        config.top_n,
    )
    .await?;
    save_json(&paths.top_articles_json(), &selected)?;

    let output = paths.newsletter_markdown();
    std::fs::write(&output, render_newsletter(&selected, &paths.day))
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Newsletter with {} stories saved to {}", selected.len(), output.display());
    Ok(())
}
