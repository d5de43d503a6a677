use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use daybook::config::{LlmConfig, PipelineConfig};
use daybook::environment::load_dotenv;
use daybook::logging::configure_logging;
use daybook::pipeline::summarize::{summarize_sources, write_summary};
use daybook::pipeline::DayArgs;

#[derive(Parser, Debug)]
#[command(name = "summarize_articles", about = "Summarize each source's articles for the day")]
struct Cli {
    #[command(flatten)]
    day: DayArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    configure_logging("summarize_articles");
    let cli = Cli::parse();

    let config = PipelineConfig::from_env();
    let paths = cli.day.paths(&config)?;
    let params = LlmConfig::from_env(&["OPENAI_API_KEY"], "gpt-4o")
        .params(0.5, None)
        .inspect_err(|e| error!("Cannot start summarizer: {}", e))?;

    info!("Summarizing articles for {} from {}", paths.day, paths.dir.display());
    let articles = summarize_sources(&paths, &config.sources, config.count_per_source, &params).await?;
    write_summary(&paths, &articles)?;

    info!(
        "Saved {} summaries to {} and {}",
        articles.len(),
        paths.summary_json().display(),
        paths.summary_markdown().display()
    );
    Ok(())
}
