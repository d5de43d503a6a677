use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use daybook::article::Article;
use daybook::config::{LlmConfig, PipelineConfig};
use daybook::environment::load_dotenv;
use daybook::logging::configure_logging;
use daybook::pipeline::overlap::{detect_overlaps, render_overlap_report};
use daybook::pipeline::{load_stage_input, DayArgs};

#[derive(Parser, Debug)]
#[command(name = "detect_overlap", about = "Report stories covered by more than one source")]
struct Cli {
    #[command(flatten)]
    day: DayArgs,

    /// Cosine similarity at which two articles count as the same story
    #[arg(long, default_value_t = 0.85)]
    threshold: f32,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    configure_logging("detect_overlap");
    let cli = Cli::parse();

    let config = PipelineConfig::from_env();
    let paths = cli.day.paths(&config)?;
    let Some(articles) = load_stage_input::<Article>(&paths.summary_json())? else {
        return Ok(());
    };

    let llm = LlmConfig::from_env(&["OPENAI_API_KEY"], "gpt-4o");
    let client = llm
        .client()
        .inspect_err(|e| error!("Cannot start overlap detector: {}", e))?;

    let overlaps = detect_overlaps(
        &articles,
        &client,
        &llm.embedding_model,
        config.embedding_batch_size,
        cli.threshold,
    )
    .await?;
    info!("Found {} overlapping pairs among {} articles", overlaps.len(), articles.len());

    println!("{}", render_overlap_report(&overlaps));
    Ok(())
}
