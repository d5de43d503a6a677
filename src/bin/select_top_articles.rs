use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use daybook::article::{save_json, Article};
use daybook::config::{LlmConfig, PipelineConfig};
use daybook::environment::load_dotenv;
use daybook::logging::configure_logging;
use daybook::pipeline::select::select_top_articles;
use daybook::pipeline::{load_stage_input, DayArgs};

#[derive(Parser, Debug)]
#[command(name = "select_top_articles", about = "Pick the most retweeted distinct stories")]
struct Cli {
    #[command(flatten)]
    day: DayArgs,

    /// Cosine similarity at which two stories count as duplicates
    #[arg(long)]
    threshold: Option<f32>,

    /// How many stories to keep
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    configure_logging("select_top_articles");
    let cli = Cli::parse();

    let config = PipelineConfig::from_env();
    let paths = cli.day.paths(&config)?;
    let Some(articles) = load_stage_input::<Article>(&paths.engagement_json())? else {
        return Ok(());
    };

    let llm = LlmConfig::from_env(&["OPENAI_API_KEY"], "gpt-4o");
    let client = llm
        .client()
        .inspect_err(|e| error!("Cannot start selector: {}", e))?;

    let threshold = cli.threshold.unwrap_or(config.similarity_threshold);
    let limit = cli.limit.unwrap_or(config.top_n);
    info!("Selecting up to {} of {} articles (threshold {})", limit, articles.len(), threshold);

    let selected = select_top_articles(
        articles,
        &client,
        &llm.embedding_model,
        config.embedding_batch_size,
        threshold,
        limit,
    )
    .await?;

    let output = paths.top_articles_json();
    save_json(&output, &selected)?;
    info!("Saved {} unique articles to {}", selected.len(), output.display());
    Ok(())
}
