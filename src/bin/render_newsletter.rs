use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use daybook::article::Article;
use daybook::config::PipelineConfig;
use daybook::environment::load_dotenv;
use daybook::logging::configure_logging;
use daybook::pipeline::newsletter::render_newsletter;
use daybook::pipeline::{load_stage_input, DayArgs};

#[derive(Parser, Debug)]
#[command(name = "render_newsletter", about = "Render the daily brief as Markdown")]
struct Cli {
    #[command(flatten)]
    day: DayArgs,
}

fn main() -> Result<()> {
    load_dotenv();
    configure_logging("render_newsletter");
    let cli = Cli::parse();

    let config = PipelineConfig::from_env();
    let paths = cli.day.paths(&config)?;
    let Some(articles) = load_stage_input::<Article>(&paths.top_articles_json())? else {
        return Ok(());
    };

    let output = paths.newsletter_markdown();
    std::fs::write(&output, render_newsletter(&articles, &paths.day))
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Newsletter saved to {}", output.display());
    Ok(())
}
