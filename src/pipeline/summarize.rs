//! Stage 1: bullet-point summaries and keywords for each source's articles.

use anyhow::Result;
use tracing::{info, warn};

use crate::article::{save_json, Article, SourceArticle};
use crate::llm::{bullet_lines, generate_llm_response};
use crate::pipeline::{load_stage_input, PipelinePaths};
use crate::prompt::{keywords_prompt, summary_prompt, CRYPTO_SUMMARIZER_SYSTEM};
use crate::{LLMParams, TARGET_PIPELINE};

const SUMMARY_TEMPERATURE: f32 = 0.5;
const SUMMARY_MAX_TOKENS: u32 = 350;
const KEYWORD_TEMPERATURE: f32 = 0.3;
const KEYWORD_MAX_TOKENS: u32 = 60;

/// Summarizes up to `count_per_source` articles from each source file.
///
/// Sources without a file for the day are skipped, as are articles without content or
/// whose summary request failed.
pub async fn summarize_sources(
    paths: &PipelinePaths,
    sources: &[String],
    count_per_source: usize,
    params: &LLMParams,
) -> Result<Vec<Article>> {
    let mut summarized = Vec::new();

    for source in sources {
        let path = paths.source_articles(source);
        let Some(articles) = load_stage_input::<SourceArticle>(&path)? else {
            continue;
        };
        info!(target: TARGET_PIPELINE, "Summarizing up to {} of {} articles from {}", count_per_source, articles.len(), source);

        for raw in articles.iter().take(count_per_source) {
            if let Some(article) = summarize_article(source, raw, params).await {
                summarized.push(article);
            }
        }
    }

    info!(target: TARGET_PIPELINE, "Summarized {} articles across {} sources", summarized.len(), sources.len());
    Ok(summarized)
}

/// Summary and keywords for one article; `None` when there is no content or the
/// summary could not be generated.
pub async fn summarize_article(
    source: &str,
    raw: &SourceArticle,
    params: &LLMParams,
) -> Option<Article> {
    let title = raw.title.clone().unwrap_or_else(|| "No title".to_string());
    let url = raw.url.clone().unwrap_or_else(|| "No URL".to_string());
    let content = raw.content()?;

    let summary_params = params.with_sampling(SUMMARY_TEMPERATURE, Some(SUMMARY_MAX_TOKENS));
    let Some(summary_text) = generate_llm_response(
        CRYPTO_SUMMARIZER_SYSTEM,
        &summary_prompt(&title, content),
        &summary_params,
    )
    .await
    else {
        warn!(target: TARGET_PIPELINE, "Error summarizing {}", title);
        return None;
    };
    let summary = bullet_lines(&summary_text);

    let keyword_params = params.with_sampling(KEYWORD_TEMPERATURE, Some(KEYWORD_MAX_TOKENS));
    let keywords = match generate_llm_response(
        CRYPTO_SUMMARIZER_SYSTEM,
        &keywords_prompt(&title, &summary),
        &keyword_params,
    )
    .await
    {
        Some(reply) => bullet_lines(&reply),
        None => {
            warn!(target: TARGET_PIPELINE, "Keyword extraction failed for '{}'", title);
            Vec::new()
        }
    };

    info!(target: TARGET_PIPELINE, "Summarized [{}] {}", source, title);
    Some(Article {
        title,
        url,
        summary,
        keywords,
        source: source.to_string(),
        ..Default::default()
    })
}

/// The combined Markdown report of every summarized article.
pub fn render_summary_markdown(articles: &[Article]) -> String {
    let mut markdown = String::from("# Daily Crypto Summary\n\n");
    for article in articles {
        markdown.push_str(&format!(
            "## 📰 {}\n🔗 {}\n🗞️ Source: {}\n",
            article.title, article.url, article.source
        ));
        for bullet in &article.summary {
            markdown.push_str(&format!("- {}\n", bullet));
        }
        markdown.push('\n');
    }
    markdown
}

/// Writes the combined JSON and Markdown outputs.
pub fn write_summary(paths: &PipelinePaths, articles: &[Article]) -> Result<()> {
    std::fs::write(paths.summary_markdown(), render_summary_markdown(articles))?;
    save_json(&paths.summary_json(), articles)?;
    info!(target: TARGET_PIPELINE, "Saved to {} and {}", paths.summary_markdown().display(), paths.summary_json().display());
    Ok(())
}
