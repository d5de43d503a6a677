//! Stage 2: social engagement per article, checkpointed as it goes.

use anyhow::Result;
use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::article::{save_json, Article, Engagement};
use crate::config::PipelineConfig;
use crate::twitter::{Post, PostSearch, SearchError};
use crate::TARGET_PIPELINE;

static QUERY_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s\-]").expect("valid regex"));

// Everything but unreserved characters and `/` gets escaped; spaces become `%20`.
const URL_TERM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Pacing and checkpoint settings for one collection run.
#[derive(Clone, Debug)]
pub struct CollectorSettings {
    pub save_interval: usize,
    pub request_pause: Duration,
    pub rate_limit_cooldown: Duration,
}

impl From<&PipelineConfig> for CollectorSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            save_interval: config.save_interval,
            request_pause: config.request_pause,
            rate_limit_cooldown: config.rate_limit_cooldown,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    pub processed: usize,
    pub failed: usize,
    pub rate_limited: usize,
    pub interrupted: bool,
}

/// Drops everything but word characters, whitespace and hyphens.
pub fn clean_query_term(text: &str) -> String {
    QUERY_NOISE.replace_all(text, "").trim().to_string()
}

/// `"title" OR kw1 OR kw2 OR encoded-url`; `None` when the article has no title.
pub fn build_query(article: &Article) -> Option<String> {
    if article.title.is_empty() {
        return None;
    }

    let short_url = article.url.split('?').next().unwrap_or_default();
    let encoded_url = utf8_percent_encode(short_url, URL_TERM).to_string();

    let mut parts = vec![format!("\"{}\"", clean_query_term(&article.title))];
    parts.extend(article.keywords.iter().take(2).map(|k| clean_query_term(k)));
    parts.push(encoded_url);
    Some(parts.join(" OR "))
}

/// Sums the public metrics of every post.
pub fn aggregate_engagement(posts: &[Post]) -> Engagement {
    posts.iter().fold(Engagement::default(), |mut total, post| {
        let m = post.public_metrics;
        total.likes += m.like_count;
        total.retweets += m.retweet_count;
        total.replies += m.reply_count;
        total.quotes += m.quote_count;
        total
    })
}

/// Annotates every article with engagement, saving the whole list to `checkpoint`
/// every `save_interval` articles and once more at the end.
///
/// When `shutdown` resolves first, the run stops where it is and the final save still
/// happens, so partial work is never lost.
pub async fn collect_engagement<S, F>(
    articles: &mut [Article],
    search: &S,
    checkpoint: &Path,
    settings: &CollectorSettings,
    shutdown: F,
) -> Result<CollectionSummary>
where
    S: PostSearch + ?Sized,
    F: Future<Output = ()>,
{
    let mut summary = CollectionSummary::default();
    // `None` when the shutdown signal won the race.
    let finished = {
        let work = process_articles(articles, search, checkpoint, settings, &mut summary);
        tokio::pin!(work);
        tokio::select! {
            result = &mut work => Some(result),
            _ = shutdown => {
                warn!(target: TARGET_PIPELINE, "Interrupted. Saving partial results...");
                None
            }
        }
    };
    summary.interrupted = finished.is_none();

    save_json(checkpoint, articles)?;
    info!(target: TARGET_PIPELINE, "Final results saved to {}", checkpoint.display());
    finished.transpose()?;
    Ok(summary)
}

/// Counters go into `summary` as they change, so an interrupted run still reports them.
async fn process_articles<S: PostSearch + ?Sized>(
    articles: &mut [Article],
    search: &S,
    checkpoint: &Path,
    settings: &CollectorSettings,
    summary: &mut CollectionSummary,
) -> Result<()> {
    let total = articles.len();
    let save_interval = settings.save_interval.max(1);
    let mut idx = 0;

    while idx < total {
        let article = &mut articles[idx];
        let Some(query) = build_query(article) else {
            idx += 1;
            continue;
        };

        match search.search(&query).await {
            Ok(posts) => {
                let metrics = aggregate_engagement(&posts);
                info!(target: TARGET_PIPELINE, "[{}/{}] {} → {:?}", idx + 1, total, article.title, metrics);
                article.twitter_engagement = Some(metrics);
            }
            Err(SearchError::RateLimited) => {
                warn!(target: TARGET_PIPELINE, "Rate limit hit at article {}. Sleeping for {:?}...", idx + 1, settings.rate_limit_cooldown);
                summary.rate_limited += 1;
                sleep(settings.rate_limit_cooldown).await;
                continue;
            }
            Err(SearchError::BadRequest(_)) => {
                warn!(target: TARGET_PIPELINE, "400 Bad Request for: {}, skipping.", article.title);
                article.twitter_engagement = Some(Engagement::default());
                summary.failed += 1;
            }
            Err(e) => {
                error!(target: TARGET_PIPELINE, "Error fetching posts for '{}': {}", article.title, e);
                article.twitter_engagement = Some(Engagement::default());
                summary.failed += 1;
            }
        }

        summary.processed += 1;
        if (idx + 1) % save_interval == 0 {
            save_json(checkpoint, articles)?;
            info!(target: TARGET_PIPELINE, "Auto-saved at article {}", idx + 1);
        }

        sleep(settings.request_pause).await;
        idx += 1;
    }

    Ok(())
}
