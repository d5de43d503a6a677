//! Stage 3: the most retweeted articles, with near-duplicate stories removed.

use anyhow::{anyhow, Result};
use tracing::info;

use crate::article::{Article, SimilarityScore};
use crate::vector::{embed_texts, round_score, select_unique, Candidate};
use crate::{LLMClient, TARGET_PIPELINE};

/// Embeds every article and keeps the top `limit` distinct stories by retweets.
pub async fn select_top_articles(
    articles: Vec<Article>,
    llm_client: &LLMClient,
    embedding_model: &str,
    batch_size: usize,
    threshold: f32,
    limit: usize,
) -> Result<Vec<Article>> {
    if articles.is_empty() {
        return Ok(Vec::new());
    }
    let texts: Vec<String> = articles.iter().map(Article::embedding_text).collect();
    let embeddings = embed_texts(llm_client, embedding_model, &texts, batch_size).await?;
    rank_and_select(articles, embeddings, threshold, limit)
}

/// Selection over precomputed embeddings (one per article, same order).
///
/// Each selected article gets `similarity_scores` against the other selected ones.
pub fn rank_and_select(
    articles: Vec<Article>,
    embeddings: Vec<Vec<f32>>,
    threshold: f32,
    limit: usize,
) -> Result<Vec<Article>> {
    if articles.len() != embeddings.len() {
        return Err(anyhow!(
            "Got {} embeddings for {} articles",
            embeddings.len(),
            articles.len()
        ));
    }
    let total = articles.len();

    let candidates = articles
        .into_iter()
        .zip(embeddings)
        .map(|(article, embedding)| Candidate {
            rank: article.retweets() as f64,
            item: article,
            embedding,
        })
        .collect();

    let selected = select_unique(candidates, threshold, limit)?;
    let titles: Vec<String> = selected.iter().map(|s| s.item.title.clone()).collect();

    let top: Vec<Article> = selected
        .into_iter()
        .map(|s| {
            let mut article = s.item;
            article.similarity_scores = Some(
                s.similarities
                    .into_iter()
                    .map(|(j, similarity)| SimilarityScore {
                        to: titles[j].clone(),
                        similarity: round_score(similarity),
                    })
                    .collect(),
            );
            article
        })
        .collect();

    info!(target: TARGET_PIPELINE, "Selected {} unique articles out of {} (threshold {})", top.len(), total, threshold);
    Ok(top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Engagement;

    fn article(title: &str, retweets: Option<u64>) -> Article {
        Article {
            title: title.to_string(),
            url: format!("https://example.com/{}", title),
            source: "Blockworks".into(),
            twitter_engagement: retweets.map(|r| Engagement {
                retweets: r,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Two unit vectors with cosine similarity 0.9.
    fn close_pair() -> (Vec<f32>, Vec<f32>) {
        let theta = 0.9f32.acos();
        (vec![1.0, 0.0], vec![theta.cos(), theta.sin()])
    }

    #[test]
    fn test_threshold_end_to_end() {
        let (a, b) = close_pair();

        let strict = rank_and_select(
            vec![article("second", Some(2)), article("first", Some(9))],
            vec![b.clone(), a.clone()],
            0.85,
            10,
        )
        .unwrap();
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].title, "first");
        assert_eq!(strict[0].similarity_scores, Some(vec![]));

        let loose = rank_and_select(
            vec![article("second", Some(2)), article("first", Some(9))],
            vec![b, a],
            0.95,
            10,
        )
        .unwrap();
        let titles: Vec<_> = loose.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
        assert_eq!(
            loose[0].similarity_scores,
            Some(vec![SimilarityScore {
                to: "second".into(),
                similarity: 0.9
            }])
        );
    }

    #[test]
    fn test_missing_engagement_ranks_as_zero() {
        let selected = rank_and_select(
            vec![article("no-data", None), article("some", Some(1))],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            0.85,
            10,
        )
        .unwrap();
        let titles: Vec<_> = selected.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["some", "no-data"]);
    }

    #[test]
    fn test_embedding_count_mismatch() {
        assert!(rank_and_select(vec![article("a", None)], vec![], 0.85, 10).is_err());
    }
}
