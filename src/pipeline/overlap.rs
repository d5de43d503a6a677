//! Cross-source overlap report: the same story covered by more than one outlet.

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::article::Article;
use crate::vector::{embed_texts, round_score, similar_pairs};
use crate::LLMClient;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Overlap {
    pub similarity: f32,
    pub article_1: String,
    pub source_1: String,
    pub article_2: String,
    pub source_2: String,
}

/// Embeds the summaries and reports cross-source pairs at or above `threshold`.
pub async fn detect_overlaps(
    articles: &[Article],
    llm_client: &LLMClient,
    embedding_model: &str,
    batch_size: usize,
    threshold: f32,
) -> Result<Vec<Overlap>> {
    if articles.is_empty() {
        return Ok(Vec::new());
    }
    let texts: Vec<String> = articles.iter().map(Article::embedding_text).collect();
    let embeddings = embed_texts(llm_client, embedding_model, &texts, batch_size).await?;
    find_overlaps(articles, &embeddings, threshold)
}

/// Pairs from different sources whose embeddings are at least `threshold` similar.
pub fn find_overlaps(
    articles: &[Article],
    embeddings: &[Vec<f32>],
    threshold: f32,
) -> Result<Vec<Overlap>> {
    if articles.len() != embeddings.len() {
        return Err(anyhow!(
            "Got {} embeddings for {} articles",
            embeddings.len(),
            articles.len()
        ));
    }
    Ok(similar_pairs(embeddings, threshold)?
        .into_iter()
        .filter(|(i, j, _)| articles[*i].source != articles[*j].source)
        .map(|(i, j, similarity)| Overlap {
            similarity: round_score(similarity),
            article_1: articles[i].title.clone(),
            source_1: articles[i].source.clone(),
            article_2: articles[j].title.clone(),
            source_2: articles[j].source.clone(),
        })
        .collect())
}

/// Plain-text report, one line per overlapping pair.
pub fn render_overlap_report(overlaps: &[Overlap]) -> String {
    if overlaps.is_empty() {
        return "✅ No significant article overlap detected.".to_string();
    }
    let mut report = String::from("Detected Overlapping Articles:\n\n");
    for entry in overlaps {
        report.push_str(&format!(
            "🔁 {} | {}: {} ↔ {}: {}\n",
            entry.similarity, entry.source_1, entry.article_1, entry.source_2, entry.article_2
        ));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, source: &str) -> Article {
        Article {
            title: title.into(),
            source: source.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_same_source_pairs_are_ignored() {
        let articles = vec![
            article("ETF approved", "Coindesk"),
            article("ETF gets nod", "Coindesk"),
            article("SEC greenlights ETF", "Decrypt"),
            article("NFT floor drops", "Defiant"),
        ];
        let embeddings = vec![
            vec![1.0, 0.0],
            vec![0.99, 0.05],
            vec![0.98, 0.1],
            vec![0.0, 1.0],
        ];
        let overlaps = find_overlaps(&articles, &embeddings, 0.85).unwrap();
        assert_eq!(overlaps.len(), 2);
        assert!(overlaps.iter().all(|o| o.source_1 != o.source_2));
        assert_eq!(overlaps[0].article_1, "ETF approved");
        assert_eq!(overlaps[0].article_2, "SEC greenlights ETF");

        let report = render_overlap_report(&overlaps);
        assert!(report.starts_with("Detected Overlapping Articles:"));
        assert!(report.contains("Coindesk: ETF approved ↔ Decrypt: SEC greenlights ETF"));
    }

    #[test]
    fn test_embedding_count_must_match() {
        let articles = vec![article("A", "Coindesk"), article("B", "Decrypt")];
        let embeddings = vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![1.0, 0.0]];
        assert!(find_overlaps(&articles, &embeddings, 0.85).is_err());
        assert!(find_overlaps(&articles, &embeddings[..1], 0.85).is_err());
    }

    #[test]
    fn test_empty_report() {
        assert_eq!(
            render_overlap_report(&[]),
            "✅ No significant article overlap detected."
        );
    }
}
