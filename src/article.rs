//! Article records passed between the pipeline stages.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Aggregate interaction counts for the posts matching an article.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub retweets: u64,
    #[serde(default)]
    pub replies: u64,
    #[serde(default)]
    pub quotes: u64,
}

/// Similarity of a selected article to another selected article.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScore {
    pub to: String,
    pub similarity: f32,
}

/// A summarized news article as it flows through the pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub summary: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_engagement: Option<Engagement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_scores: Option<Vec<SimilarityScore>>,
}

impl Article {
    /// Retweets used for ranking; absent engagement counts as zero.
    pub fn retweets(&self) -> u64 {
        self.twitter_engagement.map_or(0, |e| e.retweets)
    }

    /// Text handed to the embedding model: title plus the joined summary bullets.
    pub fn embedding_text(&self) -> String {
        format!("{} — {}", self.title, self.summary.join(" "))
    }
}

/// A raw article as scraped from one news source.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SourceArticle {
    pub title: Option<String>,
    pub url: Option<String>,
    pub url_content: Option<String>,
    pub post: Option<String>,
}

impl SourceArticle {
    /// Article body, preferring the scraped page over the feed post.
    ///
    /// `None` when there is nothing worth summarizing.
    pub fn content(&self) -> Option<&str> {
        let content = [self.url_content.as_deref(), self.post.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|text| !text.is_empty())
            .unwrap_or("");
        if content.is_empty() || content == "No content" {
            None
        } else {
            Some(content)
        }
    }
}

/// Reads a JSON array file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Writes `items` as pretty JSON, replacing the file in one rename.
pub fn save_json<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let data = serde_json::to_string_pretty(items)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engagement_absent_or_empty() {
        let raw = r#"[
            {"title": "A", "url": "u", "source": "s"},
            {"title": "B", "url": "u", "source": "s", "twitter_engagement": {}},
            {"title": "C", "url": "u", "source": "s", "twitter_engagement": {"retweets": 4, "likes": 9}}
        ]"#;
        let articles: Vec<Article> = serde_json::from_str(raw).unwrap();
        assert_eq!(articles[0].twitter_engagement, None);
        assert_eq!(articles[0].retweets(), 0);
        assert_eq!(articles[1].twitter_engagement, Some(Engagement::default()));
        assert_eq!(articles[2].retweets(), 4);
        assert_eq!(articles[2].twitter_engagement.unwrap().likes, 9);
    }

    #[test]
    fn test_source_article_content() {
        let scraped = SourceArticle {
            url_content: Some("body".into()),
            post: Some("post".into()),
            ..Default::default()
        };
        assert_eq!(scraped.content(), Some("body"));

        let post_only = SourceArticle {
            post: Some(" post ".into()),
            ..Default::default()
        };
        assert_eq!(post_only.content(), Some("post"));

        let blank_page = SourceArticle {
            url_content: Some("".into()),
            post: Some("fallback".into()),
            ..Default::default()
        };
        assert_eq!(blank_page.content(), Some("fallback"));

        let placeholder = SourceArticle {
            post: Some("No content".into()),
            ..Default::default()
        };
        assert_eq!(placeholder.content(), None);
        assert_eq!(SourceArticle::default().content(), None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");
        let articles = vec![Article {
            title: "T".into(),
            url: "https://example.com".into(),
            summary: vec!["one".into()],
            source: "Decrypt".into(),
            ..Default::default()
        }];
        save_json(&path, &articles).unwrap();
        let loaded: Vec<Article> = load_json(&path).unwrap();
        assert_eq!(loaded, articles);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
