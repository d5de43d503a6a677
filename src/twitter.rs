//! Client for the Twitter v2 recent-search endpoint.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::TARGET_WEB_REQUEST;

const SEARCH_URL: &str = "https://api.twitter.com/2/tweets/search/recent";
const MAX_RESULTS: &str = "10";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("rate limit reached")]
    RateLimited,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Interaction counts reported for a single post.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct PublicMetrics {
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub quote_count: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub public_metrics: PublicMetrics,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Post>,
}

/// A social search backend returning the posts matching a query.
#[async_trait]
pub trait PostSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Post>, SearchError>;
}

pub struct TwitterClient {
    http: Client,
    bearer_token: String,
    search_url: String,
}

impl TwitterClient {
    pub fn new(bearer_token: &str) -> Result<Self, SearchError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            bearer_token: bearer_token.to_string(),
            search_url: SEARCH_URL.to_string(),
        })
    }

    pub fn with_search_url(mut self, url: &str) -> Self {
        self.search_url = url.to_string();
        self
    }
}

#[async_trait]
impl PostSearch for TwitterClient {
    async fn search(&self, query: &str) -> Result<Vec<Post>, SearchError> {
        debug!(target: TARGET_WEB_REQUEST, "Searching recent posts: {}", query);

        let response = self
            .http
            .get(&self.search_url)
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", query),
                ("max_results", MAX_RESULTS),
                ("tweet.fields", "public_metrics"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(target: TARGET_WEB_REQUEST, "Search returned {}: {}", status, body);
            if status == StatusCode::BAD_REQUEST {
                return Err(SearchError::BadRequest(body));
            }
            return Err(SearchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = response.json().await?;
        debug!(target: TARGET_WEB_REQUEST, "Search matched {} posts", parsed.data.len());
        Ok(parsed.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers a single request with `status` and `body`, handing back the request head.
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/2/tweets/search/recent", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });
        (url, handle)
    }

    fn client(url: &str) -> TwitterClient {
        TwitterClient::new("secret-token").unwrap().with_search_url(url)
    }

    #[tokio::test]
    async fn test_search_success_sends_query_and_token() {
        let body = r#"{"data": [{"id": "1", "text": "gm", "public_metrics": {"retweet_count": 4}}]}"#;
        let (url, server) = serve_once("200 OK", body).await;

        let posts = client(&url).search("\"ETF\" OR bitcoin").await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].public_metrics.retweet_count, 4);

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /2/tweets/search/recent?query="));
        assert!(request.contains("max_results=10"));
        assert!(request.contains("authorization: bearer secret-token"));
    }

    #[tokio::test]
    async fn test_too_many_requests_is_rate_limited() {
        let (url, _server) = serve_once("429 Too Many Requests", r#"{"title": "Too Many Requests"}"#).await;
        let err = client(&url).search("q").await.unwrap_err();
        assert!(matches!(err, SearchError::RateLimited), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_bad_request_keeps_body() {
        let (url, _server) = serve_once("400 Bad Request", r#"{"errors": ["query too long"]}"#).await;
        match client(&url).search("q").await {
            Err(SearchError::BadRequest(body)) => assert!(body.contains("query too long")),
            other => panic!("expected a bad request, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_other_failures_carry_status() {
        let (url, _server) = serve_once("503 Service Unavailable", "down").await;
        match client(&url).search("q").await {
            Err(SearchError::Api { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "down");
            }
            other => panic!("expected an API error, got {:?}", other),
        }
    }

    #[test]
    fn test_search_response_parsing() {
        let body = r#"{
            "data": [
                {"id": "1", "text": "gm", "public_metrics": {"like_count": 3, "retweet_count": 1, "reply_count": 0, "quote_count": 2}},
                {"id": "2", "text": "wagmi"}
            ],
            "meta": {"result_count": 2}
        }"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data.len(), 2);
        assert_eq!(parsed.data[0].public_metrics.quote_count, 2);
        assert_eq!(parsed.data[1].public_metrics, PublicMetrics::default());

        let empty: SearchResponse = serde_json::from_str(r#"{"meta": {"result_count": 0}}"#).unwrap();
        assert!(empty.data.is_empty());
    }
}
