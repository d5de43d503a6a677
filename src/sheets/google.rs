use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info};
use url::Url;

use super::Spreadsheet;
use crate::TARGET_SHEETS;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: u64 = 3600;
// Refresh a little before Google expires the token.
const TOKEN_SLACK_SECS: u64 = 60;

/// The fields of a Google service-account key file that signing needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read service account file {}", path.display()))?;
        serde_json::from_str(&raw).context("Service account file is not a valid key")
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    token: String,
    expires_at: u64,
}

fn now_secs() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

fn endpoint(segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(SHEETS_API)?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("Sheets API base cannot carry a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Values are stored exactly as sent, so dates and quantities read back unchanged.
fn append_url(spreadsheet_id: &str, worksheet: &str) -> Result<Url> {
    let range = format!("{}:append", worksheet);
    let mut url = endpoint(&["spreadsheets", spreadsheet_id, "values", &range])?;
    url.query_pairs_mut().append_pair("valueInputOption", "RAW");
    Ok(url)
}

/// A single named worksheet inside a Google spreadsheet.
pub struct GoogleSheet {
    client: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    spreadsheet_id: String,
    worksheet: String,
    token: Mutex<Option<CachedToken>>,
    sheet_id: OnceCell<i64>,
}

impl GoogleSheet {
    pub fn new(key: ServiceAccountKey, spreadsheet_id: &str, worksheet: &str) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .context("Service account private key is not valid RSA PEM")?;
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            key,
            encoding_key,
            spreadsheet_id: spreadsheet_id.to_string(),
            worksheet: worksheet.to_string(),
            token: Mutex::new(None),
            sheet_id: OnceCell::new(),
        })
    }

    /// Returns a cached access token, exchanging a freshly signed JWT when it is stale.
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        let now = now_secs()?;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > now + TOKEN_SLACK_SECS {
                return Ok(token.token.clone());
            }
        }

        let claims = Claims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .context("Failed to sign service account assertion")?;

        debug!(target: TARGET_SHEETS, "Requesting access token for {}", self.key.client_email);
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(target: TARGET_SHEETS, "Token exchange failed: {} {}", status, body);
            return Err(anyhow!("Token exchange failed with status {}", status));
        }
        let token: TokenResponse = response.json().await?;
        let expires_at = now + token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS);
        *cached = Some(CachedToken {
            token: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let token = self.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(target: TARGET_SHEETS, "Sheets API error {}: {}", status, body);
            return Err(anyhow!("Sheets API returned {}", status));
        }
        Ok(response.json().await?)
    }

    /// Numeric id of the worksheet, needed for structural edits.
    async fn sheet_id(&self) -> Result<i64> {
        self.sheet_id
            .get_or_try_init(|| async {
                let mut url = endpoint(&["spreadsheets", &self.spreadsheet_id])?;
                url.query_pairs_mut().append_pair("fields", "sheets.properties");
                let body = self.send(self.client.get(url)).await?;
                body.get("sheets")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(|sheet| sheet.get("properties"))
                    .find(|props| props.get("title").and_then(Value::as_str) == Some(self.worksheet.as_str()))
                    .and_then(|props| props.get("sheetId"))
                    .and_then(Value::as_i64)
                    .ok_or_else(|| anyhow!("Worksheet '{}' not found", self.worksheet))
            })
            .await
            .copied()
    }
}

#[async_trait]
impl Spreadsheet for GoogleSheet {
    async fn append_row(&self, row: Vec<Value>) -> Result<()> {
        let url = append_url(&self.spreadsheet_id, &self.worksheet)?;
        let payload = json!({ "values": [row] });

        debug!(target: TARGET_SHEETS, "Appending row to {}: {}", self.worksheet, payload);
        self.send(self.client.post(url).json(&payload)).await?;
        info!(target: TARGET_SHEETS, "Appended row to {}", self.worksheet);
        Ok(())
    }

    async fn rows(&self) -> Result<Vec<Vec<String>>> {
        let url = endpoint(&["spreadsheets", &self.spreadsheet_id, "values", &self.worksheet])?;
        let body = self.send(self.client.get(url)).await?;
        Ok(parse_value_range(&body))
    }

    async fn delete_row(&self, index: usize) -> Result<()> {
        let sheet_id = self.sheet_id().await?;
        let target = format!("{}:batchUpdate", self.spreadsheet_id);
        let url = endpoint(&["spreadsheets", &target])?;
        let payload = json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": index,
                        "endIndex": index + 1
                    }
                }
            }]
        });
        self.send(self.client.post(url).json(&payload)).await?;
        debug!(target: TARGET_SHEETS, "Deleted row {} from {}", index, self.worksheet);
        Ok(())
    }
}

/// Converts a `ValueRange` body into rows of display strings.
fn parse_value_range(body: &Value) -> Vec<Vec<String>> {
    body.get("values")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    row.as_array()
                        .map(|cells| {
                            cells
                                .iter()
                                .map(|cell| match cell {
                                    Value::String(s) => s.clone(),
                                    other => other.to_string(),
                                })
                                .collect()
                        })
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default()
}
