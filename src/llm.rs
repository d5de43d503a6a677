use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::generation::options::GenerationOptions;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::{LLMClient, LLMParams, TARGET_LLM_REQUEST};

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

static THINKING_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));
static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));
static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d.]").expect("valid regex"));

/// Why a model reply could not be turned into the structured record we asked for.
#[derive(Debug, Error)]
pub enum LlmJsonError {
    #[error("No valid JSON object found in response.")]
    NoJsonObject,
    #[error("Failed to parse JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Response is missing the \"{0}\" field")]
    MissingField(String),
    #[error("Field \"{field}\" is not numeric: {value}")]
    NotNumeric { field: String, value: String },
}

/// Sends a system + user prompt to the configured backend.
///
/// Retries up to three times with exponential backoff; returns `None` when every attempt
/// failed or the model produced nothing.
pub async fn generate_llm_response(
    system: &str,
    prompt: &str,
    params: &LLMParams,
) -> Option<String> {
    let mut backoff = 2;

    debug!(target: TARGET_LLM_REQUEST, "Starting LLM response generation with model {}: {}", params.model, prompt);

    for retry_count in 0..MAX_RETRIES {
        match timeout(REQUEST_TIMEOUT, send_request(system, prompt, params)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                debug!(target: TARGET_LLM_REQUEST, "LLM response received: {}", text);
                return Some(strip_thinking_tags(&text));
            }
            Ok(Ok(_)) => {
                warn!(target: TARGET_LLM_REQUEST, "LLM returned an empty response");
            }
            Ok(Err(e)) => {
                warn!(target: TARGET_LLM_REQUEST, "Error generating response: {}", e);
            }
            Err(_) => {
                warn!(target: TARGET_LLM_REQUEST, "LLM request timed out after {:?}", REQUEST_TIMEOUT);
            }
        }

        if retry_count < MAX_RETRIES - 1 {
            info!(target: TARGET_LLM_REQUEST, "Retrying LLM request in {} seconds ({}/{})", backoff, retry_count + 1, MAX_RETRIES);
            sleep(Duration::from_secs(backoff)).await;
            backoff *= 2;
        }
    }

    error!(target: TARGET_LLM_REQUEST, "Failed to generate response after {} retries", MAX_RETRIES);
    None
}

async fn send_request(system: &str, prompt: &str, params: &LLMParams) -> anyhow::Result<String> {
    match &params.llm_client {
        LLMClient::OpenAI(client) => {
            let mut builder = CreateChatCompletionRequestArgs::default();
            builder
                .model(params.model.clone())
                .temperature(params.temperature)
                .messages(vec![
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(system)
                        .build()?
                        .into(),
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(prompt)
                        .build()?
                        .into(),
                ]);
            if let Some(max_tokens) = params.max_tokens {
                builder.max_completion_tokens(max_tokens);
            }
            let response = client.chat().create(builder.build()?).await?;
            Ok(response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .unwrap_or_default()
                .trim()
                .to_string())
        }
        LLMClient::Ollama(ollama) => {
            let full_prompt = format!("{}\n\n{}", system, prompt);
            let mut request = GenerationRequest::new(params.model.clone(), full_prompt);
            request.options = Some(GenerationOptions::default().temperature(params.temperature));
            let response = ollama.generate(request).await?;
            Ok(response.response.trim().to_string())
        }
    }
}

/// Strips `<think>...</think>` blocks emitted by reasoning models.
///
/// Returns the original text if nothing would be left.
pub fn strip_thinking_tags(text: &str) -> String {
    let result = THINKING_TAGS.replace_all(text, "").trim().to_string();
    if result.is_empty() {
        return text.to_string();
    }
    result
}

/// Pulls the first `{...}` span out of a model reply and parses it.
pub fn extract_json_object(text: &str) -> Result<Map<String, Value>, LlmJsonError> {
    let span = JSON_OBJECT
        .find(text)
        .ok_or(LlmJsonError::NoJsonObject)?
        .as_str();
    match serde_json::from_str::<Value>(span)? {
        Value::Object(map) => Ok(map),
        _ => Err(LlmJsonError::NoJsonObject),
    }
}

/// Converts a JSON value such as `12`, `"1.3g"` or `"250 kcal"` into a float.
pub fn clean_numeric(field: &str, value: &Value) -> Result<f64, LlmJsonError> {
    let not_numeric = || LlmJsonError::NotNumeric {
        field: field.to_string(),
        value: value.to_string(),
    };
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(not_numeric),
        Value::String(s) => NON_NUMERIC
            .replace_all(s, "")
            .parse::<f64>()
            .map_err(|_| not_numeric()),
        _ => Err(not_numeric()),
    }
}

/// Reads a required numeric field from an extracted object.
pub fn numeric_field(map: &Map<String, Value>, field: &str) -> Result<f64, LlmJsonError> {
    let value = map
        .get(field)
        .ok_or_else(|| LlmJsonError::MissingField(field.to_string()))?;
    clean_numeric(field, value)
}

/// Reads a required field as display text; numbers are rendered as-is.
pub fn text_field(map: &Map<String, Value>, field: &str) -> Result<String, LlmJsonError> {
    match map.get(field) {
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(Value::Null) | None => Err(LlmJsonError::MissingField(field.to_string())),
        Some(other) => Ok(other.to_string()),
    }
}

/// Splits a bullet-list reply into clean lines.
pub fn bullet_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().trim_matches(|c| c == '-' || c == '•' || c == ' ').trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_thinking_tags() {
        assert_eq!(strip_thinking_tags("<think>hmm</think>\n- a"), "- a");
        assert_eq!(strip_thinking_tags("<think>only</think>"), "<think>only</think>");
    }

    #[test]
    fn test_extract_json_object() {
        let reply = "Sure! { \"item\": \"apple\", \"calories\": \"95 kcal\" } enjoy";
        let map = extract_json_object(reply).unwrap();
        assert_eq!(text_field(&map, "item").unwrap(), "apple");
        assert_eq!(numeric_field(&map, "calories").unwrap(), 95.0);

        assert!(matches!(
            extract_json_object("no braces here"),
            Err(LlmJsonError::NoJsonObject)
        ));
        assert!(matches!(
            extract_json_object("{ item: apple }"),
            Err(LlmJsonError::InvalidJson(_))
        ));
        assert!(matches!(
            numeric_field(&map, "protein"),
            Err(LlmJsonError::MissingField(_))
        ));
    }

    #[test]
    fn test_clean_numeric() {
        assert_eq!(clean_numeric("fat", &json!("1.3g")).unwrap(), 1.3);
        assert_eq!(clean_numeric("fat", &json!(7)).unwrap(), 7.0);
        assert!(clean_numeric("fat", &json!("n/a")).is_err());
        assert!(clean_numeric("fat", &json!(null)).is_err());
    }

    #[test]
    fn test_bullet_lines() {
        let reply = "- Bitcoin hit a new high\n\n• ETF inflows rose\n  - Miners sold less  \n";
        assert_eq!(
            bullet_lines(reply),
            vec!["Bitcoin hit a new high", "ETF inflows rose", "Miners sold less"]
        );
    }
}
