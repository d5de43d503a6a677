//! Environment-driven configuration for the pipeline binaries and the bots.

use anyhow::Result;
use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use ollama_rs::Ollama;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::environment::{env_or, env_parse_or, get_env_var_as_vec, require_env};
use crate::{LLMClient, LLMParams, TARGET_LLM_REQUEST};

pub const DEFAULT_SOURCES: [&str; 6] = [
    "Cointelegraph",
    "Decrypt",
    "Defiant",
    "BeInCrypto",
    "Blockworks",
    "Coindesk",
];

/// Which LLM backend to talk to and with which models.
#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub llm_type: String,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub ollama_host: String,
    pub ollama_port: u16,
    pub model: String,
    pub embedding_model: String,
}

impl LlmConfig {
    /// Reads the backend settings; `key_vars` lists the API key variables in priority order.
    pub fn from_env(key_vars: &[&str], default_model: &str) -> Self {
        let api_key = require_env(key_vars).ok();
        Self {
            llm_type: env_or("LLM_TYPE", "openai").to_lowercase(),
            api_key,
            api_base: std::env::var("OPENAI_API_BASE").ok().filter(|s| !s.is_empty()),
            ollama_host: env_or("OLLAMA_HOST", "localhost"),
            ollama_port: env_parse_or("OLLAMA_PORT", 11434),
            model: env_or("SUMMARY_MODEL", default_model),
            embedding_model: env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Builds the client. OpenAI requires an API key; Ollama does not.
    pub fn client(&self) -> Result<LLMClient> {
        match self.llm_type.as_str() {
            "ollama" => {
                let host = if self.ollama_host.starts_with("http://")
                    || self.ollama_host.starts_with("https://")
                {
                    self.ollama_host.clone()
                } else {
                    format!("http://{}", self.ollama_host)
                };
                info!(target: TARGET_LLM_REQUEST, "Connecting to Ollama at {}:{}", host, self.ollama_port);
                Ok(LLMClient::Ollama(Ollama::new(host, self.ollama_port)))
            }
            _ => {
                let api_key = self
                    .api_key
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("An OpenAI API key is required for LLM_TYPE=openai"))?;
                let mut config = OpenAIConfig::new().with_api_key(api_key);
                if let Some(base) = &self.api_base {
                    config = config.with_api_base(base);
                }
                Ok(LLMClient::OpenAI(OpenAIClient::with_config(config)))
            }
        }
    }

    pub fn params(&self, temperature: f32, max_tokens: Option<u32>) -> Result<LLMParams> {
        Ok(LLMParams {
            llm_client: self.client()?,
            model: self.model.clone(),
            temperature,
            max_tokens,
        })
    }
}

/// Knobs for the daily news pipeline.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub sources: Vec<String>,
    pub count_per_source: usize,
    pub similarity_threshold: f32,
    pub top_n: usize,
    pub embedding_batch_size: usize,
    pub save_interval: usize,
    pub request_pause: Duration,
    pub rate_limit_cooldown: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            sources: DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
            count_per_source: 40,
            similarity_threshold: 0.85,
            top_n: 10,
            embedding_batch_size: 10,
            save_interval: 5,
            request_pause: Duration::from_millis(1200),
            rate_limit_cooldown: Duration::from_secs(15 * 60),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let sources = get_env_var_as_vec("NEWS_SOURCES", ';');
        Self {
            data_dir: PathBuf::from(env_or("DAYBOOK_DATA_DIR", ".")),
            sources: if sources.is_empty() {
                defaults.sources
            } else {
                sources
            },
            count_per_source: env_parse_or("COUNT_PER_SOURCE", defaults.count_per_source),
            similarity_threshold: env_parse_or(
                "SIMILARITY_THRESHOLD",
                defaults.similarity_threshold,
            ),
            top_n: env_parse_or("TOP_N", defaults.top_n),
            embedding_batch_size: defaults.embedding_batch_size,
            save_interval: env_parse_or("SAVE_INTERVAL", defaults.save_interval).max(1),
            request_pause: Duration::from_millis(env_parse_or("REQUEST_PAUSE_MS", 1200)),
            rate_limit_cooldown: Duration::from_secs(env_parse_or(
                "RATE_LIMIT_COOLDOWN_SECS",
                15 * 60,
            )),
        }
    }
}

/// Settings shared by the Telegram bots.
#[derive(Clone, Debug)]
pub struct BotConfig {
    pub telegram_token: String,
    pub service_account_path: PathBuf,
    pub spreadsheet_id: String,
    pub llm: LlmConfig,
    pub session_ttl: Duration,
}

impl BotConfig {
    /// `token_var` and `sheet_var` name the bot-specific variables.
    pub fn from_env(token_var: &str, sheet_var: &str) -> Result<Self> {
        let telegram_token = require_env(&[token_var])?;
        let service_account_path = PathBuf::from(require_env(&["GOOGLE_SERVICE_ACCOUNT_JSON"])?);
        let spreadsheet_id = require_env(&[sheet_var])?;
        let llm = LlmConfig::from_env(&["OPENAI_API_KEY_HW", "OPENAI_API_KEY"], "gpt-3.5-turbo")
            .with_model(env_or("BOT_MODEL", "gpt-3.5-turbo"));
        Ok(Self {
            telegram_token,
            service_account_path,
            spreadsheet_id,
            llm,
            session_ttl: Duration::from_secs(env_parse_or("SESSION_TTL_SECS", 600)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.sources.len(), 6);
        assert_eq!(config.count_per_source, 40);
        assert_eq!(config.top_n, 10);
        assert_eq!(config.save_interval, 5);
        assert_eq!(config.similarity_threshold, 0.85);
        assert_eq!(config.rate_limit_cooldown, Duration::from_secs(900));
    }

    #[test]
    fn test_openai_client_requires_key() {
        let config = LlmConfig {
            llm_type: "openai".to_string(),
            api_key: None,
            api_base: None,
            ollama_host: "localhost".to_string(),
            ollama_port: 11434,
            model: "gpt-4o".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
        };
        assert!(config.client().is_err());

        let ollama = LlmConfig {
            llm_type: "ollama".to_string(),
            ..config
        };
        assert!(matches!(ollama.client(), Ok(LLMClient::Ollama(_))));
    }
}
