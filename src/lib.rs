pub mod article;
pub mod bot;
pub mod config;
pub mod dialogue;
pub mod environment;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod sheets;
pub mod telegram;
pub mod twitter;
pub mod vector;

use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use ollama_rs::Ollama;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_LLM_REQUEST: &str = "llm_request";
pub const TARGET_SHEETS: &str = "sheets";
pub const TARGET_PIPELINE: &str = "pipeline";

#[derive(Clone, Debug)]
pub enum LLMClient {
    Ollama(Ollama),
    OpenAI(OpenAIClient<OpenAIConfig>),
}

#[derive(Clone, Debug)]
pub struct LLMParams {
    pub llm_client: LLMClient,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl LLMParams {
    /// Same client and model with a different sampling setup.
    pub fn with_sampling(&self, temperature: f32, max_tokens: Option<u32>) -> Self {
        Self {
            llm_client: self.llm_client.clone(),
            model: self.model.clone(),
            temperature,
            max_tokens,
        }
    }
}
