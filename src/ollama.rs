use crate::error::GenerationError;
use crate::transcript::TURN_SEPARATOR;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sampling knobs forwarded to the backend as-is; ranges are not validated here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_tokens: u32,
    pub context_length: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            max_tokens: 2048,
            context_length: 4096,
        }
    }
}

/// A single prompt-completion call. No streaming and no retry: the full text
/// comes back or an error does.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prior_turns: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError>;
}

/// Prior turns and the new prompt, blank-line separated.
pub fn build_prompt(prior_turns: &str, prompt: &str) -> String {
    if prior_turns.is_empty() {
        prompt.to_string()
    } else {
        format!("{prior_turns}{TURN_SEPARATOR}{prompt}")
    }
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: BackendOptions,
}

#[derive(Serialize, Debug, PartialEq)]
struct BackendOptions {
    temperature: f64,
    top_p: f64,
    top_k: u32,
    num_predict: u32,
    num_ctx: u32,
}

impl From<&GenerationOptions> for BackendOptions {
    fn from(o: &GenerationOptions) -> Self {
        Self {
            temperature: o.temperature,
            top_p: o.top_p,
            top_k: o.top_k,
            num_predict: o.max_tokens,
            num_ctx: o.context_length,
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(3600)) // 1 hour timeout
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(
        &self,
        model: &str,
        prior_turns: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            model,
            prompt: build_prompt(prior_turns, prompt),
            stream: false,
            options: options.into(),
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::ConnectFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error,
                Err(_) => status.to_string(),
            };
            return Err(GenerationError::GenerationFailed(format!(
                "Request failed with status {status}: {detail}"
            )));
        }

        let body = response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| GenerationError::GenerationFailed(format!("Invalid response: {e}")))?;
        Ok(body.response)
    }
}
