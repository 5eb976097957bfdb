use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{json, Value};

use stocky_core::config::{LlmConfig, LlmProvider};

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// HTTP client for the configured completion provider. Requests run with
/// temperature zero; the model's only job is capability selection.
pub struct HttpLlmClient {
    http: reqwest::Client,
    provider: LlmProvider,
    base_url: Option<String>,
    api_key: Option<String>,
    model: String,
    max_retries: u32,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("failed to build llm http client")?;

        Ok(Self {
            http,
            provider: config.provider,
            base_url: config.base_url.clone(),
            api_key: config.api_key.as_ref().map(|key| key.expose_secret().to_string()),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    fn base_url(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    async fn request(&self, prompt: &str) -> Result<String> {
        match self.provider {
            LlmProvider::Ollama => {
                let url = format!("{}/api/generate", self.base_url("http://localhost:11434"));
                let body = json!({
                    "model": self.model,
                    "prompt": prompt,
                    "stream": false,
                    "options": {"temperature": 0},
                });
                let response: Value =
                    self.http.post(url).json(&body).send().await?.error_for_status()?.json().await?;
                response["response"]
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("ollama response missing `response` field"))
            }
            LlmProvider::OpenAi => {
                let url =
                    format!("{}/v1/chat/completions", self.base_url("https://api.openai.com"));
                let body = json!({
                    "model": self.model,
                    "temperature": 0,
                    "messages": [{"role": "user", "content": prompt}],
                });
                let api_key =
                    self.api_key.as_deref().ok_or_else(|| anyhow!("openai api key missing"))?;
                let response: Value = self
                    .http
                    .post(url)
                    .bearer_auth(api_key)
                    .json(&body)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;
                response["choices"][0]["message"]["content"]
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("openai response missing message content"))
            }
            LlmProvider::Anthropic => {
                let url = format!("{}/v1/messages", self.base_url("https://api.anthropic.com"));
                let body = json!({
                    "model": self.model,
                    "max_tokens": 1024,
                    "temperature": 0,
                    "messages": [{"role": "user", "content": prompt}],
                });
                let api_key =
                    self.api_key.as_deref().ok_or_else(|| anyhow!("anthropic api key missing"))?;
                let response: Value = self
                    .http
                    .post(url)
                    .header("x-api-key", api_key)
                    .header("anthropic-version", "2023-06-01")
                    .json(&body)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;
                response["content"][0]["text"]
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("anthropic response missing content text"))
            }
        }
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut last_error = None;
        for _attempt in 0..=self.max_retries {
            match self.request(prompt).await {
                Ok(text) => return Ok(text),
                Err(error) => last_error = Some(error),
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("llm completion failed with no attempts")))
    }
}
