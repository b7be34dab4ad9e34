//! The text-generation capability.
//!
//! The pipeline only ever sees the [`Generate`] trait: a prompt goes in, raw
//! text comes out, and any fault is an [`InvokeError`]. The production
//! implementation talks to an OpenAI-compatible chat-completions endpoint;
//! tests substitute scripted fakes or a mock server.

use crate::config::Config;
use crate::error::InvokeError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// An opaque `prompt -> text` capability. No structured output is
/// guaranteed; recovering structure is the parser's job.
pub trait Generate {
    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, InvokeError>> + Send;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Client for an OpenAI-compatible chat-completions API.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl ChatClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.model_api_url.clone(),
            api_key: config.model_api_key.clone(),
            model: config.model_name.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

impl Generate for ChatClient {
    async fn generate(&self, prompt: &str) -> Result<String, InvokeError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InvokeError::Timeout
                } else {
                    InvokeError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(InvokeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let chat_response: ChatResponse = response.json().await.map_err(InvokeError::Network)?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or(InvokeError::EmptyResponse)
    }
}
