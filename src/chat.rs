use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are a helpful IT support assistant. Keep answers \
short and practical, and stay on IT support topics: networks, hardware, software, \
and troubleshooting.";

/// Shown to the user whenever the completion service fails, whatever the cause.
pub const FALLBACK_REPLY: &str = "Sorry, I'm having trouble processing your request right now.";

const MAX_TOKENS: u32 = 100;
const TEMPERATURE: f64 = 0.2;

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

pub fn first_choice_text(response: &CompletionResponse) -> Option<String> {
    response
        .choices
        .first()
        .map(|choice| choice.message.content.trim().to_string())
}

#[async_trait]
pub trait SupportBot: Send + Sync {
    async fn respond(&self, user_message: &str) -> Result<String>;
}

pub struct OpenAiBot {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiBot {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl SupportBot for OpenAiBot {
    async fn respond(&self, user_message: &str) -> Result<String> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user",
                    content: user_message.to_string(),
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .http_client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Chat completion request failed")?
            .error_for_status()
            .context("Chat completion service returned an error status")?;

        let body: CompletionResponse = response
            .json()
            .await
            .context("Chat completion response was not valid JSON")?;

        first_choice_text(&body).context("Chat completion returned no choices")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_and_trims_the_first_choice() {
        let body: CompletionResponse = serde_json::from_str(
            r#"{
                "choices": [
                    { "message": { "role": "assistant", "content": "  Restart the router.  " } },
                    { "message": { "role": "assistant", "content": "ignored" } }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(first_choice_text(&body).as_deref(), Some("Restart the router."));
    }

    #[test]
    fn empty_choice_list_yields_none() {
        let body: CompletionResponse = serde_json::from_str(r#"{ "choices": [] }"#).unwrap();
        assert_eq!(first_choice_text(&body), None);
    }

    #[test]
    fn request_body_carries_the_sampling_settings() {
        let request = CompletionRequest {
            model: "gpt-4o".into(),
            messages: vec![Message {
                role: "user",
                content: "help".into(),
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["max_tokens"], 100);
        assert_eq!(value["temperature"], 0.2);
        assert_eq!(value["messages"][0]["role"], "user");
    }
}
