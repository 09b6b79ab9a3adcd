#[cfg(test)]
#[path = "openai_responses_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use super::openai::check_health;
use super::openai::error_message;
use super::openai::fetch_models;
use super::openai::parse_timeout;
use super::openai::MessageRequest;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendName;
use crate::domain::models::BackendPrompt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum ResponseInput {
    Text(String),
    Messages(Vec<MessageRequest>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ResponseRequest {
    model: String,
    input: ResponseInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    _type: String,
    #[serde(default)]
    text: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    _type: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ResponseBody {
    #[serde(default)]
    output: Vec<OutputItem>,
}

impl ResponseBody {
    /// Every `output_text` part of every message item, in order.
    fn output_text(&self) -> String {
        return self
            .output
            .iter()
            .filter(|item| return item._type == "message")
            .flat_map(|item| return item.content.iter())
            .filter(|content| return content._type == "output_text")
            .map(|content| return content.text.as_str())
            .collect::<Vec<&str>>()
            .join("");
    }
}

/// Responses API, the default backend.
pub struct OpenAIResponses {
    url: String,
    token: String,
    model: String,
    timeout: String,
}

impl Default for OpenAIResponses {
    fn default() -> OpenAIResponses {
        return OpenAIResponses {
            url: Config::get(ConfigKey::OpenAiURL),
            token: Config::get(ConfigKey::OpenAiToken),
            model: Config::get(ConfigKey::Model),
            timeout: Config::get(ConfigKey::BackendTimeout),
        };
    }
}

impl OpenAIResponses {
    fn request(&self, prompt: BackendPrompt) -> ResponseRequest {
        match prompt {
            BackendPrompt::Single(text) => {
                return ResponseRequest {
                    model: self.model.to_string(),
                    input: ResponseInput::Text(text),
                    instructions: None,
                };
            }
            BackendPrompt::Conversation { system, turns } => {
                let messages = turns
                    .iter()
                    .map(|turn| return MessageRequest::new(turn.role, &turn.content))
                    .collect::<Vec<MessageRequest>>();

                return ResponseRequest {
                    model: self.model.to_string(),
                    input: ResponseInput::Messages(messages),
                    instructions: Some(system),
                };
            }
        }
    }
}

#[async_trait]
impl Backend for OpenAIResponses {
    fn name(&self) -> BackendName {
        return BackendName::OpenAIResponses;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return check_health(&self.url, &self.token, &self.timeout).await;
    }

    #[allow(clippy::implicit_return)]
    async fn list_models(&self) -> Result<Vec<String>> {
        return fetch_models(&self.url, &self.token, &self.timeout).await;
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion(&self, prompt: BackendPrompt) -> Result<String> {
        let req = self.request(prompt);

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/responses", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .timeout(parse_timeout(&self.timeout)?)
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            tracing::error!(
                status = status,
                body = body,
                "Failed to make response request to OpenAI"
            );
            bail!(format!("OpenAI returned status {status}: {}", error_message(&body)));
        }

        let ores = res.json::<ResponseBody>().await?;
        tracing::debug!(body = ?ores, "Response body");

        return Ok(ores.output_text());
    }
}
