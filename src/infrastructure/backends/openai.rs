#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendName;
use crate::domain::models::BackendPrompt;
use crate::domain::models::Role;

pub(super) const OFFICIAL_URL: &str = "https://api.openai.com";

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct Model {
    pub(super) id: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct ModelListResponse {
    pub(super) data: Vec<Model>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct MessageRequest {
    pub(super) role: String,
    pub(super) content: String,
}

impl MessageRequest {
    pub(super) fn new(role: Role, content: &str) -> MessageRequest {
        return MessageRequest {
            role: role.to_string(),
            content: content.to_string(),
        };
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<MessageRequest>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionChoiceResponse {
    message: CompletionMessageResponse,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoiceResponse>,
}

pub(super) fn parse_timeout(timeout: &str) -> Result<Duration> {
    return Ok(Duration::from_millis(timeout.parse::<u64>()?));
}

/// Pulls the API's error message out of a failed response body, falling
/// back to the raw body.
pub(super) fn error_message(body: &str) -> String {
    if let Ok(res) = serde_json::from_str::<ErrorResponse>(body) {
        return res.error.message;
    }

    return body.trim().to_string();
}

pub(super) async fn check_health(url: &str, token: &str, timeout: &str) -> Result<()> {
    if url.is_empty() {
        bail!("OpenAI URL is not defined");
    }
    if token.is_empty() {
        bail!("OpenAI API key is missing. Set openai-token in your config file, pass --openai-token, or export OPENAI_API_KEY.");
    }

    // The official API answers its index with a 404 or a 418, there is
    // nothing useful to probe.
    if url == OFFICIAL_URL {
        return Ok(());
    }

    let res = match reqwest::Client::new()
        .get(url)
        .timeout(parse_timeout(timeout)?)
        .send()
        .await
    {
        Ok(res) => res,
        Err(err) => {
            tracing::error!(error = ?err, "OpenAI is not reachable");
            bail!("OpenAI is not reachable");
        }
    };

    let status = res.status().as_u16();
    if status >= 500 {
        tracing::error!(status = status, "OpenAI health check failed");
        bail!("OpenAI health check failed");
    }

    return Ok(());
}

pub(super) async fn fetch_models(url: &str, token: &str, timeout: &str) -> Result<Vec<String>> {
    let res = reqwest::Client::new()
        .get(format!("{url}/v1/models"))
        .header("Authorization", format!("Bearer {token}"))
        .timeout(parse_timeout(timeout)?)
        .send()
        .await?;

    if !res.status().is_success() {
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        tracing::error!(status = status, body = body, "Failed to list OpenAI models");
        bail!(format!(
            "Failed to list models, status {status}: {}",
            error_message(&body)
        ));
    }

    let mut models: Vec<String> = res
        .json::<ModelListResponse>()
        .await?
        .data
        .iter()
        .map(|model| {
            return model.id.to_string();
        })
        .collect();

    models.sort();

    return Ok(models);
}

/// Chat Completions API.
pub struct OpenAI {
    url: String,
    token: String,
    model: String,
    timeout: String,
}

impl Default for OpenAI {
    fn default() -> OpenAI {
        return OpenAI {
            url: Config::get(ConfigKey::OpenAiURL),
            token: Config::get(ConfigKey::OpenAiToken),
            model: Config::get(ConfigKey::Model),
            timeout: Config::get(ConfigKey::BackendTimeout),
        };
    }
}

impl OpenAI {
    fn messages(prompt: BackendPrompt) -> Vec<MessageRequest> {
        match prompt {
            BackendPrompt::Single(text) => {
                return vec![MessageRequest::new(Role::User, &text)];
            }
            BackendPrompt::Conversation { system, turns } => {
                let mut messages = vec![MessageRequest {
                    role: "system".to_string(),
                    content: system,
                }];
                messages.extend(
                    turns
                        .iter()
                        .map(|turn| return MessageRequest::new(turn.role, &turn.content)),
                );
                return messages;
            }
        }
    }
}

#[async_trait]
impl Backend for OpenAI {
    fn name(&self) -> BackendName {
        return BackendName::OpenAI;
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
        let req = CompletionRequest {
            model: self.model.to_string(),
            messages: OpenAI::messages(prompt),
        };

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/chat/completions", url = self.url))
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
                "Failed to make completion request to OpenAI"
            );
            bail!(format!("OpenAI returned status {status}: {}", error_message(&body)));
        }

        let ores = res.json::<CompletionResponse>().await?;
        tracing::debug!(body = ?ores, "Completion response");

        let text = ores
            .choices
            .into_iter()
            .next()
            .and_then(|choice| return choice.message.content)
            .unwrap_or_default();

        return Ok(text);
    }
}
