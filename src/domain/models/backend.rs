#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

use super::Turn;

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum BackendName {
    #[strum(serialize = "openai")]
    OpenAI,
    #[strum(serialize = "openai-responses")]
    OpenAIResponses,
}

impl BackendName {
    pub fn parse(text: String) -> Option<BackendName> {
        return BackendName::iter().find(|e| return e.to_string() == text);
    }
}

/// How much of the session is sent to the completion service on each submit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConversationMode {
    /// Only the augmented prompt of the current submission.
    Single,
    /// Every previous turn plus the current one, with the formatting
    /// instruction sent as a system message.
    History,
}

impl ConversationMode {
    pub fn parse(text: &str) -> Result<ConversationMode> {
        if let Some(mode) = ConversationMode::iter().find(|e| return e.to_string() == text) {
            return Ok(mode);
        }

        bail!(format!("Unknown conversation mode {text}"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendPrompt {
    Single(String),
    Conversation { system: String, turns: Vec<Turn> },
}

impl BackendPrompt {
    /// Total characters sent, used for logging.
    pub fn char_count(&self) -> usize {
        match self {
            BackendPrompt::Single(text) => return text.chars().count(),
            BackendPrompt::Conversation { system, turns } => {
                return system.chars().count()
                    + turns
                        .iter()
                        .map(|turn| return turn.content.chars().count())
                        .sum::<usize>();
            }
        }
    }
}

#[async_trait]
pub trait Backend {
    fn name(&self) -> BackendName;

    /// Used at startup to verify all configurations are available to work with
    /// the backend.
    async fn health_check(&self) -> Result<()>;

    /// Lists all models available to the configured token, sorted.
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Requests a single completion and returns the full answer text. Both
    /// prompt shapes must be accepted.
    async fn get_completion(&self, prompt: BackendPrompt) -> Result<String>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
