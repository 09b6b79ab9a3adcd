#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;

use super::prompt;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendPrompt;
use crate::domain::models::ConversationMode;
use crate::domain::models::Turn;

pub const NO_ANSWER: &str = "[No answer received from the model, the API may be delayed.]";

pub const EMPTY_SUBMISSION: &str = "Please type a message or attach a file.";

/// In-memory conversation log, oldest turn first. Only grows, and only
/// through `submit`.
pub struct Session {
    mode: ConversationMode,
    turns: Vec<Turn>,
}

impl Session {
    pub fn new(mode: ConversationMode) -> Session {
        return Session {
            mode,
            turns: vec![],
        };
    }

    pub fn mode(&self) -> ConversationMode {
        return self.mode;
    }

    pub fn turns(&self) -> &[Turn] {
        return &self.turns;
    }

    pub fn len(&self) -> usize {
        return self.turns.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.turns.is_empty();
    }

    /// Request for the completion service. The raw user text only ever lands
    /// in the log; the service sees the document excerpt and formatting
    /// instruction as well.
    pub fn build_prompt(&self, user_text: &str, extracted: Option<&str>) -> BackendPrompt {
        let text = prompt::with_document(user_text, extracted);

        match self.mode {
            ConversationMode::Single => {
                return BackendPrompt::Single(prompt::with_instruction(&text));
            }
            ConversationMode::History => {
                let mut turns = self.turns.clone();
                turns.push(Turn::user(&text));
                return BackendPrompt::Conversation {
                    system: prompt::FORMAT_INSTRUCTION.to_string(),
                    turns,
                };
            }
        }
    }

    /// Sends one submission and records the exchange. `extracted` is `Some`
    /// whenever a document was attached, even if its text came out empty.
    ///
    /// The only error is the rejection of a blank message without a
    /// document, in which case nothing is recorded. Service failures and
    /// empty answers become the assistant turn instead.
    pub async fn submit(
        &mut self,
        backend: &BackendBox,
        user_text: &str,
        extracted: Option<&str>,
    ) -> Result<Turn> {
        if user_text.trim().is_empty() && extracted.is_none() {
            bail!(EMPTY_SUBMISSION);
        }

        let request = self.build_prompt(user_text, extracted);
        let user_turn = Turn::user(user_text);
        tracing::debug!(
            backend = %backend.name(),
            mode = %self.mode,
            prompt = user_turn.first_line(70),
            prompt_chars = request.char_count(),
            "Submitting prompt"
        );

        let answer = match backend.get_completion(request).await {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    tracing::warn!("Completion service returned an empty answer");
                    NO_ANSWER.to_string()
                } else {
                    text.to_string()
                }
            }
            Err(err) => {
                tracing::error!(error = ?err, "Completion request failed");
                format!("[Completion service error] {err:#}")
            }
        };

        // Both turns land together so an abandoned request leaves no trace.
        let assistant_turn = Turn::assistant(&answer);
        self.turns.push(user_turn);
        self.turns.push(assistant_turn.clone());

        return Ok(assistant_turn);
    }
}
