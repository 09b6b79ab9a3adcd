#[cfg(test)]
#[path = "turn_test.rs"]
mod tests;

use serde::Deserialize;
use serde::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Name shown above a turn in the transcript.
    pub fn label(&self) -> String {
        match self {
            Role::User => {
                let username = Config::get(ConfigKey::Username);
                if username.is_empty() {
                    return "You".to_string();
                }
                return username;
            }
            Role::Assistant => return "Vertex".to_string(),
        }
    }
}

/// One role-tagged entry of a conversation. Turns are never edited once they
/// are part of a session, so there are no mutators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: &str) -> Turn {
        return Turn {
            role,
            content: content.to_string(),
        };
    }

    pub fn user(content: &str) -> Turn {
        return Turn::new(Role::User, content);
    }

    pub fn assistant(content: &str) -> Turn {
        return Turn::new(Role::Assistant, content);
    }

    pub fn first_line(&self, max_chars: usize) -> String {
        let line = self.content.split('\n').next().unwrap_or_default();
        if line.chars().count() <= max_chars {
            return line.to_string();
        }

        let cut = line
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        return format!("{cut}...");
    }
}
