pub mod openai;
pub mod openai_responses;

use anyhow::bail;
use anyhow::Result;

use crate::domain::models::BackendBox;
use crate::domain::models::BackendName;

pub struct BackendManager {}

impl BackendManager {
    pub fn get(name: &str) -> Result<BackendBox> {
        match BackendName::parse(name.to_string()) {
            Some(BackendName::OpenAI) => return Ok(Box::<openai::OpenAI>::default()),
            Some(BackendName::OpenAIResponses) => {
                return Ok(Box::<openai_responses::OpenAIResponses>::default());
            }
            None => bail!(format!("No backend implemented for {name}")),
        }
    }
}
