#[cfg(test)]
#[path = "document_test.rs"]
mod tests;

use std::path::Path;

use anyhow::Result;
use tokio::fs;

use super::FileKind;

/// A named byte payload handed over by the user, consumed by the extractor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: &str, bytes: Vec<u8>) -> Document {
        return Document {
            name: name.to_string(),
            bytes,
        };
    }

    pub async fn from_path(path: &Path) -> Result<Document> {
        let bytes = fs::read(path).await?;
        let name = path
            .file_name()
            .map(|name| return name.to_string_lossy().to_string())
            .unwrap_or_default();

        return Ok(Document::new(&name, bytes));
    }

    pub fn kind(&self) -> FileKind {
        return FileKind::from_name(&self.name);
    }
}
