#[cfg(test)]
#[path = "extractor_test.rs"]
mod tests;

use std::panic;
use std::panic::UnwindSafe;
use std::sync::Mutex;

use anyhow::anyhow;
use anyhow::Result;

use super::Table;
use crate::domain::models::Document;
use crate::domain::models::FileKind;

/// Serialises panic hook swaps so concurrent extractions restore hooks in
/// the order they took them.
static PANIC_HOOK: Mutex<()> = Mutex::new(());

pub struct Extractor {}

impl Extractor {
    /// Best-effort text for a document. Failures are folded into the
    /// returned text as `[extraction error: <cause>]` so a bad attachment
    /// never blocks a submission.
    pub fn extract(document: &Document) -> String {
        let kind = document.kind();
        match Extractor::try_extract(document) {
            Ok(text) => {
                tracing::debug!(
                    name = %document.name,
                    kind = %kind,
                    bytes = document.bytes.len(),
                    chars = text.chars().count(),
                    "Extracted document"
                );
                return text;
            }
            Err(err) => {
                tracing::warn!(name = %document.name, kind = %kind, error = ?err, "Extraction failed");
                return Extractor::error_sentinel(&err);
            }
        }
    }

    pub fn try_extract(document: &Document) -> Result<String> {
        let bytes = document.bytes.as_slice();
        match document.kind() {
            FileKind::Text | FileKind::Other => return Ok(Extractor::decode_lossy(bytes)),
            FileKind::Csv => return Ok(Table::from_csv(bytes)?.to_text()),
            FileKind::Spreadsheet => return Ok(Table::from_spreadsheet(bytes)?.to_text()),
            FileKind::Pdf => return Extractor::pdf_text(bytes),
        }
    }

    pub fn error_sentinel(err: &anyhow::Error) -> String {
        let cause = format!("{err:#}").replace(['\r', '\n'], " ");
        return format!("[extraction error: {}]", cause.trim());
    }

    /// Undecodable sequences are dropped rather than replaced. Valid
    /// characters, U+FFFD included, are kept.
    fn decode_lossy(bytes: &[u8]) -> String {
        return bytes
            .utf8_chunks()
            .map(|chunk| return chunk.valid())
            .collect::<String>();
    }

    /// Runs `f`, catching a panic without reporting it through the installed
    /// panic hook. The previous hook is restored afterwards.
    fn quietly<F, T>(f: F) -> std::thread::Result<T>
    where
        F: FnOnce() -> T + UnwindSafe,
    {
        let _lock = PANIC_HOOK
            .lock()
            .unwrap_or_else(|poisoned| return poisoned.into_inner());

        let hook = panic::take_hook();
        panic::set_hook(Box::new(|_| {}));
        let res = panic::catch_unwind(f);
        panic::set_hook(hook);

        return res;
    }

    fn pdf_text(bytes: &[u8]) -> Result<String> {
        // The PDF parser panics on some malformed inputs instead of erroring.
        let res = Extractor::quietly(|| {
            return pdf_extract::extract_text_from_mem_by_pages(bytes);
        });

        let pages = match res {
            Ok(pages) => pages.map_err(|err| return anyhow!("{err}"))?,
            Err(payload) => {
                let cause = payload
                    .downcast_ref::<&str>()
                    .map(|msg| return msg.to_string())
                    .or_else(|| return payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| return "PDF parser panicked".to_string());
                return Err(anyhow!(cause));
            }
        };

        return Ok(Extractor::join_pages(pages));
    }

    /// Pages in document order, one newline after each. Pages without text
    /// contribute nothing.
    fn join_pages(pages: Vec<String>) -> String {
        let mut text = "".to_string();
        for page in pages {
            if page.trim().is_empty() {
                continue;
            }
            text += &page;
            text += "\n";
        }

        return text;
    }
}
