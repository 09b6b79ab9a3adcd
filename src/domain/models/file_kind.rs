#[cfg(test)]
#[path = "file_kind_test.rs"]
mod tests;

use std::path::Path;

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FileKind {
    Text,
    Csv,
    Spreadsheet,
    Pdf,
    /// Anything unrecognised, including names without an extension. Decoded
    /// as text.
    Other,
}

impl FileKind {
    pub fn from_name(name: &str) -> FileKind {
        let ext = Path::new(name)
            .extension()
            .map(|ext| return ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "txt" => return FileKind::Text,
            "csv" => return FileKind::Csv,
            "xlsx" | "xls" => return FileKind::Spreadsheet,
            "pdf" => return FileKind::Pdf,
            _ => return FileKind::Other,
        }
    }
}
