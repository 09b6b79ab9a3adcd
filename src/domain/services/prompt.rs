#[cfg(test)]
#[path = "prompt_test.rs"]
mod tests;

/// Hard cap on document characters folded into a prompt. Anything past it is
/// dropped without a marker.
pub const MAX_DOCUMENT_CHARS: usize = 30_000;

pub const DOCUMENT_HEADER: &str = "File content (excerpt):";

pub const FORMAT_INSTRUCTION: &str = "Format your answer in Markdown, with display equations in LaTeX between $$ ... $$ and inline mathematical symbols between $...$. Every mathematical variable must be written in LaTeX, even inside sentences. Use a clear, academic style with centered equations.";

pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => return &text[..byte_idx],
        None => return text,
    }
}

/// User text followed by the labelled document section. An empty document
/// leaves the text untouched.
pub fn with_document(user_text: &str, extracted: Option<&str>) -> String {
    let mut prompt = user_text.to_string();
    if let Some(document) = extracted {
        if !document.is_empty() {
            let excerpt = truncate_chars(document, MAX_DOCUMENT_CHARS);
            prompt += &format!("\n\n{DOCUMENT_HEADER}\n{excerpt}");
        }
    }

    return prompt;
}

pub fn with_instruction(text: &str) -> String {
    return format!("{FORMAT_INSTRUCTION}\n\n{text}");
}
