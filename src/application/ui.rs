#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

use std::io::IsTerminal;
use std::path::Path;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendBox;
use crate::domain::models::ConversationMode;
use crate::domain::models::Document;
use crate::domain::models::SlashCommand;
use crate::domain::services::Extractor;
use crate::domain::services::Session;
use crate::domain::services::Transcript;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /file (/f) [PATH] - Attach a PDF, TXT, CSV or XLSX file. Its text is appended to every question until detached.
- /detach (/d) - Forget the attached file.
- /history (/hi) - Print the whole conversation.
- /modellist (/ml) - Lists all available models from the backend.
- /help (/h) - Provides this help menu.
- /quit /exit (/q) - Exit Vertex.
        "#;

    return text.trim().to_string();
}

/// One model per line, marking the configured one.
pub fn model_list_text(models: &[String]) -> String {
    let current = Config::get(ConfigKey::Model);
    return models
        .iter()
        .map(|model| {
            if *model == current {
                return format!("- {model} (active)");
            }
            return format!("- {model}");
        })
        .collect::<Vec<String>>()
        .join("\n");
}

/// Whether styled output should be written to stdout.
pub fn colors_enabled() -> bool {
    return Paint::is_enabled() && std::io::stdout().is_terminal();
}

/// A file the user attached, with its text extracted once on attach.
pub struct Attachment {
    pub document: Document,
    pub text: String,
}

pub enum Flow {
    Print(String),
    Quit,
}

/// Interactive chat state: the session, the backend it talks to and the
/// attachment currently in effect.
pub struct Chat {
    backend: BackendBox,
    session: Session,
    transcript: Transcript,
    attachment: Option<Attachment>,
}

impl Chat {
    pub fn new(backend: BackendBox, mode: ConversationMode, colors: bool) -> Chat {
        return Chat {
            backend,
            session: Session::new(mode),
            transcript: Transcript::new(colors),
            attachment: None,
        };
    }

    pub fn session(&self) -> &Session {
        return &self.session;
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        return self.attachment.as_ref();
    }

    pub fn attach_document(&mut self, document: Document) -> String {
        let text = Extractor::extract(&document);
        let message = format!(
            "Attached {} ({}, {} characters extracted).",
            document.name,
            document.kind(),
            text.chars().count()
        );
        self.attachment = Some(Attachment { document, text });

        return message;
    }

    pub async fn attach(&mut self, path: &Path) -> Result<String> {
        let document = Document::from_path(path).await?;
        return Ok(self.attach_document(document));
    }

    pub fn detach(&mut self) -> String {
        if let Some(attachment) = self.attachment.take() {
            return format!("Detached {}.", attachment.document.name);
        }

        return "No file is attached.".to_string();
    }

    /// Submits the text with the current attachment, returning the rendered
    /// exchange. Errors only when there is nothing to send.
    pub async fn submit(&mut self, text: &str) -> Result<String> {
        let extracted = self
            .attachment
            .as_ref()
            .map(|attachment| return attachment.text.as_str());
        self.session.submit(&self.backend, text, extracted).await?;

        let turns = self.session.turns();
        return Ok(self.transcript.render(&turns[turns.len() - 2..]));
    }

    async fn model_list(&self) -> String {
        match self.backend.list_models().await {
            Ok(models) => {
                return format!("Models available:\n{}", model_list_text(&models));
            }
            Err(err) => {
                tracing::error!(error = ?err, "Failed to list models");
                return format!("Failed to list models: {err:#}");
            }
        }
    }

    async fn command(&mut self, command: SlashCommand) -> Flow {
        if command.is_quit() {
            return Flow::Quit;
        }

        if command.is_attach_file() {
            let path = command.arg_text();
            if path.is_empty() {
                return Flow::Print("Usage: /file PATH".to_string());
            }
            match self.attach(Path::new(&path)).await {
                Ok(message) => return Flow::Print(message),
                Err(err) => return Flow::Print(format!("Could not read {path}: {err:#}")),
            }
        }

        if command.is_detach_file() {
            return Flow::Print(self.detach());
        }

        if command.is_history() {
            if self.session.is_empty() {
                return Flow::Print("Nothing has been said yet.".to_string());
            }
            return Flow::Print(self.transcript.render(self.session.turns()));
        }

        if command.is_model_list() {
            return Flow::Print(self.model_list().await);
        }

        return Flow::Print(help_text());
    }

    /// One line of user input: a slash command or a question.
    pub async fn handle(&mut self, line: &str) -> Flow {
        if let Some(command) = SlashCommand::parse(line) {
            return self.command(command).await;
        }

        match self.submit(line).await {
            Ok(exchange) => return Flow::Print(exchange),
            Err(err) => return Flow::Print(Paint::yellow(err.to_string()).to_string()),
        }
    }
}

async fn write_out(text: &str) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;

    return Ok(());
}

/// Reads questions from stdin until EOF or `/quit`.
pub async fn start(backend: BackendBox, file: Option<&Path>) -> Result<()> {
    let mode = ConversationMode::parse(&Config::get(ConfigKey::ConversationMode))?;
    let mut chat = Chat::new(backend, mode, colors_enabled());

    write_out(&format!(
        "Hey {}! Ask a logistics question, or attach a file with /file PATH. /help lists all commands.\n",
        Config::get(ConfigKey::Username)
    ))
    .await?;

    if let Some(path) = file {
        let message = chat.attach(path).await?;
        write_out(&format!("{message}\n")).await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write_out("\n> ").await?;
        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };

        let submits = SlashCommand::parse(&line).is_none()
            && (!line.trim().is_empty() || chat.attachment().is_some());
        if submits {
            write_out(&format!(
                "{}\n",
                Paint::new(format!(
                    "Asking {}...",
                    Config::get(ConfigKey::Model)
                ))
                .dimmed()
            ))
            .await?;
        }

        match chat.handle(&line).await {
            Flow::Print(text) => write_out(&format!("\n{text}\n")).await?,
            Flow::Quit => break,
        }
    }

    tracing::debug!(
        mode = %chat.session().mode(),
        turns = chat.session().len(),
        "Chat ended"
    );
    return Ok(());
}

/// One-shot submission. A rejected submission is an error so the process
/// exits non-zero.
pub async fn ask(backend: BackendBox, prompt: &str, file: Option<&Path>) -> Result<()> {
    let mode = ConversationMode::parse(&Config::get(ConfigKey::ConversationMode))?;
    let mut chat = Chat::new(backend, mode, colors_enabled());

    if let Some(path) = file {
        chat.attach(path).await?;
    }

    let exchange = chat.submit(prompt).await?;
    write_out(&format!("{exchange}\n")).await?;

    return Ok(());
}
