use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::anyhow;
use anyhow::Result;
use async_trait::async_trait;

use super::Session;
use super::EMPTY_SUBMISSION;
use super::NO_ANSWER;
use crate::domain::models::Backend;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendName;
use crate::domain::models::BackendPrompt;
use crate::domain::models::ConversationMode;
use crate::domain::models::Document;
use crate::domain::models::Turn;
use crate::domain::services::prompt::FORMAT_INSTRUCTION;
use crate::domain::services::prompt::MAX_DOCUMENT_CHARS;
use crate::domain::services::Extractor;

type Prompts = Arc<Mutex<Vec<BackendPrompt>>>;

/// Replays canned answers in order, recording every prompt it receives. Once
/// the answers run out it returns empty text.
struct StubBackend {
    answers: Mutex<VecDeque<Result<String, String>>>,
    prompts: Prompts,
}

#[async_trait]
impl Backend for StubBackend {
    fn name(&self) -> BackendName {
        return BackendName::OpenAI;
    }

    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        return Ok(vec![]);
    }

    async fn get_completion(&self, prompt: BackendPrompt) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt);
        match self.answers.lock().unwrap().pop_front() {
            Some(Ok(text)) => return Ok(text),
            Some(Err(err)) => return Err(anyhow!(err)),
            None => return Ok("".to_string()),
        }
    }
}

fn stub(answers: Vec<Result<&str, &str>>) -> (BackendBox, Prompts) {
    let prompts: Prompts = Arc::new(Mutex::new(vec![]));
    let backend = StubBackend {
        answers: Mutex::new(
            answers
                .into_iter()
                .map(|answer| {
                    return answer
                        .map(|text| return text.to_string())
                        .map_err(|err| return err.to_string());
                })
                .collect(),
        ),
        prompts: prompts.clone(),
    };

    return (Box::new(backend), prompts);
}

fn single_prompt_text(prompts: &Prompts, idx: usize) -> String {
    match &prompts.lock().unwrap()[idx] {
        BackendPrompt::Single(text) => return text.to_string(),
        prompt => panic!("Expected a single prompt, got {prompt:?}"),
    }
}

#[tokio::test]
async fn it_answers_a_plain_question() -> Result<()> {
    let (backend, _prompts) = stub(vec![Ok("EOQ = sqrt(2DS/H)")]);
    let mut session = Session::new(ConversationMode::Single);

    let turn = session
        .submit(&backend, "What is the EOQ formula?", None)
        .await?;

    assert_eq!(turn, Turn::assistant("EOQ = sqrt(2DS/H)"));
    assert_eq!(
        session.turns(),
        &[
            Turn::user("What is the EOQ formula?"),
            Turn::assistant("EOQ = sqrt(2DS/H)"),
        ]
    );

    return Ok(());
}

#[tokio::test]
async fn it_rejects_blank_text_without_document() {
    let (backend, prompts) = stub(vec![Ok("unused")]);
    let mut session = Session::new(ConversationMode::Single);

    for text in ["", "   ", "\n\t "] {
        let res = session.submit(&backend, text, None).await;
        assert_eq!(res.unwrap_err().to_string(), EMPTY_SUBMISSION);
    }

    assert!(session.is_empty());
    assert!(prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn it_records_raw_text_and_sends_augmented_prompt() -> Result<()> {
    let (backend, prompts) = stub(vec![Ok("Sure.")]);
    let mut session = Session::new(ConversationMode::Single);

    session
        .submit(&backend, "  Summarise the file  ", Some("Q1: 120 units"))
        .await?;

    assert_eq!(session.turns()[0], Turn::user("  Summarise the file  "));

    let sent = single_prompt_text(&prompts, 0);
    assert_eq!(
        sent,
        format!(
            "{FORMAT_INSTRUCTION}\n\n  Summarise the file  \n\nFile content (excerpt):\nQ1: 120 units"
        )
    );

    return Ok(());
}

#[tokio::test]
async fn it_truncates_long_documents_in_the_prompt_only() -> Result<()> {
    let (backend, prompts) = stub(vec![Ok("Done.")]);
    let mut session = Session::new(ConversationMode::Single);
    let document = "z".repeat(MAX_DOCUMENT_CHARS + 10_000);

    session.submit(&backend, "Read this", Some(&document)).await?;

    let sent = single_prompt_text(&prompts, 0);
    let (_, excerpt) = sent.split_once("File content (excerpt):\n").unwrap();
    assert_eq!(excerpt.chars().count(), MAX_DOCUMENT_CHARS);
    assert_eq!(session.turns()[0], Turn::user("Read this"));

    return Ok(());
}

#[tokio::test]
async fn it_records_service_failures_and_keeps_going() -> Result<()> {
    let (backend, _prompts) = stub(vec![Err("connection refused"), Ok("Second try.")]);
    let mut session = Session::new(ConversationMode::Single);

    let failed = session.submit(&backend, "First", None).await?;
    assert_eq!(
        failed,
        Turn::assistant("[Completion service error] connection refused")
    );

    let answered = session.submit(&backend, "Second", None).await?;
    assert_eq!(answered, Turn::assistant("Second try."));

    assert_eq!(
        session.turns(),
        &[
            Turn::user("First"),
            Turn::assistant("[Completion service error] connection refused"),
            Turn::user("Second"),
            Turn::assistant("Second try."),
        ]
    );

    return Ok(());
}

#[tokio::test]
async fn it_marks_empty_answers() -> Result<()> {
    let (backend, _prompts) = stub(vec![Ok(""), Ok("  \n ")]);
    let mut session = Session::new(ConversationMode::Single);

    assert_eq!(
        session.submit(&backend, "One", None).await?,
        Turn::assistant(NO_ANSWER)
    );
    assert_eq!(
        session.submit(&backend, "Two", None).await?,
        Turn::assistant(NO_ANSWER)
    );
    assert_eq!(session.len(), 4);

    return Ok(());
}

#[tokio::test]
async fn it_trims_answers() -> Result<()> {
    let (backend, _prompts) = stub(vec![Ok("\n  Use a (Q, R) policy.\n\n")]);
    let mut session = Session::new(ConversationMode::Single);

    let turn = session.submit(&backend, "Which policy?", None).await?;
    assert_eq!(turn.content, "Use a (Q, R) policy.");

    return Ok(());
}

#[tokio::test]
async fn it_sends_extraction_errors_with_blank_text() -> Result<()> {
    let (backend, prompts) = stub(vec![Ok("The file could not be read.")]);
    let mut session = Session::new(ConversationMode::Single);

    let document = Document::new("course.pdf", b"definitely not a pdf".to_vec());
    let extracted = Extractor::extract(&document);
    session.submit(&backend, "", Some(&extracted)).await?;

    assert_eq!(
        session.turns(),
        &[
            Turn::user(""),
            Turn::assistant("The file could not be read."),
        ]
    );
    assert!(single_prompt_text(&prompts, 0).contains("File content (excerpt):\n[extraction error: "));

    return Ok(());
}

#[tokio::test]
async fn it_accepts_blank_text_with_empty_document() -> Result<()> {
    let (backend, prompts) = stub(vec![Ok("Nothing to read.")]);
    let mut session = Session::new(ConversationMode::Single);

    session.submit(&backend, "", Some("")).await?;

    assert_eq!(session.len(), 2);
    assert_eq!(
        single_prompt_text(&prompts, 0),
        format!("{FORMAT_INSTRUCTION}\n\n")
    );

    return Ok(());
}

#[tokio::test]
async fn it_sends_history_in_history_mode() -> Result<()> {
    let (backend, prompts) = stub(vec![Ok("Q* = 200"), Ok("Order 4 times a year.")]);
    let mut session = Session::new(ConversationMode::History);
    assert_eq!(session.mode(), ConversationMode::History);

    session.submit(&backend, "Compute EOQ", Some("D=800")).await?;
    session.submit(&backend, "How often do I order?", None).await?;

    let prompts = prompts.lock().unwrap();
    assert_eq!(
        prompts[0],
        BackendPrompt::Conversation {
            system: FORMAT_INSTRUCTION.to_string(),
            turns: vec![Turn::user("Compute EOQ\n\nFile content (excerpt):\nD=800")],
        }
    );
    assert_eq!(
        prompts[1],
        BackendPrompt::Conversation {
            system: FORMAT_INSTRUCTION.to_string(),
            turns: vec![
                Turn::user("Compute EOQ"),
                Turn::assistant("Q* = 200"),
                Turn::user("How often do I order?"),
            ],
        }
    );

    return Ok(());
}
