use anyhow::Result;
use mockito::Matcher;
use serde_json::json;

use super::OpenAIResponses;
use super::OutputContent;
use super::OutputItem;
use super::ResponseBody;
use crate::domain::models::Backend;
use crate::domain::models::BackendPrompt;
use crate::domain::models::Turn;

impl OpenAIResponses {
    fn with_url(url: String) -> OpenAIResponses {
        return OpenAIResponses {
            url,
            token: "abc".to_string(),
            model: "gpt-5".to_string(),
            timeout: "2000".to_string(),
        };
    }
}

fn response_body() -> serde_json::Value {
    return json!({
        "id": "resp_123",
        "object": "response",
        "output": [
            {
                "id": "rs_1",
                "type": "reasoning",
                "summary": [],
            },
            {
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [
                    {"type": "output_text", "text": "EOQ = ", "annotations": []},
                    {"type": "output_text", "text": "sqrt(2DS/H)", "annotations": []},
                ],
            },
        ],
    });
}

#[test]
fn it_joins_output_text() {
    let body = ResponseBody {
        output: vec![
            OutputItem {
                _type: "message".to_string(),
                content: vec![
                    OutputContent {
                        _type: "output_text".to_string(),
                        text: "Hello ".to_string(),
                    },
                    OutputContent {
                        _type: "refusal".to_string(),
                        text: "".to_string(),
                    },
                ],
            },
            OutputItem {
                _type: "message".to_string(),
                content: vec![OutputContent {
                    _type: "output_text".to_string(),
                    text: "World".to_string(),
                }],
            },
        ],
    };

    assert_eq!(body.output_text(), "Hello World");
    assert_eq!(ResponseBody::default().output_text(), "");
}

#[tokio::test]
async fn it_gets_single_prompt_completions() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/responses")
        .match_header("Authorization", "Bearer abc")
        .match_body(Matcher::Json(json!({
            "model": "gpt-5",
            "input": "What is the EOQ formula?",
        })))
        .with_status(200)
        .with_body(response_body().to_string())
        .create_async()
        .await;

    let backend = OpenAIResponses::with_url(server.url());
    let res = backend
        .get_completion(BackendPrompt::Single("What is the EOQ formula?".to_string()))
        .await?;

    mock.assert_async().await;
    assert_eq!(res, "EOQ = sqrt(2DS/H)");

    return Ok(());
}

#[tokio::test]
async fn it_gets_conversation_completions() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/responses")
        .match_body(Matcher::Json(json!({
            "model": "gpt-5",
            "instructions": "Use Markdown.",
            "input": [
                {"role": "user", "content": "Compute EOQ"},
                {"role": "assistant", "content": "Q* = 200"},
                {"role": "user", "content": "Formula?"},
            ],
        })))
        .with_status(200)
        .with_body(response_body().to_string())
        .create_async()
        .await;

    let prompt = BackendPrompt::Conversation {
        system: "Use Markdown.".to_string(),
        turns: vec![
            Turn::user("Compute EOQ"),
            Turn::assistant("Q* = 200"),
            Turn::user("Formula?"),
        ],
    };

    let backend = OpenAIResponses::with_url(server.url());
    let res = backend.get_completion(prompt).await?;

    mock.assert_async().await;
    assert_eq!(res, "EOQ = sqrt(2DS/H)");

    return Ok(());
}

#[tokio::test]
async fn it_returns_empty_text_without_messages() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/responses")
        .with_status(200)
        .with_body(r#"{"id": "resp_1", "status": "incomplete", "output": [{"type": "reasoning", "summary": []}]}"#)
        .create_async()
        .await;

    let backend = OpenAIResponses::with_url(server.url());
    let res = backend
        .get_completion(BackendPrompt::Single("Hi".to_string()))
        .await?;

    mock.assert_async().await;
    assert_eq!(res, "");

    return Ok(());
}

#[tokio::test]
async fn it_fails_completions_on_error_status() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/responses")
        .with_status(429)
        .with_body(r#"{"error": {"message": "Rate limit reached"}}"#)
        .create_async()
        .await;

    let backend = OpenAIResponses::with_url(server.url());
    let res = backend
        .get_completion(BackendPrompt::Single("Hi".to_string()))
        .await;

    mock.assert_async().await;
    assert_eq!(
        res.unwrap_err().to_string(),
        "OpenAI returned status 429: Rate limit reached"
    );
}

#[tokio::test]
async fn it_fails_when_unreachable() {
    let backend = OpenAIResponses::with_url("http://127.0.0.1:9".to_string());
    let res = backend
        .get_completion(BackendPrompt::Single("Hi".to_string()))
        .await;

    assert!(res.is_err());
}

#[tokio::test]
async fn it_lists_models() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/models")
        .match_header("Authorization", "Bearer abc")
        .with_status(200)
        .with_body(r#"{"object": "list", "data": [{"id": "o3", "object": "model"}, {"id": "gpt-5", "object": "model"}]}"#)
        .create_async()
        .await;

    let backend = OpenAIResponses::with_url(server.url());
    let res = backend.list_models().await?;

    mock.assert_async().await;
    assert_eq!(res, vec!["gpt-5".to_string(), "o3".to_string()]);

    return Ok(());
}
