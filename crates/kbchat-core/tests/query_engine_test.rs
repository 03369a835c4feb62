//! Integration tests for the query engine
//!
//! Exercise the public API end to end, once against an in-memory provider and
//! once against the HTTP client talking to a mock server.

use async_trait::async_trait;
use kbchat_core::provider::ProviderResult;
use kbchat_core::query::{RetrieveAndGenerateRequest, RetrieveAndGenerateResponse};
use kbchat_core::{
    BedrockClient, Config, ConversationExchange, KbChatError, QueryEngine,
    QueryRequest, QueryType, RetrieveAndGenerate,
};
use mockito::Server;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Answers every call with the same cited response
struct CitingProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl RetrieveAndGenerate for CitingProvider {
    async fn invoke_retrieve_and_generate(
        &self,
        request: &RetrieveAndGenerateRequest,
    ) -> ProviderResult<RetrieveAndGenerateResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let session = request
            .session_id
            .clone()
            .unwrap_or_else(|| "assigned-session-42".to_string());
        Ok(serde_json::from_value(json!({
            "output": {"text": "X is the thing described in the guide."},
            "citations": [{
                "retrievedReferences": [{
                    "content": {"text": "X is ..."},
                    "location": {"type": "S3", "s3Location": {"uri": "s3://bucket/documents/x.pdf"}},
                    "score": 0.87
                }]
            }],
            "sessionId": session
        }))
        .unwrap())
    }
}

fn config() -> Config {
    let mut config = Config::default();
    config.knowledge_base.knowledge_base_id = Some("KB123".to_string());
    config
}

#[tokio::test]
async fn test_cited_answer_round_trip() {
    let provider = Arc::new(CitingProvider {
        calls: AtomicUsize::new(0),
    });
    let engine = QueryEngine::new(config().engine_config(), provider.clone());

    let result = engine.query(QueryRequest::new("What is X?")).await.unwrap();

    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.sources.len(), 1);
    assert_eq!(result.sources[0].score, 0.87);
    assert!(result.sources[0].location_uri.ends_with("x.pdf"));
    assert!(!result.session_id.is_empty());
    assert_eq!(result.query_type, QueryType::General);

    // Continue the same session with history
    let follow_up = QueryRequest::new("Summarize the guide")
        .with_session(result.session_id.clone())
        .with_history(vec![ConversationExchange::new("What is X?", result.answer.clone())]);
    let second = engine.query(follow_up).await.unwrap();

    assert_eq!(second.session_id, result.session_id);
    assert_eq!(second.query_type, QueryType::Summary);
    assert!(second
        .enhanced_question
        .as_deref()
        .unwrap()
        .ends_with("Current question: Summarize the guide"));
}

#[tokio::test]
async fn test_empty_question_never_reaches_provider() {
    let provider = Arc::new(CitingProvider {
        calls: AtomicUsize::new(0),
    });
    let engine = QueryEngine::new(config().engine_config(), provider.clone());

    let err = engine.query(QueryRequest::new("")).await.unwrap_err();
    assert!(matches!(err, KbChatError::Validation(_)));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_http_engine_retries_rejected_model() {
    let mut server = Server::new_async().await;

    let stripped = "arn:aws:bedrock:us-east-1::foundation-model/openai.gpt-oss-120b-1";
    let _rejected = server
        .mock("POST", "/retrieveAndGenerate")
        .match_body(mockito::Matcher::Regex("openai.gpt-oss-120b-1:0".to_string()))
        .with_status(400)
        .with_header("x-amzn-ErrorType", "ValidationException")
        .with_body(r#"{"message":"The provided model identifier is invalid."}"#)
        .create_async()
        .await;
    let accepted = server
        .mock("POST", "/retrieveAndGenerate")
        .match_body(mockito::Matcher::PartialJson(json!({
            "retrieveAndGenerateConfiguration": {
                "knowledgeBaseConfiguration": {"modelArn": stripped}
            }
        })))
        .with_status(200)
        .with_body(
            json!({
                "output": {"text": "answer"},
                "citations": [],
                "sessionId": "http-session"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let config = config();
    let client = BedrockClient::new(server.url(), server.url(), None, 5).unwrap();
    let engine = QueryEngine::new(config.engine_config(), Arc::new(client));

    let result = engine.query(QueryRequest::new("What is X?")).await.unwrap();
    accepted.assert_async().await;
    assert_eq!(result.metadata["model"], stripped);
    assert_eq!(result.metadata["attempts"], 2);
    assert_eq!(result.session_id, "http-session");
}

#[tokio::test]
async fn test_http_engine_surfaces_auth_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/retrieveAndGenerate")
        .with_status(403)
        .with_body(
            r#"{"__type":"UnrecognizedClientException","message":"The security token included in the request is invalid."}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let client = BedrockClient::new(server.url(), server.url(), None, 5).unwrap();
    let engine = QueryEngine::new(config().engine_config(), Arc::new(client));

    let err = engine.query(QueryRequest::new("What is X?")).await.unwrap_err();
    mock.assert_async().await;
    assert!(matches!(err, KbChatError::ProviderAuth { .. }));
    assert!(err.to_string().contains("aws configure"));
}
