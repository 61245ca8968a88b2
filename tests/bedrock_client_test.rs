mod common;

use bedrock_llm_shim::{BedrockRuntimeClient, Error, InferenceBackend, ModelFamily};
use futures_util::StreamExt;
use serde_json::{json, Map};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(mock_server: &MockServer) -> BedrockRuntimeClient {
    BedrockRuntimeClient::new_with_base_url(mock_server.uri()).expect("Failed to create client")
}

#[tokio::test]
async fn test_invoke_sends_provider_body() {
    let mock_server = MockServer::start().await;

    let body = ModelFamily::Amazon.build_request_body("hello", &Map::new());

    Mock::given(method("POST"))
        .and(path("/model/amazon.titan-text-express-v1/invoke"))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "inputText": "hello",
            "textGenerationConfig": {"maxTokenCount": 256}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "inputTextTokenCount": 1,
            "results": [{"tokenCount": 3, "outputText": "Hi there", "completionReason": "FINISH"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = assert_ok!(
        client(&mock_server)
            .invoke("amazon.titan-text-express-v1", &body)
            .await
    );
    assert_eq!(ModelFamily::Amazon.parse_response(&response).unwrap(), "Hi there");
}

#[tokio::test]
async fn test_invoke_encodes_versioned_model_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/model/anthropic\.claude-3-haiku-20240307-v1(%3A|:)0/invoke$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "ok"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = client(&mock_server)
        .invoke("anthropic.claude-3-haiku-20240307-v1:0", &json!({}))
        .await
        .unwrap();
    assert_eq!(response["content"][0]["text"], "ok");
}

#[tokio::test]
async fn test_invoke_error_status_is_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Malformed input request: extraneous key [bogus] is not permitted"
        })))
        .mount(&mock_server)
        .await;

    let err = assert_err!(
        client(&mock_server)
            .invoke("meta.llama2-13b-chat-v1", &json!({"bogus": 1}))
            .await
    );

    match err {
        Error::Transport { service, status, message } => {
            assert_eq!(service, "bedrock-runtime");
            assert_eq!(status, Some(400));
            assert!(message.contains("extraneous key"));
        }
        other => panic!("Expected Transport, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invoke_streaming_decodes_chunks() {
    let mock_server = MockServer::start().await;

    let wire = common::event_stream_body(vec![
        common::chunk_frame(&json!({"completion": "Hello", "stop_reason": null})),
        common::chunk_frame(&json!({"completion": " world", "stop_reason": "stop_sequence"})),
    ]);

    Mock::given(method("POST"))
        .and(path("/model/anthropic.claude-v2/invoke-with-response-stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/vnd.amazon.eventstream")
                .set_body_bytes(wire),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut chunks = client(&mock_server)
        .invoke_streaming("anthropic.claude-v2", &json!({"prompt": "hi"}))
        .await
        .unwrap();

    let mut payloads = Vec::new();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.unwrap();
        payloads.push(serde_json::from_slice::<serde_json::Value>(&chunk.bytes).unwrap());
    }

    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[0]["completion"], "Hello");
    assert_eq!(payloads[1]["completion"], " world");
}

#[tokio::test]
async fn test_invoke_streaming_surfaces_exception_events() {
    let mock_server = MockServer::start().await;

    let wire = common::event_stream_body(vec![
        common::chunk_frame(&json!({"completion": "partial"})),
        common::exception_frame("modelStreamErrorException", "Model stream failed"),
    ]);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(wire))
        .mount(&mock_server)
        .await;

    let mut chunks = client(&mock_server)
        .invoke_streaming("anthropic.claude-v2", &json!({"prompt": "hi"}))
        .await
        .unwrap();

    assert!(chunks.next().await.unwrap().is_ok());
    let err = chunks.next().await.unwrap().unwrap_err();
    assert!(err
        .to_string()
        .contains("modelStreamErrorException: Model stream failed"));
}
