use aura_core::{CapabilityProvider, ImageAttachment};
use errors::ProviderError;
use futures_util::StreamExt;
use providers::{GeminiProvider, OllamaProvider};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ollama(server: &MockServer) -> OllamaProvider {
    OllamaProvider::new(server.uri(), "qwen3:8b", Duration::from_secs(5)).unwrap()
}

fn gemini(server: &MockServer) -> GeminiProvider {
    GeminiProvider::new(
        "test_key",
        server.uri(),
        "gemini-2.0-flash",
        "gemini-1.5-pro",
        Duration::from_secs(5)
    )
    .unwrap()
}

#[tokio::test]
async fn test_ollama_generate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({ "model": "qwen3:8b", "stream": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "{\"ok\": true}",
            "prompt_eval_count": 10,
            "eval_count": 5,
            "done": true
        })))
        .mount(&mock_server)
        .await;

    let generation = ollama(&mock_server).generate("hello").await.unwrap();
    assert_eq!(generation.content, "{\"ok\": true}");
    assert_eq!(generation.total_tokens, Some(15));
}

#[tokio::test]
async fn test_ollama_stream_ndjson() {
    let mock_server = MockServer::start().await;

    let body = concat!(
        "{\"response\":\"SUMMARY: \",\"done\":false}\n",
        "{\"response\":\"A page\",\"done\":false}\n",
        "{\"response\":\"\",\"done\":true}\n"
    );
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({ "stream": true })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let stream = ollama(&mock_server).generate_stream("explain").await.unwrap();
    let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;
    assert_eq!(fragments, vec!["SUMMARY: ", "A page"]);
}

#[tokio::test]
async fn test_ollama_images_are_base64() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({ "images": ["AQID"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "seen" })))
        .mount(&mock_server)
        .await;

    let image = ImageAttachment {
        mime_type: "image/png".to_string(),
        data: vec![1, 2, 3]
    };
    let generation = ollama(&mock_server)
        .generate_with_images("look", &[image])
        .await
        .unwrap();
    assert_eq!(generation.content, "seen");
}

#[tokio::test]
async fn test_ollama_status_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&mock_server)
        .await;

    let err = ollama(&mock_server).generate("hello").await.unwrap_err();
    assert_eq!(
        err,
        ProviderError::Status {
            provider: "ollama".to_string(),
            status: 500,
            body: "model crashed".to_string()
        }
    );
}

#[tokio::test]
async fn test_ollama_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "response": "late" }))
                .set_delay(Duration::from_millis(500))
        )
        .mount(&mock_server)
        .await;

    let provider =
        OllamaProvider::new(mock_server.uri(), "qwen3:8b", Duration::from_millis(50)).unwrap();
    let err = provider.generate("hello").await.unwrap_err();
    assert!(matches!(err, ProviderError::Timeout { .. }));
    assert!(err.is_connection_failure());
}

#[tokio::test]
async fn test_ollama_connection_refused() {
    let provider =
        OllamaProvider::new("http://127.0.0.1:9", "qwen3:8b", Duration::from_secs(2)).unwrap();
    let err = provider.generate("hello").await.unwrap_err();
    assert!(err.is_connection_failure());
}

#[tokio::test]
async fn test_gemini_generate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hello" }, { "text": " world" }] } }],
            "usageMetadata": { "totalTokenCount": 42 }
        })))
        .mount(&mock_server)
        .await;

    let generation = gemini(&mock_server).generate("hi").await.unwrap();
    assert_eq!(generation.content, "Hello world");
    assert_eq!(generation.total_tokens, Some(42));
}

#[tokio::test]
async fn test_gemini_no_candidates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&mock_server)
        .await;

    let err = gemini(&mock_server).generate("hi").await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_gemini_stream_sse() {
    let mock_server = MockServer::start().await;

    let body = concat!(
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"SUMMARY: Shop\"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\" ACTIONS: Buy\"}]}}]}\n\n"
    );
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let stream = gemini(&mock_server).generate_stream("explain").await.unwrap();
    let text: String = stream.map(|f| f.unwrap()).collect::<Vec<_>>().await.concat();
    assert_eq!(text, "SUMMARY: Shop ACTIONS: Buy");
}

#[tokio::test]
async fn test_gemini_images_use_vision_model() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-pro:generateContent"))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [
                { "text": "verify" },
                { "inline_data": { "mime_type": "image/jpeg", "data": "AQID" } }
            ] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "{}" }] } }]
        })))
        .mount(&mock_server)
        .await;

    let image = ImageAttachment {
        mime_type: "image/jpeg".to_string(),
        data: vec![1, 2, 3]
    };
    let generation = gemini(&mock_server)
        .generate_with_images("verify", &[image])
        .await
        .unwrap();
    assert_eq!(generation.content, "{}");
}
