use super::*;
use crate::core::llm::{BaseLLM, LLMError, generate};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPLETIONS_PATH: &str = "/openai/deployments/chat-deployment/chat/completions";

fn client_for(server: &MockServer) -> AzureOpenAIClient {
    let mut config = AzureOpenAIConfig::new("test-key", server.uri(), "chat-deployment");
    config.system_prompt = "أنت مساعد مفيد".to_string();
    config.request_timeout = Duration::from_secs(2);
    AzureOpenAIClient::new(config).unwrap()
}

fn completion(content: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "finish_reason": "stop",
            "message": {"role": "assistant", "content": content}
        }]
    })
}

#[tokio::test]
async fn test_generate_sends_system_and_user_messages() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(query_param("api-version", "2024-06-01"))
        .and(header("api-key", "test-key"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system", "content": "أنت مساعد مفيد"},
                {"role": "user", "content": "hello"}
            ],
            "max_tokens": 150
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!("Hi there!"))))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = generate(&client, "hello").await.unwrap();
    assert_eq!(reply, "Hi there!");
}

#[tokio::test]
async fn test_null_or_missing_content_is_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!(null))))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(matches!(
        client.generate("hello").await,
        Err(LLMError::EmptyResponse)
    ));
    assert!(matches!(
        client.generate("hello").await,
        Err(LLMError::EmptyResponse)
    ));
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication_failed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "code": "401",
                "message": "Access denied due to invalid subscription key."
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.generate("hello").await {
        Err(LLMError::AuthenticationFailed(msg)) => {
            assert!(msg.contains("invalid subscription key"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_maps_to_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.generate("hello").await {
        Err(LLMError::ProviderError(msg)) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("upstream exploded"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_no_retry_on_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"code": "429", "message": "Rate limit reached"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(matches!(
        client.generate("hello").await,
        Err(LLMError::ProviderError(_))
    ));
}

#[tokio::test]
async fn test_transport_failure_is_network_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion(json!("late")))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(matches!(
        client.generate("hello").await,
        Err(LLMError::NetworkError(_))
    ));
}

#[test]
fn test_chat_completions_url() {
    let config = AzureOpenAIConfig::new("k", "https://res.openai.azure.com/", "gpt-4o");
    assert_eq!(
        config.chat_completions_url(),
        "https://res.openai.azure.com/openai/deployments/gpt-4o/chat/completions"
    );
}

#[test]
fn test_config_debug_hides_key() {
    let config = AzureOpenAIConfig::new("super-secret", "https://res.openai.azure.com", "gpt");
    assert!(!format!("{config:?}").contains("super-secret"));
}

#[test]
fn test_from_server_config() {
    let mut server_config = crate::config::ServerConfig::default();
    match AzureOpenAIClient::from_config(&server_config) {
        Err(LLMError::ConfigurationError(msg)) => assert!(msg.contains("AZURE_OPENAI_KEY")),
        _ => panic!("expected configuration error"),
    }

    server_config.azure_openai_key = Some("key".to_string());
    server_config.azure_openai_endpoint = Some("https://res.openai.azure.com".to_string());
    server_config.azure_openai_deployment = Some("gpt".to_string());
    server_config.llm_max_tokens = 64;
    server_config.llm_temperature = 0.2;

    let client = AzureOpenAIClient::from_config(&server_config).unwrap();
    assert_eq!(client.config().max_tokens, 64);
    assert!((client.config().temperature - 0.2).abs() < f32::EPSILON);
    assert_eq!(client.config().api_version, "2024-06-01");
}

#[test]
fn test_rejects_non_http_endpoint() {
    let config = AzureOpenAIConfig::new("k", "res.openai.azure.com", "gpt");
    assert!(matches!(
        AzureOpenAIClient::new(config),
        Err(LLMError::ConfigurationError(_))
    ));
}
