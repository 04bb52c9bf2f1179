use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use llm_relay::config::{ProviderConfig, RelayConfig, TimeoutConfig};
use llm_relay::providers::OpenAiProvider;
use llm_relay::
{   Error
  , ErrorKind
  , GenerationRequest
  , LlmProvider
  , Orchestrator
  , PromptRequest
  , ProviderKind
  , ResponseStatus
};

fn provider_config(api_base: &str) -> ProviderConfig
{   ProviderConfig
    {   kind: ProviderKind::OpenAI
      , api_base: api_base.to_string()
      , api_key: Some("test-api-key".to_string())
      , ..ProviderConfig::default()
    }
}

fn provider_for(server: &MockServer) -> OpenAiProvider
{   OpenAiProvider::from_config(
      &provider_config(&server.uri()),
      &TimeoutConfig::default()
    ).unwrap()
}

fn generation_request() -> GenerationRequest
{   GenerationRequest
    {   id: "req-1".to_string()
      , prompt: "Explain what is artificial intelligence".to_string()
      , model: "gpt-3.5-turbo".to_string()
      , max_tokens: 150
      , temperature: 0.7
      , user_id: Some("user123".to_string())
      , context: vec![]
    }
}

fn chat_completion(content: &str) -> serde_json::Value
{   json!({
      "id": "chatcmpl-123",
      "object": "chat.completion",
      "created": 1677652288,
      "model": "gpt-3.5-turbo-0125",
      "choices": [{
        "index": 0,
        "message": { "role": "assistant", "content": content },
        "finish_reason": "stop"
      }],
      "usage": {
        "prompt_tokens": 9,
        "completion_tokens": 12,
        "total_tokens": 21
      }
    })
}

#[tokio::test]
async fn test_openai_generate_response()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .and(header("Authorization", "Bearer test-api-key"))
      .and(body_partial_json(json!({
        "model": "gpt-3.5-turbo",
        "max_tokens": 150,
        "user": "user123",
        "messages": [{
          "role": "user",
          "content": "Explain what is artificial intelligence"
        }]
      })))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(chat_completion("AI is..."))
      )
      .expect(1)
      .mount(&server)
      .await;

    let provider = provider_for(&server);
    let response = assert_ok!(
      provider.generate_response(&generation_request()).await
    );

    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(response.content.as_deref(), Some("AI is..."));
    assert_eq!(response.model, "gpt-3.5-turbo-0125");
    assert_eq!(response.tokens_used, Some(21));
    assert_eq!(response.request_id.as_deref(), Some("req-1"));
}

#[tokio::test]
async fn test_openai_sends_context_before_prompt()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .and(body_partial_json(json!({
        "messages": [
          { "role": "user", "content": "first" },
          { "role": "user", "content": "second" },
          { "role": "user", "content": "Explain what is artificial intelligence" }
        ]
      })))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(chat_completion("ok"))
      )
      .expect(1)
      .mount(&server)
      .await;

    let mut request = generation_request();
    request.context = vec!["first".to_string(), "second".to_string()];

    let provider = provider_for(&server);
    assert_ok!(provider.generate_response(&request).await);
}

#[tokio::test]
async fn test_openai_http_error_status()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(429).set_body_json(json!({
        "error": {
          "message": "Rate limit reached",
          "type": "requests",
          "param": null,
          "code": "rate_limit_exceeded"
        }
      })))
      .mount(&server)
      .await;

    let provider = provider_for(&server);
    let err = assert_err!(
      provider.generate_response(&generation_request()).await
    );
    assert_eq!(
      err,
      Error::ApiError("HTTP 429: Rate limit reached".to_string())
    );
}

#[tokio::test]
async fn test_openai_error_payload_with_ok_status()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "error": { "message": "model overloaded", "type": "server_error" }
      })))
      .mount(&server)
      .await;

    let provider = provider_for(&server);
    let err = assert_err!(
      provider.generate_response(&generation_request()).await
    );
    assert_eq!(
      err,
      Error::ApiError("OpenAI API returned error: model overloaded".to_string())
    );
}

#[tokio::test]
async fn test_openai_no_choices()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-123",
        "model": "gpt-3.5-turbo",
        "choices": []
      })))
      .mount(&server)
      .await;

    let provider = provider_for(&server);
    let err = assert_err!(
      provider.generate_response(&generation_request()).await
    );
    assert_eq!(err, Error::NoChoicesInResponse);
}

#[tokio::test]
async fn test_openai_blank_content()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(chat_completion(""))
      )
      .mount(&server)
      .await;

    let provider = provider_for(&server);
    let err = assert_err!(
      provider.generate_response(&generation_request()).await
    );
    assert_eq!(err, Error::EmptyContent);
}

#[tokio::test]
async fn test_openai_malformed_body()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
      .mount(&server)
      .await;

    let provider = provider_for(&server);
    let err = assert_err!(
      provider.generate_response(&generation_request()).await
    );
    assert!(matches!(err, Error::ParseError(_)));
}

#[tokio::test]
async fn test_openai_transport_timeout()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(chat_completion("late"))
          .set_delay(Duration::from_secs(3))
      )
      .mount(&server)
      .await;

    let timeouts = TimeoutConfig
    {   request_timeout_secs: 1
      , health_timeout_secs: 1
    };
    let provider = OpenAiProvider::from_config(
      &provider_config(&server.uri()),
      &timeouts
    ).unwrap();

    let err = assert_err!(
      provider.generate_response(&generation_request()).await
    );
    assert_eq!(err, Error::Timeout);
}

#[tokio::test]
async fn test_openai_missing_api_key()
{   let config = ProviderConfig
    {   api_key: None
      , ..provider_config("http://127.0.0.1:9")
    };
    let provider = OpenAiProvider::from_config(
      &config,
      &TimeoutConfig::default()
    ).unwrap();

    let err = assert_err!(
      provider.generate_response(&generation_request()).await
    );
    assert_eq!(err, Error::MissingApiKey("OpenAI".to_string()));
}

#[tokio::test]
async fn test_openai_lightweight_health_and_models()
{   let provider = OpenAiProvider::from_config(
      &provider_config("http://127.0.0.1:9"),
      &TimeoutConfig::default()
    ).unwrap();

    // no network traffic without health_probe
    assert!(provider.is_healthy().await);
    assert_eq!(provider.provider_name(), "OpenAI");
    assert_eq!(
      assert_ok!(provider.supported_models()),
      vec!["gpt-3.5-turbo", "gpt-3.5-turbo-16k", "gpt-4", "gpt-4-turbo-preview"]
    );

    let empty = OpenAiProvider::from_config(
      &ProviderConfig
      {   models: vec![]
        , ..provider_config("http://127.0.0.1:9")
      },
      &TimeoutConfig::default()
    ).unwrap();
    assert!(!empty.is_healthy().await);
    assert!(matches!(
      empty.supported_models(),
      Err(Error::InvalidConfiguration(_))
    ));
}

#[tokio::test]
async fn test_openai_health_probe()
{   let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/models"))
      .and(header("Authorization", "Bearer test-api-key"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": [{ "id": "gpt-4" }]
      })))
      .expect(1)
      .mount(&server)
      .await;

    let provider = OpenAiProvider::from_config(
      &ProviderConfig
      {   health_probe: true
        , ..provider_config(&server.uri())
      },
      &TimeoutConfig::default()
    ).unwrap();
    assert!(provider.is_healthy().await);

    let failing = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/models"))
      .respond_with(ResponseTemplate::new(503))
      .mount(&failing)
      .await;

    let provider = OpenAiProvider::from_config(
      &ProviderConfig
      {   health_probe: true
        , ..provider_config(&failing.uri())
      },
      &TimeoutConfig::default()
    ).unwrap();
    assert!(!provider.is_healthy().await);
}

#[tokio::test]
async fn test_orchestrator_over_openai_backend()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
      .expect(1)
      .mount(&server)
      .await;

    let config = RelayConfig
    {   provider: provider_config(&server.uri())
      , timeouts: TimeoutConfig::default()
    };
    let orchestrator = Orchestrator::from_config(&config).unwrap();
    assert_eq!(orchestrator.provider_name(), "OpenAI");

    let err = assert_err!(
      orchestrator
        .process_request(PromptRequest::new("Hello").with_model("gpt-4"))
        .await
    );
    assert_eq!(err.kind(), ErrorKind::Processing);
    assert_eq!(
      err.cause(),
      Some(&Error::ApiError("HTTP 500: upstream down".to_string()))
    );
}

#[tokio::test]
#[ignore]
async fn test_openai_live_send_prompt()
{   let api_key = match std::env::var("OPENAI_API_KEY")
    {   Ok(key) => key
      , Err(_) => {
          println!("Skipping: OPENAI_API_KEY not set");
          return;
        }
    };

    let config = ProviderConfig
    {   api_key: Some(api_key)
      , ..provider_config(llm_relay::config::DEFAULT_API_BASE)
    };
    let orchestrator = Orchestrator::new(Arc::new(
      OpenAiProvider::from_config(&config, &TimeoutConfig::default()).unwrap()
    ));

    match orchestrator
      .process_request(PromptRequest::new("What is 2+2?"))
      .await
    {   Ok(response) => {
          println!("Response: {:?}", response.content);
          assert!(response.is_successful());
        }
      , Err(e) => {
          println!("API Error: {}", e);
        }
    }
}
