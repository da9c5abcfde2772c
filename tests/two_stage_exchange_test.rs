//! End-to-end two-stage exchange over a mocked chat-completions endpoint.
//!
//! The first-stage mock answers any request; the second-stage mock only
//! matches bodies that already carry tool results and is mounted first so it
//! takes precedence.

use std::time::Duration;

use serde_json::{Value, json};
use toolrelay::prelude::*;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROMPT: &str = "What's the weather like in San Francisco, Tokyo, and Paris?";

fn tool_call(id: &str, name: &str, arguments: &str) -> Value {
    json!({
        "id": id,
        "type": "function",
        "function": {"name": name, "arguments": arguments}
    })
}

fn tool_call_completion(calls: Vec<Value>) -> Value {
    json!({
        "id": "chatcmpl-stage1",
        "object": "chat.completion",
        "model": "gpt-3.5-turbo-1106",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": null, "tool_calls": calls},
            "finish_reason": "tool_calls"
        }],
        "usage": {"prompt_tokens": 80, "completion_tokens": 60, "total_tokens": 140}
    })
}

fn text_completion(text: &str) -> Value {
    json!({
        "id": "chatcmpl-stage2",
        "object": "chat.completion",
        "model": "gpt-3.5-turbo-1106",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 200, "completion_tokens": 40, "total_tokens": 240}
    })
}

async fn mount_second_stage(server: &MockServer, text: &str, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("tool_call_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_completion(text)))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_first_stage(server: &MockServer, calls: Vec<Value>) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_completion(calls)))
        .up_to_n_times(1)
        .expect(1)
        .mount(server)
        .await;
}

fn setup(server: &MockServer) -> (OpenAiClient, ToolRegistry) {
    let config = OpenAiConfig::new("test-api-key").with_base_url(server.uri());
    let client = OpenAiClient::new_with_config(config).unwrap();
    let mut registry = ToolRegistry::new();
    toolrelay::tools::weather::register(&mut registry).unwrap();
    (client, registry)
}

async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn three_cities_resolve_in_one_round() {
    let server = MockServer::start().await;
    mount_second_stage(
        &server,
        "San Francisco is 72°F, Tokyo is 10°C and Paris is 22°C.",
        1,
    )
    .await;
    mount_first_stage(
        &server,
        vec![
            tool_call("call_sf", "get_current_weather", r#"{"location": "San Francisco", "unit": "celsius"}"#),
            tool_call("call_tk", "get_current_weather", r#"{"location": "Tokyo", "unit": "celsius"}"#),
            tool_call("call_pa", "get_current_weather", r#"{"location": "Paris", "unit": "celsius"}"#),
        ],
    )
    .await;
    let (client, registry) = setup(&server);

    let outcome = Orchestrator::new(&client, &registry)
        .run(PROMPT)
        .await
        .unwrap();

    assert_eq!(outcome.remote_calls, 2);
    assert_eq!(
        outcome.text(),
        Some("San Francisco is 72°F, Tokyo is 10°C and Paris is 22°C.")
    );
    assert_eq!(outcome.usage.unwrap().total_tokens, 380);

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 2);

    let first = &bodies[0];
    assert_eq!(first["messages"].as_array().unwrap().len(), 1);
    assert_eq!(first["tool_choice"], "auto");
    assert_eq!(first["tools"][0]["function"]["name"], "get_current_weather");

    let second = &bodies[1];
    assert!(second.get("tools").is_none());
    let messages = second["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 5);
    assert_eq!(messages[0]["content"], PROMPT);
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(
        messages[1]["tool_calls"][0]["function"]["arguments"],
        r#"{"location": "San Francisco", "unit": "celsius"}"#
    );

    let expected = [
        ("call_sf", json!({"location": "San Francisco", "temperature": "72", "unit": "fahrenheit"})),
        ("call_tk", json!({"location": "Tokyo", "temperature": "10", "unit": "celsius"})),
        ("call_pa", json!({"location": "Paris", "temperature": "22", "unit": "celsius"})),
    ];
    for (message, (id, output)) in messages[2..].iter().zip(expected) {
        assert_eq!(message["role"], "tool");
        assert_eq!(message["tool_call_id"], id);
        assert_eq!(message["name"], "get_current_weather");
        let content: Value = serde_json::from_str(message["content"].as_str().unwrap()).unwrap();
        assert_eq!(content, output);
    }
}

#[tokio::test]
async fn unknown_location_yields_unknown_temperature() {
    let server = MockServer::start().await;
    mount_second_stage(&server, "I don't know the weather in Lagos.", 1).await;
    mount_first_stage(
        &server,
        vec![tool_call("call_1", "get_current_weather", r#"{"location": "Lagos"}"#)],
    )
    .await;
    let (client, registry) = setup(&server);

    let outcome = Orchestrator::new(&client, &registry)
        .run("What's the weather in Lagos?")
        .await
        .unwrap();

    assert_eq!(
        outcome.tool_results[0].output,
        json!({"location": "Lagos", "temperature": "unknown"})
    );
}

#[tokio::test]
async fn direct_answer_makes_one_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_completion("Hi!")))
        .expect(1)
        .mount(&server)
        .await;
    let (client, registry) = setup(&server);

    let outcome = Orchestrator::new(&client, &registry).run("Say hi").await.unwrap();

    assert_eq!(outcome.remote_calls, 1);
    assert_eq!(outcome.text(), Some("Hi!"));
    assert!(outcome.tool_results.is_empty());
}

#[tokio::test]
async fn unknown_tool_is_reported_in_second_call() {
    let server = MockServer::start().await;
    mount_second_stage(&server, "I can't fetch stock prices.", 1).await;
    mount_first_stage(
        &server,
        vec![tool_call("call_1", "get_stock_price", r#"{"ticker": "ACME"}"#)],
    )
    .await;
    let (client, registry) = setup(&server);

    let outcome = Orchestrator::new(&client, &registry)
        .run("ACME stock price?")
        .await
        .unwrap();
    assert_eq!(outcome.remote_calls, 2);

    let bodies = request_bodies(&server).await;
    let tool_message = &bodies[1]["messages"][2];
    assert_eq!(tool_message["tool_call_id"], "call_1");
    let content: Value =
        serde_json::from_str(tool_message["content"].as_str().unwrap()).unwrap();
    assert_eq!(content["error"], "unknown_tool");
}

#[tokio::test]
async fn unknown_tool_aborts_before_second_call() {
    let server = MockServer::start().await;
    mount_second_stage(&server, "unused", 0).await;
    mount_first_stage(
        &server,
        vec![tool_call("call_1", "get_stock_price", r#"{"ticker": "ACME"}"#)],
    )
    .await;
    let (client, registry) = setup(&server);

    let err = Orchestrator::new(&client, &registry)
        .failure_policy(ToolFailurePolicy::Abort)
        .run("ACME stock price?")
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(ExchangeStage::ToolResolution));
    assert!(matches!(err.root(), LlmError::UnknownTool { .. }));
    assert_eq!(request_bodies(&server).await.len(), 1);
}

#[tokio::test]
async fn malformed_arguments_are_reported() {
    let server = MockServer::start().await;
    mount_second_stage(&server, "Sorry, something went wrong.", 1).await;
    mount_first_stage(
        &server,
        vec![tool_call("call_1", "get_current_weather", r#"{"location": "Tok"#)],
    )
    .await;
    let (client, registry) = setup(&server);

    let outcome = Orchestrator::new(&client, &registry).run(PROMPT).await.unwrap();

    assert!(outcome.tool_results[0].is_error);
    assert_eq!(outcome.tool_results[0].output["error"], "invalid_arguments");
}

#[tokio::test]
async fn transient_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_completion("Back online.")))
        .expect(1)
        .mount(&server)
        .await;
    let (client, registry) = setup(&server);

    let outcome = Orchestrator::new(&client, &registry)
        .retry(
            RetryPolicy::new()
                .with_attempts(3)
                .with_base_delay(Duration::from_millis(5))
                .with_jitter(false),
        )
        .run("ping")
        .await
        .unwrap();

    assert_eq!(outcome.text(), Some("Back online."));
}

#[tokio::test]
async fn second_call_failure_names_the_stage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("tool_call_id"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Invalid message sequence", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;
    mount_first_stage(
        &server,
        vec![tool_call("call_1", "get_current_weather", r#"{"location": "Paris"}"#)],
    )
    .await;
    let (client, registry) = setup(&server);

    let err = Orchestrator::new(&client, &registry).run(PROMPT).await.unwrap_err();

    assert_eq!(err.stage(), Some(ExchangeStage::SecondCall));
    assert_eq!(err.status_code(), Some(400));
    assert!(err.to_string().starts_with("second call failed"));
}
