//! Tests of the daemon client against a mock server

use getforget_cli::DaemonClient;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

fn entry_json(content: &str, uses: u32) -> serde_json::Value {
    serde_json::json!({
        "content": content,
        "timestamp": "2024-01-01T00:00:00Z",
        "initialImportance": 80.0,
        "useCount": uses,
    })
}

#[tokio::test]
async fn test_chat_parses_reply() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path("/api/chat"))
        .and(matchers::body_json(serde_json::json!({"content": "weather?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "prompt": {
                "id": "0b7e2f4a-3c1d-4e5f-8a9b-1c2d3e4f5a6b",
                "type": "user",
                "content": "weather?",
                "timestamp": "2024-01-01T00:00:05Z",
            },
            "message": {
                "id": "6f1c1d3e-8d4b-4c1a-9a53-2f0f7f3c9d11",
                "type": "ai",
                "content": "I remember our earlier conversation: It will rain tomorrow",
                "timestamp": "2024-01-01T00:00:05Z",
            },
            "recalled": "It will rain tomorrow",
            "memories": { "weather": entry_json("It will rain tomorrow", 2) },
        })))
        .mount(&mock_server)
        .await;

    let client = DaemonClient::new(&mock_server.uri()).unwrap();
    let reply = client.chat("weather?").await.unwrap();

    assert_eq!(reply.prompt.content, "weather?");
    assert_eq!(reply.recalled.as_deref(), Some("It will rain tomorrow"));
    assert_eq!(reply.memories["weather"].uses(), 2);
}

#[tokio::test]
async fn test_remember_parses_stored_entry() {
    let mock_server = MockServer::start().await;

    let mut body = entry_json("Weather: rain", 1);
    body["key"] = serde_json::json!("weather");
    body["keywords"] = serde_json::json!(["rain", "weather"]);

    Mock::given(matchers::method("POST"))
        .and(matchers::path("/api/memories"))
        .respond_with(ResponseTemplate::new(201).set_body_json(body))
        .mount(&mock_server)
        .await;

    let client = DaemonClient::new(&mock_server.uri()).unwrap();
    let stored = client.remember("Weather: rain").await.unwrap();

    assert_eq!(stored.key, "weather");
    assert_eq!(stored.entry.base_importance, 80.0);
    assert!(stored.entry.keywords.contains("rain"));
}

#[tokio::test]
async fn test_recall_sends_query_parameter() {
    let mock_server = MockServer::start().await;

    let mut hit = entry_json("garden tomatoes ripen", 1);
    hit["key"] = serde_json::json!("tomatoes");
    hit["importance"] = serde_json::json!(55.4);

    Mock::given(matchers::method("GET"))
        .and(matchers::path("/api/memories/search"))
        .and(matchers::query_param("q", "tomatoes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([hit])))
        .mount(&mock_server)
        .await;

    let client = DaemonClient::new(&mock_server.uri()).unwrap();
    let matches = client.recall("tomatoes").await.unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].key, "tomatoes");
    assert_eq!(matches[0].importance, 55.4);
}

#[tokio::test]
async fn test_forget_and_show_handle_missing_keys() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("DELETE"))
        .and(matchers::path("/api/memories/weather"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;
    Mock::given(matchers::method("DELETE"))
        .and(matchers::path("/api/memories/absent"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/api/memories/absent"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = DaemonClient::new(&mock_server.uri()).unwrap();
    assert!(client.forget("weather").await.unwrap());
    assert!(!client.forget("absent").await.unwrap());
    assert!(client.show("absent").await.unwrap().is_none());
}

#[tokio::test]
async fn test_stats_parses_forgetting_counters() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("GET"))
        .and(matchers::path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "count": 4,
            "mean_importance": 41.5,
            "forgetting": {
                "state": "idle",
                "cycles": 12,
                "total_forgotten": 7,
                "last_cycle_at": null,
            },
        })))
        .mount(&mock_server)
        .await;

    let client = DaemonClient::new(&mock_server.uri()).unwrap();
    let stats = client.stats().await.unwrap();

    assert_eq!(stats.store.count, 4);
    assert_eq!(stats.forgetting.cycles, 12);
    assert_eq!(stats.forgetting.total_forgotten, 7);
    assert!(stats.forgetting.last_cycle_at.is_none());
    assert!(stats.store.decay_hours.is_none());
}

#[tokio::test]
async fn test_decay_hours_follow_daemon() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("GET"))
        .and(matchers::path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "count": 0,
            "mean_importance": 0.0,
            "decay_hours": 6.0,
            "forgetting": {
                "state": "scanning",
                "cycles": 0,
                "total_forgotten": 0,
                "last_cycle_at": null,
            },
        })))
        .mount(&mock_server)
        .await;

    let client = DaemonClient::new(&mock_server.uri()).unwrap();
    assert_eq!(client.decay_hours().await.unwrap(), 6.0);
}

#[tokio::test]
async fn test_decay_hours_default_when_daemon_has_none() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("GET"))
        .and(matchers::path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "count": 0,
            "mean_importance": 0.0,
            "forgetting": {
                "state": "idle",
                "cycles": 0,
                "total_forgotten": 0,
                "last_cycle_at": null,
            },
        })))
        .mount(&mock_server)
        .await;

    let client = DaemonClient::new(&mock_server.uri()).unwrap();
    assert_eq!(client.decay_hours().await.unwrap(), 24.0);
}

#[tokio::test]
async fn test_keys_with_reserved_characters_stay_one_segment() {
    let mock_server = MockServer::start().await;

    let mut stored = entry_json("this and/or that", 1);
    stored["key"] = serde_json::json!("and/or");

    Mock::given(matchers::method("GET"))
        .and(matchers::path("/api/memories/and%2For"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(matchers::method("DELETE"))
        .and(matchers::path("/api/memories/what%3Fever"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = DaemonClient::new(&format!("{}/", mock_server.uri())).unwrap();
    let shown = client.show("and/or").await.unwrap().unwrap();
    assert_eq!(shown.key, "and/or");
    assert!(client.forget("what?ever").await.unwrap());
}

#[tokio::test]
async fn test_error_body_becomes_message() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path("/api/memories"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "error": { "type": "no_keywords", "message": "No keywords found in input" }
        })))
        .mount(&mock_server)
        .await;

    let client = DaemonClient::new(&mock_server.uri()).unwrap();
    let err = client.remember("to be").await.err().unwrap();

    assert!(err.to_string().contains("422"));
    assert!(err.to_string().contains("No keywords found in input"));
}
