//! Full pipeline: hook listener and API router backed by the real chat
//! completions provider, with the remote endpoint mocked.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, get, preference, OTHER_USER, USER};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use translate_relay::api::{self, AppState};
use translate_relay::config::{ConfigHandle, ProviderSettings};
use translate_relay::db::MemoryStore;
use translate_relay::hook::{self, HookState, MessageHook, MESSAGE_WILL_BE_POSTED_PATH};
use translate_relay::platform::{EventBus, MemoryPosts, Post};
use translate_relay::preferences::PreferenceStore;
use translate_relay::provider::ChatCompletionsProvider;
use translate_relay::relay::Dispatcher;
use translate_relay::retry::RetryPolicy;
use translate_relay::security::HOOK_SECRET_HEADER;
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer, ResponseTemplate,
};

const SECRET: &str = "e2e-hook-secret";

fn chat_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
}

async fn mock_provider() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("You identify the language"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(
            r#"{"languages":[{"code":"es","score":0.98}]}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("professional translator"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_response("Good morning, team\n")),
        )
        .expect(2)
        .mount(&server)
        .await;

    server
}

struct Service {
    preferences: PreferenceStore,
    posts: Arc<MemoryPosts>,
    hook: axum::Router,
    api: axum::Router,
}

fn service(api_url: String) -> Service {
    let handle = ConfigHandle::new(ProviderSettings {
        api_key: Some("test-api-key".to_string()),
        api_url,
        model: "gpt-4o-mini".to_string(),
        timeout: Duration::from_secs(5),
    });
    let provider = ChatCompletionsProvider::new(reqwest::Client::new(), handle.clone())
        .with_retry(RetryPolicy::no_retry());
    let dispatcher = Dispatcher::new(Arc::new(provider));
    let preferences =
        PreferenceStore::new(Arc::new(MemoryStore::new()), Arc::new(EventBus::default()));
    let posts = Arc::new(MemoryPosts::new());

    Service {
        hook: hook::router(HookState {
            hook: Arc::new(MessageHook::new(
                preferences.clone(),
                dispatcher.clone(),
                handle.clone(),
            )),
            secret: Arc::from(SECRET),
        }),
        api: api::router(AppState {
            preferences: preferences.clone(),
            dispatcher,
            posts: posts.clone(),
            config: handle,
        }),
        preferences,
        posts,
    }
}

#[tokio::test]
async fn test_hook_and_go_through_remote_provider() {
    let server = mock_provider().await;
    let service = service(format!("{}/v1/chat/completions", server.uri()));
    service
        .preferences
        .set(&preference(true, "auto", "en"))
        .await
        .unwrap();

    // Posting user has auto → en: one detection, one translation
    let body = serde_json::json!({
        "post": {
            "id": "post1",
            "user_id": USER,
            "message": "Buenos días, equipo",
            "update_at": 10,
            "channel_id": "town-square"
        }
    });
    let request = Request::builder()
        .method("POST")
        .uri(MESSAGE_WILL_BE_POSTED_PATH)
        .header("content-type", "application/json")
        .header(HOOK_SECRET_HEADER, SECRET)
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = service.hook.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reply = body_json(response).await;
    assert_eq!(
        reply["post"]["message"],
        "Buenos días, equipo\n\n(Translated: Spanish → English)\nGood morning, team"
    );
    assert_eq!(reply["post"]["channel_id"], "town-square");
    assert_eq!(reply["rejection_reason"], "");

    // Another user asks for the stored text with an explicit source: no detection
    service
        .posts
        .insert(Post::new("post2", USER, "Buenos días, equipo", 20));
    let response = service
        .api
        .clone()
        .oneshot(get("/api/go?post_id=post2&source=es&target=en", Some(OTHER_USER)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let record = body_json(response).await;
    assert_eq!(record["id"], "post2:es:en:20");
    assert_eq!(record["translated_text"], "Good morning, team");

    // Mock expectations (1 detection, 2 translations) are verified on drop
    drop(server);
}
