//! Integration tests for the webhook + admin HTTP surface.
//!
//! Each test builds the real Axum router over an in-memory identity store
//! and a scripted chat platform, and drives it with `oneshot` requests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use assistant_bridge::actions::HandlerRegistry;
use assistant_bridge::error::PlatformError;
use assistant_bridge::platform::{
    Channel, ChannelMember, ChatPlatform, PlatformUser, Post, Team, TeamUnread,
};
use assistant_bridge::server;
use assistant_bridge::store::{IdentityStore, LibSqlBackend};
use assistant_bridge::webhook::SUGGESTION_CHIPS;

const COMMAND_TOKEN: &str = "slash-secret";

/// Scripted chat platform: one account directory, statuses, no unread DMs.
#[derive(Default)]
struct ScriptedPlatform {
    users: Vec<PlatformUser>,
    status: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<&'static str>>,
    posts: Mutex<Vec<String>>,
}

impl ScriptedPlatform {
    fn log(&self, op: &'static str) {
        self.calls.lock().unwrap().push(op);
    }
}

#[async_trait]
impl ChatPlatform for ScriptedPlatform {
    async fn user_by_username(&self, username: &str) -> Result<PlatformUser, PlatformError> {
        self.log("user_by_username");
        self.users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(PlatformError::NotFound {
                entity: "user".into(),
                id: username.into(),
            })
    }
    async fn user_by_id(&self, user_id: &str) -> Result<PlatformUser, PlatformError> {
        self.log("user_by_id");
        Err(PlatformError::NotFound {
            entity: "user".into(),
            id: user_id.into(),
        })
    }
    async fn teams_for_user(&self, _user_id: &str) -> Result<Vec<Team>, PlatformError> {
        self.log("teams_for_user");
        Ok(vec![Team {
            id: "t1".into(),
            display_name: "Engineering".into(),
        }])
    }
    async fn team(&self, team_id: &str) -> Result<Team, PlatformError> {
        self.log("team");
        Ok(Team {
            id: team_id.into(),
            display_name: "Engineering".into(),
        })
    }
    async fn get_status(&self, user_id: &str) -> Result<String, PlatformError> {
        self.log("get_status");
        Ok(self
            .status
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| "online".into()))
    }
    async fn update_status(&self, user_id: &str, status: &str) -> Result<(), PlatformError> {
        self.log("update_status");
        self.status
            .lock()
            .unwrap()
            .insert(user_id.into(), status.into());
        Ok(())
    }
    async fn direct_channel(&self, a: &str, b: &str) -> Result<String, PlatformError> {
        self.log("direct_channel");
        Ok(format!("{a}__{b}"))
    }
    async fn create_post(&self, _c: &str, _u: &str, message: &str) -> Result<(), PlatformError> {
        self.log("create_post");
        self.posts.lock().unwrap().push(message.into());
        Ok(())
    }
    async fn team_unreads(&self, _user_id: &str) -> Result<Vec<TeamUnread>, PlatformError> {
        self.log("team_unreads");
        Ok(vec![TeamUnread {
            team_id: "t1".into(),
            msg_count: 4,
            mention_count: 2,
        }])
    }
    async fn channels_for_user(&self, _u: &str, _t: &str) -> Result<Vec<Channel>, PlatformError> {
        self.log("channels_for_user");
        Ok(Vec::new())
    }
    async fn channel_member(&self, c: &str, u: &str) -> Result<ChannelMember, PlatformError> {
        self.log("channel_member");
        Ok(ChannelMember {
            channel_id: c.into(),
            user_id: u.into(),
            mention_count: 0,
        })
    }
    async fn latest_post(&self, _c: &str) -> Result<Option<Post>, PlatformError> {
        self.log("latest_post");
        Ok(None)
    }
}

struct TestApp {
    router: Router,
    store: Arc<LibSqlBackend>,
    platform: Arc<ScriptedPlatform>,
}

async fn test_app() -> TestApp {
    let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let platform = Arc::new(ScriptedPlatform {
        users: vec![PlatformUser {
            id: "uid-bob".into(),
            username: "bob".into(),
        }],
        ..Default::default()
    });
    let registry = Arc::new(HandlerRegistry::with_builtins(platform.clone()));
    let router = server::router(store.clone(), registry, SecretString::from(COMMAND_TOKEN));
    TestApp {
        router,
        store,
        platform,
    }
}

fn webhook_body(handler: &str, caller: Option<&str>, params: Value) -> Value {
    let mut body = json!({
        "handler": {"name": handler},
        "intent": {"name": handler, "params": params, "query": ""},
        "scene": {"name": "Main", "slots": {}},
        "session": {"id": "session-1", "params": {}},
    });
    if let Some(caller) = caller {
        body["user"] = json!({"locale": "en-US", "params": {"username": caller}});
    }
    body
}

async fn post_raw(app: &Router, body: impl Into<Body>) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    let response = app.clone().oneshot(req).await.expect("request failed");
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn post_webhook(app: &Router, body: Value) -> (StatusCode, Value) {
    let (status, bytes) = post_raw(app, body.to_string()).await;
    let json = serde_json::from_slice(&bytes).expect("invalid JSON response");
    (status, json)
}

fn text_of(json: &Value) -> &str {
    json["prompt"]["lastSimple"]["text"].as_str().unwrap()
}

fn assert_chips(json: &Value) {
    let chips: Vec<&str> = json["prompt"]["suggestions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(chips, SUGGESTION_CHIPS);
}

// ── Transport-level failures ─────────────────────────────────────────

#[tokio::test]
async fn non_json_body_is_400_with_empty_body() {
    let app = test_app().await;
    let (status, body) = post_raw(&app.router, "this is not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.is_empty());
}

#[tokio::test]
async fn non_post_method_is_400() {
    let app = test_app().await;
    let req = Request::builder()
        .method(Method::GET)
        .uri("/webhook")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn missing_handler_name_is_400() {
    let app = test_app().await;
    let (status, body) = post_raw(&app.router, r#"{"intent": {"name": "change_status"}}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.is_empty());
}

// ── Soft failures ─────────────────────────────────────────────────────

#[tokio::test]
async fn unlinked_caller_gets_200_apology() {
    let app = test_app().await;
    let (status, json) = post_webhook(
        &app.router,
        webhook_body("change_status", Some("stranger"), json!({"status": {"resolved": "away"}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(text_of(&json).contains("didn't enable the integration"));
    assert_chips(&json);
    assert!(app.platform.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn caller_without_username_gets_200_apology() {
    let app = test_app().await;
    let (status, json) = post_webhook(&app.router, webhook_body("get_status", None, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(text_of(&json).contains("didn't set your username"));
    assert_chips(&json);
}

#[tokio::test]
async fn unknown_handler_gets_fixed_message() {
    let app = test_app().await;
    app.store.link("alice", "uid-alice").await.unwrap();

    let (status, json) = post_webhook(
        &app.router,
        webhook_body("nonexistent_handler_xyz", Some("alice"), json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(text_of(&json), "Sorry, don't know what to do!");
    assert_chips(&json);
}

// ── Handlers end to end ──────────────────────────────────────────────

#[tokio::test]
async fn change_status_reads_then_writes() {
    let app = test_app().await;
    app.store.link("alice", "uid-alice").await.unwrap();

    let (status, json) = post_webhook(
        &app.router,
        webhook_body(
            "change_status",
            Some("alice"),
            json!({"status": {"original": "away", "resolved": "away"}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(text_of(&json), "Changing status from online to away");
    assert_eq!(json["prompt"]["lastSimple"]["speech"], "Changing status from online to away");
    assert_chips(&json);
    assert_eq!(
        *app.platform.calls.lock().unwrap(),
        vec!["get_status", "update_status"]
    );
    assert!(json.get("user").is_none());
}

#[tokio::test]
async fn send_message_posts_once_per_call() {
    let app = test_app().await;
    app.store.link("alice", "uid-alice").await.unwrap();
    let body = webhook_body(
        "send_message",
        Some("alice"),
        json!({"other_user": {"resolved": "bob"}, "message": {"resolved": "standup in 5"}}),
    );

    let (_, first) = post_webhook(&app.router, body.clone()).await;
    let (_, second) = post_webhook(&app.router, body).await;

    assert_eq!(text_of(&first), "Message sent!");
    assert_eq!(text_of(&second), "Message sent!");
    assert_eq!(
        *app.platform.posts.lock().unwrap(),
        vec!["standup in 5", "standup in 5"]
    );
}

#[tokio::test]
async fn read_direct_messages_with_nothing_unread() {
    let app = test_app().await;
    app.store.link("alice", "uid-alice").await.unwrap();

    let (status, json) = post_webhook(
        &app.router,
        webhook_body("read_direct_messages", Some("alice"), json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(text_of(&json), "You have no unread DMs");
    assert_chips(&json);
}

#[tokio::test]
async fn get_status_summarises_workspaces() {
    let app = test_app().await;
    app.store.link("alice", "uid-alice").await.unwrap();

    let (_, json) = post_webhook(&app.router, webhook_body("get_status", Some("alice"), json!({}))).await;
    assert_eq!(
        text_of(&json),
        "Your status is online.\nEngineering: 4 unread messages, 2 mentions."
    );
}

#[tokio::test]
async fn set_username_echoes_into_user_params() {
    let app = test_app().await;
    let (status, json) = post_webhook(
        &app.router,
        webhook_body("set_username", None, json!({"username": {"original": "Alice", "resolved": "alice"}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["params"]["username"], "alice");
    assert_chips(&json);
    // Echoing a username never links it.
    assert!(app.store.resolve("alice").await.is_err());
}

// ── Admin commands ───────────────────────────────────────────────────

fn command_form(token: &str, text: &str, user_id: &str) -> String {
    format!(
        "token={token}&command=%2Fassistant&text={}&user_id={user_id}",
        text.replace(' ', "+").replace('@', "%40")
    )
}

async fn slash_command(app: &Router, text: &str, user_id: &str) -> Value {
    let form = command_form(COMMAND_TOKEN, text, user_id);
    let req = Request::builder()
        .method(Method::POST)
        .uri("/command")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn connect_enables_webhook_and_disconnect_revokes_it() {
    let app = test_app().await;

    let reply = slash_command(&app.router, "connect alice@example.com", "uid-alice").await;
    assert_eq!(reply["text"], "Connected!");
    assert_eq!(reply["response_type"], "ephemeral");

    let (_, json) = post_webhook(
        &app.router,
        webhook_body("get_status", Some("alice@example.com"), json!({})),
    )
    .await;
    assert!(text_of(&json).starts_with("Your status is"));

    let reply = slash_command(&app.router, "disconnect", "uid-alice").await;
    assert_eq!(reply["text"], "Disconnected!");

    let (_, json) = post_webhook(
        &app.router,
        webhook_body("get_status", Some("alice@example.com"), json!({})),
    )
    .await;
    assert!(text_of(&json).contains("didn't enable the integration"));
}

#[tokio::test]
async fn forged_command_token_cannot_link_another_account() {
    let app = test_app().await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/command")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(command_form("wrong", "connect mallory", "uid-alice")))
        .unwrap();
    let response = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (_, json) = post_webhook(&app.router, webhook_body("get_status", Some("mallory"), json!({}))).await;
    assert!(text_of(&json).contains("didn't enable the integration"));
    assert!(app.platform.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn disconnect_removes_every_identity_of_the_account() {
    let app = test_app().await;

    assert_eq!(slash_command(&app.router, "connect alice", "uid-alice").await["text"], "Connected!");
    assert_eq!(slash_command(&app.router, "connect alice-phone", "uid-alice").await["text"], "Connected!");
    assert_eq!(slash_command(&app.router, "disconnect", "uid-alice").await["text"], "Disconnected!");

    for identity in ["alice", "alice-phone"] {
        let (_, json) = post_webhook(&app.router, webhook_body("get_status", Some(identity), json!({}))).await;
        assert!(text_of(&json).contains("didn't enable the integration"));
    }
}

#[tokio::test]
async fn connect_without_argument_shows_syntax() {
    let app = test_app().await;
    let reply = slash_command(&app.router, "connect", "uid-alice").await;
    assert_eq!(reply["text"], "Syntax: /assistant connect <username>");
}

#[tokio::test]
async fn health_endpoint() {
    let app = test_app().await;
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "ok");
}
