// SPDX-FileCopyrightText: 2026 Wabridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route-level tests for the control surface, driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::Router;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower::ServiceExt;
use wabridge_core::types::{Amount, ChatId, ClientEvent, ClientState, Debtor};
use wabridge_core::PluginAdapter;
use wabridge_gateway::{AppState, HealthState, OutreachSettings, ServerConfig, build_router};
use wabridge_test_utils::TestHarness;

const TOKEN: &str = "control-secret";
const WEBHOOK_TOKEN: &str = "webhook-secret";
const ORIGIN: &str = "https://backoff.travel4you.ma";

struct TestApp {
    router: Router,
    events: mpsc::Receiver<ClientEvent>,
}

fn config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        allowed_origins: vec![ORIGIN.into()],
        api_token: Some(TOKEN.into()),
        webhook_token: Some(WEBHOOK_TOKEN.into()),
        static_dir: None,
    }
}

fn app(harness: &TestHarness, config: &ServerConfig) -> TestApp {
    let (events_tx, events) = mpsc::channel(8);
    let state = AppState {
        supervisor: harness.handle.clone(),
        client: harness.client.clone(),
        payments: harness.forwarder.clone(),
        events: events_tx,
        outreach: OutreachSettings {
            reminder_template: "Bonjour {name}, reste {balance} MAD ({tour})".into(),
            default_country_code: "212".into(),
        },
        health: HealthState {
            start_time: Instant::now(),
            adapters: vec![
                harness.client.clone() as Arc<dyn PluginAdapter>,
                harness.forwarder.clone() as Arc<dyn PluginAdapter>,
            ],
        },
    };
    TestApp {
        router: build_router(config, state),
        events,
    }
}

async fn ready_harness() -> TestHarness {
    let harness = TestHarness::builder()
        .with_client_state(Some(ClientState::Connected))
        .build()
        .await
        .unwrap();
    harness.client.inject_event(ClientEvent::Ready).await;
    harness.settle().await;
    harness
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

// --- Status and diagnostics ---

#[tokio::test(start_paused = true)]
async fn status_reports_flags_and_qr() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness, &config());

    let (status, body) = send(&app.router, get("/whatsapp-status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"connected": false, "authenticated": false, "ready": false, "qrCodeUrl": null})
    );

    harness
        .client
        .inject_event(ClientEvent::Qr("2@abc,def".into()))
        .await;
    harness.settle().await;
    let (_, body) = send(&app.router, get("/whatsapp-status")).await;
    assert!(
        body["qrCodeUrl"]
            .as_str()
            .unwrap()
            .starts_with("data:image/svg+xml;base64,")
    );

    harness.client.inject_event(ClientEvent::Ready).await;
    harness.settle().await;
    let (_, body) = send(&app.router, get("/whatsapp-status")).await;
    assert_eq!(
        body,
        json!({"connected": true, "authenticated": true, "ready": true, "qrCodeUrl": null})
    );
}

#[tokio::test(start_paused = true)]
async fn diagnose_includes_live_client_state() {
    let harness = ready_harness().await;
    let app = app(&harness, &config());

    let (status, body) = send(&app.router, get("/whatsapp-diagnose")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "isConnected": true,
            "isAuthenticated": true,
            "isClientReady": true,
            "lastQrCode": false,
            "clientState": "CONNECTED"
        })
    );
}

// --- Auth ---

#[tokio::test(start_paused = true)]
async fn control_routes_require_the_token() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness, &config());

    let anonymous = Request::builder()
        .uri("/whatsapp-status")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app.router, anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let wrong = Request::builder()
        .uri("/whatsapp-status")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app.router, wrong).await.0, StatusCode::UNAUTHORIZED);
}

#[tokio::test(start_paused = true)]
async fn open_control_routes_without_token() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(
        &harness,
        &ServerConfig {
            api_token: None,
            ..config()
        },
    );

    let anonymous = Request::builder()
        .uri("/whatsapp-status")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app.router, anonymous).await.0, StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn health_is_public() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness, &config());

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["adapters"]["mock-whatsapp"]["health"]["status"], "healthy");
    assert_eq!(body["adapters"]["mock-whatsapp"]["kind"], "whatsapp");
    assert_eq!(body["adapters"]["mock-whatsapp"]["version"], "0.1.0");
    assert_eq!(body["adapters"]["mock-forwarder"]["health"]["status"], "healthy");
    assert_eq!(body["adapters"]["mock-forwarder"]["kind"], "forwarding");

    harness.forwarder.fail_forwarding(true).await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (_, body) = send(&app.router, request).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["adapters"]["mock-forwarder"]["health"]["status"], "degraded");
}

#[tokio::test(start_paused = true)]
async fn cors_allows_configured_origin_only() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness, &config());

    let preflight = |origin: &str| {
        Request::builder()
            .method("OPTIONS")
            .uri("/relance-pub")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    };

    let response = app.router.clone().oneshot(preflight(ORIGIN)).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        ORIGIN
    );

    let response = app
        .router
        .clone()
        .oneshot(preflight("https://evil.example"))
        .await
        .unwrap();
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

// --- Operator commands ---

#[tokio::test(start_paused = true)]
async fn disconnect_destroys_and_resets() {
    let harness = ready_harness().await;
    let app = app(&harness, &config());

    let (status, body) = send(
        &app.router,
        post_json("/whatsapp-disconnect", TOKEN, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "disconnected"}));
    assert_eq!(harness.client.destroy_count().await, 1);
    assert!(!harness.state().ready);
}

#[tokio::test(start_paused = true)]
async fn clear_session_removes_the_session_dir() {
    let harness = ready_harness().await;
    let app = app(&harness, &config());

    let (status, body) = send(
        &app.router,
        post_json("/whatsapp-clear-session", TOKEN, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "session cleared"}));
    assert!(!harness.session_dir.exists());
}

// --- Relances ---

#[tokio::test(start_paused = true)]
async fn relance_pub_rejects_blank_message_and_empty_contacts() {
    let harness = ready_harness().await;
    let app = app(&harness, &config());

    let (status, body) = send(
        &app.router,
        post_json("/relance-pub", TOKEN, json!({"message": "", "contacts": ["1234567"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app.router,
        post_json("/relance-pub", TOKEN, json!({"message": "Promo", "contacts": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        post_json("/relance-pub", TOKEN, json!({"contacts": "not-a-list"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(harness.client.sent_messages().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn relance_pub_requires_a_ready_client() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness, &config());

    let (status, body) = send(
        &app.router,
        post_json("/relance-pub", TOKEN, json!({"message": "Promo", "contacts": ["1234567"]})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
    assert!(harness.client.sent_messages().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn relance_pub_partitions_sent_and_failed() {
    let harness = ready_harness().await;
    harness
        .client
        .fail_sends_to(ChatId("9876543@c.us".into()))
        .await;
    let app = app(&harness, &config());

    let (status, body) = send(
        &app.router,
        post_json(
            "/relance-pub",
            TOKEN,
            json!({"message": "Promo ete", "contacts": ["1234567", "9876543", "12"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "done",
            "sentCount": 1,
            "failedCount": 2,
            "sent": ["1234567"],
            "failed": ["9876543", "12"]
        })
    );
    assert_eq!(
        harness.client.sent_messages().await,
        vec![(ChatId("1234567@c.us".into()), "Promo ete".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn relance_payer_requires_a_ready_client() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness, &config());

    let (status, _) = send(&app.router, get("/send-relance-payer")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test(start_paused = true)]
async fn relance_payer_reports_payments_failure() {
    let harness = ready_harness().await;
    harness.forwarder.fail_debtors(true).await;
    let app = app(&harness, &config());

    let (status, body) = send(&app.router, get("/send-relance-payer")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());
}

#[tokio::test(start_paused = true)]
async fn relance_payer_sends_reminders_in_background() {
    let harness = ready_harness().await;
    harness
        .forwarder
        .set_debtors(vec![
            Debtor {
                client_phone: Some("0600112233".into()),
                client_name: Some("Amina".into()),
                balance_remaining: Some(Amount::Number(1500.0)),
                tour_title: Some("Sahara".into()),
            },
            Debtor {
                client_phone: None,
                client_name: Some("Karim".into()),
                balance_remaining: None,
                tour_title: None,
            },
        ])
        .await;
    let app = app(&harness, &config());

    let (status, body) = send(&app.router, get("/send-relance-payer")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, json!({"status": "relance started", "recipients": 1}));

    harness.settle().await;
    assert_eq!(
        harness.client.sent_messages().await,
        vec![(
            ChatId("212600112233@c.us".into()),
            "Bonjour Amina, reste 1500 MAD (Sahara)".to_string()
        )]
    );
}

// --- Webhook ---

#[tokio::test(start_paused = true)]
async fn webhook_events_are_queued() {
    let harness = TestHarness::builder().build().await.unwrap();
    let mut app = app(&harness, &config());

    let (status, _) = send(
        &app.router,
        post_json("/whatsapp-events", WEBHOOK_TOKEN, json!({"event": "ready"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, _) = send(
        &app.router,
        post_json(
            "/whatsapp-events",
            WEBHOOK_TOKEN,
            json!({"event": "disconnected", "reason": "LOGOUT"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    assert_eq!(app.events.recv().await, Some(ClientEvent::Ready));
    assert_eq!(
        app.events.recv().await,
        Some(ClientEvent::Disconnected("LOGOUT".into()))
    );
}

#[tokio::test(start_paused = true)]
async fn webhook_uses_its_own_token() {
    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(&harness, &config());

    let (status, _) = send(
        &app.router,
        post_json("/whatsapp-events", TOKEN, json!({"event": "ready"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test(start_paused = true)]
async fn malformed_webhook_is_rejected() {
    let harness = TestHarness::builder().build().await.unwrap();
    let mut app = app(&harness, &config());

    let (status, body) = send(
        &app.router,
        post_json("/whatsapp-events", WEBHOOK_TOKEN, json!({"event": "teleported"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(app.events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn static_files_are_served_as_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>QR</h1>").unwrap();

    let harness = TestHarness::builder().build().await.unwrap();
    let app = app(
        &harness,
        &ServerConfig {
            static_dir: Some(dir.path().to_string_lossy().into_owned()),
            ..config()
        },
    );

    let request = Request::builder()
        .uri("/index.html")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"<h1>QR</h1>");
}
