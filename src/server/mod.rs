//! HTTP server for the audit bot.
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts GitHub notifications and wakes the scheduler
//! - `GET /debug/vars` - Activity counters and scheduler phase as JSON
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

use tokio::sync::watch;

pub mod health;
pub mod vars;
pub mod webhook;

pub use health::health_handler;
pub use vars::{DebugVars, vars_handler};
pub use webhook::{WebhookError, webhook_handler};

use crate::audit::AuditCounters;
use crate::scheduler::{SchedulerPhase, WakeHandle};

/// Shared application state, passed to handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Secret for HMAC-SHA256 signature verification.
    webhook_secret: Vec<u8>,

    wake: WakeHandle,

    counters: Arc<AuditCounters>,

    phase: watch::Receiver<SchedulerPhase>,
}

impl AppState {
    pub fn new(
        webhook_secret: impl Into<Vec<u8>>,
        wake: WakeHandle,
        counters: Arc<AuditCounters>,
        phase: watch::Receiver<SchedulerPhase>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                webhook_secret: webhook_secret.into(),
                wake,
                counters,
                phase,
            }),
        }
    }

    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }

    pub fn wake(&self) -> &WakeHandle {
        &self.inner.wake
    }

    pub fn counters(&self) -> &AuditCounters {
        &self.inner.counters
    }

    pub fn scheduler_phase(&self) -> SchedulerPhase {
        *self.inner.phase.borrow()
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/debug/vars", get(vars_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::scheduler::{WakeOutcome, WakeReceiver, wake_channel};
    use crate::webhooks::signature::sign_payload;

    const SECRET: &[u8] = b"test-secret";

    struct TestApp {
        state: AppState,
        receiver: WakeReceiver,
        phase: watch::Sender<SchedulerPhase>,
        counters: Arc<AuditCounters>,
    }

    fn test_app() -> TestApp {
        test_app_with_secret(SECRET)
    }

    fn test_app_with_secret(secret: &[u8]) -> TestApp {
        let (wake, receiver) = wake_channel();
        let (phase, phase_rx) = watch::channel(SchedulerPhase::Idle);
        let counters = Arc::new(AuditCounters::new());
        let state = AppState::new(secret, wake, counters.clone(), phase_rx);
        TestApp {
            state,
            receiver,
            phase,
            counters,
        }
    }

    fn pull_request_body() -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "action": "closed",
            "number": 10,
            "pull_request": { "merged": true },
            "repository": { "name": "corp", "owner": { "login": "acme" } }
        }))
        .unwrap()
    }

    fn webhook_request(kind: &str, secret: &[u8], body: Vec<u8>) -> Request<Body> {
        let signature = sign_payload(&body, secret);
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("x-github-event", kind)
            .header("x-hub-signature-256", signature)
            .body(Body::from(body))
            .unwrap()
    }

    // ─── Health endpoint tests ───

    #[tokio::test]
    async fn health_returns_200() {
        let app = build_router(test_app().state);

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    // ─── Webhook endpoint tests ───

    #[tokio::test]
    async fn pull_request_notification_wakes_scheduler() {
        let mut t = test_app();
        let app = build_router(t.state.clone());

        let response = app
            .oneshot(webhook_request("pull_request", SECRET, pull_request_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(t.receiver.recv().await, Some(()));
    }

    #[tokio::test]
    async fn review_notification_wakes_scheduler() {
        let mut t = test_app();
        let app = build_router(t.state.clone());

        let response = app
            .oneshot(webhook_request(
                "pull_request_review",
                SECRET,
                br#"{"action":"submitted"}"#.to_vec(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(t.receiver.recv().await, Some(()));
    }

    #[tokio::test]
    async fn repeated_notifications_coalesce() {
        let t = test_app();

        for _ in 0..3 {
            let response = build_router(t.state.clone())
                .oneshot(webhook_request("pull_request", SECRET, pull_request_body()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::ACCEPTED);
        }

        // One slot, already full.
        assert_eq!(t.state.wake().wake(), WakeOutcome::Coalesced);
    }

    #[tokio::test]
    async fn other_kinds_are_acknowledged_without_wake() {
        let t = test_app();

        for kind in ["push", "ping", "issue_comment"] {
            let response = build_router(t.state.clone())
                .oneshot(webhook_request(kind, SECRET, b"{}".to_vec()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{kind}");
        }

        assert_eq!(t.state.wake().wake(), WakeOutcome::Queued);
    }

    #[tokio::test]
    async fn invalid_signature_returns_401_without_wake() {
        let t = test_app();
        let app = build_router(t.state.clone());

        let response = app
            .oneshot(webhook_request("pull_request", b"wrong-secret", pull_request_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(t.state.wake().wake(), WakeOutcome::Queued);
    }

    #[tokio::test]
    async fn missing_event_header_returns_400() {
        let app = build_router(test_app().state);
        let body = pull_request_body();
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("x-hub-signature-256", sign_payload(&body, SECRET))
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_signature_header_returns_400() {
        let app = build_router(test_app().state);
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("x-github-event", "pull_request")
            .body(Body::from(pull_request_body()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_secret_accepts_unsigned_delivery() {
        let mut t = test_app_with_secret(b"");
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("x-github-event", "pull_request")
            .body(Body::from(pull_request_body()))
            .unwrap();

        let response = build_router(t.state.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(t.receiver.recv().await, Some(()));
    }

    #[tokio::test]
    async fn stopped_scheduler_returns_503() {
        let TestApp {
            state, receiver, ..
        } = test_app();
        drop(receiver);

        let response = build_router(state)
            .oneshot(webhook_request("pull_request", SECRET, pull_request_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    // ─── Debug vars endpoint tests ───

    #[tokio::test]
    async fn debug_vars_reports_counters_and_phase() {
        let t = test_app();
        t.counters.record_wakeup();
        t.counters.record_wakeup();
        t.counters.record_webhook_wakeup();
        t.counters.record_repo_checked();
        t.phase.send_replace(SchedulerPhase::Running);

        let request = Request::builder()
            .uri("/debug/vars")
            .body(Body::empty())
            .unwrap();
        let response = build_router(t.state.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let vars: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            vars,
            serde_json::json!({
                "total_wakeups": 2,
                "webhook_wakeups": 1,
                "repos_checked": 1,
                "issues_filed": 0,
                "scheduler": "running",
            })
        );
    }
}
