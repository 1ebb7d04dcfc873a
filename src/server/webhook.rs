//! Webhook endpoint handler.
//!
//! Deliveries are authenticated and then reduced to a single bit: does this
//! notification warrant another look at the repositories? Pull-request and
//! review notifications raise the wake signal; everything else is acknowledged
//! and dropped. The payload itself is never parsed, since the next cycle reads
//! the activity feed anyway.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::scheduler::WakeOutcome;
use crate::webhooks::{EVENT_HEADER, NotificationKind, SIGNATURE_HEADER, verify_signature};

/// Errors that can occur when accepting a delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// Signature does not match the payload.
    #[error("invalid signature")]
    InvalidSignature,

    /// The scheduler has stopped and can no longer be woken.
    #[error("scheduler is not running")]
    SchedulerGone,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::SchedulerGone => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Response
///
/// - 202 Accepted: pull request or review notification, wake raised
/// - 200 OK: any other notification kind, ignored
/// - 400 Bad Request: missing `X-GitHub-Event`, or `X-Hub-Signature-256`
///   while a secret is configured
/// - 401 Unauthorized: signature mismatch
///
/// With an empty secret GitHub sends no signature, so none is checked.
/// - 503 Service Unavailable: scheduler has shut down
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let kind = NotificationKind::from_header(get_header(&headers, EVENT_HEADER)?);
    let secret = app_state.webhook_secret();

    if !secret.is_empty() {
        let signature_header = get_header(&headers, SIGNATURE_HEADER)?;
        if !verify_signature(&body, signature_header, secret) {
            warn!(kind = %kind, "Invalid webhook signature");
            return Err(WebhookError::InvalidSignature);
        }
    }

    if !kind.triggers_wake() {
        debug!(kind = %kind, "Ignoring webhook notification");
        return Ok((StatusCode::OK, "Ignored"));
    }

    match app_state.wake().wake() {
        WakeOutcome::Queued => {
            info!(kind = %kind, "Webhook notification queued a check");
            Ok((StatusCode::ACCEPTED, "Accepted"))
        }
        WakeOutcome::Coalesced => {
            debug!(kind = %kind, "Check already pending, wake coalesced");
            Ok((StatusCode::ACCEPTED, "Accepted"))
        }
        WakeOutcome::Closed => {
            warn!(kind = %kind, "Scheduler stopped, dropping wake");
            Err(WebhookError::SchedulerGone)
        }
    }
}

/// Extracts a required header value.
fn get_header<'h>(headers: &'h HeaderMap, name: &'static str) -> Result<&'h str, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingHeader(name))
}
