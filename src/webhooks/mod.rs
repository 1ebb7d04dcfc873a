//! Inbound GitHub notifications.
//!
//! This module provides:
//! - Signature verification for delivery payloads (HMAC-SHA256)
//! - Classification of the `X-GitHub-Event` header into a [`NotificationKind`]

pub mod notification;
pub mod signature;

pub use notification::{EVENT_HEADER, NotificationKind};
pub use signature::{SIGNATURE_HEADER, parse_signature_header, verify_signature};
