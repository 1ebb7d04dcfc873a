//! Escalation of unreviewed merges into the tracking repository.

pub mod filer;

pub use filer::{
    EscalationError, EscalationFiler, EscalationOutcome, EscalationTarget, escalation_body,
    escalation_title,
};
