//! Approval classification for merged pull requests.

pub mod classifier;
pub mod policy;

pub use classifier::{ApprovalClassifier, Exemption, Verdict, cheap_exemption};
pub use policy::ApprovalPolicy;
