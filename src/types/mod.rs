//! Core domain types for the review audit bot.

pub mod ids;

pub use ids::{Login, PrNumber, RepoId};
