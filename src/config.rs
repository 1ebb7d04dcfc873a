//! Process configuration from environment variables.
//!
//! # Variables
//!
//! | Variable | Default |
//! |---|---|
//! | `TBRBOT_ORG` | required |
//! | `TBRBOT_BUGREPO` | required |
//! | `TBRBOT_APP_ID` | app auth |
//! | `TBRBOT_APP_INSTALL` | required with `TBRBOT_APP_ID` |
//! | `TBRBOT_APP_PRIVATE_KEY` | required with `TBRBOT_APP_ID` |
//! | `TBRBOT_APPNAME` | required with `TBRBOT_APP_ID` |
//! | `GITHUB_TOKEN` | token auth, when `TBRBOT_APP_ID` is unset |
//! | `TBRBOT_REPOS` | empty |
//! | `WEBHOOK_SECRET` | empty |
//! | `TBRBOT_CHECK_INTERVAL_MINS` | 60 |
//! | `TBRBOT_COOLDOWN_SECS` | 300 |
//! | `TBRBOT_LISTEN_ADDR` | `0.0.0.0:8080` |
//! | `TBRBOT_AUTOMATION_AUTHORS` | `dependabot[bot]` |
//! | `TBRBOT_APPROVAL_PHRASES` | `LGTM,banger pr` |
//! | `TBRBOT_APPROVAL_TOKENS` | `🚢,:shipit:` |
//!
//! List variables are comma separated. Blank entries are dropped, and a list
//! variable that is unset or blank keeps its default.
//!
//! Setting `TBRBOT_APP_ID` selects GitHub App auth. Without it the bot falls
//! back to `GITHUB_TOKEN`, and one of the two must be present.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::audit::AuditSettings;
use crate::escalation::EscalationTarget;
use crate::github::{GitHubAuth, IssueAuthor};
use crate::review::ApprovalPolicy;
use crate::review::policy::{
    DEFAULT_APPROVAL_PHRASES, DEFAULT_APPROVAL_TOKENS, DEFAULT_AUTOMATION_AUTHORS,
};
use crate::scheduler::ScheduleConfig;
use crate::types::RepoId;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Errors that make the configuration unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the binary needs to run.
#[derive(Clone)]
pub struct AuditConfig {
    pub org: String,
    pub bug_repo: String,
    pub repos: Vec<String>,
    pub auth: GitHubAuth,
    pub webhook_secret: String,
    pub schedule: ScheduleConfig,
    pub listen_addr: SocketAddr,
    pub policy: ApprovalPolicy,
}

impl fmt::Debug for AuditConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditConfig")
            .field("org", &self.org)
            .field("bug_repo", &self.bug_repo)
            .field("repos", &self.repos)
            .field("auth", &self.auth)
            .field("webhook_secret", &"<redacted>")
            .field("schedule", &self.schedule)
            .field("listen_addr", &self.listen_addr)
            .field("policy", &self.policy)
            .finish()
    }
}

impl AuditConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let org = required("TBRBOT_ORG")?;
        let bug_repo = required("TBRBOT_BUGREPO")?;
        let auth = match get("TBRBOT_APP_ID") {
            Some(app_id) => GitHubAuth::App {
                app_id: parse_id("TBRBOT_APP_ID", app_id)?,
                installation_id: parse_id("TBRBOT_APP_INSTALL", required("TBRBOT_APP_INSTALL")?)?,
                private_key: required("TBRBOT_APP_PRIVATE_KEY")?,
                app_name: required("TBRBOT_APPNAME")?,
            },
            None => GitHubAuth::Token {
                token: get("GITHUB_TOKEN").ok_or(ConfigError::Missing("TBRBOT_APP_ID"))?,
            },
        };

        let repos = get("TBRBOT_REPOS").map(|v| split_list(&v)).unwrap_or_default();
        if repos.is_empty() {
            warn!("TBRBOT_REPOS is empty, no repositories will be audited");
        }

        let webhook_secret = get("WEBHOOK_SECRET").unwrap_or_default();
        if webhook_secret.is_empty() {
            warn!("WEBHOOK_SECRET is empty, webhook signatures will not be verified");
        }

        let check_interval_mins = parse_u64(&get, "TBRBOT_CHECK_INTERVAL_MINS", 60)?;
        if check_interval_mins == 0 {
            return Err(ConfigError::Invalid {
                name: "TBRBOT_CHECK_INTERVAL_MINS",
                value: "0".to_string(),
                reason: "interval must be at least one minute".to_string(),
            });
        }
        let check_interval_secs = check_interval_mins
            .checked_mul(60)
            .ok_or_else(|| ConfigError::Invalid {
                name: "TBRBOT_CHECK_INTERVAL_MINS",
                value: check_interval_mins.to_string(),
                reason: "interval too large".to_string(),
            })?;
        let cooldown_secs = parse_u64(&get, "TBRBOT_COOLDOWN_SECS", 300)?;
        let schedule = ScheduleConfig {
            check_interval: Duration::from_secs(check_interval_secs),
            cooldown: Duration::from_secs(cooldown_secs),
        };

        let listen_raw = get("TBRBOT_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.into());
        let listen_addr = listen_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "TBRBOT_LISTEN_ADDR",
                value: listen_raw.clone(),
                reason: e.to_string(),
            })?;

        let list_or = |name: &str, default: &[&str]| {
            get(name)
                .map(|v| split_list(&v))
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| default.iter().map(|s| s.to_string()).collect())
        };
        let policy = ApprovalPolicy::new(
            list_or("TBRBOT_AUTOMATION_AUTHORS", DEFAULT_AUTOMATION_AUTHORS),
            list_or("TBRBOT_APPROVAL_PHRASES", DEFAULT_APPROVAL_PHRASES),
            list_or("TBRBOT_APPROVAL_TOKENS", DEFAULT_APPROVAL_TOKENS),
        );

        Ok(AuditConfig {
            org,
            bug_repo,
            repos,
            auth,
            webhook_secret,
            schedule,
            listen_addr,
            policy,
        })
    }

    /// The settings the reconciliation cycle runs with, filing issues as
    /// `author`.
    pub fn audit_settings(&self, author: IssueAuthor) -> AuditSettings {
        AuditSettings {
            org: self.org.clone(),
            repos: self.repos.clone(),
            target: EscalationTarget::new(RepoId::new(&self.org, &self.bug_repo), author),
            policy: self.policy.clone(),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_id(name: &'static str, value: String) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|e| ConfigError::Invalid {
        name,
        value,
        reason: e.to_string(),
    })
}

fn parse_u64(
    get: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match get(name) {
        None => Ok(default),
        Some(value) => parse_id(name, value),
    }
}
