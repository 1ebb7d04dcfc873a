use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tbr_audit::audit::{AuditCounters, Auditor};
use tbr_audit::config::AuditConfig;
use tbr_audit::github;
use tbr_audit::scheduler::{WakeScheduler, wake_channel};
use tbr_audit::server::{AppState, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tbr_audit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AuditConfig::from_env().context("loading configuration")?;
    info!(
        org = %config.org,
        bug_repo = %config.bug_repo,
        repos = ?config.repos,
        "Starting to-be-reviewed audit bot"
    );

    let (client, author) = github::connect(&config.auth)
        .await
        .context("connecting to GitHub")?;
    info!(author = %author, "Escalations will be filed as this author");
    let counters = Arc::new(AuditCounters::new());
    let auditor = Auditor::new(client, config.audit_settings(author), counters.clone());

    let (wake, wake_receiver) = wake_channel();
    let scheduler = WakeScheduler::new(auditor, config.schedule, wake_receiver, counters.clone());
    let phase = scheduler.phase();

    let shutdown = CancellationToken::new();
    let scheduler_task = tokio::spawn(scheduler.run(shutdown.clone()));

    let app_state = AppState::new(config.webhook_secret.as_bytes(), wake, counters, phase);
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    info!("listening on {}", config.listen_addr);

    let server_shutdown = shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Received interrupt, shutting down"),
                _ = server_shutdown.cancelled() => {}
            }
        })
        .await;

    shutdown.cancel();
    if let Err(e) = scheduler_task.await {
        error!(error = %e, "Scheduler task failed");
    }

    served.context("serving HTTP")
}
