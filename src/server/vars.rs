//! Process variables endpoint.
//!
//! `GET /debug/vars` returns the activity counters plus the scheduler's
//! current phase as a flat JSON object:
//!
//! ```text
//! {"total_wakeups":3,"webhook_wakeups":1,"repos_checked":6,"issues_filed":1,"scheduler":"idle"}
//! ```

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::AppState;
use crate::audit::CounterSnapshot;
use crate::scheduler::SchedulerPhase;

/// Body of the `/debug/vars` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DebugVars {
    #[serde(flatten)]
    pub counters: CounterSnapshot,
    pub scheduler: SchedulerPhase,
}

pub async fn vars_handler(State(app_state): State<AppState>) -> Json<DebugVars> {
    Json(DebugVars {
        counters: app_state.counters().snapshot(),
        scheduler: app_state.scheduler_phase(),
    })
}
