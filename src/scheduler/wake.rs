//! Coalescing wake signal between the webhook listener and the scheduler.
//!
//! The slot holds at most one pending wake. The listener never blocks: if a
//! wake is already pending, the new one is dropped, because the pending one
//! already guarantees a future cycle that will see the same activity.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Result of raising the wake signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeOutcome {
    /// The slot was empty; a cycle is now pending.
    Queued,
    /// A wake was already pending; this one was folded into it.
    Coalesced,
    /// The scheduler is gone.
    Closed,
}

/// Sending side of the wake slot. Cheap to clone.
#[derive(Debug, Clone)]
pub struct WakeHandle {
    tx: mpsc::Sender<()>,
}

/// Receiving side of the wake slot, owned by the scheduler.
#[derive(Debug)]
pub struct WakeReceiver {
    rx: mpsc::Receiver<()>,
}

/// Creates a capacity-one wake slot.
pub fn wake_channel() -> (WakeHandle, WakeReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (WakeHandle { tx }, WakeReceiver { rx })
}

impl WakeHandle {
    /// Raises the wake signal without waiting.
    pub fn wake(&self) -> WakeOutcome {
        match self.tx.try_send(()) {
            Ok(()) => WakeOutcome::Queued,
            Err(TrySendError::Full(())) => WakeOutcome::Coalesced,
            Err(TrySendError::Closed(())) => WakeOutcome::Closed,
        }
    }
}

impl WakeReceiver {
    /// Waits for the next wake. Returns `None` once every handle is dropped.
    pub async fn recv(&mut self) -> Option<()> {
        self.rx.recv().await
    }
}
