// ABOUTME: Per-observer presence polling with wholesale snapshot replacement
// ABOUTME: Subscriptions own their timer task and abort it on drop; read failures are swallowed

use crate::session::{SessionStore, SessionUser};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// The polled read seam. The membership store is the production reader;
/// tests inject failing or slow readers.
#[async_trait]
pub trait PresenceReader: Send + Sync {
    async fn read_members(&self, session_id: &str) -> anyhow::Result<Vec<SessionUser>>;
}

#[async_trait]
impl PresenceReader for SessionStore {
    async fn read_members(&self, session_id: &str) -> anyhow::Result<Vec<SessionUser>> {
        Ok(self.get(session_id)?.members)
    }
}

/// Spawns one polling loop per subscription.
#[derive(Clone)]
pub struct PresenceWatcher {
    reader: Arc<dyn PresenceReader>,
    poll_interval: Duration,
}

impl PresenceWatcher {
    pub fn new(reader: Arc<dyn PresenceReader>, poll_interval: Duration) -> Self {
        PresenceWatcher {
            reader,
            poll_interval,
        }
    }

    /// Bind to a session: one immediate read, then a read every poll
    /// interval. A slow read skips ticks instead of queueing them, so a
    /// single observer never has overlapping reads in flight.
    pub fn subscribe(&self, session_id: &str) -> PresenceSubscription {
        let (tx, rx) = watch::channel(Vec::new());
        let reader = Arc::clone(&self.reader);
        let poll_interval = self.poll_interval;
        let sid = session_id.to_string();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match reader.read_members(&sid).await {
                    Ok(members) => {
                        // Wholesale replacement; identical consecutive
                        // snapshots are a legitimate no-change result.
                        tx.send_replace(members);
                    }
                    Err(e) => {
                        // Last-known-good is retained; the next tick proceeds.
                        crate::metrics::record_presence_poll_failure();
                        tracing::warn!(session_id = %sid, error = %e, "Presence read failed");
                    }
                }
            }
        });

        tracing::debug!(session_id = %session_id, interval_ms = poll_interval.as_millis() as u64, "Presence subscription started");

        PresenceSubscription {
            session_id: session_id.to_string(),
            rx,
            task,
        }
    }
}

/// A scoped handle to one session's polled membership view. Dropping it
/// cancels the polling task; there is no other exit path and no retry
/// back-off state.
pub struct PresenceSubscription {
    session_id: String,
    rx: watch::Receiver<Vec<SessionUser>>,
    task: JoinHandle<()>,
}

impl PresenceSubscription {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Current member snapshot (last successful read; empty before the
    /// first read completes).
    pub fn members(&self) -> Vec<SessionUser> {
        self.rx.borrow().clone()
    }

    /// Wait for the next published snapshot.
    pub async fn changed(&mut self) -> anyhow::Result<()> {
        self.rx.changed().await?;
        Ok(())
    }

    /// An independent receiver for additional observers of this view.
    pub fn receiver(&self) -> watch::Receiver<Vec<SessionUser>> {
        self.rx.clone()
    }
}

impl Drop for PresenceSubscription {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!(session_id = %self.session_id, "Presence subscription cancelled");
    }
}
