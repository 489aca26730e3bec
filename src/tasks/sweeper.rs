//! TTL Sweeper Task
//!
//! Background task that periodically purges expired entries from the head
//! of the store.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::Shared;
use crate::error::Result;

// == Sweeper ==
/// Handle to a running sweeper task.
///
/// The task wakes every `interval`, takes the store's write lock and runs
/// one purge pass. It exits at the next tick boundary after the token is
/// cancelled.
#[derive(Debug)]
pub(crate) struct Sweeper {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawns the sweeper for `shared` on `runtime`.
    ///
    /// The first pass runs one full `interval` after spawning.
    pub(crate) fn spawn(shared: Arc<Shared>, interval: Duration, runtime: &Handle) -> Self {
        let token = CancellationToken::new();
        let handle = runtime.spawn(run(shared, interval, token.clone()));

        Self { token, handle }
    }

    /// Signals the task to exit without waiting for it.
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    /// Signals the task to exit and waits until it has.
    pub(crate) async fn shutdown(self) -> Result<()> {
        self.token.cancel();
        self.handle.await?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

async fn run(shared: Arc<Shared>, interval: Duration, token: CancellationToken) {
    info!(
        "Starting TTL sweeper with interval of {} ms",
        interval.as_millis()
    );

    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let removed = shared.purge_expired();

                if removed > 0 {
                    info!("TTL sweep: removed {} expired entries", removed);
                } else {
                    debug!("TTL sweep: no expired entries at head");
                }
            }
        }
    }

    info!("TTL sweeper stopped");
}
