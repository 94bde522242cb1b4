//! Long-poll update loop.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::dispatch::Dispatcher;
use crate::telegram::TelegramTransport;

const ERROR_BACKOFF: Duration = Duration::from_secs(2);

/// Drives `getUpdates` and feeds the dispatcher.
pub struct Poller {
    transport: Arc<TelegramTransport>,
    dispatcher: Arc<Dispatcher>,
}

impl Poller {
    /// Create a poller.
    #[must_use]
    pub const fn new(transport: Arc<TelegramTransport>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            transport,
            dispatcher,
        }
    }

    /// Poll forever. Each update is handled in its own task; the
    /// dispatcher's per-user lock keeps one user's events sequential.
    /// Transport trouble backs off briefly and keeps polling.
    pub async fn run(&self) {
        info!("Starting update polling");
        let mut offset = 0_i64;

        loop {
            match self.transport.get_updates(offset).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let dispatcher = Arc::clone(&self.dispatcher);
                        tokio::spawn(async move {
                            dispatcher.handle_update(update).await;
                        });
                    }
                }
                Err(e) => {
                    warn!(error = %e, "getUpdates failed");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
            }
        }
    }
}
