use eyre::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::constants::REFRESH_INTERVAL;
use crate::models::Event;

/// Periodically asks the app to re-read the database. Rows are written by
/// an external scoring process, so the lists go stale on their own.
pub struct RefreshService {
    event_tx: mpsc::UnboundedSender<Event>,
    cancel_token: CancellationToken,
}

impl RefreshService {
    pub fn new(
        event_tx: mpsc::UnboundedSender<Event>,
        cancel_token: CancellationToken,
    ) -> RefreshService {
        RefreshService {
            event_tx,
            cancel_token,
        }
    }

    pub async fn run(self) -> Result<()> {
        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => return Ok(()),
                _ = tokio::time::sleep(REFRESH_INTERVAL) => {
                    if self.event_tx.send(Event::Refresh).is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }
}
