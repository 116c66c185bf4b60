use kanal::AsyncReceiver;
use tokio_util::sync::CancellationToken;

use crate::Snapshot;

/// Live feed of snapshots at one path
///
/// Dropping the subscription releases it; the producer stops on its next change.
pub struct Subscription {
    rx: AsyncReceiver<Snapshot>,
    cancel: CancellationToken,
}

impl Subscription {
    pub fn new(rx: AsyncReceiver<Snapshot>, cancel: CancellationToken) -> Self {
        Self { rx, cancel }
    }

    /// Next snapshot, `None` once released or the producer is gone
    pub async fn recv(&self) -> Option<Snapshot> {
        if self.cancel.is_cancelled() {
            return None;
        }

        tokio::select! {
            _ = self.cancel.cancelled() => None,
            snapshot = self.rx.recv() => snapshot.ok(),
        }
    }

    /// Token that releases this subscription when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn unsubscribe(self) {
        self.cancel.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
