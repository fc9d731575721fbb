use std::time::Duration;
use tokio::time::sleep;

/// Cooperative rate limiting for sync workers.
///
/// Each worker sleeps this delay after finishing a unit of work, before
/// taking the next batch. This is plain sleeping, not a token bucket, so
/// bursts are possible when several workers finish at the same time.
pub struct WorkerCooldown {
    delay: Duration,
}

impl WorkerCooldown {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
        }
    }

    pub async fn wait(&self) {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }
}
