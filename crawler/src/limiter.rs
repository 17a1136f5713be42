use crate::cancel::CancelToken;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Paces requests to a steady rate. A ticker task deposits one permit per
/// `1/rate` seconds into a single-slot bucket, so acquirers are spaced
/// evenly rather than released in bursts.
pub struct RateLimiter {
    permits: Arc<Semaphore>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiter {
    /// `rate` is requests per second and must be positive.
    pub fn new(rate: u32) -> Self {
        let rate = rate.max(1);
        let permits = Arc::new(Semaphore::new(1));
        let bucket = permits.clone();
        let period = Duration::from_secs_f64(1.0 / f64::from(rate));
        let ticker = tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick fires immediately; skip it so the initial
            // permit is not doubled
            tick.tick().await;
            loop {
                tick.tick().await;
                if bucket.is_closed() {
                    break;
                }
                if bucket.available_permits() == 0 {
                    bucket.add_permits(1);
                }
            }
        });
        Self {
            permits,
            ticker: Mutex::new(Some(ticker)),
        }
    }

    /// Blocks until the pacing allows one more request. Returns immediately
    /// when the limiter has been shut down or the job is cancelled.
    pub async fn acquire(&self, cancel: &CancelToken) {
        tokio::select! {
            permit = self.permits.acquire() => {
                if let Ok(permit) = permit {
                    permit.forget();
                }
            }
            _ = cancel.cancelled() => {}
        }
    }

    /// Stops the ticker and wakes every waiter; subsequent acquires return
    /// without delay.
    pub fn shutdown(&self) {
        self.permits.close();
        if let Some(ticker) = self.ticker.lock().take() {
            ticker.abort();
        }
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.shutdown();
    }
}
