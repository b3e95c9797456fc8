use std::time::Duration;

use encore_core::Config;
use tokio::time::{sleep, Instant};

use crate::Session;

/// How a wait for queued items ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// Something is in the queue.
    Ready,
    /// The queue stayed empty for the whole grace window.
    Expired,
    /// The session closed while waiting.
    Closed,
}

/// Watches an awaiting session and decides when it has been idle for too long.
pub struct InactivityWatchdog {
    grace_window: Duration,
    poll_interval: Duration,
}

impl InactivityWatchdog {
    pub fn new(config: &Config) -> Self {
        Self {
            grace_window: config.grace_window(),
            poll_interval: config.poll_interval(),
        }
    }

    /// Polls until the session has queued items, closes, or stays empty for the grace window.
    ///
    /// An open search prompt holds the countdown, and the full window starts over once the
    /// last prompt is gone.
    pub async fn wait_for_items(&self, session: &Session) -> Wake {
        let mut empty_since = Instant::now();

        loop {
            if session.is_closed() {
                return Wake::Closed;
            }

            if session.has_queued_items() {
                return Wake::Ready;
            }

            if session.searches.is_pending() {
                empty_since = Instant::now();
            } else if empty_since.elapsed() >= self.grace_window {
                return Wake::Expired;
            }

            sleep(self.poll_interval).await;
        }
    }
}
