use std::{sync::Arc, time::Duration};

use encore_core::{CloseSummary, Content};
use log::{debug, info, warn};

use crate::SessionEvent;

use super::{CloseReason, Session, SessionState};

impl Session {
    /// Tears the session down for good. Only the first call does anything.
    pub async fn close(self: &Arc<Self>, reason: CloseReason) {
        if !self.mark_closed() {
            return;
        }

        info!("Closing session in {} {}", self.destination, reason);

        {
            let mut data = self.data.lock();
            data.votes.clear_all();
            self.transition(&mut data, SessionState::Disconnected);
        }

        self.stop_refresh_loop();

        let summary = close_summary(&reason, self.started_at().elapsed(), self.total_played());
        let surface = &self.context.collaborators.surface;

        if let Err(e) = surface
            .send(self.channel, Content::CloseSummary(summary))
            .await
        {
            debug!("Failed to announce closing session: {}", e);
        }

        for mut search in self.searches.drain() {
            search.cancel_timer();

            if let Some(prompt) = search.prompt {
                if let Err(e) = surface.delete(&prompt).await {
                    debug!("Failed to delete search prompt: {}", e);
                }
            }
        }

        self.renderer.retire(surface).await;

        if let Err(e) = self
            .context
            .collaborators
            .engine
            .disconnect(self.destination)
            .await
        {
            warn!("Failed to disconnect from {}: {}", self.destination, e);
        }

        self.context
            .sessions
            .remove_if(&self.destination, |_, s| Arc::ptr_eq(s, self));

        self.context.emit(SessionEvent::Closed {
            destination: self.destination,
            reason,
        });
    }
}

pub fn close_summary(reason: &CloseReason, lasted: Duration, played: usize) -> CloseSummary {
    CloseSummary {
        description: format!("Closing the music session {}", reason),
        footer: format!(
            "The music session lasted {}, with {} played.",
            fmt_lasted(lasted),
            plural(played as u64, "song")
        ),
    }
}

/// Rounds down to the largest unit that fits, e.g. `2 minutes` or `1 hour`.
fn fmt_lasted(lasted: Duration) -> String {
    let seconds = lasted.as_secs();

    match seconds {
        0..=59 => plural(seconds, "second"),
        60..=3599 => plural(seconds / 60, "minute"),
        _ => plural(seconds / 3600, "hour"),
    }
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("{} {}", count, unit)
    } else {
        format!("{} {}s", count, unit)
    }
}
