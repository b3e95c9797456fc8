use std::time::Duration;

use serde::Deserialize;

/// The configuration of the playback session engine
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long a session may sit with an empty queue before it closes itself
    pub grace_window_in_seconds: f32,
    /// How often an awaiting session checks whether something arrived
    pub poll_interval_in_seconds: f32,
    /// How long a search prompt stays open before it cancels itself
    pub search_timeout_in_seconds: f32,
    /// How many candidates a search prompt offers
    pub max_search_candidates: usize,
    /// How many departed items are kept for the status card
    pub history_size: usize,
    /// Minimum time between progress-triggered status card edits
    pub render_interval_in_seconds: f32,
    /// How often the background refresh loop wakes up
    pub refresh_tick_in_seconds: f32,
    /// How stale a status card may become before the refresh loop edits it
    pub refresh_stale_after_in_seconds: f32,
    /// How many upcoming entries a status card lists
    pub upcoming_on_card: usize,
}

impl Config {
    pub fn grace_window(&self) -> Duration {
        Duration::from_secs_f32(self.grace_window_in_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f32(self.poll_interval_in_seconds)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs_f32(self.search_timeout_in_seconds)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_secs_f32(self.render_interval_in_seconds)
    }

    pub fn refresh_tick(&self) -> Duration {
        Duration::from_secs_f32(self.refresh_tick_in_seconds)
    }

    pub fn refresh_stale_after(&self) -> Duration {
        Duration::from_secs_f32(self.refresh_stale_after_in_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grace_window_in_seconds: 15.,
            poll_interval_in_seconds: 0.2,
            search_timeout_in_seconds: 30.,
            max_search_candidates: 4,
            history_size: 2,
            render_interval_in_seconds: 2.,
            refresh_tick_in_seconds: 10.,
            refresh_stale_after_in_seconds: 29.,
            upcoming_on_card: 6,
        }
    }
}
