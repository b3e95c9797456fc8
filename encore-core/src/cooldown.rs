use std::{fmt::Display, sync::Arc, time::Duration};

use dashmap::{mapref::entry::Entry, DashMap};
use tokio::time::Instant;

/// A shared cooldown gate, keyed by arbitrary strings.
///
/// Every caller gets its own [CooldownScope], so keys from unrelated subsystems never collide.
#[derive(Debug, Clone, Default)]
pub struct Cooldowns {
    times: Arc<DashMap<String, Instant>>,
}

/// A namespaced view of [Cooldowns].
#[derive(Debug, Clone)]
pub struct CooldownScope {
    namespace: &'static str,
    times: Arc<DashMap<String, Instant>>,
}

impl Cooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&self, namespace: &'static str) -> CooldownScope {
        CooldownScope {
            namespace,
            times: self.times.clone(),
        }
    }
}

impl CooldownScope {
    fn key(&self, key: impl Display) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Returns true and starts a new cooldown if the last one for this key has run out.
    pub fn allow(&self, key: impl Display, min_interval: Duration) -> bool {
        let now = Instant::now();

        match self.times.entry(self.key(key)) {
            Entry::Occupied(mut entry) => {
                if now.duration_since(*entry.get()) < min_interval {
                    return false;
                }

                entry.insert(now);
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    /// Starts a new cooldown for this key unconditionally.
    pub fn touch(&self, key: impl Display) {
        self.times.insert(self.key(key), Instant::now());
    }

    pub fn forget(&self, key: impl Display) {
        self.times.remove(&self.key(key));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::time::advance;

    const INTERVAL: Duration = Duration::from_secs(2);

    #[tokio::test(start_paused = true)]
    async fn suppresses_within_the_interval() {
        let scope = Cooldowns::new().scope("status-card");

        assert!(scope.allow(1, INTERVAL));

        advance(Duration::from_secs(1)).await;
        assert!(!scope.allow(1, INTERVAL));

        advance(Duration::from_secs(1)).await;
        assert!(scope.allow(1, INTERVAL));
    }

    #[tokio::test(start_paused = true)]
    async fn namespaces_do_not_collide() {
        let cooldowns = Cooldowns::new();
        let cards = cooldowns.scope("status-card");
        let starboard = cooldowns.scope("starboard");

        assert!(cards.allow(42, INTERVAL));
        assert!(starboard.allow(42, INTERVAL));
        assert!(!cards.allow(42, INTERVAL));
    }

    #[tokio::test(start_paused = true)]
    async fn touching_restarts_the_cooldown() {
        let scope = Cooldowns::new().scope("status-card");

        scope.touch(7);
        assert!(!scope.allow(7, INTERVAL));

        scope.forget(7);
        assert!(scope.allow(7, INTERVAL));
    }
}
