mod events;
mod render;
mod search;
mod sessions;
mod watchdog;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use crossbeam::channel::unbounded;
use dashmap::DashMap;
use encore_core::{
    Config, Cooldowns, DestinationId, MediaResolver, MemberRoster, MessagingSurface,
    PermissionOracle, PlaybackEngine,
};

pub use events::*;
pub use render::*;
pub use search::*;
pub use sessions::*;
pub use watchdog::*;

// Reduces verbosity
type Store<Id, T> = Arc<DashMap<Id, Arc<T>>>;

/// The encore collab system, owning one playback session per destination.
pub struct Collab {
    event_receiver: EventReceiver,

    pub sessions: SessionManager,
}

/// The external systems a session talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn MediaResolver>,
    pub engine: Arc<dyn PlaybackEngine>,
    pub surface: Arc<dyn MessagingSurface>,
    pub roster: Arc<dyn MemberRoster>,
    pub permissions: Arc<dyn PermissionOracle>,
}

/// A type passed to various components of the collab system, to access state and emit events.
#[derive(Clone)]
pub struct CollabContext {
    pub config: Config,
    pub collaborators: Collaborators,
    pub cooldowns: Cooldowns,

    event_sender: EventSender,

    pub sessions: Store<DestinationId, Session>,
}

impl Collab {
    /// Creates the collab system. The cooldowns may be shared with unrelated subsystems.
    pub fn new(config: Config, collaborators: Collaborators, cooldowns: Cooldowns) -> Self {
        let (event_sender, event_receiver) = unbounded();

        let context = CollabContext {
            config,
            collaborators,
            cooldowns,
            event_sender,
            sessions: Default::default(),
        };

        Self {
            event_receiver,
            sessions: SessionManager::new(&context),
        }
    }

    /// Receive events from the collab system, blocking until one arrives.
    pub fn wait_for_event(&self) -> Option<SessionEvent> {
        self.event_receiver.recv().ok()
    }

    /// Returns the next event if one is ready.
    pub fn try_event(&self) -> Option<SessionEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// A receiver that can be moved to another thread.
    pub fn events(&self) -> EventReceiver {
        self.event_receiver.clone()
    }
}

impl CollabContext {
    pub fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine
        let _ = self.event_sender.send(event);
    }
}
