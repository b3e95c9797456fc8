mod actions;
mod close;
mod error;
mod requests;
mod session;
mod state;


use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use encore_core::{ChannelId, DestinationId, FinishReason, ItemId, Query, User};
use futures_util::future::join_all;
use log::info;

use crate::{CollabContext, RenderMode, SessionEvent};

pub use actions::MAX_VOLUME;
pub use close::close_summary;
pub use error::*;
pub use session::Session;
pub use state::*;

/// Opens, looks up and tears down the sessions of every destination.
pub struct SessionManager {
    context: CollabContext,
}

impl SessionManager {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Returns the session of a destination, creating it if there is none.
    pub fn open(&self, destination: DestinationId, channel: ChannelId) -> Arc<Session> {
        match self.context.sessions.entry(destination) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let session = Session::new(&self.context, destination, channel);
                entry.insert(session.clone());

                info!("Opened session in {}", destination);
                self.context.emit(SessionEvent::Opened { destination });

                session
            }
        }
    }

    pub fn get(&self, destination: DestinationId) -> SessionResult<Arc<Session>> {
        self.context
            .sessions
            .get(&destination)
            .map(|s| s.clone())
            .ok_or(SessionError::NoActiveSession)
    }

    /// Get all sessions in memory
    pub fn list_all(&self) -> Vec<Arc<Session>> {
        self.context.sessions.iter().map(|s| s.clone()).collect()
    }

    /// Queues a request in a destination, opening a session there if needed.
    pub async fn enqueue_request(
        &self,
        destination: DestinationId,
        channel: ChannelId,
        query: Query,
        requester: User,
    ) -> SessionResult<Enqueued> {
        let session = self.open(destination, channel);
        session.enqueue_request(query, requester).await
    }

    /// Forwards a finished item from the engine. Ignored if the session is already gone.
    pub async fn on_finished(
        &self,
        destination: DestinationId,
        item: ItemId,
        reason: FinishReason,
    ) -> SessionResult<()> {
        match self.get(destination) {
            Ok(session) => session.on_finished(item, reason).await,
            Err(_) => Ok(()),
        }
    }

    /// Called when someone joined or left a destination. Closes the session once everyone left.
    pub async fn on_member_change(&self, destination: DestinationId) {
        let Ok(session) = self.get(destination) else {
            return;
        };

        if session.members().await.is_empty() {
            session.close(CloseReason::EveryoneLeft).await;
        } else {
            session.renderer.render(&session, RenderMode::Refresh).await;
        }
    }

    /// Called when the bot was removed from a destination by someone else.
    pub async fn on_abandoned(&self, destination: DestinationId) {
        if let Ok(session) = self.get(destination) {
            session.close(CloseReason::Removed).await;
        }
    }

    /// Closes every session, announcing a restart.
    pub async fn close_all(&self) {
        let sessions = self.list_all();
        let closing = sessions.iter().map(|s| s.close(CloseReason::Restart));

        join_all(closing).await;
    }
}
