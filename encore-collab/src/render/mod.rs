mod card;

use std::{sync::Arc, time::Duration};

use crossbeam::atomic::AtomicCell;
use encore_core::{ChannelId, Content, CooldownScope, MessageHandle, MessagingSurface, SurfaceError};
use log::debug;
use parking_lot::Mutex;
use tokio::{sync::Mutex as AsyncMutex, time::Instant};

pub use card::*;

use crate::{CollabContext, Session};

/// Why a status card is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Playback moved on a bit. Subject to the render interval.
    Progress,
    /// Something changed that users should see right away.
    Refresh,
    /// Like [RenderMode::Refresh], but makes sure the card is the latest message in the channel.
    Repost,
}

/// Owns a session's status card and gates how often it is edited.
///
/// Renders never overlap: each one waits for the previous edit to complete, so edits are
/// applied in the order they were requested.
pub struct RenderThrottler {
    cooldown: CooldownScope,
    interval: Duration,

    in_flight: AsyncMutex<()>,
    card: Mutex<Option<MessageHandle>>,
    last_render: AtomicCell<Instant>,
    retired: AtomicCell<bool>,
}

impl RenderThrottler {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            cooldown: context.cooldowns.scope("status-card"),
            interval: context.config.render_interval(),
            in_flight: Default::default(),
            card: Default::default(),
            last_render: AtomicCell::new(Instant::now()),
            retired: AtomicCell::new(false),
        }
    }

    /// Renders the session's status card. Returns true if the card was posted or edited.
    pub async fn render(&self, session: &Session, mode: RenderMode) -> bool {
        let _flight = self.in_flight.lock().await;

        if self.retired.load() {
            return false;
        }

        if session.current_item().is_none() {
            return false;
        }

        if mode == RenderMode::Progress {
            if !self.cooldown.allow(session.destination, self.interval) {
                debug!("Suppressed status card render for {}", session.destination);
                return false;
            }
        } else {
            self.cooldown.touch(session.destination);
        }

        let Some(card) = session.status_card().await else {
            return false;
        };

        let surface = &session.context.collaborators.surface;
        let content = Content::StatusCard(card);
        let existing = *self.card.lock();

        let handle = match (mode, existing) {
            (RenderMode::Repost, Some(handle)) => {
                repost(surface, session.channel, handle, content).await
            }
            (_, Some(handle)) => match surface.edit(&handle, content).await {
                Ok(()) => Some(handle),
                Err(SurfaceError::NotFound) => None,
                Err(e) => {
                    debug!("Failed to edit status card: {}", e);
                    Some(handle)
                }
            },
            (_, None) => send(surface, session.channel, content).await,
        };

        *self.card.lock() = handle;
        self.last_render.store(Instant::now());

        true
    }

    /// When the card was last rendered, or when the session started if never.
    pub fn last_render(&self) -> Instant {
        self.last_render.load()
    }

    pub fn card(&self) -> Option<MessageHandle> {
        *self.card.lock()
    }

    /// Deletes the card for good. Renders after this are no-ops.
    pub async fn retire(&self, surface: &Arc<dyn MessagingSurface>) {
        let _flight = self.in_flight.lock().await;
        self.retired.store(true);

        let card = self.card.lock().take();

        if let Some(handle) = card {
            if let Err(e) = surface.delete(&handle).await {
                debug!("Failed to delete status card: {}", e);
            }
        }
    }
}

async fn send(
    surface: &Arc<dyn MessagingSurface>,
    channel: ChannelId,
    content: Content,
) -> Option<MessageHandle> {
    surface
        .send(channel, content)
        .await
        .map_err(|e| debug!("Failed to send status card: {}", e))
        .ok()
}

/// Edits the card in place if nothing was posted after it, otherwise posts it anew.
async fn repost(
    surface: &Arc<dyn MessagingSurface>,
    channel: ChannelId,
    handle: MessageHandle,
    content: Content,
) -> Option<MessageHandle> {
    let last = surface.last_message_in(channel).await.ok().flatten();

    if last == Some(handle) {
        match surface.edit(&handle, content.clone()).await {
            Ok(()) => return Some(handle),
            Err(e) => debug!("Failed to edit status card: {}", e),
        }
    } else if let Err(e) = surface.delete(&handle).await {
        debug!("Failed to delete old status card: {}", e);
    }

    send(surface, channel, content).await
}
