use std::sync::Arc;

use crossbeam::atomic::AtomicCell;
use encore_core::{
    ChannelId, DestinationId, EngineError, FinishReason, ItemId, MediaItem, PlaybackQueue,
    StatusCard, UserId, VoteAction, VoteCoordinator,
};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use tokio::{
    sync::Mutex as AsyncMutex,
    task::JoinHandle,
    time::{sleep, Instant},
};

use crate::{
    status_card, CardTallies, CloseReason, CollabContext, InactivityWatchdog, RenderMode,
    RenderThrottler, SearchDisambiguator, SessionEvent, Wake,
};

use super::{SessionResult, SessionState};

/// A listening session bound to one audio destination.
///
/// Owns the queue, the votes, the open search prompts and the status card, and drives
/// playback from one item to the next.
pub struct Session {
    pub destination: DestinationId,
    /// Where the status card and prompts are posted.
    pub channel: ChannelId,

    pub(crate) context: CollabContext,
    pub(crate) data: Mutex<SessionData>,
    pub(crate) searches: SearchDisambiguator,
    pub(crate) renderer: RenderThrottler,

    watchdog: InactivityWatchdog,
    /// Held by whoever is moving the session to its next item
    advance_lock: AsyncMutex<()>,
    closed: AtomicCell<bool>,
    started_at: Instant,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

pub(crate) struct SessionData {
    pub state: SessionState,
    /// The item playing, or the last one that did while awaiting the next.
    pub current: Option<MediaItem>,
    pub queue: PlaybackQueue,
    pub votes: VoteCoordinator,
    pub total_played: usize,
}

/// What asked the session to move on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Advance {
    /// Start playing if nothing is going on yet.
    Kick,
    /// The engine finished the given item.
    Finished(ItemId),
    /// The given item was skipped.
    Skip(ItemId),
    /// Wait for items in the background, after a kick found nothing playable.
    Resume,
}

impl Session {
    pub(crate) fn new(
        context: &CollabContext,
        destination: DestinationId,
        channel: ChannelId,
    ) -> Arc<Self> {
        let config = &context.config;

        let session = Arc::new(Self {
            destination,
            channel,
            data: Mutex::new(SessionData {
                state: SessionState::Idle,
                current: None,
                queue: PlaybackQueue::new(config.history_size),
                votes: Default::default(),
                total_played: 0,
            }),
            searches: Default::default(),
            renderer: RenderThrottler::new(context),
            watchdog: InactivityWatchdog::new(config),
            advance_lock: Default::default(),
            closed: AtomicCell::new(false),
            started_at: Instant::now(),
            refresh_task: Default::default(),
            context: context.clone(),
        });

        session.start_refresh_loop();
        session
    }

    /// Keeps the elapsed time on the status card roughly up to date.
    fn start_refresh_loop(self: &Arc<Self>) {
        let session = Arc::downgrade(self);
        let tick = self.context.config.refresh_tick();
        let stale_after = self.context.config.refresh_stale_after();

        let task = tokio::spawn(async move {
            loop {
                sleep(tick).await;

                let Some(session) = session.upgrade() else {
                    break;
                };

                if session.is_closed() {
                    break;
                }

                if session.renderer.last_render().elapsed() < stale_after {
                    continue;
                }

                let refreshable = {
                    let data = session.data.lock();

                    data.state == SessionState::Playing
                        && data.current.as_ref().is_some_and(|c| !c.is_live())
                };

                if refreshable {
                    session.renderer.render(&session, RenderMode::Progress).await;
                }
            }
        });

        *self.refresh_task.lock() = Some(task);
    }

    pub fn state(&self) -> SessionState {
        self.data.lock().state
    }

    /// The item playing, or the one that last played while the session awaits the next.
    pub fn current_item(&self) -> Option<MediaItem> {
        self.data.lock().current.clone()
    }

    pub fn queued_items(&self) -> Vec<MediaItem> {
        self.data.lock().queue.items().cloned().collect()
    }

    /// Recently played items, oldest first.
    pub fn history(&self) -> Vec<MediaItem> {
        self.data.lock().queue.history().cloned().collect()
    }

    pub fn total_played(&self) -> usize {
        self.data.lock().total_played
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn pending_searches(&self) -> usize {
        self.searches.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load()
    }

    pub fn has_queued_items(&self) -> bool {
        !self.data.lock().queue.is_empty()
    }

    /// The ids of the listeners currently at the destination.
    pub(crate) async fn members(&self) -> Vec<UserId> {
        self.context
            .collaborators
            .roster
            .members(self.destination)
            .await
    }

    /// Marks the session as closed. Returns false if it already was.
    pub(crate) fn mark_closed(&self) -> bool {
        !self.closed.swap(true)
    }

    pub(crate) fn stop_refresh_loop(&self) {
        if let Some(task) = self.refresh_task.lock().take() {
            task.abort();
        }
    }

    pub(crate) fn transition(&self, data: &mut SessionData, new_state: SessionState) {
        if data.state == new_state {
            return;
        }

        debug!(
            "Session {} went from {:?} to {:?}",
            self.destination, data.state, new_state
        );

        data.state = new_state;

        self.context.emit(SessionEvent::StateChanged {
            destination: self.destination,
            new_state,
        });
    }

    pub(crate) fn emit_queue_update(&self) {
        let length = self.data.lock().queue.len();

        self.context.emit(SessionEvent::QueueUpdated {
            destination: self.destination,
            length,
        });
    }

    /// Builds the current status card, if there is anything to show.
    pub(crate) async fn status_card(&self) -> Option<StatusCard> {
        let members = self.members().await;
        let position = self
            .context
            .collaborators
            .engine
            .position(self.destination);

        let mut data = self.data.lock();
        let data = &mut *data;

        let tallies = CardTallies {
            skip: data.votes.tally(VoteAction::Skip, &members),
            pause: data.votes.tally(VoteAction::Pause, &members),
            leave: data.votes.tally(VoteAction::Leave, &members),
        };

        let current = data.current.as_ref()?;

        Some(status_card(
            &data.queue,
            current,
            data.state,
            position,
            tallies,
            self.context.config.upcoming_on_card,
        ))
    }

    /// Called by the engine when an item stopped playing.
    pub async fn on_finished(self: &Arc<Self>, item: ItemId, reason: FinishReason) -> SessionResult<()> {
        if let FinishReason::Errored(reason) = reason {
            let mut data = self.data.lock();

            if let Some(current) = data.current.as_mut().filter(|c| c.id == item) {
                warn!("{} errored during playback: {}", current.media.title, reason);
                current.mark_errored(reason.clone());

                self.context.emit(SessionEvent::ItemErrored {
                    destination: self.destination,
                    item_id: item,
                    reason,
                });
            }
        }

        self.advance(Advance::Finished(item)).await
    }

    /// Starts playing if the session has not started yet.
    pub(crate) async fn kick(self: &Arc<Self>) -> SessionResult<()> {
        self.advance(Advance::Kick).await
    }

    /// Advances in the background, since an advance may wait for the whole grace window.
    pub(crate) fn spawn_advance(self: &Arc<Self>, trigger: Advance) {
        let session = self.clone();

        tokio::spawn(async move {
            if let Err(e) = session.advance(trigger).await {
                error!("Session {} failed to advance: {}", session.destination, e);
            }
        });
    }

    /// Retires the current item and plays the next one, waiting for one to be queued if needed.
    ///
    /// Only one advance runs at a time. A trigger that arrives while another advance is in
    /// flight, or that refers to an item that is no longer current, does nothing. A kick
    /// returns once it has tried every queued item, leaving any wait to a background resume.
    pub(crate) async fn advance(self: &Arc<Self>, trigger: Advance) -> SessionResult<()> {
        {
            let _advancing = self.advance_lock.lock().await;
            let mut data = self.data.lock();

            let claimed = match (data.state, trigger) {
                (SessionState::Idle, Advance::Kick) => true,
                (SessionState::Awaiting, Advance::Resume) => true,
                (
                    SessionState::Playing | SessionState::Paused,
                    Advance::Finished(id) | Advance::Skip(id),
                ) => data.current.as_ref().is_some_and(|c| c.id == id),
                _ => false,
            };

            if !claimed {
                debug!(
                    "Session {} ignored {:?} while {:?}",
                    self.destination, trigger, data.state
                );
                return Ok(());
            }

            self.transition(&mut data, SessionState::Awaiting);
        }

        loop {
            if !self.has_queued_items() {
                // Kicks come from requests, whose callers should not wait out the grace window
                if trigger == Advance::Kick {
                    self.spawn_advance(Advance::Resume);
                    return Ok(());
                }

                self.data.lock().votes.clear_item_votes();
                self.renderer.render(self, RenderMode::Refresh).await;

                match self.watchdog.wait_for_items(self).await {
                    Wake::Ready => {}
                    Wake::Closed => return Ok(()),
                    Wake::Expired => {
                        self.close(CloseReason::Inactivity).await;
                        return Ok(());
                    }
                }
            }

            let advancing = self.advance_lock.lock().await;

            if self.is_closed() {
                return Ok(());
            }

            let next = {
                let mut data = self.data.lock();

                let Ok(next) = data.queue.pop_next() else {
                    continue;
                };

                if let Some(previous) = data.current.replace(next.clone()) {
                    data.queue.retire(previous);
                }

                data.votes.clear_item_votes();
                next
            };

            let engine = &self.context.collaborators.engine;

            match engine.play(self.destination, &next).await {
                Ok(()) => {
                    {
                        let mut data = self.data.lock();
                        data.total_played += 1;
                        self.transition(&mut data, SessionState::Playing);
                    }

                    info!("Now playing {} in {}", next.media.title, self.destination);

                    self.context.emit(SessionEvent::ItemStarted {
                        destination: self.destination,
                        item_id: next.id,
                        title: next.media.title.clone(),
                    });

                    drop(advancing);
                    self.emit_queue_update();
                    self.renderer.render(self, RenderMode::Repost).await;

                    return Ok(());
                }
                Err(EngineError::Load(reason)) => {
                    warn!("Could not play {}: {}", next.media.title, reason);

                    if let Some(current) = self.data.lock().current.as_mut() {
                        current.mark_errored(reason.clone());
                    }

                    self.context.emit(SessionEvent::ItemErrored {
                        destination: self.destination,
                        item_id: next.id,
                        reason,
                    });
                }
                Err(e) => {
                    // Leave the session startable, the host decides what to do next
                    let mut data = self.data.lock();
                    self.transition(&mut data, SessionState::Idle);

                    return Err(e.into());
                }
            }
        }
    }
}
