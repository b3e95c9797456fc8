//! In-memory collaborators for session tests. They record every call made to them.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use crossbeam::atomic::AtomicCell;
use encore_core::{
    ChannelId, Config, Content, Cooldowns, DestinationId, EngineError, Media, MediaItem,
    MediaResolver, MemberRoster, MessageHandle, MessagingSurface, PermissionOracle,
    PlaybackEngine, Query, Resolution, ResolveError, StatusCard, SurfaceError, User, UserId,
};
use parking_lot::Mutex;

use crate::{Collab, Collaborators, Session, SessionEvent};

pub const DESTINATION: DestinationId = 1;
pub const CHANNEL: ChannelId = 10;

pub fn john() -> User {
    User::new(1, "john")
}

pub fn mary() -> User {
    User::new(2, "mary")
}

pub fn media(title: &str) -> Media {
    Media {
        title: title.to_string(),
        author: "someone".to_string(),
        length: Some(Duration::from_secs(200)),
        uri: format!("https://example.com/{}", title),
        artwork: None,
    }
}

/// An item requested by john.
pub fn item(title: &str) -> MediaItem {
    MediaItem::new(media(title), john())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Play(String),
    Pause,
    Resume,
    Seek(Duration),
    Stop,
    Volume(u16),
    Disconnect,
}

#[derive(Default)]
pub struct FakeEngine {
    calls: Mutex<Vec<EngineCall>>,
    unplayable: Mutex<HashSet<String>>,
    position: AtomicCell<Duration>,
}

impl FakeEngine {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    /// Titles of every item that was successfully started.
    pub fn played(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                EngineCall::Play(title) => Some(title.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    pub fn fail_to_load(&self, title: &str) {
        self.unplayable.lock().insert(title.to_string());
    }

    pub fn set_position(&self, position: Duration) {
        self.position.store(position);
    }

    fn record(&self, call: EngineCall) -> Result<(), EngineError> {
        self.calls.lock().push(call);
        Ok(())
    }
}

#[async_trait]
impl PlaybackEngine for FakeEngine {
    async fn play(&self, _: DestinationId, item: &MediaItem) -> Result<(), EngineError> {
        if self.unplayable.lock().contains(&item.media.title) {
            return Err(EngineError::Load("Video unavailable".to_string()));
        }

        self.position.store(Duration::ZERO);
        self.record(EngineCall::Play(item.media.title.clone()))
    }

    async fn pause(&self, _: DestinationId) -> Result<(), EngineError> {
        self.record(EngineCall::Pause)
    }

    async fn resume(&self, _: DestinationId) -> Result<(), EngineError> {
        self.record(EngineCall::Resume)
    }

    async fn seek(&self, _: DestinationId, offset: Duration) -> Result<(), EngineError> {
        self.position.store(offset);
        self.record(EngineCall::Seek(offset))
    }

    async fn stop(&self, _: DestinationId) -> Result<(), EngineError> {
        self.record(EngineCall::Stop)
    }

    async fn set_volume(&self, _: DestinationId, percent: u16) -> Result<(), EngineError> {
        self.record(EngineCall::Volume(percent))
    }

    fn position(&self, _: DestinationId) -> Duration {
        self.position.load()
    }

    async fn disconnect(&self, _: DestinationId) -> Result<(), EngineError> {
        self.record(EngineCall::Disconnect)
    }
}

#[derive(Default)]
pub struct FakeSurface {
    next_id: AtomicCell<u64>,
    /// Messages that currently exist, oldest first.
    live: Mutex<Vec<(MessageHandle, Content)>>,
    /// Everything that was ever sent or edited in, in order.
    posted: Mutex<Vec<Content>>,
    deleted: Mutex<Vec<MessageHandle>>,
    notifications: Mutex<Vec<(UserId, String)>>,
}

impl FakeSurface {
    pub fn posted(&self) -> Vec<Content> {
        self.posted.lock().clone()
    }

    /// How many times a status card was sent or edited.
    pub fn card_renders(&self) -> usize {
        self.posted
            .lock()
            .iter()
            .filter(|c| matches!(c, Content::StatusCard(_)))
            .count()
    }

    pub fn last_card(&self) -> Option<StatusCard> {
        self.posted.lock().iter().rev().find_map(|c| match c {
            Content::StatusCard(card) => Some(card.clone()),
            _ => None,
        })
    }

    pub fn notices(&self) -> Vec<String> {
        self.posted
            .lock()
            .iter()
            .filter_map(|c| match c {
                Content::Notice(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn close_summaries(&self) -> Vec<String> {
        self.posted
            .lock()
            .iter()
            .filter_map(|c| match c {
                Content::CloseSummary(summary) => Some(summary.description.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn live_messages(&self) -> usize {
        self.live.lock().len()
    }

    pub fn deleted(&self) -> Vec<MessageHandle> {
        self.deleted.lock().clone()
    }

    pub fn notifications(&self) -> Vec<(UserId, String)> {
        self.notifications.lock().clone()
    }
}

#[async_trait]
impl MessagingSurface for FakeSurface {
    async fn send(&self, channel: ChannelId, content: Content) -> Result<MessageHandle, SurfaceError> {
        let handle = MessageHandle {
            channel,
            id: self.next_id.fetch_add(1),
        };

        self.posted.lock().push(content.clone());
        self.live.lock().push((handle, content));

        Ok(handle)
    }

    async fn edit(&self, handle: &MessageHandle, content: Content) -> Result<(), SurfaceError> {
        let mut live = self.live.lock();
        let (_, existing) = live
            .iter_mut()
            .find(|(h, _)| h == handle)
            .ok_or(SurfaceError::NotFound)?;

        *existing = content.clone();
        self.posted.lock().push(content);

        Ok(())
    }

    async fn delete(&self, handle: &MessageHandle) -> Result<(), SurfaceError> {
        let mut live = self.live.lock();
        let index = live
            .iter()
            .position(|(h, _)| h == handle)
            .ok_or(SurfaceError::NotFound)?;

        live.remove(index);
        self.deleted.lock().push(*handle);

        Ok(())
    }

    async fn last_message_in(&self, channel: ChannelId) -> Result<Option<MessageHandle>, SurfaceError> {
        Ok(self
            .live
            .lock()
            .iter()
            .rev()
            .map(|(h, _)| *h)
            .find(|h| h.channel == channel))
    }

    async fn notify(&self, _: ChannelId, user: &User, text: &str) -> Result<(), SurfaceError> {
        self.notifications.lock().push((user.id, text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeRoster {
    members: Mutex<Vec<UserId>>,
}

impl FakeRoster {
    pub fn set(&self, members: &[UserId]) {
        *self.members.lock() = members.to_vec();
    }
}

#[async_trait]
impl MemberRoster for FakeRoster {
    async fn members(&self, _: DestinationId) -> Vec<UserId> {
        self.members.lock().clone()
    }
}

#[derive(Default)]
pub struct FakePermissions {
    operators: Mutex<HashSet<UserId>>,
}

impl FakePermissions {
    pub fn grant(&self, user: &User) {
        self.operators.lock().insert(user.id);
    }
}

#[async_trait]
impl PermissionOracle for FakePermissions {
    async fn is_operator(&self, user: &User, _: DestinationId) -> bool {
        self.operators.lock().contains(&user.id)
    }
}

/// Resolves queries that were registered up front, by their identifier.
#[derive(Default)]
pub struct FakeResolver {
    known: Mutex<HashMap<String, Resolution>>,
}

impl FakeResolver {
    pub fn register(&self, identifier: &str, resolution: Resolution) {
        self.known.lock().insert(identifier.to_string(), resolution);
    }
}

#[async_trait]
impl MediaResolver for FakeResolver {
    async fn resolve(&self, query: &Query) -> Result<Resolution, ResolveError> {
        let identifier = query.to_identifier();

        if let Some(resolution) = self.known.lock().get(&identifier) {
            return Ok(resolution.clone());
        }

        // Unregistered links to example.com resolve to a single item named after the path
        match identifier.strip_prefix("https://example.com/") {
            Some(title) => Ok(Resolution::Single(media(title))),
            None => Err(ResolveError::NotFound),
        }
    }
}

/// A collab system wired to fakes, with one destination of listeners john and mary.
pub struct Harness {
    pub collab: Collab,
    pub engine: Arc<FakeEngine>,
    pub surface: Arc<FakeSurface>,
    pub roster: Arc<FakeRoster>,
    pub permissions: Arc<FakePermissions>,
    pub resolver: Arc<FakeResolver>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let engine = Arc::new(FakeEngine::default());
        let surface = Arc::new(FakeSurface::default());
        let roster = Arc::new(FakeRoster::default());
        let permissions = Arc::new(FakePermissions::default());
        let resolver = Arc::new(FakeResolver::default());

        roster.set(&[john().id, mary().id]);

        let collaborators = Collaborators {
            resolver: resolver.clone(),
            engine: engine.clone(),
            surface: surface.clone(),
            roster: roster.clone(),
            permissions: permissions.clone(),
        };

        Self {
            collab: Collab::new(config, collaborators, Cooldowns::new()),
            engine,
            surface,
            roster,
            permissions,
            resolver,
        }
    }

    pub fn session(&self) -> Arc<Session> {
        self.collab.sessions.open(DESTINATION, CHANNEL)
    }

    /// Requests a title as the given user, through a link the fake resolver understands.
    pub async fn request(&self, title: &str, user: User) {
        let query = Query::Link(format!("https://example.com/{}", title));

        self.collab
            .sessions
            .enqueue_request(DESTINATION, CHANNEL, query, user)
            .await
            .expect("request is enqueued");
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        std::iter::from_fn(|| self.collab.try_event()).collect()
    }
}

/// Lets spawned tasks run, advancing paused time by a moment.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
