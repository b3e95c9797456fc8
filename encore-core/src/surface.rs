use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::{ChannelId, Tally, User};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("Message no longer exists")]
    NotFound,

    #[error("Missing permission to post in this channel")]
    Forbidden,

    #[error("{0}")]
    Other(String),
}

/// A message that was posted, and can be edited or deleted later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MessageHandle {
    pub channel: ChannelId,
    pub id: u64,
}

/// Everything the session engine ever posts.
#[derive(Debug, Clone, Serialize)]
pub enum Content {
    StatusCard(StatusCard),
    SearchPrompt(SearchPrompt),
    Notice(String),
    CloseSummary(CloseSummary),
}

/// The data behind a session's status display. How it looks is up to the surface.
#[derive(Debug, Clone, Serialize)]
pub struct StatusCard {
    /// Recently played items, the current item, then upcoming items, in order.
    pub entries: Vec<CardEntry>,
    /// How many upcoming items did not fit on the card.
    pub more: usize,
    /// Elapsed and total time, e.g. `01:30 / 04:00`, or `Live`.
    pub time: String,
    pub artwork: Option<String>,
    pub requester: User,
    pub controls: Controls,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardEntry {
    /// The marker column, e.g. `1.`, `>>`, `||`, `S.`.
    pub marker: String,
    pub name: String,
    pub uri: String,
    /// Requester, length, status message, and full name.
    pub details: String,
}

/// The state of the buttons below a status card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub playing: bool,
    pub paused: bool,
    pub seekable: bool,
    pub skip: Option<Tally>,
    pub pause: Option<Tally>,
    pub leave: Option<Tally>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPrompt {
    pub title: String,
    pub candidates: Vec<CardEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloseSummary {
    pub description: String,
    pub footer: String,
}

/// The messaging surface that status cards, prompts and notices are posted on.
///
/// Failures are never fatal to a session, callers log and move on.
#[async_trait]
pub trait MessagingSurface: Send + Sync {
    async fn send(&self, channel: ChannelId, content: Content) -> Result<MessageHandle, SurfaceError>;

    async fn edit(&self, handle: &MessageHandle, content: Content) -> Result<(), SurfaceError>;

    async fn delete(&self, handle: &MessageHandle) -> Result<(), SurfaceError>;

    /// The most recent message in the channel, from anyone.
    async fn last_message_in(&self, channel: ChannelId) -> Result<Option<MessageHandle>, SurfaceError>;

    /// Shows a message only the given user can see.
    async fn notify(&self, channel: ChannelId, user: &User, text: &str) -> Result<(), SurfaceError>;
}
