use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::{DestinationId, MediaItem};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The media could not be loaded. The item is skipped, not retried.
    #[error("Failed to load media: {0}")]
    Load(String),

    #[error("Not connected to the destination")]
    NotConnected,

    #[error("{0}")]
    Other(String),
}

/// Why the engine stopped playing an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// The item ran to its end, or was stopped.
    Completed,
    /// Playback failed midway.
    Errored(String),
}

/// The external audio engine. Decoding and transport are entirely its business.
///
/// The engine reports finished items by calling back into the session manager
/// (`on_finished`), carrying the id of the item it was given in [PlaybackEngine::play].
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    async fn play(&self, destination: DestinationId, item: &MediaItem) -> Result<(), EngineError>;

    async fn pause(&self, destination: DestinationId) -> Result<(), EngineError>;

    async fn resume(&self, destination: DestinationId) -> Result<(), EngineError>;

    async fn seek(&self, destination: DestinationId, offset: Duration) -> Result<(), EngineError>;

    async fn stop(&self, destination: DestinationId) -> Result<(), EngineError>;

    async fn set_volume(&self, destination: DestinationId, percent: u16) -> Result<(), EngineError>;

    /// The playback position of the current item.
    fn position(&self, destination: DestinationId) -> Duration;

    /// Leaves the destination. Called once, on teardown.
    async fn disconnect(&self, destination: DestinationId) -> Result<(), EngineError>;
}
