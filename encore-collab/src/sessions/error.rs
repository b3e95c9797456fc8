use encore_core::{EngineError, QueueError, SeekError};
use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No active session at this destination")]
    NoActiveSession,
    #[error("The session has closed")]
    Closed,
    #[error("User is not listening at this destination")]
    NotAMember,
    #[error("Nothing is playing")]
    NothingPlaying,
    #[error("Live streams cannot be seeked")]
    NotSeekable,
    #[error("Only the requester or an operator can do this")]
    Unauthorized,
    #[error("Search prompt no longer exists")]
    SearchNotFound,
    #[error("Search prompt belongs to someone else")]
    NotSearchRequester,
    #[error("There is no candidate {0}")]
    InvalidChoice(usize),
    #[error("Volume must be between 0 and {0}%")]
    InvalidVolume(u16),
    #[error(transparent)]
    Seek(#[from] SeekError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("Playback engine failed: {0}")]
    Engine(#[from] EngineError),
}
