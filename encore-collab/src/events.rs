use crossbeam::channel::{Receiver, Sender};
use encore_core::{DestinationId, ItemId};

use crate::{CloseReason, SessionState};

pub type EventSender = Sender<SessionEvent>;
pub type EventReceiver = Receiver<SessionEvent>;

/// Events emitted by sessions
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A session was created for a destination
    Opened { destination: DestinationId },
    /// A session moved to a new state
    StateChanged {
        destination: DestinationId,
        new_state: SessionState,
    },
    /// An item started playing
    ItemStarted {
        destination: DestinationId,
        item_id: ItemId,
        title: String,
    },
    /// An item could not be played and was passed over
    ItemErrored {
        destination: DestinationId,
        item_id: ItemId,
        reason: String,
    },
    /// Items were added to or reordered in the queue
    QueueUpdated {
        destination: DestinationId,
        length: usize,
    },
    /// The session was torn down
    Closed {
        destination: DestinationId,
        reason: CloseReason,
    },
}
