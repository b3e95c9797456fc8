use std::fmt::Display;

use encore_core::{MediaItem, User, VoteAction};

use crate::SearchId;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing has been played yet.
    #[default]
    Idle,
    /// Loading the next item, or waiting for one to be queued.
    Awaiting,
    Playing,
    Paused,
    /// The session is gone for good.
    Disconnected,
}

/// Why a session was closed. Displayed as the end of "Closing the music session ...".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    Inactivity,
    EveryoneLeft,
    Removed,
    Restart,
    VotedToLeave,
    /// An operator asked to leave.
    OperatorLeave(User),
    /// The requester of the current item, who also requested everything queued, asked to leave.
    RequesterLeave(User),
}

/// Who allowed an action to happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authority {
    Vote,
    Requester(User),
    Operator(User),
}

/// What came of a vote or a forced action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action happened.
    Fired(VoteAction, Authority),
    /// Not enough votes, and no authority; only the tally was updated.
    Tallied,
}

/// What came of an enqueue request.
#[derive(Debug, Clone)]
pub enum Enqueued {
    Single(MediaItem),
    Playlist { name: String, count: usize },
    /// The requester has to pick from a prompt first.
    Prompted(SearchId),
    /// Nothing could be resolved. The requester was told.
    Nothing,
}

impl SessionState {
    /// Whether an item is loaded in the engine, paused or not.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

impl Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactivity => write!(f, "due to inactivity."),
            Self::EveryoneLeft => write!(f, "because everyone left."),
            Self::Removed => write!(f, "because I was removed from the voice channel."),
            Self::Restart => write!(
                f,
                "because a manual bot restart was triggered. Try playing music again in a bit."
            ),
            Self::VotedToLeave => write!(f, "because enough people clicked the Leave button."),
            Self::OperatorLeave(user) => write!(
                f,
                "at the request of {}, who has special permissions and clicked the Leave button.",
                user.name
            ),
            Self::RequesterLeave(user) => write!(
                f,
                "at the request of {}, who had requested all remaining songs and clicked the Leave button.",
                user.name
            ),
        }
    }
}

impl Authority {
    /// Describes an action for the status card, e.g. `skipped by vote` or `force-paused by mary`.
    pub fn describe(&self, verb: &str) -> String {
        match self {
            Self::Vote => format!("{} by vote", verb),
            Self::Requester(_) => format!("{} by requester", verb),
            Self::Operator(user) => format!("force-{} by {}", verb, user.name),
        }
    }
}
