use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub type UserId = u64;
/// Identifies an audio destination, which owns at most one session.
pub type DestinationId = u64;
/// Identifies a text channel where status cards and prompts are posted.
pub type ChannelId = u64;

/// A platform user, as seen by the session engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Read-only view of who is currently listening at a destination.
#[async_trait]
pub trait MemberRoster: Send + Sync {
    /// Returns the ids of the listeners present at the destination, excluding the bot itself.
    async fn members(&self, destination: DestinationId) -> Vec<UserId>;
}

/// Decides who may act without a vote.
#[async_trait]
pub trait PermissionOracle: Send + Sync {
    async fn is_operator(&self, user: &User, destination: DestinationId) -> bool;
}
