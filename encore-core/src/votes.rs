use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
};

use serde::Serialize;

use crate::UserId;

/// A control action listeners can vote on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VoteAction {
    Skip,
    Pause,
    Leave,
}

/// Current votes against what is required, as shown on a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub votes: usize,
    pub required: usize,
}

/// Returns how many votes are needed among the given number of members.
///
/// This is half the members, rounded half to even, so 3 members need 2 votes but 5 members
/// also need 2.
pub fn quorum(member_count: usize) -> usize {
    let half = member_count / 2;

    if member_count % 2 == 1 && half % 2 == 1 {
        half + 1
    } else {
        half
    }
}

/// Tracks who voted for which action.
///
/// Voters that are no longer members are dropped whenever votes are counted, so the
/// caller passes the current membership to every counting operation.
#[derive(Debug, Default)]
pub struct VoteCoordinator {
    sets: HashMap<VoteAction, HashSet<UserId>>,
}

impl VoteCoordinator {
    /// Adds the voter if they have not voted yet, or takes their vote back if they have.
    /// Returns true if the voter now has a vote registered.
    pub fn toggle(&mut self, voter: UserId, action: VoteAction, members: &[UserId]) -> bool {
        let set = self.sets.entry(action).or_default();
        let registered = if set.remove(&voter) {
            false
        } else {
            set.insert(voter)
        };

        self.prune(members);
        registered && members.contains(&voter)
    }

    /// Drops every voter that is not in the given membership.
    pub fn prune(&mut self, members: &[UserId]) {
        for set in self.sets.values_mut() {
            set.retain(|v| members.contains(v));
        }
    }

    pub fn tally(&mut self, action: VoteAction, members: &[UserId]) -> Tally {
        self.prune(members);

        Tally {
            votes: self.sets.get(&action).map(|s| s.len()).unwrap_or_default(),
            required: quorum(members.len()),
        }
    }

    pub fn has_passed(&mut self, action: VoteAction, members: &[UserId]) -> bool {
        self.tally(action, members).has_passed()
    }

    pub fn clear(&mut self, action: VoteAction) {
        self.sets.remove(&action);
    }

    /// Clears the votes tied to the current item. Leave votes stay until leaving fires.
    pub fn clear_item_votes(&mut self) {
        self.clear(VoteAction::Skip);
        self.clear(VoteAction::Pause);
    }

    pub fn clear_all(&mut self) {
        self.sets.clear();
    }
}

impl Tally {
    pub fn has_passed(&self) -> bool {
        self.votes >= self.required
    }

    /// Returns the tally if anyone voted at all.
    pub fn if_any(self) -> Option<Self> {
        (self.votes > 0).then_some(self)
    }
}

impl Display for Tally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}/{})", self.votes, self.required)
    }
}

impl Display for VoteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Skip => "skip",
            Self::Pause => "pause",
            Self::Leave => "leave",
        };

        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quorum_rounds_half_to_even() {
        let expected = [0, 0, 1, 2, 2, 2, 3, 4, 4, 4, 5];

        for (members, required) in expected.into_iter().enumerate() {
            assert_eq!(quorum(members), required, "{} members", members);
        }
    }

    #[test]
    fn quorum_never_decreases() {
        for members in 0..500 {
            assert!(quorum(members + 1) >= quorum(members));
        }
    }

    #[test]
    fn toggling_twice_takes_the_vote_back() {
        let members = [1, 2, 3, 4];
        let mut votes = VoteCoordinator::default();

        assert!(votes.toggle(1, VoteAction::Skip, &members));
        assert_eq!(votes.tally(VoteAction::Skip, &members).votes, 1);

        assert!(!votes.toggle(1, VoteAction::Skip, &members));
        assert_eq!(votes.tally(VoteAction::Skip, &members).votes, 0);
    }

    #[test]
    fn two_of_four_pass() {
        let members = [1, 2, 3, 4];
        let mut votes = VoteCoordinator::default();

        votes.toggle(1, VoteAction::Skip, &members);
        assert!(!votes.has_passed(VoteAction::Skip, &members));

        votes.toggle(2, VoteAction::Skip, &members);
        assert!(votes.has_passed(VoteAction::Skip, &members));
        assert!(!votes.has_passed(VoteAction::Leave, &members));
    }

    #[test]
    fn departed_voters_are_not_counted() {
        let mut votes = VoteCoordinator::default();

        votes.toggle(1, VoteAction::Leave, &[1, 2, 3, 4, 5, 6]);
        votes.toggle(2, VoteAction::Leave, &[1, 2, 3, 4, 5, 6]);

        // Member 2 left, so only one valid vote remains
        let members = [1, 3, 4, 5, 6];
        let tally = votes.tally(VoteAction::Leave, &members);

        assert_eq!(tally, Tally { votes: 1, required: 2 });
        assert_eq!(tally.to_string(), "(1/2)");

        // A non-member can never register a vote
        assert!(!votes.toggle(9, VoteAction::Leave, &members));
        assert_eq!(votes.tally(VoteAction::Leave, &members).votes, 1);
    }

    #[test]
    fn nobody_present_passes_instantly() {
        let mut votes = VoteCoordinator::default();
        assert!(votes.has_passed(VoteAction::Pause, &[]));
    }

    #[test]
    fn leave_votes_outlive_the_item() {
        let members = [1, 2, 3];
        let mut votes = VoteCoordinator::default();

        votes.toggle(1, VoteAction::Skip, &members);
        votes.toggle(2, VoteAction::Pause, &members);
        votes.toggle(3, VoteAction::Leave, &members);
        votes.clear_item_votes();

        assert_eq!(votes.tally(VoteAction::Skip, &members).votes, 0);
        assert_eq!(votes.tally(VoteAction::Pause, &members).votes, 0);
        assert_eq!(votes.tally(VoteAction::Leave, &members).votes, 1);
    }

    #[test]
    fn clearing_one_action_leaves_the_rest() {
        let members = [1, 2];
        let mut votes = VoteCoordinator::default();

        votes.toggle(1, VoteAction::Pause, &members);
        votes.toggle(1, VoteAction::Leave, &members);
        votes.clear(VoteAction::Pause);

        assert_eq!(votes.tally(VoteAction::Pause, &members).if_any(), None);
        assert_eq!(votes.tally(VoteAction::Leave, &members).votes, 1);

        votes.clear_all();
        assert_eq!(votes.tally(VoteAction::Leave, &members).votes, 0);
    }
}
