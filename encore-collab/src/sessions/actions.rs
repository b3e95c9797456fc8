use std::sync::Arc;

use encore_core::{MediaItem, QueueError, SeekTarget, User, VoteAction};
use log::{info, warn};

use crate::RenderMode;

use super::{
    session::Advance, ActionOutcome, Authority, CloseReason, Session, SessionError, SessionResult,
    SessionState,
};

/// The highest volume a session can be set to, in percent.
pub const MAX_VOLUME: u16 = 200;

impl Session {
    /// Toggles a user's vote on an action, and fires it if the vote passes.
    ///
    /// A user who could force the action anyway fires it straight away.
    pub async fn vote(self: &Arc<Self>, user: &User, action: VoteAction) -> SessionResult<ActionOutcome> {
        self.ensure_open()?;

        let members = self.members().await;

        if !members.contains(&user.id) {
            return Err(SessionError::NotAMember);
        }

        if action != VoteAction::Leave && !self.state().is_active() {
            return Err(SessionError::NothingPlaying);
        }

        let passed = {
            let mut data = self.data.lock();

            // Taking a vote back never fires an action
            data.votes.toggle(user.id, action, &members) && data.votes.has_passed(action, &members)
        };

        if passed {
            return self.fire(action, Authority::Vote).await;
        }

        if let Some(authority) = self.authority(user, action).await {
            return self.fire(action, authority).await;
        }

        self.renderer.render(self, RenderMode::Refresh).await;
        Ok(ActionOutcome::Tallied)
    }

    /// Fires an action without a vote, if the user is allowed to.
    ///
    /// Anyone else only gets a fresh tally on the card.
    pub async fn force_action(
        self: &Arc<Self>,
        user: &User,
        action: VoteAction,
    ) -> SessionResult<ActionOutcome> {
        self.ensure_open()?;

        if action != VoteAction::Leave && !self.state().is_active() {
            return Err(SessionError::NothingPlaying);
        }

        match self.authority(user, action).await {
            Some(authority) => self.fire(action, authority).await,
            None => {
                self.renderer.render(self, RenderMode::Refresh).await;
                Ok(ActionOutcome::Tallied)
            }
        }
    }

    /// Seeks within the current item. Only its requester and operators may seek.
    pub async fn seek(self: &Arc<Self>, user: &User, input: &str) -> SessionResult<()> {
        self.ensure_open()?;

        let target: SeekTarget = input.parse()?;
        let current = self.playing_item()?;

        if current.is_live() {
            return Err(SessionError::NotSeekable);
        }

        let by = match self.requester_or_operator(user).await? {
            Authority::Operator(user) => user.name,
            _ => "requester".to_string(),
        };

        let engine = &self.context.collaborators.engine;
        let mut offset = target.resolve(engine.position(self.destination));

        if let Some(length) = current.media.length {
            offset = offset.min(length);
        }

        engine.seek(self.destination, offset).await?;

        if let Some(item) = self.data.lock().current.as_mut().filter(|i| i.id == current.id) {
            item.set_status(format!("seek {} by {}", input.trim(), by));
        }

        self.renderer.render(self, RenderMode::Refresh).await;
        Ok(())
    }

    /// Sets the playback volume, in percent of the original.
    pub async fn set_volume(self: &Arc<Self>, user: &User, percent: u16) -> SessionResult<()> {
        self.ensure_open()?;

        if percent > MAX_VOLUME {
            return Err(SessionError::InvalidVolume(MAX_VOLUME));
        }

        self.playing_item()?;
        self.requester_or_operator(user).await?;

        self.context
            .collaborators
            .engine
            .set_volume(self.destination, percent)
            .await?;

        info!("Volume in {} set to {}% by {}", self.destination, percent, user.name);
        Ok(())
    }

    /// Shuffles the upcoming items. Operators only.
    pub async fn shuffle(self: &Arc<Self>, user: &User) -> SessionResult<()> {
        self.ensure_open()?;

        if !self.is_operator(user).await {
            return Err(SessionError::Unauthorized);
        }

        self.data.lock().queue.shuffle();
        self.emit_queue_update();
        self.renderer.render(self, RenderMode::Refresh).await;

        Ok(())
    }

    /// Moves the next item to the end of the queue. Operators and the item's requester only.
    pub async fn defer_next(self: &Arc<Self>, user: &User) -> SessionResult<()> {
        self.ensure_open()?;

        let owns_next = self
            .data
            .lock()
            .queue
            .items()
            .next()
            .map(|i| i.requested_by(user))
            .ok_or(QueueError::EmptyQueue)?;

        if !owns_next && !self.is_operator(user).await {
            return Err(SessionError::Unauthorized);
        }

        self.data.lock().queue.push_to_bottom()?;
        self.emit_queue_update();
        self.renderer.render(self, RenderMode::Refresh).await;

        Ok(())
    }

    /// Reposts the status card at the bottom of the channel.
    pub async fn push_to_bottom(self: &Arc<Self>) -> SessionResult<()> {
        self.ensure_open()?;
        self.renderer.render(self, RenderMode::Repost).await;

        Ok(())
    }

    pub(crate) fn ensure_open(&self) -> SessionResult<()> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }

        Ok(())
    }

    async fn is_operator(&self, user: &User) -> bool {
        self.context
            .collaborators
            .permissions
            .is_operator(user, self.destination)
            .await
    }

    /// The item loaded in the engine, paused or not.
    fn playing_item(&self) -> SessionResult<MediaItem> {
        let data = self.data.lock();

        data.current
            .clone()
            .filter(|_| data.state.is_active())
            .ok_or(SessionError::NothingPlaying)
    }

    async fn requester_or_operator(&self, user: &User) -> SessionResult<Authority> {
        let is_requester = self
            .data
            .lock()
            .current
            .as_ref()
            .is_some_and(|c| c.requested_by(user));

        if is_requester {
            Ok(Authority::Requester(user.clone()))
        } else if self.is_operator(user).await {
            Ok(Authority::Operator(user.clone()))
        } else {
            Err(SessionError::Unauthorized)
        }
    }

    /// Whether the user may fire an action without a vote.
    ///
    /// Requesting the current item is enough to skip or pause it. Leaving also requires having
    /// requested everything that is queued.
    async fn authority(&self, user: &User, action: VoteAction) -> Option<Authority> {
        let is_requester = {
            let data = self.data.lock();
            let owns_current = data.current.as_ref().is_some_and(|c| c.requested_by(user));

            match action {
                VoteAction::Leave => owns_current && data.queue.all_requested_by(user),
                _ => owns_current && data.state.is_active(),
            }
        };

        if is_requester {
            Some(Authority::Requester(user.clone()))
        } else if self.is_operator(user).await {
            Some(Authority::Operator(user.clone()))
        } else {
            None
        }
    }

    async fn fire(
        self: &Arc<Self>,
        action: VoteAction,
        authority: Authority,
    ) -> SessionResult<ActionOutcome> {
        info!("{} fired in {} ({:?})", action, self.destination, authority);

        match action {
            VoteAction::Skip => self.fire_skip(&authority).await?,
            VoteAction::Pause => self.fire_pause(&authority).await?,
            VoteAction::Leave => {
                let reason = match &authority {
                    Authority::Vote => CloseReason::VotedToLeave,
                    Authority::Requester(user) => CloseReason::RequesterLeave(user.clone()),
                    Authority::Operator(user) => CloseReason::OperatorLeave(user.clone()),
                };

                self.close(reason).await;
            }
        }

        Ok(ActionOutcome::Fired(action, authority))
    }

    async fn fire_skip(self: &Arc<Self>, authority: &Authority) -> SessionResult<()> {
        let skipped = {
            let mut data = self.data.lock();
            let data = &mut *data;

            data.votes.clear(VoteAction::Skip);

            if !data.state.is_active() {
                return Err(SessionError::NothingPlaying);
            }

            let current = data.current.as_mut().ok_or(SessionError::NothingPlaying)?;

            current.mark_skipped(authority.describe("skipped"));
            current.id
        };

        if let Err(e) = self.context.collaborators.engine.stop(self.destination).await {
            warn!("Failed to stop playback in {}: {}", self.destination, e);
        }

        self.spawn_advance(Advance::Skip(skipped));
        Ok(())
    }

    async fn fire_pause(self: &Arc<Self>, authority: &Authority) -> SessionResult<()> {
        let engine = &self.context.collaborators.engine;
        let paused = self.state() == SessionState::Paused;

        if paused {
            engine.resume(self.destination).await?;
        } else {
            engine.pause(self.destination).await?;
        }

        {
            let mut data = self.data.lock();
            let data = &mut *data;

            data.votes.clear(VoteAction::Pause);

            if data.state.is_active() {
                let (verb, state) = if paused {
                    ("resumed", SessionState::Playing)
                } else {
                    ("paused", SessionState::Paused)
                };

                if let Some(current) = data.current.as_mut() {
                    current.set_status(authority.describe(verb));
                }

                self.transition(data, state);
            }
        }

        self.renderer.render(self, RenderMode::Refresh).await;
        Ok(())
    }
}
