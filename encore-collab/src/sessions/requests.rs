use std::sync::Arc;

use encore_core::{Content, Media, MediaItem, Query, Resolution, User};
use log::{debug, info};
use tokio::time::sleep;

use crate::{search_prompt, PendingSearch, RenderMode, SearchId};

use super::{session::Advance, Enqueued, Session, SessionError, SessionResult};

impl Session {
    /// Resolves a query and queues the result.
    ///
    /// Several search results are put up for the requester to choose from. When nothing is
    /// found, the requester is told so and the session carries on.
    pub async fn enqueue_request(self: &Arc<Self>, query: Query, requester: User) -> SessionResult<Enqueued> {
        self.ensure_open()?;

        debug!("Resolving {} for {}", query.to_identifier(), requester.name);

        let resolution = match self.context.collaborators.resolver.resolve(&query).await {
            Ok(resolution) => resolution,
            Err(e) => {
                info!("Could not resolve {}: {}", query.to_identifier(), e);

                self.send_notice(query.failure_notice().to_string()).await;
                self.spawn_advance(Advance::Kick);

                return Ok(Enqueued::Nothing);
            }
        };

        match resolution {
            Resolution::Single(media) => self.enqueue_single(media, requester).await,
            Resolution::Candidates(mut candidates) => {
                candidates.truncate(self.context.config.max_search_candidates);

                match candidates.len() {
                    0 => {
                        self.send_notice(query.failure_notice().to_string()).await;
                        self.spawn_advance(Advance::Kick);

                        Ok(Enqueued::Nothing)
                    }
                    1 => {
                        let media = candidates.remove(0);
                        self.enqueue_single(media, requester).await
                    }
                    _ => self.prompt_search(candidates, requester).await,
                }
            }
            Resolution::Playlist {
                name,
                items,
                selected,
            } => {
                if let Some(media) = selected.and_then(|i| items.get(i)).cloned() {
                    return self.enqueue_single(media, requester).await;
                }

                let count = items.len();
                let items = items
                    .into_iter()
                    .map(|m| MediaItem::new(m, requester.clone()));

                self.enqueue_items(items).await?;
                self.send_notice(format!("Enqueued {} songs from: {}", count, name))
                    .await;

                Ok(Enqueued::Playlist { name, count })
            }
        }
    }

    /// Picks one of the candidates of a search prompt. Only the requester may answer.
    pub async fn answer_search(
        self: &Arc<Self>,
        id: SearchId,
        user: &User,
        choice: usize,
    ) -> SessionResult<Enqueued> {
        self.ensure_open()?;

        let (requester, count) = self.searches.peek(id).ok_or(SessionError::SearchNotFound)?;

        if requester.id != user.id {
            let notice = format!("This search is for {}, not for you.", requester.name);
            self.notify(user, &notice).await;

            return Err(SessionError::NotSearchRequester);
        }

        if choice >= count {
            return Err(SessionError::InvalidChoice(choice));
        }

        // Whoever takes the search first wins against the timeout
        let mut search = self.searches.take(id).ok_or(SessionError::SearchNotFound)?;
        search.cancel_timer();

        let item = search.candidates.swap_remove(choice);
        info!("{} picked {}", user.name, item.media.title);

        if let Some(prompt) = search.prompt {
            let content = Content::Notice(format!("Enqueued {}", item.media.display_name()));

            if let Err(e) = self.context.collaborators.surface.edit(&prompt, content).await {
                debug!("Failed to edit search prompt: {}", e);
            }
        }

        self.enqueue_items([item.clone()]).await?;
        Ok(Enqueued::Single(item))
    }

    /// Dismisses a search prompt without queueing anything. Only the requester may cancel.
    pub async fn cancel_search(self: &Arc<Self>, id: SearchId, user: &User) -> SessionResult<()> {
        let (requester, _) = self.searches.peek(id).ok_or(SessionError::SearchNotFound)?;

        if requester.id != user.id {
            return Err(SessionError::NotSearchRequester);
        }

        if let Some(search) = self.searches.take(id) {
            self.dismiss(search).await;
        }

        self.spawn_advance(Advance::Kick);
        Ok(())
    }

    async fn enqueue_single(self: &Arc<Self>, media: Media, requester: User) -> SessionResult<Enqueued> {
        let item = MediaItem::new(media, requester);

        self.enqueue_items([item.clone()]).await?;
        self.send_notice(format!("Enqueued {}", item.media.display_name()))
            .await;

        Ok(Enqueued::Single(item))
    }

    /// Appends items to the queue and makes sure the session is playing.
    async fn enqueue_items(
        self: &Arc<Self>,
        items: impl IntoIterator<Item = MediaItem>,
    ) -> SessionResult<()> {
        self.data.lock().queue.extend(items);

        self.emit_queue_update();
        self.renderer.render(self, RenderMode::Progress).await;
        self.kick().await
    }

    async fn prompt_search(
        self: &Arc<Self>,
        candidates: Vec<Media>,
        requester: User,
    ) -> SessionResult<Enqueued> {
        let candidates: Vec<_> = candidates
            .into_iter()
            .map(|m| MediaItem::new(m, requester.clone()))
            .collect();

        let content = Content::SearchPrompt(search_prompt(&candidates));
        let search = PendingSearch::new(requester, candidates);
        let id = search.id;

        // Registered before posting, so the session never looks idle in between
        self.searches.insert(search);

        match self.context.collaborators.surface.send(self.channel, content).await {
            Ok(prompt) => {
                // The search was answered or dropped while the prompt was being posted
                if !self.searches.set_prompt(id, prompt) {
                    if let Err(e) = self.context.collaborators.surface.delete(&prompt).await {
                        debug!("Failed to delete search prompt: {}", e);
                    }
                }
            }
            Err(e) => debug!("Failed to send search prompt: {}", e),
        }

        let session = Arc::downgrade(self);
        let timeout = self.context.config.search_timeout();

        let timer = tokio::spawn(async move {
            sleep(timeout).await;

            if let Some(session) = session.upgrade() {
                session.expire_search(id).await;
            }
        });

        self.searches.set_timer(id, timer);
        info!("Prompted {} in {}", id, self.destination);

        Ok(Enqueued::Prompted(id))
    }

    async fn expire_search(self: &Arc<Self>, id: SearchId) {
        let Some(search) = self.searches.take(id) else {
            return;
        };

        info!("{} in {} timed out", id, self.destination);

        self.dismiss(search).await;
        self.spawn_advance(Advance::Kick);
    }

    async fn dismiss(&self, mut search: PendingSearch) {
        search.cancel_timer();

        if let Some(prompt) = search.prompt {
            if let Err(e) = self.context.collaborators.surface.delete(&prompt).await {
                debug!("Failed to delete search prompt: {}", e);
            }
        }
    }

    pub(crate) async fn send_notice(&self, text: String) {
        if let Err(e) = self
            .context
            .collaborators
            .surface
            .send(self.channel, Content::Notice(text))
            .await
        {
            debug!("Failed to send notice: {}", e);
        }
    }

    async fn notify(&self, user: &User, text: &str) {
        if let Err(e) = self
            .context
            .collaborators
            .surface
            .notify(self.channel, user, text)
            .await
        {
            debug!("Failed to notify {}: {}", user.name, e);
        }
    }
}
