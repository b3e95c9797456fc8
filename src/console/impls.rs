//! Collaborators that run entirely in-process, for driving sessions from a terminal.

use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use colored::Colorize;
use crossbeam::atomic::AtomicCell;
use dashmap::DashMap;
use encore_core::{
    ChannelId, Content, DestinationId, EngineError, FinishReason, ItemId, Media, MediaItem,
    MediaResolver, MemberRoster, MessageHandle, MessagingSurface, PermissionOracle,
    PlaybackEngine, Query, Resolution, ResolveError, StatusCard, SurfaceError, User, UserId,
};
use log::info;
use parking_lot::Mutex;
use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{sleep, Instant},
};

/// Sent by the engine when an item stopped playing.
#[derive(Debug)]
pub struct Finished {
    pub destination: DestinationId,
    pub item: ItemId,
    pub reason: FinishReason,
}

struct Playback {
    item: ItemId,
    length: Option<Duration>,
    offset: Duration,
    started: Instant,
    paused: bool,
    timer: Option<JoinHandle<()>>,
}

/// Pretends to play items, reporting them finished once their length has passed.
pub struct ConsoleEngine {
    playbacks: DashMap<DestinationId, Playback>,
    volume: AtomicCell<u16>,
    finished: UnboundedSender<Finished>,
}

impl Playback {
    fn position(&self) -> Duration {
        if self.paused {
            self.offset
        } else {
            self.offset + self.started.elapsed()
        }
    }

    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl ConsoleEngine {
    pub fn new(finished: UnboundedSender<Finished>) -> Self {
        Self {
            playbacks: Default::default(),
            volume: AtomicCell::new(100),
            finished,
        }
    }

    /// Schedules the end of the item from its current position.
    fn arm(&self, destination: DestinationId, playback: &mut Playback) {
        playback.disarm();

        let Some(length) = playback.length else {
            return;
        };

        let remaining = length.saturating_sub(playback.position());
        let sender = self.finished.clone();
        let item = playback.item;

        playback.timer = Some(tokio::spawn(async move {
            sleep(remaining).await;

            let _ = sender.send(Finished {
                destination,
                item,
                reason: FinishReason::Completed,
            });
        }));
    }

    fn with_playback<T>(
        &self,
        destination: DestinationId,
        f: impl FnOnce(&mut Playback) -> T,
    ) -> Result<T, EngineError> {
        let mut playback = self
            .playbacks
            .get_mut(&destination)
            .ok_or(EngineError::NotConnected)?;

        Ok(f(&mut playback))
    }
}

#[async_trait]
impl PlaybackEngine for ConsoleEngine {
    async fn play(&self, destination: DestinationId, item: &MediaItem) -> Result<(), EngineError> {
        if item.media.title.to_lowercase().contains("unavailable") {
            return Err(EngineError::Load("This video is unavailable".to_string()));
        }

        let mut playback = Playback {
            item: item.id,
            length: item.media.length,
            offset: Duration::ZERO,
            started: Instant::now(),
            paused: false,
            timer: None,
        };

        self.arm(destination, &mut playback);

        if let Some(mut previous) = self.playbacks.insert(destination, playback) {
            previous.disarm();
        }

        Ok(())
    }

    async fn pause(&self, destination: DestinationId) -> Result<(), EngineError> {
        self.with_playback(destination, |playback| {
            playback.offset = playback.position();
            playback.paused = true;
            playback.disarm();
        })
    }

    async fn resume(&self, destination: DestinationId) -> Result<(), EngineError> {
        self.with_playback(destination, |playback| {
            playback.started = Instant::now();
            playback.paused = false;
            self.arm(destination, playback);
        })
    }

    async fn seek(&self, destination: DestinationId, offset: Duration) -> Result<(), EngineError> {
        self.with_playback(destination, |playback| {
            playback.offset = offset;
            playback.started = Instant::now();

            if !playback.paused {
                self.arm(destination, playback);
            }
        })
    }

    async fn stop(&self, destination: DestinationId) -> Result<(), EngineError> {
        let (_, mut playback) = self
            .playbacks
            .remove(&destination)
            .ok_or(EngineError::NotConnected)?;

        playback.disarm();

        // Stopped items are reported like any other
        let _ = self.finished.send(Finished {
            destination,
            item: playback.item,
            reason: FinishReason::Completed,
        });

        Ok(())
    }

    async fn set_volume(&self, _: DestinationId, percent: u16) -> Result<(), EngineError> {
        self.volume.store(percent);
        Ok(())
    }

    fn position(&self, destination: DestinationId) -> Duration {
        self.playbacks
            .get(&destination)
            .map(|p| p.position())
            .unwrap_or_default()
    }

    async fn disconnect(&self, destination: DestinationId) -> Result<(), EngineError> {
        if let Some((_, mut playback)) = self.playbacks.remove(&destination) {
            playback.disarm();
        }

        info!("Left destination {}", destination);
        Ok(())
    }
}

/// Prints everything that is posted to the terminal.
#[derive(Default)]
pub struct ConsoleSurface {
    next_id: AtomicCell<u64>,
    live: DashMap<u64, ChannelId>,
    last: DashMap<ChannelId, u64>,
}

impl ConsoleSurface {
    fn print(&self, handle: &MessageHandle, verb: &str, content: &Content) {
        let header = format!("[#{} {}]", handle.id, verb).bright_black();
        println!("{}\n{}", header, content_text(content));
    }
}

#[async_trait]
impl MessagingSurface for ConsoleSurface {
    async fn send(&self, channel: ChannelId, content: Content) -> Result<MessageHandle, SurfaceError> {
        let handle = MessageHandle {
            channel,
            id: self.next_id.fetch_add(1),
        };

        self.live.insert(handle.id, channel);
        self.last.insert(channel, handle.id);
        self.print(&handle, "new", &content);

        Ok(handle)
    }

    async fn edit(&self, handle: &MessageHandle, content: Content) -> Result<(), SurfaceError> {
        if !self.live.contains_key(&handle.id) {
            return Err(SurfaceError::NotFound);
        }

        self.print(handle, "edited", &content);
        Ok(())
    }

    async fn delete(&self, handle: &MessageHandle) -> Result<(), SurfaceError> {
        self.live.remove(&handle.id).ok_or(SurfaceError::NotFound)?;
        println!("{}", format!("[#{} deleted]", handle.id).bright_black());

        Ok(())
    }

    async fn last_message_in(&self, channel: ChannelId) -> Result<Option<MessageHandle>, SurfaceError> {
        Ok(self
            .last
            .get(&channel)
            .map(|id| *id)
            .filter(|id| self.live.contains_key(id))
            .map(|id| MessageHandle { channel, id }))
    }

    async fn notify(&self, _: ChannelId, user: &User, text: &str) -> Result<(), SurfaceError> {
        println!("{} {}", format!("(only {} can see this)", user.name).bright_black(), text);
        Ok(())
    }
}

/// Listeners and operators of the console destination.
#[derive(Default)]
pub struct ConsoleRoster {
    members: Mutex<Vec<UserId>>,
    operators: Mutex<HashSet<UserId>>,
}

impl ConsoleRoster {
    /// Adds a listener. Returns false if they were already listening.
    pub fn join(&self, user: &User) -> bool {
        let mut members = self.members.lock();

        if members.contains(&user.id) {
            return false;
        }

        members.push(user.id);
        true
    }

    pub fn part(&self, user: &User) {
        self.members.lock().retain(|id| *id != user.id);
    }

    pub fn grant(&self, user: &User) {
        self.operators.lock().insert(user.id);
    }
}

#[async_trait]
impl MemberRoster for ConsoleRoster {
    async fn members(&self, _: DestinationId) -> Vec<UserId> {
        self.members.lock().clone()
    }
}

#[async_trait]
impl PermissionOracle for ConsoleRoster {
    async fn is_operator(&self, user: &User, _: DestinationId) -> bool {
        self.operators.lock().contains(&user.id)
    }
}

/// Makes up media for any query, so sessions can be tried without a real source.
///
/// Queries containing `nothing` resolve to nothing, links with `list=` resolve to a playlist,
/// and searches containing `live` resolve to streams.
#[derive(Default)]
pub struct ConsoleResolver;

#[async_trait]
impl MediaResolver for ConsoleResolver {
    async fn resolve(&self, query: &Query) -> Result<Resolution, ResolveError> {
        let identifier = query.to_identifier();

        if identifier.contains("nothing") {
            return Err(ResolveError::NotFound);
        }

        match query {
            Query::Link(link) => Ok(resolve_link(link)),
            Query::Search { source, terms } => {
                let author = format!("{:?}", source);
                let live = terms.contains("live");

                let candidates = ["", " (Remastered)", " (Cover)", " (Slowed)"]
                    .iter()
                    .enumerate()
                    .map(|(i, suffix)| {
                        let title = format!("{}{}", terms, suffix);
                        fake_media(&title, &author, (!live).then(|| 20 + i as u64 * 5))
                    })
                    .collect();

                Ok(Resolution::Candidates(candidates))
            }
        }
    }
}

fn resolve_link(link: &str) -> Resolution {
    let name = link
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(link)
        .split(|c| c == '?' || c == '&')
        .next()
        .unwrap_or_default()
        .to_string();

    if !link.contains("list=") {
        return Resolution::Single(fake_media(&name, "uploader", Some(30)));
    }

    let items = (1..=3)
        .map(|i| fake_media(&format!("{} part {}", name, i), "uploader", Some(15)))
        .collect();

    Resolution::Playlist {
        name,
        items,
        selected: link.contains("v=").then_some(0),
    }
}

fn fake_media(title: &str, author: &str, seconds: Option<u64>) -> Media {
    Media {
        title: title.to_string(),
        author: author.to_string(),
        length: seconds.map(Duration::from_secs),
        uri: format!("https://example.com/{}", title.replace(' ', "_")),
        artwork: None,
    }
}

fn content_text(content: &Content) -> String {
    match content {
        Content::StatusCard(card) => card_text(card),
        Content::SearchPrompt(prompt) => {
            let mut lines = vec![prompt.title.bold().to_string()];

            lines.extend(
                prompt
                    .candidates
                    .iter()
                    .map(|c| format!("{:>3} {}", c.marker, c.name)),
            );

            lines.join("\n")
        }
        Content::Notice(text) => format!("> {}", text),
        Content::CloseSummary(summary) => {
            format!("{}\n{}", summary.description, summary.footer.bright_black())
        }
    }
}

/// Renders a status card as terminal lines.
pub fn card_text(card: &StatusCard) -> String {
    let mut lines: Vec<_> = card
        .entries
        .iter()
        .map(|e| format!("{:>3} {}", e.marker, e.name))
        .collect();

    if card.more > 0 {
        lines.push(format!(" ++ and {} more", card.more));
    }

    let tallies: Vec<_> = [
        ("skip", card.controls.skip),
        ("pause", card.controls.pause),
        ("leave", card.controls.leave),
    ]
    .into_iter()
    .filter_map(|(name, tally)| tally.map(|t| format!("{} {}", name, t)))
    .collect();

    let requester = format!("requested by {}", card.requester.name);
    let mut footer = vec![card.time.clone(), requester];
    footer.extend(tallies);

    lines.push(footer.join(" | ").bright_black().to_string());
    lines.join("\n")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn playlist_links_pick_the_linked_entry() {
        let Resolution::Playlist { name, items, selected } =
            resolve_link("https://example.com/watch?v=abc&list=xyz")
        else {
            panic!("expected a playlist");
        };

        assert_eq!(name, "watch");
        assert_eq!(items.len(), 3);
        assert_eq!(selected, Some(0));
    }

    #[test]
    fn plain_links_are_single_items() {
        let Resolution::Single(media) = resolve_link("https://example.com/song/") else {
            panic!("expected a single item");
        };

        assert_eq!(media.title, "song");
        assert_eq!(media.length, Some(Duration::from_secs(30)));
    }

    #[tokio::test(start_paused = true)]
    async fn items_finish_after_their_length() {
        let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();
        let engine = ConsoleEngine::new(sender);
        let item = MediaItem::new(fake_media("song", "someone", Some(10)), User::new(1, "john"));

        engine.play(1, &item).await.unwrap();
        engine.seek(1, Duration::from_secs(4)).await.unwrap();

        let finished = receiver.recv().await.unwrap();

        assert_eq!(finished.item, item.id);
        assert!(engine.position(1) >= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn unavailable_items_fail_to_load() {
        let (sender, _receiver) = tokio::sync::mpsc::unbounded_channel();
        let engine = ConsoleEngine::new(sender);
        let item = MediaItem::new(
            fake_media("unavailable", "someone", Some(10)),
            User::new(1, "john"),
        );

        assert!(matches!(
            engine.play(1, &item).await,
            Err(EngineError::Load(_))
        ));
    }
}
