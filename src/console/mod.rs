mod commands;
mod impls;

use std::sync::Arc;

use anyhow::Context;
use crossbeam::atomic::AtomicCell;
use dashmap::DashMap;
use encore_collab::{Collab, Collaborators, Enqueued, SearchId, SessionError};
use encore_core::{ChannelId, Config, Cooldowns, DestinationId, Query, User, UserId};
use log::{info, warn};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc::{unbounded_channel, UnboundedReceiver},
};

pub use commands::*;
pub use impls::*;

/// The console drives a single destination, posting to a single channel.
const DESTINATION: DestinationId = 1;
const CHANNEL: ChannelId = 1;

/// A terminal front-end for the session engine, with every collaborator in-process.
pub struct Console {
    collab: Arc<Collab>,
    roster: Arc<ConsoleRoster>,
    users: DashMap<String, User>,
    next_user: AtomicCell<UserId>,
    /// The latest search prompt of each user, answered by `pick` and `cancel`.
    searches: DashMap<UserId, SearchId>,
}

impl Console {
    /// Creates the console, and the receiver of the items its engine finished.
    pub fn new(config: Config) -> (Arc<Self>, UnboundedReceiver<Finished>) {
        let (sender, receiver) = unbounded_channel();
        let roster = Arc::new(ConsoleRoster::default());

        let collaborators = Collaborators {
            resolver: Arc::new(ConsoleResolver),
            engine: Arc::new(ConsoleEngine::new(sender)),
            surface: Arc::new(ConsoleSurface::default()),
            roster: roster.clone(),
            permissions: roster.clone(),
        };

        let console = Self {
            collab: Arc::new(Collab::new(config, collaborators, Cooldowns::new())),
            roster,
            users: Default::default(),
            next_user: AtomicCell::new(1),
            searches: Default::default(),
        };

        (Arc::new(console), receiver)
    }

    pub fn collab(&self) -> &Arc<Collab> {
        &self.collab
    }

    /// Forwards finished items to their sessions until the engine goes away.
    pub async fn forward_finished(self: Arc<Self>, mut receiver: UnboundedReceiver<Finished>) {
        while let Some(finished) = receiver.recv().await {
            let collab = self.collab.clone();

            tokio::spawn(async move {
                let result = collab
                    .sessions
                    .on_finished(finished.destination, finished.item, finished.reason)
                    .await;

                if let Err(e) = result {
                    warn!("Could not advance after {}: {}", finished.item, e);
                }
            });
        }
    }

    /// Reads commands from stdin until `quit` or the end of input.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("{}", HELP);

        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            if line.trim().is_empty() {
                continue;
            }

            match Command::parse(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => self.clone().execute(command).await,
                Err(e) => warn!("{}", e),
            }
        }

        self.collab.sessions.close_all().await;
        Ok(())
    }

    async fn execute(self: Arc<Self>, command: Command) {
        match command {
            Command::User { name, action } => {
                let user = self.user(&name);

                match action {
                    // Requests wait for playback to start, so they run on their own
                    UserAction::Play { .. } | UserAction::Pick(_) => {
                        tokio::spawn(async move {
                            if let Err(e) = self.act(&user, action).await {
                                warn!("{}: {}", user.name, e);
                            }
                        });
                    }
                    _ => {
                        if let Err(e) = self.act(&user, action).await {
                            warn!("{}: {}", user.name, e);
                        }
                    }
                }
            }
            Command::Grant(name) => {
                let user = self.user(&name);
                self.roster.grant(&user);

                info!("{} is now an operator", user.name);
            }
            Command::Bottom => {
                let result = match self.collab.sessions.get(DESTINATION) {
                    Ok(session) => session.push_to_bottom().await,
                    Err(e) => Err(e),
                };

                if let Err(e) = result {
                    warn!("{}", e);
                }
            }
            Command::Queue => self.print_queue(),
            Command::Restart => self.collab.sessions.close_all().await,
            Command::Help => println!("{}", HELP),
            Command::Quit => {}
        }
    }

    async fn act(&self, user: &User, action: UserAction) -> Result<(), SessionError> {
        let sessions = &self.collab.sessions;

        match action {
            UserAction::Play { source, input } => {
                if self.roster.join(user) {
                    sessions.on_member_change(DESTINATION).await;
                }

                let query = Query::new(&input, source);
                let enqueued = sessions
                    .enqueue_request(DESTINATION, CHANNEL, query, user.clone())
                    .await?;

                if let Enqueued::Prompted(id) = enqueued {
                    self.searches.insert(user.id, id);
                }
            }
            UserAction::Vote(action) => {
                let outcome = sessions.get(DESTINATION)?.vote(user, action).await?;
                info!("{} voted to {}: {:?}", user.name, action, outcome);
            }
            UserAction::Force(action) => {
                let outcome = sessions.get(DESTINATION)?.force_action(user, action).await?;
                info!("{} forced {}: {:?}", user.name, action, outcome);
            }
            UserAction::Pick(choice) => {
                let id = self.latest_search(user)?;

                // Prompts are numbered from 1
                sessions
                    .get(DESTINATION)?
                    .answer_search(id, user, choice.saturating_sub(1))
                    .await?;
            }
            UserAction::Cancel => {
                let id = self.latest_search(user)?;
                sessions.get(DESTINATION)?.cancel_search(id, user).await?;
            }
            UserAction::Seek(input) => sessions.get(DESTINATION)?.seek(user, &input).await?,
            UserAction::Volume(percent) => {
                sessions.get(DESTINATION)?.set_volume(user, percent).await?
            }
            UserAction::Shuffle => sessions.get(DESTINATION)?.shuffle(user).await?,
            UserAction::Defer => sessions.get(DESTINATION)?.defer_next(user).await?,
            UserAction::Join => {
                self.roster.join(user);
                sessions.on_member_change(DESTINATION).await;
            }
            UserAction::Part => {
                self.roster.part(user);
                sessions.on_member_change(DESTINATION).await;
            }
        }

        Ok(())
    }

    fn latest_search(&self, user: &User) -> Result<SearchId, SessionError> {
        self.searches
            .get(&user.id)
            .map(|id| *id)
            .ok_or(SessionError::SearchNotFound)
    }

    fn print_queue(&self) {
        let Ok(session) = self.collab.sessions.get(DESTINATION) else {
            println!("Nothing is playing.");
            return;
        };

        for item in session.history() {
            println!("  {} {}", item.sign(), item.media.display_name());
        }

        if let Some(item) = session.current_item() {
            println!(">> {} [{:?}]", item.media.display_name(), session.state());
        }

        for (i, item) in session.queued_items().iter().enumerate() {
            println!("{:>2}. {} ({})", i + 1, item.media.display_name(), item.requester.name);
        }
    }

    /// Looks up a user by name, making one up the first time it is seen.
    fn user(&self, name: &str) -> User {
        self.users
            .entry(name.to_lowercase())
            .or_insert_with(|| User::new(self.next_user.fetch_add(1), name))
            .clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn users_keep_their_id() {
        let (console, _finished) = Console::new(Config::default());

        let john = console.user("john");
        let mary = console.user("mary");

        assert_ne!(john.id, mary.id);
        assert_eq!(console.user("John").id, john.id);
    }
}
