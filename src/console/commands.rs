use encore_core::{SearchSource, VoteAction};
use thiserror::Error;

/// A line typed into the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Something a listener does, e.g. `john play never gonna give you up`.
    User { name: String, action: UserAction },
    /// Makes a listener an operator.
    Grant(String),
    /// Reposts the status card.
    Bottom,
    /// Lists the queue and the recent history.
    Queue,
    /// Closes every session, announcing a restart.
    Restart,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Play { source: SearchSource, input: String },
    Vote(VoteAction),
    Force(VoteAction),
    Pick(usize),
    Cancel,
    Seek(String),
    Volume(u16),
    Shuffle,
    Defer,
    Join,
    Part,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command \"{0}\", try \"help\"")]
    Unknown(String),

    #[error("Missing {0}")]
    Missing(&'static str),

    #[error("\"{0}\" is not a valid number")]
    InvalidNumber(String),
}

pub const HELP: &str = "\
<name> play <link or search>     queue something (play-music and play-sc search elsewhere)
<name> skip | pause | leave       vote on an action
<name> force skip|pause|leave     act without a vote, if allowed
<name> pick <n> | cancel          answer your latest search prompt
<name> seek <time>                e.g. 1:30, 90, +30, -30
<name> volume <percent>           0 to 200
<name> shuffle | defer            reorder the queue
<name> join | part                enter or leave the listening room
grant <name>                      make someone an operator
bottom | queue | restart | help | quit";

impl Command {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut words = line.split_whitespace();
        let first = words.next().ok_or(ParseError::Missing("command"))?;

        let global = match first {
            "grant" => Some(Command::Grant(
                words.next().ok_or(ParseError::Missing("name"))?.to_string(),
            )),
            "bottom" => Some(Command::Bottom),
            "queue" => Some(Command::Queue),
            "restart" => Some(Command::Restart),
            "help" => Some(Command::Help),
            "quit" | "exit" => Some(Command::Quit),
            _ => None,
        };

        if let Some(command) = global {
            return Ok(command);
        }

        let verb = words.next().ok_or(ParseError::Missing("action"))?;
        let rest = words.collect::<Vec<_>>().join(" ");

        let action = match verb {
            "play" => play(SearchSource::YouTube, rest)?,
            "play-music" => play(SearchSource::YouTubeMusic, rest)?,
            "play-sc" => play(SearchSource::SoundCloud, rest)?,
            "force" => UserAction::Force(vote_action(&rest)?),
            "pick" => UserAction::Pick(number(&rest)?),
            "cancel" => UserAction::Cancel,
            "seek" => UserAction::Seek(required(rest, "time")?),
            "volume" => UserAction::Volume(number(&rest)?),
            "shuffle" => UserAction::Shuffle,
            "defer" => UserAction::Defer,
            "join" => UserAction::Join,
            "part" => UserAction::Part,
            other => UserAction::Vote(vote_action(other)?),
        };

        Ok(Command::User {
            name: first.to_string(),
            action,
        })
    }
}

fn play(source: SearchSource, input: String) -> Result<UserAction, ParseError> {
    Ok(UserAction::Play {
        source,
        input: required(input, "link or search")?,
    })
}

fn required(input: String, what: &'static str) -> Result<String, ParseError> {
    if input.is_empty() {
        return Err(ParseError::Missing(what));
    }

    Ok(input)
}

fn vote_action(word: &str) -> Result<VoteAction, ParseError> {
    match word {
        "skip" => Ok(VoteAction::Skip),
        "pause" | "resume" => Ok(VoteAction::Pause),
        "leave" => Ok(VoteAction::Leave),
        "" => Err(ParseError::Missing("action")),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}

fn number<T: std::str::FromStr>(word: &str) -> Result<T, ParseError> {
    if word.is_empty() {
        return Err(ParseError::Missing("number"));
    }

    word.parse()
        .map_err(|_| ParseError::InvalidNumber(word.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    fn user(name: &str, action: UserAction) -> Command {
        Command::User {
            name: name.to_string(),
            action,
        }
    }

    #[test]
    fn parses_listener_commands() {
        assert_eq!(
            Command::parse("john play  never gonna give you up").unwrap(),
            user(
                "john",
                UserAction::Play {
                    source: SearchSource::YouTube,
                    input: "never gonna give you up".to_string()
                }
            )
        );
        assert_eq!(
            Command::parse("mary skip").unwrap(),
            user("mary", UserAction::Vote(VoteAction::Skip))
        );
        assert_eq!(
            Command::parse("mary force leave").unwrap(),
            user("mary", UserAction::Force(VoteAction::Leave))
        );
        assert_eq!(
            Command::parse("john volume 150").unwrap(),
            user("john", UserAction::Volume(150))
        );
    }

    #[test]
    fn parses_global_commands() {
        assert_eq!(Command::parse("grant mary").unwrap(), Command::Grant("mary".to_string()));
        assert_eq!(Command::parse("  quit ").unwrap(), Command::Quit);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(Command::parse(""), Err(ParseError::Missing("command")));
        assert_eq!(Command::parse("john"), Err(ParseError::Missing("action")));
        assert_eq!(
            Command::parse("john dance"),
            Err(ParseError::Unknown("dance".to_string()))
        );
        assert_eq!(
            Command::parse("john pick two"),
            Err(ParseError::InvalidNumber("two".to_string()))
        );
        assert_eq!(
            Command::parse("john play"),
            Err(ParseError::Missing("link or search"))
        );
    }
}
