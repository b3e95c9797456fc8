use async_trait::async_trait;
use thiserror::Error;

use crate::Media;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Nothing matched the query")]
    NotFound,

    #[error("Source is unavailable: {0}")]
    SourceUnavailable(String),
}

/// Where free-text queries are searched.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SearchSource {
    #[default]
    YouTube,
    YouTubeMusic,
    SoundCloud,
}

/// A user query, shaped for the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// A direct link, passed through untouched.
    Link(String),
    /// Free text to search for.
    Search { source: SearchSource, terms: String },
}

/// What a query resolved to.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Exactly one match.
    Single(Media),
    /// Several plausible matches; the requester has to pick one.
    Candidates(Vec<Media>),
    /// A list of media, optionally with one entry the link pointed at.
    Playlist {
        name: String,
        items: Vec<Media>,
        selected: Option<usize>,
    },
}

/// Turns queries and links into playable media.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, query: &Query) -> Result<Resolution, ResolveError>;
}

impl SearchSource {
    /// The prefix the resolver understands for this source.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::YouTube => "ytsearch",
            Self::YouTubeMusic => "ytmsearch",
            Self::SoundCloud => "scsearch",
        }
    }
}

impl Query {
    pub fn new(input: &str, source: SearchSource) -> Self {
        let input = input.trim();

        if input.starts_with("http://") || input.starts_with("https://") {
            Self::Link(input.to_string())
        } else {
            Self::Search {
                source,
                terms: input.to_string(),
            }
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, Self::Link(_))
    }

    /// The query in the `source:terms` form used by lavalink-style resolvers.
    pub fn to_identifier(&self) -> String {
        match self {
            Self::Link(link) => link.clone(),
            Self::Search { source, terms } => format!("{}:{}", source.prefix(), terms),
        }
    }

    /// What to tell the requester when this query resolved to nothing.
    pub fn failure_notice(&self) -> &'static str {
        if self.is_link() {
            "Invalid link, or download was blocked."
        } else {
            "No search results."
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn links_pass_through() {
        let query = Query::new(" https://youtu.be/z09GolEktUw ", SearchSource::SoundCloud);

        assert_eq!(query, Query::Link("https://youtu.be/z09GolEktUw".to_string()));
        assert_eq!(query.to_identifier(), "https://youtu.be/z09GolEktUw");
        assert_eq!(query.failure_notice(), "Invalid link, or download was blocked.");
    }

    #[test]
    fn text_becomes_a_search() {
        let query = Query::new("never gonna give you up", SearchSource::YouTubeMusic);

        assert_eq!(query.to_identifier(), "ytmsearch:never gonna give you up");
        assert_eq!(query.failure_notice(), "No search results.");
        assert_eq!(
            Query::new("x", Default::default()).to_identifier(),
            "ytsearch:x"
        );
    }
}
