use std::{fmt::Display, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{fmt_time, Id, Identified, User};

pub type ItemId = Id<MediaItem>;

impl Identified for MediaItem {
    const LABEL: &'static str = "item";
}

/// A resolved unit of media, as handed out by a [crate::MediaResolver].
///
/// This is never mutated after resolution; per-session annotations live on [MediaItem].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub title: String,
    pub author: String,
    /// The length of the media, or `None` if it is a live stream.
    pub length: Option<Duration>,
    pub uri: String,
    pub artwork: Option<String>,
}

/// A one-character marker shown next to an item on the status card.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueueSign {
    #[default]
    Normal,
    Skipped,
    Errored,
}

/// A [Media] owned by a session, with the requester and render annotations attached.
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub id: ItemId,
    pub media: Arc<Media>,
    pub requester: User,

    sign: QueueSign,
    status: Option<String>,
}

impl Media {
    pub fn is_live(&self) -> bool {
        self.length.is_none()
    }

    /// Returns a name suitable for listing, in the form `Author - Title`.
    ///
    /// The author is left out if the title already mentions it or looks like it is
    /// already in that form.
    pub fn display_name(&self) -> String {
        let name = if self.title.to_lowercase().contains(&self.author.to_lowercase())
            || self.title.contains(" - ")
        {
            self.title.clone()
        } else {
            format!("{} - {}", self.author, self.title)
        };

        name.replace(" - Topic - ", " - ")
            .replace('[', "(")
            .replace(']', ")")
    }

    /// Returns the length as text, or `Live` for streams.
    pub fn length_text(&self) -> String {
        self.length.map(fmt_time).unwrap_or_else(|| "Live".to_string())
    }
}

impl QueueSign {
    pub fn as_char(&self) -> char {
        match self {
            Self::Normal => '.',
            Self::Skipped => 'S',
            Self::Errored => '!',
        }
    }
}

impl Display for QueueSign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl MediaItem {
    pub fn new(media: impl Into<Arc<Media>>, requester: User) -> Self {
        Self {
            id: ItemId::new(),
            media: media.into(),
            requester,
            sign: QueueSign::Normal,
            status: None,
        }
    }

    pub fn sign(&self) -> QueueSign {
        self.sign
    }

    /// The short message shown next to this item on the next render, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn mark_skipped(&mut self, message: impl Into<String>) {
        self.sign = QueueSign::Skipped;
        self.set_status(message);
    }

    pub fn mark_errored(&mut self, reason: impl Into<String>) {
        self.sign = QueueSign::Errored;
        self.set_status(reason);
    }

    pub fn is_live(&self) -> bool {
        self.media.is_live()
    }

    /// Whether the given user asked for this item.
    pub fn requested_by(&self, user: &User) -> bool {
        self.requester.id == user.id
    }
}

#[cfg(test)]
pub(crate) fn mock_media(title: &str) -> Media {
    Media {
        title: title.to_string(),
        author: "someone".to_string(),
        length: Some(Duration::from_secs(200)),
        uri: format!("https://example.com/{}", title),
        artwork: None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn media(author: &str, title: &str) -> Media {
        Media {
            title: title.to_string(),
            author: author.to_string(),
            length: None,
            uri: String::new(),
            artwork: None,
        }
    }

    #[test]
    fn display_name_avoids_repeating_the_author() {
        assert_eq!(media("Daft Punk", "One More Time").display_name(), "Daft Punk - One More Time");
        assert_eq!(media("Daft Punk", "daft punk one more time").display_name(), "daft punk one more time");
        assert_eq!(media("Uploader", "Artist - Song").display_name(), "Artist - Song");
        assert_eq!(media("x", "Song [Official]").display_name(), "x - Song (Official)");
    }

    #[test]
    fn annotations_do_not_touch_the_media() {
        let mut item = MediaItem::new(mock_media("song"), User::new(1, "john"));

        assert_eq!(item.sign(), QueueSign::Normal);
        assert_eq!(item.status(), None);

        item.mark_errored("decoder exploded");

        assert_eq!(item.sign().as_char(), '!');
        assert_eq!(item.status(), Some("decoder exploded"));
        assert_eq!(item.media.title, "song");
        assert_eq!(media("a", "b").length_text(), "Live");
    }
}
