use std::time::Duration;

use encore_core::{
    fmt_time, CardEntry, Controls, MediaItem, PlaybackQueue, QueueSign, SearchPrompt, StatusCard,
    Tally,
};

use crate::SessionState;

/// Vote tallies shown on the control buttons.
#[derive(Debug, Clone, Copy)]
pub struct CardTallies {
    pub skip: Tally,
    pub pause: Tally,
    pub leave: Tally,
}

/// Builds a card entry for an item.
pub fn entry(marker: String, item: &MediaItem) -> CardEntry {
    let status = item
        .status()
        .map(|m| format!(", {}", m))
        .unwrap_or_default();

    CardEntry {
        marker,
        name: item.media.display_name(),
        uri: item.media.uri.clone(),
        details: format!(
            "{}: [{}{}] {}: {}",
            item.requester.name,
            item.media.length_text(),
            status,
            item.media.author,
            item.media.title
        ),
    }
}

/// Builds the status card of a session.
///
/// The card lists recent history, the current item, and the first upcoming items. When the
/// queue does not fit, the last slot is used for a count of what is left.
pub fn status_card(
    queue: &PlaybackQueue,
    current: &MediaItem,
    state: SessionState,
    position: Duration,
    tallies: CardTallies,
    upcoming_limit: usize,
) -> StatusCard {
    let mut position = position;

    let now_marker = match state {
        SessionState::Paused => "||".to_string(),
        SessionState::Playing => ">>".to_string(),
        _ => {
            // A normally finished item is shown as played to the end
            if current.sign() == QueueSign::Normal {
                position = current.media.length.unwrap_or(position);
            }

            format!("{}.", current.sign())
        }
    };

    let mut entries: Vec<_> = queue
        .history()
        .map(|i| entry(format!("{}.", i.sign()), i))
        .collect();

    entries.push(entry(now_marker, current));

    let shown = if queue.len() > upcoming_limit {
        upcoming_limit.saturating_sub(1)
    } else {
        queue.len()
    };

    entries.extend(
        queue
            .items()
            .take(shown)
            .enumerate()
            .map(|(i, item)| entry(format!("{}.", i + 1), item)),
    );

    let time = if current.is_live() {
        "Live".to_string()
    } else {
        format!("{} / {}", fmt_time(position), current.media.length_text())
    };

    StatusCard {
        entries,
        more: queue.len() - shown,
        time,
        artwork: current.media.artwork.clone(),
        requester: current.requester.clone(),
        controls: Controls {
            playing: state.is_active(),
            paused: state == SessionState::Paused,
            seekable: state.is_active() && !current.is_live(),
            skip: tallies.skip.if_any(),
            pause: tallies.pause.if_any(),
            leave: tallies.leave.if_any(),
        },
    }
}

/// Builds the prompt for picking one of several search results.
pub fn search_prompt(candidates: &[MediaItem]) -> SearchPrompt {
    SearchPrompt {
        title: "Choose a result".to_string(),
        candidates: candidates
            .iter()
            .enumerate()
            .map(|(i, item)| entry(format!("{}.", i + 1), item))
            .collect(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::item;

    fn tallies(skip: usize) -> CardTallies {
        let tally = |votes| Tally { votes, required: 2 };

        CardTallies {
            skip: tally(skip),
            pause: tally(0),
            leave: tally(0),
        }
    }

    fn markers(card: &StatusCard) -> Vec<&str> {
        card.entries.iter().map(|e| e.marker.as_str()).collect()
    }

    #[test]
    fn lists_history_current_and_upcoming() {
        let mut queue = PlaybackQueue::new(2);
        let mut skipped = item("skipped");
        skipped.mark_skipped("skipped by vote");

        queue.retire(item("played"));
        queue.retire(skipped);
        queue.extend(["next", "after"].map(item));

        let card = status_card(
            &queue,
            &item("current"),
            SessionState::Playing,
            Duration::from_secs(90),
            tallies(1),
            6,
        );

        assert_eq!(markers(&card), vec![".", "S.", ">>", "1.", "2."]);
        assert_eq!(card.more, 0);
        assert_eq!(card.time, "01:30 / 03:20");
        assert_eq!(card.controls.skip, Some(Tally { votes: 1, required: 2 }));
        assert_eq!(card.controls.pause, None);
        assert!(card.entries[1].details.ends_with("[03:20, skipped by vote] someone: skipped"));
    }

    #[test]
    fn long_queues_are_cut_off() {
        let mut queue = PlaybackQueue::new(2);
        queue.extend((0..10).map(|i| item(&i.to_string())));

        let card = status_card(
            &queue,
            &item("current"),
            SessionState::Paused,
            Duration::ZERO,
            tallies(0),
            6,
        );

        assert_eq!(markers(&card), vec!["||", "1.", "2.", "3.", "4.", "5."]);
        assert_eq!(card.more, 5);
        assert!(card.controls.paused);
    }

    #[test]
    fn finished_items_show_their_full_length() {
        let queue = PlaybackQueue::new(2);

        let card = status_card(
            &queue,
            &item("current"),
            SessionState::Awaiting,
            Duration::from_secs(3),
            tallies(0),
            6,
        );

        assert_eq!(markers(&card), vec!["."]);
        assert_eq!(card.time, "03:20 / 03:20");
        assert!(!card.controls.playing);
        assert!(!card.controls.seekable);
    }
}
