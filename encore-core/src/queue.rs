use std::collections::VecDeque;

use rand::{seq::SliceRandom, thread_rng};
use thiserror::Error;

use crate::{MediaItem, User};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("The queue is empty")]
    EmptyQueue,
}

/// Items waiting to be played, and a short history of items that already were.
///
/// The queue is first in, first out, unless explicitly reordered.
#[derive(Debug)]
pub struct PlaybackQueue {
    items: VecDeque<MediaItem>,
    history: VecDeque<MediaItem>,
    history_size: usize,
}

impl PlaybackQueue {
    pub fn new(history_size: usize) -> Self {
        Self {
            items: Default::default(),
            history: Default::default(),
            history_size,
        }
    }

    /// Appends an item to the end of the queue.
    pub fn enqueue(&mut self, item: MediaItem) {
        self.items.push_back(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = MediaItem>) {
        self.items.extend(items);
    }

    /// Removes and returns the next item.
    pub fn pop_next(&mut self) -> Result<MediaItem, QueueError> {
        self.items.pop_front().ok_or(QueueError::EmptyQueue)
    }

    /// Moves the next item to the end of the queue, keeping the order of the rest.
    pub fn push_to_bottom(&mut self) -> Result<(), QueueError> {
        let item = self.pop_next()?;
        self.items.push_back(item);

        Ok(())
    }

    pub fn shuffle(&mut self) {
        self.items.make_contiguous().shuffle(&mut thread_rng());
    }

    /// Records an item that stopped playing. Only the most recent ones are kept.
    pub fn retire(&mut self, item: MediaItem) {
        self.history.push_back(item);

        while self.history.len() > self.history_size {
            self.history.pop_front();
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &MediaItem> {
        self.items.iter()
    }

    /// Recently played items, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &MediaItem> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether every queued item was requested by the given user. True for an empty queue.
    pub fn all_requested_by(&self, user: &User) -> bool {
        self.items.iter().all(|i| i.requested_by(user))
    }
}
