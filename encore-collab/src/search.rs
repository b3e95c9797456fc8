use encore_core::{Id, Identified, MediaItem, MessageHandle, User};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

pub type SearchId = Id<PendingSearch>;

impl Identified for PendingSearch {
    const LABEL: &'static str = "search";
}

/// A search prompt waiting for its requester to pick a candidate.
pub struct PendingSearch {
    pub id: SearchId,
    pub requester: User,
    pub candidates: Vec<MediaItem>,
    pub prompt: Option<MessageHandle>,

    timer: Option<JoinHandle<()>>,
}

/// The search prompts a session has open.
///
/// While any prompt is open, the session does not count itself as idle.
#[derive(Default)]
pub struct SearchDisambiguator {
    pending: Mutex<Vec<PendingSearch>>,
}

impl PendingSearch {
    pub fn new(requester: User, candidates: Vec<MediaItem>) -> Self {
        Self {
            id: SearchId::new(),
            requester,
            candidates,
            prompt: None,
            timer: None,
        }
    }

    /// Stops the timeout task. Safe to call after it already finished.
    pub fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl SearchDisambiguator {
    pub fn is_pending(&self) -> bool {
        !self.pending.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn insert(&self, search: PendingSearch) {
        self.pending.lock().push(search);
    }

    /// Attaches the posted prompt to a search. Returns false if the search is already gone.
    pub fn set_prompt(&self, id: SearchId, prompt: MessageHandle) -> bool {
        self.with(id, |s| s.prompt = Some(prompt)).is_some()
    }

    /// Attaches the timeout task to a search. If the search is already gone, the task is aborted.
    pub fn set_timer(&self, id: SearchId, timer: JoinHandle<()>) {
        let mut pending = self.pending.lock();

        match pending.iter_mut().find(|s| s.id == id) {
            Some(search) => search.timer = Some(timer),
            None => timer.abort(),
        }
    }

    /// Returns the requester and the number of candidates of a search.
    pub fn peek(&self, id: SearchId) -> Option<(User, usize)> {
        self.with(id, |s| (s.requester.clone(), s.candidates.len()))
    }

    /// Removes a search. Only one caller ever gets it.
    pub fn take(&self, id: SearchId) -> Option<PendingSearch> {
        let mut pending = self.pending.lock();
        let index = pending.iter().position(|s| s.id == id)?;

        Some(pending.remove(index))
    }

    pub fn drain(&self) -> Vec<PendingSearch> {
        self.pending.lock().drain(..).collect()
    }

    fn with<T>(&self, id: SearchId, f: impl FnOnce(&mut PendingSearch) -> T) -> Option<T> {
        self.pending.lock().iter_mut().find(|s| s.id == id).map(f)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    fn search() -> PendingSearch {
        PendingSearch::new(User::new(1, "john"), vec![])
    }

    #[test]
    fn searches_are_taken_once() {
        let searches = SearchDisambiguator::default();
        let search = search();
        let id = search.id;

        searches.insert(search);
        assert!(searches.is_pending());
        assert_eq!(searches.peek(id).map(|(u, n)| (u.id, n)), Some((1, 0)));

        assert!(searches.take(id).is_some());
        assert!(searches.take(id).is_none());
        assert!(!searches.is_pending());
    }

    #[tokio::test]
    async fn timers_of_missing_searches_are_aborted() {
        let searches = SearchDisambiguator::default();
        let timer = tokio::spawn(tokio::time::sleep(Duration::from_secs(60)));
        let probe = timer.abort_handle();

        searches.set_timer(SearchId::new(), timer);

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert!(probe.is_finished());
    }
}
