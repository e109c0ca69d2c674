//! Incremental loading of the prompt list.
//!
//! A [`Feed`] holds everything the library screen shows for one tab: the
//! page cache of the current generation, client-side filters, bookmarks,
//! pagination, and mutations awaiting the server. It never performs IO.
//! Methods that need data return a [`PageRequest`]; the caller runs it
//! (see [`sequencer::fetch_page`]) and feeds the result back through
//! [`Feed::apply`]. At most one request is in flight per generation.

pub mod bookmarks;
pub mod cache;
pub mod filter;
pub mod mutation;
pub mod pagination;
pub mod prefetch;
pub mod sequencer;

#[cfg(test)]
pub mod testing;

use tracing::debug;

use crate::config::PagingConfig;
use crate::error::LoadError;
use crate::types::{
    ListPage, ListQuery, Prompt, PromptId, PromptStatus, Tab, ViewerContext, Vote,
};

use self::bookmarks::BookmarkSet;
use self::cache::PageCache;
use self::filter::{project, FilterState, ViewRule};
use self::mutation::{apply_vote, reconcile, MutationKind, PendingMutations, Snapshot};
use self::pagination::PaginationController;
use self::prefetch::{BackgroundPrefetcher, PrefetchState};
use self::sequencer::{Completion, FetchOrigin, FetchSequencer, Generation, PageRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    /// The user is waiting on a foreground page.
    Loading,
    Ready,
    /// Foreground fetch failed; cached items are still shown.
    Failed(String),
}

/// What applying a page produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub completion: Completion,
    pub next: Option<PageRequest>,
}

#[derive(Debug)]
pub struct Feed {
    tab: Tab,
    viewer: Option<ViewerContext>,
    paging: PagingConfig,
    sequencer: FetchSequencer,
    prefetcher: BackgroundPrefetcher,
    pagination: PaginationController,
    filter: FilterState,
    bookmarks: BookmarkSet,
    mutations: PendingMutations,
    status: LoadStatus,
}

impl Feed {
    pub fn new(paging: PagingConfig) -> Self {
        Self {
            tab: Tab::default(),
            viewer: None,
            sequencer: FetchSequencer::default(),
            prefetcher: BackgroundPrefetcher::new(
                paging.prefetch_batch,
                paging.max_prefetch_batches,
            ),
            pagination: PaginationController::new(paging.page_size, paging.window_size),
            filter: FilterState::default(),
            bookmarks: BookmarkSet::default(),
            mutations: PendingMutations::default(),
            status: LoadStatus::Idle,
            paging,
        }
    }

    pub fn tab(&self) -> &Tab {
        &self.tab
    }

    pub fn viewer(&self) -> Option<&ViewerContext> {
        self.viewer.as_ref()
    }

    pub fn query(&self) -> ListQuery {
        self.tab.query()
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn cache(&self) -> &PageCache {
        self.sequencer.cache()
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn bookmarks(&self) -> &BookmarkSet {
        &self.bookmarks
    }

    pub fn pagination(&self) -> &PaginationController {
        &self.pagination
    }

    pub fn prefetch_state(&self) -> PrefetchState {
        self.prefetcher.state()
    }

    pub fn is_prefetching(&self) -> bool {
        self.sequencer
            .in_flight()
            .is_some_and(|r| r.origin == FetchOrigin::Prefetch)
    }

    pub fn prompt(&self, id: PromptId) -> Option<&Prompt> {
        self.sequencer.cache().get(id)
    }

    /// Start over for `tab` as `viewer`: new generation, empty cache, page 1.
    /// Returns the first-page request.
    pub fn reset(&mut self, tab: Tab, viewer: Option<ViewerContext>) -> Option<PageRequest> {
        self.tab = tab;
        self.viewer = viewer;
        self.sequencer.begin();
        self.prefetcher.reset();
        self.pagination.reset();
        self.bookmarks.clear();
        self.mutations.clear();

        let request = self
            .sequencer
            .issue(self.paging.fetch_limit, FetchOrigin::Foreground);
        self.status = if request.is_some() {
            LoadStatus::Loading
        } else {
            LoadStatus::Ready
        };
        request
    }

    pub fn refresh(&mut self) -> Option<PageRequest> {
        self.reset(self.tab.clone(), self.viewer.clone())
    }

    /// Hand back the result of a request this feed issued.
    pub fn apply(
        &mut self,
        request: &PageRequest,
        result: Result<ListPage, LoadError>,
    ) -> Progress {
        let completion = self.sequencer.complete(request, result);
        let next = match &completion {
            Completion::Stale => None,
            Completion::Applied { added, .. } => {
                self.absorb_bookmarks(*added);
                self.prefetcher.arm();
                self.schedule(request.generation)
            }
            Completion::Shifted {
                origin: FetchOrigin::Foreground,
            } => self
                .sequencer
                .issue(self.paging.fetch_limit, FetchOrigin::Foreground),
            Completion::Shifted {
                origin: FetchOrigin::Prefetch,
            } => self.schedule(request.generation),
            Completion::Failed {
                origin: FetchOrigin::Foreground,
                error,
            } => {
                self.pagination.set_wanted(None);
                self.status = LoadStatus::Failed(error.message().to_string());
                return Progress { completion, next: None };
            }
            Completion::Failed {
                origin: FetchOrigin::Prefetch,
                error,
            } => {
                self.prefetcher.on_failure(request.generation, error);
                self.schedule(request.generation)
            }
        };

        if completion != Completion::Stale {
            self.status = match &next {
                Some(r) if r.origin == FetchOrigin::Foreground => LoadStatus::Loading,
                _ => LoadStatus::Ready,
            };
        }
        Progress { completion, next }
    }

    /// Take the server's bookmark flags from the `added` items just cached.
    /// Duplicates the cache dropped and items with a toggle still pending
    /// keep what the set already says.
    fn absorb_bookmarks(&mut self, added: usize) {
        let items = self.sequencer.cache().items();
        let fresh = &items[items.len().saturating_sub(added)..];
        let mutations = &self.mutations;
        self.bookmarks.absorb(
            fresh
                .iter()
                .filter(|p| !mutations.is_pending(p.id, MutationKind::Bookmark)),
        );
    }

    /// Pick the next request once the slot is free: a page the user is
    /// waiting on first, then read-ahead.
    fn schedule(&mut self, generation: Generation) -> Option<PageRequest> {
        if let Some(page) = self.pagination.wanted() {
            let cache = self.sequencer.cache();
            if self.pagination.exceeds_cached(page, cache.len()) && cache.has_more() {
                if let Some(request) = self
                    .sequencer
                    .issue(self.paging.fetch_limit, FetchOrigin::Foreground)
                {
                    return Some(request);
                }
            } else {
                self.pagination.set_wanted(None);
            }
        }
        self.prefetcher.next_batch(generation, &mut self.sequencer)
    }

    /// Retry after a failed foreground fetch.
    pub fn retry(&mut self) -> Option<PageRequest> {
        if !matches!(self.status, LoadStatus::Failed(_)) {
            return None;
        }
        let request = self
            .sequencer
            .issue(self.paging.fetch_limit, FetchOrigin::Foreground);
        self.status = if request.is_some() {
            LoadStatus::Loading
        } else {
            LoadStatus::Ready
        };
        request
    }

    pub fn projected(&self) -> Vec<&Prompt> {
        project(
            self.sequencer.cache().items(),
            &self.filter,
            self.viewer.as_ref(),
            &self.bookmarks,
            ViewRule::from(&self.tab),
        )
    }

    pub fn total_pages(&self) -> usize {
        self.pagination
            .total_pages(self.projected().len(), self.sequencer.cache().has_more())
    }

    pub fn page_window(&self) -> std::ops::RangeInclusive<usize> {
        self.pagination.window(self.total_pages())
    }

    /// Items of the current page of the projection.
    pub fn page_items(&self) -> Vec<&Prompt> {
        let projected = self.projected();
        self.pagination
            .page_slice(&projected, self.pagination.current())
            .to_vec()
    }

    /// Move to `page`. Fetches only when the page lies past the raw items
    /// cached so far and the server has more; an empty filtered view alone
    /// never triggers a fetch.
    pub fn request_page(&mut self, page: usize) -> Option<PageRequest> {
        let total = self.total_pages();
        let page = self.pagination.go_to(page, total);

        let cache = self.sequencer.cache();
        if !self.pagination.exceeds_cached(page, cache.len()) || !cache.has_more() {
            self.pagination.set_wanted(None);
            return None;
        }

        self.pagination.set_wanted(Some(page));
        if self.sequencer.in_flight().is_some() {
            debug!(page, "page wanted while a fetch is in flight");
            self.status = LoadStatus::Loading;
            return None;
        }
        let request = self
            .sequencer
            .issue(self.paging.fetch_limit, FetchOrigin::Foreground);
        if request.is_some() {
            self.status = LoadStatus::Loading;
        }
        request
    }

    pub fn next_page(&mut self) -> Option<PageRequest> {
        self.request_page(self.pagination.current() + 1)
    }

    pub fn prev_page(&mut self) -> Option<PageRequest> {
        self.request_page(self.pagination.current().saturating_sub(1))
    }

    /// Change filters; the view returns to page 1 and nothing is refetched.
    pub fn update_filter(&mut self, f: impl FnOnce(&mut FilterState)) {
        f(&mut self.filter);
        self.pagination.reset();
    }

    pub fn clear_filter(&mut self) {
        self.update_filter(|f| *f = FilterState::default());
    }

    /// Tentatively apply `vote`. `false` if the prompt is unknown or a vote
    /// on it is still pending.
    pub fn begin_vote(&mut self, id: PromptId, vote: Vote) -> bool {
        let Some(prompt) = self.sequencer.cache_mut().get_mut(id) else {
            return false;
        };
        let snapshot = Snapshot::capture(MutationKind::Vote, prompt);
        if !self.mutations.begin(id, MutationKind::Vote, snapshot) {
            return false;
        }
        apply_vote(prompt, vote);
        true
    }

    pub fn finish_vote(&mut self, id: PromptId, result: Result<Prompt, LoadError>) {
        self.finish(id, MutationKind::Vote, result);
    }

    pub fn begin_bookmark(&mut self, id: PromptId) -> bool {
        let Some(prompt) = self.sequencer.cache_mut().get_mut(id) else {
            return false;
        };
        let snapshot = Snapshot::capture(MutationKind::Bookmark, prompt);
        if !self.mutations.begin(id, MutationKind::Bookmark, snapshot) {
            return false;
        }
        prompt.is_bookmarked = !prompt.is_bookmarked;
        self.bookmarks.set(id, prompt.is_bookmarked);
        true
    }

    pub fn finish_bookmark(&mut self, id: PromptId, result: Result<Prompt, LoadError>) {
        self.finish(id, MutationKind::Bookmark, result);
    }

    fn finish(&mut self, id: PromptId, kind: MutationKind, result: Result<Prompt, LoadError>) {
        let snapshot = self.mutations.finish(id, kind);
        let Some(prompt) = self.sequencer.cache_mut().get_mut(id) else {
            return;
        };
        match result {
            Ok(server) => reconcile(prompt, &server, kind),
            // Without a snapshot the item was refetched after the mutation
            // began, so it already holds server state.
            Err(_) => match snapshot {
                Some(snapshot) => snapshot.restore(prompt),
                None => return,
            },
        }
        if kind == MutationKind::Bookmark {
            self.bookmarks.set(id, prompt.is_bookmarked);
        }
    }

    pub fn apply_copy_count(&mut self, id: PromptId, copy_count: u64) {
        if let Some(prompt) = self.sequencer.cache_mut().get_mut(id) {
            prompt.copy_count = copy_count;
        }
    }

    /// Reconcile an approve/reject response. On the pending tab the prompt
    /// leaves the list; elsewhere its status is updated in place.
    pub fn apply_moderation(&mut self, server: &Prompt) {
        if self.tab == Tab::Pending && server.status != PromptStatus::Pending {
            self.sequencer.remove(server.id);
        } else if let Some(prompt) = self.sequencer.cache_mut().get_mut(server.id) {
            prompt.status = server.status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::testing::{prompt, prompts, FakeBackend};
    use crate::feed::sequencer::fetch_page;

    fn paging(page_size: usize, fetch_limit: usize, prefetch_batch: usize) -> PagingConfig {
        PagingConfig {
            page_size,
            fetch_limit,
            prefetch_batch,
            max_prefetch_batches: 20,
            window_size: 4,
        }
    }

    fn viewer() -> Option<ViewerContext> {
        Some(ViewerContext {
            username: "ana".into(),
            is_admin: false,
        })
    }

    /// Run requests against the fake until the feed stops asking.
    async fn drive(feed: &mut Feed, backend: &FakeBackend, first: Option<PageRequest>) {
        let mut next = first;
        while let Some(request) = next {
            let result = fetch_page(backend, &feed.query(), &request).await;
            next = feed.apply(&request, result).next;
        }
    }

    #[tokio::test]
    async fn empty_backend_settles_immediately() {
        let backend = FakeBackend::default();
        let mut feed = Feed::new(paging(12, 60, 500));
        let first = feed.reset(Tab::Browse, viewer());
        drive(&mut feed, &backend, first).await;

        assert_eq!(backend.list_calls(), 1);
        assert!(!feed.cache().has_more());
        assert!(feed.page_items().is_empty());
        assert_eq!(feed.total_pages(), 0);
        assert_eq!(feed.status(), &LoadStatus::Ready);
        assert!(feed.request_page(1).is_none());
        assert_eq!(backend.list_calls(), 1);
    }

    #[tokio::test]
    async fn three_full_pages_then_empty() {
        let backend = FakeBackend::with_prompts(prompts(0..15));
        let mut feed = Feed::new(paging(5, 5, 5));
        let first = feed.reset(Tab::Browse, viewer());
        drive(&mut feed, &backend, first).await;

        assert_eq!(feed.cache().len(), 15);
        assert!(!feed.cache().has_more());
        assert_eq!(backend.calls(), vec![(0, 5), (5, 5), (10, 5), (15, 5)]);
        assert_eq!(feed.prefetch_state(), PrefetchState::Finished);
    }

    #[tokio::test]
    async fn prefetch_reads_ahead_in_batches() {
        let backend = FakeBackend::with_prompts(prompts(0..130));
        let mut feed = Feed::new(paging(12, 60, 50));
        let first = feed.reset(Tab::Browse, viewer());
        drive(&mut feed, &backend, first).await;

        assert_eq!(backend.calls(), vec![(0, 60), (60, 50), (110, 50)]);
        assert_eq!(feed.cache().len(), 130);
        assert_eq!(feed.total_pages(), 11);
    }

    #[test]
    fn stale_generation_does_not_leak() {
        let mut feed = Feed::new(paging(12, 60, 500));
        let old = feed.reset(Tab::Browse, viewer()).unwrap();
        let fresh = feed.reset(Tab::Mine, viewer()).unwrap();

        let progress = feed.apply(&old, Ok(prompts(100..160).into()));
        assert_eq!(progress.completion, Completion::Stale);
        assert!(progress.next.is_none());
        assert!(feed.cache().is_empty());
        assert_eq!(feed.status(), &LoadStatus::Loading);

        feed.apply(&fresh, Ok(prompts(0..3).into()));
        assert_eq!(feed.cache().len(), 3);
        assert!(feed.prompt(100).is_none());
    }

    #[test]
    fn filter_with_no_matches_does_not_fetch() {
        let mut feed = Feed::new(paging(12, 60, 500));
        let first = feed.reset(Tab::Browse, viewer()).unwrap();
        let progress = feed.apply(&first, Ok(prompts(0..60).into()));
        // let the prefetch fail so the slot is free and has_more stays true
        let batch = progress.next.unwrap();
        feed.apply(&batch, Err(LoadError::Transient("down".into())));
        assert!(feed.cache().has_more());

        feed.update_filter(|f| {
            f.categories.insert("finance".into());
        });
        assert!(feed.page_items().is_empty());
        assert_eq!(feed.total_pages(), 1);
        assert!(feed.request_page(1).is_none());
        assert!(feed.sequencer.in_flight().is_none());
    }

    #[test]
    fn page_past_cache_fetches_more() {
        let mut feed = Feed::new(paging(12, 24, 500));
        let first = feed.reset(Tab::Browse, viewer()).unwrap();
        let batch = feed.apply(&first, Ok(prompts(0..24).into())).next.unwrap();
        feed.apply(&batch, Err(LoadError::Transient("down".into())));

        assert_eq!(feed.total_pages(), 3);
        assert!(feed.request_page(2).is_none());
        let request = feed.request_page(3).unwrap();
        assert_eq!(request.origin, FetchOrigin::Foreground);
        assert_eq!(request.offset, 24);
        assert_eq!(feed.status(), &LoadStatus::Loading);

        feed.apply(&request, Ok(prompts(24..30).into()));
        assert_eq!(feed.pagination().current(), 3);
        let ids: Vec<_> = feed.page_items().iter().map(|p| p.id).collect();
        assert_eq!(ids, (24..30).collect::<Vec<_>>());
        assert_eq!(feed.status(), &LoadStatus::Ready);
    }

    #[test]
    fn wanted_page_is_served_after_inflight_batch() {
        let mut feed = Feed::new(paging(10, 10, 5));
        let first = feed.reset(Tab::Browse, viewer()).unwrap();
        let batch = feed.apply(&first, Ok(prompts(0..10).into())).next.unwrap();
        assert_eq!(batch.origin, FetchOrigin::Prefetch);

        // page 2 needs 20 items; the batch in flight brings only 15
        assert!(feed.next_page().is_none());
        assert_eq!(feed.pagination().wanted(), Some(2));
        assert_eq!(feed.status(), &LoadStatus::Loading);

        let next = feed.apply(&batch, Ok(prompts(10..15).into())).next.unwrap();
        assert_eq!(next.origin, FetchOrigin::Foreground);
        assert_eq!(next.offset, 15);
        assert_eq!(feed.status(), &LoadStatus::Loading);

        let after = feed.apply(&next, Ok(prompts(15..25).into())).next.unwrap();
        assert_eq!(feed.pagination().wanted(), None);
        assert_eq!(after.origin, FetchOrigin::Prefetch);
        assert_eq!(feed.status(), &LoadStatus::Ready);
        assert_eq!(feed.page_items().len(), 10);
    }

    #[test]
    fn foreground_failure_keeps_cache_and_retries() {
        let mut feed = Feed::new(paging(12, 12, 500));
        let first = feed.reset(Tab::Browse, viewer()).unwrap();
        let batch = feed.apply(&first, Ok(prompts(0..12).into())).next.unwrap();
        feed.apply(&batch, Err(LoadError::Transient("down".into())));

        let request = feed.request_page(2).unwrap();
        feed.apply(&request, Err(LoadError::Transient("503".into())));
        assert_eq!(feed.status(), &LoadStatus::Failed("503".into()));
        assert_eq!(feed.cache().len(), 12);

        let again = feed.retry().unwrap();
        assert_eq!(again.offset, 12);
        feed.apply(&again, Ok(prompts(12..20).into()));
        assert_eq!(feed.cache().len(), 20);
        assert_eq!(feed.status(), &LoadStatus::Ready);
    }

    #[test]
    fn first_page_failure_is_retryable() {
        let mut feed = Feed::new(paging(12, 12, 500));
        let first = feed.reset(Tab::Browse, viewer()).unwrap();
        feed.apply(&first, Err(LoadError::Transient("offline".into())));
        assert!(matches!(feed.status(), LoadStatus::Failed(_)));
        let again = feed.retry().unwrap();
        assert_eq!(again.offset, 0);
        assert!(feed.retry().is_none());
    }

    #[test]
    fn filter_change_returns_to_first_page() {
        let mut feed = Feed::new(paging(5, 20, 500));
        let first = feed.reset(Tab::Browse, viewer()).unwrap();
        feed.apply(&first, Ok(prompts(0..20).into()));
        feed.request_page(3);
        assert_eq!(feed.pagination().current(), 3);
        feed.update_filter(|f| f.search = "prompt".into());
        assert_eq!(feed.pagination().current(), 1);
    }

    #[test]
    fn bookmarks_seeded_from_pages() {
        let mut feed = Feed::new(paging(5, 5, 500));
        let first = feed.reset(Tab::Browse, viewer()).unwrap();
        let mut page = prompts(0..5);
        page[2].is_bookmarked = true;
        feed.apply(&first, Ok(page.into()));
        assert!(feed.bookmarks().contains(2));
        feed.update_filter(|f| f.bookmarked_only = true);
        assert_eq!(feed.projected().len(), 1);
    }

    #[test]
    fn overlapping_page_does_not_revive_a_removed_bookmark() {
        let mut feed = Feed::new(paging(5, 2, 2));
        let first = feed.reset(Tab::Browse, viewer()).unwrap();
        let mut saved = prompt(1);
        saved.is_bookmarked = true;
        let batch = feed
            .apply(&first, Ok(vec![prompt(0), saved.clone()].into()))
            .next
            .unwrap();
        assert!(feed.bookmarks().contains(1));

        assert!(feed.begin_bookmark(1));
        feed.finish_bookmark(1, Ok(prompt(1)));
        assert!(!feed.bookmarks().contains(1));

        // the batch was read before the toggle and still carries the old flag
        feed.apply(&batch, Ok(vec![saved, prompt(2)].into()));
        assert!(!feed.prompt(1).unwrap().is_bookmarked);
        assert!(!feed.bookmarks().contains(1));
        feed.update_filter(|f| f.bookmarked_only = true);
        assert!(feed.projected().is_empty());
    }

    #[test]
    fn duplicate_rows_in_a_page_use_the_kept_copy() {
        let mut feed = Feed::new(paging(5, 5, 500));
        let first = feed.reset(Tab::Browse, viewer()).unwrap();
        let mut dup = prompt(1);
        dup.is_bookmarked = true;
        feed.apply(&first, Ok(vec![prompt(1), dup].into()));
        assert!(!feed.prompt(1).unwrap().is_bookmarked);
        assert!(!feed.bookmarks().contains(1));
    }

    #[test]
    fn full_page_with_unparsed_rows_is_not_the_end() {
        let mut feed = Feed::new(paging(5, 5, 5));
        let first = feed.reset(Tab::Browse, viewer()).unwrap();
        let page = ListPage {
            items: prompts(0..4),
            returned: 5,
        };
        let next = feed.apply(&first, Ok(page)).next.unwrap();
        assert!(feed.cache().has_more());
        assert_eq!(next.offset, 5);
        assert_eq!(feed.total_pages(), 2);
    }

    #[test]
    fn moderation_during_prefetch_refetches_at_new_offset() {
        let mut feed = Feed::new(paging(5, 5, 5));
        let first = feed.reset(Tab::Pending, viewer()).unwrap();
        let mut page = prompts(0..5);
        for p in &mut page {
            p.status = PromptStatus::Pending;
        }
        let batch = feed.apply(&first, Ok(page.into())).next.unwrap();
        assert_eq!(batch.offset, 5);

        let mut approved = prompt(2);
        approved.status = PromptStatus::Approved;
        feed.apply_moderation(&approved);

        let progress = feed.apply(&batch, Ok(prompts(6..11).into()));
        assert_eq!(
            progress.completion,
            Completion::Shifted {
                origin: FetchOrigin::Prefetch
            }
        );
        assert!(feed.prompt(6).is_none());
        let again = progress.next.unwrap();
        assert_eq!(again.offset, 4);
        assert_eq!(again.origin, FetchOrigin::Prefetch);

        feed.apply(&again, Ok(prompts(5..10).into()));
        let ids: Vec<_> = feed.cache().items().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn vote_and_bookmark_responses_do_not_clobber() {
        let mut feed = Feed::new(paging(5, 5, 500));
        let first = feed.reset(Tab::Browse, viewer()).unwrap();
        feed.apply(&first, Ok(vec![prompt(1)].into()));

        assert!(feed.begin_vote(1, Vote::Up));
        assert!(!feed.begin_vote(1, Vote::Down));
        assert!(feed.begin_bookmark(1));
        assert_eq!(feed.prompt(1).unwrap().vote_count, 1);
        assert!(feed.bookmarks().contains(1));

        // bookmark response lands first and already includes the vote
        let mut after_bookmark = prompt(1);
        after_bookmark.is_bookmarked = true;
        after_bookmark.user_vote = Vote::Up;
        after_bookmark.vote_count = 1;
        feed.finish_bookmark(1, Ok(after_bookmark));

        // vote response was computed before the bookmark
        let mut after_vote = prompt(1);
        after_vote.user_vote = Vote::Up;
        after_vote.vote_count = 1;
        after_vote.like_count = 1;
        after_vote.is_bookmarked = false;
        feed.finish_vote(1, Ok(after_vote));

        let p = feed.prompt(1).unwrap();
        assert!(p.is_bookmarked);
        assert!(feed.bookmarks().contains(1));
        assert_eq!(p.user_vote, Vote::Up);
        assert_eq!(p.like_count, 1);
    }

    #[test]
    fn failed_vote_rolls_back() {
        let mut feed = Feed::new(paging(5, 5, 500));
        let first = feed.reset(Tab::Browse, viewer()).unwrap();
        let mut p = prompt(1);
        p.vote_count = 7;
        feed.apply(&first, Ok(vec![p].into()));

        feed.begin_vote(1, Vote::Down);
        assert_eq!(feed.prompt(1).unwrap().vote_count, 6);
        feed.finish_vote(1, Err(LoadError::Transient("nope".into())));
        let p = feed.prompt(1).unwrap();
        assert_eq!((p.user_vote, p.vote_count), (Vote::None, 7));
        assert!(feed.begin_vote(1, Vote::Up));
    }

    #[test]
    fn failed_bookmark_rolls_back_set() {
        let mut feed = Feed::new(paging(5, 5, 500));
        let first = feed.reset(Tab::Browse, viewer()).unwrap();
        feed.apply(&first, Ok(vec![prompt(1)].into()));
        feed.begin_bookmark(1);
        feed.finish_bookmark(1, Err(LoadError::Transient("nope".into())));
        assert!(!feed.bookmarks().contains(1));
        assert!(!feed.prompt(1).unwrap().is_bookmarked);
    }

    #[test]
    fn late_failure_after_reset_is_ignored() {
        let mut feed = Feed::new(paging(5, 5, 500));
        let first = feed.reset(Tab::Browse, viewer()).unwrap();
        feed.apply(&first, Ok(vec![prompt(1)].into()));
        feed.begin_vote(1, Vote::Up);

        let again = feed.refresh().unwrap();
        let mut fresh = prompt(1);
        fresh.user_vote = Vote::Up;
        fresh.vote_count = 1;
        feed.apply(&again, Ok(vec![fresh].into()));

        feed.finish_vote(1, Err(LoadError::Transient("late".into())));
        assert_eq!(feed.prompt(1).unwrap().vote_count, 1);
    }

    #[test]
    fn moderation_on_pending_tab_removes() {
        let mut feed = Feed::new(paging(5, 5, 500));
        let first = feed.reset(Tab::Pending, viewer()).unwrap();
        let mut page = prompts(0..5);
        for p in &mut page {
            p.status = PromptStatus::Pending;
        }
        feed.apply(&first, Ok(page.into()));
        let offset = feed.cache().next_offset();

        let mut approved = prompt(2);
        approved.status = PromptStatus::Approved;
        feed.apply_moderation(&approved);
        assert!(feed.prompt(2).is_none());
        assert_eq!(feed.cache().next_offset(), offset - 1);
    }

    #[test]
    fn moderation_elsewhere_updates_in_place() {
        let mut feed = Feed::new(paging(5, 5, 500));
        let first = feed.reset(Tab::Approved, viewer()).unwrap();
        feed.apply(&first, Ok(prompts(0..2).into()));
        let mut rejected = prompt(1);
        rejected.status = PromptStatus::Rejected;
        feed.apply_moderation(&rejected);
        assert_eq!(feed.prompt(1).unwrap().status, PromptStatus::Rejected);
    }

    #[test]
    fn copy_count_reconciles() {
        let mut feed = Feed::new(paging(5, 5, 500));
        let first = feed.reset(Tab::Browse, viewer()).unwrap();
        feed.apply(&first, Ok(vec![prompt(1)].into()));
        feed.apply_copy_count(1, 42);
        assert_eq!(feed.prompt(1).unwrap().copy_count, 42);
    }
}
