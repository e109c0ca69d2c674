use tracing::{debug, warn};

use crate::backend::PromptBackend;
use crate::error::LoadError;
use crate::feed::cache::PageCache;
use crate::types::{ListPage, ListQuery, Prompt, PromptId};

/// Logical clock for "the current query". Bumped on every tab or viewer
/// change; responses carrying an older value are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    /// The user is waiting on this page.
    Foreground,
    /// Best-effort read-ahead.
    Prefetch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: Generation,
    pub offset: usize,
    pub limit: usize,
    pub origin: FetchOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Belonged to a superseded generation; nothing changed.
    Stale,
    Applied { added: usize, got_full: bool },
    /// The cursor moved back while the request was out, so its offset no
    /// longer lines up with the server list. The page was discarded.
    Shifted { origin: FetchOrigin },
    Failed { origin: FetchOrigin, error: LoadError },
}

/// Owns the page cache of the current generation and the single
/// in-flight slot. Performs no IO itself: callers run [`fetch_page`] for
/// each issued request and hand the result back to [`FetchSequencer::complete`].
#[derive(Debug, Default)]
pub struct FetchSequencer {
    generation: Generation,
    cache: PageCache,
    in_flight: Option<PageRequest>,
    /// Set when an item left the cache while `in_flight` was out.
    shifted: bool,
}

impl FetchSequencer {
    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut PageCache {
        &mut self.cache
    }

    pub fn in_flight(&self) -> Option<&PageRequest> {
        self.in_flight.as_ref()
    }

    /// Start a new generation. The old cache is gone before anything of the
    /// new generation is requested, and any in-flight request is forgotten.
    pub fn begin(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.cache.clear();
        self.in_flight = None;
        self.shifted = false;
        debug!(generation = %self.generation, "new fetch generation");
        self.generation
    }

    /// Claim the in-flight slot for the next page at the cache cursor.
    /// `None` when busy, exhausted, or `limit` is zero.
    pub fn issue(&mut self, limit: usize, origin: FetchOrigin) -> Option<PageRequest> {
        if limit == 0 || self.in_flight.is_some() || !self.cache.has_more() {
            return None;
        }
        let request = PageRequest {
            generation: self.generation,
            offset: self.cache.next_offset(),
            limit,
            origin,
        };
        debug!(
            generation = %request.generation,
            offset = request.offset,
            limit = request.limit,
            origin = ?request.origin,
            "issuing page request"
        );
        self.in_flight = Some(request.clone());
        self.shifted = false;
        Some(request)
    }

    /// Drop an item the server no longer lists for this query. A request
    /// already in flight was issued at the old cursor and will be discarded
    /// when it lands.
    pub fn remove(&mut self, id: PromptId) -> Option<Prompt> {
        let removed = self.cache.remove(id)?;
        if self.in_flight.is_some() {
            self.shifted = true;
        }
        Some(removed)
    }

    pub fn complete(
        &mut self,
        request: &PageRequest,
        result: Result<ListPage, LoadError>,
    ) -> Completion {
        if !self.is_current(request.generation) {
            debug!(
                stale = %request.generation,
                current = %self.generation,
                "dropping stale page response"
            );
            return Completion::Stale;
        }
        let mut shifted = false;
        if self.in_flight.as_ref() == Some(request) {
            self.in_flight = None;
            shifted = std::mem::take(&mut self.shifted);
        }

        match result {
            Ok(_) if shifted => {
                debug!(
                    generation = %request.generation,
                    offset = request.offset,
                    "discarding page issued before the list shifted"
                );
                Completion::Shifted {
                    origin: request.origin,
                }
            }
            Ok(page) => {
                let got_full = page.returned == request.limit;
                let added = self.cache.append_page(page, request.limit);
                debug!(
                    generation = %request.generation,
                    offset = request.offset,
                    added,
                    has_more = self.cache.has_more(),
                    "page applied"
                );
                Completion::Applied { added, got_full }
            }
            Err(error) => Completion::Failed {
                origin: request.origin,
                error,
            },
        }
    }
}

/// Run one page request against the backend. Foreground requests get one
/// retry on a transient failure; prefetch requests and authorization
/// failures are never retried.
pub async fn fetch_page(
    backend: &dyn PromptBackend,
    query: &ListQuery,
    request: &PageRequest,
) -> Result<ListPage, LoadError> {
    let first = backend
        .list_prompts(query, request.offset, request.limit)
        .await
        .map_err(LoadError::from);

    match first {
        Err(LoadError::Transient(msg)) if request.origin == FetchOrigin::Foreground => {
            warn!(offset = request.offset, error = %msg, "page fetch failed, retrying once");
            backend
                .list_prompts(query, request.offset, request.limit)
                .await
                .map_err(LoadError::from)
        }
        other => other,
    }
}
