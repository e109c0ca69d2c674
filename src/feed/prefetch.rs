use tracing::{debug, warn};

use crate::error::LoadError;
use crate::feed::sequencer::{FetchOrigin, FetchSequencer, Generation, PageRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchState {
    /// Waiting for the first page of the generation.
    Idle,
    Running { batches: u32 },
    /// A batch failed; nothing more is read ahead for this generation.
    Halted,
    /// Source exhausted or batch budget spent.
    Finished,
}

/// Reads the rest of a generation ahead of the user in large batches.
#[derive(Debug)]
pub struct BackgroundPrefetcher {
    batch_size: usize,
    max_batches: u32,
    state: PrefetchState,
}

impl BackgroundPrefetcher {
    pub fn new(batch_size: usize, max_batches: u32) -> Self {
        Self {
            batch_size,
            max_batches,
            state: PrefetchState::Idle,
        }
    }

    pub fn state(&self) -> PrefetchState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = PrefetchState::Idle;
    }

    /// The first page of a generation landed; start reading ahead.
    pub fn arm(&mut self) {
        if self.state == PrefetchState::Idle {
            self.state = PrefetchState::Running { batches: 0 };
        }
    }

    /// Issue the next batch if the generation is still `generation`, the
    /// source has more, and the batch budget allows it.
    pub fn next_batch(
        &mut self,
        generation: Generation,
        sequencer: &mut FetchSequencer,
    ) -> Option<PageRequest> {
        let PrefetchState::Running { batches } = self.state else {
            return None;
        };
        if !sequencer.is_current(generation) {
            return None;
        }
        if !sequencer.cache().has_more() {
            debug!(%generation, batches, "prefetch reached end of source");
            self.state = PrefetchState::Finished;
            return None;
        }
        if batches >= self.max_batches {
            debug!(%generation, batches, "prefetch batch budget spent");
            self.state = PrefetchState::Finished;
            return None;
        }

        let request = sequencer.issue(self.batch_size, FetchOrigin::Prefetch)?;
        self.state = PrefetchState::Running {
            batches: batches + 1,
        };
        Some(request)
    }

    pub fn on_failure(&mut self, generation: Generation, error: &LoadError) {
        warn!(%generation, error = %error, "background prefetch failed, halting");
        self.state = PrefetchState::Halted;
    }
}
