//! Two-phase updates for per-viewer mutations: a tentative local change is
//! applied at once, then overwritten by the server's record (or rolled back
//! when the call fails). Each mutation kind owns a fixed set of fields and
//! only ever writes those, so interleaved responses for different kinds on
//! one prompt never clobber each other.

use std::collections::HashMap;

use crate::types::{Prompt, PromptId, Vote};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Vote,
    Bookmark,
}

/// Field values captured before a tentative change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Vote { user_vote: Vote, vote_count: i64 },
    Bookmark { is_bookmarked: bool },
}

impl Snapshot {
    pub fn capture(kind: MutationKind, prompt: &Prompt) -> Self {
        match kind {
            MutationKind::Vote => Snapshot::Vote {
                user_vote: prompt.user_vote,
                vote_count: prompt.vote_count,
            },
            MutationKind::Bookmark => Snapshot::Bookmark {
                is_bookmarked: prompt.is_bookmarked,
            },
        }
    }

    pub fn restore(&self, prompt: &mut Prompt) {
        match *self {
            Snapshot::Vote {
                user_vote,
                vote_count,
            } => {
                prompt.user_vote = user_vote;
                prompt.vote_count = vote_count;
            }
            Snapshot::Bookmark { is_bookmarked } => prompt.is_bookmarked = is_bookmarked,
        }
    }
}

/// Mutations awaiting a server response, at most one per (prompt, kind).
#[derive(Debug, Default)]
pub struct PendingMutations {
    pending: HashMap<(PromptId, MutationKind), Snapshot>,
}

impl PendingMutations {
    pub fn is_pending(&self, id: PromptId, kind: MutationKind) -> bool {
        self.pending.contains_key(&(id, kind))
    }

    /// Record the pre-change snapshot; `false` if one is already pending.
    pub fn begin(&mut self, id: PromptId, kind: MutationKind, snapshot: Snapshot) -> bool {
        if self.is_pending(id, kind) {
            return false;
        }
        self.pending.insert((id, kind), snapshot);
        true
    }

    pub fn finish(&mut self, id: PromptId, kind: MutationKind) -> Option<Snapshot> {
        self.pending.remove(&(id, kind))
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Tentative vote: repeating a vote withdraws it, switching sides moves the
/// tally by two.
pub fn apply_vote(prompt: &mut Prompt, vote: Vote) {
    let v = vote.value();
    let current = prompt.user_vote.value();
    if current == v {
        prompt.user_vote = Vote::None;
        prompt.vote_count -= v;
    } else if current == -v {
        prompt.user_vote = vote;
        prompt.vote_count += 2 * v;
    } else {
        prompt.user_vote = vote;
        prompt.vote_count += v;
    }
}

/// Overwrite the fields a mutation kind owns from the server's record.
pub fn reconcile(prompt: &mut Prompt, server: &Prompt, kind: MutationKind) {
    match kind {
        MutationKind::Vote => {
            prompt.user_vote = server.user_vote;
            prompt.vote_count = server.vote_count;
            prompt.like_count = server.like_count;
            prompt.dislike_count = server.dislike_count;
        }
        MutationKind::Bookmark => prompt.is_bookmarked = server.is_bookmarked,
    }
}
