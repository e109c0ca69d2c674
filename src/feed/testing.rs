//! Fixtures shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::PromptBackend;
use crate::error::{DeckError, Result};
use crate::feed::mutation::apply_vote;
use crate::types::{
    FeedbackSubmission, ListPage, ListQuery, PendingFeedback, Prompt, PromptId, PromptStatus,
    PromptVersion, ViewerContext, Visibility, Vote,
};

pub const VIEWER: &str = "ana";

/// An approved, public prompt owned by [`VIEWER`].
pub fn prompt(id: PromptId) -> Prompt {
    Prompt {
        id,
        title: format!("prompt {}", id),
        description: String::new(),
        text: format!("template {}", id),
        guidance: String::new(),
        intended_use: String::new(),
        category: String::new(),
        task_type: String::new(),
        output_format: String::new(),
        author: VIEWER.to_string(),
        status: PromptStatus::Approved,
        visibility: Visibility::Public,
        copy_count: 0,
        like_count: 0,
        dislike_count: 0,
        vote_count: 0,
        user_vote: Vote::None,
        is_bookmarked: false,
        created_at: None,
    }
}

pub fn prompts(ids: Range<u64>) -> Vec<Prompt> {
    ids.map(prompt).collect()
}

/// In-memory backend with server-side semantics and failure injection.
#[derive(Debug, Default)]
pub struct FakeBackend {
    store: Mutex<Vec<Prompt>>,
    failures: AtomicUsize,
    unauthorized: AtomicBool,
    admin: AtomicBool,
    calls: Mutex<Vec<(usize, usize)>>,
    pending: Mutex<Option<PendingFeedback>>,
    submitted: Mutex<Vec<FeedbackSubmission>>,
    garbled: Mutex<HashSet<PromptId>>,
    history: Mutex<HashMap<PromptId, Vec<PromptVersion>>>,
}

impl FakeBackend {
    pub fn with_prompts(prompts: Vec<Prompt>) -> Self {
        Self {
            store: Mutex::new(prompts),
            ..Self::default()
        }
    }

    /// Fail the next `n` list calls with a transient error.
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    pub fn reject_auth(&self) {
        self.unauthorized.store(true, Ordering::SeqCst);
    }

    pub fn make_admin(&self) {
        self.admin.store(true, Ordering::SeqCst);
    }

    pub fn set_pending_feedback(&self, feedback: Option<PendingFeedback>) {
        *self.pending.lock().unwrap() = feedback;
    }

    /// Serve `id` as a row the client cannot parse.
    pub fn garble(&self, id: PromptId) {
        self.garbled.lock().unwrap().insert(id);
    }

    pub fn set_history(&self, id: PromptId, versions: Vec<PromptVersion>) {
        self.history.lock().unwrap().insert(id, versions);
    }

    pub fn list_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `(offset, limit)` of every list call so far.
    pub fn calls(&self) -> Vec<(usize, usize)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<FeedbackSubmission> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn stored(&self, id: PromptId) -> Option<Prompt> {
        self.store.lock().unwrap().iter().find(|p| p.id == id).cloned()
    }

    fn check_auth(&self) -> Result<()> {
        if self.unauthorized.load(Ordering::SeqCst) {
            return Err(DeckError::Unauthorized("token rejected".into()));
        }
        Ok(())
    }

    fn update(&self, id: PromptId, f: impl FnOnce(&mut Prompt)) -> Result<Prompt> {
        self.check_auth()?;
        let mut store = self.store.lock().unwrap();
        let prompt = store
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DeckError::Api(format!("404 prompt {}", id)))?;
        f(prompt);
        Ok(prompt.clone())
    }
}

#[async_trait]
impl PromptBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    fn edit_url(&self, id: PromptId) -> String {
        format!("http://fake/add-prompt/{}", id)
    }

    async fn current_viewer(&self) -> Result<ViewerContext> {
        self.check_auth()?;
        Ok(ViewerContext {
            username: VIEWER.to_string(),
            is_admin: self.admin.load(Ordering::SeqCst),
        })
    }

    async fn list_prompts(
        &self,
        query: &ListQuery,
        offset: usize,
        limit: usize,
    ) -> Result<ListPage> {
        self.calls.lock().unwrap().push((offset, limit));
        self.check_auth()?;
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(DeckError::Api("503 Service Unavailable".into()));
        }

        let store = self.store.lock().unwrap();
        let rows: Vec<Prompt> = store
            .iter()
            .filter(|p| query.status.map_or(true, |s| p.status == s))
            .filter(|p| !query.mine || p.author == VIEWER)
            .filter(|p| query.username.as_ref().map_or(true, |u| &p.author == u))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        let garbled = self.garbled.lock().unwrap();
        Ok(ListPage {
            returned: rows.len(),
            items: rows.into_iter().filter(|p| !garbled.contains(&p.id)).collect(),
        })
    }

    async fn history(&self, id: PromptId) -> Result<Vec<PromptVersion>> {
        self.check_auth()?;
        Ok(self.history.lock().unwrap().get(&id).cloned().unwrap_or_default())
    }

    async fn vote(&self, id: PromptId, vote: Vote) -> Result<Prompt> {
        self.update(id, |p| {
            match p.user_vote {
                Vote::Up => p.like_count = p.like_count.saturating_sub(1),
                Vote::Down => p.dislike_count = p.dislike_count.saturating_sub(1),
                Vote::None => {}
            }
            apply_vote(p, vote);
            match p.user_vote {
                Vote::Up => p.like_count += 1,
                Vote::Down => p.dislike_count += 1,
                Vote::None => {}
            }
        })
    }

    async fn toggle_bookmark(&self, id: PromptId) -> Result<Prompt> {
        self.update(id, |p| p.is_bookmarked = !p.is_bookmarked)
    }

    async fn record_copy(&self, id: PromptId) -> Result<u64> {
        self.update(id, |p| p.copy_count += 1).map(|p| p.copy_count)
    }

    async fn approve(&self, id: PromptId) -> Result<Prompt> {
        self.update(id, |p| p.status = PromptStatus::Approved)
    }

    async fn reject(&self, id: PromptId) -> Result<Prompt> {
        self.update(id, |p| p.status = PromptStatus::Rejected)
    }

    async fn pending_feedback(&self) -> Result<Option<PendingFeedback>> {
        self.check_auth()?;
        Ok(self.pending.lock().unwrap().clone())
    }

    async fn submit_feedback(&self, submission: &FeedbackSubmission) -> Result<()> {
        self.check_auth()?;
        self.submitted.lock().unwrap().push(submission.clone());
        *self.pending.lock().unwrap() = None;
        Ok(())
    }
}
