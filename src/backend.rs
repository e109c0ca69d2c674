use async_trait::async_trait;

use crate::error::{DeckError, Result};
use crate::types::{
    FeedbackSubmission, ListPage, ListQuery, PendingFeedback, Prompt, PromptId, PromptVersion,
    ViewerContext, Vote,
};

/// The prompt-library service as the client consumes it.
#[async_trait]
pub trait PromptBackend: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Browser URL of the prompt editor.
    fn edit_url(&self, id: PromptId) -> String;

    // Core (required)
    async fn current_viewer(&self) -> Result<ViewerContext>;
    async fn list_prompts(
        &self,
        query: &ListQuery,
        offset: usize,
        limit: usize,
    ) -> Result<ListPage>;
    /// Cast `vote` (Up or Down); casting the same vote again withdraws it.
    async fn vote(&self, id: PromptId, vote: Vote) -> Result<Prompt>;
    async fn toggle_bookmark(&self, id: PromptId) -> Result<Prompt>;
    /// Bump the copy counter, returning the new count.
    async fn record_copy(&self, id: PromptId) -> Result<u64>;

    // Optional (history, admin moderation and copy feedback)
    /// Earlier revisions, oldest first.
    async fn history(&self, _id: PromptId) -> Result<Vec<PromptVersion>> {
        Err(DeckError::Api("History not supported by this backend".into()))
    }
    async fn approve(&self, _id: PromptId) -> Result<Prompt> {
        Err(DeckError::Api("Moderation not supported by this backend".into()))
    }
    async fn reject(&self, _id: PromptId) -> Result<Prompt> {
        Err(DeckError::Api("Moderation not supported by this backend".into()))
    }
    async fn save_copied(&self, _id: PromptId) -> Result<()> {
        Ok(())
    }
    async fn pending_feedback(&self) -> Result<Option<PendingFeedback>> {
        Ok(None)
    }
    async fn submit_feedback(&self, _submission: &FeedbackSubmission) -> Result<()> {
        Err(DeckError::Api("Feedback not supported by this backend".into()))
    }
}
