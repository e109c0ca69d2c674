use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::{self, Session};
use crate::backend::PromptBackend;
use crate::error::{DeckError, Result};
use crate::types::{
    FeedbackSubmission, ListPage, ListQuery, PendingFeedback, Prompt, PromptId, PromptVersion,
    ViewerContext, Vote,
};

/// Client for the prompt-library REST API.
#[derive(Debug)]
pub struct RestBackend {
    client: Client,
    api_url: String,
    web_url: String,
    session: Arc<Session>,
}

impl RestBackend {
    pub fn new(api_url: String, web_url: String, session: Arc<Session>) -> Self {
        Self {
            client: Client::new(),
            api_url,
            web_url,
            session,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response> {
        let mut request = self.client.request(method.clone(), url);
        if let Some(token) = self.session.access_token() {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|e| DeckError::Api(e.to_string()))
    }

    /// Send a request; on 401 refresh the access token once and retry.
    /// A rejected refresh ends the session.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<reqwest::Response> {
        let url = self.api_url(path);
        let response = self.send_once(&method, &url, body.as_ref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(refresh_token) = self.session.refresh_token() else {
            return Err(DeckError::Unauthorized("not signed in".into()));
        };
        debug!(path, "access token rejected, refreshing");
        match auth::refresh(&self.client, &self.api_url, &refresh_token).await {
            Ok(access) => self.session.set_access(access)?,
            Err(e) => {
                info!(error = %e, "refresh failed, clearing session");
                self.session.clear()?;
                return Err(DeckError::Unauthorized(e.to_string()));
            }
        }

        let response = self.send_once(&method, &url, body.as_ref()).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            self.session.clear()?;
            return Err(DeckError::Unauthorized("token rejected after refresh".into()));
        }
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let response = self.send(method, path, body).await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(DeckError::Api(format!("{} {}: {}", status, path, text)));
        }

        response
            .json()
            .await
            .map_err(|e| DeckError::Api(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.json(Method::GET, path, None).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: Option<Value>) -> Result<T> {
        self.json(Method::POST, path, body).await
    }
}

/// Accept a bare array or a `{ "results": [...] }` envelope; anything else
/// is an empty page. Records that do not parse are skipped but still count
/// toward `returned`.
pub fn parse_prompt_list(body: Value) -> ListPage {
    let rows = match body {
        Value::Array(rows) => rows,
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(rows)) => rows,
            _ => {
                warn!("prompt list response has no results array");
                return ListPage::default();
            }
        },
        other => {
            warn!(kind = ?other, "unexpected prompt list response");
            return ListPage::default();
        }
    };

    let returned = rows.len();
    let items = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<Prompt>(row) {
            Ok(prompt) => Some(prompt),
            Err(e) => {
                warn!(error = %e, "skipping malformed prompt");
                None
            }
        })
        .collect();
    ListPage { items, returned }
}

#[derive(Deserialize)]
struct CopyCount {
    #[serde(default)]
    copy_count: u64,
}

#[derive(Deserialize)]
struct CopyCheck {
    #[serde(default)]
    pending: bool,
    prompt_id: Option<PromptId>,
    #[serde(default)]
    prompt_title: Option<String>,
}

impl CopyCheck {
    fn into_pending(self) -> Option<PendingFeedback> {
        if !self.pending {
            return None;
        }
        Some(PendingFeedback {
            prompt_id: self.prompt_id?,
            prompt_title: self.prompt_title.unwrap_or_default(),
        })
    }
}

#[derive(Serialize)]
struct SubmitBody<'a> {
    prompt_id: PromptId,
    status: &'a str,
    rating: u8,
    feedback: &'a str,
}

#[async_trait]
impl PromptBackend for RestBackend {
    fn name(&self) -> &str {
        "rest"
    }

    fn edit_url(&self, id: PromptId) -> String {
        format!("{}/prompts/edit/{}", self.web_url, id)
    }

    async fn current_viewer(&self) -> Result<ViewerContext> {
        self.get_json("/auth/user/").await
    }

    async fn list_prompts(
        &self,
        query: &ListQuery,
        offset: usize,
        limit: usize,
    ) -> Result<ListPage> {
        let path = format!("/prompts/?{}", query.to_query_string(offset, limit));
        let body: Value = self.get_json(&path).await?;
        Ok(parse_prompt_list(body))
    }

    async fn vote(&self, id: PromptId, vote: Vote) -> Result<Prompt> {
        let endpoint = match vote {
            Vote::Up => "upvote",
            Vote::Down => "downvote",
            Vote::None => return Err(DeckError::Api("no vote to cast".into())),
        };
        self.post_json(&format!("/prompts/{}/{}/", id, endpoint), None)
            .await
    }

    async fn toggle_bookmark(&self, id: PromptId) -> Result<Prompt> {
        self.post_json(&format!("/prompts/{}/bookmark/", id), None)
            .await
    }

    async fn record_copy(&self, id: PromptId) -> Result<u64> {
        let body: CopyCount = self
            .post_json(&format!("/prompts/{}/copy/", id), None)
            .await?;
        Ok(body.copy_count)
    }

    async fn history(&self, id: PromptId) -> Result<Vec<PromptVersion>> {
        self.get_json(&format!("/prompts/{}/history/", id)).await
    }

    async fn approve(&self, id: PromptId) -> Result<Prompt> {
        self.post_json(&format!("/prompts/{}/approve/", id), None)
            .await
    }

    async fn reject(&self, id: PromptId) -> Result<Prompt> {
        self.post_json(&format!("/prompts/{}/reject/", id), None)
            .await
    }

    async fn save_copied(&self, id: PromptId) -> Result<()> {
        let _: Value = self
            .post_json("/copy/save/", Some(serde_json::json!({ "prompt_id": id })))
            .await?;
        Ok(())
    }

    async fn pending_feedback(&self) -> Result<Option<PendingFeedback>> {
        let check: CopyCheck = self.get_json("/copy/check/").await?;
        Ok(check.into_pending())
    }

    async fn submit_feedback(&self, submission: &FeedbackSubmission) -> Result<()> {
        let body = serde_json::to_value(SubmitBody {
            prompt_id: submission.prompt_id,
            status: submission.status.as_api_str(),
            rating: submission.rating,
            feedback: &submission.feedback,
        })?;
        let _: Value = self.post_json("/copy/submit/", Some(body)).await?;
        Ok(())
    }
}
