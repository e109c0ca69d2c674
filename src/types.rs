use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type PromptId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl PromptStatus {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            PromptStatus::Pending => "pending",
            PromptStatus::Approved => "approved",
            PromptStatus::Rejected => "rejected",
            PromptStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PromptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptStatus::Pending => write!(f, "Pending"),
            PromptStatus::Approved => write!(f, "Approved"),
            PromptStatus::Rejected => write!(f, "Rejected"),
            PromptStatus::Unknown => write!(f, "?"),
        }
    }
}

/// Wire form is the `is_public` boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl From<bool> for Visibility {
    fn from(is_public: bool) -> Self {
        if is_public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

impl From<Visibility> for bool {
    fn from(v: Visibility) -> Self {
        v == Visibility::Public
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// The viewer's own vote on a prompt. Wire form is -1, 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Vote {
    Down,
    #[default]
    None,
    Up,
}

impl Vote {
    pub fn value(self) -> i64 {
        match self {
            Vote::Down => -1,
            Vote::None => 0,
            Vote::Up => 1,
        }
    }
}

impl From<i64> for Vote {
    fn from(v: i64) -> Self {
        match v.signum() {
            1 => Vote::Up,
            -1 => Vote::Down,
            _ => Vote::None,
        }
    }
}

impl From<Vote> for i64 {
    fn from(v: Vote) -> Self {
        v.value()
    }
}

/// A prompt record as served by the list and mutation endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: PromptId,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, rename = "prompt_description", deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, rename = "prompt_text", deserialize_with = "nullable")]
    pub text: String,
    #[serde(default, deserialize_with = "nullable")]
    pub guidance: String,
    #[serde(default, deserialize_with = "nullable")]
    pub intended_use: String,
    #[serde(default, deserialize_with = "nullable")]
    pub category: String,
    #[serde(default, deserialize_with = "nullable")]
    pub task_type: String,
    #[serde(default, deserialize_with = "nullable")]
    pub output_format: String,
    #[serde(default, rename = "user_username", deserialize_with = "nullable")]
    pub author: String,
    #[serde(default, deserialize_with = "nullable")]
    pub status: PromptStatus,
    #[serde(default, rename = "is_public", deserialize_with = "nullable")]
    pub visibility: Visibility,
    #[serde(default, deserialize_with = "nullable")]
    pub copy_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub like_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub dislike_count: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub vote_count: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub user_vote: Vote,
    #[serde(default, deserialize_with = "nullable")]
    pub is_bookmarked: bool,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Treats an explicit `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unparseable timestamps are dropped rather than failing the whole record.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }))
}

impl Prompt {
    /// Text shown in list rows: description, or the template when there is none.
    pub fn summary(&self) -> &str {
        if self.description.is_empty() {
            &self.text
        } else {
            &self.description
        }
    }

    pub fn is_listed(&self) -> bool {
        self.status == PromptStatus::Approved && self.visibility == Visibility::Public
    }
}

/// Identity of the signed-in user, as reported by `/auth/user/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerContext {
    pub username: String,
    #[serde(default, rename = "is_staff")]
    pub is_admin: bool,
}

/// Which list the library screen is showing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Browse,
    Mine,
    Pending,
    Approved,
    Author(String),
}

impl Tab {
    /// Tabs reachable by cycling; admin review tabs only for admins.
    pub fn cycle(is_admin: bool) -> Vec<Tab> {
        let mut tabs = vec![Tab::Browse, Tab::Mine];
        if is_admin {
            tabs.push(Tab::Pending);
            tabs.push(Tab::Approved);
        }
        tabs
    }

    pub fn query(&self) -> ListQuery {
        match self {
            Tab::Browse => ListQuery::default(),
            Tab::Mine => ListQuery {
                mine: true,
                ..ListQuery::default()
            },
            Tab::Pending => ListQuery {
                status: Some(PromptStatus::Pending),
                ..ListQuery::default()
            },
            Tab::Approved => ListQuery {
                status: Some(PromptStatus::Approved),
                ..ListQuery::default()
            },
            Tab::Author(name) => ListQuery {
                username: Some(name.clone()),
                ..ListQuery::default()
            },
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tab::Browse => write!(f, "Browse Library"),
            Tab::Mine => write!(f, "My Prompts"),
            Tab::Pending => write!(f, "Pending"),
            Tab::Approved => write!(f, "Approved"),
            Tab::Author(name) => write!(f, "@{}", name),
        }
    }
}

/// Server-side parameters of the prompt list endpoint (besides limit/offset).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListQuery {
    pub status: Option<PromptStatus>,
    pub mine: bool,
    pub username: Option<String>,
}

impl ListQuery {
    pub fn to_query_string(&self, offset: usize, limit: usize) -> String {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(format!("status={}", status.as_api_str()));
        }
        if self.mine {
            params.push("mine=1".to_string());
        }
        if let Some(name) = &self.username {
            params.push(format!("username={}", urlencoding::encode(name)));
        }
        params.push(format!("limit={}", limit));
        params.push(format!("offset={}", offset));
        params.join("&")
    }
}

/// One page of the list endpoint. `returned` counts the records the server
/// sent, including any that failed to parse, so a full page with a bad row
/// is still a full page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListPage {
    pub items: Vec<Prompt>,
    pub returned: usize,
}

impl From<Vec<Prompt>> for ListPage {
    fn from(items: Vec<Prompt>) -> Self {
        Self {
            returned: items.len(),
            items,
        }
    }
}

/// A saved earlier revision of a prompt, from `/prompts/{id}/history/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PromptVersion {
    #[serde(default)]
    pub id: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, rename = "prompt_description", deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, rename = "prompt_text", deserialize_with = "nullable")]
    pub text: String,
    #[serde(default, deserialize_with = "nullable")]
    pub guidance: String,
    #[serde(default, alias = "edited_by_username", deserialize_with = "editor_name")]
    pub edited_by: String,
    #[serde(
        default,
        alias = "edited_at",
        alias = "timestamp",
        deserialize_with = "lenient_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// `edited_by` is a username on some servers and a user id on others.
fn editor_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(name)) => name,
        Some(serde_json::Value::Number(id)) => format!("user #{}", id),
        _ => String::new(),
    })
}

/// Outcome of a copy-feedback prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackStatus {
    Submitted,
    Skipped,
}

impl FeedbackStatus {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Submitted => "submitted",
            FeedbackStatus::Skipped => "skipped",
        }
    }
}

/// A copy that the server is still waiting for a rating on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFeedback {
    pub prompt_id: PromptId,
    pub prompt_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackSubmission {
    pub prompt_id: PromptId,
    pub status: FeedbackStatus,
    pub rating: u8,
    pub feedback: String,
}

/// Known filter values offered in the selection popups.
pub const CATEGORY_OPTIONS: &[(&str, &str)] = &[
    ("Software", "Software"),
    ("content_comms", "Communication"),
    ("design", "Design"),
    ("engineering", "Engineering"),
    ("finance", "Finance"),
    ("hr", "Human Resources"),
    ("learning", "Learning & Development"),
    ("marketing", "Marketing"),
    ("product_management", "Product Management"),
    ("support", "Support"),
];

pub const TASK_TYPE_OPTIONS: &[(&str, &str)] = &[
    ("create_content", "Create Content"),
    ("create_code", "Create Code"),
    ("research", "Research"),
    ("deep_research", "Deep Research / Analysis"),
    ("plan_organize", "Plan & Organize"),
    ("ideate", "Ideate / Brainstorm"),
    ("summarize", "Summarize / Review"),
    ("explain", "Explain / Teach"),
    ("optimize", "Optimize / Improve"),
];

pub const OUTPUT_FORMAT_OPTIONS: &[(&str, &str)] = &[
    ("text", "Text"),
    ("code", "Code"),
    ("chart_graph", "Chart / Graph"),
    ("checklist_table", "Checklist / Table"),
    ("template_framework", "Template / Framework"),
    ("image_visual", "Image / Visual"),
    ("slide_report", "Slide / Report"),
];
