use crate::error::{DeckError, LoadError};
use crate::feed::sequencer::PageRequest;
use crate::types::{
    ListPage, PendingFeedback, Prompt, PromptId, PromptVersion, ViewerContext, Vote,
    CATEGORY_OPTIONS, OUTPUT_FORMAT_OPTIONS, TASK_TYPE_OPTIONS,
};

/// Which multi-select filter a popup edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Category,
    TaskType,
    OutputFormat,
}

impl FilterKind {
    pub fn title(&self) -> &'static str {
        match self {
            FilterKind::Category => "Department",
            FilterKind::TaskType => "Task type",
            FilterKind::OutputFormat => "Output format",
        }
    }

    /// `(value, label)` pairs offered in the popup.
    pub fn options(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            FilterKind::Category => CATEGORY_OPTIONS,
            FilterKind::TaskType => TASK_TYPE_OPTIONS,
            FilterKind::OutputFormat => OUTPUT_FORMAT_OPTIONS,
        }
    }
}

/// What to confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    Approve(PromptId),
    Reject(PromptId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popup {
    Confirm(ConfirmAction),
    Filter { kind: FilterKind, selected: usize },
    /// Star rating for a copied prompt.
    Rating { feedback: PendingFeedback, rating: u8 },
}

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    Back,
    ScrollUp,
    ScrollDown,
    Select,
    NextTab,
    PrevTab,
    ShowAuthor,

    // Pages
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    Retry,

    // Search
    EnterSearchMode,
    ExitSearchMode,
    SearchInput(char),
    SearchBackspace,
    SearchConfirm,

    // Filters
    ShowFilter(FilterKind),
    ToggleMineOnly,
    ToggleBookmarkedOnly,
    ClearFilters,

    // Popup navigation
    PopupUp,
    PopupDown,
    PopupSelect,
    PopupClose,
    SetRating(u8),
    ConfirmYes,
    ConfirmNo,

    // Mutations
    Vote(Vote),
    ToggleBookmark,
    CopyPrompt,
    Approve,
    Reject,

    // External
    OpenEditor,
    ViewInPager,
    ShowHistory,

    // Results of spawned tasks
    ViewerLoaded(Result<ViewerContext, LoadError>),
    PageLoaded {
        request: PageRequest,
        result: Result<ListPage, LoadError>,
    },
    VoteFinished {
        id: PromptId,
        result: Result<Prompt, LoadError>,
    },
    BookmarkFinished {
        id: PromptId,
        result: Result<Prompt, LoadError>,
    },
    CopyRecorded {
        id: PromptId,
        result: Result<u64, LoadError>,
    },
    Moderated {
        id: PromptId,
        result: Result<Prompt, LoadError>,
    },
    HistoryLoaded {
        id: PromptId,
        result: Result<Vec<PromptVersion>, LoadError>,
    },
    FeedbackPending(PendingFeedback),
    FeedbackSent,

    Notice(String),
    Error(String),
    None,
}

impl Action {
    /// Completions sent back by spawned tasks, as opposed to user input.
    pub fn is_result(&self) -> bool {
        matches!(
            self,
            Action::ViewerLoaded(_)
                | Action::PageLoaded { .. }
                | Action::VoteFinished { .. }
                | Action::BookmarkFinished { .. }
                | Action::CopyRecorded { .. }
                | Action::Moderated { .. }
                | Action::HistoryLoaded { .. }
                | Action::FeedbackPending(_)
                | Action::FeedbackSent
                | Action::Notice(_)
                | Action::Error(_)
                | Action::None
        )
    }
}

impl From<DeckError> for Action {
    fn from(err: DeckError) -> Self {
        Action::Error(err.to_string())
    }
}
