use std::collections::BTreeSet;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::action::{Action, ConfirmAction, FilterKind, Popup};
use crate::backend::PromptBackend;
use crate::config::PagingConfig;
use crate::error::LoadError;
use crate::feed::filter::FilterState;
use crate::feed::sequencer::{fetch_page, Completion, PageRequest};
use crate::feed::{Feed, LoadStatus};
use crate::pager::{render_history_document, render_prompt_document};
use crate::tui::Event;
use crate::types::{
    FeedbackStatus, FeedbackSubmission, PendingFeedback, Prompt, PromptId, Tab, ViewerContext,
    Vote,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Library, // Tabbed, filtered, paginated list
    Detail,  // One prompt in full
}

pub struct App {
    pub screen: Screen,
    pub feed: Feed,
    /// Row within the current page.
    pub selected: usize,
    pub detail: Option<PromptId>,
    pub scroll_offset: usize,
    pub popup: Option<Popup>,
    pub search_mode: bool,
    pub search_input: String,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub should_quit: bool,
    start_tab: Tab,
    pager_request: Option<String>,
    backend: Arc<dyn PromptBackend>,
    action_tx: mpsc::UnboundedSender<Action>,
}

fn filter_set(filter: &mut FilterState, kind: FilterKind) -> &mut BTreeSet<String> {
    match kind {
        FilterKind::Category => &mut filter.categories,
        FilterKind::TaskType => &mut filter.task_types,
        FilterKind::OutputFormat => &mut filter.output_formats,
    }
}

fn copy_to_clipboard(text: &str) -> Result<(), String> {
    arboard::Clipboard::new()
        .and_then(|mut clipboard| clipboard.set_text(text.to_string()))
        .map_err(|e| e.to_string())
}

fn session_hint(err: &LoadError) -> String {
    match err {
        LoadError::Unauthorized(msg) => {
            format!("{}. Run `promptdeck login` to sign in again", msg)
        }
        LoadError::Transient(msg) => msg.clone(),
    }
}

impl App {
    pub fn new(
        backend: Arc<dyn PromptBackend>,
        paging: PagingConfig,
        start_tab: Tab,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            screen: Screen::Library,
            feed: Feed::new(paging),
            selected: 0,
            detail: None,
            scroll_offset: 0,
            popup: None,
            search_mode: false,
            search_input: String::new(),
            notice: None,
            error: None,
            should_quit: false,
            start_tab,
            pager_request: None,
            backend,
            action_tx,
        }
    }

    /// Kick off loading: viewer first, then the starting tab.
    pub fn start(&self) {
        info!(backend = self.backend.name(), tab = %self.start_tab, "starting");
        self.spawn_load_viewer();
    }

    pub fn is_admin(&self) -> bool {
        self.feed.viewer().is_some_and(|v| v.is_admin)
    }

    pub fn page_items(&self) -> Vec<&Prompt> {
        self.feed.page_items()
    }

    /// The prompt the next mutation applies to.
    pub fn current_prompt(&self) -> Option<&Prompt> {
        match self.screen {
            Screen::Detail => self.detail.and_then(|id| self.feed.prompt(id)),
            Screen::Library => self.feed.page_items().get(self.selected).copied(),
        }
    }

    fn current_id(&self) -> Option<PromptId> {
        self.current_prompt().map(|p| p.id)
    }

    /// Content waiting to be shown in the pager, if any.
    pub fn take_pager_request(&mut self) -> Option<String> {
        self.pager_request.take()
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Key(key) => self.handle_key(key),
            _ => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        if self.search_mode {
            return match key.code {
                KeyCode::Esc => Action::ExitSearchMode,
                KeyCode::Enter => Action::SearchConfirm,
                KeyCode::Backspace => Action::SearchBackspace,
                KeyCode::Char(c) => Action::SearchInput(c),
                _ => Action::None,
            };
        }

        if let Some(popup) = &self.popup {
            return match popup {
                Popup::Confirm(_) => match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => Action::ConfirmYes,
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Action::ConfirmNo,
                    _ => Action::None,
                },
                Popup::Filter { .. } => match key.code {
                    KeyCode::Char('k') | KeyCode::Up => Action::PopupUp,
                    KeyCode::Char('j') | KeyCode::Down => Action::PopupDown,
                    KeyCode::Char(' ') | KeyCode::Enter => Action::PopupSelect,
                    KeyCode::Esc | KeyCode::Char('q') => Action::PopupClose,
                    _ => Action::None,
                },
                Popup::Rating { .. } => match key.code {
                    KeyCode::Char(c @ '1'..='5') => {
                        Action::SetRating(c.to_digit(10).unwrap_or(1) as u8)
                    }
                    KeyCode::Char('l') | KeyCode::Right | KeyCode::Char('k') | KeyCode::Up => {
                        Action::PopupUp
                    }
                    KeyCode::Char('h') | KeyCode::Left | KeyCode::Char('j') | KeyCode::Down => {
                        Action::PopupDown
                    }
                    KeyCode::Enter => Action::PopupSelect,
                    KeyCode::Esc | KeyCode::Char('s') => Action::PopupClose,
                    _ => Action::None,
                },
            };
        }

        // Keys shared by both screens
        match key.code {
            KeyCode::Char('+') | KeyCode::Char('=') => return Action::Vote(Vote::Up),
            KeyCode::Char('-') => return Action::Vote(Vote::Down),
            KeyCode::Char('B') => return Action::ToggleBookmark,
            KeyCode::Char('y') => return Action::CopyPrompt,
            KeyCode::Char('a') => return Action::Approve,
            KeyCode::Char('r') => return Action::Reject,
            KeyCode::Char('e') => return Action::OpenEditor,
            KeyCode::Char('v') => return Action::ViewInPager,
            KeyCode::Char('u') => return Action::ShowAuthor,
            KeyCode::Char('H') => return Action::ShowHistory,
            _ => {}
        }

        match self.screen {
            Screen::Library => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
                KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
                KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
                KeyCode::Enter => Action::Select,
                KeyCode::Tab | KeyCode::Char('l') => Action::NextTab,
                KeyCode::BackTab | KeyCode::Char('h') => Action::PrevTab,
                KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => Action::NextPage,
                KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => Action::PrevPage,
                KeyCode::Char('g') => Action::FirstPage,
                KeyCode::Char('G') => Action::LastPage,
                KeyCode::Char('/') => Action::EnterSearchMode,
                KeyCode::Char('c') => Action::ShowFilter(FilterKind::Category),
                KeyCode::Char('t') => Action::ShowFilter(FilterKind::TaskType),
                KeyCode::Char('o') => Action::ShowFilter(FilterKind::OutputFormat),
                KeyCode::Char('m') => Action::ToggleMineOnly,
                KeyCode::Char('b') => Action::ToggleBookmarkedOnly,
                KeyCode::Char('x') => Action::ClearFilters,
                KeyCode::Char('R') => Action::Retry,
                _ => Action::None,
            },
            Screen::Detail => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Action::Back,
                KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
                KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
                KeyCode::Char('h') => Action::ShowHistory,
                _ => Action::None,
            },
        }
    }

    pub fn update(&mut self, action: Action) {
        if !action.is_result() {
            self.error = None;
            self.notice = None;
        }

        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Back => match self.screen {
                Screen::Library => self.should_quit = true,
                Screen::Detail => {
                    self.screen = Screen::Library;
                    self.detail = None;
                    self.scroll_offset = 0;
                }
            },
            Action::ScrollUp => match self.screen {
                Screen::Library => self.selected = self.selected.saturating_sub(1),
                Screen::Detail => self.scroll_offset = self.scroll_offset.saturating_sub(1),
            },
            Action::ScrollDown => match self.screen {
                Screen::Library => {
                    let len = self.feed.page_items().len();
                    if self.selected + 1 < len {
                        self.selected += 1;
                    }
                }
                Screen::Detail => self.scroll_offset += 1,
            },
            Action::Select => {
                if let Some(id) = self.current_id() {
                    self.detail = Some(id);
                    self.scroll_offset = 0;
                    self.screen = Screen::Detail;
                }
            }
            Action::NextTab | Action::PrevTab => {
                let tabs = Tab::cycle(self.is_admin());
                let pos = tabs.iter().position(|t| t == self.feed.tab());
                let next = match (pos, matches!(action, Action::NextTab)) {
                    (Some(i), true) => (i + 1) % tabs.len(),
                    (Some(i), false) => (i + tabs.len() - 1) % tabs.len(),
                    (None, _) => 0,
                };
                self.switch_tab(tabs[next].clone());
            }
            Action::ShowAuthor => {
                if let Some(author) = self.current_prompt().map(|p| p.author.clone()) {
                    if !author.is_empty() {
                        self.switch_tab(Tab::Author(author));
                    }
                }
            }

            // Pages
            Action::NextPage => {
                let request = self.feed.next_page();
                self.after_page_change(request);
            }
            Action::PrevPage => {
                let request = self.feed.prev_page();
                self.after_page_change(request);
            }
            Action::FirstPage => {
                let request = self.feed.request_page(1);
                self.after_page_change(request);
            }
            Action::LastPage => {
                let last = self.feed.total_pages();
                let request = self.feed.request_page(last);
                self.after_page_change(request);
            }
            Action::Retry => {
                let request = match self.feed.retry() {
                    Some(request) => Some(request),
                    None => {
                        self.selected = 0;
                        self.feed.refresh()
                    }
                };
                self.spawn_fetch(request);
            }

            // Search
            Action::EnterSearchMode => {
                self.search_mode = true;
                self.search_input = self.feed.filter().search.clone();
            }
            Action::ExitSearchMode => {
                self.search_mode = false;
                self.search_input.clear();
                self.apply_filter(|f| f.search.clear());
            }
            Action::SearchInput(c) => {
                self.search_input.push(c);
                let search = self.search_input.clone();
                self.apply_filter(|f| f.search = search);
            }
            Action::SearchBackspace => {
                self.search_input.pop();
                let search = self.search_input.clone();
                self.apply_filter(|f| f.search = search);
            }
            Action::SearchConfirm => {
                self.search_mode = false;
            }

            // Filters
            Action::ShowFilter(kind) => {
                self.popup = Some(Popup::Filter { kind, selected: 0 });
            }
            Action::ToggleMineOnly => self.apply_filter(|f| f.mine_only = !f.mine_only),
            Action::ToggleBookmarkedOnly => {
                self.apply_filter(|f| f.bookmarked_only = !f.bookmarked_only)
            }
            Action::ClearFilters => {
                self.search_input.clear();
                self.feed.clear_filter();
                self.selected = 0;
            }

            // Popups
            Action::PopupUp => match &mut self.popup {
                Some(Popup::Filter { selected, .. }) => *selected = selected.saturating_sub(1),
                Some(Popup::Rating { rating, .. }) => *rating = (*rating + 1).min(5),
                _ => {}
            },
            Action::PopupDown => match &mut self.popup {
                Some(Popup::Filter { kind, selected }) => {
                    if *selected + 1 < kind.options().len() {
                        *selected += 1;
                    }
                }
                Some(Popup::Rating { rating, .. }) => *rating = rating.saturating_sub(1).max(1),
                _ => {}
            },
            Action::SetRating(n) => {
                if let Some(Popup::Rating { rating, .. }) = &mut self.popup {
                    *rating = n.clamp(1, 5);
                }
            }
            Action::PopupSelect => match self.popup.clone() {
                Some(Popup::Filter { kind, selected }) => {
                    if let Some((value, _)) = kind.options().get(selected) {
                        let value = value.to_string();
                        self.apply_filter(|f| {
                            let set = filter_set(f, kind);
                            if !set.remove(&value) {
                                set.insert(value);
                            }
                        });
                    }
                }
                Some(Popup::Rating { feedback, rating }) => {
                    self.popup = None;
                    self.spawn_submit_feedback(feedback, FeedbackStatus::Submitted, rating);
                }
                _ => {}
            },
            Action::PopupClose => {
                if let Some(Popup::Rating { feedback, .. }) = self.popup.take() {
                    self.spawn_submit_feedback(feedback, FeedbackStatus::Skipped, 0);
                }
            }
            Action::ConfirmYes => {
                if let Some(Popup::Confirm(confirm)) = self.popup.take() {
                    self.spawn_moderate(confirm);
                }
            }
            Action::ConfirmNo => {
                self.popup = None;
            }

            // Mutations
            Action::Vote(vote) => {
                if let Some(id) = self.current_id() {
                    if self.feed.begin_vote(id, vote) {
                        self.spawn_vote(id, vote);
                    } else {
                        self.notice = Some("Vote already in progress".to_string());
                    }
                }
            }
            Action::ToggleBookmark => {
                if let Some(id) = self.current_id() {
                    if self.feed.begin_bookmark(id) {
                        self.spawn_bookmark(id);
                    } else {
                        self.notice = Some("Bookmark already in progress".to_string());
                    }
                }
            }
            Action::CopyPrompt => {
                if let Some((id, text)) = self.current_prompt().map(|p| (p.id, p.text.clone())) {
                    match copy_to_clipboard(&text) {
                        Ok(()) => {
                            self.notice = Some("Prompt copied to clipboard".to_string());
                            self.spawn_record_copy(id);
                        }
                        Err(e) => self.error = Some(format!("Clipboard unavailable: {}", e)),
                    }
                }
            }
            Action::Approve | Action::Reject => {
                if !self.is_admin() {
                    self.error = Some("Moderation requires an admin account".to_string());
                } else if let Some(id) = self.current_id() {
                    let confirm = if matches!(action, Action::Approve) {
                        ConfirmAction::Approve(id)
                    } else {
                        ConfirmAction::Reject(id)
                    };
                    self.popup = Some(Popup::Confirm(confirm));
                }
            }

            // External
            Action::OpenEditor => {
                if let Some(id) = self.current_id() {
                    let url = self.backend.edit_url(id);
                    if let Err(e) = open::that(&url) {
                        self.error = Some(format!("Could not open {}: {}", url, e));
                    }
                }
            }
            Action::ViewInPager => {
                let document = self.current_prompt().map(render_prompt_document);
                if document.is_some() {
                    self.pager_request = document;
                }
            }
            Action::ShowHistory => {
                if let Some(id) = self.current_id() {
                    self.notice = Some("Loading history...".to_string());
                    self.spawn_history(id);
                }
            }

            // Results
            Action::ViewerLoaded(result) => {
                let viewer = match result {
                    Ok(viewer) => {
                        info!(username = %viewer.username, admin = viewer.is_admin, "signed in");
                        Some(viewer)
                    }
                    Err(e) => {
                        warn!(error = %e, "could not load viewer");
                        self.error = Some(session_hint(&e));
                        None
                    }
                };
                let tab = self.starting_tab(viewer.as_ref());
                let request = self.feed.reset(tab, viewer.clone());
                self.selected = 0;
                self.spawn_fetch(request);
                if viewer.is_some() {
                    self.spawn_check_feedback();
                }
            }
            Action::PageLoaded { request, result } => {
                let progress = self.feed.apply(&request, result);
                if let Completion::Failed {
                    error: err @ LoadError::Unauthorized(_),
                    ..
                } = &progress.completion
                {
                    self.error = Some(session_hint(err));
                }
                self.spawn_fetch(progress.next);
                self.clamp_selection();
            }
            Action::VoteFinished { id, result } => {
                if let Err(e) = &result {
                    self.error = Some(format!("Vote failed: {}", session_hint(e)));
                }
                self.feed.finish_vote(id, result);
            }
            Action::BookmarkFinished { id, result } => {
                if let Err(e) = &result {
                    self.error = Some(format!("Bookmark failed: {}", session_hint(e)));
                }
                self.feed.finish_bookmark(id, result);
                self.clamp_selection();
            }
            Action::CopyRecorded { id, result } => match result {
                Ok(count) => self.feed.apply_copy_count(id, count),
                Err(e) => warn!(id, error = %e, "copy not recorded"),
            },
            Action::Moderated { id, result } => match result {
                Ok(prompt) => {
                    self.notice = Some(format!("{}: {}", prompt.status, prompt.title));
                    self.feed.apply_moderation(&prompt);
                    if self.detail == Some(id) && self.feed.prompt(id).is_none() {
                        self.screen = Screen::Library;
                        self.detail = None;
                    }
                    self.clamp_selection();
                }
                Err(e) => self.error = Some(format!("Moderation failed: {}", session_hint(&e))),
            },
            Action::HistoryLoaded { id, result } => match result {
                Ok(versions) => {
                    self.notice = None;
                    let title = self
                        .feed
                        .prompt(id)
                        .map(|p| p.title.clone())
                        .unwrap_or_else(|| format!("#{}", id));
                    self.pager_request = Some(render_history_document(&title, &versions));
                }
                Err(e) => {
                    self.notice = None;
                    self.error = Some(format!("History unavailable: {}", session_hint(&e)));
                }
            },
            Action::FeedbackPending(feedback) => {
                if self.popup.is_none() {
                    self.popup = Some(Popup::Rating {
                        feedback,
                        rating: 3,
                    });
                }
            }
            Action::FeedbackSent => {
                self.notice = Some("Thanks for the feedback".to_string());
            }
            Action::Notice(msg) => self.notice = Some(msg),
            Action::Error(msg) => self.error = Some(msg),
            Action::None => {}
        }
    }

    /// The configured starting tab, if the viewer may see it.
    fn starting_tab(&mut self, viewer: Option<&ViewerContext>) -> Tab {
        let tab = self.start_tab.clone();
        let admin = viewer.is_some_and(|v| v.is_admin);
        if matches!(tab, Tab::Pending | Tab::Approved) && !admin {
            self.notice = Some(format!("{} tab requires an admin account", tab));
            return Tab::Browse;
        }
        tab
    }

    fn switch_tab(&mut self, tab: Tab) {
        let viewer = self.feed.viewer().cloned();
        let request = self.feed.reset(tab, viewer);
        self.selected = 0;
        self.screen = Screen::Library;
        self.detail = None;
        self.spawn_fetch(request);
    }

    fn apply_filter(&mut self, f: impl FnOnce(&mut FilterState)) {
        self.feed.update_filter(f);
        self.selected = 0;
    }

    fn after_page_change(&mut self, request: Option<PageRequest>) {
        self.selected = 0;
        self.spawn_fetch(request);
    }

    fn clamp_selection(&mut self) {
        let len = self.feed.page_items().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn spawn_load_viewer(&self) {
        let tx = self.action_tx.clone();
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            let result = backend.current_viewer().await.map_err(LoadError::from);
            tx.send(Action::ViewerLoaded(result)).ok();
        });
    }

    fn spawn_fetch(&self, request: Option<PageRequest>) {
        let Some(request) = request else {
            return;
        };
        let tx = self.action_tx.clone();
        let backend = Arc::clone(&self.backend);
        let query = self.feed.query();
        tokio::spawn(async move {
            let result = fetch_page(backend.as_ref(), &query, &request).await;
            tx.send(Action::PageLoaded { request, result }).ok();
        });
    }

    fn spawn_vote(&self, id: PromptId, vote: Vote) {
        let tx = self.action_tx.clone();
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            let result = backend.vote(id, vote).await.map_err(LoadError::from);
            tx.send(Action::VoteFinished { id, result }).ok();
        });
    }

    fn spawn_bookmark(&self, id: PromptId) {
        let tx = self.action_tx.clone();
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            let result = backend.toggle_bookmark(id).await.map_err(LoadError::from);
            tx.send(Action::BookmarkFinished { id, result }).ok();
        });
    }

    fn spawn_record_copy(&self, id: PromptId) {
        let tx = self.action_tx.clone();
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            let result = backend.record_copy(id).await.map_err(LoadError::from);
            let recorded = result.is_ok();
            tx.send(Action::CopyRecorded { id, result }).ok();
            if !recorded {
                return;
            }
            if let Err(e) = backend.save_copied(id).await {
                warn!(id, error = %e, "could not register copy for feedback");
                return;
            }
            match backend.pending_feedback().await {
                Ok(Some(feedback)) => {
                    tx.send(Action::FeedbackPending(feedback)).ok();
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "feedback check failed"),
            }
        });
    }

    fn spawn_check_feedback(&self) {
        let tx = self.action_tx.clone();
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            match backend.pending_feedback().await {
                Ok(Some(feedback)) => {
                    tx.send(Action::FeedbackPending(feedback)).ok();
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "feedback check failed"),
            }
        });
    }

    fn spawn_submit_feedback(
        &self,
        feedback: PendingFeedback,
        status: FeedbackStatus,
        rating: u8,
    ) {
        let tx = self.action_tx.clone();
        let backend = Arc::clone(&self.backend);
        let submission = FeedbackSubmission {
            prompt_id: feedback.prompt_id,
            status,
            rating,
            feedback: String::new(),
        };
        tokio::spawn(async move {
            match backend.submit_feedback(&submission).await {
                Ok(()) if status == FeedbackStatus::Submitted => {
                    tx.send(Action::FeedbackSent).ok();
                }
                Ok(()) => {
                    tx.send(Action::Notice("Feedback skipped".to_string())).ok();
                }
                Err(e) => {
                    tx.send(Action::from(e)).ok();
                }
            }
        });
    }

    fn spawn_history(&self, id: PromptId) {
        let tx = self.action_tx.clone();
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            let result = backend.history(id).await.map_err(LoadError::from);
            tx.send(Action::HistoryLoaded { id, result }).ok();
        });
    }

    fn spawn_moderate(&self, confirm: ConfirmAction) {
        let tx = self.action_tx.clone();
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            let (id, result) = match confirm {
                ConfirmAction::Approve(id) => (id, backend.approve(id).await),
                ConfirmAction::Reject(id) => (id, backend.reject(id).await),
            };
            let result = result.map_err(LoadError::from);
            tx.send(Action::Moderated { id, result }).ok();
        });
    }

    /// Whether the status bar should show the loading indicator.
    pub fn is_loading(&self) -> bool {
        matches!(self.feed.status(), LoadStatus::Loading)
    }
}
