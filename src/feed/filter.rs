use std::collections::BTreeSet;

use crate::feed::bookmarks::BookmarkSet;
use crate::types::{Prompt, Tab, ViewerContext};

/// Client-side filters. Changing them never refetches; they only shape the
/// projection of what is already cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub categories: BTreeSet<String>,
    pub task_types: BTreeSet<String>,
    pub output_formats: BTreeSet<String>,
    pub mine_only: bool,
    pub bookmarked_only: bool,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        *self == FilterState::default()
    }

    /// Short human summary of the active filters for the filter bar.
    pub fn describe(&self) -> Vec<String> {
        let mut parts = Vec::new();
        if !self.search.is_empty() {
            parts.push(format!("\"{}\"", self.search));
        }
        for (label, set) in [
            ("dept", &self.categories),
            ("task", &self.task_types),
            ("output", &self.output_formats),
        ] {
            if !set.is_empty() {
                let values: Vec<&str> = set.iter().map(String::as_str).collect();
                parts.push(format!("{}: {}", label, values.join(",")));
            }
        }
        if self.mine_only {
            parts.push("mine".to_string());
        }
        if self.bookmarked_only {
            parts.push("bookmarked".to_string());
        }
        parts
    }
}

/// Visibility rule attached to the active tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewRule {
    /// Only approved, public prompts.
    Listed,
    /// Only the viewer's own prompts, whatever their status.
    Owned,
    /// The server already narrowed the list.
    Unrestricted,
}

impl From<&Tab> for ViewRule {
    fn from(tab: &Tab) -> Self {
        match tab {
            Tab::Browse | Tab::Author(_) => ViewRule::Listed,
            Tab::Mine => ViewRule::Owned,
            Tab::Pending | Tab::Approved => ViewRule::Unrestricted,
        }
    }
}

fn matches_any(selected: &BTreeSet<String>, value: &str) -> bool {
    selected.is_empty() || (!value.is_empty() && selected.contains(value))
}

fn is_viewers(prompt: &Prompt, viewer: Option<&ViewerContext>) -> bool {
    viewer.is_some_and(|v| prompt.author == v.username)
}

/// Derive the visible list from cached items. Pure and order-preserving.
pub fn project<'a>(
    items: &'a [Prompt],
    filter: &FilterState,
    viewer: Option<&ViewerContext>,
    bookmarks: &BookmarkSet,
    rule: ViewRule,
) -> Vec<&'a Prompt> {
    let needle = filter.search.trim().to_lowercase();

    items
        .iter()
        .filter(|p| match rule {
            ViewRule::Listed => p.is_listed(),
            ViewRule::Owned => is_viewers(p, viewer),
            ViewRule::Unrestricted => true,
        })
        .filter(|p| {
            needle.is_empty()
                || p.title.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
                || p.text.to_lowercase().contains(&needle)
        })
        .filter(|p| matches_any(&filter.categories, &p.category))
        .filter(|p| matches_any(&filter.task_types, &p.task_type))
        .filter(|p| matches_any(&filter.output_formats, &p.output_format))
        .filter(|p| !filter.mine_only || is_viewers(p, viewer))
        .filter(|p| !filter.bookmarked_only || bookmarks.contains(p.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::testing::prompt;
    use crate::types::{PromptStatus, Visibility};

    fn viewer() -> ViewerContext {
        ViewerContext {
            username: "ana".into(),
            is_admin: false,
        }
    }

    fn library() -> Vec<Prompt> {
        let mut a = prompt(1);
        a.title = "Summarize meeting notes".into();
        a.category = "hr".into();
        a.task_type = "summarize".into();
        a.output_format = "text".into();

        let mut b = prompt(2);
        b.title = "Refactor Rust".into();
        b.description = "Clean up a MODULE".into();
        b.category = "engineering".into();
        b.task_type = "create_code".into();
        b.output_format = "code".into();
        b.author = "bo".into();

        let mut c = prompt(3);
        c.title = "Draft launch email".into();
        c.category = "marketing".into();
        c.status = PromptStatus::Pending;

        let mut d = prompt(4);
        d.title = "Private checklist".into();
        d.visibility = Visibility::Private;
        d.output_format = "checklist_table".into();

        vec![a, b, c, d]
    }

    fn ids(list: &[&Prompt]) -> Vec<u64> {
        list.iter().map(|p| p.id).collect()
    }

    #[test]
    fn browse_shows_only_listed() {
        let items = library();
        let out = project(
            &items,
            &FilterState::default(),
            Some(&viewer()),
            &BookmarkSet::default(),
            ViewRule::Listed,
        );
        assert_eq!(ids(&out), vec![1, 2]);
    }

    #[test]
    fn owned_bypasses_status_and_visibility() {
        let items = library();
        let out = project(
            &items,
            &FilterState::default(),
            Some(&viewer()),
            &BookmarkSet::default(),
            ViewRule::Owned,
        );
        assert_eq!(ids(&out), vec![1, 3, 4]);
    }

    #[test]
    fn owned_without_viewer_is_empty() {
        let items = library();
        let out = project(
            &items,
            &FilterState::default(),
            None,
            &BookmarkSet::default(),
            ViewRule::Owned,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let items = library();
        let filter = FilterState {
            search: "module".into(),
            ..FilterState::default()
        };
        let out = project(&items, &filter, None, &BookmarkSet::default(), ViewRule::Unrestricted);
        assert_eq!(ids(&out), vec![2]);

        let filter = FilterState {
            search: "  LAUNCH ".into(),
            ..FilterState::default()
        };
        let out = project(&items, &filter, None, &BookmarkSet::default(), ViewRule::Unrestricted);
        assert_eq!(ids(&out), vec![3]);
    }

    #[test]
    fn selections_compose_with_and() {
        let items = library();
        let mut filter = FilterState::default();
        filter.categories.insert("hr".into());
        filter.categories.insert("engineering".into());
        filter.output_formats.insert("code".into());
        let out = project(&items, &filter, None, &BookmarkSet::default(), ViewRule::Unrestricted);
        assert_eq!(ids(&out), vec![2]);
    }

    #[test]
    fn empty_field_never_matches_a_selection() {
        let items = library();
        let mut filter = FilterState::default();
        filter.task_types.insert("summarize".into());
        let out = project(&items, &filter, None, &BookmarkSet::default(), ViewRule::Unrestricted);
        assert_eq!(ids(&out), vec![1]);
    }

    #[test]
    fn mine_and_bookmarked_toggles() {
        let items = library();
        let mut marks = BookmarkSet::default();
        marks.set(2, true);
        marks.set(4, true);

        let filter = FilterState {
            bookmarked_only: true,
            ..FilterState::default()
        };
        let out = project(&items, &filter, Some(&viewer()), &marks, ViewRule::Unrestricted);
        assert_eq!(ids(&out), vec![2, 4]);

        let filter = FilterState {
            bookmarked_only: true,
            mine_only: true,
            ..FilterState::default()
        };
        let out = project(&items, &filter, Some(&viewer()), &marks, ViewRule::Unrestricted);
        assert_eq!(ids(&out), vec![4]);
    }

    #[test]
    fn projection_is_idempotent_and_non_mutating() {
        let items = library();
        let before = items.clone();
        let mut filter = FilterState::default();
        filter.search = "r".into();
        let marks = BookmarkSet::default();
        let first = ids(&project(&items, &filter, Some(&viewer()), &marks, ViewRule::Listed));
        let second = ids(&project(&items, &filter, Some(&viewer()), &marks, ViewRule::Listed));
        assert_eq!(first, second);
        assert_eq!(items, before);
    }

    #[test]
    fn describe_lists_active_filters() {
        let mut filter = FilterState::default();
        assert!(filter.is_empty());
        filter.search = "rust".into();
        filter.task_types.insert("create_code".into());
        filter.bookmarked_only = true;
        assert_eq!(
            filter.describe(),
            vec!["\"rust\"", "task: create_code", "bookmarked"]
        );
    }

    #[test]
    fn tab_maps_to_rule() {
        assert_eq!(ViewRule::from(&Tab::Browse), ViewRule::Listed);
        assert_eq!(ViewRule::from(&Tab::Author("x".into())), ViewRule::Listed);
        assert_eq!(ViewRule::from(&Tab::Mine), ViewRule::Owned);
        assert_eq!(ViewRule::from(&Tab::Pending), ViewRule::Unrestricted);
    }
}
