use std::collections::HashSet;

use crate::types::{Prompt, PromptId};

/// Ids the viewer has bookmarked, as far as this client knows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkSet {
    ids: HashSet<PromptId>,
}

impl BookmarkSet {
    pub fn contains(&self, id: PromptId) -> bool {
        self.ids.contains(&id)
    }

    pub fn set(&mut self, id: PromptId, bookmarked: bool) {
        if bookmarked {
            self.ids.insert(id);
        } else {
            self.ids.remove(&id);
        }
    }

    /// Pick up the server's `is_bookmarked` flags from a fetched page.
    pub fn absorb<'a>(&mut self, prompts: impl IntoIterator<Item = &'a Prompt>) {
        self.ids
            .extend(prompts.into_iter().filter(|p| p.is_bookmarked).map(|p| p.id));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::testing::prompt;

    #[test]
    fn set_adds_and_removes() {
        let mut set = BookmarkSet::default();
        set.set(4, true);
        assert!(set.contains(4));
        set.set(4, false);
        assert_eq!(set, BookmarkSet::default());
    }

    #[test]
    fn absorb_takes_only_bookmarked() {
        let mut a = prompt(1);
        a.is_bookmarked = true;
        let b = prompt(2);
        let mut set = BookmarkSet::default();
        set.absorb([&a, &b]);
        assert!(set.contains(1));
        assert!(!set.contains(2));
        set.clear();
        assert!(!set.contains(1));
    }
}
