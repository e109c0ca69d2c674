use std::collections::HashSet;

use crate::types::{ListPage, Prompt, PromptId};

/// Items fetched so far for one generation, in fetch order.
#[derive(Debug, Clone)]
pub struct PageCache {
    items: Vec<Prompt>,
    ids: HashSet<PromptId>,
    next_offset: usize,
    has_more: bool,
}

impl Default for PageCache {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            ids: HashSet::new(),
            next_offset: 0,
            // Nothing fetched yet, so the source is presumed non-empty.
            has_more: true,
        }
    }
}

impl PageCache {
    pub fn items(&self) -> &[Prompt] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn next_offset(&self) -> usize {
        self.next_offset
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn get(&self, id: PromptId) -> Option<&Prompt> {
        self.items.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PromptId) -> Option<&mut Prompt> {
        self.items.iter_mut().find(|p| p.id == id)
    }

    /// Append one fetched page. The cursor advances by the requested `limit`
    /// whatever the dedup outcome; a page the server sent short marks the
    /// source exhausted. Returns how many new items were kept; they are the
    /// last `added` entries of [`PageCache::items`].
    pub fn append_page(&mut self, page: ListPage, limit: usize) -> usize {
        let returned = page.returned;
        let mut added = 0;
        for prompt in page.items {
            if self.ids.insert(prompt.id) {
                self.items.push(prompt);
                added += 1;
            }
        }
        self.next_offset += limit;
        self.has_more = returned == limit;
        added
    }

    /// Drop an item that no longer belongs to the server-side result set.
    /// The cursor steps back so the next page starts where the server's does.
    pub fn remove(&mut self, id: PromptId) -> Option<Prompt> {
        let pos = self.items.iter().position(|p| p.id == id)?;
        self.ids.remove(&id);
        self.next_offset = self.next_offset.saturating_sub(1);
        Some(self.items.remove(pos))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
