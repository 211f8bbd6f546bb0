//! Deduplicated inbox list fed by page fetches and pushed events

use super::sink::ViewSink;
use echoendpoint_common::{RequestId, RequestSummary};
use std::collections::{HashSet, VecDeque};

/// Ids already materialized in the list
#[derive(Debug, Default)]
pub struct IdentitySet {
    ids: HashSet<RequestId>,
}

impl IdentitySet {
    /// Returns false if the id was already present
    pub fn insert(&mut self, id: &RequestId) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        self.ids.insert(id.clone())
    }

    #[cfg(test)]
    pub fn contains(&self, id: &RequestId) -> bool {
        self.ids.contains(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Pagination position; `offset` only moves by what was actually appended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub offset: u32,
    pub limit: u32,
}

impl Cursor {
    pub fn new(limit: u32) -> Self {
        Self { offset: 0, limit }
    }
}

/// The rendered request list
pub struct InboxFeed {
    identities: IdentitySet,
    rows: VecDeque<RequestSummary>,
    cursor: Cursor,
    /// One duplicate warning per session
    duplicate_noticed: bool,
    duplicates_skipped: usize,
}

impl InboxFeed {
    pub fn new(limit: u32) -> Self {
        Self {
            identities: IdentitySet::default(),
            rows: VecDeque::new(),
            cursor: Cursor::new(limit),
            duplicate_noticed: false,
            duplicates_skipped: 0,
        }
    }

    /// Append a fetched page at the tail, skipping ids already shown.
    ///
    /// Returns how many rows were added; the cursor advances by exactly that.
    pub fn append_page<V: ViewSink + ?Sized>(
        &mut self,
        items: Vec<RequestSummary>,
        sink: &mut V,
    ) -> usize {
        let mut added = 0;
        for item in items {
            if !self.identities.insert(&item.id) {
                self.note_duplicate(&item.id);
                continue;
            }
            sink.render_list_appended(&item);
            self.rows.push_back(item);
            added += 1;
        }
        self.cursor.offset += added as u32;
        sink.render_count(self.rows.len());
        added
    }

    /// Insert a live-pushed item at the head unless it is already shown
    pub fn push_one<V: ViewSink + ?Sized>(&mut self, item: RequestSummary, sink: &mut V) -> bool {
        if !self.identities.insert(&item.id) {
            self.note_duplicate(&item.id);
            return false;
        }
        sink.render_list_prepended(&item);
        self.rows.push_front(item);
        sink.render_count(self.rows.len());
        true
    }

    /// Drop every row and identity and rewind the cursor
    pub fn clear<V: ViewSink + ?Sized>(&mut self, sink: &mut V) {
        self.identities.clear();
        self.rows.clear();
        self.cursor.offset = 0;
        sink.render_list_cleared();
        sink.render_count(0);
    }

    #[cfg(test)]
    pub fn rows(&self) -> &VecDeque<RequestSummary> {
        &self.rows
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[cfg(test)]
    pub fn contains(&self, id: &RequestId) -> bool {
        self.identities.contains(id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns true only for the duplicate that produced the warning
    fn note_duplicate(&mut self, id: &RequestId) -> bool {
        self.duplicates_skipped += 1;
        if self.duplicate_noticed {
            tracing::trace!(
                "Skipping duplicate request {} ({} so far)",
                id,
                self.duplicates_skipped
            );
            return false;
        }
        self.duplicate_noticed = true;
        tracing::warn!(
            "Request {} already listed; further duplicates from overlapping fetch and live events are skipped silently",
            id
        );
        true
    }
}
