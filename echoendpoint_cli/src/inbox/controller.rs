//! Inbox state: feed + selection + the view they render into

use super::feed::{Cursor, InboxFeed};
use super::selection::{DetailTicket, SelectionController};
use super::sink::{NoticeKind, ViewSink};
use echoendpoint_common::{RequestDetail, RequestId, RequestSummary};

/// Synchronous half of the inbox.
///
/// Owns the feed, the selection and the sink. Every mutation goes through
/// here from a single task; network work lives in
/// [`InboxRuntime`](super::runtime::InboxRuntime).
pub struct Inbox<V: ViewSink> {
    feed: InboxFeed,
    selection: SelectionController,
    sink: V,
}

impl<V: ViewSink> Inbox<V> {
    pub fn new(sink: V, page_limit: u32) -> Self {
        let mut inbox = Self {
            feed: InboxFeed::new(page_limit),
            selection: SelectionController::new(),
            sink,
        };
        inbox.sink.render_detail_empty();
        inbox.sink.render_count(0);
        inbox
    }

    pub fn append_page(&mut self, items: Vec<RequestSummary>) -> usize {
        self.feed.append_page(items, &mut self.sink)
    }

    pub fn push_one(&mut self, item: RequestSummary) -> bool {
        self.feed.push_one(item, &mut self.sink)
    }

    pub fn select(&mut self, id: RequestId) -> DetailTicket {
        self.selection.select(id, &mut self.sink)
    }

    pub fn apply_detail(&mut self, ticket: &DetailTicket, detail: &RequestDetail) -> bool {
        self.selection.apply_detail(ticket, detail, &mut self.sink)
    }

    /// A detail fetch failed; only the current selection reports it
    pub fn detail_failed(&mut self, ticket: &DetailTicket, reason: &str) -> bool {
        if !self.selection.is_current(ticket) {
            tracing::debug!("Ignoring failed stale detail fetch for {}: {}", ticket.id, reason);
            return false;
        }
        tracing::warn!("Failed to load request {}: {}", ticket.id, reason);
        self.sink.notify(
            NoticeKind::Failure,
            "Load failed",
            &format!("Could not load request {}.", ticket.id),
        );
        true
    }

    pub fn deselect(&mut self) {
        self.selection.deselect(&mut self.sink);
    }

    /// Settle a clear-all once the backend has answered.
    ///
    /// Local state is only wiped after the server confirmed; on failure it
    /// is left exactly as it was.
    pub fn finish_clear(&mut self, outcome: Result<(), String>) -> bool {
        match outcome {
            Ok(()) => {
                self.feed.clear(&mut self.sink);
                self.selection.deselect(&mut self.sink);
                self.sink.notify(
                    NoticeKind::Success,
                    "Cleared",
                    "All captured requests were removed.",
                );
                true
            }
            Err(reason) => {
                tracing::warn!("Clear failed: {}", reason);
                self.sink.notify(
                    NoticeKind::Failure,
                    "Clear failed",
                    "Could not clear requests.",
                );
                false
            }
        }
    }

    pub fn notify(&mut self, kind: NoticeKind, title: &str, message: &str) {
        self.sink.notify(kind, title, message);
    }

    pub fn cursor(&self) -> Cursor {
        self.feed.cursor()
    }

    #[cfg(test)]
    pub fn feed(&self) -> &InboxFeed {
        &self.feed
    }

    #[cfg(test)]
    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn sink(&self) -> &V {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut V {
        &mut self.sink
    }
}
