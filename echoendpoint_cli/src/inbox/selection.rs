//! Detail selection with epoch-based invalidation
//!
//! Every selection change bumps the epoch. A detail fetch carries the epoch
//! and id it was started for ([`DetailTicket`]); its result is rendered only
//! while both still match, so a slow response can never overwrite a newer
//! selection or a cleared panel.

use super::detail::DetailView;
use super::sink::ViewSink;
use echoendpoint_common::{RequestDetail, RequestId};

/// Identifies one detail fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTicket {
    pub id: RequestId,
    pub epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    Pending,
    Resolved,
}

pub struct SelectionController {
    selected: Option<RequestId>,
    epoch: u64,
    state: SelectionState,
}

impl SelectionController {
    pub fn new() -> Self {
        Self {
            selected: None,
            epoch: 0,
            state: SelectionState::Idle,
        }
    }

    /// Make `id` the detail target and show the loading state.
    ///
    /// The caller fetches the detail and hands the result to
    /// [`apply_detail`](Self::apply_detail) together with the ticket.
    pub fn select<V: ViewSink + ?Sized>(&mut self, id: RequestId, sink: &mut V) -> DetailTicket {
        if self.state == SelectionState::Pending {
            if let Some(previous) = &self.selected {
                tracing::debug!("Request {} superseded before its detail arrived", previous);
            }
        }
        self.epoch += 1;
        self.selected = Some(id.clone());
        self.state = SelectionState::Pending;
        sink.render_active(Some(&id));
        sink.render_detail_loading();
        DetailTicket {
            id,
            epoch: self.epoch,
        }
    }

    /// Render a fetched detail if its ticket is still current
    pub fn apply_detail<V: ViewSink + ?Sized>(
        &mut self,
        ticket: &DetailTicket,
        detail: &RequestDetail,
        sink: &mut V,
    ) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                "Discarding stale detail for request {} (epoch {}, now {})",
                ticket.id,
                ticket.epoch,
                self.epoch
            );
            return false;
        }
        sink.render_detail(&DetailView::derive(detail));
        self.state = SelectionState::Resolved;
        true
    }

    /// Drop the selection and invalidate any fetch in flight
    pub fn deselect<V: ViewSink + ?Sized>(&mut self, sink: &mut V) {
        self.epoch += 1;
        self.selected = None;
        self.state = SelectionState::Idle;
        sink.render_active(None);
        sink.render_detail_empty();
    }

    pub fn is_current(&self, ticket: &DetailTicket) -> bool {
        ticket.epoch == self.epoch && self.selected.as_ref() == Some(&ticket.id)
    }

    #[cfg(test)]
    pub fn selected(&self) -> Option<&RequestId> {
        self.selected.as_ref()
    }

    #[cfg(test)]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[cfg(test)]
    pub fn state(&self) -> SelectionState {
        self.state
    }
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}
