//! Render and notification interface the inbox drives

use super::detail::DetailView;
use echoendpoint_common::{RequestId, RequestSummary};

/// Kind of user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
    Info,
}

/// Everything the inbox needs from a view.
///
/// The inbox owns the state; a sink only mirrors what it is told.
pub trait ViewSink {
    fn render_list_appended(&mut self, item: &RequestSummary);
    fn render_list_prepended(&mut self, item: &RequestSummary);
    fn render_list_cleared(&mut self);
    fn render_count(&mut self, count: usize);
    /// Mark the selected row, or none
    fn render_active(&mut self, id: Option<&RequestId>);
    fn render_detail(&mut self, detail: &DetailView);
    fn render_detail_loading(&mut self);
    fn render_detail_empty(&mut self);
    fn notify(&mut self, kind: NoticeKind, title: &str, message: &str);
}
