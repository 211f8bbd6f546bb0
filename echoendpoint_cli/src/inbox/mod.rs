//! Live inbox synchronization
//!
//! Reconciles paginated fetches, pushed stream events and user actions into
//! one deduplicated request list plus a race-free detail panel. The
//! [`Inbox`] holds the state; the [`InboxRuntime`] is the single writer that
//! drives it from network completions.

mod controller;
mod detail;
mod feed;
mod runtime;
mod selection;
mod sink;

pub use detail::{format_timestamp, DetailView, UNKNOWN};
pub use runtime::{Command, InboxEvent, InboxRuntime};
pub use sink::{NoticeKind, ViewSink};
