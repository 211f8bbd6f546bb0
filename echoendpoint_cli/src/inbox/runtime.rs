//! Single-writer event loop around the inbox
//!
//! Network work runs in spawned tasks that report back over one mpsc
//! channel. The owner of the [`InboxRuntime`] feeds every completion into
//! [`handle_event`](InboxRuntime::handle_event) and every user action into
//! [`handle_command`](InboxRuntime::handle_command); state is only ever
//! touched from there.

use super::controller::Inbox;
use super::selection::DetailTicket;
use super::sink::{NoticeKind, ViewSink};
use crate::client::ApiClient;
use crate::stream::{StreamHandle, StreamListener, StreamStatus};
use echoendpoint_common::{RequestDetail, RequestId, RequestSummary};
use tokio::sync::mpsc;

const EVENT_BUFFER: usize = 256;

/// Why a page was fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// First page at startup
    Initial,
    /// Next page at the cursor
    More,
    /// Full repopulation from offset zero
    Refresh,
}

/// Completions reported to the loop
#[derive(Debug)]
pub enum InboxEvent {
    PageLoaded {
        kind: PageKind,
        result: Result<Vec<RequestSummary>, String>,
    },
    DetailLoaded {
        ticket: DetailTicket,
        result: Result<RequestDetail, String>,
    },
    Pushed(RequestSummary),
    StreamStatus(StreamStatus),
    ClearFinished(Result<(), String>),
}

/// User actions coming from a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Select(RequestId),
    Deselect,
    LoadMore,
    ClearAll,
}

pub struct InboxRuntime<V: ViewSink> {
    inbox: Inbox<V>,
    client: ApiClient,
    token: String,
    events_tx: mpsc::Sender<InboxEvent>,
    pages_in_flight: usize,
    clear_in_flight: bool,
    stream_status: StreamStatus,
}

impl<V: ViewSink> InboxRuntime<V> {
    /// Build the runtime and the receiver its completions arrive on
    pub fn new(
        sink: V,
        client: ApiClient,
        token: String,
        page_limit: u32,
    ) -> (Self, mpsc::Receiver<InboxEvent>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let runtime = Self {
            inbox: Inbox::new(sink, page_limit),
            client,
            token,
            events_tx,
            pages_in_flight: 0,
            clear_in_flight: false,
            stream_status: StreamStatus::Connecting,
        };
        (runtime, events_rx)
    }

    /// Issue the initial page fetch
    pub fn start(&mut self) {
        tracing::debug!("Loading first page for endpoint {}", self.token);
        self.fetch_page(PageKind::Initial);
    }

    /// Open the live stream; it stays up until the handle is dropped
    pub fn spawn_stream(&self) -> StreamHandle {
        StreamListener::spawn(
            self.client.clone(),
            self.token.clone(),
            self.events_tx.clone(),
        )
    }

    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::Select(id) => {
                let ticket = self.inbox.select(id);
                self.fetch_detail(ticket);
            }
            Command::Deselect => self.inbox.deselect(),
            Command::LoadMore => {
                if self.pages_in_flight > 0 {
                    tracing::debug!("Page fetch already in flight; ignoring load more");
                    return;
                }
                self.fetch_page(PageKind::More);
            }
            Command::ClearAll => {
                if self.clear_in_flight {
                    tracing::debug!("Clear already in flight");
                    return;
                }
                self.clear_in_flight = true;
                self.clear();
            }
        }
    }

    pub fn handle_event(&mut self, event: InboxEvent) {
        match event {
            InboxEvent::PageLoaded { kind, result } => {
                self.pages_in_flight = self.pages_in_flight.saturating_sub(1);
                self.page_loaded(kind, result);
            }
            InboxEvent::DetailLoaded { ticket, result } => match result {
                Ok(detail) => {
                    self.inbox.apply_detail(&ticket, &detail);
                }
                Err(reason) => {
                    self.inbox.detail_failed(&ticket, &reason);
                }
            },
            InboxEvent::Pushed(summary) => {
                self.inbox.push_one(summary);
            }
            InboxEvent::StreamStatus(status) => {
                self.stream_status = status;
                if status == StreamStatus::Closed {
                    self.inbox.notify(
                        NoticeKind::Failure,
                        "Live updates stopped",
                        "The event stream for this endpoint is unavailable.",
                    );
                }
            }
            InboxEvent::ClearFinished(result) => {
                self.clear_in_flight = false;
                if self.inbox.finish_clear(result) {
                    self.fetch_page(PageKind::Refresh);
                }
            }
        }
    }

    fn page_loaded(&mut self, kind: PageKind, result: Result<Vec<RequestSummary>, String>) {
        let items = match result {
            Ok(items) => items,
            Err(reason) => {
                tracing::warn!("Failed to load requests: {}", reason);
                self.inbox.notify(
                    NoticeKind::Failure,
                    "Load failed",
                    "Could not load requests.",
                );
                return;
            }
        };

        match kind {
            // a confirmed clear already rewound the feed; pushes since then stay
            PageKind::Initial | PageKind::Refresh => {
                self.inbox.append_page(items);
            }
            PageKind::More => {
                let added = self.inbox.append_page(items);
                let message = match added {
                    0 => "No new requests".to_string(),
                    1 => "1 new request".to_string(),
                    n => format!("{} new requests", n),
                };
                self.inbox.notify(NoticeKind::Info, "Loaded", &message);
            }
        }
    }

    fn fetch_page(&mut self, kind: PageKind) {
        let cursor = self.inbox.cursor();
        let offset = match kind {
            PageKind::More => cursor.offset,
            PageKind::Initial | PageKind::Refresh => 0,
        };
        self.pages_in_flight += 1;

        let client = self.client.clone();
        let token = self.token.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client
                .list_requests(&token, cursor.limit, offset)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(InboxEvent::PageLoaded { kind, result }).await;
        });
    }

    fn fetch_detail(&self, ticket: DetailTicket) {
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client
                .request_detail(&ticket.id)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(InboxEvent::DetailLoaded { ticket, result }).await;
        });
    }

    fn clear(&self) {
        let client = self.client.clone();
        let token = self.token.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client
                .clear_requests(&token)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(InboxEvent::ClearFinished(result)).await;
        });
    }

    #[cfg(test)]
    pub fn inbox(&self) -> &Inbox<V> {
        &self.inbox
    }

    pub fn sink(&self) -> &V {
        self.inbox.sink()
    }

    pub fn sink_mut(&mut self) -> &mut V {
        self.inbox.sink_mut()
    }

    pub fn stream_status(&self) -> StreamStatus {
        self.stream_status
    }
}
