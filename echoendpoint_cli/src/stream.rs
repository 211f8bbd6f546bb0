//! Live event stream listener
//!
//! Holds one server-sent event connection for an endpoint token and
//! forwards every decoded `request_received` event to the inbox runtime.
//! Malformed payloads are dropped with a warning. When the stream ends the
//! listener reconnects with capped exponential backoff.

use crate::client::{ApiClient, ClientError};
use crate::inbox::InboxEvent;
use echoendpoint_common::{constants, RequestSummary};
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::Response;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Connection state of the live stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Connecting,
    Live,
    Reconnecting,
    Closed,
}

impl StreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamStatus::Connecting => "connecting",
            StreamStatus::Live => "live",
            StreamStatus::Reconnecting => "reconnecting",
            StreamStatus::Closed => "closed",
        }
    }
}

/// Owns the listener task; dropping it tears the connection down
pub struct StreamHandle {
    task: Option<JoinHandle<()>>,
}

impl StreamHandle {
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Doubling delay between reconnect attempts
#[derive(Debug)]
struct Backoff {
    next: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self {
            next: INITIAL_BACKOFF,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(MAX_BACKOFF);
        delay
    }

    fn reset(&mut self) {
        self.next = INITIAL_BACKOFF;
    }
}

/// What ended one connection
enum StreamEnd {
    /// The server closed the stream or it failed mid-read
    Dropped,
    /// Nobody is listening anymore
    ReceiverGone,
}

pub struct StreamListener {
    client: ApiClient,
    token: String,
    events_tx: mpsc::Sender<InboxEvent>,
}

impl StreamListener {
    /// Start listening in a background task
    pub fn spawn(
        client: ApiClient,
        token: String,
        events_tx: mpsc::Sender<InboxEvent>,
    ) -> StreamHandle {
        let listener = Self {
            client,
            token,
            events_tx,
        };
        let task = tokio::spawn(listener.run());
        StreamHandle { task: Some(task) }
    }

    async fn run(self) {
        let mut backoff = Backoff::new();
        let mut status = StreamStatus::Connecting;

        loop {
            if !self.report(status).await {
                return;
            }

            match self.client.open_events(&self.token).await {
                Ok(response) => {
                    backoff.reset();
                    if !self.report(StreamStatus::Live).await {
                        return;
                    }
                    tracing::debug!("Live event stream connected");
                    if let StreamEnd::ReceiverGone = self.consume(response).await {
                        return;
                    }
                }
                Err(ClientError::NotFound { .. }) => {
                    tracing::warn!("Event stream not found for this endpoint; live updates stopped");
                    self.report(StreamStatus::Closed).await;
                    return;
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                }
            }

            status = StreamStatus::Reconnecting;
            if !self.report(status).await {
                return;
            }
            let delay = backoff.next_delay();
            tracing::debug!("Reconnecting event stream in {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }

    async fn consume(&self, response: Response) -> StreamEnd {
        let mut events = response.bytes_stream().eventsource();

        while let Some(event) = events.next().await {
            match event {
                Ok(event) if event.event == constants::REQUEST_RECEIVED_EVENT => {
                    let Some(summary) = decode_push(&event.data) else {
                        continue;
                    };
                    if self.events_tx.send(InboxEvent::Pushed(summary)).await.is_err() {
                        return StreamEnd::ReceiverGone;
                    }
                }
                Ok(event) => {
                    tracing::debug!("Ignoring stream event {:?}", event.event);
                }
                Err(e) => {
                    tracing::warn!("Event stream read failed: {}", e);
                    return StreamEnd::Dropped;
                }
            }
        }

        tracing::debug!("Event stream closed by server");
        StreamEnd::Dropped
    }

    async fn report(&self, status: StreamStatus) -> bool {
        self.events_tx
            .send(InboxEvent::StreamStatus(status))
            .await
            .is_ok()
    }
}

/// Decode a pushed payload; malformed data is dropped with a warning
pub fn decode_push(data: &str) -> Option<RequestSummary> {
    match RequestSummary::from_event_data(data) {
        Ok(summary) => Some(summary),
        Err(e) => {
            tracing::warn!("Dropping malformed request_received payload: {}", e);
            None
        }
    }
}
