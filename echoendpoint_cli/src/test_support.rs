//! Shared test helpers: a recording view sink and an in-process backend

use crate::inbox::{DetailView, InboxEvent, NoticeKind, ViewSink};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, Sse},
        IntoResponse, Redirect, Response,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, TimeZone, Utc};
use echoendpoint_common::{
    ListPage, RequestDetail, RequestId, RequestSummary, ResponseConfig,
};
use futures_util::{stream, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

pub const TOKEN: &str = "tok";

fn received_at() -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 20, 30).single()
}

pub fn summary(id: i64) -> RequestSummary {
    RequestSummary {
        id: RequestId::Number(id),
        received_at: received_at(),
        method: Some("POST".to_string()),
        path: Some(format!("/wh/{}", TOKEN)),
    }
}

pub fn detail(id: i64) -> RequestDetail {
    let body = format!(r#"{{"n":{}}}"#, id);
    RequestDetail {
        id: RequestId::Number(id),
        method: "POST".to_string(),
        path: format!("/wh/{}", TOKEN),
        received_at: received_at(),
        remote_ip: Some("127.0.0.1".to_string()),
        headers_json: Some(r#"{"content-type":"application/json"}"#.to_string()),
        query: Some("a=1".to_string()),
        body_size: body.len() as u64,
        body_text: Some(body),
        body_blob_base64: None,
        truncated: false,
    }
}

/// Wait for the next runtime event, failing the test after five seconds
pub async fn next_event(rx: &mut mpsc::Receiver<InboxEvent>) -> InboxEvent {
    match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
        Ok(Some(event)) => event,
        Ok(None) => panic!("event channel closed"),
        Err(_) => panic!("timed out waiting for an inbox event"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetailShown {
    #[default]
    Empty,
    Loading,
    Ready(RequestId),
}

/// Sink that mirrors every render call into inspectable fields
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub rows: VecDeque<RequestSummary>,
    pub count: usize,
    pub active: Option<RequestId>,
    pub detail: DetailShown,
    pub last_view: Option<DetailView>,
    pub notices: Vec<(NoticeKind, String, String)>,
}

impl RecordingSink {
    pub fn list_ids(&self) -> Vec<i64> {
        self.rows
            .iter()
            .map(|r| match r.id {
                RequestId::Number(n) => n,
                RequestId::Text(_) => -1,
            })
            .collect()
    }

    pub fn last_notice(&self) -> Option<&(NoticeKind, String, String)> {
        self.notices.last()
    }
}

impl ViewSink for RecordingSink {
    fn render_list_appended(&mut self, item: &RequestSummary) {
        self.rows.push_back(item.clone());
    }

    fn render_list_prepended(&mut self, item: &RequestSummary) {
        self.rows.push_front(item.clone());
    }

    fn render_list_cleared(&mut self) {
        self.rows.clear();
    }

    fn render_count(&mut self, count: usize) {
        self.count = count;
    }

    fn render_active(&mut self, id: Option<&RequestId>) {
        self.active = id.cloned();
    }

    fn render_detail(&mut self, detail: &DetailView) {
        self.detail = DetailShown::Ready(detail.id.clone());
        self.last_view = Some(detail.clone());
    }

    fn render_detail_loading(&mut self) {
        self.detail = DetailShown::Loading;
    }

    fn render_detail_empty(&mut self) {
        self.detail = DetailShown::Empty;
        self.last_view = None;
    }

    fn notify(&mut self, kind: NoticeKind, title: &str, message: &str) {
        self.notices
            .push((kind, title.to_string(), message.to_string()));
    }
}

struct FakeState {
    /// Newest first, the way the list endpoint serves them
    requests: Mutex<Vec<RequestDetail>>,
    clear_status: Mutex<StatusCode>,
    detail_delays: Mutex<HashMap<RequestId, Duration>>,
    response: Mutex<Option<ResponseConfig>>,
    events: broadcast::Sender<(String, String)>,
}

/// Capture backend running on an ephemeral local port
pub struct FakeBackend {
    pub base_url: String,
    state: Arc<FakeState>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let (events_tx, _) = broadcast::channel(64);
        let state = Arc::new(FakeState {
            requests: Mutex::new(Vec::new()),
            clear_status: Mutex::new(StatusCode::OK),
            detail_delays: Mutex::new(HashMap::new()),
            response: Mutex::new(None),
            events: events_tx,
        });

        let app = Router::new()
            .route("/api/endpoints/{token}/requests", get(list_requests))
            .route("/api/endpoints/{token}/clear", post(clear_requests))
            .route("/api/endpoints/{token}/export", get(export_requests))
            .route(
                "/api/endpoints/{token}/response",
                get(get_response).put(put_response).delete(delete_response),
            )
            .route("/api/requests/{id}", get(request_detail))
            .route("/events/{token}", get(stream_events))
            .route("/create", post(create_endpoint))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Store requests; later ids end up nearer the head
    pub fn seed(&self, ids: impl IntoIterator<Item = i64>) {
        let mut requests = self.state.requests.lock().unwrap();
        for id in ids {
            requests.insert(0, detail(id));
        }
    }

    /// Capture a new request and announce it on the event stream
    pub fn capture(&self, id: i64) {
        self.seed([id]);
        let payload = serde_json::to_string(&summary(id)).unwrap();
        self.push_raw("request_received", &payload);
    }

    pub fn push_raw(&self, event: &str, data: &str) {
        let _ = self.state.events.send((event.to_string(), data.to_string()));
    }

    pub fn set_clear_status(&self, status: StatusCode) {
        *self.state.clear_status.lock().unwrap() = status;
    }

    pub fn set_detail_delay(&self, id: i64, delay: Duration) {
        self.state
            .detail_delays
            .lock()
            .unwrap()
            .insert(RequestId::Number(id), delay);
    }

    pub fn stored_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    /// Block until some client holds the event stream open
    pub async fn wait_for_subscriber(&self) {
        for _ in 0..200 {
            if self.state.events.receiver_count() > 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no event stream subscriber connected");
    }
}

type Shared = State<Arc<FakeState>>;

fn known(token: &str) -> Result<(), StatusCode> {
    if token == TOKEN {
        Ok(())
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

#[derive(Deserialize)]
struct PageParams {
    limit: Option<u32>,
    offset: Option<u32>,
}

async fn list_requests(
    State(state): Shared,
    Path(token): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListPage>, StatusCode> {
    known(&token)?;
    let limit = params.limit.unwrap_or(200);
    let offset = params.offset.unwrap_or(0);
    let items = state
        .requests
        .lock()
        .unwrap()
        .iter()
        .skip(offset as usize)
        .take(limit as usize)
        .map(RequestDetail::summary)
        .collect();
    Ok(Json(ListPage {
        items,
        limit,
        offset,
    }))
}

async fn request_detail(
    State(state): Shared,
    Path(id): Path<String>,
) -> Result<Json<RequestDetail>, StatusCode> {
    let id: RequestId = match id.parse() {
        Ok(id) => id,
        Err(never) => match never {},
    };
    let delay = state.detail_delays.lock().unwrap().get(&id).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    state
        .requests
        .lock()
        .unwrap()
        .iter()
        .find(|r| r.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn clear_requests(State(state): Shared, Path(token): Path<String>) -> StatusCode {
    if let Err(status) = known(&token) {
        return status;
    }
    let status = *state.clear_status.lock().unwrap();
    if status.is_success() {
        state.requests.lock().unwrap().clear();
    }
    status
}

async fn export_requests(
    State(state): Shared,
    Path(token): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    known(&token)?;
    let requests = state.requests.lock().unwrap().clone();
    Ok(Json(json!({
        "endpoint": { "token": token },
        "requests": requests,
    })))
}

async fn get_response(
    State(state): Shared,
    Path(token): Path<String>,
) -> Result<Json<ResponseConfig>, StatusCode> {
    known(&token)?;
    state
        .response
        .lock()
        .unwrap()
        .clone()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn put_response(
    State(state): Shared,
    Path(token): Path<String>,
    Json(update): Json<Value>,
) -> StatusCode {
    if let Err(status) = known(&token) {
        return status;
    }
    let config = ResponseConfig {
        status_code: update["status_code"].as_u64().unwrap_or(200) as u16,
        body: update["body"].clone(),
        content_type: update["content_type"].as_str().map(str::to_string),
    };
    *state.response.lock().unwrap() = Some(config);
    StatusCode::OK
}

async fn delete_response(State(state): Shared, Path(token): Path<String>) -> StatusCode {
    if let Err(status) = known(&token) {
        return status;
    }
    *state.response.lock().unwrap() = None;
    StatusCode::OK
}

async fn create_endpoint() -> Redirect {
    Redirect::to("/e/fresh_token")
}

async fn stream_events(State(state): Shared, Path(token): Path<String>) -> Response {
    if known(&token).is_err() {
        return StatusCode::NOT_FOUND.into_response();
    }
    Sse::new(event_stream(state.events.subscribe())).into_response()
}

fn event_stream(
    rx: broadcast::Receiver<(String, String)>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    // a leading comment flushes the response head before the first event
    let hello = stream::once(async { Ok::<_, Infallible>(Event::default().comment("connected")) });
    let relayed = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok((name, data)) => {
                    return Some((Ok::<_, Infallible>(Event::default().event(name).data(data)), rx));
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });
    hello.chain(relayed)
}
