//! HTTP client for the capture backend

use echoendpoint_common::{
    routes, ListPage, RequestDetail, RequestId, RequestSummary, ResponseConfig,
    ResponseConfigUpdate,
};
use reqwest::{redirect, Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Timeout for ordinary API calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Connect timeout for the long-lived event stream
const STREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("{context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{context}: server answered {status}")]
    Status {
        context: &'static str,
        status: StatusCode,
    },

    #[error("{context}: not found")]
    NotFound { context: &'static str },

    #[error("{context}: invalid response body: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Endpoint creation did not redirect to a dashboard")]
    MissingRedirect,
}

/// Client for the backend API and event stream
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
    stream_http: Client,
}

impl ApiClient {
    /// Create a client for a backend base URL
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ClientError::Build)?;

        // No overall timeout: the event stream stays open indefinitely
        let stream_http = Client::builder()
            .connect_timeout(STREAM_CONNECT_TIMEOUT)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            stream_http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch one page of captured requests, newest first
    pub async fn list_requests(
        &self,
        token: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RequestSummary>, ClientError> {
        const CONTEXT: &str = "Failed to load requests";
        let request = self
            .http
            .get(self.url(&routes::list(token)))
            .query(&[("limit", limit), ("offset", offset)]);
        let page: ListPage = decode(send(request, CONTEXT).await?, CONTEXT).await?;
        Ok(page.items)
    }

    /// Fetch the full detail of one request
    pub async fn request_detail(&self, id: &RequestId) -> Result<RequestDetail, ClientError> {
        const CONTEXT: &str = "Failed to load request detail";
        let request = self.http.get(self.url(&routes::detail(id)));
        decode(send(request, CONTEXT).await?, CONTEXT).await
    }

    /// Delete every captured request for the endpoint
    pub async fn clear_requests(&self, token: &str) -> Result<(), ClientError> {
        let request = self.http.post(self.url(&routes::clear(token)));
        send(request, "Failed to clear requests").await?;
        Ok(())
    }

    /// Download the JSON export of every captured request
    pub async fn export_requests(&self, token: &str) -> Result<Vec<u8>, ClientError> {
        const CONTEXT: &str = "Failed to export requests";
        let response = send(self.http.get(self.url(&routes::export(token))), CONTEXT).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport {
                context: CONTEXT,
                source,
            })?;
        Ok(bytes.to_vec())
    }

    /// Current canned response, `None` when the default is in use
    pub async fn response_config(&self, token: &str) -> Result<Option<ResponseConfig>, ClientError> {
        const CONTEXT: &str = "Failed to load response config";
        let request = self.http.get(self.url(&routes::response(token)));
        match send(request, CONTEXT).await {
            Ok(response) => Ok(Some(decode(response, CONTEXT).await?)),
            Err(ClientError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Store a canned response
    pub async fn set_response_config(
        &self,
        token: &str,
        update: &ResponseConfigUpdate,
    ) -> Result<(), ClientError> {
        let request = self.http.put(self.url(&routes::response(token))).json(update);
        send(request, "Failed to save response config").await?;
        Ok(())
    }

    /// Go back to the default response
    pub async fn reset_response_config(&self, token: &str) -> Result<(), ClientError> {
        let request = self.http.delete(self.url(&routes::response(token)));
        send(request, "Failed to reset response config").await?;
        Ok(())
    }

    /// Create a new endpoint and return its token.
    ///
    /// The backend answers with a redirect to `/e/{token}`; the redirect is
    /// read rather than followed.
    pub async fn create_endpoint(&self) -> Result<String, ClientError> {
        const CONTEXT: &str = "Failed to create endpoint";
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(ClientError::Build)?;

        let response = client
            .post(self.url(routes::CREATE))
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                context: CONTEXT,
                source,
            })?;

        if !response.status().is_redirection() {
            return Err(ClientError::Status {
                context: CONTEXT,
                status: response.status(),
            });
        }

        response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(token_from_location)
            .ok_or(ClientError::MissingRedirect)
    }

    /// Open the server-sent event stream for an endpoint
    pub async fn open_events(&self, token: &str) -> Result<Response, ClientError> {
        let request = self
            .stream_http
            .get(self.url(&routes::events(token)))
            .header(reqwest::header::ACCEPT, "text/event-stream");
        send(request, "Failed to open event stream").await
    }
}

/// Send a request and turn non-2xx answers into errors
async fn send(request: RequestBuilder, context: &'static str) -> Result<Response, ClientError> {
    let response = request
        .send()
        .await
        .map_err(|source| ClientError::Transport { context, source })?;

    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(ClientError::NotFound { context }),
        status => Err(ClientError::Status { context, status }),
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: Response,
    context: &'static str,
) -> Result<T, ClientError> {
    response
        .json()
        .await
        .map_err(|source| ClientError::Decode { context, source })
}

/// Extract the token from a `/e/{token}` redirect target
fn token_from_location(location: &str) -> Option<String> {
    let (_, rest) = location.split_once(routes::DASHBOARD_PREFIX)?;
    let token = rest.split(['/', '?', '#']).next()?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
