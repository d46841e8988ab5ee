//! HTTP transport abstraction for the Overpass client
//!
//! The resolver never touches the network directly; it goes through the
//! [`Transport`] trait so tests can script upstream behavior. The real
//! implementation is a thin layer over `reqwest` that enforces the
//! per-request deadline and keeps the HTTP status as data rather than
//! folding it into a message string.

use crate::{RefillError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Raw outcome of one upstream request
#[derive(Clone, Debug)]
pub struct TransportResponse {
    /// HTTP status code, carried structurally for retry classification
    pub status: u16,
    /// Response body text, unparsed
    pub body: String,
}

/// One-shot HTTP operations with a hard per-request deadline
///
/// Implementations perform exactly one network request per call and never
/// retry; retrying is the resolver's job. A response is returned whatever
/// its status; errors are reserved for transport-level failures.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `form` as a urlencoded body with UTF-8 charset
    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<TransportResponse>;

    /// GET `url`
    async fn get(&self, url: &str, timeout: Duration) -> Result<TransportResponse>;
}

/// Content type the interpreter endpoint expects for QL submissions
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// Production transport over a shared `reqwest` client
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with a descriptive user agent
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("track-refill/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Map reqwest failures, turning elapsed deadlines into [`RefillError::Timeout`]
    fn classify(error: reqwest::Error, timeout: Duration) -> RefillError {
        if error.is_timeout() {
            RefillError::Timeout(timeout)
        } else {
            RefillError::Transport(error)
        }
    }

    async fn read_response(
        response: reqwest::Response,
        timeout: Duration,
    ) -> Result<TransportResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Self::classify(e, timeout))?;
        Ok(TransportResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<TransportResponse> {
        let response = self
            .client
            .post(url)
            .form(form)
            // Override the header reqwest set from form(): Overpass wants
            // the charset to be explicit.
            .header(reqwest::header::CONTENT_TYPE, FORM_CONTENT_TYPE)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::classify(e, timeout))?;
        Self::read_response(response, timeout).await
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<TransportResponse> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::classify(e, timeout))?;
        Self::read_response(response, timeout).await
    }
}

/// Scripted transport that replays canned replies, for tests
///
/// Pops one reply per request in script order and records every request
/// made against it. Clones share the same script and request log.
#[cfg(test)]
#[derive(Clone)]
pub(crate) struct ScriptedTransport {
    inner: std::sync::Arc<ScriptedInner>,
}

#[cfg(test)]
struct ScriptedInner {
    replies: std::sync::Mutex<std::collections::VecDeque<Result<TransportResponse>>>,
    fallback_status: Option<u16>,
    requests: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl ScriptedTransport {
    pub(crate) fn new(replies: Vec<Result<TransportResponse>>) -> Self {
        Self {
            inner: std::sync::Arc::new(ScriptedInner {
                replies: std::sync::Mutex::new(replies.into_iter().collect()),
                fallback_status: None,
                requests: std::sync::Mutex::new(Vec::new()),
            }),
        }
    }

    /// A transport that answers every request with the same status
    pub(crate) fn repeating_status(status: u16) -> Self {
        Self {
            inner: std::sync::Arc::new(ScriptedInner {
                replies: std::sync::Mutex::new(std::collections::VecDeque::new()),
                fallback_status: Some(status),
                requests: std::sync::Mutex::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn ok(body: &str) -> Result<TransportResponse> {
        Ok(TransportResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    pub(crate) fn status(status: u16) -> Result<TransportResponse> {
        Ok(TransportResponse {
            status,
            body: format!("upstream says {status}"),
        })
    }

    pub(crate) fn request_count(&self) -> usize {
        self.inner.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.inner.requests.lock().unwrap().clone()
    }

    fn next(&self, recorded: String) -> Result<TransportResponse> {
        self.inner.requests.lock().unwrap().push(recorded);
        let scripted = self.inner.replies.lock().unwrap().pop_front();
        match (scripted, self.inner.fallback_status) {
            (Some(reply), _) => reply,
            (None, Some(status)) => Self::status(status),
            (None, None) => panic!("transport script exhausted"),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        _timeout: Duration,
    ) -> Result<TransportResponse> {
        let payload = form
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        self.next(format!("POST {url} {payload}"))
    }

    async fn get(&self, url: &str, _timeout: Duration) -> Result<TransportResponse> {
        self.next(format!("GET {url}"))
    }
}
