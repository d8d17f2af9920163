//! HTTP transport seam for the activities endpoint.
//!
//! The sender only ever posts one form per submission. [`ReqwestTransport`]
//! does that over the network; [`CaptureTransport`] records the form in
//! memory and answers with a configured reply.

use std::time::Duration;

use appevents_core::{AppEventsError, AppEventsResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;
use url::Url;

/// Status and body of an HTTP answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Shared, reusable HTTP client handle. Implementations must be safe to call
/// from concurrent submissions.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST `form` as `application/x-www-form-urlencoded` to `url`.
    ///
    /// Connection-level failures are `Err(AppEventsError::Network)`. Any HTTP
    /// answer, whatever its status, is `Ok`. The body is only required for
    /// non-2xx answers, where it is logged.
    async fn post_form(
        &self,
        url: &Url,
        form: &[(&'static str, String)],
    ) -> AppEventsResult<TransportResponse>;
}

/// Transport backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout: Duration) -> AppEventsResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppEventsError::Internal(anyhow::Error::new(e).context("failed to build HTTP client"))
            })?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_form(
        &self,
        url: &Url,
        form: &[(&'static str, String)],
    ) -> AppEventsResult<TransportResponse> {
        let response = self
            .client
            .post(url.clone())
            .form(form)
            .send()
            .await
            .map_err(|e| AppEventsError::Network(format!("activities request failed: {e}")))?;

        let status = response.status().as_u16();
        debug!(url = %url, status, "activities endpoint answered");
        if response.status().is_success() {
            return Ok(TransportResponse {
                status,
                body: String::new(),
            });
        }

        // The status alone decides the outcome; an unreadable error body is logged empty.
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(url = %url, status, error = %e, "failed to read activities error body");
                String::new()
            }
        };
        Ok(TransportResponse { status, body })
    }
}

/// A form posted through a [`CaptureTransport`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub url: String,
    pub form: Vec<(String, String)>,
}

impl CapturedRequest {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
enum CaptureReply {
    Respond(TransportResponse),
    Fail(String),
}

/// In-memory transport that records every request. Used for dry runs and tests.
#[derive(Debug)]
pub struct CaptureTransport {
    requests: Mutex<Vec<CapturedRequest>>,
    reply: CaptureReply,
}

impl CaptureTransport {
    /// Answers every request with `200 {"success":true}`.
    pub fn new() -> Self {
        Self::responding(200, r#"{"success":true}"#)
    }

    pub fn responding(status: u16, body: impl Into<String>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            reply: CaptureReply::Respond(TransportResponse {
                status,
                body: body.into(),
            }),
        }
    }

    /// Fails every request as if the connection could not be made.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            reply: CaptureReply::Fail(reason.into()),
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().clone()
    }

    pub fn last(&self) -> Option<CapturedRequest> {
        self.requests.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Default for CaptureTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for CaptureTransport {
    async fn post_form(
        &self,
        url: &Url,
        form: &[(&'static str, String)],
    ) -> AppEventsResult<TransportResponse> {
        self.requests.lock().push(CapturedRequest {
            url: url.to_string(),
            form: form
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
        });

        match &self.reply {
            CaptureReply::Respond(response) => Ok(response.clone()),
            CaptureReply::Fail(reason) => Err(AppEventsError::Network(reason.clone())),
        }
    }
}
