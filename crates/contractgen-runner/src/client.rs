//! HTTP boundary
//!
//! The runner only talks to [`HttpClient`]. The blocking `reqwest`
//! implementation never turns a non-2xx status into an error: every status
//! code reaches the contract check.

use std::collections::BTreeMap;
use std::time::Duration;

use contractgen_core::{HttpMethod, PlannedBody, RequestPlan};

/// A received response, fully buffered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names lowercased
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

/// Sends one planned request.
pub trait HttpClient: Send + Sync {
    /// # Errors
    ///
    /// Returns error only when no response was received (connect failure,
    /// timeout, unreadable body). HTTP error statuses are `Ok`.
    fn execute(
        &self,
        plan: &RequestPlan,
        base_url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<HttpResponse, ClientError>;
}

/// Blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// `timeout_secs == 0` disables the timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the TLS backend or client cannot be initialised.
    pub fn new(timeout_secs: u64) -> Result<Self, ClientError> {
        let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn execute(
        &self,
        plan: &RequestPlan,
        base_url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<HttpResponse, ClientError> {
        let url = plan.url_with_query(base_url);
        let mut req = match plan.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Patch => self.client.patch(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        for (k, v) in headers {
            // Skip values that are not valid in HTTP; they never reach the server.
            if reqwest::header::HeaderValue::from_str(v).is_ok() {
                req = req.header(k, v);
            }
        }

        req = match &plan.body {
            PlannedBody::None => req,
            PlannedBody::Json(body) => req.json(body),
            PlannedBody::Multipart => req.multipart(reqwest::blocking::multipart::Form::new()),
            PlannedBody::Form => {
                let empty: [(&str, &str); 0] = [];
                req.form(&empty)
            }
        };

        let resp = req
            .send()
            .map_err(|e| ClientError::Transport(format!("{} {url}: {e}", plan.method)))?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = resp
            .text()
            .map_err(|e| ClientError::Transport(format!("{} {url}: reading body: {e}", plan.method)))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    Build(String),
    #[error("{0}")]
    Transport(String),
}
