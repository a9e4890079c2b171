//! Implements the `Transport` trait with `reqwest` against the server's base URL.

use crate::api::{ApiRequest, Method, RawResponse, Transport};
use crate::Result;
use anyhow::Context;
use tracing::trace;
use url::Url;

/// Sends requests to a BudgetPlanner server. Paths are joined onto `base_url`, which must end
/// with a `/` for the join to keep its last segment.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Unable to build the HTTP client")?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Unable to join '{path}' onto '{}'", self.base_url))
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
        let endpoint = self.endpoint(&request.path)?;
        trace!("sending {} {endpoint}", request.method);

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.http.request(method, endpoint.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to send {} {endpoint}", request.method))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read the response body from {endpoint}"))?;
        Ok(RawResponse { status, body })
    }
}
