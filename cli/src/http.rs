//! Resolves `Http` effects with reqwest.

use std::time::Duration;

use async_trait::async_trait;
use crux_http::protocol::{HttpHeader, HttpRequest, HttpResponse, HttpResult};
use crux_http::HttpError;

#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> HttpResult;
}

#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    /// `timeout` bounds each request from connect to the last body byte.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("arogya-cli/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: HttpRequest) -> HttpResult {
        match self.send(request).await {
            Ok(response) => HttpResult::Ok(response),
            Err(e) => HttpResult::Err(e),
        }
    }
}

impl ReqwestExecutor {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|e| HttpError::Url(format!("{method}: {e}")))?;

        let mut builder = self.client.request(method, url.as_str());
        for HttpHeader { name, value } in headers {
            builder = builder.header(name, value);
        }
        if !body.is_empty() {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| transport_error(&e, &url))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some(HttpHeader {
                    name: name.as_str().to_string(),
                    value: value.to_string(),
                })
            })
            .collect();

        // The core only sees complete responses.
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&e, &url))?;

        tracing::debug!(status, bytes = body.len(), %url, "http response");
        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

fn transport_error(e: &reqwest::Error, url: &str) -> HttpError {
    tracing::debug!(%url, error = %e, "http transport failure");
    if e.is_timeout() {
        HttpError::Timeout
    } else if e.is_builder() {
        HttpError::Url(e.to_string())
    } else {
        HttpError::Io(e.to_string())
    }
}
