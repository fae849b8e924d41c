use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use shared::protocol::{QueryRequest, QueryResponse};
use tracing::{debug, warn};
use url::Url;

use crate::{config::ClientSettings, error::QueryError};

#[async_trait]
pub trait QueryTransport: Send + Sync {
    async fn send_query(&self, request: &QueryRequest) -> Result<QueryResponse, QueryError>;
}

/// `POST`s the query as JSON to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct HttpQueryTransport {
    http: Client,
    endpoint: Url,
    timeout_ms: Option<u64>,
}

impl HttpQueryTransport {
    pub fn new(settings: &ClientSettings) -> Result<Self, QueryError> {
        let endpoint = settings.endpoint_url()?;
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            endpoint,
            timeout_ms: settings.request_timeout_ms,
        })
    }
}

#[async_trait]
impl QueryTransport for HttpQueryTransport {
    async fn send_query(&self, request: &QueryRequest) -> Result<QueryResponse, QueryError> {
        let body = serde_json::to_vec(request)?;
        debug!(endpoint = %self.endpoint, bytes = body.len(), "sending query");

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = %self.endpoint, status = status.as_u16(), "query rejected by backend");
            return Err(QueryError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(|err| self.classify(err))?;
        Ok(QueryResponse::from_json_slice(&bytes)?)
    }
}

impl HttpQueryTransport {
    fn classify(&self, err: reqwest::Error) -> QueryError {
        match self.timeout_ms {
            Some(ms) if err.is_timeout() => QueryError::Timeout(ms),
            _ => QueryError::Transport(err),
        }
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
