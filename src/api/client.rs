//! HTTP query executor
//!
//! Sends serialized queries to SharePoint REST or Microsoft Graph with a
//! bearer token. Batches use multipart/mixed on REST and JSON on Graph.

use super::batch::{BatchRequestBuilder, BatchResponseParser, GraphBatchRequest, GraphBatchResponse};
use super::constants::{self, headers};
use super::context::{QueryExecutor, QueryRequest};
use super::expression::Transport;
use super::query::QueryResponse;
use crate::config::Config;
use anyhow::{bail, Context};
use async_trait::async_trait;
use log::{debug, info};
use serde_json::Value;
use std::time::Duration;

/// [`QueryExecutor`] backed by reqwest
#[derive(Clone)]
pub struct HttpExecutor {
    base_url: String,
    transport: Transport,
    http_client: reqwest::Client,
    access_token: String,
}

impl HttpExecutor {
    pub fn new(
        base_url: impl Into<String>,
        transport: Transport,
        access_token: impl Into<String>,
    ) -> anyhow::Result<Self> {
        Self::with_timeouts(
            base_url,
            transport,
            access_token,
            Duration::from_secs(30),
            Duration::from_secs(10),
        )
    }

    pub fn with_timeouts(
        base_url: impl Into<String>,
        transport: Transport,
        access_token: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(concat!("m365-query/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_custom_client(base_url, transport, access_token, http_client))
    }

    pub fn with_custom_client(
        base_url: impl Into<String>,
        transport: Transport,
        access_token: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            http_client,
            access_token: access_token.into(),
        }
    }

    /// Executor for the configured transport, token taken from the environment
    pub fn from_config(config: &Config, transport: Transport) -> anyhow::Result<Self> {
        Self::with_timeouts(
            config.base_url(transport)?,
            transport,
            Config::access_token()?,
            Duration::from_secs(config.settings.timeout_secs),
            Duration::from_secs(config.settings.connect_timeout_secs),
        )
    }

    fn accept_header(&self) -> &'static str {
        match self.transport {
            Transport::Rest => headers::ACCEPT_REST_NOMETADATA,
            Transport::Graph => headers::CONTENT_TYPE_JSON,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> anyhow::Result<reqwest::Response> {
        let response = builder
            .bearer_auth(&self.access_token)
            .header("Accept", self.accept_header())
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("Request failed with status {}: {}", status, error_text);
        }
        Ok(response)
    }

    async fn execute_rest_batch(
        &self,
        requests: &[QueryRequest],
    ) -> anyhow::Result<Vec<anyhow::Result<QueryResponse>>> {
        let batch = BatchRequestBuilder::new(self.base_url.clone()).add_queries(requests).build();
        let url = constants::batch_endpoint(&self.base_url, Transport::Rest);

        let response = self
            .send(
                self.http_client
                    .post(&url)
                    .header("Content-Type", batch.content_type.as_str())
                    .body(batch.body),
            )
            .await?;
        let text = response.text().await.context("Failed to read batch response")?;
        BatchResponseParser::parse(&text)
    }

    async fn execute_graph_batch(
        &self,
        requests: &[QueryRequest],
    ) -> anyhow::Result<Vec<anyhow::Result<QueryResponse>>> {
        let body = GraphBatchRequest::from_requests(requests);
        let url = constants::batch_endpoint(&self.base_url, Transport::Graph);

        let post = self
            .http_client
            .post(&url)
            .header("Content-Type", headers::CONTENT_TYPE_JSON)
            .json(&body);
        let response = self.send(post).await?;
        let batch: GraphBatchResponse = response
            .json()
            .await
            .context("Failed to parse batch response")?;
        Ok(batch.into_results(requests.len()))
    }
}

#[async_trait]
impl QueryExecutor for HttpExecutor {
    async fn execute(&self, request: &QueryRequest) -> anyhow::Result<QueryResponse> {
        let url = constants::api_url(&self.base_url, request.transport, &request.relative_url());
        debug!("GET {}", url);

        let response = self.send(self.http_client.get(&url)).await?;
        let json: Value = response.json().await.context("Failed to parse response JSON")?;
        QueryResponse::from_json(json)
    }

    async fn execute_batch(
        &self,
        requests: &[QueryRequest],
    ) -> anyhow::Result<Vec<anyhow::Result<QueryResponse>>> {
        info!("Sending {} batch with {} queries", self.transport, requests.len());
        match self.transport {
            Transport::Rest => self.execute_rest_batch(requests).await,
            Transport::Graph => self.execute_graph_batch(requests).await,
        }
    }
}
