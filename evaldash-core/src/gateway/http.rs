//! HTTP implementation of the catalog gateway, built on `reqwest`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::CatalogGateway;
use crate::catalog::ActiveFilterRequest;
use crate::config::{EndpointConfig, GatewayConfig};
use crate::dataset::EvaluationData;
use crate::error::GatewayError;

/// Talks to the evaluation backend over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    endpoints: EndpointConfig,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::ClientBuild {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            endpoints: config.endpoints.clone(),
        })
    }

    /// Resolve an endpoint against the base URL.
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let url = self.url(endpoint);
        debug!(url = %url, ?query, "GET");
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| GatewayError::Request {
                endpoint: url.clone(),
                message: e.to_string(),
            })?;
        decode(url, resp).await
    }
}

async fn decode<T: DeserializeOwned>(
    url: String,
    resp: reqwest::Response,
) -> Result<T, GatewayError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(GatewayError::Status {
            endpoint: url,
            status: status.as_u16(),
        });
    }
    resp.json::<T>().await.map_err(|e| GatewayError::Decode {
        endpoint: url,
        message: e.to_string(),
    })
}

#[async_trait]
impl CatalogGateway for HttpGateway {
    async fn fetch_dataset(&self) -> Result<EvaluationData, GatewayError> {
        self.get_json(&self.endpoints.dataset, &[]).await
    }

    async fn fetch_metrics(&self) -> Result<Vec<String>, GatewayError> {
        self.get_json(&self.endpoints.metrics, &[]).await
    }

    async fn fetch_versions(&self) -> Result<Vec<String>, GatewayError> {
        self.get_json(&self.endpoints.versions, &[]).await
    }

    async fn fetch_corpora(&self) -> Result<Vec<String>, GatewayError> {
        self.get_json(&self.endpoints.corpora, &[]).await
    }

    async fn fetch_topics(&self, corpus: &str) -> Result<Vec<String>, GatewayError> {
        self.get_json(&self.endpoints.topics, &[("corpus", corpus)]).await
    }

    async fn fetch_query_groups(
        &self,
        corpus: &str,
        topic: &str,
    ) -> Result<Vec<String>, GatewayError> {
        self.get_json(
            &self.endpoints.query_groups,
            &[("corpus", corpus), ("topic", topic)],
        )
        .await
    }

    async fn filter(&self, request: &ActiveFilterRequest) -> Result<EvaluationData, GatewayError> {
        let url = self.url(&self.endpoints.filter);
        debug!(
            url = %url,
            corpora = request.corpora.len(),
            topics = request.topics.len(),
            query_groups = request.query_groups.len(),
            "POST filter"
        );
        let resp = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Request {
                endpoint: url.clone(),
                message: e.to_string(),
            })?;
        decode(url, resp).await
    }
}
