//! # Remote Catalog Gateway
//!
//! Request/response access to the evaluation backend: the unfiltered dataset,
//! the enumerations behind every filter dimension, and the filter query.
//! Implementations hold no catalog state.

pub mod http;
pub mod mock;

pub use http::HttpGateway;
pub use mock::MockGateway;

use async_trait::async_trait;

use crate::catalog::ActiveFilterRequest;
use crate::dataset::EvaluationData;
use crate::error::GatewayError;

/// The backend operations the cascade controller consumes.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Full, unfiltered evaluation dataset.
    async fn fetch_dataset(&self) -> Result<EvaluationData, GatewayError>;

    async fn fetch_metrics(&self) -> Result<Vec<String>, GatewayError>;

    async fn fetch_versions(&self) -> Result<Vec<String>, GatewayError>;

    async fn fetch_corpora(&self) -> Result<Vec<String>, GatewayError>;

    /// Topic names of one corpus.
    async fn fetch_topics(&self, corpus: &str) -> Result<Vec<String>, GatewayError>;

    /// Query-group names of one (corpus, topic) pair.
    async fn fetch_query_groups(
        &self,
        corpus: &str,
        topic: &str,
    ) -> Result<Vec<String>, GatewayError>;

    /// Evaluation data restricted to the given selection.
    async fn filter(&self, request: &ActiveFilterRequest) -> Result<EvaluationData, GatewayError>;
}
