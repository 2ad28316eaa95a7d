//! In-memory catalog gateway for tests and offline sessions.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::CatalogGateway;
use crate::catalog::ActiveFilterRequest;
use crate::dataset::EvaluationData;
use crate::error::GatewayError;

/// The gateway operations, used to inject failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Dataset,
    Metrics,
    Versions,
    Corpora,
    Topics,
    QueryGroups,
    Filter,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Dataset => "mock://evaluation",
            Endpoint::Metrics => "mock://metrics",
            Endpoint::Versions => "mock://versions",
            Endpoint::Corpora => "mock://corpora",
            Endpoint::Topics => "mock://topics",
            Endpoint::QueryGroups => "mock://queryGroups",
            Endpoint::Filter => "mock://filter",
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    dataset: EvaluationData,
    filter_response: Option<EvaluationData>,
    metrics: Vec<String>,
    versions: Vec<String>,
    corpora: Vec<String>,
    topics: HashMap<String, Vec<String>>,
    query_groups: HashMap<(String, String), Vec<String>>,
    topic_delays: HashMap<String, Duration>,
    query_group_delays: HashMap<(String, String), Duration>,
    next_filter_delay: Option<Duration>,
    failing: HashSet<Endpoint>,
    calls: HashMap<Endpoint, usize>,
    topic_requests: Vec<String>,
    query_group_requests: Vec<(String, String)>,
    filter_requests: Vec<ActiveFilterRequest>,
}

/// A scriptable, in-memory [`CatalogGateway`].
///
/// All setters take `&self` so a gateway can be reconfigured while shared
/// with a running controller.
#[derive(Debug, Default)]
pub struct MockGateway {
    state: Mutex<MockState>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small two-corpus catalog with metric values for every metric.
    pub fn sample() -> Self {
        let gw = Self::new();
        gw.set_metrics(["P@10", "NDCG@10", "AP"]);
        gw.set_versions(["v1.0", "v1.1"]);
        gw.set_corpora(["en", "fr"]);
        gw.set_topics("en", ["news", "sport"]);
        gw.set_topics("fr", ["news"]);
        gw.set_query_groups("en", "news", ["headlines", "archive"]);
        gw.set_query_groups("en", "sport", ["football"]);
        gw.set_query_groups("fr", "news", ["titres"]);

        let mut metrics = Map::new();
        metrics.insert("P@10".into(), json!({"v1.0": 0.52, "v1.1": 0.58}));
        metrics.insert("NDCG@10".into(), json!({"v1.0": 0.61, "v1.1": 0.66}));
        metrics.insert("AP".into(), json!({"v1.0": 0.44, "v1.1": 0.47}));
        gw.set_dataset(EvaluationData {
            name: Some("sample".into()),
            metrics,
            ..EvaluationData::default()
        });
        gw
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_dataset(&self, data: EvaluationData) {
        self.state().dataset = data;
    }

    /// Fixed response for every filter call. Without one, the filter answers
    /// with the dataset restricted to the requested metrics.
    pub fn set_filter_response(&self, data: EvaluationData) {
        self.state().filter_response = Some(data);
    }

    pub fn set_metrics<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().metrics = names.into_iter().map(Into::into).collect();
    }

    pub fn set_versions<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().versions = names.into_iter().map(Into::into).collect();
    }

    pub fn set_corpora<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().corpora = names.into_iter().map(Into::into).collect();
    }

    pub fn set_topics<I, S>(&self, corpus: &str, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state()
            .topics
            .insert(corpus.to_string(), names.into_iter().map(Into::into).collect());
    }

    pub fn set_query_groups<I, S>(&self, corpus: &str, topic: &str, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().query_groups.insert(
            (corpus.to_string(), topic.to_string()),
            names.into_iter().map(Into::into).collect(),
        );
    }

    /// Delay the topic response for one corpus.
    pub fn set_topic_delay(&self, corpus: &str, delay: Duration) {
        self.state().topic_delays.insert(corpus.to_string(), delay);
    }

    /// Delay the query-group response for one (corpus, topic) pair.
    pub fn set_query_group_delay(&self, corpus: &str, topic: &str, delay: Duration) {
        self.state()
            .query_group_delays
            .insert((corpus.to_string(), topic.to_string()), delay);
    }

    /// Delay only the next filter response.
    pub fn delay_next_filter(&self, delay: Duration) {
        self.state().next_filter_delay = Some(delay);
    }

    /// Make every call to `endpoint` fail with a transport error.
    pub fn fail(&self, endpoint: Endpoint) {
        self.state().failing.insert(endpoint);
    }

    pub fn recover(&self, endpoint: Endpoint) {
        self.state().failing.remove(&endpoint);
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.state().calls.get(&endpoint).copied().unwrap_or(0)
    }

    /// Corpora whose topics were requested, in call order.
    pub fn topic_requests(&self) -> Vec<String> {
        self.state().topic_requests.clone()
    }

    /// (corpus, topic) pairs whose query groups were requested, in call order.
    pub fn query_group_requests(&self) -> Vec<(String, String)> {
        self.state().query_group_requests.clone()
    }

    /// Every filter request received, in call order.
    pub fn filter_requests(&self) -> Vec<ActiveFilterRequest> {
        self.state().filter_requests.clone()
    }

    pub fn last_filter_request(&self) -> Option<ActiveFilterRequest> {
        self.state().filter_requests.last().cloned()
    }

    fn record(&self, endpoint: Endpoint) -> Result<(), GatewayError> {
        let mut state = self.state();
        *state.calls.entry(endpoint).or_insert(0) += 1;
        if state.failing.contains(&endpoint) {
            return Err(GatewayError::Request {
                endpoint: endpoint.path().to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogGateway for MockGateway {
    async fn fetch_dataset(&self) -> Result<EvaluationData, GatewayError> {
        self.record(Endpoint::Dataset)?;
        Ok(self.state().dataset.clone())
    }

    async fn fetch_metrics(&self) -> Result<Vec<String>, GatewayError> {
        self.record(Endpoint::Metrics)?;
        Ok(self.state().metrics.clone())
    }

    async fn fetch_versions(&self) -> Result<Vec<String>, GatewayError> {
        self.record(Endpoint::Versions)?;
        Ok(self.state().versions.clone())
    }

    async fn fetch_corpora(&self) -> Result<Vec<String>, GatewayError> {
        self.record(Endpoint::Corpora)?;
        Ok(self.state().corpora.clone())
    }

    async fn fetch_topics(&self, corpus: &str) -> Result<Vec<String>, GatewayError> {
        let delay = {
            let mut state = self.state();
            state.topic_requests.push(corpus.to_string());
            state.topic_delays.get(corpus).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.record(Endpoint::Topics)?;
        Ok(self.state().topics.get(corpus).cloned().unwrap_or_default())
    }

    async fn fetch_query_groups(
        &self,
        corpus: &str,
        topic: &str,
    ) -> Result<Vec<String>, GatewayError> {
        let key = (corpus.to_string(), topic.to_string());
        let delay = {
            let mut state = self.state();
            state.query_group_requests.push(key.clone());
            state.query_group_delays.get(&key).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.record(Endpoint::QueryGroups)?;
        Ok(self.state().query_groups.get(&key).cloned().unwrap_or_default())
    }

    async fn filter(&self, request: &ActiveFilterRequest) -> Result<EvaluationData, GatewayError> {
        let delay = {
            let mut state = self.state();
            state.filter_requests.push(request.clone());
            state.next_filter_delay.take()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.record(Endpoint::Filter)?;

        let state = self.state();
        if let Some(response) = &state.filter_response {
            return Ok(response.clone());
        }
        let metrics = state
            .dataset
            .metrics
            .iter()
            .filter(|(name, _)| request.metrics.contains(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect::<Map<String, Value>>();
        Ok(EvaluationData {
            metrics,
            ..state.dataset.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_catalog() {
        let gw = MockGateway::sample();
        assert_eq!(gw.fetch_corpora().await.unwrap(), vec!["en", "fr"]);
        assert_eq!(gw.fetch_topics("en").await.unwrap(), vec!["news", "sport"]);
        assert!(gw.fetch_topics("de").await.unwrap().is_empty());
        assert_eq!(
            gw.fetch_query_groups("fr", "news").await.unwrap(),
            vec!["titres"]
        );
        assert_eq!(gw.topic_requests(), vec!["en", "de"]);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let gw = MockGateway::sample();
        gw.fail(Endpoint::Corpora);
        assert!(gw.fetch_corpora().await.is_err());
        gw.recover(Endpoint::Corpora);
        assert!(gw.fetch_corpora().await.is_ok());
        assert_eq!(gw.calls(Endpoint::Corpora), 2);
    }

    #[tokio::test]
    async fn test_filter_restricts_metrics() {
        let gw = MockGateway::sample();
        let request = ActiveFilterRequest {
            metrics: vec!["AP".into()],
            ..ActiveFilterRequest::default()
        };
        let data = gw.filter(&request).await.unwrap();
        assert_eq!(data.metrics_count(), 1);
        assert!(data.metrics.contains_key("AP"));
        assert_eq!(gw.last_filter_request(), Some(request.clone()));
        assert_eq!(gw.filter_requests(), vec![request]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_filter_delay_applies_once() {
        let gw = MockGateway::sample();
        gw.delay_next_filter(Duration::from_secs(5));
        let request = ActiveFilterRequest::default();

        let started = tokio::time::Instant::now();
        gw.filter(&request).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));

        let started = tokio::time::Instant::now();
        gw.filter(&request).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
