//! # Filter Cascade Controller
//!
//! Populates the [`FilterCatalog`] from the remote gateway in dependency order
//! and re-issues the active filter whenever a selection changes.
//!
//! Population fans out without a join barrier: every selected corpus gets its
//! own task that fetches topics, merges them, propagates, and then fans out
//! again into one task per effective topic for its query groups. Query groups
//! of a topic are only guaranteed present once that topic's branch settles;
//! [`CascadeController::activate`] returns after every branch has settled.
//!
//! Fetches are never cancelled. A response that arrives after the user
//! changed a selection is still merged; propagation right after the merge
//! gives the new items the flags their ancestors have at that moment.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::catalog::{ActiveFilterRequest, Dimension, FilterCatalog, FilterKey};
use crate::dataset::DatasetView;
use crate::error::{CatalogError, GatewayError, Result};
use crate::gateway::CatalogGateway;

/// Catalog shared between the controller and its background branches.
pub type SharedCatalog = Arc<Mutex<FilterCatalog>>;

/// Dataset view-model shared with whoever renders it.
pub type SharedDataset = Arc<RwLock<DatasetView>>;

/// Where the cascade currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeState {
    Idle,
    LoadingRoots,
    LoadingTopics,
    LoadingQueryGroups,
    Ready,
}

impl std::fmt::Display for CascadeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CascadeState::Idle => write!(f, "idle"),
            CascadeState::LoadingRoots => write!(f, "loading roots"),
            CascadeState::LoadingTopics => write!(f, "loading topics"),
            CascadeState::LoadingQueryGroups => write!(f, "loading query groups"),
            CascadeState::Ready => write!(f, "ready"),
        }
    }
}

/// In-flight fetch counts, from which the state is derived.
#[derive(Debug, Default)]
struct CascadeProgress {
    activated: bool,
    corpora_pending: usize,
    topic_fetches: usize,
    query_group_fetches: usize,
}

impl CascadeProgress {
    fn state(&self) -> CascadeState {
        if !self.activated {
            CascadeState::Idle
        } else if self.corpora_pending > 0 {
            CascadeState::LoadingRoots
        } else if self.topic_fetches > 0 {
            CascadeState::LoadingTopics
        } else if self.query_group_fetches > 0 {
            CascadeState::LoadingQueryGroups
        } else {
            CascadeState::Ready
        }
    }
}

/// Drives catalog population and filter re-issue for one dashboard session.
///
/// Cheap to clone; clones share the same catalog, dataset, and progress.
#[derive(Clone)]
pub struct CascadeController {
    gateway: Arc<dyn CatalogGateway>,
    catalog: SharedCatalog,
    dataset: SharedDataset,
    progress: Arc<Mutex<CascadeProgress>>,
    filter_seq: Arc<AtomicU64>,
    applied_seq: Arc<AtomicU64>,
}

impl std::fmt::Debug for CascadeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadeController").finish_non_exhaustive()
    }
}

impl CascadeController {
    /// Create a controller with an empty catalog and no dataset.
    pub fn new(gateway: Arc<dyn CatalogGateway>) -> Self {
        Self {
            gateway,
            catalog: Arc::new(Mutex::new(FilterCatalog::new())),
            dataset: Arc::new(RwLock::new(DatasetView::new())),
            progress: Arc::new(Mutex::new(CascadeProgress::default())),
            filter_seq: Arc::new(AtomicU64::new(0)),
            applied_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn catalog(&self) -> SharedCatalog {
        Arc::clone(&self.catalog)
    }

    pub fn dataset(&self) -> SharedDataset {
        Arc::clone(&self.dataset)
    }

    pub async fn state(&self) -> CascadeState {
        self.progress.lock().await.state()
    }

    /// The filter payload the next refresh would send.
    pub async fn active_request(&self) -> ActiveFilterRequest {
        self.catalog.lock().await.derive_active_request()
    }

    /// Load the unfiltered dataset and populate the catalog, concurrently.
    ///
    /// Returns once the dataset fetch and every population branch settled.
    /// Failures are logged and leave the affected part empty.
    pub async fn activate(&self) {
        info!("Activating filter cascade");
        {
            let mut progress = self.progress.lock().await;
            progress.activated = true;
            progress.corpora_pending += 1;
        }
        tokio::join!(self.load_initial_dataset(), self.populate());
        let state = self.state().await;
        info!(state = %state, "Filter cascade settled");
    }

    /// Re-run root population and the cascade below it. Merge-only: nothing
    /// is removed and existing flags are kept. The dataset is not touched.
    pub async fn refresh_catalog(&self) {
        {
            let mut progress = self.progress.lock().await;
            progress.activated = true;
            progress.corpora_pending += 1;
        }
        self.populate().await;
    }

    /// Post the active filter and replace the dataset with the answer.
    ///
    /// On failure the previous dataset stays in place; the error is logged
    /// here and handed back for callers that want to show it.
    ///
    /// Every call is numbered when its request is derived. A response is
    /// dropped when the answer to a later call has already been applied.
    pub async fn apply_filter(&self) -> std::result::Result<(), GatewayError> {
        let (seq, request) = {
            let catalog = self.catalog.lock().await;
            let seq = self.filter_seq.fetch_add(1, Ordering::SeqCst) + 1;
            (seq, catalog.derive_active_request())
        };
        match self.gateway.filter(&request).await {
            Ok(data) => {
                let mut view = self.dataset.write().await;
                let applied = self.applied_seq.load(Ordering::SeqCst);
                if seq < applied {
                    debug!(seq, applied, "Dropping out-of-date filter response");
                    return Ok(());
                }
                self.applied_seq.store(seq, Ordering::SeqCst);
                view.replace(data);
                debug!(
                    revision = view.revision(),
                    metrics = view.metrics_count(),
                    "Applied filter"
                );
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Filter request failed; keeping previous dataset");
                Err(e)
            }
        }
    }

    /// Change one item's selection, cascade, and re-issue the filter.
    ///
    /// Selecting a corpus re-fetches its topics (and their query groups);
    /// selecting a topic re-fetches its query groups when the topic is
    /// effective. Metric, version, and query-group changes only re-issue.
    ///
    /// A failed filter request does not undo the selection: it is logged by
    /// [`apply_filter`](Self::apply_filter) and the previous dataset stays.
    pub async fn set_selection(&self, key: &FilterKey, selected: bool) -> Result<()> {
        let previous = self.catalog.lock().await.set_selected(key, selected);
        let Some(previous) = previous else {
            return Err(CatalogError::UnknownItem {
                key: key.to_string(),
            }
            .into());
        };
        info!(item = %key, selected, "Selection changed");

        if selected && !previous {
            match key {
                FilterKey::Corpus(corpus) => {
                    self.progress.lock().await.topic_fetches += 1;
                    self.load_corpus_branch(corpus.clone()).await;
                }
                FilterKey::Topic { corpus, topic } => {
                    let effective = self
                        .catalog
                        .lock()
                        .await
                        .effective_topics(corpus)
                        .contains(topic);
                    if effective {
                        self.progress.lock().await.query_group_fetches += 1;
                        self.load_topic_branch(corpus, topic).await;
                    }
                }
                _ => {}
            }
        }

        if self.apply_filter().await.is_err() {
            debug!(item = %key, "Selection kept without a fresh dataset");
        }
        Ok(())
    }

    /// Flip one item's selection. Returns the new value.
    pub async fn toggle(&self, key: &FilterKey) -> Result<bool> {
        let current = self
            .catalog
            .lock()
            .await
            .selection(key)
            .ok_or_else(|| CatalogError::UnknownItem {
                key: key.to_string(),
            })?;
        self.set_selection(key, !current).await?;
        Ok(!current)
    }

    // --- population ---

    /// Caller must already have counted the corpus fetch as pending.
    async fn populate(&self) {
        tokio::join!(self.load_metrics(), self.load_versions(), self.load_corpora());
    }

    async fn load_initial_dataset(&self) {
        match self.gateway.fetch_dataset().await {
            Ok(data) => {
                let metrics = data.metrics_count();
                self.dataset.write().await.replace(data);
                info!(metrics, "Loaded evaluation dataset");
            }
            Err(e) => warn!(error = %e, "Failed to load evaluation dataset"),
        }
    }

    async fn load_metrics(&self) {
        match self.gateway.fetch_metrics().await {
            Ok(names) => {
                let added = self.catalog.lock().await.merge_metrics(&names);
                debug!(dimension = %Dimension::Metric, fetched = names.len(), added, "Merged");
            }
            Err(e) => warn!(dimension = %Dimension::Metric, error = %e, "Failed to fetch list"),
        }
    }

    async fn load_versions(&self) {
        match self.gateway.fetch_versions().await {
            Ok(names) => {
                let added = self.catalog.lock().await.merge_versions(&names);
                debug!(dimension = %Dimension::Version, fetched = names.len(), added, "Merged");
            }
            Err(e) => warn!(dimension = %Dimension::Version, error = %e, "Failed to fetch list"),
        }
    }

    /// Fetch corpora, then fan out to topics for every selected corpus.
    ///
    /// A failed corpus fetch still proceeds with the corpora already known.
    async fn load_corpora(&self) {
        match self.gateway.fetch_corpora().await {
            Ok(names) => {
                let mut catalog = self.catalog.lock().await;
                let added = catalog.merge_corpora(&names);
                catalog.propagate();
                debug!(dimension = %Dimension::Corpus, fetched = names.len(), added, "Merged");
            }
            Err(e) => warn!(dimension = %Dimension::Corpus, error = %e, "Failed to fetch list"),
        }

        let corpora = self.catalog.lock().await.selected_corpora();
        {
            // Children are counted before the parent is released.
            let mut progress = self.progress.lock().await;
            progress.corpora_pending -= 1;
            progress.topic_fetches += corpora.len();
        }

        let branches = corpora.into_iter().map(|corpus| {
            let this = self.clone();
            tokio::spawn(async move { this.load_corpus_branch(corpus).await })
        });
        for result in join_all(branches).await {
            if let Err(e) = result {
                warn!(error = %e, "Topic branch task failed");
            }
        }
    }

    /// One corpus: topics → merge → propagate → query groups of its topics.
    /// The caller has already counted this fetch.
    async fn load_corpus_branch(&self, corpus: String) {
        match self.gateway.fetch_topics(&corpus).await {
            Ok(names) => {
                let mut catalog = self.catalog.lock().await;
                let added = catalog.merge_topics(&corpus, &names);
                catalog.propagate();
                debug!(corpus = %corpus, fetched = names.len(), added, "Merged topics");
            }
            Err(e) => warn!(corpus = %corpus, error = %e, "Failed to fetch topics"),
        }

        let topics = self.catalog.lock().await.effective_topics(&corpus);
        {
            let mut progress = self.progress.lock().await;
            progress.topic_fetches -= 1;
            progress.query_group_fetches += topics.len();
        }

        let branches = topics.into_iter().map(|topic| {
            let this = self.clone();
            let corpus = corpus.clone();
            tokio::spawn(async move { this.load_topic_branch(&corpus, &topic).await })
        });
        for result in join_all(branches).await {
            if let Err(e) = result {
                warn!(corpus = %corpus, error = %e, "Query group branch task failed");
            }
        }
    }

    /// Query groups are best-effort: a failure is logged and otherwise ignored.
    /// The caller has already counted this fetch.
    async fn load_topic_branch(&self, corpus: &str, topic: &str) {
        match self.gateway.fetch_query_groups(corpus, topic).await {
            Ok(names) => {
                let mut catalog = self.catalog.lock().await;
                let added = catalog.merge_query_groups(corpus, topic, &names);
                catalog.propagate();
                debug!(corpus, topic, fetched = names.len(), added, "Merged query groups");
            }
            Err(e) => warn!(corpus, topic, error = %e, "Failed to fetch query groups"),
        }
        self.progress.lock().await.query_group_fetches -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockGateway;
    use crate::gateway::mock::Endpoint;

    fn controller() -> (Arc<MockGateway>, CascadeController) {
        let gateway = Arc::new(MockGateway::sample());
        let controller = CascadeController::new(gateway.clone());
        (gateway, controller)
    }

    #[test]
    fn test_progress_state_derivation() {
        let mut progress = CascadeProgress::default();
        assert_eq!(progress.state(), CascadeState::Idle);

        progress.activated = true;
        progress.corpora_pending = 1;
        progress.topic_fetches = 2;
        assert_eq!(progress.state(), CascadeState::LoadingRoots);

        progress.corpora_pending = 0;
        progress.query_group_fetches = 1;
        assert_eq!(progress.state(), CascadeState::LoadingTopics);

        progress.topic_fetches = 0;
        assert_eq!(progress.state(), CascadeState::LoadingQueryGroups);

        progress.query_group_fetches = 0;
        assert_eq!(progress.state(), CascadeState::Ready);
    }

    #[tokio::test]
    async fn test_state_idle_before_activation() {
        let (_, controller) = controller();
        assert_eq!(controller.state().await, CascadeState::Idle);
    }

    #[tokio::test]
    async fn test_activate_populates_everything() {
        let (gateway, controller) = controller();
        controller.activate().await;

        assert_eq!(controller.state().await, CascadeState::Ready);
        let catalog = controller.catalog();
        let catalog = catalog.lock().await;
        assert_eq!(catalog.metrics().len(), 3);
        assert_eq!(catalog.versions().len(), 2);
        assert_eq!(catalog.corpora().len(), 2);
        assert_eq!(catalog.topics().len(), 3);
        assert_eq!(catalog.query_groups().len(), 4);
        assert_eq!(gateway.calls(Endpoint::Dataset), 1);
        assert_eq!(controller.dataset().read().await.metrics_count(), 3);
    }

    #[tokio::test]
    async fn test_toggle_unknown_item() {
        let (_, controller) = controller();
        controller.activate().await;
        let err = controller
            .toggle(&FilterKey::Corpus("de".into()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("corpus 'de'"));
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn test_controller_futures_are_send() {
        let (_, controller) = controller();
        let key = FilterKey::Metric("AP".into());
        assert_send(&controller.activate());
        assert_send(&controller.refresh_catalog());
        assert_send(&controller.apply_filter());
        assert_send(&controller.set_selection(&key, false));
        assert_send(&controller.toggle(&key));
    }

    #[tokio::test]
    async fn test_refresh_catalog_marks_activated() {
        let (gateway, controller) = controller();
        controller.refresh_catalog().await;

        assert_eq!(controller.state().await, CascadeState::Ready);
        assert_eq!(controller.catalog().lock().await.query_groups().len(), 4);
        assert_eq!(gateway.calls(Endpoint::Dataset), 0);
    }

    #[tokio::test]
    async fn test_selection_stands_when_filter_fails() {
        let (gateway, controller) = controller();
        controller.activate().await;
        gateway.fail(Endpoint::Filter);

        let key = FilterKey::Metric("AP".into());
        controller.set_selection(&key, false).await.unwrap();

        assert_eq!(controller.catalog().lock().await.selection(&key), Some(false));
        assert_eq!(controller.dataset().read().await.revision(), 1);
        assert_eq!(gateway.calls(Endpoint::Filter), 1);
    }

    #[tokio::test]
    async fn test_toggle_returns_new_state() {
        let (gateway, controller) = controller();
        controller.activate().await;

        let key = FilterKey::Metric("AP".into());
        assert!(!controller.toggle(&key).await.unwrap());
        assert!(controller.toggle(&key).await.unwrap());
        assert_eq!(gateway.calls(Endpoint::Filter), 2);
    }
}
