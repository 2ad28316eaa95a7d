//! The filter payload posted to the remote catalog.

use serde::{Deserialize, Serialize};

/// A topic reference inside an [`ActiveFilterRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicFilter {
    pub topic_name: String,
    pub corpus: String,
}

/// A query group reference inside an [`ActiveFilterRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryGroupFilter {
    pub query_group: String,
    pub topic: String,
    pub corpus: String,
}

/// Snapshot of every currently effective selection.
///
/// Derived on demand from the catalog and never stored; the JSON field names
/// (`corpora`, `topics`, `queryGroups`, `metrics`, `versions`) are the wire
/// contract of the filter endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveFilterRequest {
    pub corpora: Vec<String>,
    pub topics: Vec<TopicFilter>,
    pub query_groups: Vec<QueryGroupFilter>,
    pub metrics: Vec<String>,
    pub versions: Vec<String>,
}

impl ActiveFilterRequest {
    /// True when nothing at all is selected.
    pub fn is_empty(&self) -> bool {
        self.corpora.is_empty()
            && self.topics.is_empty()
            && self.query_groups.is_empty()
            && self.metrics.is_empty()
            && self.versions.is_empty()
    }
}
