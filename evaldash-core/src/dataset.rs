//! Evaluation dataset view-model: the latest result set shown by the dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An evaluation result set as returned by the dataset and filter endpoints.
///
/// Only the fields the dashboard reads are typed; everything else is carried
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Metric values keyed by metric name.
    #[serde(default)]
    pub metrics: Map<String, Value>,
    #[serde(default)]
    pub corpora: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EvaluationData {
    /// Number of distinct metrics in this result set.
    pub fn metrics_count(&self) -> usize {
        self.metrics.len()
    }
}

/// Holds the most recent dataset. Replaced wholesale on every successful
/// fetch; a failed fetch leaves it as it was.
#[derive(Debug, Clone, Default)]
pub struct DatasetView {
    data: Option<EvaluationData>,
    updated_at: Option<DateTime<Utc>>,
    revision: u64,
}

impl DatasetView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, data: EvaluationData) {
        self.data = Some(data);
        self.updated_at = Some(Utc::now());
        self.revision += 1;
    }

    pub fn data(&self) -> Option<&EvaluationData> {
        self.data.as_ref()
    }

    /// Distinct metrics in the current dataset, 0 when nothing is loaded.
    pub fn metrics_count(&self) -> usize {
        self.data.as_ref().map_or(0, EvaluationData::metrics_count)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// How many times the dataset has been replaced.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
