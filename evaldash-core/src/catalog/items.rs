//! Selectable items for each filter dimension.

use serde::{Deserialize, Serialize};

/// The filterable dimensions of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Metric,
    Version,
    Corpus,
    Topic,
    QueryGroup,
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Metric => write!(f, "metric"),
            Dimension::Version => write!(f, "version"),
            Dimension::Corpus => write!(f, "corpus"),
            Dimension::Topic => write!(f, "topic"),
            Dimension::QueryGroup => write!(f, "query group"),
        }
    }
}

/// A flat, name-keyed item: a metric, a version, or a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectableItem {
    name: String,
    selected: bool,
}

impl SelectableItem {
    /// Newly discovered items start selected.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selected: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

/// A topic within a corpus.
///
/// `disabled` mirrors the parent corpus: it is only ever written by
/// [`FilterCatalog::propagate_corpus_selection`](super::FilterCatalog::propagate_corpus_selection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicItem {
    name: String,
    corpus: String,
    selected: bool,
    disabled: bool,
    id: String,
}

impl TopicItem {
    pub fn new(corpus: impl Into<String>, name: impl Into<String>) -> Self {
        let corpus = corpus.into();
        let name = name.into();
        Self {
            id: format!("{corpus}_{name}"),
            name,
            corpus,
            selected: true,
            disabled: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn corpus(&self) -> &str {
        &self.corpus
    }

    /// `corpus + "_" + name`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Selected and not disabled by its corpus.
    pub fn is_effective(&self) -> bool {
        self.selected && !self.disabled
    }

    pub(crate) fn matches(&self, corpus: &str, name: &str) -> bool {
        self.corpus == corpus && self.name == name
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub(crate) fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }
}

/// A query group within a (corpus, topic) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryGroupItem {
    name: String,
    corpus: String,
    topic: String,
    selected: bool,
    disabled: bool,
    id: String,
}

impl QueryGroupItem {
    pub fn new(
        corpus: impl Into<String>,
        topic: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let corpus = corpus.into();
        let topic = topic.into();
        let name = name.into();
        Self {
            id: format!("{corpus}_{topic}_{name}"),
            name,
            corpus,
            topic,
            selected: true,
            disabled: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn corpus(&self) -> &str {
        &self.corpus
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// `corpus + "_" + topic + "_" + name`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_effective(&self) -> bool {
        self.selected && !self.disabled
    }

    pub(crate) fn matches(&self, corpus: &str, topic: &str, name: &str) -> bool {
        self.corpus == corpus && self.topic == topic && self.name == name
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub(crate) fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }
}

/// Addresses a single item anywhere in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterKey {
    Metric(String),
    Version(String),
    Corpus(String),
    Topic {
        corpus: String,
        topic: String,
    },
    QueryGroup {
        corpus: String,
        topic: String,
        name: String,
    },
}

impl FilterKey {
    pub fn dimension(&self) -> Dimension {
        match self {
            FilterKey::Metric(_) => Dimension::Metric,
            FilterKey::Version(_) => Dimension::Version,
            FilterKey::Corpus(_) => Dimension::Corpus,
            FilterKey::Topic { .. } => Dimension::Topic,
            FilterKey::QueryGroup { .. } => Dimension::QueryGroup,
        }
    }
}

impl std::fmt::Display for FilterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterKey::Metric(name) | FilterKey::Version(name) | FilterKey::Corpus(name) => {
                write!(f, "{} '{}'", self.dimension(), name)
            }
            FilterKey::Topic { corpus, topic } => write!(f, "topic '{topic}' in '{corpus}'"),
            FilterKey::QueryGroup {
                corpus,
                topic,
                name,
            } => write!(f, "query group '{name}' in '{corpus}/{topic}'"),
        }
    }
}
