//! # Filter Catalog
//!
//! Owns the selectable collections of every filter dimension (metrics,
//! versions, corpora, topics, query groups) and the rules that keep them
//! consistent:
//!
//! - merges are append-only and keyed, so a repeated fetch never replaces an
//!   item or resets its flags;
//! - `disabled` on topics and query groups is derived from the ancestor's
//!   state and recomputed top-down (corpus → topic → query group);
//! - the active filter request is a pure function of the current flags.

pub mod items;
pub mod request;

pub use items::{Dimension, FilterKey, QueryGroupItem, SelectableItem, TopicItem};
pub use request::{ActiveFilterRequest, QueryGroupFilter, TopicFilter};

use serde::Serialize;

/// Ordered, unique-by-key collections for every filter dimension.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterCatalog {
    metrics: Vec<SelectableItem>,
    versions: Vec<SelectableItem>,
    corpora: Vec<SelectableItem>,
    topics: Vec<TopicItem>,
    query_groups: Vec<QueryGroupItem>,
}

impl FilterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    // --- merging ---

    /// Append every unknown metric name, selected. Returns how many were added.
    pub fn merge_metrics<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        merge_names(&mut self.metrics, names)
    }

    pub fn merge_versions<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        merge_names(&mut self.versions, names)
    }

    pub fn merge_corpora<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        merge_names(&mut self.corpora, names)
    }

    /// Append topics of `corpus` that are not known yet.
    ///
    /// New topics arrive enabled; call [`propagate`](Self::propagate) afterwards
    /// so they pick up the corpus' current state.
    pub fn merge_topics<I, S>(&mut self, corpus: &str, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for name in names {
            let name = name.as_ref();
            if !self.topics.iter().any(|t| t.matches(corpus, name)) {
                self.topics.push(TopicItem::new(corpus, name));
                added += 1;
            }
        }
        added
    }

    /// Append query groups of `(corpus, topic)` that are not known yet.
    pub fn merge_query_groups<I, S>(&mut self, corpus: &str, topic: &str, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for name in names {
            let name = name.as_ref();
            if !self.query_groups.iter().any(|g| g.matches(corpus, topic, name)) {
                self.query_groups.push(QueryGroupItem::new(corpus, topic, name));
                added += 1;
            }
        }
        added
    }

    // --- propagation ---

    /// Recompute every topic's `disabled` flag from its corpus.
    ///
    /// A topic whose corpus is not in the catalog counts as disabled.
    pub fn propagate_corpus_selection(&mut self) {
        let corpora = &self.corpora;
        for topic in &mut self.topics {
            let corpus_selected = corpora
                .iter()
                .find(|c| c.name() == topic.corpus())
                .is_some_and(SelectableItem::is_selected);
            topic.set_disabled(!corpus_selected);
        }
    }

    /// Recompute every query group's `disabled` flag from its topic.
    ///
    /// Reads the topics' current `disabled` flags, so corpus propagation has
    /// to run first whenever a corpus changed.
    pub fn propagate_topic_selection(&mut self) {
        let topics = &self.topics;
        for group in &mut self.query_groups {
            let topic_effective = topics
                .iter()
                .find(|t| t.matches(group.corpus(), group.topic()))
                .is_some_and(TopicItem::is_effective);
            group.set_disabled(!topic_effective);
        }
    }

    /// Full top-down pass: corpus → topic → query group.
    pub fn propagate(&mut self) {
        self.propagate_corpus_selection();
        self.propagate_topic_selection();
    }

    // --- selection ---

    /// Current `selected` flag of the addressed item, if it exists.
    pub fn selection(&self, key: &FilterKey) -> Option<bool> {
        match key {
            FilterKey::Metric(name) => find_flat(&self.metrics, name).map(|i| i.is_selected()),
            FilterKey::Version(name) => find_flat(&self.versions, name).map(|i| i.is_selected()),
            FilterKey::Corpus(name) => find_flat(&self.corpora, name).map(|i| i.is_selected()),
            FilterKey::Topic { corpus, topic } => self
                .topics
                .iter()
                .find(|t| t.matches(corpus, topic))
                .map(TopicItem::is_selected),
            FilterKey::QueryGroup {
                corpus,
                topic,
                name,
            } => self
                .query_groups
                .iter()
                .find(|g| g.matches(corpus, topic, name))
                .map(QueryGroupItem::is_selected),
        }
    }

    /// Set the `selected` flag of the addressed item and run the propagation
    /// its dimension requires. Returns the previous flag, or `None` when the
    /// item is unknown (nothing changes in that case).
    pub fn set_selected(&mut self, key: &FilterKey, selected: bool) -> Option<bool> {
        match key {
            FilterKey::Metric(name) => set_flat(&mut self.metrics, name, selected),
            FilterKey::Version(name) => set_flat(&mut self.versions, name, selected),
            FilterKey::Corpus(name) => {
                let previous = set_flat(&mut self.corpora, name, selected)?;
                self.propagate();
                Some(previous)
            }
            FilterKey::Topic { corpus, topic } => {
                let item = self.topics.iter_mut().find(|t| t.matches(corpus, topic))?;
                let previous = item.is_selected();
                item.set_selected(selected);
                self.propagate_topic_selection();
                Some(previous)
            }
            FilterKey::QueryGroup {
                corpus,
                topic,
                name,
            } => {
                let item = self
                    .query_groups
                    .iter_mut()
                    .find(|g| g.matches(corpus, topic, name))?;
                let previous = item.is_selected();
                item.set_selected(selected);
                Some(previous)
            }
        }
    }

    // --- derivation ---

    /// Build the filter payload from the current flags.
    pub fn derive_active_request(&self) -> ActiveFilterRequest {
        ActiveFilterRequest {
            corpora: selected_names(&self.corpora),
            topics: self
                .topics
                .iter()
                .filter(|t| t.is_effective())
                .map(|t| TopicFilter {
                    topic_name: t.name().to_string(),
                    corpus: t.corpus().to_string(),
                })
                .collect(),
            query_groups: self
                .query_groups
                .iter()
                .filter(|g| g.is_effective())
                .map(|g| QueryGroupFilter {
                    query_group: g.name().to_string(),
                    topic: g.topic().to_string(),
                    corpus: g.corpus().to_string(),
                })
                .collect(),
            metrics: selected_names(&self.metrics),
            versions: selected_names(&self.versions),
        }
    }

    /// Names of the corpora whose topics should be fetched.
    pub fn selected_corpora(&self) -> Vec<String> {
        selected_names(&self.corpora)
    }

    /// Names of the selected, enabled topics of `corpus`.
    pub fn effective_topics(&self, corpus: &str) -> Vec<String> {
        self.topics
            .iter()
            .filter(|t| t.corpus() == corpus && t.is_effective())
            .map(|t| t.name().to_string())
            .collect()
    }

    // --- accessors ---

    pub fn metrics(&self) -> &[SelectableItem] {
        &self.metrics
    }

    pub fn versions(&self) -> &[SelectableItem] {
        &self.versions
    }

    pub fn corpora(&self) -> &[SelectableItem] {
        &self.corpora
    }

    pub fn topics(&self) -> &[TopicItem] {
        &self.topics
    }

    pub fn query_groups(&self) -> &[QueryGroupItem] {
        &self.query_groups
    }

    /// Whether no dimension holds any item yet.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
            && self.versions.is_empty()
            && self.corpora.is_empty()
            && self.topics.is_empty()
            && self.query_groups.is_empty()
    }
}

fn merge_names<I, S>(items: &mut Vec<SelectableItem>, names: I) -> usize
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut added = 0;
    for name in names {
        let name = name.as_ref();
        if find_flat(items, name).is_none() {
            items.push(SelectableItem::new(name));
            added += 1;
        }
    }
    added
}

fn find_flat<'a>(items: &'a [SelectableItem], name: &str) -> Option<&'a SelectableItem> {
    items.iter().find(|i| i.name() == name)
}

fn set_flat(items: &mut [SelectableItem], name: &str, selected: bool) -> Option<bool> {
    let item = items.iter_mut().find(|i| i.name() == name)?;
    let previous = item.is_selected();
    item.set_selected(selected);
    Some(previous)
}

fn selected_names(items: &[SelectableItem]) -> Vec<String> {
    items
        .iter()
        .filter(|i| i.is_selected())
        .map(|i| i.name().to_string())
        .collect()
}
