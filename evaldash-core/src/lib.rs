//! # Evaldash Core
//!
//! Core library for the evaldash evaluation dashboard.
//! Provides the filter catalog, the cascade controller that populates it from
//! the remote gateway, the periodic refresh scheduler, configuration, and the
//! dataset view-model.

pub mod catalog;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod error;
pub mod gateway;
pub mod refresh;

// Re-export commonly used types at the crate root.
pub use catalog::{
    ActiveFilterRequest, Dimension, FilterCatalog, FilterKey, QueryGroupFilter, QueryGroupItem,
    SelectableItem, TopicFilter, TopicItem,
};
pub use config::{DashboardConfig, EndpointConfig, GatewayConfig, RefreshConfig, load_config};
pub use controller::{CascadeController, CascadeState, SharedCatalog, SharedDataset};
pub use dataset::{DatasetView, EvaluationData};
pub use error::{CatalogError, ConfigError, DashError, GatewayError, Result};
pub use gateway::{CatalogGateway, HttpGateway, MockGateway};
pub use refresh::{RefreshHandle, RefreshScheduler};
