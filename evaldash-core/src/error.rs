//! Error types for the evaldash core.
//!
//! Uses `thiserror` for public API error types. Transport failures against the
//! remote catalog are never fatal to a dashboard session: the controller logs
//! them and keeps the affected dimension (or dataset) at its prior state.

/// Top-level error type for the evaldash core library.
#[derive(Debug, thiserror::Error)]
pub enum DashError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the remote catalog gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },

    #[error("Request to {endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Could not decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("HTTP client could not be built: {message}")]
    ClientBuild { message: String },
}

/// Errors from addressing items in the filter catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Unknown filter item: {key}")]
    UnknownItem { key: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `DashError`.
pub type Result<T> = std::result::Result<T, DashError>;
