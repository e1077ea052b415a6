//! Typed errors for routing, configuration and the storage boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("invalid {kind} identifier: '{name}'")]
    InvalidIdentifier { kind: &'static str, name: String },
    #[error("invalid path: '{0}'")]
    InvalidPath(String),
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// No registered descriptor accepts the identifier.
    #[error("unknown resource: {0}")]
    UnknownResource(String),
    #[error("failed to insert row into {0}")]
    InsertFailed(String),
    #[error("invalid column: {0}")]
    InvalidColumn(String),
    #[error("invalid uri: {0}")]
    InvalidUri(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}
