//! Persisted state and per-invocation settings for the dashward dashboard.
//!
//! This crate defines the schema layer: the TOML configuration record
//! (`ConfigRecord`) written by `setup`, the platform database binding it
//! carries (`DatabaseBinding`), the explicit installation settings that
//! replace process-wide defaults (`InstallSettings`), and the credential
//! generator used for first-time setup.

pub mod credentials;
pub mod database;
pub mod record;
pub mod settings;

pub use credentials::{generate_password, DEFAULT_PASSWORD_LENGTH};
pub use database::{DatabaseBinding, DatabaseKind, DEFAULT_GATEWAY_ADDR};
pub use record::{parse_listen_port, ConfigRecord};
pub use settings::{
    InstallSettings, DEFAULT_CONTAINER_ID, DEFAULT_IMAGE, DEFAULT_LISTEN_ADDRESS,
    DEFAULT_LISTEN_PORT, DEFAULT_USERNAME,
};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to access configuration record: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration record: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("failed to serialize configuration record: {0}")]
    SerializeToml(#[from] toml::ser::Error),
    #[error("listen address must not be empty")]
    EmptyListenAddress,
    #[error("invalid listen port '{0}', expected 1-65535")]
    InvalidListenPort(String),
    #[error("invalid database binding: {0}")]
    InvalidDatabase(String),
    #[error("{0} must be an absolute path, got '{path}'", path = .1.display())]
    RelativePath(&'static str, PathBuf),
}
