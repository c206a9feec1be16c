//! Lifecycle orchestration for the dashward dashboard container.
//!
//! This crate ties the persisted configuration record and a container runtime
//! backend together into the `LifecycleManager`, which drives `setup`,
//! `start`, `stop`, and `remove`. It also owns the dashboard state machine
//! and the confirmation gate consulted before destructive operations.
//!
//! `setup` and `start` fail fast on runtime and persistence errors; `stop`
//! and `remove` downgrade every runtime failure to a warning so a broken
//! install can always be cleared.

pub mod confirm;
pub mod container;
pub mod lifecycle;
pub mod manager;

pub use confirm::{ConfirmationGate, FixedAnswer, REMOVE_PROMPT};
pub use lifecycle::{validate_transition, DashboardState};
pub use manager::{
    LifecycleManager, RemoveOptions, RemoveReport, SetupOutcome, SetupRequest, StartOutcome,
    StatusReport, StopOutcome,
};

use dashward_runtime::RuntimeError;
use dashward_schema::RecordError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(
        "config error: dashboard is already configured ({}), pass --force to overwrite it",
        .0.display()
    )]
    AlreadyConfigured(PathBuf),
    #[error(
        "config error: dashboard is not configured ({} not found), run 'setup' first",
        .0.display()
    )]
    NotConfigured(PathBuf),
    #[error("config error: {0}")]
    InvalidInput(String),
    #[error("runtime error: {0}")]
    RuntimeUnavailable(String),
    #[error("runtime error: {0}")]
    RuntimeOperationFailed(#[source] RuntimeError),
    #[error("persistence error: {0}")]
    PersistenceFailure(#[from] RecordError),
    #[error("prompt failed: {0}")]
    Prompt(String),
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl From<RuntimeError> for CoreError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::Unavailable(msg) => CoreError::RuntimeUnavailable(msg),
            other => CoreError::RuntimeOperationFailed(other),
        }
    }
}
