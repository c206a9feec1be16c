//! Container runtime backends for the dashward dashboard.
//!
//! The lifecycle core only talks to the `ContainerRuntime` trait. This crate
//! provides the `docker`/`podman` CLI backend used in production, an
//! in-memory (optionally file-backed) mock backend for tests, and
//! prerequisite checks for the runtime binary.

pub mod backend;
pub mod docker;
pub mod mock;
pub mod prereq;

pub use backend::{
    select_runtime, BindMount, ContainerRuntime, ContainerSpec, ContainerStatus, PortBinding,
};
pub use docker::DockerCli;
pub use mock::{MockOp, MockRuntime};
pub use prereq::{check_runtime_prereqs, format_missing, MissingPrereq};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("container runtime is not available: {0}")]
    Unavailable(String),
    #[error("no such container or image: {0}")]
    NotFound(String),
    #[error("'{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
    #[error("mock runtime state error: {0}")]
    MockState(String),
}
