use crate::RuntimeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortBinding {
    pub host_addr: String,
    pub host_port: u16,
    pub container_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BindMount {
    pub source: PathBuf,
    pub target: PathBuf,
    pub read_only: bool,
}

/// Everything needed to materialize the dashboard container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerSpec {
    pub id: String,
    pub image: String,
    pub ports: Vec<PortBinding>,
    pub mounts: Vec<BindMount>,
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerStatus {
    pub id: String,
    pub exists: bool,
    pub running: bool,
}

impl ContainerStatus {
    pub fn absent(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            exists: false,
            running: false,
        }
    }
}

/// Capability set the lifecycle manager needs from a container engine.
///
/// Implementations must make `start` on a running container and `stop` on
/// a stopped one succeed without doing anything.
pub trait ContainerRuntime: Send + Sync {
    fn name(&self) -> &str;

    fn available(&self) -> bool;

    /// Inspect a container by name. A missing container is not an error:
    /// it reports `exists: false`.
    fn inspect(&self, id: &str) -> Result<ContainerStatus, RuntimeError>;

    fn exists(&self, id: &str) -> Result<bool, RuntimeError> {
        Ok(self.inspect(id)?.exists)
    }

    fn image_present(&self, image: &str) -> Result<bool, RuntimeError>;

    fn pull_image(&self, image: &str) -> Result<(), RuntimeError>;

    fn create(&self, spec: &ContainerSpec) -> Result<(), RuntimeError>;

    fn start(&self, id: &str) -> Result<(), RuntimeError>;

    fn stop(&self, id: &str) -> Result<(), RuntimeError>;

    fn remove(&self, id: &str) -> Result<(), RuntimeError>;

    fn remove_image(&self, image: &str) -> Result<(), RuntimeError>;
}

/// Pick a runtime backend by name.
///
/// `state_dir` is only used by the mock backend, which keeps its state in a
/// file there so separate invocations see the same containers.
pub fn select_runtime(
    name: &str,
    state_dir: &Path,
) -> Result<Box<dyn ContainerRuntime>, RuntimeError> {
    match name {
        "docker" => Ok(Box::new(crate::docker::DockerCli::new("docker"))),
        "podman" => Ok(Box::new(crate::docker::DockerCli::new("podman"))),
        "mock" => Ok(Box::new(crate::mock::MockRuntime::persistent(
            state_dir.join("mock-runtime.json"),
        )?)),
        other => Err(RuntimeError::Unavailable(format!(
            "unknown runtime '{other}' (expected: docker, podman, mock)"
        ))),
    }
}
