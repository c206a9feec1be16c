use crate::backend::{ContainerRuntime, ContainerSpec, ContainerStatus};
use crate::RuntimeError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;

/// Operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MockOp {
    Inspect,
    Pull,
    Create,
    Start,
    Stop,
    Remove,
    RemoveImage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct MockContainer {
    spec: ContainerSpec,
    running: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MockState {
    containers: BTreeMap<String, MockContainer>,
    images: BTreeSet<String>,
}

/// Runtime that mimics docker semantics without a container engine.
///
/// State lives in memory, or in a JSON file for `persistent` runtimes so
/// that separate processes observe the same containers.
pub struct MockRuntime {
    state: Mutex<MockState>,
    state_file: Option<PathBuf>,
    failures: Mutex<BTreeSet<MockOp>>,
    calls: Mutex<Vec<String>>,
    available: bool,
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            state_file: None,
            failures: Mutex::new(BTreeSet::new()),
            calls: Mutex::new(Vec::new()),
            available: true,
        }
    }
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock runtime backed by `path`, loading any state already there.
    pub fn persistent(path: impl Into<PathBuf>) -> Result<Self, RuntimeError> {
        let path = path.into();
        let state = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)
                .map_err(|e| RuntimeError::MockState(format!("{}: {e}", path.display())))?
        } else {
            MockState::default()
        };
        Ok(Self {
            state: Mutex::new(state),
            state_file: Some(path),
            ..Self::default()
        })
    }

    /// A runtime whose `available()` reports false and every call fails.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    pub fn fail_on(&self, op: MockOp) {
        if let Ok(mut f) = self.failures.lock() {
            f.insert(op);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut f) = self.failures.lock() {
            f.clear();
        }
    }

    pub fn add_image(&self, image: &str) {
        if let Ok(mut s) = self.state.lock() {
            s.images.insert(image.to_owned());
        }
    }

    pub fn has_image(&self, image: &str) -> bool {
        self.state
            .lock()
            .map(|s| s.images.contains(image))
            .unwrap_or(false)
    }

    /// Spec the container was created with, if it exists.
    pub fn container_spec(&self, id: &str) -> Option<ContainerSpec> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.containers.get(id).map(|c| c.spec.clone()))
    }

    /// Every runtime call made so far, as `"<op> <subject>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn enter(&self, op: MockOp, subject: &str) -> Result<MutexGuard<'_, MockState>, RuntimeError> {
        if let Ok(mut c) = self.calls.lock() {
            c.push(format!("{} {subject}", format!("{op:?}").to_ascii_lowercase()));
        }
        if !self.available {
            return Err(RuntimeError::Unavailable("mock runtime is offline".to_owned()));
        }
        let injected = self
            .failures
            .lock()
            .map(|f| f.contains(&op))
            .unwrap_or(false);
        if injected {
            return Err(RuntimeError::CommandFailed {
                command: format!("mock {op:?} {subject}"),
                stderr: "injected failure".to_owned(),
            });
        }
        self.state
            .lock()
            .map_err(|e| RuntimeError::MockState(format!("mutex poisoned: {e}")))
    }

    fn persist(&self, state: &MockState) -> Result<(), RuntimeError> {
        let Some(path) = &self.state_file else {
            return Ok(());
        };
        let dir = path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir)?;
        let content = serde_json::to_string_pretty(state)
            .map_err(|e| RuntimeError::MockState(e.to_string()))?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(path).map_err(|e| RuntimeError::Io(e.error))?;
        Ok(())
    }
}

impl ContainerRuntime for MockRuntime {
    fn name(&self) -> &str {
        "mock"
    }

    fn available(&self) -> bool {
        self.available
    }

    fn inspect(&self, id: &str) -> Result<ContainerStatus, RuntimeError> {
        let state = self.enter(MockOp::Inspect, id)?;
        Ok(match state.containers.get(id) {
            Some(c) => ContainerStatus {
                id: id.to_owned(),
                exists: true,
                running: c.running,
            },
            None => ContainerStatus::absent(id),
        })
    }

    fn image_present(&self, image: &str) -> Result<bool, RuntimeError> {
        let state = self.enter(MockOp::Inspect, image)?;
        Ok(state.images.contains(image))
    }

    fn pull_image(&self, image: &str) -> Result<(), RuntimeError> {
        let mut state = self.enter(MockOp::Pull, image)?;
        state.images.insert(image.to_owned());
        self.persist(&state)
    }

    fn create(&self, spec: &ContainerSpec) -> Result<(), RuntimeError> {
        let mut state = self.enter(MockOp::Create, &spec.id)?;
        if state.containers.contains_key(&spec.id) {
            return Err(RuntimeError::CommandFailed {
                command: format!("mock create {}", spec.id),
                stderr: format!("container name '{}' is already in use", spec.id),
            });
        }
        if !state.images.contains(&spec.image) {
            return Err(RuntimeError::NotFound(spec.image.clone()));
        }
        state.containers.insert(
            spec.id.clone(),
            MockContainer {
                spec: spec.clone(),
                running: false,
            },
        );
        self.persist(&state)
    }

    fn start(&self, id: &str) -> Result<(), RuntimeError> {
        let mut state = self.enter(MockOp::Start, id)?;
        let container = state
            .containers
            .get_mut(id)
            .ok_or_else(|| RuntimeError::NotFound(id.to_owned()))?;
        container.running = true;
        self.persist(&state)
    }

    fn stop(&self, id: &str) -> Result<(), RuntimeError> {
        let mut state = self.enter(MockOp::Stop, id)?;
        let container = state
            .containers
            .get_mut(id)
            .ok_or_else(|| RuntimeError::NotFound(id.to_owned()))?;
        container.running = false;
        self.persist(&state)
    }

    fn remove(&self, id: &str) -> Result<(), RuntimeError> {
        let mut state = self.enter(MockOp::Remove, id)?;
        match state.containers.get(id) {
            None => return Err(RuntimeError::NotFound(id.to_owned())),
            Some(c) if c.running => {
                return Err(RuntimeError::CommandFailed {
                    command: format!("mock remove {id}"),
                    stderr: "cannot remove a running container".to_owned(),
                })
            }
            Some(_) => {}
        }
        state.containers.remove(id);
        self.persist(&state)
    }

    fn remove_image(&self, image: &str) -> Result<(), RuntimeError> {
        let mut state = self.enter(MockOp::RemoveImage, image)?;
        if state.containers.values().any(|c| c.spec.image == image) {
            return Err(RuntimeError::CommandFailed {
                command: format!("mock remove-image {image}"),
                stderr: "image is in use by a container".to_owned(),
            });
        }
        if !state.images.remove(image) {
            return Err(RuntimeError::NotFound(image.to_owned()));
        }
        self.persist(&state)
    }
}
