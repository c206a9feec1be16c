use crate::confirm::{ConfirmationGate, REMOVE_PROMPT};
use crate::container::{container_spec, dashboard_store, datasource};
use crate::lifecycle::{validate_transition, DashboardState};
use crate::CoreError;
use dashward_runtime::{ContainerRuntime, ContainerSpec, ContainerStatus, RuntimeError};
use dashward_schema::{
    generate_password, ConfigRecord, DatabaseBinding, InstallSettings, RecordError,
    DEFAULT_PASSWORD_LENGTH,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the operator asked `setup` for. Empty password or data directory
/// fall back to a generated password and the installation's data directory.
#[derive(Debug, Clone)]
pub struct SetupRequest {
    pub listen_address: String,
    pub listen_port: String,
    pub password: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub database: DatabaseBinding,
    pub force: bool,
}

#[derive(Debug)]
pub struct SetupOutcome {
    pub record: ConfigRecord,
    /// The platform database as seen from inside the container.
    pub datasource: DatabaseBinding,
}

#[derive(Debug)]
pub struct StartOutcome {
    pub record: ConfigRecord,
    pub already_running: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    AlreadyStopped,
    Absent,
    /// The runtime could not stop the container. Reported, never fatal.
    Failed(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOptions {
    /// Also remove the container image.
    pub force: bool,
    /// Do not consult the confirmation gate.
    pub skip_confirmation: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RemoveReport {
    pub declined: bool,
    pub container_removed: bool,
    pub data_removed: bool,
    pub image_removed: bool,
    pub warnings: Vec<String>,
}

impl RemoveReport {
    fn warn(&mut self, msg: String) {
        warn!("{msg}");
        self.warnings.push(msg);
    }
}

#[derive(Debug)]
pub struct StatusReport {
    pub state: DashboardState,
    pub container: ContainerStatus,
    pub record: Option<ConfigRecord>,
}

/// Drives the dashboard through setup, start, stop, and remove.
///
/// The record at `settings.record_path()` is the source of truth for what
/// was installed; the runtime is only asked about the one container named
/// by `settings.container_id`.
pub struct LifecycleManager {
    settings: InstallSettings,
    runtime: Arc<dyn ContainerRuntime>,
}

impl LifecycleManager {
    pub fn new(settings: InstallSettings, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { settings, runtime }
    }

    pub fn settings(&self) -> &InstallSettings {
        &self.settings
    }

    /// Install a fresh dashboard container and persist its record.
    ///
    /// The record is only written once the container is confirmed running;
    /// on any failure after creation the container is discarded again.
    pub fn setup(&self, request: SetupRequest) -> Result<SetupOutcome, CoreError> {
        let record_path = self.settings.record_path();
        if ConfigRecord::exists(&record_path) && !request.force {
            return Err(CoreError::AlreadyConfigured(record_path));
        }

        let password = match request.password.filter(|p| !p.is_empty()) {
            Some(p) => p,
            None => {
                debug!("no password given, generating one");
                generate_password(DEFAULT_PASSWORD_LENGTH)
            }
        };
        let data_dir = request
            .data_dir
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| self.settings.data_dir().to_path_buf());

        let record = ConfigRecord {
            listen_address: request.listen_address,
            listen_port: request.listen_port,
            username: self.settings.username.clone(),
            password,
            data_dir,
            container_id: self.settings.container_id.clone(),
            image: self.settings.image.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
            database: request.database,
        };
        let spec = container_spec(&record)?;

        if !self.runtime.available() {
            return Err(CoreError::RuntimeUnavailable(format!(
                "'{}' runtime is not reachable",
                self.runtime.name()
            )));
        }

        info!(
            "setting up dashboard container '{}' on {}",
            record.container_id,
            record.listen_url()
        );
        std::fs::create_dir_all(&record.data_dir).map_err(RecordError::from)?;

        // Pull before the existing installation is torn down.
        self.ensure_image(&record.image)?;
        let current = self.runtime.inspect(&record.container_id)?;
        let had_record = ConfigRecord::exists(&record_path);
        let previous = DashboardState::observe(had_record, &current);
        if previous != DashboardState::Uninstalled {
            validate_transition(previous, DashboardState::Removed)?;
        }
        validate_transition(DashboardState::Removed, DashboardState::Configured)?;

        let replaced = self.discard_stale_container(&current)?;
        if let Err(e) = self.install(&spec, &record, &record_path) {
            if replaced && had_record {
                drop_stale_record(&record_path);
            }
            return Err(e);
        }

        info!("dashboard is ready");
        let datasource = datasource(&record, &self.settings.gateway_addr);
        Ok(SetupOutcome { record, datasource })
    }

    /// Start the configured container. Starting a running one is a no-op.
    pub fn start(&self) -> Result<StartOutcome, CoreError> {
        let record = self.load_record()?;
        let id = &self.settings.container_id;
        if record.container_id != *id {
            return Err(CoreError::InvalidInput(format!(
                "{} names container '{}', but this installation manages '{id}'; run 'setup --force'",
                self.settings.record_path().display(),
                record.container_id
            )));
        }

        let status = self.runtime.inspect(id)?;
        validate_transition(
            DashboardState::observe(true, &status),
            DashboardState::Running,
        )?;
        if status.running {
            info!("container '{id}' is already running");
            return Ok(StartOutcome {
                record,
                already_running: true,
            });
        }

        self.runtime.start(id)?;
        info!("started dashboard, url: {}", record.listen_url());
        Ok(StartOutcome {
            record,
            already_running: false,
        })
    }

    /// Stop the managed container. Never fails: every problem is logged and
    /// reported through the outcome.
    pub fn stop(&self) -> StopOutcome {
        let id = &self.settings.container_id;
        if let Ok(record) = ConfigRecord::load(&self.settings.record_path()) {
            debug!("stopping dashboard served at {}", record.listen_url());
        }

        let status = match self.runtime.inspect(id) {
            Ok(s) => s,
            Err(e) => {
                warn!("unable to inspect container '{id}': {e}");
                return StopOutcome::Failed(e.to_string());
            }
        };
        if !status.exists {
            warn!("container '{id}' does not exist, nothing to stop");
            return StopOutcome::Absent;
        }
        if !status.running {
            warn!("container '{id}' is already stopped");
            return StopOutcome::AlreadyStopped;
        }

        match self.runtime.stop(id) {
            Ok(()) => {
                info!("stopped container '{id}'");
                StopOutcome::Stopped
            }
            Err(e) => {
                warn!("unable to stop container '{id}': {e}");
                StopOutcome::Failed(e.to_string())
            }
        }
    }

    /// Remove the container, the dashboard storage, the record, and with
    /// `force` the image.
    ///
    /// Only a failing confirmation prompt is an error. Every cleanup step is
    /// attempted and its failure recorded as a warning.
    pub fn remove(
        &self,
        options: RemoveOptions,
        gate: &dyn ConfirmationGate,
    ) -> Result<RemoveReport, CoreError> {
        if !options.skip_confirmation && !gate.confirm(REMOVE_PROMPT, true)? {
            info!("removal declined, nothing changed");
            return Ok(RemoveReport {
                declined: true,
                ..RemoveReport::default()
            });
        }

        let mut report = RemoveReport::default();
        let id = &self.settings.container_id;
        let record_path = self.settings.record_path();

        let record = if ConfigRecord::exists(&record_path) {
            match ConfigRecord::load(&record_path) {
                Ok(r) => Some(r),
                Err(e) => {
                    report.warn(format!(
                        "unable to read {}, using default paths: {e}",
                        record_path.display()
                    ));
                    None
                }
            }
        } else {
            None
        };
        let data_dir = record
            .as_ref()
            .map_or_else(|| self.settings.data_dir().to_path_buf(), |r| r.data_dir.clone());
        let image = record
            .as_ref()
            .map_or_else(|| self.settings.image.clone(), |r| r.image.clone());

        match self.runtime.exists(id) {
            Ok(true) => {
                debug!("stopping container '{id}'");
                if let Err(e) = self.runtime.stop(id) {
                    report.warn(format!("unable to stop container '{id}': {e}"));
                }
                debug!("removing container '{id}'");
                match self.runtime.remove(id) {
                    Ok(()) => {
                        report.container_removed = true;
                        info!("container '{id}' stopped & removed");
                    }
                    Err(e) => report.warn(format!("unable to remove container '{id}': {e}")),
                }
            }
            Ok(false) => debug!("container '{id}' does not exist"),
            Err(e) => report.warn(format!("unable to inspect container '{id}': {e}")),
        }

        let store = dashboard_store(&data_dir);
        debug!("removing dashboard storage {}", store.display());
        let store_removed = match remove_dir_if_present(&store) {
            Ok(()) => true,
            Err(e) => {
                report.warn(format!(
                    "failed to remove dashboard storage {}: {e}",
                    store.display()
                ));
                false
            }
        };
        let record_removed = match remove_file_if_present(&record_path) {
            Ok(()) => true,
            Err(e) => {
                report.warn(format!(
                    "failed to remove configuration record {}: {e}",
                    record_path.display()
                ));
                false
            }
        };
        report.data_removed = store_removed && record_removed;

        if options.force {
            debug!("removing image '{image}'");
            match self.runtime.remove_image(&image) {
                Ok(()) => report.image_removed = true,
                Err(e) => report.warn(format!("failed to remove image '{image}': {e}")),
            }
        }

        Ok(report)
    }

    /// Observe the current state without changing anything.
    pub fn status(&self) -> Result<StatusReport, CoreError> {
        let record_path = self.settings.record_path();
        let record = if ConfigRecord::exists(&record_path) {
            Some(ConfigRecord::load(&record_path)?)
        } else {
            None
        };
        let container = self.runtime.inspect(&self.settings.container_id)?;
        let state = DashboardState::observe(record.is_some(), &container);
        Ok(StatusReport {
            state,
            container,
            record,
        })
    }

    fn load_record(&self) -> Result<ConfigRecord, CoreError> {
        let path = self.settings.record_path();
        if !ConfigRecord::exists(&path) {
            return Err(CoreError::NotConfigured(path));
        }
        Ok(ConfigRecord::load(&path)?)
    }

    /// Stop and remove a container under the managed name that setup is
    /// about to replace. Returns whether one existed.
    fn discard_stale_container(&self, current: &ContainerStatus) -> Result<bool, CoreError> {
        if !current.exists {
            return Ok(false);
        }
        let id = &current.id;
        info!("replacing existing container '{id}'");
        if current.running {
            self.runtime.stop(id)?;
        }
        self.runtime.remove(id)?;
        Ok(true)
    }

    /// Create, start, and persist. On failure nothing this call created is
    /// left behind.
    fn install(
        &self,
        spec: &ContainerSpec,
        record: &ConfigRecord,
        record_path: &Path,
    ) -> Result<(), CoreError> {
        debug!("creating container '{}'", spec.id);
        self.runtime.create(spec)?;
        if let Err(e) = self.start_created(&spec.id) {
            self.discard_container(&spec.id);
            return Err(e);
        }

        if let Err(e) = record.save(record_path) {
            warn!(
                "failed to persist {}, discarding container '{}'",
                record_path.display(),
                spec.id
            );
            self.discard_container(&spec.id);
            return Err(CoreError::PersistenceFailure(e));
        }
        Ok(())
    }

    fn ensure_image(&self, image: &str) -> Result<(), CoreError> {
        if self.runtime.image_present(image)? {
            debug!("image '{image}' already present");
            return Ok(());
        }
        info!("pulling image '{image}'");
        self.runtime.pull_image(image)?;
        Ok(())
    }

    fn start_created(&self, id: &str) -> Result<(), CoreError> {
        self.runtime.start(id)?;
        if !self.runtime.inspect(id)?.running {
            return Err(CoreError::RuntimeOperationFailed(
                RuntimeError::CommandFailed {
                    command: format!("start {id}"),
                    stderr: "container is not running after start".to_owned(),
                },
            ));
        }
        Ok(())
    }

    /// Best-effort teardown of a container setup created but could not finish.
    fn discard_container(&self, id: &str) {
        if let Err(e) = self.runtime.stop(id) {
            debug!("stop during rollback of '{id}' failed: {e}");
        }
        if let Err(e) = self.runtime.remove(id) {
            warn!("unable to remove container '{id}' after failed setup: {e}");
        }
    }
}

/// The previous record describes a container that no longer exists.
/// Leaving it would let `start` chase a missing container with old
/// credentials, so the installation falls back to unconfigured.
fn drop_stale_record(record_path: &Path) {
    match remove_file_if_present(record_path) {
        Ok(()) => warn!(
            "setup failed after replacing the previous container; removed stale record {}, run 'setup' again",
            record_path.display()
        ),
        Err(e) => warn!(
            "setup failed after replacing the previous container; stale record {} could not be removed: {e}",
            record_path.display()
        ),
    }
}

fn remove_dir_if_present(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn remove_file_if_present(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
