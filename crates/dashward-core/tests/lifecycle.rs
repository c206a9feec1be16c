//! Lifecycle manager tests against the mock runtime.

use dashward_core::container::dashboard_store;
use dashward_core::{
    CoreError, DashboardState, FixedAnswer, LifecycleManager, RemoveOptions, SetupRequest,
    StopOutcome,
};
use dashward_runtime::{ContainerRuntime, MockOp, MockRuntime};
use dashward_schema::{
    ConfigRecord, DatabaseBinding, InstallSettings, DEFAULT_CONTAINER_ID, DEFAULT_IMAGE,
    DEFAULT_PASSWORD_LENGTH, DEFAULT_USERNAME,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

struct Fixture {
    _root: tempfile::TempDir,
    settings: InstallSettings,
    runtime: Arc<MockRuntime>,
    manager: LifecycleManager,
}

fn fixture() -> Fixture {
    fixture_with(MockRuntime::new())
}

fn fixture_with(runtime: MockRuntime) -> Fixture {
    let root = tempfile::tempdir().unwrap();
    let settings = InstallSettings::new(root.path().join("etc"), root.path().join("data"));
    let runtime = Arc::new(runtime);
    let manager = LifecycleManager::new(settings.clone(), runtime.clone());
    Fixture {
        _root: root,
        settings,
        runtime,
        manager,
    }
}

fn request(settings: &InstallSettings, force: bool) -> SetupRequest {
    SetupRequest {
        listen_address: "0.0.0.0".to_owned(),
        listen_port: "443".to_owned(),
        password: None,
        data_dir: None,
        database: DatabaseBinding::sqlite(settings.data_dir().join("platform.db")),
        force,
    }
}

fn running(runtime: &MockRuntime) -> bool {
    runtime.inspect(DEFAULT_CONTAINER_ID).unwrap().running
}

/// In-memory sink for log output emitted while `f` runs.
#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .without_time()
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    (out, logs)
}

fn seed_dashboard_store(data_dir: &Path) {
    let store = dashboard_store(data_dir);
    fs::create_dir_all(&store).unwrap();
    fs::write(store.join("metabase.db.mv.db"), b"dashboard state").unwrap();
}

#[test]
fn setup_with_defaults_persists_record_and_runs_container() {
    let f = fixture();
    let outcome = f.manager.setup(request(&f.settings, false)).unwrap();
    let record = outcome.record;

    assert_eq!(record.password.len(), DEFAULT_PASSWORD_LENGTH);
    assert!(record.password.bytes().all(|b| b.is_ascii_alphanumeric()));
    assert_eq!(record.username, DEFAULT_USERNAME);
    assert_eq!(record.data_dir, f.settings.data_dir());
    assert!(record.listen_url().contains("0.0.0.0:443"));
    assert!(running(&f.runtime));

    let persisted = ConfigRecord::load(&f.settings.record_path()).unwrap();
    assert_eq!(persisted, record);
    assert_eq!(
        outcome.datasource.path.as_deref(),
        Some(Path::new("/metabase-data/platform.db"))
    );
}

#[test]
fn setup_then_start_is_running() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    let started = f.manager.start().unwrap();
    assert!(started.already_running);
    assert!(running(&f.runtime));
    assert_eq!(f.manager.status().unwrap().state, DashboardState::Running);
}

#[test]
fn setup_keeps_supplied_password_and_dir() {
    let f = fixture();
    let custom = f.settings.config_dir().parent().unwrap().join("custom");
    let mut req = request(&f.settings, false);
    req.password = Some("operator-chosen".to_owned());
    req.data_dir = Some(custom.clone());

    let record = f.manager.setup(req).unwrap().record;
    assert_eq!(record.password, "operator-chosen");
    assert_eq!(record.data_dir, custom);
    assert!(custom.is_dir());
}

#[test]
fn setup_without_force_leaves_record_untouched() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    let before = fs::read(f.settings.record_path()).unwrap();
    let calls_before = f.runtime.calls().len();

    let err = f.manager.setup(request(&f.settings, false)).unwrap_err();
    assert!(matches!(err, CoreError::AlreadyConfigured(_)));
    assert_eq!(fs::read(f.settings.record_path()).unwrap(), before);
    assert_eq!(f.runtime.calls().len(), calls_before);
}

#[test]
fn setup_with_force_overwrites_and_regenerates_password() {
    let f = fixture();
    let first = f.manager.setup(request(&f.settings, false)).unwrap().record;
    let second = f.manager.setup(request(&f.settings, true)).unwrap().record;

    assert_ne!(first.password, second.password);
    let persisted = ConfigRecord::load(&f.settings.record_path()).unwrap();
    assert_eq!(persisted.password, second.password);
    assert!(running(&f.runtime));
}

#[test]
fn setup_pulls_missing_image_only() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    assert!(f.runtime.has_image(DEFAULT_IMAGE));
    let pulls = |rt: &MockRuntime| rt.calls().iter().filter(|c| c.starts_with("pull")).count();
    assert_eq!(pulls(&f.runtime), 1);

    f.manager.setup(request(&f.settings, true)).unwrap();
    assert_eq!(pulls(&f.runtime), 1);
}

#[test]
fn setup_replaces_orphaned_container() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    fs::remove_file(f.settings.record_path()).unwrap();

    f.manager.setup(request(&f.settings, false)).unwrap();
    assert!(running(&f.runtime));
    assert!(ConfigRecord::exists(&f.settings.record_path()));
}

#[test]
fn setup_on_unavailable_runtime_fails_without_record() {
    let f = fixture_with(MockRuntime::unavailable());
    let err = f.manager.setup(request(&f.settings, false)).unwrap_err();
    assert!(matches!(err, CoreError::RuntimeUnavailable(_)));
    assert!(!ConfigRecord::exists(&f.settings.record_path()));
}

#[test]
fn setup_start_failure_discards_container_and_writes_nothing() {
    let f = fixture();
    f.runtime.fail_on(MockOp::Start);

    let err = f.manager.setup(request(&f.settings, false)).unwrap_err();
    assert!(matches!(err, CoreError::RuntimeOperationFailed(_)));
    assert!(!ConfigRecord::exists(&f.settings.record_path()));
    assert!(!f.runtime.exists(DEFAULT_CONTAINER_ID).unwrap());
}

#[test]
fn setup_pull_failure_is_fatal() {
    let f = fixture();
    f.runtime.fail_on(MockOp::Pull);
    let err = f.manager.setup(request(&f.settings, false)).unwrap_err();
    assert!(err.to_string().starts_with("runtime error:"));
    assert!(!ConfigRecord::exists(&f.settings.record_path()));
}

#[test]
fn setup_persistence_failure_discards_container() {
    let f = fixture();
    // A directory where the record file should go makes the rename fail.
    fs::create_dir_all(f.settings.record_path()).unwrap();
    // A directory there also counts as "not a record", so setup proceeds.
    let err = f.manager.setup(request(&f.settings, false)).unwrap_err();
    assert!(matches!(err, CoreError::PersistenceFailure(_)));
    assert!(!f.runtime.exists(DEFAULT_CONTAINER_ID).unwrap());
}

#[test]
fn setup_rejects_invalid_input_before_touching_runtime() {
    let f = fixture();
    let mut req = request(&f.settings, false);
    req.listen_port = "99999".to_owned();
    assert!(matches!(
        f.manager.setup(req),
        Err(CoreError::InvalidInput(_))
    ));

    let mut req = request(&f.settings, false);
    req.listen_address = String::new();
    assert!(matches!(
        f.manager.setup(req),
        Err(CoreError::InvalidInput(_))
    ));

    let mut req = request(&f.settings, false);
    req.database = DatabaseBinding::default();
    assert!(matches!(
        f.manager.setup(req),
        Err(CoreError::InvalidInput(_))
    ));
    assert!(f.runtime.calls().is_empty());
}

#[test]
fn setup_rejects_relative_paths() {
    let f = fixture();
    let mut req = request(&f.settings, false);
    req.data_dir = Some(PathBuf::from("dashdata"));
    let err = f.manager.setup(req).unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));
    assert!(err.to_string().contains("dashdata"));

    let mut req = request(&f.settings, false);
    req.database = DatabaseBinding::sqlite("platform.db");
    assert!(matches!(
        f.manager.setup(req),
        Err(CoreError::InvalidInput(_))
    ));
    assert!(f.runtime.calls().is_empty());
    assert!(!Path::new("dashdata").exists());
}

#[test]
fn forced_setup_failing_after_replacement_drops_old_record() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    f.runtime.fail_on(MockOp::Create);

    let err = f.manager.setup(request(&f.settings, true)).unwrap_err();
    assert!(matches!(err, CoreError::RuntimeOperationFailed(_)));
    assert!(!f.runtime.exists(DEFAULT_CONTAINER_ID).unwrap());
    // The old credentials described the container that was replaced.
    assert!(!ConfigRecord::exists(&f.settings.record_path()));
    assert!(matches!(
        f.manager.start().err().unwrap(),
        CoreError::NotConfigured(_)
    ));
    assert_eq!(f.manager.status().unwrap().state, DashboardState::Uninstalled);

    f.runtime.clear_failures();
    f.manager.setup(request(&f.settings, false)).unwrap();
    assert!(running(&f.runtime));
}

#[test]
fn forced_setup_pull_failure_keeps_installation() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    let before = fs::read(f.settings.record_path()).unwrap();

    let upgraded = LifecycleManager::new(
        f.settings.clone().with_image("registry/dash:2"),
        f.runtime.clone(),
    );
    f.runtime.fail_on(MockOp::Pull);
    let err = upgraded.setup(request(&f.settings, true)).unwrap_err();
    assert!(err.to_string().starts_with("runtime error:"));

    assert!(running(&f.runtime));
    assert_eq!(fs::read(f.settings.record_path()).unwrap(), before);
    assert!(!f.runtime.calls().iter().any(|c| c.starts_with("remove")));
}

#[test]
fn setup_mounts_external_sqlite_read_only() {
    let f = fixture();
    let mut req = request(&f.settings, false);
    req.database = DatabaseBinding::sqlite("/srv/platform/data.db");
    let outcome = f.manager.setup(req).unwrap();

    let spec = f.runtime.container_spec(DEFAULT_CONTAINER_ID).unwrap();
    assert!(spec
        .mounts
        .iter()
        .any(|m| m.source == Path::new("/srv/platform") && m.read_only));
    assert_eq!(
        outcome.datasource.path.as_deref(),
        Some(Path::new("/platform-db/data.db"))
    );
}

#[test]
fn start_without_setup_is_not_configured() {
    let f = fixture();
    let err = f.manager.start().err().unwrap();
    assert!(matches!(err, CoreError::NotConfigured(_)));
    assert!(f.runtime.calls().is_empty(), "no container action attempted");
}

#[test]
fn start_after_stop_runs_again_without_touching_record() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    let before = fs::read(f.settings.record_path()).unwrap();

    assert_eq!(f.manager.stop(), StopOutcome::Stopped);
    assert!(!running(&f.runtime));

    let started = f.manager.start().unwrap();
    assert!(!started.already_running);
    assert!(running(&f.runtime));
    assert_eq!(fs::read(f.settings.record_path()).unwrap(), before);
}

#[test]
fn start_failure_is_fatal() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    f.manager.stop();
    f.runtime.fail_on(MockOp::Start);

    let err = f.manager.start().err().unwrap();
    assert!(matches!(err, CoreError::RuntimeOperationFailed(_)));
    assert!(err.to_string().contains("injected failure"));
}

#[test]
fn start_with_corrupt_record_is_persistence_failure() {
    let f = fixture();
    fs::create_dir_all(f.settings.record_dir()).unwrap();
    fs::write(f.settings.record_path(), "listen_address = [").unwrap();
    let err = f.manager.start().err().unwrap();
    assert!(matches!(err, CoreError::PersistenceFailure(_)));
}

#[test]
fn start_rejects_record_for_another_container() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    f.manager.stop();
    let mut record = ConfigRecord::load(&f.settings.record_path()).unwrap();
    record.container_id = "legacy-dashboard".to_owned();
    record.save(&f.settings.record_path()).unwrap();
    let calls_before = f.runtime.calls().len();

    let err = f.manager.start().err().unwrap();
    assert!(matches!(err, CoreError::InvalidInput(_)));
    assert!(err.to_string().contains("legacy-dashboard"));
    assert_eq!(f.runtime.calls().len(), calls_before);
    assert!(!running(&f.runtime));
}

#[test]
fn stop_missing_container_is_not_fatal() {
    let f = fixture();
    let (outcome, logs) = capture_warnings(|| f.manager.stop());
    assert_eq!(outcome, StopOutcome::Absent);
    assert!(logs.contains("WARN"), "{logs}");
    assert!(logs.contains(DEFAULT_CONTAINER_ID), "{logs}");
    assert!(logs.contains("does not exist"), "{logs}");
}

#[test]
fn stop_twice_reports_already_stopped() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    assert_eq!(f.manager.stop(), StopOutcome::Stopped);
    assert_eq!(f.manager.stop(), StopOutcome::AlreadyStopped);
}

#[test]
fn stop_works_without_record() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    fs::remove_file(f.settings.record_path()).unwrap();
    assert_eq!(f.manager.stop(), StopOutcome::Stopped);
}

#[test]
fn stop_runtime_failure_is_reported_not_raised() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    f.runtime.fail_on(MockOp::Stop);
    assert!(matches!(f.manager.stop(), StopOutcome::Failed(_)));
}

#[test]
fn remove_declined_has_no_side_effects() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    seed_dashboard_store(f.settings.data_dir());
    let before = fs::read(f.settings.record_path()).unwrap();
    let calls_before = f.runtime.calls().len();

    let report = f
        .manager
        .remove(RemoveOptions::default(), &FixedAnswer(false))
        .unwrap();
    assert!(report.declined);
    assert_eq!(fs::read(f.settings.record_path()).unwrap(), before);
    assert!(dashboard_store(f.settings.data_dir()).is_dir());
    assert!(running(&f.runtime));
    assert_eq!(f.runtime.calls().len(), calls_before);
}

#[test]
fn remove_without_force_keeps_image() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    seed_dashboard_store(f.settings.data_dir());
    fs::write(f.settings.data_dir().join("platform.db"), b"platform").unwrap();

    let report = f
        .manager
        .remove(RemoveOptions::default(), &FixedAnswer(true))
        .unwrap();
    assert!(!report.declined);
    assert!(report.container_removed);
    assert!(report.data_removed);
    assert!(!report.image_removed);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    assert!(!f.runtime.exists(DEFAULT_CONTAINER_ID).unwrap());
    assert!(!dashboard_store(f.settings.data_dir()).exists());
    assert!(!ConfigRecord::exists(&f.settings.record_path()));
    assert!(f.runtime.has_image(DEFAULT_IMAGE));
    // platform data next to the dashboard storage survives
    assert!(f.settings.data_dir().join("platform.db").exists());
}

#[test]
fn remove_with_force_removes_image() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();

    let report = f
        .manager
        .remove(
            RemoveOptions {
                force: true,
                skip_confirmation: true,
            },
            &FixedAnswer(false),
        )
        .unwrap();
    assert!(report.container_removed);
    assert!(report.data_removed);
    assert!(report.image_removed);
    assert!(!f.runtime.has_image(DEFAULT_IMAGE));
}

#[test]
fn remove_skip_confirmation_ignores_gate() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    let report = f
        .manager
        .remove(
            RemoveOptions {
                force: false,
                skip_confirmation: true,
            },
            &FixedAnswer(false),
        )
        .unwrap();
    assert!(!report.declined);
    assert!(report.container_removed);
}

#[test]
fn remove_downgrades_runtime_failures_to_warnings() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    seed_dashboard_store(f.settings.data_dir());
    f.runtime.fail_on(MockOp::Stop);
    f.runtime.fail_on(MockOp::Remove);
    f.runtime.fail_on(MockOp::RemoveImage);

    let report = f
        .manager
        .remove(
            RemoveOptions {
                force: true,
                skip_confirmation: true,
            },
            &FixedAnswer(true),
        )
        .unwrap();
    assert_eq!(report.warnings.len(), 3, "{:?}", report.warnings);
    assert!(report.warnings.iter().any(|w| w.contains(DEFAULT_CONTAINER_ID)));
    assert!(report.warnings.iter().any(|w| w.contains(DEFAULT_IMAGE)));
    assert!(!report.container_removed);
    assert!(!report.image_removed);
    // storage cleanup still ran
    assert!(report.data_removed);
    assert!(!dashboard_store(f.settings.data_dir()).exists());
}

#[test]
fn remove_on_unavailable_runtime_still_cleans_files() {
    let f = fixture_with(MockRuntime::unavailable());
    fs::create_dir_all(f.settings.data_dir()).unwrap();
    seed_dashboard_store(f.settings.data_dir());

    let report = f
        .manager
        .remove(
            RemoveOptions {
                force: true,
                skip_confirmation: true,
            },
            &FixedAnswer(true),
        )
        .unwrap();
    assert_eq!(report.warnings.len(), 2, "{:?}", report.warnings);
    assert!(report.data_removed);
    assert!(!dashboard_store(f.settings.data_dir()).exists());
}

#[test]
fn remove_on_empty_installation_succeeds() {
    let f = fixture();
    let report = f
        .manager
        .remove(RemoveOptions::default(), &FixedAnswer(true))
        .unwrap();
    assert!(!report.container_removed);
    assert!(report.data_removed);
    assert!(report.warnings.is_empty());
}

#[test]
fn setup_is_reentrant_after_remove() {
    let f = fixture();
    f.manager.setup(request(&f.settings, false)).unwrap();
    f.manager
        .remove(RemoveOptions::default(), &FixedAnswer(true))
        .unwrap();
    assert_eq!(f.manager.status().unwrap().state, DashboardState::Uninstalled);

    f.manager.setup(request(&f.settings, false)).unwrap();
    assert!(running(&f.runtime));
}

#[test]
fn status_reflects_each_state() {
    let f = fixture();
    let status = f.manager.status().unwrap();
    assert_eq!(status.state, DashboardState::Uninstalled);
    assert!(status.record.is_none());

    f.manager.setup(request(&f.settings, false)).unwrap();
    assert_eq!(f.manager.status().unwrap().state, DashboardState::Running);

    f.manager.stop();
    assert_eq!(f.manager.status().unwrap().state, DashboardState::Stopped);

    // record present, container gone
    f.runtime.remove(DEFAULT_CONTAINER_ID).unwrap();
    let status = f.manager.status().unwrap();
    assert_eq!(status.state, DashboardState::Configured);
    assert!(status.record.is_some());
}
