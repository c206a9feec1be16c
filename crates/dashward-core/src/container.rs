use crate::CoreError;
use dashward_runtime::{BindMount, ContainerSpec, PortBinding};
use dashward_schema::{parse_listen_port, ConfigRecord, DatabaseBinding};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Port the dashboard listens on inside the container.
pub const CONTAINER_PORT: u16 = 3000;
/// Where the shared data directory is mounted in the container.
pub const DATA_MOUNT: &str = "/metabase-data";
/// Where a sqlite platform database outside the data directory is mounted.
pub const PLATFORM_DB_MOUNT: &str = "/platform-db";
/// Dashboard-owned storage inside the shared data directory.
pub const STORE_DIR: &str = "metabase.db";

/// The dashboard's internal storage under `data_dir`. This is what
/// `remove` deletes; the rest of the data directory belongs to the platform.
pub fn dashboard_store(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_DIR)
}

/// Where the sqlite file's directory is visible inside the container.
fn sqlite_mount(record: &ConfigRecord) -> Option<PathBuf> {
    let dir = record.database.sqlite_dir()?;
    if dir == record.data_dir {
        Some(PathBuf::from(DATA_MOUNT))
    } else {
        Some(PathBuf::from(PLATFORM_DB_MOUNT))
    }
}

/// The platform database as the dashboard inside the container reaches it.
pub fn datasource(record: &ConfigRecord, gateway: &str) -> DatabaseBinding {
    let mount = sqlite_mount(record).unwrap_or_else(|| PathBuf::from(PLATFORM_DB_MOUNT));
    record.database.container_view(gateway, &mount)
}

/// Build the container description for `record`. Rejects records whose
/// bind-mount sources are not absolute host paths.
pub fn container_spec(record: &ConfigRecord) -> Result<ContainerSpec, CoreError> {
    record
        .validate()
        .map_err(|e| CoreError::InvalidInput(e.to_string()))?;
    let host_port = parse_listen_port(&record.listen_port)
        .map_err(|e| CoreError::InvalidInput(e.to_string()))?;

    let mut mounts = vec![BindMount {
        source: record.data_dir.clone(),
        target: PathBuf::from(DATA_MOUNT),
        read_only: false,
    }];
    if let (Some(dir), Some(target)) = (record.database.sqlite_dir(), sqlite_mount(record)) {
        if target != Path::new(DATA_MOUNT) {
            mounts.push(BindMount {
                source: dir.to_path_buf(),
                target,
                read_only: true,
            });
        }
    }

    let mut env = BTreeMap::new();
    env.insert(
        "MB_DB_FILE".to_owned(),
        format!("{DATA_MOUNT}/{STORE_DIR}/{STORE_DIR}"),
    );

    Ok(ContainerSpec {
        id: record.container_id.clone(),
        image: record.image.clone(),
        ports: vec![PortBinding {
            host_addr: record.listen_address.clone(),
            host_port,
            container_port: CONTAINER_PORT,
        }],
        mounts,
        env,
    })
}
