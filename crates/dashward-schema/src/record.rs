use crate::database::DatabaseBinding;
use crate::RecordError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// The persisted description of how to reach and authenticate to the
/// running dashboard.
///
/// Written once by `setup`. `start` and `stop` only ever read it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigRecord {
    pub listen_address: String,
    pub listen_port: String,
    pub username: String,
    pub password: String,
    pub data_dir: PathBuf,
    pub container_id: String,
    pub image: String,
    pub created_at: String,
    pub database: DatabaseBinding,
}

impl ConfigRecord {
    pub fn listen_url(&self) -> String {
        format!("http://{}:{}", self.listen_address, self.listen_port)
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        if self.listen_address.trim().is_empty() {
            return Err(RecordError::EmptyListenAddress);
        }
        parse_listen_port(&self.listen_port)?;
        // A relative host path would reach docker as a named volume.
        if !self.data_dir.is_absolute() {
            return Err(RecordError::RelativePath(
                "data directory",
                self.data_dir.clone(),
            ));
        }
        self.database.validate()
    }

    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    pub fn load(path: &Path) -> Result<Self, RecordError> {
        let content = fs::read_to_string(path)?;
        let record: Self = toml::from_str(&content)?;
        Ok(record)
    }

    /// Atomically write the record with owner-only permissions, creating
    /// the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), RecordError> {
        let dir = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        create_private_dir(&dir)?;

        let content = toml::to_string_pretty(self)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| RecordError::Io(e.error))?;
        debug!("wrote configuration record {}", path.display());
        Ok(())
    }
}

/// Parse a listen port, rejecting empty, zero, and out-of-range values.
pub fn parse_listen_port(port: &str) -> Result<u16, RecordError> {
    match port.trim().parse::<u16>() {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(RecordError::InvalidListenPort(port.to_owned())),
    }
}

fn create_private_dir(dir: &Path) -> Result<(), RecordError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new()
            .recursive(true)
            .mode(0o750)
            .create(dir)?;
    }
    #[cfg(not(unix))]
    fs::create_dir_all(dir)?;
    Ok(())
}
