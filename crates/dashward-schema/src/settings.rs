use crate::database::DEFAULT_GATEWAY_ADDR;
use std::path::{Path, PathBuf};

pub const DEFAULT_USERNAME: &str = "admin@dashward.local";
pub const DEFAULT_IMAGE: &str = "metabase/metabase";
pub const DEFAULT_CONTAINER_ID: &str = "dashward-metabase";
pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_LISTEN_PORT: &str = "3000";

const RECORD_DIR: &str = "dashboard";
const RECORD_FILE: &str = "dashboard.toml";

/// Everything a single invocation needs to know about the installation.
///
/// Built once by the CLI and handed to the lifecycle manager. The container
/// id is fixed per installation, so at most one dashboard is managed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallSettings {
    config_dir: PathBuf,
    data_dir: PathBuf,
    pub container_id: String,
    pub image: String,
    pub username: String,
    pub gateway_addr: String,
}

impl InstallSettings {
    pub fn new(config_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            data_dir: data_dir.into(),
            container_id: DEFAULT_CONTAINER_ID.to_owned(),
            image: DEFAULT_IMAGE.to_owned(),
            username: DEFAULT_USERNAME.to_owned(),
            gateway_addr: DEFAULT_GATEWAY_ADDR.to_owned(),
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: &str) -> Self {
        image.clone_into(&mut self.image);
        self
    }

    #[inline]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Default directory shared with the container when `setup` gets none.
    #[inline]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[inline]
    pub fn record_dir(&self) -> PathBuf {
        self.config_dir.join(RECORD_DIR)
    }

    #[inline]
    pub fn record_path(&self) -> PathBuf {
        self.record_dir().join(RECORD_FILE)
    }
}
