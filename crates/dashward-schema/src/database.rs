use crate::RecordError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Address of the default docker bridge gateway, as seen from a container.
pub const DEFAULT_GATEWAY_ADDR: &str = "172.17.0.1";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    #[default]
    Sqlite,
    Mysql,
    Postgres,
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseKind::Sqlite => write!(f, "sqlite"),
            DatabaseKind::Mysql => write!(f, "mysql"),
            DatabaseKind::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for DatabaseKind {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(DatabaseKind::Sqlite),
            "mysql" => Ok(DatabaseKind::Mysql),
            "postgres" | "postgresql" | "pgx" => Ok(DatabaseKind::Postgres),
            other => Err(RecordError::InvalidDatabase(format!(
                "unknown database type '{other}' (expected: sqlite, mysql, postgres)"
            ))),
        }
    }
}

/// Connection parameters for the host platform database the dashboard reads.
///
/// The lifecycle core never interprets these beyond validation and the
/// host-to-container translation in [`container_view`](Self::container_view).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DatabaseBinding {
    pub kind: DatabaseKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DatabaseBinding {
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: DatabaseKind::Sqlite,
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn network(kind: DatabaseKind, host: &str, port: u16) -> Self {
        Self {
            kind,
            host: Some(host.to_owned()),
            port: Some(port),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        match self.kind {
            DatabaseKind::Sqlite => match &self.path {
                Some(p) if p.is_absolute() => Ok(()),
                Some(p) if !p.as_os_str().is_empty() => Err(RecordError::RelativePath(
                    "sqlite database path",
                    p.clone(),
                )),
                _ => Err(RecordError::InvalidDatabase(
                    "sqlite binding requires a database path".to_owned(),
                )),
            },
            DatabaseKind::Mysql | DatabaseKind::Postgres => match self.host.as_deref() {
                Some(h) if !h.trim().is_empty() => Ok(()),
                _ => Err(RecordError::InvalidDatabase(format!(
                    "{} binding requires a host",
                    self.kind
                ))),
            },
        }
    }

    /// The directory holding the sqlite file, which has to be shared with
    /// the container. `None` for network databases.
    pub fn sqlite_dir(&self) -> Option<&Path> {
        match self.kind {
            DatabaseKind::Sqlite => self.path.as_deref().and_then(Path::parent),
            _ => None,
        }
    }

    /// Translate the binding to how the container reaches the database.
    ///
    /// Loopback hosts become `gateway`, and a sqlite file is addressed
    /// under `sqlite_mount`, where its directory is bind-mounted.
    #[must_use]
    pub fn container_view(&self, gateway: &str, sqlite_mount: &Path) -> Self {
        let mut view = self.clone();
        match self.kind {
            DatabaseKind::Sqlite => {
                view.path = self
                    .path
                    .as_deref()
                    .and_then(Path::file_name)
                    .map(|f| sqlite_mount.join(f));
            }
            DatabaseKind::Mysql | DatabaseKind::Postgres => {
                if self.host.as_deref().is_some_and(is_loopback) {
                    view.host = Some(gateway.to_owned());
                }
            }
        }
        view
    }
}

fn is_loopback(host: &str) -> bool {
    matches!(host, "localhost" | "::1" | "[::1]") || host.starts_with("127.")
}
