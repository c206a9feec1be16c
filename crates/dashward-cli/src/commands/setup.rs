use super::{absolute_path, json_pretty, maybe_spinner, spin_fail, spin_ok, EXIT_SUCCESS};
use dashward_core::{LifecycleManager, SetupRequest};
use dashward_schema::{DatabaseBinding, DatabaseKind};
use std::path::{Path, PathBuf};

/// Platform database file assumed when `--db-path` is not given.
const DEFAULT_SQLITE_FILE: &str = "platform.db";

#[derive(Debug)]
pub struct SetupOptions {
    pub listen: String,
    pub port: String,
    pub password: Option<String>,
    pub dir: Option<PathBuf>,
    pub force: bool,
    pub db_type: String,
    pub db_path: Option<PathBuf>,
    pub db_host: String,
    pub db_port: Option<u16>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_name: Option<String>,
}

fn default_db_port(kind: DatabaseKind) -> u16 {
    match kind {
        DatabaseKind::Mysql => 3306,
        DatabaseKind::Postgres => 5432,
        DatabaseKind::Sqlite => 0,
    }
}

fn database_binding(opts: &SetupOptions, data_dir: &Path) -> Result<DatabaseBinding, String> {
    let kind: DatabaseKind = opts
        .db_type
        .parse()
        .map_err(|e| format!("config error: {e}"))?;
    let mut binding = match kind {
        DatabaseKind::Sqlite => DatabaseBinding::sqlite(match &opts.db_path {
            Some(p) => absolute_path(p)?,
            None => data_dir.join(DEFAULT_SQLITE_FILE),
        }),
        DatabaseKind::Mysql | DatabaseKind::Postgres => DatabaseBinding::network(
            kind,
            &opts.db_host,
            opts.db_port.unwrap_or_else(|| default_db_port(kind)),
        ),
    };
    binding.user.clone_from(&opts.db_user);
    binding.password.clone_from(&opts.db_password);
    binding.name.clone_from(&opts.db_name);
    Ok(binding)
}

fn describe_datasource(db: &DatabaseBinding) -> String {
    match db.kind {
        DatabaseKind::Sqlite => format!(
            "sqlite file {}",
            db.path.as_deref().map_or(String::new(), |p| p.display().to_string())
        ),
        DatabaseKind::Mysql | DatabaseKind::Postgres => format!(
            "{} at {}:{} (database '{}', user '{}')",
            db.kind,
            db.host.as_deref().unwrap_or_default(),
            db.port.unwrap_or_default(),
            db.name.as_deref().unwrap_or_default(),
            db.user.as_deref().unwrap_or_default(),
        ),
    }
}

pub fn run(manager: &LifecycleManager, opts: SetupOptions, json: bool) -> Result<u8, String> {
    let data_dir = match &opts.dir {
        Some(dir) => absolute_path(dir)?,
        None => manager.settings().data_dir().to_path_buf(),
    };
    let database = database_binding(&opts, &data_dir)?;
    let request = SetupRequest {
        listen_address: opts.listen,
        listen_port: opts.port,
        password: opts.password,
        data_dir: Some(data_dir),
        database,
        force: opts.force,
    };

    let pb = maybe_spinner(json, "setting up dashboard container...");
    let outcome = match manager.setup(request) {
        Ok(o) => {
            if let Some(pb) = &pb {
                spin_ok(pb, "dashboard container is running");
            }
            o
        }
        Err(e) => {
            if let Some(pb) = &pb {
                spin_fail(pb, "setup failed");
            }
            return Err(e.to_string());
        }
    };
    let record = &outcome.record;

    if json {
        let payload = serde_json::json!({
            "url": record.listen_url(),
            "username": record.username,
            "password": record.password,
            "container_id": record.container_id,
            "data_dir": record.data_dir,
            "datasource": outcome.datasource,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!();
        println!("Dashboard is ready. Credentials are only shown once:");
        println!("\tURL       : '{}'", record.listen_url());
        println!("\tUser      : '{}'", record.username);
        println!("\tPassword  : '{}'", record.password);
        println!();
        println!(
            "Add the platform database in the dashboard using {}",
            describe_datasource(&outcome.datasource)
        );
    }
    Ok(EXIT_SUCCESS)
}
