mod commands;

use clap::{Args, Parser, Subcommand};
use commands::{EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_RUNTIME_ERROR};
use dashward_core::LifecycleManager;
use dashward_schema::{
    InstallSettings, DEFAULT_IMAGE, DEFAULT_LISTEN_ADDRESS, DEFAULT_LISTEN_PORT,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "dashward",
    version,
    about = "Install, start, stop, and remove the analytics dashboard container"
)]
struct Cli {
    /// Platform configuration root; the dashboard record lives under it.
    #[arg(long, default_value = "/etc/dashward", global = true)]
    config_dir: PathBuf,

    /// Platform data directory shared with the dashboard container.
    #[arg(long, default_value = "/var/lib/dashward", global = true)]
    data_dir: PathBuf,

    /// Container runtime backend: docker, podman, or mock.
    #[arg(long, default_value = "docker", global = true)]
    runtime: String,

    /// Dashboard image used by setup and removed by `remove --force`.
    #[arg(long, default_value = DEFAULT_IMAGE, global = true)]
    image: String,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a fresh dashboard container, generate credentials, and start it.
    Setup(SetupArgs),
    /// Start the configured dashboard container.
    Start,
    /// Stop the dashboard container.
    Stop,
    /// Remove the dashboard container and its storage.
    Remove {
        /// Also remove the container image.
        #[arg(short, long, default_value_t = false)]
        force: bool,
        /// Do not ask for confirmation.
        #[arg(short, long, default_value_t = false)]
        yes: bool,
    },
    /// Show the dashboard state.
    Status,
}

#[derive(Debug, Args)]
struct SetupArgs {
    /// Listen address of the container.
    #[arg(short, long, default_value = DEFAULT_LISTEN_ADDRESS)]
    listen: String,
    /// Listen port of the container.
    #[arg(short, long, default_value = DEFAULT_LISTEN_PORT)]
    port: String,
    /// Dashboard password (generated when omitted).
    #[arg(long)]
    password: Option<String>,
    /// Directory shared with the container (defaults to --data-dir).
    #[arg(short = 'd', long = "dir")]
    dir: Option<PathBuf>,
    /// Overwrite an existing setup.
    #[arg(short, long, default_value_t = false)]
    force: bool,
    /// Platform database type: sqlite, mysql, or postgres.
    #[arg(long, default_value = "sqlite")]
    db_type: String,
    /// Path of the sqlite platform database (defaults to <data-dir>/platform.db).
    #[arg(long)]
    db_path: Option<PathBuf>,
    /// Host of a mysql/postgres platform database.
    #[arg(long, default_value = "127.0.0.1")]
    db_host: String,
    /// Port of a mysql/postgres platform database.
    #[arg(long)]
    db_port: Option<u16>,
    /// Database user.
    #[arg(long)]
    db_user: Option<String>,
    /// Database password.
    #[arg(long)]
    db_password: Option<String>,
    /// Database name.
    #[arg(long)]
    db_name: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("DASHWARD_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let needs_runtime = matches!(cli.command, Commands::Setup(_) | Commands::Start);
    if needs_runtime && std::env::var("DASHWARD_SKIP_PREREQS").as_deref() != Ok("1") {
        let missing = dashward_runtime::check_runtime_prereqs(&cli.runtime);
        if !missing.is_empty() {
            eprintln!("error: {}", dashward_runtime::format_missing(&missing));
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    }

    let (config_dir, data_dir) = match (
        commands::absolute_path(&cli.config_dir),
        commands::absolute_path(&cli.data_dir),
    ) {
        (Ok(c), Ok(d)) => (c, d),
        (Err(msg), _) | (_, Err(msg)) => {
            eprintln!("error: {msg}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let runtime = match dashward_runtime::select_runtime(&cli.runtime, &data_dir) {
        Ok(rt) => Arc::from(rt),
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };
    let settings = InstallSettings::new(config_dir, data_dir).with_image(&cli.image);
    let manager = LifecycleManager::new(settings, runtime);
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Setup(args) => commands::setup::run(&manager, args.into_options(), json_output),
        Commands::Start => commands::start::run(&manager, json_output),
        Commands::Stop => commands::stop::run(&manager, json_output),
        Commands::Remove { force, yes } => commands::remove::run(&manager, force, yes, json_output),
        Commands::Status => commands::status::run(&manager, json_output),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("config error:") || msg.starts_with("persistence error:")
            {
                EXIT_CONFIG_ERROR
            } else if msg.starts_with("runtime error:") {
                EXIT_RUNTIME_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

impl SetupArgs {
    fn into_options(self) -> commands::setup::SetupOptions {
        commands::setup::SetupOptions {
            listen: self.listen,
            port: self.port,
            password: self.password,
            dir: self.dir,
            force: self.force,
            db_type: self.db_type,
            db_path: self.db_path,
            db_host: self.db_host,
            db_port: self.db_port,
            db_user: self.db_user,
            db_password: self.db_password,
            db_name: self.db_name,
        }
    }
}
