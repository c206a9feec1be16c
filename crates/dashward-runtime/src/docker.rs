use crate::backend::{ContainerRuntime, ContainerSpec, ContainerStatus};
use crate::RuntimeError;
use std::io::ErrorKind;
use std::process::{Command, Output};
use tracing::debug;

/// Backend driving a docker-compatible CLI (`docker` or `podman`).
pub struct DockerCli {
    binary: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_owned(),
        }
    }

    fn exec(&self, args: &[String]) -> Result<Output, RuntimeError> {
        debug!("{} {}", self.binary, args.join(" "));
        Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    RuntimeError::Unavailable(format!("'{}' not found in PATH", self.binary))
                } else {
                    RuntimeError::Io(e)
                }
            })
    }

    /// Run a command and turn a non-zero exit into a classified error.
    fn run(&self, args: &[String]) -> Result<String, RuntimeError> {
        let output = self.exec(args)?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        Err(classify_failure(&self.binary, args, stderr))
    }
}

fn classify_failure(binary: &str, args: &[String], stderr: String) -> RuntimeError {
    let lower = stderr.to_ascii_lowercase();
    if lower.contains("no such container")
        || lower.contains("no such object")
        || lower.contains("no such image")
        || lower.contains("image not known")
    {
        let subject = args.last().cloned().unwrap_or_default();
        return RuntimeError::NotFound(subject);
    }
    if lower.contains("cannot connect to the docker daemon")
        || lower.contains("is the docker daemon running")
    {
        return RuntimeError::Unavailable(stderr);
    }
    RuntimeError::CommandFailed {
        command: format!("{binary} {}", args.join(" ")),
        stderr,
    }
}

/// Arguments for `<runtime> create` materializing `spec`.
pub fn create_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec!["create".to_owned(), "--name".to_owned(), spec.id.clone()];
    for p in &spec.ports {
        args.push("-p".to_owned());
        args.push(format!("{}:{}:{}", p.host_addr, p.host_port, p.container_port));
    }
    for m in &spec.mounts {
        args.push("-v".to_owned());
        let mut v = format!("{}:{}", m.source.display(), m.target.display());
        if m.read_only {
            v.push_str(":ro");
        }
        args.push(v);
    }
    for (k, v) in &spec.env {
        args.push("-e".to_owned());
        args.push(format!("{k}={v}"));
    }
    args.push(spec.image.clone());
    args
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| (*s).to_owned()).collect()
}

impl ContainerRuntime for DockerCli {
    fn name(&self) -> &str {
        &self.binary
    }

    fn available(&self) -> bool {
        self.run(&owned(&["version", "--format", "{{.Server.Version}}"]))
            .is_ok()
    }

    fn inspect(&self, id: &str) -> Result<ContainerStatus, RuntimeError> {
        let args = owned(&[
            "inspect",
            "--type",
            "container",
            "--format",
            "{{.State.Running}}",
            id,
        ]);
        match self.run(&args) {
            Ok(out) => Ok(ContainerStatus {
                id: id.to_owned(),
                exists: true,
                running: out == "true",
            }),
            Err(RuntimeError::NotFound(_)) => Ok(ContainerStatus::absent(id)),
            Err(e) => Err(e),
        }
    }

    fn image_present(&self, image: &str) -> Result<bool, RuntimeError> {
        match self.run(&owned(&["image", "inspect", "--format", "{{.Id}}", image])) {
            Ok(_) => Ok(true),
            Err(RuntimeError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn pull_image(&self, image: &str) -> Result<(), RuntimeError> {
        self.run(&owned(&["pull", image])).map(drop)
    }

    fn create(&self, spec: &ContainerSpec) -> Result<(), RuntimeError> {
        self.run(&create_args(spec)).map(drop)
    }

    fn start(&self, id: &str) -> Result<(), RuntimeError> {
        self.run(&owned(&["start", id])).map(drop)
    }

    fn stop(&self, id: &str) -> Result<(), RuntimeError> {
        self.run(&owned(&["stop", id])).map(drop)
    }

    fn remove(&self, id: &str) -> Result<(), RuntimeError> {
        self.run(&owned(&["rm", id])).map(drop)
    }

    fn remove_image(&self, image: &str) -> Result<(), RuntimeError> {
        self.run(&owned(&["rmi", image])).map(drop)
    }
}
