use std::fmt;
use std::process::Command;

/// A missing prerequisite with actionable install instructions.
#[derive(Debug)]
pub struct MissingPrereq {
    pub name: String,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

impl fmt::Display for MissingPrereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (install: {})",
            self.name, self.purpose, self.install_hint
        )
    }
}

fn command_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check that the runtime binary `binary` can be found.
/// The mock runtime needs nothing. Empty list means all prerequisites are met.
pub fn check_runtime_prereqs(binary: &str) -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    let install_hint = match binary {
        "mock" => return missing,
        "podman" => "zypper install podman | apt install podman | dnf install podman | pacman -S podman",
        _ => "https://docs.docker.com/engine/install/ or: apt install docker.io | dnf install moby-engine",
    };

    if !command_exists(binary) {
        missing.push(MissingPrereq {
            name: binary.to_owned(),
            purpose: "running the dashboard container",
            install_hint,
        });
    }

    missing
}

/// Format a list of missing prerequisites into a user-friendly error message.
pub fn format_missing(missing: &[MissingPrereq]) -> String {
    use std::fmt::Write as _;
    let mut msg = String::from("missing prerequisites:\n");
    for m in missing {
        let _ = writeln!(msg, "{m}");
    }
    msg.push_str("\nThe dashboard runs in a container; install a container runtime first.");
    msg
}
