use crate::CoreError;
use dashward_runtime::ContainerStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardState {
    Uninstalled,
    Configured,
    Running,
    Stopped,
    Removed,
}

impl std::fmt::Display for DashboardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardState::Uninstalled => write!(f, "uninstalled"),
            DashboardState::Configured => write!(f, "configured"),
            DashboardState::Running => write!(f, "running"),
            DashboardState::Stopped => write!(f, "stopped"),
            DashboardState::Removed => write!(f, "removed"),
        }
    }
}

impl DashboardState {
    /// Derive the state from whether a record exists and what the runtime
    /// reports for the managed container.
    pub fn observe(configured: bool, container: &ContainerStatus) -> Self {
        match (configured, container.exists, container.running) {
            (_, true, true) => DashboardState::Running,
            (_, true, false) => DashboardState::Stopped,
            (true, false, _) => DashboardState::Configured,
            (false, false, _) => DashboardState::Uninstalled,
        }
    }
}

/// Check a move between states before the fail-fast operations act on it:
/// `setup` (via `Removed` when it replaces an installation) and `start`.
/// `stop` and `remove` are tolerant of every observed state and only
/// report what they found, so they are not gated here.
pub fn validate_transition(from: DashboardState, to: DashboardState) -> Result<(), CoreError> {
    let valid = matches!(
        (from, to),
        (
            DashboardState::Uninstalled | DashboardState::Removed,
            DashboardState::Configured
        ) | (
            DashboardState::Configured | DashboardState::Running | DashboardState::Stopped,
            DashboardState::Running | DashboardState::Removed
        ) | (
            DashboardState::Running | DashboardState::Stopped,
            DashboardState::Stopped
        ) | (DashboardState::Removed, DashboardState::Uninstalled)
    );

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}
