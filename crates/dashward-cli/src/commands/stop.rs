use super::{json_pretty, EXIT_SUCCESS};
use dashward_core::{LifecycleManager, StopOutcome};

pub fn run(manager: &LifecycleManager, json: bool) -> Result<u8, String> {
    let id = manager.settings().container_id.clone();
    let outcome = manager.stop();

    if json {
        let (status, detail) = match &outcome {
            StopOutcome::Stopped => ("stopped", None),
            StopOutcome::AlreadyStopped => ("already_stopped", None),
            StopOutcome::Absent => ("absent", None),
            StopOutcome::Failed(msg) => ("failed", Some(msg.as_str())),
        };
        let payload = serde_json::json!({
            "container_id": id,
            "status": status,
            "detail": detail,
        });
        println!("{}", json_pretty(&payload)?);
    } else if outcome == StopOutcome::Stopped {
        println!("stopped dashboard container {id}");
    }
    // Failures were already logged as warnings; stop never fails the process.
    Ok(EXIT_SUCCESS)
}
