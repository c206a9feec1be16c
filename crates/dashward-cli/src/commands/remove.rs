use super::{json_pretty, DialoguerGate, EXIT_SUCCESS};
use dashward_core::{LifecycleManager, RemoveOptions};

pub fn run(manager: &LifecycleManager, force: bool, yes: bool, json: bool) -> Result<u8, String> {
    let options = RemoveOptions {
        force,
        skip_confirmation: yes,
    };
    let report = manager
        .remove(options, &DialoguerGate)
        .map_err(|e| e.to_string())?;

    if json {
        println!(
            "{}",
            json_pretty(&serde_json::json!({
                "declined": report.declined,
                "container_removed": report.container_removed,
                "data_removed": report.data_removed,
                "image_removed": report.image_removed,
                "warnings": report.warnings,
            }))?
        );
        return Ok(EXIT_SUCCESS);
    }

    if report.declined {
        println!("aborted, nothing was removed");
        return Ok(EXIT_SUCCESS);
    }
    if report.warnings.is_empty() {
        println!("dashboard removed");
    } else {
        println!(
            "dashboard removed with {} warning(s), see the log above",
            report.warnings.len()
        );
    }
    if force && report.image_removed {
        println!("image removed");
    }
    Ok(EXIT_SUCCESS)
}
