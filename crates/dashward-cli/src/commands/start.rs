use super::{json_pretty, maybe_spinner, spin_fail, spin_ok, EXIT_SUCCESS};
use dashward_core::LifecycleManager;

pub fn run(manager: &LifecycleManager, json: bool) -> Result<u8, String> {
    let pb = maybe_spinner(json, "starting dashboard...");
    let outcome = match manager.start() {
        Ok(o) => {
            if let Some(pb) = &pb {
                spin_ok(pb, "dashboard started");
            }
            o
        }
        Err(e) => {
            if let Some(pb) = &pb {
                spin_fail(pb, "start failed");
            }
            return Err(e.to_string());
        }
    };

    let url = outcome.record.listen_url();
    if json {
        let payload = serde_json::json!({
            "url": url,
            "container_id": outcome.record.container_id,
            "already_running": outcome.already_running,
        });
        println!("{}", json_pretty(&payload)?);
    } else if outcome.already_running {
        println!("dashboard already running at {url}");
    } else {
        println!("dashboard running at {url}");
    }
    Ok(EXIT_SUCCESS)
}
