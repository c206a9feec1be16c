use super::{colorize_state, json_pretty, EXIT_SUCCESS};
use dashward_core::LifecycleManager;

pub fn run(manager: &LifecycleManager, json: bool) -> Result<u8, String> {
    let report = manager.status().map_err(|e| e.to_string())?;
    let state = report.state.to_string();

    if json {
        let payload = serde_json::json!({
            "state": state,
            "container": report.container,
            "url": report.record.as_ref().map(dashward_schema::ConfigRecord::listen_url),
            "username": report.record.as_ref().map(|r| r.username.as_str()),
            "data_dir": report.record.as_ref().map(|r| &r.data_dir),
        });
        println!("{}", json_pretty(&payload)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("state:     {}", colorize_state(&state));
    println!("container: {}", report.container.id);
    if let Some(record) = &report.record {
        println!("url:       {}", record.listen_url());
        println!("username:  {}", record.username);
        println!("data dir:  {}", record.data_dir.display());
        println!("database:  {}", record.database.kind);
    }
    Ok(EXIT_SUCCESS)
}
