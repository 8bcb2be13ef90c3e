use crate::record;
use crate::session::Session;
use crate::workflow::operations;
use colored::Colorize;
use vmflow_cloud::{ResourceStatus, StateManager};

/// VMs to operate on: the given names, or every configured machine
pub fn target_names(session: &Session, requested: Vec<String>) -> Vec<String> {
    if requested.is_empty() {
        session
            .settings
            .machine_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        requested
    }
}

pub async fn handle(
    session: &Session,
    manager: &StateManager,
    vms: Vec<String>,
) -> anyhow::Result<()> {
    let names = target_names(session, vms);
    println!(
        "{}",
        format!("Running VM operations on: {}", names.join(", ")).yellow()
    );

    operations::run_all(session, &names).await?;

    // The sequence ends with a power off
    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;
    if !state.is_empty() {
        record::mark_machines(&mut state, &names, ResourceStatus::Stopped);
        manager.save(&state).await?;
    }
    lock.release().await?;

    println!();
    println!("{}", "✓ VM operations complete".green().bold());
    Ok(())
}
