use super::up;
use crate::session::Session;
use crate::utils;
use crate::workflow::{listing, operations, teardown};
use colored::Colorize;
use vmflow_cloud::StateManager;

/// Provision, exercise, list and tear down, start to finish
pub async fn handle(session: &Session, manager: &StateManager, yes: bool) -> anyhow::Result<()> {
    let lock = manager.acquire_lock().await?;

    let created = up::provision_and_record(session, manager).await?;
    let names: Vec<String> = created.iter().map(|m| m.vm.name().to_string()).collect();

    operations::run_all(session, &names).await?;
    listing::list_vms(session).await?;

    utils::confirm_teardown(yes)?;
    teardown::delete_all(session, &names).await?;
    manager.clear().await?;
    lock.release().await?;

    println!("{}", "✓ Sample finished, all resources deleted".green());
    Ok(())
}
