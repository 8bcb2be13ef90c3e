use crate::record;
use crate::session::Session;
use crate::workflow::{CreatedMachine, machines, provision};
use colored::Colorize;
use vmflow_cloud::StateManager;

/// Provision the shared resources and every VM, recording each in the state file.
/// The state lock is held by the caller.
pub async fn provision_and_record(
    session: &Session,
    manager: &StateManager,
) -> anyhow::Result<Vec<CreatedMachine>> {
    let mut state = manager.load().await?;

    let foundation = provision::create_needed_resources(session).await?;
    record::record_foundation(&mut state, &session.settings, &foundation);
    manager.save(&state).await?;

    let created = machines::create_all(session, &foundation).await?;
    for machine in &created {
        record::record_machine(&mut state, &session.settings, machine);
    }
    manager.save(&state).await?;

    Ok(created)
}

pub async fn handle(session: &Session, manager: &StateManager) -> anyhow::Result<()> {
    println!(
        "{}",
        format!(
            "Provisioning resource group '{}' in {}",
            session.group(),
            session.settings.location
        )
        .yellow()
    );

    let lock = manager.acquire_lock().await?;
    let created = provision_and_record(session, manager).await?;
    lock.release().await?;

    println!();
    println!("{}", "✓ Environment is up".green().bold());
    for machine in &created {
        println!(
            "  • {} {}",
            machine.vm.name().cyan(),
            machine.host().dimmed()
        );
    }
    println!(
        "State recorded in {}",
        manager.state_path().display().to_string().cyan()
    );
    Ok(())
}
