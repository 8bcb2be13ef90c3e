use crate::record;
use crate::session::Session;
use crate::utils;
use colored::Colorize;
use vmflow_cloud::{CloudProvider, StateManager};

pub async fn handle(session: &Session, manager: &StateManager, yes: bool) -> anyhow::Result<()> {
    let provider = session.provider();
    println!(
        "{}",
        format!(
            "Tearing down resource group '{}' ({})",
            session.group(),
            provider.display_name()
        )
        .yellow()
    );

    let lock = manager.acquire_lock().await?;
    let state = manager.load().await?;

    let recorded = record::recorded_machines(&state);
    if recorded.is_empty() {
        println!("No VMs recorded in {}", manager.state_path().display());
    } else {
        println!("{}", format!("Recorded VMs ({}):", recorded.len()).bold());
        for name in &recorded {
            println!("  • {}", name.cyan());
        }
    }

    utils::confirm_teardown(yes)?;

    let result = provider.destroy_all().await?;
    for action in &result.succeeded {
        utils::print_success(&action.message);
    }
    for action in &result.failed {
        utils::print_failure(&format!(
            "{}: {}",
            action.action_id,
            action.error.as_deref().unwrap_or("unknown error")
        ));
    }

    if !result.is_success() {
        anyhow::bail!("Teardown incomplete: {}", result);
    }

    manager.clear().await?;
    lock.release().await?;

    println!();
    println!("{}", format!("✓ Teardown complete: {}", result).green());
    Ok(())
}
