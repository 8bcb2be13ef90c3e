use crate::session::Session;
use colored::Colorize;
use vmflow_cloud::{CloudProvider, GlobalState, ResourceStatus, StateManager};

fn colored_status(status: ResourceStatus) -> colored::ColoredString {
    let text = status.to_string();
    match status {
        ResourceStatus::Running => text.green(),
        ResourceStatus::Stopped | ResourceStatus::Deallocated => text.yellow(),
        ResourceStatus::Error => text.red(),
        _ => text.dimmed(),
    }
}

/// One line per recorded resource, in key order
pub fn format_state(state: &GlobalState) -> Vec<String> {
    state
        .resources
        .iter()
        .map(|(key, resource)| {
            let mut line = format!("{}  {}", key, resource.status);
            if let Some(host) = resource.get_attribute::<String>("host") {
                line.push_str(&format!("  {}", host));
            }
            line
        })
        .collect()
}

pub async fn handle(manager: &StateManager, live: Option<&Session>) -> anyhow::Result<()> {
    let state = manager.load().await?;

    println!(
        "State file: {}",
        manager.state_path().display().to_string().cyan()
    );
    if state.is_empty() {
        println!("{}", "No resources recorded".dimmed());
    } else {
        println!(
            "{}",
            format!(
                "Recorded resources ({}), updated {}:",
                state.resources.len(),
                state.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
            )
            .bold()
        );
        for line in format_state(&state) {
            println!("  • {}", line);
        }
    }

    let Some(session) = live else {
        return Ok(());
    };

    let provider = session.provider();
    println!();
    println!(
        "{}",
        format!("{} resource group '{}':", provider.display_name(), session.group()).bold()
    );

    let auth = provider.check_auth().await?;
    if !auth.authenticated {
        anyhow::bail!(
            "Not authenticated: {}",
            auth.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }
    if let Some(account) = &auth.account_info {
        println!("  {} {}", "✓".green(), account);
    }

    let live_state = provider.get_state().await?;
    if live_state.is_empty() {
        println!("  {}", "No VMs found".dimmed());
    }
    for (name, vm) in live_state.iter() {
        println!("  • {}  {}", name.cyan(), colored_status(vm.status));
    }

    Ok(())
}
