use colored::Colorize;
use std::io::Write;

/// Print `prompt` and block until a line is read from stdin
pub fn wait_for_enter(prompt: &str) -> anyhow::Result<()> {
    print!("{}", prompt);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(())
}

/// Read the teardown prompt unless `--yes` was given
pub fn confirm_teardown(yes: bool) -> anyhow::Result<()> {
    if yes {
        return Ok(());
    }
    wait_for_enter("Press enter to delete the VMs and other resources created in this sample...")
}

pub fn print_success(message: &str) {
    println!("  {} {}", "✓".green(), message);
}

pub fn print_failure(message: &str) {
    println!("  {} {}", "✗".red(), message);
}
