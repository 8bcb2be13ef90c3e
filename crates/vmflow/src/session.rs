use anyhow::Context;
use std::path::Path;
use vmflow_cloud_azure::{AzureClients, AzureProvider, PollOptions};
use vmflow_config::Settings;

/// Settings plus authenticated Azure clients, shared by every command
#[derive(Clone)]
pub struct Session {
    pub settings: Settings,
    pub clients: AzureClients,
}

impl Session {
    pub fn new(settings: Settings, clients: AzureClients) -> Self {
        Self { settings, clients }
    }

    /// Read Azure credentials from the environment and build the clients
    pub fn connect(settings: Settings) -> anyhow::Result<Self> {
        let poll = PollOptions {
            interval: settings.poll_interval(),
            timeout: settings.operation_timeout(),
        };
        let clients =
            AzureClients::from_env(poll).context("Failed to load Azure credentials")?;
        tracing::debug!(
            "Using subscription {} and resource group {}",
            clients.subscription_id(),
            settings.resource_group
        );
        Ok(Self::new(settings, clients))
    }

    pub fn group(&self) -> &str {
        &self.settings.resource_group
    }

    pub fn provider(&self) -> AzureProvider {
        AzureProvider::new(self.clients.clone(), self.settings.resource_group.clone())
    }
}

/// Load settings from `--config` or the usual search path, then apply CLI overrides
pub fn load_settings(
    config: Option<&Path>,
    location: Option<String>,
    resource_group: Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = match config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::load().context("Failed to load settings")?,
    };

    if let Some(location) = location {
        settings.location = location;
    }
    if let Some(group) = resource_group {
        settings.resource_group = group;
    }
    settings.validate().context("Invalid settings")?;
    tracing::debug!("Settings: {:?}", settings);

    Ok(settings)
}
