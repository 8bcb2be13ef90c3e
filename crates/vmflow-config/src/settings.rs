//! Sample settings
//!
//! Every field has a default, so a config file only needs to name what it
//! changes. Defaults describe a resource group holding one storage account,
//! one virtual network with a single subnet, and two VMs (Linux and Windows).

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

const ADMIN_PASSWORD_ENV: &str = "VMFLOW_ADMIN_PASSWORD";

/// Top-level VMFlow settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Azure region every resource is created in
    pub location: String,
    pub resource_group: String,
    /// Storage account name (3-24 lowercase letters and digits, globally unique)
    pub storage_account: String,
    pub virtual_network: String,
    pub subnet: String,
    pub vnet_prefix: String,
    pub subnet_prefix: String,
    /// Prefix of the public DNS label given to each VM's public IP
    pub dns_label_prefix: String,
    pub admin: AdminCredentials,
    pub vm_size: String,
    pub disk_layout: DiskLayout,
    /// Blob container holding VHDs when `disk_layout` is `vhd`
    pub vhd_container: String,
    pub machines: Vec<MachineSpec>,
    pub poll_interval_secs: u64,
    pub operation_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            location: "eastus".to_string(),
            resource_group: "sample-group1".to_string(),
            storage_account: "vmflowsamplestore".to_string(),
            virtual_network: "vNet".to_string(),
            subnet: "subnet".to_string(),
            vnet_prefix: "10.0.0.0/16".to_string(),
            subnet_prefix: "10.0.0.0/24".to_string(),
            dns_label_prefix: "vmflowsample".to_string(),
            admin: AdminCredentials::default(),
            vm_size: "Standard_B1s".to_string(),
            disk_layout: DiskLayout::default(),
            vhd_container: "vhds".to_string(),
            machines: vec![
                MachineSpec::new(
                    "linuxVM",
                    ImageSpec::latest("Canonical", "0001-com-ubuntu-server-jammy", "22_04-lts-gen2"),
                ),
                MachineSpec::new(
                    "windowsVM",
                    ImageSpec::latest(
                        "MicrosoftWindowsServer",
                        "WindowsServer",
                        "2022-datacenter-azure-edition",
                    ),
                ),
            ],
            poll_interval_secs: 5,
            operation_timeout_secs: 30 * 60,
        }
    }
}

impl Settings {
    /// Load settings from the discovered config file, or defaults if there is none
    pub fn load() -> Result<Self> {
        let settings = match crate::find_config_file() {
            Ok(path) => {
                tracing::debug!("Loading settings from {}", path.display());
                Self::from_file(&path)?
            }
            Err(ConfigError::ConfigNotFound) => {
                tracing::debug!("No config file found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };

        settings.finish()
    }

    /// Load settings from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::from_file(path)?.finish()
    }

    fn finish(mut self) -> Result<Self> {
        self.apply_env_overrides();
        self.validate()?;
        Ok(self)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
            path: "<inline>".to_string(),
            source,
        })
    }

    /// `VMFLOW_ADMIN_PASSWORD` replaces the admin password when set and non-empty
    pub fn apply_env_overrides(&mut self) {
        if let Ok(password) = std::env::var(ADMIN_PASSWORD_ENV) {
            if !password.is_empty() {
                self.admin.password = password;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("location", &self.location),
            ("resource_group", &self.resource_group),
            ("virtual_network", &self.virtual_network),
            ("subnet", &self.subnet),
            ("vnet_prefix", &self.vnet_prefix),
            ("subnet_prefix", &self.subnet_prefix),
            ("vm_size", &self.vm_size),
            ("admin.username", &self.admin.username),
            ("admin.password", &self.admin.password),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", field)));
            }
        }

        let account = &self.storage_account;
        if !(3..=24).contains(&account.len())
            || !account
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ConfigError::Invalid(format!(
                "storage_account '{}' must be 3-24 lowercase letters or digits",
                account
            )));
        }

        if self.machines.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one machine must be configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut labels = HashMap::new();
        for machine in &self.machines {
            if machine.name.trim().is_empty() {
                return Err(ConfigError::Invalid("machine name must not be empty".to_string()));
            }
            if !seen.insert(machine.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate machine name '{}'",
                    machine.name
                )));
            }
            // Public IP DNS labels are derived from the first five characters
            let label = machine.dns_label(&self.dns_label_prefix);
            if let Some(other) = labels.insert(label.clone(), machine.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "machines '{}' and '{}' share the DNS label '{}'",
                    other, machine.name, label
                )));
            }
        }

        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.operation_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "operation_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    pub fn machine(&self, name: &str) -> Option<&MachineSpec> {
        self.machines.iter().find(|m| m.name == name)
    }

    pub fn machine_names(&self) -> Vec<&str> {
        self.machines.iter().map(|m| m.name.as_str()).collect()
    }

    /// Blob URI of a VHD in the sample storage account
    pub fn vhd_uri(&self, blob_name: &str) -> String {
        format!(
            "https://{}.blob.core.windows.net/{}/{}.vhd",
            self.storage_account, self.vhd_container, blob_name
        )
    }

    /// Blob endpoint of the sample storage account
    pub fn blob_endpoint(&self) -> String {
        format!("https://{}.blob.core.windows.net/", self.storage_account)
    }
}

/// VM administrator login
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            username: "notadmin".to_string(),
            password: "Pa$$w0rd1975".to_string(),
        }
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How VM disks are stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskLayout {
    /// Azure managed disks; the storage account holds boot diagnostics
    #[default]
    Managed,
    /// Page-blob VHDs inside the storage account
    Vhd,
}

/// One VM to create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSpec {
    pub name: String,
    pub image: ImageSpec,
}

impl MachineSpec {
    pub fn new(name: impl Into<String>, image: ImageSpec) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }

    pub fn public_ip_name(&self) -> String {
        format!("pip-{}", self.name)
    }

    pub fn nic_name(&self) -> String {
        format!("nic-{}", self.name)
    }

    pub fn ip_config_name(&self) -> String {
        format!("IPconfig-{}", self.name)
    }

    /// DNS label: `<prefix>-<first five characters of the name, lowercased>`
    pub fn dns_label(&self, prefix: &str) -> String {
        let short: String = self.name.chars().take(5).collect();
        format!("{}-{}", prefix, short.to_lowercase())
    }
}

/// Marketplace image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSpec {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    #[serde(default = "default_image_version")]
    pub version: String,
}

impl ImageSpec {
    pub fn latest(
        publisher: impl Into<String>,
        offer: impl Into<String>,
        sku: impl Into<String>,
    ) -> Self {
        Self {
            publisher: publisher.into(),
            offer: offer.into(),
            sku: sku.into(),
            version: default_image_version(),
        }
    }
}

fn default_image_version() -> String {
    "latest".to_string()
}
