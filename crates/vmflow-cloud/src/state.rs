//! Local record of created resources
//!
//! `vmflow up` writes `.vmflow/state.json` so that `ops`, `status` and
//! `down` can find the sample's resource group and VMs again. Writers hold
//! `.vmflow/lock.json` for the duration of a command.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".vmflow";
const STATE_FILE: &str = "state.json";
const STATE_BACKUP: &str = "state.json.backup";
const LOCK_FILE: &str = "lock.json";
const LOCK_STALE_AFTER_HOURS: i64 = 1;

/// `provider:type:name`, e.g. `azure:virtual-machine:linuxVM`
pub fn resource_key(provider: &str, resource_type: &str, name: &str) -> String {
    format!("{}:{}:{}", provider, resource_type, name)
}

/// Contents of the state file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    /// Keyed by [`resource_key`], kept in key order
    pub resources: BTreeMap<String, ResourceState>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_resource(&mut self, key: String, resource: ResourceState) {
        self.resources.insert(key, resource);
        self.touch();
    }

    pub fn get_resource(&self, key: &str) -> Option<&ResourceState> {
        self.resources.get(key)
    }

    /// Change the status of a recorded resource; false when the key is unknown
    pub fn set_status(&mut self, key: &str, status: ResourceStatus) -> bool {
        let Some(resource) = self.resources.get_mut(key) else {
            return false;
        };
        resource.status = status;
        resource.updated_at = Utc::now();
        self.touch();
        true
    }

    /// Names recorded under `provider:resource_type:`, in order
    pub fn names_of_type(&self, provider: &str, resource_type: &str) -> Vec<String> {
        let prefix = format!("{}:{}:", provider, resource_type);
        self.resources
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .map(str::to_string)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Resources a provider reports as live, keyed by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderState {
    pub resources: BTreeMap<String, ResourceState>,
}

impl ProviderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: String, resource: ResourceState) {
        self.resources.insert(name, resource);
    }

    /// Entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResourceState)> {
        self.resources.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// One recorded resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    /// ARM resource id
    pub id: String,
    pub resource_type: String,
    pub status: ResourceStatus,
    /// Free-form details (host, location, addresses)
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResourceState {
    pub fn new(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            status: ResourceStatus::Unknown,
            attributes: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.insert(key.into(), value);
        self.updated_at = Utc::now();
    }

    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| T::deserialize(v).ok())
    }
}

/// Lifecycle of a VM or supporting resource as last observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Running,
    /// Powered off, compute still billed
    Stopped,
    /// Powered off with compute released
    Deallocated,
    Error,
    Unknown,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Running => "running",
            ResourceStatus::Stopped => "stopped",
            ResourceStatus::Deallocated => "deallocated",
            ResourceStatus::Error => "error",
            ResourceStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads and writes the state file under a project directory
pub struct StateManager {
    dir: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            dir: project_root.as_ref().join(STATE_DIR),
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.dir.join(STATE_BACKUP)
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    /// Load the state; a missing file is an empty state
    pub async fn load(&self) -> Result<GlobalState> {
        let path = self.state_path();
        if !path.exists() {
            tracing::debug!("No state file at {}", path.display());
            return Ok(GlobalState::new());
        }

        let state: GlobalState = serde_json::from_str(&fs::read_to_string(&path).await?)?;
        if state.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "{} has version {}, this vmflow understands up to {}",
                path.display(),
                state.version,
                STATE_VERSION
            )));
        }

        tracing::debug!("Loaded {} recorded resources", state.resources.len());
        Ok(state)
    }

    /// Write the state; the previous file becomes `state.json.backup`
    pub async fn save(&self, state: &GlobalState) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        self.rotate_backup().await?;

        fs::write(self.state_path(), serde_json::to_string_pretty(state)?).await?;
        tracing::debug!("Saved {} recorded resources", state.resources.len());
        Ok(())
    }

    /// Forget every recorded resource; the last state survives as the backup
    pub async fn clear(&self) -> Result<()> {
        if self.rotate_backup().await? {
            tracing::debug!("Cleared state file");
        }
        Ok(())
    }

    /// Move the current state file over the backup; false when there was none
    async fn rotate_backup(&self) -> Result<bool> {
        let path = self.state_path();
        if !path.exists() {
            return Ok(false);
        }
        fs::rename(&path, self.backup_path()).await?;
        Ok(true)
    }

    /// Take the lock file; a lock older than an hour is taken over
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        fs::create_dir_all(&self.dir).await?;
        let lock_path = self.lock_path();

        if lock_path.exists() {
            let held: LockInfo = serde_json::from_str(&fs::read_to_string(&lock_path).await?)?;
            let age = Utc::now().signed_duration_since(held.acquired_at);
            if age.num_hours() < LOCK_STALE_AFTER_HOURS {
                return Err(CloudError::LockError(format!(
                    "State is locked by {} (pid {}) since {}",
                    held.holder, held.pid, held.acquired_at
                )));
            }
            tracing::warn!("Taking over stale lock held by {} (pid {})", held.holder, held.pid);
        }

        let info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            pid: std::process::id(),
            acquired_at: Utc::now(),
        };
        fs::write(&lock_path, serde_json::to_string_pretty(&info)?).await?;

        tracing::debug!("Acquired state lock");
        Ok(StateLock {
            path: Some(lock_path),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    #[serde(default)]
    pid: u32,
    acquired_at: DateTime<Utc>,
}

/// Held state lock; dropping it without `release` still removes the file
pub struct StateLock {
    path: Option<PathBuf>,
}

impl StateLock {
    pub async fn release(mut self) -> Result<()> {
        if let Some(path) = self.path.take() {
            if path.exists() {
                fs::remove_file(&path).await?;
            }
            tracing::debug!("Released state lock");
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}
