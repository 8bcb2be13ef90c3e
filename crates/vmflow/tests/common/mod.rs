#![allow(deprecated)] // TODO: move from cargo_bin to cargo_bin_cmd!

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const AZURE_VARS: [&str; 5] = [
    "AZURE_TENANT_ID",
    "AZURE_CLIENT_ID",
    "AZURE_CLIENT_SECRET",
    "AZURE_SUBSCRIPTION_ID",
    "AZURE_AUTHORITY_HOST",
];

/// Scratch directory the CLI runs in, isolated from the developer's config
pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write_config(&self, content: &str) {
        fs::write(self.root.path().join("vmflow.yaml"), content).unwrap();
    }

    pub fn write_state(&self, content: &str) {
        let dir = self.root.path().join(".vmflow");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("state.json"), content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// `vmflow` running inside the project with no Azure or VMFlow env vars
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("vmflow").unwrap();
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".config"))
            .env_remove("VMFLOW_CONFIG_PATH")
            .env_remove("VMFLOW_LOCATION")
            .env_remove("VMFLOW_RESOURCE_GROUP")
            .env_remove("VMFLOW_ADMIN_PASSWORD");
        for var in AZURE_VARS {
            cmd.env_remove(var);
        }
        cmd
    }
}
