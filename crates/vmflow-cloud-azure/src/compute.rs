//! Virtual machines (Microsoft.Compute)
//!
//! The model keeps unknown properties so that a VM read from the service
//! can be modified and written back without losing fields this crate does
//! not describe.

use crate::error::Result;
use crate::pipeline::ArmClient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const API_VERSION: &str = "2023-09-01";

pub const CREATE_FROM_IMAGE: &str = "FromImage";
pub const CREATE_EMPTY: &str = "Empty";

const POWER_STATE_PREFIX: &str = "PowerState/";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub location: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub properties: VirtualMachineProperties,
    /// `zones`, `identity`, `plan`, `etag` and anything newer
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl VirtualMachine {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Power state from the instance view, e.g. `running` or `deallocated`
    pub fn power_state(&self) -> Option<&str> {
        self.properties
            .instance_view
            .as_ref()
            .and_then(InstanceView::power_state)
    }

    pub fn os_disk_mut(&mut self) -> &mut OsDisk {
        self.properties
            .storage_profile
            .get_or_insert_with(Default::default)
            .os_disk
            .get_or_insert_with(Default::default)
    }

    /// Replace the data disk list; an empty list detaches every disk
    pub fn set_data_disks(&mut self, disks: Vec<DataDisk>) {
        self.properties
            .storage_profile
            .get_or_insert_with(Default::default)
            .data_disks = Some(disks);
    }

    pub fn data_disks(&self) -> &[DataDisk] {
        self.properties
            .storage_profile
            .as_ref()
            .and_then(|s| s.data_disks.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_profile: Option<HardwareProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_profile: Option<StorageProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_profile: Option<OsProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_profile: Option<NetworkProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics_profile: Option<DiagnosticsProfile>,
    #[serde(skip_serializing)]
    pub provisioning_state: Option<String>,
    #[serde(skip_serializing)]
    pub instance_view: Option<InstanceView>,
    #[serde(skip_serializing)]
    pub vm_id: Option<String>,
    #[serde(skip_serializing)]
    pub time_created: Option<String>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareProfile {
    pub vm_size: String,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl HardwareProfile {
    pub fn sized(vm_size: impl Into<String>) -> Self {
        Self {
            vm_size: vm_size.into(),
            additional: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_reference: Option<ImageReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_disk: Option<OsDisk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_disks: Option<Vec<DataDisk>>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReference {
    /// Gallery or custom image; marketplace images leave this unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing)]
    pub exact_version: Option<String>,
}

impl ImageReference {
    pub fn marketplace(
        publisher: impl Into<String>,
        offer: impl Into<String>,
        sku: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            publisher: Some(publisher.into()),
            offer: Some(offer.into()),
            sku: Some(sku.into()),
            version: Some(version.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsDisk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub create_option: String,
    #[serde(rename = "diskSizeGB", skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vhd: Option<VirtualHardDisk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_disk: Option<ManagedDiskParameters>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDisk {
    pub lun: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub create_option: String,
    #[serde(rename = "diskSizeGB", skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vhd: Option<VirtualHardDisk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_disk: Option<ManagedDiskParameters>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl DataDisk {
    /// New empty disk of `size_gb` at `lun`
    pub fn empty(lun: i32, name: impl Into<String>, size_gb: i32) -> Self {
        Self {
            lun,
            name: Some(name.into()),
            create_option: CREATE_EMPTY.to_string(),
            disk_size_gb: Some(size_gb),
            ..Default::default()
        }
    }

    pub fn with_vhd(mut self, uri: impl Into<String>) -> Self {
        self.vhd = Some(VirtualHardDisk { uri: uri.into() });
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualHardDisk {
    pub uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDiskParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_account_type: Option<String>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl std::fmt::Debug for OsProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OsProfile")
            .field("computer_name", &self.computer_name)
            .field("admin_username", &self.admin_username)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterfaceReference>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInterfaceReference {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<NetworkInterfaceReferenceProperties>,
}

impl NetworkInterfaceReference {
    pub fn primary(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: Some(NetworkInterfaceReferenceProperties {
                primary: Some(true),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInterfaceReferenceProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_diagnostics: Option<BootDiagnostics>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootDiagnostics {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceView {
    #[serde(default)]
    pub statuses: Vec<InstanceViewStatus>,
}

impl InstanceView {
    pub fn power_state(&self) -> Option<&str> {
        self.statuses
            .iter()
            .find_map(|s| s.code.strip_prefix(POWER_STATE_PREFIX))
    }

    pub fn provisioning_state(&self) -> Option<&str> {
        self.statuses
            .iter()
            .find_map(|s| s.code.strip_prefix("ProvisioningState/"))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceViewStatus {
    pub code: String,
    pub display_status: Option<String>,
}

/// Client for virtual machine operations
#[derive(Clone)]
pub struct VirtualMachinesClient {
    arm: ArmClient,
}

impl VirtualMachinesClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    fn vm_path(&self, group: &str, name: &str) -> String {
        self.arm.provider_url(
            group,
            &format!("Microsoft.Compute/virtualMachines/{}", name),
        )
    }

    fn url(&self, group: &str, name: &str) -> String {
        format!("{}?api-version={}", self.vm_path(group, name), API_VERSION)
    }

    fn action_url(&self, group: &str, name: &str, action: &str) -> String {
        format!(
            "{}/{}?api-version={}",
            self.vm_path(group, name),
            action,
            API_VERSION
        )
    }

    /// Create or update; returns the VM once provisioning has finished
    pub async fn create_or_update(
        &self,
        group: &str,
        name: &str,
        vm: &VirtualMachine,
    ) -> Result<VirtualMachine> {
        tracing::info!("Writing virtual machine {} in {}", name, group);
        self.arm.put(&self.url(group, name), vm).await
    }

    /// Get a VM including its instance view
    pub async fn get(&self, group: &str, name: &str) -> Result<VirtualMachine> {
        let url = format!("{}&$expand=instanceView", self.url(group, name));
        self.arm.get(&url).await
    }

    pub async fn deallocate(&self, group: &str, name: &str) -> Result<()> {
        tracing::info!("Deallocating virtual machine {}", name);
        self.arm
            .post_action(&self.action_url(group, name, "deallocate"))
            .await
    }

    pub async fn start(&self, group: &str, name: &str) -> Result<()> {
        tracing::info!("Starting virtual machine {}", name);
        self.arm.post_action(&self.action_url(group, name, "start")).await
    }

    pub async fn restart(&self, group: &str, name: &str) -> Result<()> {
        tracing::info!("Restarting virtual machine {}", name);
        self.arm
            .post_action(&self.action_url(group, name, "restart"))
            .await
    }

    pub async fn power_off(&self, group: &str, name: &str) -> Result<()> {
        tracing::info!("Powering off virtual machine {}", name);
        self.arm
            .post_action(&self.action_url(group, name, "powerOff"))
            .await
    }

    /// Every VM in the subscription
    pub async fn list_all(&self) -> Result<Vec<VirtualMachine>> {
        let url = format!(
            "{}/providers/Microsoft.Compute/virtualMachines?api-version={}",
            self.arm.subscription_url(),
            API_VERSION
        );
        self.arm.list(&url).await
    }

    /// VMs in one resource group
    pub async fn list(&self, group: &str) -> Result<Vec<VirtualMachine>> {
        let url = format!(
            "{}?api-version={}",
            self.arm
                .provider_url(group, "Microsoft.Compute/virtualMachines"),
            API_VERSION
        );
        self.arm.list(&url).await
    }

    pub async fn delete(&self, group: &str, name: &str) -> Result<()> {
        tracing::info!("Deleting virtual machine {}", name);
        self.arm.delete(&self.url(group, name)).await
    }
}
