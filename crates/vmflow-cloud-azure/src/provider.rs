//! Azure provider implementation

use crate::clients::AzureClients;
use crate::compute::VirtualMachine;
use crate::error::AzureError;
use async_trait::async_trait;
use futures_util::future::{join_all, try_join_all};
use vmflow_cloud::{
    ApplyResult, AuthStatus, CloudError, CloudProvider, ProviderState, ResourceState,
    ResourceStatus,
};

pub const PROVIDER_NAME: &str = "azure";
pub const VM_RESOURCE_TYPE: &str = "virtual-machine";

/// Azure provider scoped to one resource group
pub struct AzureProvider {
    clients: AzureClients,
    resource_group: String,
}

impl AzureProvider {
    pub fn new(clients: AzureClients, resource_group: impl Into<String>) -> Self {
        Self {
            clients,
            resource_group: resource_group.into(),
        }
    }

    pub fn clients(&self) -> &AzureClients {
        &self.clients
    }

    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    /// VMs in the group; a missing group has none
    async fn group_vms(&self) -> Result<Vec<VirtualMachine>, AzureError> {
        match self.clients.vms.list(&self.resource_group).await {
            Ok(vms) => Ok(vms),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

/// Map an instance-view power state onto a resource status
pub fn status_from_power_state(power_state: Option<&str>) -> ResourceStatus {
    match power_state {
        Some("running") | Some("starting") => ResourceStatus::Running,
        Some("stopped") | Some("stopping") => ResourceStatus::Stopped,
        Some("deallocated") | Some("deallocating") => ResourceStatus::Deallocated,
        _ => ResourceStatus::Unknown,
    }
}

fn vm_state(vm: &VirtualMachine) -> ResourceState {
    let mut status = status_from_power_state(vm.power_state());
    if vm.properties.provisioning_state.as_deref() == Some("Failed") {
        status = ResourceStatus::Error;
    }

    let mut state = ResourceState::new(vm.id.clone().unwrap_or_default(), VM_RESOURCE_TYPE)
        .with_status(status)
        .with_attribute("location", serde_json::json!(vm.location));
    if let Some(size) = &vm.properties.hardware_profile {
        state.set_attribute("vm_size", serde_json::json!(size.vm_size));
    }
    if let Some(power) = vm.power_state() {
        state.set_attribute("power_state", serde_json::json!(power));
    }
    state
}

#[async_trait]
impl CloudProvider for AzureProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn display_name(&self) -> &str {
        "Microsoft Azure"
    }

    async fn check_auth(&self) -> vmflow_cloud::Result<AuthStatus> {
        match self.clients.arm.credential().token().await {
            Ok(_) => Ok(AuthStatus::ok(format!(
                "subscription {}",
                self.clients.subscription_id()
            ))),
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    async fn get_state(&self) -> vmflow_cloud::Result<ProviderState> {
        let listed = self.group_vms().await?;

        // The list operation carries no instance view
        let vms = try_join_all(
            listed
                .iter()
                .map(|vm| self.clients.vms.get(&self.resource_group, vm.name())),
        )
        .await?;

        let mut state = ProviderState::new();
        for vm in &vms {
            state.add(vm.name().to_string(), vm_state(vm));
        }
        Ok(state)
    }

    async fn destroy(&self, resource_id: &str) -> vmflow_cloud::Result<()> {
        self.clients
            .vms
            .delete(&self.resource_group, resource_id)
            .await
            .map_err(CloudError::from)
    }

    async fn destroy_all(&self) -> vmflow_cloud::Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        let vms = self.group_vms().await?;
        let names: Vec<String> = vms.iter().map(|vm| vm.name().to_string()).collect();

        let outcomes = join_all(names.iter().map(|name| self.destroy(name))).await;
        for (name, outcome) in names.iter().zip(outcomes) {
            match outcome {
                Ok(()) => result.add_success(
                    format!("delete-{}", name),
                    format!("Deleted virtual machine {}", name),
                ),
                Err(e) => result.add_failure(format!("delete-{}", name), e.to_string()),
            }
        }

        let group_action = format!("delete-{}", self.resource_group);
        match self.clients.groups.delete(&self.resource_group).await {
            Ok(()) => result.add_success(
                group_action,
                format!("Deleted resource group {}", self.resource_group),
            ),
            Err(e) => result.add_failure(group_action, e.to_string()),
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::arm_client;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GROUP_PATH: &str = "/subscriptions/sub-1/resourceGroups/rg";
    const VMS_PATH: &str =
        "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines";

    fn provider(server: &MockServer) -> AzureProvider {
        AzureProvider::new(AzureClients::new(arm_client(&server.uri())), "rg")
    }

    async fn mount_vm_list(server: &MockServer, names: &[&str]) {
        let value: Vec<_> = names
            .iter()
            .map(|n| json!({"id": format!("{}/{}", VMS_PATH, n), "name": n, "location": "eastus"}))
            .collect();
        Mock::given(method("GET"))
            .and(path(VMS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": value})))
            .mount(server)
            .await;
    }

    #[test]
    fn test_status_from_power_state() {
        assert_eq!(status_from_power_state(Some("running")), ResourceStatus::Running);
        assert_eq!(status_from_power_state(Some("stopped")), ResourceStatus::Stopped);
        assert_eq!(
            status_from_power_state(Some("deallocated")),
            ResourceStatus::Deallocated
        );
        assert_eq!(status_from_power_state(None), ResourceStatus::Unknown);
    }

    #[tokio::test]
    async fn test_check_auth() {
        let server = MockServer::start().await;
        let auth = provider(&server).check_auth().await.unwrap();
        assert!(auth.authenticated);
        assert_eq!(auth.account_info.as_deref(), Some("subscription sub-1"));
    }

    #[tokio::test]
    async fn test_get_state_reads_instance_views() {
        let server = MockServer::start().await;
        mount_vm_list(&server, &["linuxVM"]).await;
        Mock::given(method("GET"))
            .and(path(format!("{}/linuxVM", VMS_PATH)))
            .and(query_param("$expand", "instanceView"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": format!("{}/linuxVM", VMS_PATH),
                "name": "linuxVM",
                "location": "eastus",
                "properties": {
                    "hardwareProfile": {"vmSize": "Standard_B1s"},
                    "instanceView": {"statuses": [{"code": "PowerState/stopped"}]}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let state = provider(&server).get_state().await.unwrap();
        let vm = &state.resources["linuxVM"];
        assert_eq!(vm.status, ResourceStatus::Stopped);
        assert_eq!(vm.resource_type, VM_RESOURCE_TYPE);
        assert_eq!(vm.get_attribute::<String>("vm_size").as_deref(), Some("Standard_B1s"));
    }

    #[tokio::test]
    async fn test_get_state_missing_group_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(VMS_PATH))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": "ResourceGroupNotFound", "message": "Resource group 'rg' could not be found."}
            })))
            .mount(&server)
            .await;

        let state = provider(&server).get_state().await.unwrap();
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn test_destroy_all_deletes_vms_then_group() {
        let server = MockServer::start().await;
        mount_vm_list(&server, &["linuxVM", "windowsVM"]).await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/linuxVM", VMS_PATH)))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/windowsVM", VMS_PATH)))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": {"code": "InternalServerError", "message": "boom"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(GROUP_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider(&server).destroy_all().await.unwrap();
        assert_eq!(result.succeeded.len(), 2);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].action_id, "delete-windowsVM");
        assert!(!result.is_success());
    }
}
