//! Recording created resources in the local state file

use crate::workflow::{CreatedMachine, Foundation};
use serde_json::json;
use vmflow_cloud::{GlobalState, ResourceState, ResourceStatus, resource_key};
use vmflow_cloud_azure::{PROVIDER_NAME, VM_RESOURCE_TYPE};
use vmflow_config::Settings;

pub const GROUP_TYPE: &str = "resource-group";
pub const STORAGE_TYPE: &str = "storage-account";
pub const VNET_TYPE: &str = "virtual-network";
pub const SUBNET_TYPE: &str = "subnet";
pub const PUBLIC_IP_TYPE: &str = "public-ip";
pub const NIC_TYPE: &str = "network-interface";

fn set(state: &mut GlobalState, resource_type: &str, name: &str, resource: ResourceState) {
    state.set_resource(resource_key(PROVIDER_NAME, resource_type, name), resource);
}

pub fn record_foundation(state: &mut GlobalState, settings: &Settings, foundation: &Foundation) {
    set(
        state,
        GROUP_TYPE,
        &settings.resource_group,
        ResourceState::new(&foundation.group_id, GROUP_TYPE)
            .with_status(ResourceStatus::Running)
            .with_attribute("location", json!(settings.location)),
    );
    set(
        state,
        STORAGE_TYPE,
        &settings.storage_account,
        ResourceState::new(&foundation.storage_account_id, STORAGE_TYPE)
            .with_status(ResourceStatus::Running)
            .with_attribute("blob_endpoint", json!(foundation.blob_endpoint)),
    );
    set(
        state,
        VNET_TYPE,
        &settings.virtual_network,
        ResourceState::new(&foundation.virtual_network_id, VNET_TYPE)
            .with_status(ResourceStatus::Running)
            .with_attribute("address_prefix", json!(settings.vnet_prefix)),
    );
    set(
        state,
        SUBNET_TYPE,
        &settings.subnet,
        ResourceState::new(&foundation.subnet_id, SUBNET_TYPE)
            .with_status(ResourceStatus::Running)
            .with_attribute("address_prefix", json!(settings.subnet_prefix)),
    );
}

pub fn record_machine(state: &mut GlobalState, settings: &Settings, machine: &CreatedMachine) {
    let name = machine.vm.name();

    let mut vm = ResourceState::new(machine.vm.id.clone().unwrap_or_default(), VM_RESOURCE_TYPE)
        .with_status(ResourceStatus::Running)
        .with_attribute("host", json!(machine.host()))
        .with_attribute("admin_username", json!(settings.admin.username));
    if let Some(address) = &machine.public_ip.properties.ip_address {
        vm.set_attribute("public_ip", json!(address));
    }
    if let Some(address) = machine.nic.private_ip() {
        vm.set_attribute("private_ip", json!(address));
    }
    set(state, VM_RESOURCE_TYPE, name, vm);

    if let Some(id) = &machine.public_ip.id {
        set(
            state,
            PUBLIC_IP_TYPE,
            machine.public_ip.name.as_deref().unwrap_or(name),
            ResourceState::new(id, PUBLIC_IP_TYPE).with_status(ResourceStatus::Running),
        );
    }
    if let Some(id) = &machine.nic.id {
        set(
            state,
            NIC_TYPE,
            machine.nic.name.as_deref().unwrap_or(name),
            ResourceState::new(id, NIC_TYPE).with_status(ResourceStatus::Running),
        );
    }
}

/// Mark recorded VMs with a new status
pub fn mark_machines(state: &mut GlobalState, names: &[String], status: ResourceStatus) {
    for name in names {
        state.set_status(&resource_key(PROVIDER_NAME, VM_RESOURCE_TYPE, name), status);
    }
}

/// Names of the VMs recorded in the state file
pub fn recorded_machines(state: &GlobalState) -> Vec<String> {
    state.names_of_type(PROVIDER_NAME, VM_RESOURCE_TYPE)
}
