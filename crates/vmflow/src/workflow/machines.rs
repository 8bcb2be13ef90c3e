//! Per-VM network identity and VM creation

use super::provision::Foundation;
use crate::session::Session;
use anyhow::Context;
use colored::Colorize;
use futures_util::future::try_join_all;
use vmflow_cloud_azure::compute::{CREATE_FROM_IMAGE, ManagedDiskParameters, VirtualHardDisk};
use vmflow_cloud_azure::{
    BootDiagnostics, DiagnosticsProfile, HardwareProfile, ImageReference, NetworkInterface,
    NetworkInterfaceReference, NetworkProfile, OsDisk, OsProfile, PublicIpAddress,
    StorageProfile, VirtualMachine, VirtualMachineProperties,
};
use vmflow_config::{DiskLayout, MachineSpec, Settings};

pub const DISK_SKU: &str = "Standard_LRS";

/// A VM together with the network resources created for it
#[derive(Debug, Clone)]
pub struct CreatedMachine {
    pub vm: VirtualMachine,
    pub public_ip: PublicIpAddress,
    pub nic: NetworkInterface,
}

impl CreatedMachine {
    /// Public DNS name, or the bare address when no name was assigned
    pub fn host(&self) -> &str {
        self.public_ip
            .fqdn()
            .or(self.public_ip.properties.ip_address.as_deref())
            .unwrap_or("<unknown host>")
    }
}

/// Create a public IP with a DNS label and a NIC bound to it and the subnet
pub async fn create_pip_and_nic(
    session: &Session,
    machine: &MachineSpec,
    subnet_id: &str,
) -> anyhow::Result<(PublicIpAddress, NetworkInterface)> {
    let settings = &session.settings;
    let clients = &session.clients;
    let group = session.group();

    println!("Create PIP and NIC for '{}' VM...", machine.name);

    let ip_name = machine.public_ip_name();
    println!("\tCreate public IP address '{}'...", ip_name);
    let label = machine.dns_label(&settings.dns_label_prefix);
    clients
        .addresses
        .create_or_update(
            group,
            &ip_name,
            &PublicIpAddress::with_dns_label(&settings.location, label),
        )
        .await
        .with_context(|| format!("public IP address create failed for '{}'", ip_name))?;
    println!("\tCreated public IP address {}", ip_name.green());

    println!("\tGet public IP address info for '{}'...", ip_name);
    let public_ip = clients
        .addresses
        .get(group, &ip_name)
        .await
        .with_context(|| format!("public IP address get failed for '{}'", ip_name))?;

    let nic_name = machine.nic_name();
    println!("\tCreate NIC '{}'...", nic_name);
    let nic_parameters = NetworkInterface::single_ip(
        &settings.location,
        machine.ip_config_name(),
        subnet_id,
        public_ip.id.clone(),
    );
    clients
        .interfaces
        .create_or_update(group, &nic_name, &nic_parameters)
        .await
        .with_context(|| format!("network interface create failed for '{}'", nic_name))?;
    println!("\tCreated NIC '{}' successfully", nic_name.green());

    println!("\tGet NIC info for {}...", nic_name);
    let nic = clients
        .interfaces
        .get(group, &nic_name)
        .await
        .with_context(|| format!("network interface get failed for '{}'", nic_name))?;

    Ok((public_ip, nic))
}

/// Build the create request for `machine` attached to `nic_id`
pub fn vm_parameters(
    settings: &Settings,
    machine: &MachineSpec,
    nic_id: &str,
    blob_endpoint: &str,
) -> VirtualMachine {
    let os_disk = match settings.disk_layout {
        DiskLayout::Managed => OsDisk {
            create_option: CREATE_FROM_IMAGE.to_string(),
            managed_disk: Some(ManagedDiskParameters {
                id: None,
                storage_account_type: Some(DISK_SKU.to_string()),
            }),
            ..Default::default()
        },
        DiskLayout::Vhd => OsDisk {
            name: Some("osDisk".to_string()),
            create_option: CREATE_FROM_IMAGE.to_string(),
            vhd: Some(VirtualHardDisk {
                uri: settings.vhd_uri(&machine.name),
            }),
            ..Default::default()
        },
    };

    VirtualMachine {
        location: settings.location.clone(),
        properties: VirtualMachineProperties {
            hardware_profile: Some(HardwareProfile::sized(settings.vm_size.clone())),
            storage_profile: Some(StorageProfile {
                image_reference: Some(ImageReference::marketplace(
                    machine.image.publisher.clone(),
                    machine.image.offer.clone(),
                    machine.image.sku.clone(),
                    machine.image.version.clone(),
                )),
                os_disk: Some(os_disk),
                ..Default::default()
            }),
            os_profile: Some(OsProfile {
                computer_name: Some(machine.name.clone()),
                admin_username: Some(settings.admin.username.clone()),
                admin_password: Some(settings.admin.password.clone()),
                ..Default::default()
            }),
            network_profile: Some(NetworkProfile {
                network_interfaces: vec![NetworkInterfaceReference::primary(nic_id)],
                ..Default::default()
            }),
            diagnostics_profile: Some(DiagnosticsProfile {
                boot_diagnostics: Some(BootDiagnostics {
                    enabled: true,
                    storage_uri: Some(blob_endpoint.to_string()),
                }),
            }),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Create one VM with its public IP and NIC, then print how to connect
pub async fn create_vm(
    session: &Session,
    machine: &MachineSpec,
    foundation: &Foundation,
) -> anyhow::Result<CreatedMachine> {
    let settings = &session.settings;
    let (public_ip, nic) = create_pip_and_nic(session, machine, &foundation.subnet_id).await?;
    let nic_id = nic
        .id
        .as_deref()
        .with_context(|| format!("network interface for '{}' has no resource id", machine.name))?;

    println!("Create '{}' VM...", machine.name);
    let parameters = vm_parameters(settings, machine, nic_id, &foundation.blob_endpoint);
    let vm = session
        .clients
        .vms
        .create_or_update(session.group(), &machine.name, &parameters)
        .await
        .with_context(|| format!("VM create failed for '{}'", machine.name))?;

    let created = CreatedMachine { vm, public_ip, nic };
    println!(
        "Now you can connect to '{}' VM via 'ssh {}@{}' with password '{}'",
        machine.name.cyan(),
        settings.admin.username,
        created.host(),
        settings.admin.password
    );

    Ok(created)
}

/// Create every configured VM concurrently; the first failure aborts the rest
pub async fn create_all(
    session: &Session,
    foundation: &Foundation,
) -> anyhow::Result<Vec<CreatedMachine>> {
    let created = try_join_all(
        session
            .settings
            .machines
            .iter()
            .map(|machine| create_vm(session, machine, foundation)),
    )
    .await?;

    let names: Vec<&str> = session.settings.machine_names();
    println!(
        "{}",
        format!(
            "Your VMs have been created successfully: {}",
            names.join(", ")
        )
        .green()
    );
    Ok(created)
}
