//! Shared resources every VM depends on

use crate::session::Session;
use anyhow::Context;
use colored::Colorize;
use vmflow_cloud_azure::{
    ResourceGroup, StorageAccountCreateParameters, Subnet, VirtualNetwork,
};

/// Identifiers later steps need from the shared resources
#[derive(Debug, Clone)]
pub struct Foundation {
    pub group_id: String,
    pub storage_account_id: String,
    pub virtual_network_id: String,
    pub subnet_id: String,
    pub blob_endpoint: String,
}

/// Create the resource group, storage account, virtual network and subnet,
/// in that order, and read the subnet back
pub async fn create_needed_resources(session: &Session) -> anyhow::Result<Foundation> {
    let settings = &session.settings;
    let clients = &session.clients;
    let group = session.group();

    println!("{}", "Create needed resources".bold());

    println!("\tCreate resource group '{}'...", group);
    let created_group = clients
        .groups
        .create_or_update(group, &ResourceGroup::new(&settings.location))
        .await
        .with_context(|| format!("resource group create failed for '{}'", group))?;
    println!("\tCreated resource group '{}' successfully", group.green());

    let account_name = &settings.storage_account;
    println!("\tCreate storage account '{}'...", account_name);
    let account = clients
        .accounts
        .create(
            group,
            account_name,
            &StorageAccountCreateParameters::standard_lrs(&settings.location),
        )
        .await
        .with_context(|| format!("storage account create failed for '{}'", account_name))?;
    println!(
        "\tCreated storage account '{}' successfully",
        account_name.green()
    );

    let vnet_name = &settings.virtual_network;
    println!("\tCreate virtual network '{}'...", vnet_name);
    let vnet = clients
        .virtual_networks
        .create_or_update(
            group,
            vnet_name,
            &VirtualNetwork::new(&settings.location, vec![settings.vnet_prefix.clone()]),
        )
        .await
        .with_context(|| format!("virtual network create failed for '{}'", vnet_name))?;
    println!(
        "\tCreated virtual network '{}' successfully",
        vnet_name.green()
    );

    let subnet_name = &settings.subnet;
    println!("\tCreate subnet '{}'...", subnet_name);
    clients
        .subnets
        .create_or_update(
            group,
            vnet_name,
            subnet_name,
            &Subnet::with_prefix(&settings.subnet_prefix),
        )
        .await
        .with_context(|| format!("subnet create failed for '{}'", subnet_name))?;
    println!("\tCreated subnet '{}'", subnet_name.green());

    println!("\tGet subnet info for subnet '{}'...", subnet_name);
    let subnet = clients
        .subnets
        .get(group, vnet_name, subnet_name)
        .await
        .with_context(|| format!("subnet get failed for '{}'", subnet_name))?;
    let subnet_id = subnet
        .id
        .with_context(|| format!("subnet '{}' has no resource id", subnet_name))?;

    Ok(Foundation {
        group_id: created_group.id.unwrap_or_default(),
        storage_account_id: account.id.clone().unwrap_or_default(),
        virtual_network_id: vnet.id.unwrap_or_default(),
        subnet_id,
        blob_endpoint: account
            .blob_endpoint()
            .map(str::to_string)
            .unwrap_or_else(|| settings.blob_endpoint()),
    })
}
