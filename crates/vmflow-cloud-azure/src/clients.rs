//! One typed client per resource type, sharing a single pipeline

use crate::compute::VirtualMachinesClient;
use crate::credential::{ClientSecretCredential, EnvironmentCredentials, TokenCredential};
use crate::error::Result;
use crate::groups::ResourceGroupsClient;
use crate::network::{
    NetworkInterfacesClient, PublicIpAddressesClient, SubnetsClient, VirtualNetworksClient,
};
use crate::pipeline::{ArmClient, PollOptions};
use crate::storage::StorageAccountsClient;
use std::sync::Arc;

#[derive(Clone)]
pub struct AzureClients {
    pub arm: ArmClient,
    pub groups: ResourceGroupsClient,
    pub accounts: StorageAccountsClient,
    pub virtual_networks: VirtualNetworksClient,
    pub subnets: SubnetsClient,
    pub addresses: PublicIpAddressesClient,
    pub interfaces: NetworkInterfacesClient,
    pub vms: VirtualMachinesClient,
}

impl AzureClients {
    pub fn new(arm: ArmClient) -> Self {
        Self {
            groups: ResourceGroupsClient::new(arm.clone()),
            accounts: StorageAccountsClient::new(arm.clone()),
            virtual_networks: VirtualNetworksClient::new(arm.clone()),
            subnets: SubnetsClient::new(arm.clone()),
            addresses: PublicIpAddressesClient::new(arm.clone()),
            interfaces: NetworkInterfacesClient::new(arm.clone()),
            vms: VirtualMachinesClient::new(arm.clone()),
            arm,
        }
    }

    /// Build every client from the `AZURE_*` environment variables
    pub fn from_env(poll: PollOptions) -> Result<Self> {
        let credentials = EnvironmentCredentials::from_env()?;
        tracing::debug!(
            "Using subscription {} with client {}",
            credentials.subscription_id,
            credentials.client_id
        );

        let credential: Arc<dyn TokenCredential> =
            Arc::new(ClientSecretCredential::from_credentials(&credentials));
        let arm = ArmClient::new(credentials.subscription_id, credential).with_poll_options(poll);

        Ok(Self::new(arm))
    }

    pub fn subscription_id(&self) -> &str {
        self.arm.subscription_id()
    }
}
