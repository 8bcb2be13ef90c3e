//! Azure Resource Manager provider for VMFlow
//!
//! This crate talks to the ARM REST API directly over `reqwest`: a service
//! principal token from the Microsoft identity platform, one shared
//! [`ArmClient`] pipeline, and a typed client per resource type.
//!
//! # Requirements
//!
//! - `AZURE_TENANT_ID`, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET` and
//!   `AZURE_SUBSCRIPTION_ID` env vars
//!
//! # Example
//!
//! ```ignore
//! use vmflow_cloud::CloudProvider;
//! use vmflow_cloud_azure::{AzureClients, AzureProvider, PollOptions};
//!
//! let clients = AzureClients::from_env(PollOptions::default())?;
//! let subnet = clients.subnets.get("sample-group1", "vNet", "subnet").await?;
//!
//! let provider = AzureProvider::new(clients, "sample-group1");
//! let state = provider.get_state().await?;
//! ```

pub mod clients;
pub mod compute;
pub mod credential;
pub mod error;
pub mod groups;
pub mod network;
pub mod pipeline;
pub mod provider;
pub mod storage;

pub use clients::AzureClients;
pub use compute::{
    BootDiagnostics, DataDisk, DiagnosticsProfile, HardwareProfile, ImageReference,
    ManagedDiskParameters, NetworkInterfaceReference, NetworkProfile, OsDisk, OsProfile,
    StorageProfile, VirtualHardDisk, VirtualMachine, VirtualMachineProperties,
    VirtualMachinesClient,
};
pub use credential::{ClientSecretCredential, EnvironmentCredentials, TokenCredential};
pub use error::{AzureError, Result};
pub use groups::{ResourceGroup, ResourceGroupsClient};
pub use network::{
    NetworkInterface, NetworkInterfacesClient, PublicIpAddress, PublicIpAddressesClient,
    Subnet, SubnetsClient, VirtualNetwork, VirtualNetworksClient,
};
pub use pipeline::{ArmClient, PollOptions};
pub use provider::{AzureProvider, PROVIDER_NAME, VM_RESOURCE_TYPE};
pub use storage::{StorageAccount, StorageAccountCreateParameters, StorageAccountsClient};
