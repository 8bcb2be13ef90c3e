//! Virtual networks, subnets, public IP addresses and network interfaces
//! (Microsoft.Network)

use crate::error::Result;
use crate::pipeline::ArmClient;
use serde::{Deserialize, Serialize};

const API_VERSION: &str = "2023-09-01";

pub const ALLOCATION_DYNAMIC: &str = "Dynamic";
pub const ALLOCATION_STATIC: &str = "Static";

/// Reference to another resource by ARM id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubResource {
    pub id: String,
}

impl SubResource {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

// ============ Virtual networks ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetwork {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    #[serde(default)]
    pub properties: VirtualNetworkProperties,
}

impl VirtualNetwork {
    pub fn new(location: impl Into<String>, address_prefixes: Vec<String>) -> Self {
        Self {
            location: location.into(),
            properties: VirtualNetworkProperties {
                address_space: AddressSpace { address_prefixes },
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    #[serde(default)]
    pub address_space: AddressSpace,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<Subnet>,
    #[serde(skip_serializing)]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    #[serde(default)]
    pub address_prefixes: Vec<String>,
}

// ============ Subnets ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: SubnetProperties,
}

impl Subnet {
    pub fn with_prefix(address_prefix: impl Into<String>) -> Self {
        Self {
            properties: SubnetProperties {
                address_prefix: Some(address_prefix.into()),
                provisioning_state: None,
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,
    #[serde(skip_serializing)]
    pub provisioning_state: Option<String>,
}

// ============ Public IP addresses ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<PublicIpSku>,
    #[serde(default)]
    pub properties: PublicIpAddressProperties,
}

impl PublicIpAddress {
    /// Standard-SKU static address with a DNS label
    pub fn with_dns_label(location: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            sku: Some(PublicIpSku {
                name: "Standard".to_string(),
            }),
            properties: PublicIpAddressProperties {
                public_ip_allocation_method: Some(ALLOCATION_STATIC.to_string()),
                dns_settings: Some(DnsSettings {
                    domain_name_label: Some(label.into()),
                    fqdn: None,
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn fqdn(&self) -> Option<&str> {
        self.properties
            .dns_settings
            .as_ref()
            .and_then(|d| d.fqdn.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicIpSku {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpAddressProperties {
    #[serde(
        rename = "publicIPAllocationMethod",
        skip_serializing_if = "Option::is_none"
    )]
    pub public_ip_allocation_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_settings: Option<DnsSettings>,
    #[serde(skip_serializing)]
    pub ip_address: Option<String>,
    #[serde(skip_serializing)]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name_label: Option<String>,
    #[serde(skip_serializing)]
    pub fqdn: Option<String>,
}

// ============ Network interfaces ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    #[serde(default)]
    pub properties: NetworkInterfaceProperties,
}

impl NetworkInterface {
    /// NIC with one dynamically addressed IP configuration
    pub fn single_ip(
        location: impl Into<String>,
        ip_config_name: impl Into<String>,
        subnet_id: impl Into<String>,
        public_ip_id: Option<String>,
    ) -> Self {
        Self {
            location: location.into(),
            properties: NetworkInterfaceProperties {
                ip_configurations: vec![IpConfiguration {
                    name: Some(ip_config_name.into()),
                    properties: IpConfigurationProperties {
                        private_ip_allocation_method: Some(ALLOCATION_DYNAMIC.to_string()),
                        subnet: Some(SubResource::new(subnet_id)),
                        public_ip_address: public_ip_id.map(SubResource::new),
                        private_ip_address: None,
                    },
                    ..Default::default()
                }],
                provisioning_state: None,
            },
            ..Default::default()
        }
    }

    pub fn private_ip(&self) -> Option<&str> {
        self.properties
            .ip_configurations
            .first()
            .and_then(|c| c.properties.private_ip_address.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceProperties {
    #[serde(default)]
    pub ip_configurations: Vec<IpConfiguration>,
    #[serde(skip_serializing)]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: IpConfigurationProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpConfigurationProperties {
    #[serde(
        rename = "privateIPAllocationMethod",
        skip_serializing_if = "Option::is_none"
    )]
    pub private_ip_allocation_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<SubResource>,
    #[serde(rename = "publicIPAddress", skip_serializing_if = "Option::is_none")]
    pub public_ip_address: Option<SubResource>,
    #[serde(rename = "privateIPAddress", skip_serializing)]
    pub private_ip_address: Option<String>,
}

// ============ Clients ============

fn network_url(arm: &ArmClient, group: &str, path: &str) -> String {
    format!(
        "{}?api-version={}",
        arm.provider_url(group, &format!("Microsoft.Network/{}", path)),
        API_VERSION
    )
}

/// Client for virtual network operations
#[derive(Clone)]
pub struct VirtualNetworksClient {
    arm: ArmClient,
}

impl VirtualNetworksClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    fn url(&self, group: &str, name: &str) -> String {
        network_url(&self.arm, group, &format!("virtualNetworks/{}", name))
    }

    pub async fn create_or_update(
        &self,
        group: &str,
        name: &str,
        vnet: &VirtualNetwork,
    ) -> Result<VirtualNetwork> {
        tracing::info!("Creating virtual network {} in {}", name, group);
        self.arm.put(&self.url(group, name), vnet).await
    }

    pub async fn get(&self, group: &str, name: &str) -> Result<VirtualNetwork> {
        self.arm.get(&self.url(group, name)).await
    }

    pub async fn delete(&self, group: &str, name: &str) -> Result<()> {
        self.arm.delete(&self.url(group, name)).await
    }
}

/// Client for subnet operations
#[derive(Clone)]
pub struct SubnetsClient {
    arm: ArmClient,
}

impl SubnetsClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    fn url(&self, group: &str, vnet: &str, name: &str) -> String {
        network_url(
            &self.arm,
            group,
            &format!("virtualNetworks/{}/subnets/{}", vnet, name),
        )
    }

    pub async fn create_or_update(
        &self,
        group: &str,
        vnet: &str,
        name: &str,
        subnet: &Subnet,
    ) -> Result<Subnet> {
        tracing::info!("Creating subnet {} in {}/{}", name, group, vnet);
        self.arm.put(&self.url(group, vnet, name), subnet).await
    }

    pub async fn get(&self, group: &str, vnet: &str, name: &str) -> Result<Subnet> {
        self.arm.get(&self.url(group, vnet, name)).await
    }

    pub async fn delete(&self, group: &str, vnet: &str, name: &str) -> Result<()> {
        self.arm.delete(&self.url(group, vnet, name)).await
    }
}

/// Client for public IP address operations
#[derive(Clone)]
pub struct PublicIpAddressesClient {
    arm: ArmClient,
}

impl PublicIpAddressesClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    fn url(&self, group: &str, name: &str) -> String {
        network_url(&self.arm, group, &format!("publicIPAddresses/{}", name))
    }

    pub async fn create_or_update(
        &self,
        group: &str,
        name: &str,
        address: &PublicIpAddress,
    ) -> Result<PublicIpAddress> {
        tracing::info!("Creating public IP address {} in {}", name, group);
        self.arm.put(&self.url(group, name), address).await
    }

    pub async fn get(&self, group: &str, name: &str) -> Result<PublicIpAddress> {
        self.arm.get(&self.url(group, name)).await
    }

    pub async fn delete(&self, group: &str, name: &str) -> Result<()> {
        self.arm.delete(&self.url(group, name)).await
    }
}

/// Client for network interface operations
#[derive(Clone)]
pub struct NetworkInterfacesClient {
    arm: ArmClient,
}

impl NetworkInterfacesClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    fn url(&self, group: &str, name: &str) -> String {
        network_url(&self.arm, group, &format!("networkInterfaces/{}", name))
    }

    pub async fn create_or_update(
        &self,
        group: &str,
        name: &str,
        nic: &NetworkInterface,
    ) -> Result<NetworkInterface> {
        tracing::info!("Creating network interface {} in {}", name, group);
        self.arm.put(&self.url(group, name), nic).await
    }

    pub async fn get(&self, group: &str, name: &str) -> Result<NetworkInterface> {
        self.arm.get(&self.url(group, name)).await
    }

    pub async fn delete(&self, group: &str, name: &str) -> Result<()> {
        self.arm.delete(&self.url(group, name)).await
    }
}
