//! Storage accounts (Microsoft.Storage)

use crate::error::Result;
use crate::pipeline::ArmClient;
use serde::{Deserialize, Serialize};

const API_VERSION: &str = "2023-01-01";

pub const STANDARD_LRS: &str = "Standard_LRS";
pub const STORAGE_V2: &str = "StorageV2";

/// Body of a storage account create request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountCreateParameters {
    pub sku: Sku,
    pub kind: String,
    pub location: String,
    pub properties: StorageAccountCreateProperties,
}

impl StorageAccountCreateParameters {
    /// Locally-redundant general purpose v2 account
    pub fn standard_lrs(location: impl Into<String>) -> Self {
        Self {
            sku: Sku {
                name: STANDARD_LRS.to_string(),
            },
            kind: STORAGE_V2.to_string(),
            location: location.into(),
            properties: StorageAccountCreateProperties::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountCreateProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_tls_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sku {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccount {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub sku: Option<Sku>,
    pub kind: Option<String>,
    pub properties: Option<StorageAccountProperties>,
}

impl StorageAccount {
    pub fn blob_endpoint(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|p| p.primary_endpoints.as_ref())
            .and_then(|e| e.blob.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountProperties {
    pub provisioning_state: Option<String>,
    pub primary_endpoints: Option<Endpoints>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Endpoints {
    pub blob: Option<String>,
}

/// Client for storage account operations
#[derive(Clone)]
pub struct StorageAccountsClient {
    arm: ArmClient,
}

impl StorageAccountsClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    fn url(&self, group: &str, name: &str) -> String {
        format!(
            "{}?api-version={}",
            self.arm.provider_url(
                group,
                &format!("Microsoft.Storage/storageAccounts/{}", name)
            ),
            API_VERSION
        )
    }

    /// Create the account; returns once provisioning has finished
    pub async fn create(
        &self,
        group: &str,
        name: &str,
        parameters: &StorageAccountCreateParameters,
    ) -> Result<StorageAccount> {
        tracing::info!("Creating storage account {} in {}", name, group);
        self.arm.put(&self.url(group, name), parameters).await
    }

    pub async fn get_properties(&self, group: &str, name: &str) -> Result<StorageAccount> {
        self.arm.get(&self.url(group, name)).await
    }

    pub async fn delete(&self, group: &str, name: &str) -> Result<()> {
        self.arm.delete(&self.url(group, name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::arm_client;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ACCOUNT_PATH: &str =
        "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Storage/storageAccounts/store01";

    #[test]
    fn test_create_parameters_shape() {
        let body = serde_json::to_value(StorageAccountCreateParameters::standard_lrs("eastus")).unwrap();
        assert_eq!(
            body,
            json!({
                "sku": {"name": "Standard_LRS"},
                "kind": "StorageV2",
                "location": "eastus",
                "properties": {}
            })
        );
    }

    #[tokio::test]
    async fn test_create_waits_for_location() {
        let server = MockServer::start().await;
        let location = format!("{}/operations/storage-op", server.uri());

        Mock::given(method("PUT"))
            .and(path(ACCOUNT_PATH))
            .and(body_json(json!({
                "sku": {"name": "Standard_LRS"},
                "kind": "StorageV2",
                "location": "eastus",
                "properties": {}
            })))
            .respond_with(ResponseTemplate::new(202).insert_header("Location", location.as_str()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/storage-op"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(ACCOUNT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "store01",
                "properties": {
                    "provisioningState": "Succeeded",
                    "primaryEndpoints": {"blob": "https://store01.blob.core.windows.net/"}
                }
            })))
            .mount(&server)
            .await;

        let client = StorageAccountsClient::new(arm_client(&server.uri()));
        let account = client
            .create("rg", "store01", &StorageAccountCreateParameters::standard_lrs("eastus"))
            .await
            .unwrap();

        assert_eq!(account.blob_endpoint(), Some("https://store01.blob.core.windows.net/"));
    }
}
