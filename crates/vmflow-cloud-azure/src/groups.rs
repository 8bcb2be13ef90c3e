//! Resource groups (Microsoft.Resources)

use crate::error::Result;
use crate::pipeline::ArmClient;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const API_VERSION: &str = "2021-04-01";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(skip_serializing)]
    pub properties: Option<ResourceGroupProperties>,
}

impl ResourceGroup {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupProperties {
    pub provisioning_state: Option<String>,
}

/// Client for resource group operations
#[derive(Clone)]
pub struct ResourceGroupsClient {
    arm: ArmClient,
}

impl ResourceGroupsClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    fn url(&self, name: &str) -> String {
        format!(
            "{}?api-version={}",
            self.arm.resource_group_url(name),
            API_VERSION
        )
    }

    pub async fn create_or_update(&self, name: &str, group: &ResourceGroup) -> Result<ResourceGroup> {
        tracing::info!("Creating resource group {} in {}", name, group.location);
        self.arm.put(&self.url(name), group).await
    }

    pub async fn get(&self, name: &str) -> Result<ResourceGroup> {
        self.arm.get(&self.url(name)).await
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        self.arm.exists(&self.url(name)).await
    }

    /// Delete the group and everything in it
    pub async fn delete(&self, name: &str) -> Result<()> {
        tracing::info!("Deleting resource group {}", name);
        self.arm.delete(&self.url(name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::arm_client;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_or_update() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/subscriptions/sub-1/resourceGroups/sample-group1"))
            .and(query_param("api-version", API_VERSION))
            .and(body_json(json!({"location": "eastus"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "/subscriptions/sub-1/resourceGroups/sample-group1",
                "name": "sample-group1",
                "location": "eastus",
                "properties": {"provisioningState": "Succeeded"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ResourceGroupsClient::new(arm_client(&server.uri()));
        let group = client
            .create_or_update("sample-group1", &ResourceGroup::new("eastus"))
            .await
            .unwrap();

        assert_eq!(group.name.as_deref(), Some("sample-group1"));
        assert_eq!(
            group.properties.unwrap().provisioning_state.as_deref(),
            Some("Succeeded")
        );
    }
}
