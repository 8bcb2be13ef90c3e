use crate::session::Session;
use anyhow::Context;
use futures_util::future::try_join_all;

pub async fn delete_vm(session: &Session, name: &str) -> anyhow::Result<()> {
    println!("Delete '{}' virtual machine...", name);
    session
        .clients
        .vms
        .delete(session.group(), name)
        .await
        .with_context(|| format!("VM delete failed for '{}'", name))
}

/// Delete the named VMs concurrently, then the resource group with everything left in it
pub async fn delete_all(session: &Session, names: &[String]) -> anyhow::Result<()> {
    try_join_all(names.iter().map(|name| delete_vm(session, name))).await?;

    println!("Delete resource group...");
    session
        .clients
        .groups
        .delete(session.group())
        .await
        .with_context(|| format!("resource group delete failed for '{}'", session.group()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::session;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_delete_all() {
        let server = MockServer::start().await;
        let vms = "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines";
        for name in ["linuxVM", "windowsVM"] {
            Mock::given(method("DELETE"))
                .and(path(format!("{}/{}", vms, name)))
                .respond_with(ResponseTemplate::new(204))
                .expect(1)
                .mount(&server)
                .await;
        }
        Mock::given(method("DELETE"))
            .and(path("/subscriptions/sub-1/resourceGroups/rg"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let names = vec!["linuxVM".to_string(), "windowsVM".to_string()];
        delete_all(&session(&server.uri()), &names).await.unwrap();
    }

    #[tokio::test]
    async fn test_vm_failure_keeps_the_group() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(
                "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/linuxVM",
            ))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/subscriptions/sub-1/resourceGroups/rg"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = delete_all(&session(&server.uri()), &["linuxVM".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "VM delete failed for 'linuxVM'");
    }
}
