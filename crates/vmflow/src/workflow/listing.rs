use crate::session::Session;
use anyhow::Context;
use std::fmt::Write;
use vmflow_cloud_azure::VirtualMachine;

/// Basic VM details, tags sorted by key
pub fn format_vm(vm: &VirtualMachine) -> String {
    let mut tags = String::new();
    if vm.tags.is_empty() {
        tags.push_str("\t\tNo tags yet\n");
    } else {
        for (key, value) in &vm.tags {
            let _ = writeln!(tags, "\t\t{} = {}", key, value);
        }
    }

    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    format!(
        "Virtual machine '{}'\n\tID: {}\n\tType: {}\n\tLocation: {}\n\tTags:\n{}",
        vm.name(),
        field(&vm.id),
        field(&vm.resource_type),
        vm.location,
        tags
    )
}

pub fn print_vm(vm: &VirtualMachine) {
    print!("{}", format_vm(vm));
}

/// List every VM in the subscription
pub async fn list_vms(session: &Session) -> anyhow::Result<Vec<VirtualMachine>> {
    println!("List VMs in subscription...");
    let vms = session
        .clients
        .vms
        .list_all()
        .await
        .context("VM list failed for the subscription")?;

    if vms.is_empty() {
        println!("There are no VMs in this subscription");
    } else {
        println!("VMs in subscription");
        for vm in &vms {
            print_vm(vm);
        }
    }
    Ok(vms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::session;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn vm(tags: serde_json::Value) -> VirtualMachine {
        serde_json::from_value(json!({
            "id": "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/linuxVM",
            "name": "linuxVM",
            "type": "Microsoft.Compute/virtualMachines",
            "location": "eastus",
            "tags": tags
        }))
        .unwrap()
    }

    #[test]
    fn test_format_vm_without_tags() {
        assert_eq!(
            format_vm(&vm(json!({}))),
            "Virtual machine 'linuxVM'\n\
             \tID: /subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/linuxVM\n\
             \tType: Microsoft.Compute/virtualMachines\n\
             \tLocation: eastus\n\
             \tTags:\n\
             \t\tNo tags yet\n"
        );
    }

    #[test]
    fn test_format_vm_tags_in_key_order() {
        let text = format_vm(&vm(json!({"who rocks": "rust", "where": "on azure"})));
        assert!(text.ends_with("\tTags:\n\t\twhere = on azure\n\t\twho rocks = rust\n"));
    }

    #[tokio::test]
    async fn test_list_vms_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subscriptions/sub-1/providers/Microsoft.Compute/virtualMachines"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .expect(1)
            .mount(&server)
            .await;

        let vms = list_vms(&session(&server.uri())).await.unwrap();
        assert!(vms.is_empty());
    }
}
