//! The fixed per-VM operation sequence
//!
//! Every step works on the same in-memory model read at the start, so a
//! later write-back still carries the tags set by an earlier one.

use super::listing::print_vm;
use super::machines::DISK_SKU;
use crate::session::Session;
use anyhow::Context;
use colored::Colorize;
use futures_util::future::try_join_all;
use vmflow_cloud_azure::compute::ManagedDiskParameters;
use vmflow_cloud_azure::{DataDisk, VirtualMachine};
use vmflow_config::{DiskLayout, Settings};

/// Size used when the service reports no usable OS disk size
const DEFAULT_OS_DISK_GB: i32 = 256;
const OS_DISK_GROWTH_GB: i32 = 10;
const DATA_DISK_GB: i32 = 1;

pub const SAMPLE_TAGS: [(&str, &str); 2] = [("who rocks", "rust"), ("where", "on azure")];

pub fn apply_sample_tags(vm: &mut VirtualMachine) {
    vm.tags = SAMPLE_TAGS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
}

/// Empty 1 GB disk at LUN 0, stored the way the settings lay out disks
pub fn sample_data_disk(settings: &Settings, vm_name: &str) -> DataDisk {
    match settings.disk_layout {
        DiskLayout::Managed => {
            let mut disk = DataDisk::empty(0, format!("dataDisk-{}", vm_name), DATA_DISK_GB);
            disk.managed_disk = Some(ManagedDiskParameters {
                id: None,
                storage_account_type: Some(DISK_SKU.to_string()),
            });
            disk
        }
        DiskLayout::Vhd => DataDisk::empty(0, "dataDisk", DATA_DISK_GB)
            .with_vhd(settings.vhd_uri(&format!("dataDisks-{}", vm_name))),
    }
}

/// Next OS disk size: absent or non-positive counts as 256 GB, then grow by 10 GB
pub fn grown_os_disk_size(current: Option<i32>) -> i32 {
    let size = current.unwrap_or(0);
    let size = if size <= 0 { DEFAULT_OS_DISK_GB } else { size };
    size + OS_DISK_GROWTH_GB
}

async fn write_back(session: &Session, name: &str, vm: &VirtualMachine) -> anyhow::Result<()> {
    session
        .clients
        .vms
        .create_or_update(session.group(), name, vm)
        .await
        .with_context(|| format!("VM update failed for '{}'", name))?;
    Ok(())
}

pub async fn get_vm(session: &Session, name: &str) -> anyhow::Result<VirtualMachine> {
    println!("Get VM '{}' by name", name);
    let vm = session
        .clients
        .vms
        .get(session.group(), name)
        .await
        .with_context(|| format!("VM get failed for '{}'", name))?;
    print_vm(&vm);
    Ok(vm)
}

pub async fn tag_vm(session: &Session, name: &str, vm: &mut VirtualMachine) -> anyhow::Result<()> {
    println!("Tag VM '{}' (via CreateOrUpdate operation)", name);
    apply_sample_tags(vm);
    write_back(session, name, vm).await
}

pub async fn attach_data_disk(
    session: &Session,
    name: &str,
    vm: &mut VirtualMachine,
) -> anyhow::Result<()> {
    println!("Attach data disk to VM '{}' (via CreateOrUpdate operation)", name);
    vm.set_data_disks(vec![sample_data_disk(&session.settings, name)]);
    write_back(session, name, vm).await
}

pub async fn detach_data_disks(
    session: &Session,
    name: &str,
    vm: &mut VirtualMachine,
) -> anyhow::Result<()> {
    println!("Detach data disks from VM '{}' (via CreateOrUpdate operation)", name);
    vm.set_data_disks(Vec::new());
    write_back(session, name, vm).await
}

pub async fn update_os_disk_size(
    session: &Session,
    name: &str,
    vm: &mut VirtualMachine,
) -> anyhow::Result<()> {
    println!(
        "Update OS disk size for VM '{}' (via Deallocate and CreateOrUpdate operations)",
        name
    );
    session
        .clients
        .vms
        .deallocate(session.group(), name)
        .await
        .with_context(|| format!("VM deallocate failed for '{}'", name))?;

    let os_disk = vm.os_disk_mut();
    os_disk.disk_size_gb = Some(grown_os_disk_size(os_disk.disk_size_gb));
    write_back(session, name, vm).await
}

pub async fn start_vm(session: &Session, name: &str) -> anyhow::Result<()> {
    println!("Start VM '{}'...", name);
    session
        .clients
        .vms
        .start(session.group(), name)
        .await
        .with_context(|| format!("VM start failed for '{}'", name))
}

pub async fn restart_vm(session: &Session, name: &str) -> anyhow::Result<()> {
    println!("Restart VM '{}'...", name);
    session
        .clients
        .vms
        .restart(session.group(), name)
        .await
        .with_context(|| format!("VM restart failed for '{}'", name))
}

pub async fn stop_vm(session: &Session, name: &str) -> anyhow::Result<()> {
    println!("Stop VM '{}'...", name);
    session
        .clients
        .vms
        .power_off(session.group(), name)
        .await
        .with_context(|| format!("VM power off failed for '{}'", name))
}

/// Run the whole sequence on one VM, strictly in order
pub async fn vm_operations(session: &Session, name: &str) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("Performing various operations on '{}' VM", name).bold()
    );

    let mut vm = get_vm(session, name).await?;
    tag_vm(session, name, &mut vm).await?;
    attach_data_disk(session, name, &mut vm).await?;
    detach_data_disks(session, name, &mut vm).await?;
    update_os_disk_size(session, name, &mut vm).await?;
    start_vm(session, name).await?;
    restart_vm(session, name).await?;
    stop_vm(session, name).await?;

    Ok(())
}

/// Run the sequence on every named VM concurrently
pub async fn run_all(session: &Session, names: &[String]) -> anyhow::Result<()> {
    try_join_all(names.iter().map(|name| vm_operations(session, name))).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::session;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    const VM: &str =
        "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/linuxVM";

    /// Records every PUT body and echoes it back
    #[derive(Clone, Default)]
    struct RecordPuts(Arc<Mutex<Vec<Value>>>);

    impl Respond for RecordPuts {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body: Value = serde_json::from_slice(&request.body).unwrap();
            self.0.lock().unwrap().push(body.clone());
            ResponseTemplate::new(200).set_body_json(body)
        }
    }

    #[test]
    fn test_grown_os_disk_size() {
        assert_eq!(grown_os_disk_size(None), 266);
        assert_eq!(grown_os_disk_size(Some(0)), 266);
        assert_eq!(grown_os_disk_size(Some(-4)), 266);
        assert_eq!(grown_os_disk_size(Some(30)), 40);
    }

    #[test]
    fn test_sample_tags_replace_existing() {
        let mut vm = VirtualMachine::default();
        vm.tags.insert("old".to_string(), "tag".to_string());
        apply_sample_tags(&mut vm);

        assert_eq!(vm.tags.len(), 2);
        assert_eq!(vm.tags["who rocks"], "rust");
        assert_eq!(vm.tags["where"], "on azure");
    }

    #[test]
    fn test_sample_data_disk_layouts() {
        let managed = sample_data_disk(&Settings::default(), "linuxVM");
        assert_eq!(managed.lun, 0);
        assert_eq!(managed.disk_size_gb, Some(1));
        assert_eq!(managed.name.as_deref(), Some("dataDisk-linuxVM"));
        assert!(managed.vhd.is_none());

        let settings = Settings {
            disk_layout: DiskLayout::Vhd,
            ..Default::default()
        };
        let vhd = sample_data_disk(&settings, "linuxVM");
        assert_eq!(vhd.name.as_deref(), Some("dataDisk"));
        assert_eq!(vhd.create_option, "Empty");
        assert_eq!(
            vhd.vhd.unwrap().uri,
            "https://vmflowsamplestore.blob.core.windows.net/vhds/dataDisks-linuxVM.vhd"
        );
    }

    #[tokio::test]
    async fn test_vm_operations_sequence() {
        let server = MockServer::start().await;
        let puts = RecordPuts::default();

        Mock::given(method("GET"))
            .and(path(VM))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": VM,
                "name": "linuxVM",
                "type": "Microsoft.Compute/virtualMachines",
                "location": "eastus",
                "properties": {
                    "storageProfile": {
                        "osDisk": {"createOption": "FromImage", "diskSizeGB": 30}
                    },
                    "instanceView": {"statuses": [{"code": "PowerState/running"}]}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(VM))
            .respond_with(puts.clone())
            .expect(4)
            .mount(&server)
            .await;
        for action in ["deallocate", "start", "restart", "powerOff"] {
            Mock::given(method("POST"))
                .and(path(format!("{}/{}", VM, action)))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&server)
                .await;
        }

        vm_operations(&session(&server.uri()), "linuxVM").await.unwrap();

        let bodies = puts.0.lock().unwrap();
        let tags = json!({"who rocks": "rust", "where": "on azure"});
        for body in bodies.iter() {
            assert_eq!(body["tags"], tags);
            assert!(body["properties"].get("instanceView").is_none());
        }

        let disks = |i: usize| bodies[i]["properties"]["storageProfile"]["dataDisks"].clone();
        assert_eq!(disks(0), Value::Null);
        assert_eq!(disks(1)[0]["lun"], 0);
        assert_eq!(disks(1)[0]["createOption"], "Empty");
        assert_eq!(disks(2), json!([]));
        assert_eq!(disks(3), json!([]));
        assert_eq!(
            bodies[3]["properties"]["storageProfile"]["osDisk"]["diskSizeGB"],
            40
        );
    }

    #[tokio::test]
    async fn test_failed_step_stops_the_sequence() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(VM))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": VM,
                "name": "linuxVM",
                "location": "eastus"
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(VM))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": {"code": "OperationNotAllowed", "message": "busy"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = vm_operations(&session(&server.uri()), "linuxVM")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "VM update failed for 'linuxVM'");
    }
}
