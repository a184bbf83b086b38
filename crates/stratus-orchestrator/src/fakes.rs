//! In-memory collaborators for tests
//!
//! One [`FakeCloud`] implements every remote trait, records each call in an
//! ordered log, and exposes knobs for the failure modes the orchestrators
//! must survive: absent resources, never-acknowledged deployments, stuck or
//! failed async jobs, and injected per-call errors.

use crate::api::{
    CatalogApi, CloudApis, Deployment, DeploymentApi, DeploymentDependency, ImageRow,
    NetworkInterfaceApi, PublicIpAddress, PublicIpApi, ResourceGroup, ResourceGroupApi,
    StorageAccountApi, VirtualMachine, VirtualMachineApi, VirtualNetworkApi, VmInstanceView,
    VmSizeRow,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use stratus_common::{ApiError, ApiResult, AsyncJobHandle, JobStatus, ProvisioningState};

#[derive(Default)]
pub struct FakeCloud {
    calls: Mutex<Vec<String>>,
    fail_call: Mutex<Option<String>>,

    groups: Mutex<BTreeMap<String, ResourceGroup>>,
    deployments: Mutex<BTreeMap<String, Deployment>>,
    never_acknowledge: Mutex<bool>,
    ack_after_polls: Mutex<u32>,
    default_dependencies: Mutex<Vec<DeploymentDependency>>,

    vm_absent: Mutex<bool>,
    nic_absent: Mutex<bool>,
    vm_delete_job: Mutex<Option<AsyncJobHandle>>,
    nic_delete_job: Mutex<Option<AsyncJobHandle>>,

    job_pending: Mutex<BTreeMap<String, u32>>,
    job_final: Mutex<BTreeMap<String, JobStatus>>,

    public_ips: Mutex<BTreeMap<String, PublicIpAddress>>,
    vms: Mutex<BTreeMap<String, VirtualMachine>>,
    instance_views: Mutex<BTreeMap<String, VmInstanceView>>,

    locations: Mutex<Vec<String>>,
    sizes: Mutex<Vec<VmSizeRow>>,
    images: Mutex<Vec<ImageRow>>,
}

impl FakeCloud {
    /// Bundle one shared fake into the collaborator set the orchestrators
    /// take
    pub fn apis(cloud: &Arc<FakeCloud>) -> CloudApis {
        CloudApis {
            groups: cloud.clone(),
            deployments: cloud.clone(),
            storage: cloud.clone(),
            public_ips: cloud.clone(),
            nics: cloud.clone(),
            vms: cloud.clone(),
            virtual_networks: cloud.clone(),
            jobs: cloud.clone(),
            catalog: cloud.clone(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Make every call whose log line starts with `prefix` fail
    pub fn set_fail_call(&self, prefix: &str) {
        *self.fail_call.lock() = Some(prefix.to_string());
    }

    /// Deployment gets answer `None` forever
    pub fn set_never_acknowledge(&self, v: bool) {
        *self.never_acknowledge.lock() = v;
    }

    /// Deployment gets answer `None` for the first `n` polls
    pub fn set_ack_after_polls(&self, n: u32) {
        *self.ack_after_polls.lock() = n;
    }

    /// Dependencies attached to deployments created through the fake
    pub fn set_deployment_dependencies(&self, deps: Vec<DeploymentDependency>) {
        *self.default_dependencies.lock() = deps;
    }

    pub fn insert_group(&self, group: ResourceGroup) {
        self.groups.lock().insert(group.name.clone(), group);
    }

    pub fn insert_deployment(&self, group: &str, deployment: Deployment) {
        self.deployments
            .lock()
            .insert(format!("{}/{}", group, deployment.name), deployment);
    }

    pub fn insert_public_ip(&self, group: &str, ip: PublicIpAddress) {
        self.public_ips
            .lock()
            .insert(format!("{}/{}", group, ip.name), ip);
    }

    pub fn insert_instance_view(&self, group: &str, name: &str, view: VmInstanceView) {
        self.instance_views
            .lock()
            .insert(format!("{}/{}", group, name), view);
    }

    pub fn set_vm_absent(&self, v: bool) {
        *self.vm_absent.lock() = v;
    }

    pub fn set_nic_absent(&self, v: bool) {
        *self.nic_absent.lock() = v;
    }

    pub fn set_vm_delete_job(&self, handle: AsyncJobHandle) {
        *self.vm_delete_job.lock() = Some(handle);
    }

    pub fn set_nic_delete_job(&self, handle: AsyncJobHandle) {
        *self.nic_delete_job.lock() = Some(handle);
    }

    /// The job answers `InProgress` for the first `n` status calls
    pub fn set_job_pending_polls(&self, handle: &AsyncJobHandle, n: u32) {
        self.job_pending.lock().insert(handle.uri().to_string(), n);
    }

    /// Terminal status the job settles on (default `Done`)
    pub fn set_job_final_status(&self, handle: &AsyncJobHandle, status: JobStatus) {
        self.job_final.lock().insert(handle.uri().to_string(), status);
    }

    pub fn set_locations(&self, locations: &[&str]) {
        *self.locations.lock() = locations.iter().map(|s| s.to_string()).collect();
    }

    pub fn set_sizes(&self, sizes: Vec<VmSizeRow>) {
        *self.sizes.lock() = sizes;
    }

    pub fn set_images(&self, images: Vec<ImageRow>) {
        *self.images.lock() = images;
    }

    fn log_and_check(&self, call: String) -> ApiResult<()> {
        self.calls.lock().push(call.clone());
        if let Some(prefix) = self.fail_call.lock().as_deref() {
            if call.starts_with(prefix) {
                return Err(ApiError::remote(&call, "injected failure"));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceGroupApi for FakeCloud {
    async fn get(&self, name: &str) -> ApiResult<Option<ResourceGroup>> {
        self.log_and_check(format!("group.get {}", name))?;
        Ok(self.groups.lock().get(name).cloned())
    }

    async fn create(
        &self,
        name: &str,
        location: &str,
        tags: &BTreeMap<String, String>,
    ) -> ApiResult<ResourceGroup> {
        self.log_and_check(format!("group.create {}", name))?;
        let group = ResourceGroup {
            id: format!("/resourceGroups/{}", name),
            name: name.to_string(),
            location: location.to_string(),
            tags: tags.clone(),
        };
        self.groups.lock().insert(name.to_string(), group.clone());
        Ok(group)
    }

    async fn list(&self) -> ApiResult<Vec<ResourceGroup>> {
        self.log_and_check("group.list".to_string())?;
        Ok(self.groups.lock().values().cloned().collect())
    }
}

#[async_trait]
impl DeploymentApi for FakeCloud {
    async fn create(&self, group: &str, name: &str, _body: &serde_json::Value) -> ApiResult<()> {
        self.log_and_check(format!("deployment.create {}/{}", group, name))?;
        let deployment = Deployment {
            id: format!("/resourceGroups/{}/deployments/{}", group, name),
            name: name.to_string(),
            provisioning_state: ProvisioningState::Accepted,
            dependencies: self.default_dependencies.lock().clone(),
            timestamp: None,
        };
        self.insert_deployment(group, deployment);
        Ok(())
    }

    async fn get(&self, group: &str, name: &str) -> ApiResult<Option<Deployment>> {
        self.log_and_check(format!("deployment.get {}/{}", group, name))?;
        if *self.never_acknowledge.lock() {
            return Ok(None);
        }
        {
            let mut remaining = self.ack_after_polls.lock();
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(None);
            }
        }
        Ok(self
            .deployments
            .lock()
            .get(&format!("{}/{}", group, name))
            .cloned())
    }

    async fn list(&self, group: &str) -> ApiResult<Vec<Deployment>> {
        self.log_and_check(format!("deployment.list {}", group))?;
        let prefix = format!("{}/", group);
        Ok(self
            .deployments
            .lock()
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(_, d)| d.clone())
            .collect())
    }

    async fn delete(&self, group: &str, name: &str) -> ApiResult<()> {
        self.log_and_check(format!("deployment.delete {}/{}", group, name))?;
        self.deployments.lock().remove(&format!("{}/{}", group, name));
        Ok(())
    }
}

#[async_trait]
impl StorageAccountApi for FakeCloud {
    async fn delete(&self, group: &str, name: &str) -> ApiResult<()> {
        self.log_and_check(format!("storage.delete {}/{}", group, name))
    }
}

#[async_trait]
impl PublicIpApi for FakeCloud {
    async fn get(&self, group: &str, name: &str) -> ApiResult<Option<PublicIpAddress>> {
        self.log_and_check(format!("publicip.get {}/{}", group, name))?;
        Ok(self
            .public_ips
            .lock()
            .get(&format!("{}/{}", group, name))
            .cloned())
    }

    async fn delete(&self, group: &str, name: &str) -> ApiResult<()> {
        self.log_and_check(format!("publicip.delete {}/{}", group, name))
    }
}

#[async_trait]
impl NetworkInterfaceApi for FakeCloud {
    async fn delete(&self, group: &str, name: &str) -> ApiResult<Option<AsyncJobHandle>> {
        self.log_and_check(format!("nic.delete {}/{}", group, name))?;
        if *self.nic_absent.lock() {
            return Ok(None);
        }
        Ok(self.nic_delete_job.lock().clone())
    }
}

#[async_trait]
impl VirtualMachineApi for FakeCloud {
    async fn get(&self, group: &str, name: &str) -> ApiResult<Option<VirtualMachine>> {
        self.log_and_check(format!("vm.get {}/{}", group, name))?;
        Ok(self.vms.lock().get(&format!("{}/{}", group, name)).cloned())
    }

    async fn instance_view(&self, group: &str, name: &str) -> ApiResult<Option<VmInstanceView>> {
        self.log_and_check(format!("vm.instance_view {}/{}", group, name))?;
        Ok(self
            .instance_views
            .lock()
            .get(&format!("{}/{}", group, name))
            .cloned())
    }

    async fn delete(&self, group: &str, name: &str) -> ApiResult<Option<AsyncJobHandle>> {
        self.log_and_check(format!("vm.delete {}/{}", group, name))?;
        if *self.vm_absent.lock() {
            return Ok(None);
        }
        Ok(Some(
            self.vm_delete_job
                .lock()
                .clone()
                .unwrap_or_else(|| AsyncJobHandle::new("jobs/vm-delete")),
        ))
    }

    async fn restart(&self, group: &str, name: &str) -> ApiResult<Option<AsyncJobHandle>> {
        self.log_and_check(format!("vm.restart {}/{}", group, name))?;
        if *self.vm_absent.lock() {
            return Ok(None);
        }
        Ok(Some(AsyncJobHandle::new("jobs/vm-restart")))
    }
}

#[async_trait]
impl VirtualNetworkApi for FakeCloud {
    async fn delete(&self, group: &str, name: &str) -> ApiResult<()> {
        self.log_and_check(format!("vnet.delete {}/{}", group, name))
    }
}

#[async_trait]
impl crate::api::JobApi for FakeCloud {
    async fn status(&self, handle: &AsyncJobHandle) -> ApiResult<JobStatus> {
        self.log_and_check(format!("job.status {}", handle.uri()))?;
        {
            let mut pending = self.job_pending.lock();
            if let Some(remaining) = pending.get_mut(handle.uri()) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Ok(JobStatus::InProgress);
                }
            }
        }
        Ok(self
            .job_final
            .lock()
            .get(handle.uri())
            .copied()
            .unwrap_or(JobStatus::Done))
    }
}

#[async_trait]
impl CatalogApi for FakeCloud {
    async fn locations(&self) -> ApiResult<Vec<String>> {
        self.log_and_check("catalog.locations".to_string())?;
        Ok(self.locations.lock().clone())
    }

    async fn vm_sizes(&self, location: &str) -> ApiResult<Vec<VmSizeRow>> {
        self.log_and_check(format!("catalog.vm_sizes {}", location))?;
        Ok(self
            .sizes
            .lock()
            .iter()
            .filter(|s| s.location == location)
            .cloned()
            .collect())
    }

    async fn images(&self, location: &str) -> ApiResult<Vec<ImageRow>> {
        self.log_and_check(format!("catalog.images {}", location))?;
        Ok(self
            .images
            .lock()
            .iter()
            .filter(|i| i.location == location)
            .cloned()
            .collect())
    }
}
