//! External collaborator boundaries
//!
//! Every remote surface the orchestrator touches is a trait here; the
//! wire-level REST plumbing behind them (verbs, headers, auth tokens,
//! pagination) lives outside this crate. Two contract rules hold across all
//! of them:
//!
//! - a 404-style absence is `Ok(None)` / an empty list, never an error
//! - VM and NIC deletes (and VM restart) return an [`AsyncJobHandle`] to be
//!   polled instead of blocking

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use stratus_common::{ApiResult, AsyncJobHandle, JobStatus, PowerState, ProvisioningState};
use stratus_template::ResourceKind;

/// A resource group as reported by the remote side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGroup {
    /// Canonical resource id
    pub id: String,
    /// Group name
    pub name: String,
    /// Group location
    pub location: String,
    /// Group tags
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// A deployment as reported by the remote side.
///
/// Created once by the submission orchestrator; every transition afterwards
/// is driven remotely and only observed here through polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// Canonical resource id
    pub id: String,
    /// Deployment name
    pub name: String,
    /// Remote-reported lifecycle state
    pub provisioning_state: ProvisioningState,
    /// Resource dependency edges reported after provisioning
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DeploymentDependency>,
    /// Remote-reported creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Outer dependency edge of a deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentDependency {
    /// Kind of the dependent resource
    #[serde(rename = "resourceType")]
    pub resource_kind: ResourceKind,
    /// Name of the dependent resource
    pub resource_name: String,
    /// The dependent resource's own dependencies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependencyRef>,
}

/// Inner dependency edge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRef {
    /// Kind of the referenced resource
    #[serde(rename = "resourceType")]
    pub resource_kind: ResourceKind,
    /// Name of the referenced resource
    pub resource_name: String,
}

/// A public IP address as reported by the remote side
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpAddress {
    /// Canonical resource id
    pub id: String,
    /// Resource name
    pub name: String,
    /// Location
    pub location: String,
    /// Allocated address, absent until allocation completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

/// A virtual machine as reported by the remote side
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    /// Canonical resource id
    pub id: String,
    /// Resource name
    pub name: String,
    /// Location
    pub location: String,
    /// Remote-reported lifecycle state
    pub provisioning_state: ProvisioningState,
}

/// Runtime status codes of a VM
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VmInstanceView {
    /// Raw status codes, e.g. `PowerState/running`
    pub statuses: Vec<String>,
}

impl VmInstanceView {
    /// Power state parsed from the status codes
    pub fn power_state(&self) -> PowerState {
        self.statuses
            .iter()
            .find(|code| code.starts_with("PowerState/"))
            .map(|code| PowerState::from_code(code))
            .unwrap_or(PowerState::Unrecognized)
    }
}

/// One hardware size offering in one location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmSizeRow {
    /// Size name, the catalog key
    pub name: String,
    /// Location the row was listed in
    pub location: String,
    /// Core count
    pub cores: u32,
    /// Memory in MB
    pub memory_mb: u32,
}

/// One image offering in one location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRow {
    /// Image publisher
    pub publisher: String,
    /// Image offer, half of the catalog key
    pub offer: String,
    /// Image SKU, half of the catalog key
    pub sku: String,
    /// Location the row was listed in
    pub location: String,
}

/// Resource group get/create/list
#[async_trait]
pub trait ResourceGroupApi: Send + Sync {
    /// Fetch a group; absent groups are `None`
    async fn get(&self, name: &str) -> ApiResult<Option<ResourceGroup>>;
    /// Create a group
    async fn create(
        &self,
        name: &str,
        location: &str,
        tags: &BTreeMap<String, String>,
    ) -> ApiResult<ResourceGroup>;
    /// List all groups
    async fn list(&self) -> ApiResult<Vec<ResourceGroup>>;
}

/// Deployment submit/get/list/delete
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    /// Submit a serialized template body
    async fn create(&self, group: &str, name: &str, body: &serde_json::Value) -> ApiResult<()>;
    /// Fetch a deployment; absent deployments are `None`
    async fn get(&self, group: &str, name: &str) -> ApiResult<Option<Deployment>>;
    /// List deployments in a group
    async fn list(&self, group: &str) -> ApiResult<Vec<Deployment>>;
    /// Delete the deployment record
    async fn delete(&self, group: &str, name: &str) -> ApiResult<()>;
}

/// Storage account deletion (synchronous on the remote side)
#[async_trait]
pub trait StorageAccountApi: Send + Sync {
    /// Delete an account; deleting an absent account is a no-op
    async fn delete(&self, group: &str, name: &str) -> ApiResult<()>;
}

/// Public IP get/delete
#[async_trait]
pub trait PublicIpApi: Send + Sync {
    /// Fetch an address; absent addresses are `None`
    async fn get(&self, group: &str, name: &str) -> ApiResult<Option<PublicIpAddress>>;
    /// Delete an address
    async fn delete(&self, group: &str, name: &str) -> ApiResult<()>;
}

/// NIC deletion; returns a job handle instead of blocking
#[async_trait]
pub trait NetworkInterfaceApi: Send + Sync {
    /// Delete a NIC; `None` when the NIC never existed
    async fn delete(&self, group: &str, name: &str) -> ApiResult<Option<AsyncJobHandle>>;
}

/// VM get/delete/restart and instance view
#[async_trait]
pub trait VirtualMachineApi: Send + Sync {
    /// Fetch a VM; absent VMs are `None`
    async fn get(&self, group: &str, name: &str) -> ApiResult<Option<VirtualMachine>>;
    /// Fetch runtime status codes; absent VMs are `None`
    async fn instance_view(&self, group: &str, name: &str) -> ApiResult<Option<VmInstanceView>>;
    /// Delete a VM; `None` when the VM never existed
    async fn delete(&self, group: &str, name: &str) -> ApiResult<Option<AsyncJobHandle>>;
    /// Restart a VM; `None` when the VM never existed
    async fn restart(&self, group: &str, name: &str) -> ApiResult<Option<AsyncJobHandle>>;
}

/// Virtual network deletion (synchronous on the remote side)
#[async_trait]
pub trait VirtualNetworkApi: Send + Sync {
    /// Delete a network; deleting an absent network is a no-op
    async fn delete(&self, group: &str, name: &str) -> ApiResult<()>;
}

/// Async job status polling
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Current status of the job behind the handle
    async fn status(&self, handle: &AsyncJobHandle) -> ApiResult<JobStatus>;
}

/// Read-only catalog listings (paginated by the implementation)
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// All known locations
    async fn locations(&self) -> ApiResult<Vec<String>>;
    /// Hardware sizes offered in one location
    async fn vm_sizes(&self, location: &str) -> ApiResult<Vec<VmSizeRow>>;
    /// Images offered in one location
    async fn images(&self, location: &str) -> ApiResult<Vec<ImageRow>>;
}

/// The full set of remote collaborators, shared by the orchestrators
#[derive(Clone)]
pub struct CloudApis {
    /// Resource groups
    pub groups: Arc<dyn ResourceGroupApi>,
    /// Deployments
    pub deployments: Arc<dyn DeploymentApi>,
    /// Storage accounts
    pub storage: Arc<dyn StorageAccountApi>,
    /// Public IPs
    pub public_ips: Arc<dyn PublicIpApi>,
    /// NICs
    pub nics: Arc<dyn NetworkInterfaceApi>,
    /// VMs
    pub vms: Arc<dyn VirtualMachineApi>,
    /// Virtual networks
    pub virtual_networks: Arc<dyn VirtualNetworkApi>,
    /// Async jobs
    pub jobs: Arc<dyn JobApi>,
    /// Catalogs
    pub catalog: Arc<dyn CatalogApi>,
}
