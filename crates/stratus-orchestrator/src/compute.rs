//! Compute service facade
//!
//! The node-facing surface the integration layer consumes: create (group
//! encoded into the node id), destroy, get, list, restart, plus catalog
//! sweeps. No state is held locally; every answer is re-derived from the
//! remote API, so an in-flight operation can always be resumed by a fresh
//! call.

use crate::api::{CloudApis, Deployment};
use crate::catalog::{aggregate_images, aggregate_sizes, ImageAvailability, SizeAvailability};
use crate::config::OrchestratorConfig;
use crate::deploy::{SubmissionOrchestrator, SubmitError};
use crate::jobs::{JobPoller, JobWaitError};
use crate::resolver::DependencyResolver;
use crate::teardown::{TeardownError, TeardownOrchestrator, TeardownReport};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use stratus_common::{
    ApiError, ApiResult, JobStatus, LoginCredentials, NodeId, NodeIdError, PowerState,
    ProvisioningState,
};
use stratus_template::{build, AuthMethod, ImageChoice, LoginSpec, ProvisionSpec};
use uuid::Uuid;

const DEFAULT_LOGIN_USER: &str = "stratus";

/// What the caller wants provisioned
#[derive(Debug, Clone)]
pub struct NodeTemplate {
    /// Target location
    pub location: String,
    /// Hardware size name
    pub vm_size: String,
    /// Disk image
    pub image: ImageChoice,
    /// Subnet the NIC attaches to, opaque here
    pub subnet_id: String,
    /// Login; when absent a default user with a generated password is used
    pub login: Option<LoginSpec>,
    /// Inbound ports to open
    pub inbound_ports: Vec<u16>,
    /// DNS label for the public IP
    pub dns_label: Option<String>,
    /// Resource tags
    pub tags: BTreeMap<String, String>,
}

impl NodeTemplate {
    /// Template with defaults for the optional knobs
    pub fn new(location: &str, vm_size: &str, image: ImageChoice, subnet_id: &str) -> Self {
        Self {
            location: location.to_string(),
            vm_size: vm_size.to_string(),
            image,
            subnet_id: subnet_id.to_string(),
            login: None,
            inbound_ports: Vec::new(),
            dns_label: None,
            tags: BTreeMap::new(),
        }
    }

    /// Use the given login instead of a generated one
    pub fn with_login(mut self, login: LoginSpec) -> Self {
        self.login = Some(login);
        self
    }

    /// Open the given inbound ports
    pub fn with_inbound_ports(mut self, ports: &[u16]) -> Self {
        self.inbound_ports = ports.to_vec();
        self
    }

    /// Request a DNS label on the public IP
    pub fn with_dns_label(mut self, label: &str) -> Self {
        self.dns_label = Some(label.to_string());
        self
    }

    /// Add a resource tag
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }
}

/// A provisioned node as observed remotely
#[derive(Debug, Clone)]
pub struct NodeHandle {
    /// Node id, `group/name`
    pub id: NodeId,
    /// Node name
    pub name: String,
    /// Owning resource group
    pub group: String,
    /// Deployment lifecycle state
    pub provisioning_state: ProvisioningState,
    /// VM power state, when an instance view was available
    pub power_state: Option<PowerState>,
    /// Allocated public addresses
    pub public_ips: Vec<String>,
    /// Remote-reported creation timestamp
    pub provisioned_at: Option<DateTime<Utc>>,
}

/// Why a compute operation failed
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    /// Malformed node id
    #[error(transparent)]
    Id(#[from] NodeIdError),
    /// A remote call failed
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Submission failed
    #[error(transparent)]
    Submit(#[from] SubmitError),
    /// Teardown failed
    #[error(transparent)]
    Teardown(#[from] TeardownError),
    /// An async job did not complete
    #[error(transparent)]
    Job(#[from] JobWaitError),
}

/// The node-facing service
pub struct ComputeService {
    apis: CloudApis,
    config: OrchestratorConfig,
}

impl ComputeService {
    /// Service over the given collaborators
    pub fn new(apis: CloudApis, config: OrchestratorConfig) -> Self {
        Self { apis, config }
    }

    /// Provision a node. The resource group is encoded into the returned
    /// node id, so the id alone suffices for every later operation.
    ///
    /// Credentials are materialized per call: when the template carries no
    /// login, a default user with a freshly generated password is used.
    pub async fn create_node_with_group_encoded_into_name(
        &self,
        group: &str,
        name: &str,
        template: &NodeTemplate,
    ) -> Result<(NodeHandle, LoginCredentials), ComputeError> {
        let login = template
            .login
            .clone()
            .unwrap_or_else(|| LoginSpec::password(DEFAULT_LOGIN_USER, &generated_password()));
        let credentials = match &login.auth {
            AuthMethod::Password(password) => {
                LoginCredentials::with_password(&login.username, password)
            }
            AuthMethod::KeyVaultKey { .. } => LoginCredentials::key_only(&login.username),
        };

        let mut spec = ProvisionSpec::new(
            &template.vm_size,
            template.image.clone(),
            &template.subnet_id,
            login,
        );
        spec.inbound_ports = template.inbound_ports.clone();
        spec.dns_label = template.dns_label.clone();
        spec.tags = template.tags.clone();

        let graph = build(name, &template.location, &spec);
        tracing::info!(group, name, resources = graph.resources().len(), "provisioning node");

        let submission = SubmissionOrchestrator::new(self.apis.clone(), self.config.clone());
        let deployment = submission
            .submit(
                group,
                name,
                &template.location,
                &graph,
                self.config.submission_timeout,
            )
            .await?;

        let handle = self.annotate(group, &deployment).await?;
        Ok((handle, credentials))
    }

    /// Tear down the node behind `id`
    pub async fn destroy_node(&self, id: &str) -> Result<TeardownReport, ComputeError> {
        let node = NodeId::parse(id)?;
        let teardown = TeardownOrchestrator::new(self.apis.clone(), self.config.clone());
        Ok(teardown.teardown(&node.group, &node.name).await?)
    }

    /// Fetch the node behind `id`; `None` when it does not exist remotely
    pub async fn get_node(&self, id: &str) -> Result<Option<NodeHandle>, ComputeError> {
        let node = NodeId::parse(id)?;
        let Some(deployment) = self.apis.deployments.get(&node.group, &node.name).await? else {
            return Ok(None);
        };
        Ok(Some(self.annotate(&node.group, &deployment).await?))
    }

    /// All nodes across all resource groups
    pub async fn list_nodes(&self) -> Result<Vec<NodeHandle>, ComputeError> {
        let mut handles = Vec::new();
        for group in self.apis.groups.list().await? {
            for deployment in self.apis.deployments.list(&group.name).await? {
                handles.push(self.annotate(&group.name, &deployment).await?);
            }
        }
        Ok(handles)
    }

    /// Restart the node behind `id`, waiting for the restart job to finish.
    /// A node that does not exist remotely is a no-op.
    pub async fn restart_node(&self, id: &str) -> Result<(), ComputeError> {
        let node = NodeId::parse(id)?;
        let Some(job) = self.apis.vms.restart(&node.group, &node.name).await? else {
            tracing::info!(id, "VM absent, restart is a no-op");
            return Ok(());
        };
        let poller = JobPoller::new(
            self.apis.jobs.clone(),
            self.config.poll_interval,
            self.config.job_poll_ceiling,
        );
        poller
            .await_terminal(&job, &[JobStatus::Done, JobStatus::NoContent])
            .await?;
        Ok(())
    }

    /// Images across all known locations, annotated with global availability
    pub async fn list_images(&self) -> Result<Vec<ImageAvailability>, ComputeError> {
        let mut rows = Vec::new();
        for location in self.apis.catalog.locations().await? {
            rows.extend(self.apis.catalog.images(&location).await?);
        }
        Ok(aggregate_images(&rows))
    }

    /// Hardware sizes across all known locations, annotated with global
    /// availability
    pub async fn list_hardware_profiles(&self) -> Result<Vec<SizeAvailability>, ComputeError> {
        let mut rows = Vec::new();
        for location in self.apis.catalog.locations().await? {
            rows.extend(self.apis.catalog.vm_sizes(&location).await?);
        }
        Ok(aggregate_sizes(&rows))
    }

    /// Handle for a remotely observed deployment: instance view for power
    /// state, dependency walk for attached public IPs.
    async fn annotate(&self, group: &str, deployment: &Deployment) -> ApiResult<NodeHandle> {
        let power_state = self
            .apis
            .vms
            .instance_view(group, &deployment.name)
            .await?
            .map(|view| view.power_state());

        let resolver = DependencyResolver::new(self.apis.public_ips.clone());
        let public_ips = resolver
            .find_attached_public_ips(group, deployment)
            .await?
            .into_iter()
            .filter_map(|ip| ip.ip_address)
            .collect();

        Ok(NodeHandle {
            id: NodeId::new(group, &deployment.name),
            name: deployment.name.clone(),
            group: group.to_string(),
            provisioning_state: deployment.provisioning_state,
            power_state,
            public_ips,
            provisioned_at: deployment.timestamp,
        })
    }
}

fn generated_password() -> String {
    format!("{}-Aa1!", Uuid::new_v4().simple())
}
