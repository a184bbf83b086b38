//! Teardown Orchestrator
//!
//! The remote API cannot delete a composite deployment atomically, so
//! teardown is a strict sequence of per-resource deletes, two of which are
//! asynchronous and must be polled to completion before the next delete may
//! safely proceed. A step failure leaves the remainder of the sequence
//! unexecuted; the error reports which step failed and which steps had
//! already completed, so a partial teardown is distinguishable from
//! "nothing was deleted". Deletes are idempotent, so re-invoking teardown
//! from scratch is safe.

use crate::api::CloudApis;
use crate::config::OrchestratorConfig;
use crate::jobs::{JobPoller, JobWaitError};
use stratus_common::{ApiError, JobStatus};
use stratus_template::names;

/// One step of the teardown sequence, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    /// Delete the VM (async)
    DeleteVm,
    /// Poll the VM delete job to `Done`
    AwaitVmDelete,
    /// Delete the storage account
    DeleteStorageAccount,
    /// Delete the NIC (async)
    DeleteNic,
    /// Poll the NIC delete job to `Done`/`NoContent`
    AwaitNicDelete,
    /// Delete the public IP
    DeletePublicIp,
    /// Delete the deployment record
    DeleteDeployment,
    /// Delete the group's virtual network
    DeleteVirtualNetwork,
}

impl TeardownStep {
    /// Human-readable step name for error messages
    pub fn display(&self) -> &'static str {
        match self {
            Self::DeleteVm => "delete VM",
            Self::AwaitVmDelete => "await VM delete job",
            Self::DeleteStorageAccount => "delete storage account",
            Self::DeleteNic => "delete NIC",
            Self::AwaitNicDelete => "await NIC delete job",
            Self::DeletePublicIp => "delete public IP",
            Self::DeleteDeployment => "delete deployment record",
            Self::DeleteVirtualNetwork => "delete virtual network",
        }
    }
}

/// Outcome of a completed teardown
#[derive(Debug, Clone)]
pub struct TeardownReport {
    /// Steps executed, in order
    pub completed: Vec<TeardownStep>,
    /// True when the VM never existed and the sequence short-circuited as a
    /// successful no-op
    pub short_circuited: bool,
}

/// A teardown that stopped mid-sequence.
///
/// `completed` is empty when nothing was deleted; otherwise the resource set
/// is partially torn down and the caller decides whether to re-run.
#[derive(Debug, thiserror::Error)]
#[error("teardown of '{name}' failed at step '{}' ({} steps completed): {cause}", step.display(), completed.len())]
pub struct TeardownError {
    /// Deployment name being torn down
    pub name: String,
    /// The step that failed
    pub step: TeardownStep,
    /// Steps that had already completed
    pub completed: Vec<TeardownStep>,
    /// Underlying failure
    #[source]
    pub cause: TeardownCause,
}

/// Underlying cause of a failed teardown step
#[derive(Debug, thiserror::Error)]
pub enum TeardownCause {
    /// Remote call failed
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Async-job poll did not reach an accepted terminal status
    #[error(transparent)]
    Job(#[from] JobWaitError),
}

/// Executes the ordered teardown sequence
pub struct TeardownOrchestrator {
    apis: CloudApis,
    config: OrchestratorConfig,
}

impl TeardownOrchestrator {
    /// Orchestrator over the given collaborators
    pub fn new(apis: CloudApis, config: OrchestratorConfig) -> Self {
        Self { apis, config }
    }

    /// Tear down the deployment `name` and its dependent resources in
    /// `group`.
    pub async fn teardown(
        &self,
        group: &str,
        name: &str,
    ) -> Result<TeardownReport, TeardownError> {
        let mut completed: Vec<TeardownStep> = Vec::new();
        let poller = JobPoller::new(
            self.apis.jobs.clone(),
            self.config.poll_interval,
            self.config.job_poll_ceiling,
        );

        // Step 1: delete the VM. A null job handle means the VM never
        // existed; the remaining steps are skipped as a successful no-op.
        let vm_job = match self.apis.vms.delete(group, name).await {
            Ok(handle) => handle,
            Err(e) => return Err(self.fail(name, TeardownStep::DeleteVm, completed, e.into())),
        };
        let Some(vm_job) = vm_job else {
            tracing::info!(group, name, "VM absent, teardown is a no-op");
            return Ok(TeardownReport {
                completed,
                short_circuited: true,
            });
        };
        completed.push(TeardownStep::DeleteVm);

        // Step 2: poll the VM delete job to completion
        tracing::info!(group, name, "awaiting VM delete job");
        if let Err(e) = poller.await_terminal(&vm_job, &[JobStatus::Done]).await {
            return Err(self.fail(name, TeardownStep::AwaitVmDelete, completed, e.into()));
        }
        completed.push(TeardownStep::AwaitVmDelete);

        // Step 3: storage account (synchronous)
        let storage = names::storage_account_name(name);
        if let Err(e) = self.apis.storage.delete(group, &storage).await {
            return Err(self.fail(name, TeardownStep::DeleteStorageAccount, completed, e.into()));
        }
        completed.push(TeardownStep::DeleteStorageAccount);

        // Steps 4-5: NIC delete, then poll; an absent NIC yields no job
        let nic = names::nic_name(name);
        let nic_job = match self.apis.nics.delete(group, &nic).await {
            Ok(handle) => handle,
            Err(e) => return Err(self.fail(name, TeardownStep::DeleteNic, completed, e.into())),
        };
        completed.push(TeardownStep::DeleteNic);
        if let Some(nic_job) = nic_job {
            tracing::info!(group, name, "awaiting NIC delete job");
            if let Err(e) = poller
                .await_terminal(&nic_job, &[JobStatus::Done, JobStatus::NoContent])
                .await
            {
                return Err(self.fail(name, TeardownStep::AwaitNicDelete, completed, e.into()));
            }
            completed.push(TeardownStep::AwaitNicDelete);
        }

        // Step 6: public IP (synchronous)
        let pip = names::public_ip_name(name);
        if let Err(e) = self.apis.public_ips.delete(group, &pip).await {
            return Err(self.fail(name, TeardownStep::DeletePublicIp, completed, e.into()));
        }
        completed.push(TeardownStep::DeletePublicIp);

        // Step 7: the deployment record itself
        if let Err(e) = self.apis.deployments.delete(group, name).await {
            return Err(self.fail(name, TeardownStep::DeleteDeployment, completed, e.into()));
        }
        completed.push(TeardownStep::DeleteDeployment);

        // Step 8: the group's virtual network
        let vnet = names::virtual_network_name(group);
        if let Err(e) = self.apis.virtual_networks.delete(group, &vnet).await {
            return Err(self.fail(name, TeardownStep::DeleteVirtualNetwork, completed, e.into()));
        }
        completed.push(TeardownStep::DeleteVirtualNetwork);

        tracing::info!(group, name, "teardown complete");
        Ok(TeardownReport {
            completed,
            short_circuited: false,
        })
    }

    fn fail(
        &self,
        name: &str,
        step: TeardownStep,
        completed: Vec<TeardownStep>,
        cause: TeardownCause,
    ) -> TeardownError {
        tracing::warn!(
            name,
            step = step.display(),
            completed = completed.len(),
            "teardown stopped mid-sequence"
        );
        TeardownError {
            name: name.to_string(),
            step,
            completed,
            cause,
        }
    }
}
