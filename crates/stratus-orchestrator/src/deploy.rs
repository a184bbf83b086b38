//! Submission Orchestrator
//!
//! Ensures the resource group exists, renders the deployment graph, submits
//! it, then polls until the remote side acknowledges that the deployment
//! object exists. Acknowledgment is NOT completion: the loop exits on the
//! first non-null deployment regardless of its provisioning state; the
//! remote side drives the rest of the lifecycle on its own.
//!
//! On timeout the orchestrator invokes teardown for the same logical name
//! exactly once (best effort) and fails with an error naming the deployment
//! and the configured timeout.

use crate::api::{CloudApis, Deployment};
use crate::config::OrchestratorConfig;
use crate::teardown::TeardownOrchestrator;
use std::collections::BTreeMap;
use std::time::Duration;
use stratus_common::ApiError;
use stratus_template::{DeploymentGraph, GraphDefect};
use tokio::time::{sleep, Instant};

/// Submits a deployment graph and waits for acknowledgment
pub struct SubmissionOrchestrator {
    apis: CloudApis,
    config: OrchestratorConfig,
}

impl SubmissionOrchestrator {
    /// Orchestrator over the given collaborators
    pub fn new(apis: CloudApis, config: OrchestratorConfig) -> Self {
        Self { apis, config }
    }

    /// Submit `graph` as deployment `name` in `group`, creating the group in
    /// `location` if it does not exist yet.
    ///
    /// The group get-or-create is not retried: a transient conflict there is
    /// a fatal submission error.
    pub async fn submit(
        &self,
        group: &str,
        name: &str,
        location: &str,
        graph: &DeploymentGraph,
        timeout: Duration,
    ) -> Result<Deployment, SubmitError> {
        if self.apis.groups.get(group).await?.is_none() {
            tracing::debug!(group, location, "resource group absent, creating");
            self.apis
                .groups
                .create(group, location, &BTreeMap::new())
                .await?;
        }

        let body = graph.render_request_body()?;
        self.apis.deployments.create(group, name, &body).await?;
        tracing::info!(group, name, "deployment submitted, awaiting acknowledgment");

        let start = Instant::now();
        loop {
            if let Some(deployment) = self.apis.deployments.get(group, name).await? {
                tracing::info!(
                    name,
                    state = deployment.provisioning_state.as_str(),
                    "deployment acknowledged"
                );
                return Ok(deployment);
            }
            if start.elapsed() >= timeout {
                break;
            }
            sleep(self.config.poll_interval).await;
        }

        // Best-effort cleanup of whatever was partially created, then fail.
        tracing::warn!(group, name, ?timeout, "submission timed out, tearing down");
        let teardown = TeardownOrchestrator::new(self.apis.clone(), self.config.clone());
        if let Err(err) = teardown.teardown(group, name).await {
            tracing::warn!(name, error = %err, "best-effort teardown after timeout failed");
        }
        Err(SubmitError::Timeout {
            name: name.to_string(),
            timeout,
        })
    }
}

/// Why a submission failed
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The graph failed validation; nothing was sent to the remote API
    #[error("deployment graph defect: {0}")]
    Defect(#[from] GraphDefect),
    /// A remote call failed
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The deployment was never acknowledged within the timeout;
    /// best-effort teardown has already run
    #[error("deployment '{name}' was not acknowledged within {timeout:?}")]
    Timeout {
        /// Deployment name
        name: String,
        /// Configured timeout
        timeout: Duration,
    },
}
