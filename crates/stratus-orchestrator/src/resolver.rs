//! Dependency Resolver
//!
//! After provisioning, the remote side reports a two-level dependency list
//! on the deployment. The resolver walks it to locate specific dependent
//! resources; here, the public IPs attached through the deployment's NICs.

use crate::api::{Deployment, PublicIpAddress, PublicIpApi};
use std::sync::Arc;
use stratus_common::ApiResult;
use stratus_template::ResourceKind;

/// Walks a deployment's reported dependency edges
pub struct DependencyResolver {
    public_ips: Arc<dyn PublicIpApi>,
}

impl DependencyResolver {
    /// Resolver fetching through the given public IP API
    pub fn new(public_ips: Arc<dyn PublicIpApi>) -> Self {
        Self { public_ips }
    }

    /// Public IPs attached to the deployment's network interfaces.
    ///
    /// Outer edges of kind network-interface are walked in order; within
    /// each, inner edges of kind public-IP-address are fetched by name in
    /// encounter order. Zero matches is an empty list, not an error; an IP
    /// that vanished between listing and fetch is skipped.
    pub async fn find_attached_public_ips(
        &self,
        group: &str,
        deployment: &Deployment,
    ) -> ApiResult<Vec<PublicIpAddress>> {
        let mut found = Vec::new();
        for outer in &deployment.dependencies {
            if outer.resource_kind != ResourceKind::NetworkInterface {
                continue;
            }
            for inner in &outer.depends_on {
                if inner.resource_kind != ResourceKind::PublicIp {
                    continue;
                }
                if let Some(ip) = self.public_ips.get(group, &inner.resource_name).await? {
                    found.push(ip);
                }
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DependencyRef, DeploymentDependency};
    use crate::fakes::FakeCloud;
    use stratus_common::ProvisioningState;

    fn deployment_with(dependencies: Vec<DeploymentDependency>) -> Deployment {
        Deployment {
            id: "/deployments/node1".into(),
            name: "node1".into(),
            provisioning_state: ProvisioningState::Succeeded,
            dependencies,
            timestamp: None,
        }
    }

    fn nic_edge(nic: &str, ips: &[&str]) -> DeploymentDependency {
        DeploymentDependency {
            resource_kind: ResourceKind::NetworkInterface,
            resource_name: nic.to_string(),
            depends_on: ips
                .iter()
                .map(|ip| DependencyRef {
                    resource_kind: ResourceKind::PublicIp,
                    resource_name: ip.to_string(),
                })
                .collect(),
        }
    }

    fn ip(name: &str, address: &str) -> PublicIpAddress {
        PublicIpAddress {
            id: format!("/publicIPAddresses/{}", name),
            name: name.to_string(),
            location: "westus".into(),
            ip_address: Some(address.to_string()),
        }
    }

    #[tokio::test]
    async fn test_walks_two_levels_in_encounter_order() {
        let cloud = Arc::new(FakeCloud::default());
        cloud.insert_public_ip("webfarm", ip("node1publicip", "52.1.1.1"));
        cloud.insert_public_ip("webfarm", ip("node1publicip2", "52.1.1.2"));

        let deployment = deployment_with(vec![
            // storage edge must be ignored
            DeploymentDependency {
                resource_kind: ResourceKind::StorageAccount,
                resource_name: "node1stor".into(),
                depends_on: vec![],
            },
            nic_edge("node1nic", &["node1publicip", "node1publicip2"]),
        ]);

        let resolver = DependencyResolver::new(cloud.clone());
        let ips = resolver
            .find_attached_public_ips("webfarm", &deployment)
            .await
            .unwrap();

        let addresses: Vec<&str> = ips.iter().filter_map(|i| i.ip_address.as_deref()).collect();
        assert_eq!(addresses, vec!["52.1.1.1", "52.1.1.2"]);
    }

    #[tokio::test]
    async fn test_no_matches_is_an_empty_list() {
        let cloud = Arc::new(FakeCloud::default());
        let deployment = deployment_with(vec![nic_edge("node1nic", &[])]);

        let resolver = DependencyResolver::new(cloud.clone());
        let ips = resolver
            .find_attached_public_ips("webfarm", &deployment)
            .await
            .unwrap();
        assert!(ips.is_empty());
    }

    #[tokio::test]
    async fn test_vanished_ip_is_skipped() {
        let cloud = Arc::new(FakeCloud::default());
        // dependency names an IP the fetch no longer finds
        let deployment = deployment_with(vec![nic_edge("node1nic", &["node1publicip"])]);

        let resolver = DependencyResolver::new(cloud.clone());
        let ips = resolver
            .find_attached_public_ips("webfarm", &deployment)
            .await
            .unwrap();
        assert!(ips.is_empty());
    }
}
