//! Deployment graph: ordered resource definitions plus the variable table
//!
//! Produced once per provisioning call, immutable after construction, and
//! consumed exactly once when rendered into the deployment request body.
//! A graph that fails [`DeploymentGraph::validate`] never reaches the remote
//! API: dangling references are build-time defects, not runtime conditions.

use crate::expr::TemplateExpr;
use crate::resources::{ResourceKind, ResourceProperties};
use serde::{Serialize, Serializer};
use serde_json::json;
use std::collections::BTreeMap;

const TEMPLATE_SCHEMA: &str =
    "https://schema.management.azure.com/schemas/2015-01-01/deploymentTemplate.json#";
const CONTENT_VERSION: &str = "1.0.0.0";
const DEPLOYMENT_MODE: &str = "Incremental";

/// One resource in the deployment graph
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    /// Resource name; may be a symbolic reference
    pub name: TemplateExpr,
    /// Resource kind
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    /// Target location
    pub location: String,
    /// API version the definition is written against
    pub api_version: String,
    /// Resource-id expressions of resources this one must be provisioned
    /// after; every entry must resolve to an earlier resource in the graph
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<TemplateExpr>,
    /// Kind-specific payload
    pub properties: ResourceProperties,
    /// Resource tags
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// Symbol table of indirected names
///
/// Key uniqueness is required: a collision indicates a naming-scheme bug in
/// the builder and panics rather than silently overwriting.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct VariableTable {
    entries: BTreeMap<String, TemplateExpr>,
}

impl VariableTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable. Panics on a duplicate key.
    pub fn register(&mut self, key: &str, value: TemplateExpr) {
        if self.entries.insert(key.to_string(), value).is_some() {
            panic!("duplicate template variable '{}'", key);
        }
    }

    /// Look up a variable
    pub fn get(&self, key: &str) -> Option<&TemplateExpr> {
        self.entries.get(key)
    }

    /// True when the key is registered
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &TemplateExpr)> {
        self.entries.iter()
    }
}

/// Declaration of a template parameter
#[derive(Debug, Clone, Serialize)]
pub struct TemplateParameter {
    /// Parameter type, e.g. `securestring`
    #[serde(rename = "type")]
    pub param_type: String,
}

/// Submission-time value for a declared parameter
#[derive(Debug, Clone)]
pub enum ParameterValue {
    /// Secret fetched by the remote side from a key vault at deploy time
    KeyVaultRef {
        /// Vault resource id
        vault_id: String,
        /// Secret name inside the vault
        secret_name: String,
    },
}

impl Serialize for ParameterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::KeyVaultRef {
                vault_id,
                secret_name,
            } => json!({
                "reference": {
                    "keyVault": { "id": vault_id },
                    "secretName": secret_name,
                }
            })
            .serialize(serializer),
        }
    }
}

/// The deployment graph: ordered resources plus the variable table
#[derive(Debug, Clone)]
pub struct DeploymentGraph {
    resources: Vec<ResourceDefinition>,
    variables: VariableTable,
    parameters: BTreeMap<String, TemplateParameter>,
    parameter_values: BTreeMap<String, ParameterValue>,
}

impl DeploymentGraph {
    /// Assemble a graph from its parts
    pub fn new(
        resources: Vec<ResourceDefinition>,
        variables: VariableTable,
        parameters: BTreeMap<String, TemplateParameter>,
        parameter_values: BTreeMap<String, ParameterValue>,
    ) -> Self {
        Self {
            resources,
            variables,
            parameters,
            parameter_values,
        }
    }

    /// Resources in provisioning order
    pub fn resources(&self) -> &[ResourceDefinition] {
        &self.resources
    }

    /// The variable table
    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    /// Find a resource by kind
    pub fn resource_of_kind(&self, kind: &ResourceKind) -> Option<&ResourceDefinition> {
        self.resources.iter().find(|r| &r.kind == kind)
    }

    /// Check topological validity and reference resolution.
    ///
    /// Every `depends_on` entry must be a resource-id expression naming a
    /// resource emitted EARLIER in the graph; every variable reference in
    /// any expression must be registered; every parameter reference must be
    /// declared.
    pub fn validate(&self) -> Result<(), GraphDefect> {
        for (idx, resource) in self.resources.iter().enumerate() {
            let mut vars = Vec::new();
            resource.name.collect_vars(&mut vars);
            for dep in &resource.depends_on {
                dep.collect_vars(&mut vars);
            }
            for expr in resource.properties.expressions() {
                expr.collect_vars(&mut vars);
                self.check_params(expr)?;
            }
            for var in vars {
                if !self.variables.contains(&var) {
                    return Err(GraphDefect::UnresolvedVariable(var));
                }
            }

            for dep in &resource.depends_on {
                if !self.resolves_to_earlier(dep, idx) {
                    return Err(GraphDefect::DanglingDependency {
                        resource: resource.name.render(),
                        dependency: dep.render(),
                    });
                }
            }
        }

        // Table values may themselves reference variables
        for (_, value) in self.variables.iter() {
            let mut vars = Vec::new();
            value.collect_vars(&mut vars);
            for var in vars {
                if !self.variables.contains(&var) {
                    return Err(GraphDefect::UnresolvedVariable(var));
                }
            }
        }

        Ok(())
    }

    fn check_params(&self, expr: &TemplateExpr) -> Result<(), GraphDefect> {
        match expr {
            TemplateExpr::Param(name) => {
                if !self.parameters.contains_key(name) {
                    return Err(GraphDefect::UndeclaredParameter(name.clone()));
                }
            }
            TemplateExpr::ResourceId { name, .. } => self.check_params(name)?,
            TemplateExpr::Concat(parts) => {
                for part in parts {
                    self.check_params(part)?;
                }
            }
            TemplateExpr::Literal(_) | TemplateExpr::Var(_) => {}
        }
        Ok(())
    }

    fn resolves_to_earlier(&self, dep: &TemplateExpr, idx: usize) -> bool {
        let TemplateExpr::ResourceId { kind, name } = dep else {
            return false;
        };
        let rendered = name.render();
        self.resources[..idx]
            .iter()
            .any(|r| &r.kind == kind && r.name.render() == rendered)
    }

    /// Render the template body (schema, parameters, variables, resources).
    /// Validates first; a defective graph is never serialized.
    pub fn render_template(&self) -> Result<serde_json::Value, GraphDefect> {
        self.validate()?;
        Ok(json!({
            "$schema": TEMPLATE_SCHEMA,
            "contentVersion": CONTENT_VERSION,
            "parameters": self.parameters,
            "variables": self.variables,
            "resources": self.resources,
        }))
    }

    /// Render the full deployment request body
    pub fn render_request_body(&self) -> Result<serde_json::Value, GraphDefect> {
        let template = self.render_template()?;
        Ok(json!({
            "properties": {
                "mode": DEPLOYMENT_MODE,
                "template": template,
                "parameters": self.parameter_values,
            }
        }))
    }
}

/// Build-time defect in a deployment graph
#[derive(Debug, thiserror::Error)]
pub enum GraphDefect {
    /// `depends_on` entry does not resolve to an earlier resource
    #[error("resource '{resource}' depends on '{dependency}' which is not an earlier resource in the graph")]
    DanglingDependency {
        /// Rendered name of the offending resource
        resource: String,
        /// Rendered dependency expression
        dependency: String,
    },
    /// Variable reference with no table entry
    #[error("unresolved template variable '{0}'")]
    UnresolvedVariable(String),
    /// Parameter reference with no declaration
    #[error("undeclared template parameter '{0}'")]
    UndeclaredParameter(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{PublicIpProperties, StorageAccountProperties};

    fn storage_resource(name: &str) -> ResourceDefinition {
        ResourceDefinition {
            name: TemplateExpr::literal(name),
            kind: ResourceKind::StorageAccount,
            location: "westus".into(),
            api_version: ResourceKind::StorageAccount.api_version().into(),
            depends_on: Vec::new(),
            properties: ResourceProperties::StorageAccount(StorageAccountProperties {
                account_type: "Standard_LRS".into(),
            }),
            tags: BTreeMap::new(),
        }
    }

    fn public_ip_resource(name: &str, depends_on: Vec<TemplateExpr>) -> ResourceDefinition {
        ResourceDefinition {
            name: TemplateExpr::literal(name),
            kind: ResourceKind::PublicIp,
            location: "westus".into(),
            api_version: ResourceKind::PublicIp.api_version().into(),
            depends_on,
            properties: ResourceProperties::PublicIp(PublicIpProperties {
                public_ip_allocation_method: "Dynamic".into(),
                dns_settings: None,
            }),
            tags: BTreeMap::new(),
        }
    }

    #[test]
    #[should_panic(expected = "duplicate template variable")]
    fn test_variable_collision_panics() {
        let mut table = VariableTable::new();
        table.register("storageAccountName", TemplateExpr::literal("a"));
        table.register("storageAccountName", TemplateExpr::literal("b"));
    }

    #[test]
    fn test_forward_dependency_is_a_defect() {
        // public IP depends on a storage account that comes AFTER it
        let dep = TemplateExpr::resource_id(
            ResourceKind::StorageAccount,
            TemplateExpr::literal("nodestor"),
        );
        let graph = DeploymentGraph::new(
            vec![public_ip_resource("nodepublicip", vec![dep]), storage_resource("nodestor")],
            VariableTable::new(),
            BTreeMap::new(),
            BTreeMap::new(),
        );

        assert!(matches!(
            graph.validate(),
            Err(GraphDefect::DanglingDependency { .. })
        ));
    }

    #[test]
    fn test_backward_dependency_is_valid() {
        let dep = TemplateExpr::resource_id(
            ResourceKind::StorageAccount,
            TemplateExpr::literal("nodestor"),
        );
        let graph = DeploymentGraph::new(
            vec![storage_resource("nodestor"), public_ip_resource("nodepublicip", vec![dep])],
            VariableTable::new(),
            BTreeMap::new(),
            BTreeMap::new(),
        );

        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_unresolved_variable_is_a_defect() {
        let mut resource = storage_resource("ignored");
        resource.name = TemplateExpr::var("storageAccountName");

        let graph = DeploymentGraph::new(
            vec![resource],
            VariableTable::new(),
            BTreeMap::new(),
            BTreeMap::new(),
        );

        assert!(matches!(
            graph.validate(),
            Err(GraphDefect::UnresolvedVariable(name)) if name == "storageAccountName"
        ));
    }

    #[test]
    fn test_render_template_wire_shape() {
        let mut variables = VariableTable::new();
        variables.register("storageAccountName", TemplateExpr::literal("nodestor"));

        let mut resource = storage_resource("ignored");
        resource.name = TemplateExpr::var("storageAccountName");

        let graph = DeploymentGraph::new(
            vec![resource],
            variables,
            BTreeMap::new(),
            BTreeMap::new(),
        );

        let template = graph.render_template().unwrap();
        assert_eq!(template["contentVersion"], "1.0.0.0");
        assert_eq!(template["variables"]["storageAccountName"], "nodestor");
        let resources = template["resources"].as_array().unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0]["type"], "Microsoft.Storage/storageAccounts");
        assert_eq!(resources[0]["name"], "[variables('storageAccountName')]");
        assert_eq!(resources[0]["properties"]["accountType"], "Standard_LRS");
    }

    #[test]
    fn test_request_body_carries_mode_and_parameters() {
        let mut parameters = BTreeMap::new();
        parameters.insert(
            "sshKeyData".to_string(),
            TemplateParameter {
                param_type: "securestring".into(),
            },
        );
        let mut values = BTreeMap::new();
        values.insert(
            "sshKeyData".to_string(),
            ParameterValue::KeyVaultRef {
                vault_id: "/vaults/ops".into(),
                secret_name: "node-key".into(),
            },
        );

        let graph = DeploymentGraph::new(
            vec![storage_resource("nodestor")],
            VariableTable::new(),
            parameters,
            values,
        );

        let body = graph.render_request_body().unwrap();
        assert_eq!(body["properties"]["mode"], "Incremental");
        assert_eq!(
            body["properties"]["template"]["parameters"]["sshKeyData"]["type"],
            "securestring"
        );
        assert_eq!(
            body["properties"]["parameters"]["sshKeyData"]["reference"]["secretName"],
            "node-key"
        );
    }
}
