//! Stratus Template - declarative deployment graph builder
//!
//! Builds the resource graph a resource-manager cloud executes as one
//! atomic deployment: an ordered list of typed resource definitions plus a
//! symbol table of indirected names ("variables"). Everything here is pure,
//! with no I/O and no async, and validated before it is ever serialized:
//!
//! - [`TemplateExpr`] models the template expression language (literal,
//!   variable reference, resource-id, concat) instead of raw string glue
//! - [`ResourceProperties`] is a tagged union over the known resource kinds,
//!   so serializer dispatch is exhaustive
//! - [`DeploymentGraph::validate`] rejects dangling `dependsOn` references
//!   and unresolved variables before submission
//! - [`build`] assembles the storage → public IP → NSG → NIC → VM graph from
//!   a [`ProvisionSpec`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod expr;
pub mod graph;
pub mod names;
pub mod resources;

pub use builder::{build, AuthMethod, ImageChoice, LoginSpec, ProvisionSpec};
pub use expr::TemplateExpr;
pub use graph::{DeploymentGraph, GraphDefect, ResourceDefinition, VariableTable};
pub use resources::{ResourceKind, ResourceProperties};
