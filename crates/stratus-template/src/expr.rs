//! Template expression language
//!
//! The resource manager's template syntax indirects names through
//! `[variables('x')]` / `[resourceId(...)]` strings. Stratus models those as
//! a small expression tree so reference resolution can be checked at build
//! time instead of producing broken remote payloads.

use crate::resources::ResourceKind;
use serde::{Serialize, Serializer};

/// A template expression: literal, symbolic reference, or function call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateExpr {
    /// Plain string, rendered bare
    Literal(String),
    /// Reference to an entry in the graph's variable table
    Var(String),
    /// Reference to a declared template parameter
    Param(String),
    /// `resourceId(type, name)`: the canonical id of a sibling resource
    ResourceId {
        /// Kind of the referenced resource
        kind: ResourceKind,
        /// Name of the referenced resource, itself an expression
        name: Box<TemplateExpr>,
    },
    /// `concat(...)` over the argument expressions
    Concat(Vec<TemplateExpr>),
}

impl TemplateExpr {
    /// Literal expression
    pub fn literal(s: impl Into<String>) -> Self {
        Self::Literal(s.into())
    }

    /// Variable reference
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// Parameter reference
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    /// Resource-id expression for a sibling resource
    pub fn resource_id(kind: ResourceKind, name: TemplateExpr) -> Self {
        Self::ResourceId {
            kind,
            name: Box::new(name),
        }
    }

    /// Concatenation of the given expressions
    pub fn concat(parts: Vec<TemplateExpr>) -> Self {
        Self::Concat(parts)
    }

    /// Inner (unbracketed) syntax, as it appears inside a function call
    fn fragment(&self) -> String {
        match self {
            Self::Literal(s) => format!("'{}'", s),
            Self::Var(name) => format!("variables('{}')", name),
            Self::Param(name) => format!("parameters('{}')", name),
            Self::ResourceId { kind, name } => {
                format!("resourceId('{}', {})", kind.type_str(), name.fragment())
            }
            Self::Concat(parts) => {
                let inner: Vec<String> = parts.iter().map(|p| p.fragment()).collect();
                format!("concat({})", inner.join(", "))
            }
        }
    }

    /// Wire form: literals render bare, everything else in brackets
    pub fn render(&self) -> String {
        match self {
            Self::Literal(s) => s.clone(),
            other => format!("[{}]", other.fragment()),
        }
    }

    /// Collect every variable name this expression references
    pub fn collect_vars(&self, out: &mut Vec<String>) {
        match self {
            Self::Literal(_) | Self::Param(_) => {}
            Self::Var(name) => out.push(name.clone()),
            Self::ResourceId { name, .. } => name.collect_vars(out),
            Self::Concat(parts) => {
                for part in parts {
                    part.collect_vars(out);
                }
            }
        }
    }
}

impl Serialize for TemplateExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.render())
    }
}
