//! Values passed between the plugin server and [`crate::ProviderService`].
//!
//! These mirror a few protocol messages with `serde_json::Value` in place of
//! the JSON-encoded byte fields, so provider code never touches raw bytes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::generated as pb;

/// One attribute that differs between prior and planned state.
///
/// `None` on either side means the attribute is unset there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// Attribute name.
    pub path: String,
    /// Prior value.
    pub before: Option<Value>,
    /// Planned value.
    pub after: Option<Value>,
}

impl AttributeChange {
    /// The attribute goes from unset to `value`.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            before: None,
            after: Some(value),
        }
    }

    /// The attribute goes from `value` to unset.
    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            before: Some(value),
            after: None,
        }
    }

    /// Compare two state values for `path`. JSON null counts as unset;
    /// equal values yield `None`.
    pub fn between(path: &str, before: &Value, after: &Value) -> Option<Self> {
        if before == after {
            return None;
        }
        Some(match (before.is_null(), after.is_null()) {
            (true, _) => Self::added(path, after.clone()),
            (_, true) => Self::removed(path, before.clone()),
            _ => Self {
                path: path.to_string(),
                before: Some(before.clone()),
                after: Some(after.clone()),
            },
        })
    }
}

impl From<AttributeChange> for pb::AttributeChange {
    fn from(change: AttributeChange) -> Self {
        let encode = |v: Option<Value>| {
            v.and_then(|v| serde_json::to_vec(&v).ok())
                .unwrap_or_default()
        };
        Self {
            before: encode(change.before),
            after: encode(change.after),
            path: change.path,
        }
    }
}

/// Outcome of planning one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// State the apply step should produce; null when destroying.
    pub planned_state: Value,
    /// Attributes that differ from the prior state.
    pub changes: Vec<AttributeChange>,
    /// The object has to be deleted and added again.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Assemble a plan.
    pub fn with_changes(
        planned_state: Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }

    /// Nothing would be sent to the server.
    pub fn is_no_op(&self) -> bool {
        !self.requires_replace && self.changes.is_empty()
    }
}

/// State produced by `ImportResourceState`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// Resource type name.
    pub resource_type: String,
    /// State read from the server.
    pub state: Value,
}

impl ImportedResource {
    /// Pair `state` with its resource type.
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// What `GetMetadata` reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Resource type names.
    pub resources: Vec<String>,
    /// Data source type names.
    pub data_sources: Vec<String>,
    /// Optional protocol features.
    pub capabilities: ServerCapabilities,
}

/// Optional protocol features the provider supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    /// `PlanResourceChange` is also called for destroys.
    pub plan_destroy: bool,
}

/// Plugin protocol version written in the handshake line.
pub const PROTOCOL_VERSION: u32 = 1;

/// First field of the handshake line.
pub const HANDSHAKE_PREFIX: &str = "PINGDIRECTORY_PROVIDER";
