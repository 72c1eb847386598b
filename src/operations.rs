//! PATCH operations for the configuration API.
//!
//! An update is a list of operations, each touching one property:
//!
//! ```json
//! {"operations": [
//!   {"op": "replace", "path": "description", "value": "East data center"},
//!   {"op": "add", "path": "includedClientAddress", "value": ["10.0.0.0/8"]},
//!   {"op": "remove", "path": "excludedProtocol"}
//! ]}
//! ```
//!
//! The `add_*_if_necessary` helpers compare a planned state value with the
//! prior state value and append whatever operations bring the server in line.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::internaltypes;

/// The kind of a PATCH operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Add values to a multi-valued property.
    Add,
    /// Remove values, or the whole property when no value is given.
    Remove,
    /// Replace the property's value.
    Replace,
}

/// One PATCH operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// What to do.
    pub op: OperationKind,
    /// REST name of the property.
    pub path: String,
    /// Operand, absent for a whole-property remove.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Operation {
    /// A `replace` of `path` with `value`.
    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: OperationKind::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    /// A `remove` of the whole property.
    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: OperationKind::Remove,
            path: path.into(),
            value: None,
        }
    }

    /// A `remove` of specific values.
    pub fn remove_values(path: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            op: OperationKind::Remove,
            path: path.into(),
            value: Some(Value::from(values)),
        }
    }

    /// An `add` of specific values.
    pub fn add_values(path: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            op: OperationKind::Add,
            path: path.into(),
            value: Some(Value::from(values)),
        }
    }
}

fn add_scalar_operation_if_necessary<F>(
    ops: &mut Vec<Operation>,
    plan: &Value,
    state: &Value,
    path: &str,
    same: F,
) where
    F: Fn(&Value, &Value) -> bool,
{
    if plan.is_null() && state.is_null() {
        return;
    }
    if !plan.is_null() && !state.is_null() && same(plan, state) {
        return;
    }
    if plan.is_null() {
        ops.push(Operation::remove(path));
    } else {
        ops.push(Operation::replace(path, plan.clone()));
    }
}

/// Append a `replace` (or `remove`, when the plan unsets it) for a string
/// property that changed.
pub fn add_string_operation_if_necessary(
    ops: &mut Vec<Operation>,
    plan: &Value,
    state: &Value,
    path: &str,
) {
    add_scalar_operation_if_necessary(ops, plan, state, path, |a, b| a.as_str() == b.as_str());
}

/// Same as [`add_string_operation_if_necessary`] for a boolean property.
pub fn add_bool_operation_if_necessary(
    ops: &mut Vec<Operation>,
    plan: &Value,
    state: &Value,
    path: &str,
) {
    add_scalar_operation_if_necessary(ops, plan, state, path, |a, b| a.as_bool() == b.as_bool());
}

/// Same as [`add_string_operation_if_necessary`] for an integer property.
pub fn add_int64_operation_if_necessary(
    ops: &mut Vec<Operation>,
    plan: &Value,
    state: &Value,
    path: &str,
) {
    add_scalar_operation_if_necessary(ops, plan, state, path, |a, b| {
        internaltypes::int64_value(a) == internaltypes::int64_value(b)
    });
}

/// Same as [`add_string_operation_if_necessary`] for a floating point
/// property.
pub fn add_float64_operation_if_necessary(
    ops: &mut Vec<Operation>,
    plan: &Value,
    state: &Value,
    path: &str,
) {
    add_scalar_operation_if_necessary(ops, plan, state, path, |a, b| a.as_f64() == b.as_f64());
}

/// Append operations for a multi-valued property.
///
/// Sets compare without regard to order. An emptied set removes the whole
/// property; otherwise new values are added and dropped values removed.
pub fn add_string_set_operations_if_necessary(
    ops: &mut Vec<Operation>,
    plan: &Value,
    state: &Value,
    path: &str,
) {
    if internaltypes::same_set(plan, state) {
        return;
    }
    let planned = internaltypes::string_set(plan);
    let current = internaltypes::string_set(state);

    if planned.is_empty() {
        ops.push(Operation::remove(path));
        return;
    }

    let to_add: Vec<String> = planned.difference(&current).cloned().collect();
    let to_remove: Vec<String> = current.difference(&planned).cloned().collect();

    if !to_add.is_empty() {
        ops.push(Operation::add_values(path, to_add));
    }
    if !to_remove.is_empty() {
        ops.push(Operation::remove_values(path, to_remove));
    }
}

/// Log the operations of an update at debug level.
pub fn log_update_operations(object: &str, ops: &[Operation]) {
    if ops.is_empty() {
        debug!(object = %object, "No configuration API operations created for update");
        return;
    }
    for op in ops {
        debug!(
            object = %object,
            op = ?op.op,
            path = %op.path,
            value = %op.value.as_ref().map(ToString::to_string).unwrap_or_default(),
            "Configuration API update operation"
        );
    }
}

/// REST names touched by `ops`, deduplicated.
pub fn touched_paths(ops: &[Operation]) -> BTreeSet<&str> {
    ops.iter().map(|op| op.path.as_str()).collect()
}
