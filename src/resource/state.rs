//! Mapping between provider state and configuration API bodies.
//!
//! Everything here is pure: request bodies and PATCH operations are built
//! from state values, and response bodies are mapped back into state. The
//! adapter does the I/O.

use serde_json::{json, Map, Value};
use tracing::warn;

use super::{AttributeDef, AttributeKind, ConfigObjectDef, MESSAGES_URN};
use crate::error::ProviderError;
use crate::internaltypes;
use crate::operations::{self, Operation};
use crate::schema::Diagnostic;
use crate::types::{AttributeChange, PlanResult};
use crate::version::ProductVersion;

/// Name and parent name of an object, read from state or configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectId {
    /// Object name.
    pub name: String,
    /// Parent object name, for child objects.
    pub parent: Option<String>,
}

impl ObjectId {
    /// Read the identity of an object from a state or configuration value.
    pub fn from_state(def: &ConfigObjectDef, state: &Value) -> Result<Self, ProviderError> {
        let name = internaltypes::string_value(&state["name"], true).ok_or_else(|| {
            ProviderError::InvalidRequest(format!(
                "{} state is missing 'name'",
                def.display_name
            ))
        })?;
        let parent = match def.parent {
            Some(parent) => Some(
                internaltypes::string_value(&state[parent.attribute], true).ok_or_else(|| {
                    ProviderError::InvalidRequest(format!(
                        "{} state is missing '{}'",
                        def.display_name, parent.attribute
                    ))
                })?,
            ),
            None => None,
        };
        Ok(Self { name, parent })
    }

    /// Parse an import ID: `name`, or `parent/name` for child objects.
    pub fn from_import_id(def: &ConfigObjectDef, id: &str) -> Result<Self, ProviderError> {
        match def.parent {
            Some(parent) => match id.split_once('/') {
                Some((parent_name, name)) if !parent_name.is_empty() && !name.is_empty() => {
                    Ok(Self {
                        name: name.to_string(),
                        parent: Some(parent_name.to_string()),
                    })
                },
                _ => Err(ProviderError::InvalidRequest(format!(
                    "Expected import identifier with format: [{}]/[{}-name]. Got: {}",
                    parent.attribute,
                    def.kind.replace('_', "-"),
                    id
                ))),
            },
            None if id.is_empty() => Err(ProviderError::InvalidRequest(
                "Import identifier must not be empty".to_string(),
            )),
            None => Ok(Self {
                name: id.to_string(),
                parent: None,
            }),
        }
    }

    /// Path of the object in the configuration API.
    pub fn path(&self, def: &ConfigObjectDef) -> String {
        def.object_path(self.parent.as_deref(), &self.name)
    }

    /// Path of the collection the object lives in.
    pub fn collection_path(&self, def: &ConfigObjectDef) -> String {
        def.collection_path(self.parent.as_deref())
    }
}

/// The `type` set in a state or configuration value.
pub fn object_type(state: &Value) -> Option<&str> {
    state.get("type").and_then(Value::as_str)
}

/// API representation of a state value, or None when the value is unset.
fn api_value(attr: &AttributeDef, value: &Value) -> Option<Value> {
    if !attr.is_set(value) {
        return None;
    }
    match attr.kind {
        AttributeKind::String => internaltypes::string_value(value, false).map(Value::String),
        AttributeKind::StringSet => Some(internaltypes::normalize_string_set(value)),
        AttributeKind::Int64 => internaltypes::int64_value(value).map(Value::from),
        AttributeKind::Float64 => internaltypes::float64_value(value).map(Value::from),
        AttributeKind::Bool => internaltypes::bool_value(value).map(Value::Bool),
    }
}

/// State representation of an API property (absent when `value` is None).
fn state_value(attr: &AttributeDef, value: Option<&Value>) -> Value {
    let value = value.unwrap_or(&Value::Null);
    match attr.kind {
        AttributeKind::String => internaltypes::string_value_or_null(value.as_str(), false),
        AttributeKind::StringSet => internaltypes::normalize_string_set(value),
        AttributeKind::Int64 => internaltypes::int64_value(value)
            .map(Value::from)
            .unwrap_or(Value::Null),
        AttributeKind::Float64 => internaltypes::float64_value(value)
            .map(Value::from)
            .unwrap_or(Value::Null),
        AttributeKind::Bool => internaltypes::bool_value(value)
            .map(Value::Bool)
            .unwrap_or(Value::Null),
    }
}

/// Normalized form of a planned value, used for planned state and diffs.
fn planned_value(attr: &AttributeDef, value: &Value) -> Value {
    api_value(attr, value).unwrap_or_else(|| attr.empty_value())
}

/// Body of an add request for the planned state.
pub fn add_request_body(def: &ConfigObjectDef, plan: &Value, name: &str) -> Value {
    let object_type = object_type(plan);
    let mut body = Map::new();
    body.insert(
        "schemas".to_string(),
        json!([def.schema_urn(object_type)]),
    );
    body.insert(def.name_property.to_string(), Value::String(name.to_string()));
    for attr in def.attributes.iter().filter(|a| a.applies_to(object_type)) {
        if let Some(value) = plan.get(attr.name).and_then(|v| api_value(attr, v)) {
            body.insert(attr.rest_name.to_string(), value);
        }
    }
    Value::Object(body)
}

/// PATCH operations that bring an object in `state` to `plan`.
///
/// Computed attributes that are null in the plan keep whatever the server has.
pub fn update_operations(def: &ConfigObjectDef, plan: &Value, state: &Value) -> Vec<Operation> {
    let object_type = object_type(plan);
    let mut ops = Vec::new();
    for attr in def.attributes.iter().filter(|a| a.applies_to(object_type)) {
        let planned = plan.get(attr.name).unwrap_or(&Value::Null);
        let current = state.get(attr.name).unwrap_or(&Value::Null);
        if attr.computed && planned.is_null() {
            continue;
        }
        match attr.kind {
            AttributeKind::String => operations::add_string_operation_if_necessary(
                &mut ops,
                planned,
                current,
                attr.rest_name,
            ),
            AttributeKind::StringSet => operations::add_string_set_operations_if_necessary(
                &mut ops,
                planned,
                current,
                attr.rest_name,
            ),
            AttributeKind::Int64 => operations::add_int64_operation_if_necessary(
                &mut ops,
                planned,
                current,
                attr.rest_name,
            ),
            AttributeKind::Float64 => operations::add_float64_operation_if_necessary(
                &mut ops,
                planned,
                current,
                attr.rest_name,
            ),
            AttributeKind::Bool => operations::add_bool_operation_if_necessary(
                &mut ops,
                planned,
                current,
                attr.rest_name,
            ),
        }
    }
    ops
}

fn messages(response: &Value) -> (Value, Value) {
    let block = response.get(MESSAGES_URN).unwrap_or(&Value::Null);
    let notifications = internaltypes::normalize_string_set(&block["notifications"]);
    let required_actions = match block.get("requiredActions") {
        Some(Value::Array(actions)) => Value::Array(
            actions
                .iter()
                .map(|action| {
                    json!({
                        "property": action.get("property").cloned().unwrap_or(Value::Null),
                        "type": action.get("type").cloned().unwrap_or(Value::Null),
                        "synopsis": action.get("synopsis").cloned().unwrap_or(Value::Null),
                    })
                })
                .collect(),
        ),
        _ => Value::Array(Vec::new()),
    };
    (notifications, required_actions)
}

/// Log the notifications and required actions of an API response.
pub fn log_messages(def: &ConfigObjectDef, name: &str, response: &Value) {
    let (notifications, required_actions) = messages(response);
    for notification in notifications.as_array().into_iter().flatten() {
        warn!(
            object = def.display_name,
            name = %name,
            notification = %notification.as_str().unwrap_or_default(),
            "Configuration API notification"
        );
    }
    for action in required_actions.as_array().into_iter().flatten() {
        warn!(
            object = def.display_name,
            name = %name,
            property = %action["property"].as_str().unwrap_or_default(),
            action_type = %action["type"].as_str().unwrap_or_default(),
            synopsis = %action["synopsis"].as_str().unwrap_or_default(),
            "Configuration API requires action"
        );
    }
}

/// Map an API response into resource state.
pub fn state_from_response(def: &ConfigObjectDef, response: &Value, id: &ObjectId) -> Value {
    let mut state = Map::new();
    let object_id = internaltypes::string_value(&response["id"], true).unwrap_or_else(|| id.name.clone());
    state.insert("id".to_string(), Value::String(object_id.clone()));
    state.insert("name".to_string(), Value::String(object_id));
    if let Some(parent) = def.parent {
        state.insert(
            parent.attribute.to_string(),
            internaltypes::string_value_or_null(id.parent.as_deref(), true),
        );
    }
    if def.is_polymorphic() {
        state.insert(
            "type".to_string(),
            internaltypes::string_value_or_null(def.type_from_schemas(response).as_deref(), true),
        );
    }
    for attr in def.attributes {
        state.insert(attr.name.to_string(), state_value(attr, response.get(attr.rest_name)));
    }
    let (notifications, required_actions) = messages(response);
    state.insert("notifications".to_string(), notifications);
    state.insert("required_actions".to_string(), required_actions);
    Value::Object(state)
}

/// Map an API response into data source state (no messages block).
pub fn data_source_state_from_response(
    def: &ConfigObjectDef,
    response: &Value,
    id: &ObjectId,
) -> Value {
    let mut state = state_from_response(def, response, id);
    if let Value::Object(map) = &mut state {
        map.remove("notifications");
        map.remove("required_actions");
    }
    state
}

/// Identity attributes whose change forces replacement.
fn identity_attributes(def: &ConfigObjectDef) -> Vec<&'static str> {
    let mut names = vec!["name"];
    if let Some(parent) = def.parent {
        names.push(parent.attribute);
    }
    if def.is_polymorphic() {
        names.push("type");
    }
    names
}

fn identity_changed(def: &ConfigObjectDef, prior: &Value, config: &Value) -> bool {
    identity_attributes(def)
        .into_iter()
        .any(|name| prior[name].as_str() != config[name].as_str())
}

/// Errors for attributes newer than the configured product version.
pub fn check_attribute_versions(
    def: &ConfigObjectDef,
    config: &Value,
    version: &ProductVersion,
) -> Vec<Diagnostic> {
    def.attributes
        .iter()
        .filter_map(|attr| {
            let min = attr.min_version?;
            let value = config.get(attr.name)?;
            if attr.is_set(value) && !version.is_at_least(&min) {
                Some(
                    Diagnostic::error(format!(
                        "Attribute '{}' not supported by PingDirectory version {}",
                        attr.name, version
                    ))
                    .with_detail(format!("Requires PingDirectory {} or later.", min))
                    .with_attribute(attr.name),
                )
            } else {
                None
            }
        })
        .collect()
}

/// Diff-friendly form: empty sets count as unset.
fn comparable(attr: &AttributeDef, value: &Value) -> Value {
    match attr.kind {
        AttributeKind::StringSet if attr.is_set(value) => internaltypes::normalize_string_set(value),
        AttributeKind::StringSet => Value::Null,
        _ => value.clone(),
    }
}

/// Compute the planned state for `config` given the prior state.
///
/// Optional+computed attributes the config leaves null keep the prior value,
/// unless the object is being replaced. An explicit empty set is planned as
/// empty.
pub fn plan(def: &ConfigObjectDef, prior: Option<&Value>, config: &Value) -> PlanResult {
    let requires_replace = prior.is_some_and(|p| identity_changed(def, p, config));
    let carried = prior.filter(|_| !requires_replace);

    let mut planned = Map::new();
    planned.insert(
        "id".to_string(),
        carried.map(|p| p["id"].clone()).unwrap_or(Value::Null),
    );
    for name in identity_attributes(def) {
        planned.insert(name.to_string(), config[name].clone());
    }
    for attr in def.attributes {
        let configured = config.get(attr.name).unwrap_or(&Value::Null);
        let value = if !configured.is_null() {
            planned_value(attr, configured)
        } else if attr.computed {
            carried
                .map(|p| p[attr.name].clone())
                .unwrap_or(Value::Null)
        } else {
            attr.empty_value()
        };
        planned.insert(attr.name.to_string(), value);
    }
    for name in ["notifications", "required_actions"] {
        planned.insert(
            name.to_string(),
            carried
                .map(|p| p[name].clone())
                .unwrap_or_else(|| Value::Array(Vec::new())),
        );
    }
    let planned = Value::Object(planned);

    let before = prior.cloned().unwrap_or(Value::Null);
    let mut changes = Vec::new();
    for name in identity_attributes(def) {
        if let Some(change) = AttributeChange::between(name, &before[name], &planned[name]) {
            changes.push(change);
        }
    }
    for attr in def.attributes {
        let b = comparable(attr, &before[attr.name]);
        let a = comparable(attr, &planned[attr.name]);
        if attr.computed && planned[attr.name].is_null() {
            continue;
        }
        if let Some(change) = AttributeChange::between(attr.name, &b, &a) {
            changes.push(change);
        }
    }

    PlanResult::with_changes(planned, changes, requires_replace)
}

/// Plan for destroying an object.
pub fn plan_destroy(prior: &Value) -> PlanResult {
    let changes = match prior.get("id") {
        Some(id) if !id.is_null() => vec![AttributeChange::removed("id", id.clone())],
        _ => Vec::new(),
    };
    PlanResult::with_changes(Value::Null, changes, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{connection_criteria, location, monitoring_endpoint, token_claim_validation};
    use crate::schema::AttributeType;
    use pretty_assertions::assert_eq;

    fn simple_criteria_response() -> Value {
        json!({
            "schemas": ["urn:pingidentity:schemas:configuration:2.0:connection-criteria:simple"],
            "id": "Internal",
            "includedProtocol": ["LDAP", "HTTP"],
            "communicationSecurityLevel": "all",
            "userAuthType": ["simple", "sasl"],
            "urn:pingidentity:schemas:configuration:messages:2.0": {
                "notifications": ["restart not required"],
                "requiredActions": [
                    {"property": "includedProtocol", "type": "component-restart", "synopsis": "Restart the handler"}
                ]
            }
        })
    }

    #[test]
    fn test_import_ids() {
        let def = &token_claim_validation::DEFINITION;
        let id = ObjectId::from_import_id(def, "validator/sub").unwrap();
        assert_eq!(id.parent.as_deref(), Some("validator"));
        assert_eq!(id.name, "sub");
        assert!(ObjectId::from_import_id(def, "sub").is_err());
        assert!(ObjectId::from_import_id(def, "/sub").is_err());

        let id = ObjectId::from_import_id(&location::DEFINITION, "east").unwrap();
        assert_eq!(id.parent, None);
        assert!(ObjectId::from_import_id(&location::DEFINITION, "").is_err());
    }

    #[test]
    fn test_object_id_from_state() {
        let def = &token_claim_validation::DEFINITION;
        let id = ObjectId::from_state(def, &json!({"name": "sub", "id_token_validator_name": "v"}))
            .unwrap();
        assert_eq!(id.path(def), "/id-token-validators/v/token-claim-validations/sub");
        assert!(ObjectId::from_state(def, &json!({"name": "sub"})).is_err());
    }

    #[test]
    fn test_add_request_body() {
        let def = &connection_criteria::DEFINITION;
        let plan = json!({
            "name": "Internal",
            "type": "simple",
            "description": "Internal clients",
            "included_protocol": ["LDAP", "HTTP"],
            "excluded_protocol": [],
            "communication_security_level": null,
            "extension_class": null
        });
        assert_eq!(
            add_request_body(def, &plan, "Internal"),
            json!({
                "schemas": ["urn:pingidentity:schemas:configuration:2.0:connection-criteria:simple"],
                "connectionCriteriaName": "Internal",
                "description": "Internal clients",
                "includedProtocol": ["HTTP", "LDAP"]
            })
        );
    }

    #[test]
    fn test_add_request_body_numbers_and_bools() {
        let def = &monitoring_endpoint::DEFINITION;
        let plan = json!({
            "name": "statsd",
            "type": "statsd",
            "hostname": "metrics.example.com",
            "server_port": 8125,
            "enabled": false
        });
        let body = add_request_body(def, &plan, "statsd");
        assert_eq!(body["serverPort"], json!(8125));
        assert_eq!(body["enabled"], json!(false));
        assert_eq!(body["monitoringEndpointName"], json!("statsd"));
    }

    #[test]
    fn test_state_from_response() {
        let def = &connection_criteria::DEFINITION;
        let id = ObjectId {
            name: "Internal".to_string(),
            parent: None,
        };
        let state = state_from_response(def, &simple_criteria_response(), &id);
        assert_eq!(state["id"], json!("Internal"));
        assert_eq!(state["type"], json!("simple"));
        assert_eq!(state["included_protocol"], json!(["HTTP", "LDAP"]));
        assert_eq!(state["excluded_protocol"], json!([]));
        assert_eq!(state["description"], Value::Null);
        assert_eq!(state["communication_security_level"], json!("all"));
        assert_eq!(state["notifications"], json!(["restart not required"]));
        assert_eq!(
            state["required_actions"],
            json!([{"property": "includedProtocol", "type": "component-restart", "synopsis": "Restart the handler"}])
        );

        let ds = data_source_state_from_response(def, &simple_criteria_response(), &id);
        assert!(ds.get("notifications").is_none());
    }

    #[test]
    fn test_state_keeps_parent_name() {
        let def = &token_claim_validation::DEFINITION;
        let id = ObjectId {
            name: "sub".to_string(),
            parent: Some("validator".to_string()),
        };
        let state = state_from_response(
            def,
            &json!({
                "schemas": ["urn:pingidentity:schemas:configuration:2.0:token-claim-validation:string"],
                "id": "sub",
                "claimName": "sub",
                "anyRequiredValue": "alice"
            }),
            &id,
        );
        assert_eq!(state["id_token_validator_name"], json!("validator"));
        assert_eq!(state["type"], json!("string"));
        assert_eq!(state["any_required_value"], json!(["alice"]));
    }

    #[test]
    fn test_update_operations_only_changed() {
        let def = &connection_criteria::DEFINITION;
        let state = json!({
            "type": "simple",
            "description": "old",
            "included_protocol": ["LDAP"],
            "excluded_protocol": ["HTTP"],
            "communication_security_level": "all"
        });
        let plan = json!({
            "type": "simple",
            "description": "old",
            "included_protocol": ["LDAP", "LDAPS"],
            "excluded_protocol": [],
            "communication_security_level": null
        });
        assert_eq!(
            update_operations(def, &plan, &state),
            vec![
                Operation::add_values("includedProtocol", vec!["LDAPS".into()]),
                Operation::remove("excludedProtocol"),
            ]
        );
        assert!(update_operations(def, &state, &state).is_empty());
    }

    #[test]
    fn test_plan_create() {
        let def = &connection_criteria::DEFINITION;
        let config = json!({
            "name": "Internal",
            "type": "simple",
            "description": "Internal clients",
            "included_protocol": ["LDAP"]
        });
        let result = plan(def, None, &config);
        assert!(!result.requires_replace);
        assert_eq!(result.planned_state["id"], Value::Null);
        assert_eq!(result.planned_state["excluded_protocol"], json!([]));
        assert_eq!(result.planned_state["communication_security_level"], Value::Null);
        let paths: Vec<&str> = result.changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "type", "description", "included_protocol"]);
    }

    #[test]
    fn test_plan_carries_computed_values() {
        let def = &connection_criteria::DEFINITION;
        let prior = json!({
            "id": "Internal",
            "name": "Internal",
            "type": "simple",
            "description": null,
            "included_protocol": ["LDAP"],
            "communication_security_level": "all",
            "user_auth_type": ["sasl", "simple"],
            "notifications": [],
            "required_actions": []
        });
        let config = json!({
            "name": "Internal",
            "type": "simple",
            "included_protocol": ["LDAP"]
        });
        let result = plan(def, Some(&prior), &config);
        assert!(result.is_no_op());
        assert_eq!(result.planned_state["id"], json!("Internal"));
        assert_eq!(result.planned_state["communication_security_level"], json!("all"));
        assert_eq!(result.planned_state["user_auth_type"], json!(["sasl", "simple"]));
    }

    #[test]
    fn test_plan_clears_computed_set() {
        let def = &connection_criteria::DEFINITION;
        let prior = json!({
            "id": "Internal",
            "name": "Internal",
            "type": "simple",
            "communication_security_level": "all",
            "user_auth_type": ["sasl", "simple"],
            "notifications": [],
            "required_actions": []
        });
        let config = json!({"name": "Internal", "type": "simple", "user_auth_type": []});

        let result = plan(def, Some(&prior), &config);
        assert_eq!(result.planned_state["user_auth_type"], json!([]));
        assert_eq!(result.planned_state["communication_security_level"], json!("all"));
        assert_eq!(
            result.changes,
            vec![AttributeChange::removed("user_auth_type", json!(["sasl", "simple"]))]
        );

        let ops = update_operations(def, &result.planned_state, &prior);
        assert_eq!(ops, vec![Operation::remove("userAuthType")]);
    }

    #[test]
    fn test_update_operations_skip_null_computed() {
        let def = &connection_criteria::DEFINITION;
        let state = json!({"type": "simple", "user_auth_type": ["sasl"]});
        let plan = json!({"type": "simple", "user_auth_type": null});
        assert!(update_operations(def, &plan, &state).is_empty());
    }

    #[test]
    fn test_float64_attribute_values() {
        let attr = AttributeDef::float64("sample_ratio", "sampleRatio");
        assert_eq!(attr.kind.attribute_type(), AttributeType::Float64);
        assert_eq!(state_value(&attr, Some(&json!("0.75"))), json!(0.75));
        assert_eq!(state_value(&attr, None), Value::Null);
        assert_eq!(api_value(&attr, &json!(0.5)), Some(json!(0.5)));
        assert_eq!(api_value(&attr, &Value::Null), None);
        assert_eq!(planned_value(&attr, &Value::Null), Value::Null);
    }

    #[test]
    fn test_plan_replace_on_type_change() {
        let def = &connection_criteria::DEFINITION;
        let prior = json!({
            "id": "c",
            "name": "c",
            "type": "simple",
            "communication_security_level": "all"
        });
        let config = json!({"name": "c", "type": "aggregate"});
        let result = plan(def, Some(&prior), &config);
        assert!(result.requires_replace);
        assert_eq!(result.planned_state["id"], Value::Null);
        assert_eq!(result.planned_state["communication_security_level"], Value::Null);
    }

    #[test]
    fn test_plan_replace_on_parent_change() {
        let def = &token_claim_validation::DEFINITION;
        let prior = json!({"id": "sub", "name": "sub", "id_token_validator_name": "a", "type": "string", "claim_name": "sub"});
        let config = json!({"name": "sub", "id_token_validator_name": "b", "type": "string", "claim_name": "sub"});
        assert!(plan(def, Some(&prior), &config).requires_replace);
    }

    #[test]
    fn test_attribute_versions() {
        let def = &monitoring_endpoint::DEFINITION;
        let config = json!({"name": "m", "type": "statsd", "connection_type": "encrypted-tcp"});
        let diags = check_attribute_versions(def, &config, &ProductVersion::new(9, 1, 0, 0));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute.as_deref(), Some("connection_type"));
        assert!(check_attribute_versions(def, &config, &ProductVersion::new(9, 2, 0, 0)).is_empty());
        assert!(check_attribute_versions(
            def,
            &json!({"name": "m", "type": "statsd"}),
            &ProductVersion::new(9, 0, 0, 0)
        )
        .is_empty());
    }

    #[test]
    fn test_plan_destroy() {
        let result = plan_destroy(&json!({"id": "east"}));
        assert_eq!(result.planned_state, Value::Null);
        assert_eq!(result.changes, vec![AttributeChange::removed("id", json!("east"))]);
    }
}
