//! Configuration validation.
//!
//! [`validate`] checks a config value against a [`Schema`] and reports every
//! problem it finds as a [`Diagnostic`], so the host can show them all at
//! once. [`validate_type_restrictions`] layers the rules that depend on an
//! object's `type` on top.
//!
//! ```
//! use pingdirectory_provider::schema::{Attribute, Schema};
//! use pingdirectory_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute(
//!         "communication_security_level",
//!         Attribute::optional_string().with_allowed_values(["all", "secure-only", "insecure-only"]),
//!     );
//!
//! assert!(validate(&schema, &json!({"name": "Internal"})).is_empty());
//!
//! let diagnostics = validate(
//!     &schema,
//!     &json!({"name": "Internal", "communication_security_level": "sometimes"}),
//! );
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(
//!     diagnostics[0].attribute.as_deref(),
//!     Some("communication_security_level")
//! );
//! ```

use serde_json::{Map, Value};

use crate::resource::ConfigObjectDef;
use crate::schema::{Attribute, AttributeType, Diagnostic, Schema};

/// Check `config` against `schema`.
///
/// A null config is treated as an empty object. Attributes that are only
/// computed are never checked. An empty result means the config is valid.
pub fn validate(schema: &Schema, config: &Value) -> Vec<Diagnostic> {
    let empty = Map::new();
    let fields = match config {
        Value::Object(fields) => fields,
        Value::Null => &empty,
        other => {
            return vec![Diagnostic::error("Expected object")
                .with_detail(format!("Got {}", kind_of(other)))]
        },
    };

    let mut checker = Checker::default();
    for (name, attr) in &schema.attributes {
        checker.attribute(name, attr, fields.get(name));
    }
    checker.diagnostics
}

/// Check the per-`type` rules of a configuration object kind.
///
/// - `type` must be one of the kind's types
/// - attributes set in `config` must apply to the configured `type`
/// - attributes required for the configured `type` must be set
pub fn validate_type_restrictions(def: &ConfigObjectDef, config: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if !def.is_polymorphic() {
        return diagnostics;
    }

    let object_type = match config.get("type") {
        Some(Value::String(t)) => t.as_str(),
        // Missing or mistyped `type` is reported by `validate`.
        _ => return diagnostics,
    };
    if !def.types.contains(&object_type) {
        diagnostics.push(
            Diagnostic::error(format!(
                "Invalid type '{}' for {}",
                object_type,
                def.resource_type_name()
            ))
            .with_detail(format!("Expected one of: {}", def.types.join(", ")))
            .with_attribute("type"),
        );
        return diagnostics;
    }

    for attr in def.attributes {
        let value = config.get(attr.name).unwrap_or(&Value::Null);
        if attr.is_set(value) && !attr.applies_to(Some(object_type)) {
            diagnostics.push(
                Diagnostic::error(format!(
                    "Attribute '{}' not supported by {} configuration objects of type '{}'",
                    attr.name,
                    def.resource_type_name(),
                    object_type
                ))
                .with_attribute(attr.name),
            );
        }
        if attr.required_for.contains(&object_type) && !attr.is_set(value) {
            diagnostics.push(
                Diagnostic::error(format!(
                    "Attribute '{}' must be set for {} configuration objects of type '{}'",
                    attr.name,
                    def.resource_type_name(),
                    object_type
                ))
                .with_attribute(attr.name),
            );
        }
    }
    diagnostics
}

#[derive(Default)]
struct Checker {
    diagnostics: Vec<Diagnostic>,
}

impl Checker {
    fn attribute(&mut self, name: &str, attr: &Attribute, value: Option<&Value>) {
        let flags = &attr.flags;
        if flags.computed && !flags.optional && !flags.required {
            return;
        }

        let value = match value {
            Some(v) if !v.is_null() => v,
            _ => {
                if flags.required {
                    self.diagnostics.push(
                        Diagnostic::error(format!("Missing required attribute '{}'", name))
                            .with_detail("This attribute is required and must be provided")
                            .with_attribute(name),
                    );
                }
                return;
            },
        };

        if self.value(name, &attr.attr_type, value) && !attr.allowed_values.is_empty() {
            self.allowed(name, &attr.allowed_values, value);
        }
    }

    /// Type-check `value`, returning whether it passed.
    fn value(&mut self, path: &str, expected: &AttributeType, value: &Value) -> bool {
        let ok = match (expected, value) {
            (AttributeType::String, Value::String(_)) | (AttributeType::Bool, Value::Bool(_)) => true,
            (AttributeType::Int64, Value::Number(n)) => {
                n.as_i64().is_some() || n.as_f64().is_some_and(whole_i64)
            },
            (AttributeType::Float64, Value::Number(_)) => true,
            (AttributeType::Set(element), Value::Array(items)) => {
                let mut ok = true;
                for (i, item) in items.iter().enumerate() {
                    ok &= self.value(&format!("{}.{}", path, i), element, item);
                }
                return ok;
            },
            (AttributeType::Object(fields), Value::Object(object)) => {
                let mut ok = true;
                for (field, field_type) in fields {
                    if let Some(v) = object.get(field).filter(|v| !v.is_null()) {
                        ok &= self.value(&format!("{}.{}", path, field), field_type, v);
                    }
                }
                return ok;
            },
            _ => false,
        };
        if !ok {
            self.diagnostics.push(
                Diagnostic::error(format!("Invalid type for attribute '{}'", path))
                    .with_detail(format!("Expected {}, got {}", type_label(expected), kind_of(value)))
                    .with_attribute(path),
            );
        }
        ok
    }

    fn allowed(&mut self, name: &str, allowed: &[String], value: &Value) {
        let given: Vec<&str> = match value {
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            other => other.as_str().into_iter().collect(),
        };
        for v in given.into_iter().filter(|v| !allowed.iter().any(|a| a == v)) {
            self.diagnostics.push(
                Diagnostic::error(format!("Invalid value '{}' for attribute '{}'", v, name))
                    .with_detail(format!("Expected one of: {}", allowed.join(", ")))
                    .with_attribute(name),
            );
        }
    }
}

fn whole_i64(f: f64) -> bool {
    f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
}

fn type_label(t: &AttributeType) -> &'static str {
    match t {
        AttributeType::String => "string",
        AttributeType::Int64 => "int64",
        AttributeType::Float64 => "float64",
        AttributeType::Bool => "bool",
        AttributeType::Set(_) => "set",
        AttributeType::Object(_) => "object",
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{connection_criteria, location, monitoring_endpoint, token_claim_validation};
    use crate::schema::AttributeFlags;
    use serde_json::json;

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        // Valid
        let diagnostics = validate(&schema, &json!({"name": "test"}));
        assert!(diagnostics.is_empty());

        // Missing required
        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("name".to_string()));

        // Null value
        let diagnostics = validate(&schema, &json!({"name": null}));
        assert_eq!(diagnostics.len(), 1);

        // Wrong type
        let diagnostics = validate(&schema, &json!({"name": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_null_config_reports_required() {
        let schema = Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("description", Attribute::optional_string());
        let diagnostics = validate(&schema, &Value::Null);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("name"));

        let diagnostics = validate(&schema, &json!("nope"));
        assert_eq!(diagnostics[0].summary, "Expected object");
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = Schema::v0().with_attribute("id", Attribute::computed_string());

        let diagnostics = validate(&schema, &json!({}));
        assert!(diagnostics.is_empty());

        // Even with wrong type, we don't validate computed-only attrs
        let diagnostics = validate(&schema, &json!({"id": 123}));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_validate_int64() {
        let schema = Schema::v0().with_attribute(
            "server_port",
            Attribute::new(AttributeType::Int64, AttributeFlags::OPTIONAL_COMPUTED),
        );

        assert!(validate(&schema, &json!({"server_port": 8125})).is_empty());
        assert!(validate(&schema, &json!({"server_port": 8125.0})).is_empty());
        assert_eq!(validate(&schema, &json!({"server_port": 8125.5})).len(), 1);
        assert_eq!(validate(&schema, &json!({"server_port": "8125"})).len(), 1);
    }

    #[test]
    fn test_validate_bool() {
        let schema = Schema::v0().with_attribute("enabled", Attribute::optional_bool());

        assert!(validate(&schema, &json!({"enabled": true})).is_empty());
        assert_eq!(validate(&schema, &json!({"enabled": "true"})).len(), 1);
    }

    #[test]
    fn test_validate_string_set() {
        let schema = Schema::v0().with_attribute("included_protocol", Attribute::optional_string_set());

        assert!(validate(&schema, &json!({"included_protocol": ["LDAP", "HTTP"]})).is_empty());

        let diagnostics = validate(&schema, &json!({"included_protocol": ["LDAP", 7]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("included_protocol.1"));

        let diagnostics = validate(&schema, &json!({"included_protocol": "LDAP"}));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_validate_allowed_values_in_sets() {
        let schema = Schema::v0().with_attribute(
            "user_auth_type",
            Attribute::optional_string_set().with_allowed_values(["none", "simple", "sasl", "internal"]),
        );

        assert!(validate(&schema, &json!({"user_auth_type": ["simple", "sasl"]})).is_empty());

        let diagnostics = validate(&schema, &json!({"user_auth_type": ["simple", "kerberos"]}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("kerberos"));
    }

    #[test]
    fn test_validate_object_set() {
        let schema = Schema::v0().with_attribute(
            "required_actions",
            Attribute::new(
                AttributeType::set(AttributeType::object([("property", AttributeType::String)])),
                AttributeFlags::OPTIONAL,
            ),
        );
        assert!(validate(&schema, &json!({"required_actions": [{"property": "x"}]})).is_empty());
        assert_eq!(
            validate(&schema, &json!({"required_actions": [{"property": 1}]})).len(),
            1
        );
    }

    #[test]
    fn test_type_restrictions_reject_foreign_attributes() {
        let def = &connection_criteria::DEFINITION;
        let config = json!({
            "name": "c",
            "type": "aggregate",
            "included_protocol": ["LDAP"],
            "all_included_connection_criteria": ["other"]
        });
        let diagnostics = validate_type_restrictions(def, &config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].summary,
            "Attribute 'included_protocol' not supported by pingdirectory_connection_criteria configuration objects of type 'aggregate'"
        );
    }

    #[test]
    fn test_type_restrictions_ignore_empty_values() {
        let def = &connection_criteria::DEFINITION;
        let config = json!({"name": "c", "type": "aggregate", "included_protocol": [], "extension_class": null});
        assert!(validate_type_restrictions(def, &config).is_empty());
    }

    #[test]
    fn test_type_restrictions_required_for_type() {
        let def = &monitoring_endpoint::DEFINITION;
        let diagnostics =
            validate_type_restrictions(def, &json!({"name": "m", "type": "third-party", "enabled": true}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("extension_class"));

        let def = &token_claim_validation::DEFINITION;
        let diagnostics = validate_type_restrictions(
            def,
            &json!({"name": "v", "type": "boolean", "claim_name": "email_verified"}),
        );
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("required_value"));
    }

    #[test]
    fn test_type_restrictions_unknown_type() {
        let def = &connection_criteria::DEFINITION;
        let diagnostics = validate_type_restrictions(def, &json!({"name": "c", "type": "complex"}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("type"));
    }

    #[test]
    fn test_type_restrictions_not_polymorphic() {
        let def = &location::DEFINITION;
        assert!(validate_type_restrictions(def, &json!({"name": "east", "description": "x"})).is_empty());
    }
}
