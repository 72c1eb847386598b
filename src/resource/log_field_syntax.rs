//! Log Field Syntaxes: how log fields of a given syntax are written.
//!
//! The server ships one object per syntax and they cannot be created or
//! removed, so only the default resource exists for this kind.

use super::{AttributeDef, ConfigObjectDef, ObjectMode};

const JSON: &[&str] = &["json"];

/// Log Field Syntax definition.
pub static DEFINITION: ConfigObjectDef = ConfigObjectDef {
    kind: "log_field_syntax",
    plural: "log_field_syntaxes",
    display_name: "Log Field Syntax",
    collection: "/log-field-syntaxes",
    parent: None,
    urn: "urn:pingidentity:schemas:configuration:2.0:log-field-syntax",
    name_property: "logFieldSyntaxName",
    types: &["json", "csv", "generic"],
    mode: ObjectMode::DefaultOnly,
    attributes: &[
        AttributeDef::string("description", "description")
            .describe("A description for this Log Field Syntax"),
        AttributeDef::string("default_behavior", "defaultBehavior")
            .describe("The default behavior that the server should exhibit when logging fields with this syntax.")
            .computed()
            .one_of(&[
                "preserve",
                "omit",
                "redact-entire-value",
                "redact-value-components",
                "tokenize-entire-value",
                "tokenize-value-components",
            ]),
        AttributeDef::string_set("included_sensitive_field", "includedSensitiveField")
            .describe("The unique names of the JSON fields containing values that should be considered sensitive.")
            .for_types(JSON),
        AttributeDef::string_set("excluded_sensitive_field", "excludedSensitiveField")
            .describe("The unique names of the JSON fields containing values that should not be considered sensitive.")
            .for_types(JSON),
    ],
};
