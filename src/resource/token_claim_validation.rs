//! Token Claim Validations: claim checks applied by an ID Token Validator.
//!
//! These are children of an ID Token Validator, so every path is scoped by
//! `id_token_validator_name`.

use super::{AttributeDef, ConfigObjectDef, ObjectMode, ParentDef};

const STRING_ARRAY: &[&str] = &["string-array"];
const BOOLEAN: &[&str] = &["boolean"];

/// Token Claim Validation definition.
pub static DEFINITION: ConfigObjectDef = ConfigObjectDef {
    kind: "token_claim_validation",
    plural: "token_claim_validations",
    display_name: "Token Claim Validation",
    collection: "/token-claim-validations",
    parent: Some(ParentDef {
        attribute: "id_token_validator_name",
        collection: "/id-token-validators",
        description: "Name of the parent ID Token Validator",
    }),
    urn: "urn:pingidentity:schemas:configuration:2.0:token-claim-validation",
    name_property: "tokenClaimValidationName",
    types: &["string-array", "boolean", "string"],
    mode: ObjectMode::Creatable,
    attributes: &[
        AttributeDef::string("description", "description")
            .describe("A description for this Token Claim Validation"),
        AttributeDef::string("claim_name", "claimName")
            .describe("The name of the claim to be validated.")
            .required(),
        AttributeDef::string_set("all_required_value", "allRequiredValue")
            .describe("The set of all values that the claim must have to be considered valid.")
            .for_types(STRING_ARRAY),
        AttributeDef::string_set("any_required_value", "anyRequiredValue")
            .describe("The set of values that the claim may have to be considered valid.")
            .for_types(&["string-array", "string"]),
        AttributeDef::string("required_value", "requiredValue")
            .describe("Specifies the boolean claim's required value.")
            .for_types(BOOLEAN)
            .required_for(BOOLEAN)
            .one_of(&["true", "false"]),
    ],
};
