//! Connection Criteria: rules that match client connections.

use super::{AttributeDef, ConfigObjectDef, ObjectMode};

const SIMPLE: &[&str] = &["simple"];
const AGGREGATE: &[&str] = &["aggregate"];
const THIRD_PARTY: &[&str] = &["third-party"];

/// Connection Criteria definition.
pub static DEFINITION: ConfigObjectDef = ConfigObjectDef {
    kind: "connection_criteria",
    plural: "connection_criterias",
    display_name: "Connection Criteria",
    collection: "/connection-criteria",
    parent: None,
    urn: "urn:pingidentity:schemas:configuration:2.0:connection-criteria",
    name_property: "connectionCriteriaName",
    types: &["simple", "aggregate", "third-party"],
    mode: ObjectMode::Creatable,
    attributes: &[
        AttributeDef::string("description", "description")
            .describe("A description for this Connection Criteria"),
        AttributeDef::string("extension_class", "extensionClass")
            .describe("The fully-qualified name of the Java class providing the logic for the Third Party Connection Criteria.")
            .for_types(THIRD_PARTY)
            .required_for(THIRD_PARTY),
        AttributeDef::string_set("extension_argument", "extensionArgument")
            .describe("The set of arguments used to customize the behavior for the Third Party Connection Criteria. Each configuration property should be given in the form 'name=value'.")
            .for_types(THIRD_PARTY),
        AttributeDef::string_set("all_included_connection_criteria", "allIncludedConnectionCriteria")
            .describe("Specifies a connection criteria object that must match the associated client connection.")
            .for_types(AGGREGATE),
        AttributeDef::string_set("any_included_connection_criteria", "anyIncludedConnectionCriteria")
            .describe("Specifies a connection criteria object that may match the associated client connection.")
            .for_types(AGGREGATE),
        AttributeDef::string_set("not_all_included_connection_criteria", "notAllIncludedConnectionCriteria")
            .describe("Specifies a connection criteria object that should not match the associated client connection.")
            .for_types(AGGREGATE),
        AttributeDef::string_set("none_included_connection_criteria", "noneIncludedConnectionCriteria")
            .describe("Specifies a connection criteria object that must not match the associated client connection.")
            .for_types(AGGREGATE),
        AttributeDef::string_set("included_client_address", "includedClientAddress")
            .describe("Specifies an address mask that may be used to specify a set of clients that should match the criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("excluded_client_address", "excludedClientAddress")
            .describe("Specifies an address mask that may be used to specify a set of clients that should not match the criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("included_connection_handler", "includedConnectionHandler")
            .describe("Specifies a connection handler for clients that should match the criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("excluded_connection_handler", "excludedConnectionHandler")
            .describe("Specifies a connection handler for clients that should not match the criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("included_protocol", "includedProtocol")
            .describe("Specifies the name of a communication protocol that should be used by clients that match the criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("excluded_protocol", "excludedProtocol")
            .describe("Specifies the name of a communication protocol that should be used by clients that should not match the criteria.")
            .for_types(SIMPLE),
        AttributeDef::string("communication_security_level", "communicationSecurityLevel")
            .describe("Indicates whether this Simple Connection Criteria should require or allow clients using a secure communication channel.")
            .for_types(SIMPLE)
            .computed()
            .one_of(&["all", "secure-only", "insecure-only"]),
        AttributeDef::string_set("user_auth_type", "userAuthType")
            .describe("Specifies the authentication types for client connections that may be included in this Simple Connection Criteria.")
            .for_types(SIMPLE)
            .computed()
            .one_of(&["none", "simple", "sasl", "internal"]),
        AttributeDef::string_set("user_sasl_mechanism", "userSASLMechanism")
            .describe("Specifies the names of the SASL mechanisms that should be used by clients that match the criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("included_user_base_dn", "includedUserBaseDN")
            .describe("Specifies a base DN below which authenticated user entries may exist for client connections included in this Simple Connection Criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("excluded_user_base_dn", "excludedUserBaseDN")
            .describe("Specifies a base DN below which authenticated user entries may not exist for client connections included in this Simple Connection Criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("all_included_user_group_dn", "allIncludedUserGroupDN")
            .describe("Specifies the DN of a group in which authenticated users must exist for clients included in this Simple Connection Criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("any_included_user_group_dn", "anyIncludedUserGroupDN")
            .describe("Specifies the DN of a group in which authenticated users may exist for clients included in this Simple Connection Criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("not_all_included_user_group_dn", "notAllIncludedUserGroupDN")
            .describe("Specifies the DN of a group in which authenticated users should not exist for clients included in this Simple Connection Criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("none_included_user_group_dn", "noneIncludedUserGroupDN")
            .describe("Specifies the DN of a group in which authenticated users must not exist for clients included in this Simple Connection Criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("all_included_user_filter", "allIncludedUserFilter")
            .describe("Specifies a search filter that must match the entry of the authenticated user for clients included in this Simple Connection Criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("any_included_user_filter", "anyIncludedUserFilter")
            .describe("Specifies a search filter that may match the entry of the authenticated user for clients included in this Simple Connection Criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("not_all_included_user_filter", "notAllIncludedUserFilter")
            .describe("Specifies a search filter that should not match the entry of the authenticated user for clients included in this Simple Connection Criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("none_included_user_filter", "noneIncludedUserFilter")
            .describe("Specifies a search filter that must not match the entry of the authenticated user for clients included in this Simple Connection Criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("all_included_user_privilege", "allIncludedUserPrivilege")
            .describe("Specifies the name of a privilege that must be held by the authenticated user for clients included in this Simple Connection Criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("any_included_user_privilege", "anyIncludedUserPrivilege")
            .describe("Specifies the name of a privilege that may be held by the authenticated user for clients included in this Simple Connection Criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("not_all_included_user_privilege", "notAllIncludedUserPrivilege")
            .describe("Specifies the name of a privilege that should not be held by the authenticated user for clients included in this Simple Connection Criteria.")
            .for_types(SIMPLE),
        AttributeDef::string_set("none_included_user_privilege", "noneIncludedUserPrivilege")
            .describe("Specifies the name of a privilege that must not be held by the authenticated user for clients included in this Simple Connection Criteria.")
            .for_types(SIMPLE),
    ],
};
