//! Monitoring Endpoints: destinations for server metrics.

use super::{AttributeDef, ConfigObjectDef, ObjectMode};
use crate::version::ProductVersion;

const STATSD: &[&str] = &["statsd"];
const THIRD_PARTY: &[&str] = &["third-party"];

/// The release that added TCP and TLS transports for StatsD endpoints.
const STATSD_TCP_VERSION: ProductVersion = ProductVersion::new(9, 2, 0, 0);

/// Monitoring Endpoint definition.
pub static DEFINITION: ConfigObjectDef = ConfigObjectDef {
    kind: "monitoring_endpoint",
    plural: "monitoring_endpoints",
    display_name: "Monitoring Endpoint",
    collection: "/monitoring-endpoints",
    parent: None,
    urn: "urn:pingidentity:schemas:configuration:2.0:monitoring-endpoint",
    name_property: "monitoringEndpointName",
    types: &["statsd", "third-party"],
    mode: ObjectMode::Creatable,
    attributes: &[
        AttributeDef::string("hostname", "hostname")
            .describe("The name of the host where this StatsD Monitoring Endpoint should send metric data.")
            .for_types(STATSD)
            .required_for(STATSD),
        AttributeDef::int64("server_port", "serverPort")
            .describe("Specifies the port number of the endpoint where metric data should be sent.")
            .for_types(STATSD)
            .computed(),
        AttributeDef::string("connection_type", "connectionType")
            .describe("Specifies the protocol and security that will be used to send metric data.")
            .for_types(STATSD)
            .computed()
            .one_of(&["unencrypted-udp", "unencrypted-tcp", "encrypted-tcp"])
            .since(STATSD_TCP_VERSION),
        AttributeDef::string("trust_manager_provider", "trustManagerProvider")
            .describe("The trust manager provider to use if SSL (HTTPS) is to be used for connection-level security.")
            .for_types(STATSD)
            .since(STATSD_TCP_VERSION),
        AttributeDef::string_set("additional_tags", "additionalTags")
            .describe("Specifies any optional additional tags to include in StatsD messages. Any additional tags will be appended to the end of each StatsD message, separated by commas. Tags should be written in a [key]:[value] format (\"host:server1\", for example).")
            .for_types(STATSD),
        AttributeDef::string("extension_class", "extensionClass")
            .describe("The fully-qualified name of the Java class providing the logic for the Third Party Monitoring Endpoint.")
            .for_types(THIRD_PARTY)
            .required_for(THIRD_PARTY),
        AttributeDef::string_set("extension_argument", "extensionArgument")
            .describe("The set of arguments used to customize the behavior for the Third Party Monitoring Endpoint. Each configuration property should be given in the form 'name=value'.")
            .for_types(THIRD_PARTY),
        AttributeDef::bool("enabled", "enabled")
            .describe("Indicates whether this Monitoring Endpoint is enabled for use in the Directory Server.")
            .required(),
    ],
};
