//! Locations: named groups of servers, typically one per data center.

use super::{AttributeDef, ConfigObjectDef, ObjectMode};

/// Location definition.
pub static DEFINITION: ConfigObjectDef = ConfigObjectDef {
    kind: "location",
    plural: "locations",
    display_name: "Location",
    collection: "/locations",
    parent: None,
    urn: "urn:pingidentity:schemas:configuration:2.0:location",
    name_property: "locationName",
    types: &[],
    mode: ObjectMode::Creatable,
    attributes: &[AttributeDef::string("description", "description")
        .describe("A description for this Location")],
};
