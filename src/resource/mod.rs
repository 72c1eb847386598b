//! Configuration object definitions.
//!
//! Every PingDirectory configuration object kind is described once by a
//! static [`ConfigObjectDef`]: where it lives in the API, which `type`s it
//! has, and how each attribute maps to a REST property. The generic adapter
//! in [`adapter`] performs CRUD for all of them.

pub mod adapter;
pub mod connection_criteria;
pub mod location;
pub mod log_field_syntax;
pub mod monitoring_endpoint;
pub mod state;
pub mod token_claim_validation;

use serde_json::Value;

use crate::client::encode_segment;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};
use crate::version::ProductVersion;

/// Prefix shared by every resource and data source type name.
pub const TYPE_NAME_PREFIX: &str = "pingdirectory_";

/// Schema URN prefix of configuration objects.
pub const SCHEMA_URN_PREFIX: &str = "urn:pingidentity:schemas:configuration:2.0";

/// Key of the messages block in API responses.
pub const MESSAGES_URN: &str = "urn:pingidentity:schemas:configuration:messages:2.0";

/// Value shape of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Single string.
    String,
    /// Multi-valued string property.
    StringSet,
    /// Integer.
    Int64,
    /// Floating point.
    Float64,
    /// Boolean.
    Bool,
}

impl AttributeKind {
    /// Schema type for this kind.
    pub fn attribute_type(self) -> AttributeType {
        match self {
            Self::String => AttributeType::String,
            Self::StringSet => AttributeType::string_set(),
            Self::Int64 => AttributeType::Int64,
            Self::Float64 => AttributeType::Float64,
            Self::Bool => AttributeType::Bool,
        }
    }
}

/// One attribute of a configuration object.
#[derive(Debug, Clone, Copy)]
pub struct AttributeDef {
    /// Name in state and configuration.
    pub name: &'static str,
    /// Name of the REST property.
    pub rest_name: &'static str,
    /// Value shape.
    pub kind: AttributeKind,
    /// Documentation.
    pub description: &'static str,
    /// `type`s this attribute applies to; empty means all.
    pub types: &'static [&'static str],
    /// Always required.
    pub required: bool,
    /// `type`s for which the attribute must be set.
    pub required_for: &'static [&'static str],
    /// The server supplies a value when the configuration leaves it unset.
    pub computed: bool,
    /// Accepted values; empty means any.
    pub allowed_values: &'static [&'static str],
    /// First product version that knows this attribute.
    pub min_version: Option<ProductVersion>,
}

impl AttributeDef {
    const fn new(name: &'static str, rest_name: &'static str, kind: AttributeKind) -> Self {
        Self {
            name,
            rest_name,
            kind,
            description: "",
            types: &[],
            required: false,
            required_for: &[],
            computed: false,
            allowed_values: &[],
            min_version: None,
        }
    }

    /// A single-valued string attribute.
    pub const fn string(name: &'static str, rest_name: &'static str) -> Self {
        Self::new(name, rest_name, AttributeKind::String)
    }

    /// A multi-valued string attribute.
    pub const fn string_set(name: &'static str, rest_name: &'static str) -> Self {
        Self::new(name, rest_name, AttributeKind::StringSet)
    }

    /// An integer attribute.
    pub const fn int64(name: &'static str, rest_name: &'static str) -> Self {
        Self::new(name, rest_name, AttributeKind::Int64)
    }

    /// A floating point attribute.
    pub const fn float64(name: &'static str, rest_name: &'static str) -> Self {
        Self::new(name, rest_name, AttributeKind::Float64)
    }

    /// A boolean attribute.
    pub const fn bool(name: &'static str, rest_name: &'static str) -> Self {
        Self::new(name, rest_name, AttributeKind::Bool)
    }

    /// Set the documentation.
    pub const fn describe(self, description: &'static str) -> Self {
        Self {
            description,
            ..self
        }
    }

    /// Restrict to some `type`s.
    pub const fn for_types(self, types: &'static [&'static str]) -> Self {
        Self { types, ..self }
    }

    /// Always required.
    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    /// Required for some `type`s.
    pub const fn required_for(self, required_for: &'static [&'static str]) -> Self {
        Self {
            required_for,
            ..self
        }
    }

    /// Server-defaulted when unset.
    pub const fn computed(self) -> Self {
        Self {
            computed: true,
            ..self
        }
    }

    /// Restrict values.
    pub const fn one_of(self, allowed_values: &'static [&'static str]) -> Self {
        Self {
            allowed_values,
            ..self
        }
    }

    /// Introduced in `version`.
    pub const fn since(self, version: ProductVersion) -> Self {
        Self {
            min_version: Some(version),
            ..self
        }
    }

    /// Whether the attribute applies to objects of `object_type`.
    pub fn applies_to(&self, object_type: Option<&str>) -> bool {
        match object_type {
            Some(t) if !self.types.is_empty() => self.types.contains(&t),
            _ => true,
        }
    }

    /// Value used in state when nothing is known.
    pub fn empty_value(&self) -> Value {
        match self.kind {
            AttributeKind::StringSet => Value::Array(Vec::new()),
            _ => Value::Null,
        }
    }

    /// Whether `value` counts as "set" for this attribute.
    pub fn is_set(&self, value: &Value) -> bool {
        match (self.kind, value) {
            (_, Value::Null) => false,
            (AttributeKind::StringSet, Value::Array(items)) => !items.is_empty(),
            _ => true,
        }
    }

    fn resource_attribute(&self) -> Attribute {
        let flags = if self.required {
            AttributeFlags::REQUIRED
        } else if self.computed {
            AttributeFlags::OPTIONAL_COMPUTED
        } else {
            AttributeFlags::OPTIONAL
        };
        let mut description = self.description.to_string();
        if !self.types.is_empty() {
            description.push_str(&format!(
                " Supported in types: {}.",
                self.types.join(", ")
            ));
        }
        if !self.required_for.is_empty() {
            description.push_str(&format!(
                " Required for types: {}.",
                self.required_for.join(", ")
            ));
        }
        if let Some(version) = self.min_version {
            description.push_str(&format!(
                " Requires PingDirectory {} or later.",
                version
            ));
        }
        Attribute::new(self.kind.attribute_type(), flags)
            .with_description(description.trim())
            .with_allowed_values(self.allowed_values.iter().copied())
    }

    fn data_source_attribute(&self) -> Attribute {
        Attribute::new(self.kind.attribute_type(), AttributeFlags::COMPUTED)
            .with_description(self.description)
    }
}

/// A parent object that scopes a child collection.
#[derive(Debug, Clone, Copy)]
pub struct ParentDef {
    /// Attribute holding the parent's name.
    pub attribute: &'static str,
    /// Collection of the parent objects.
    pub collection: &'static str,
    /// Documentation.
    pub description: &'static str,
}

/// Whether objects of a kind can be created and deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectMode {
    /// Objects are created and deleted through the API.
    Creatable,
    /// Objects always exist on the server and can only be updated.
    DefaultOnly,
}

/// Static description of a configuration object kind.
#[derive(Debug)]
pub struct ConfigObjectDef {
    /// Snake-case kind, e.g. `connection_criteria`.
    pub kind: &'static str,
    /// Snake-case plural used by the list data source.
    pub plural: &'static str,
    /// Human-readable name used in messages.
    pub display_name: &'static str,
    /// Collection path, relative to the parent when there is one.
    pub collection: &'static str,
    /// Parent scope, for child objects.
    pub parent: Option<ParentDef>,
    /// URN of the object's schema, without the type suffix.
    pub urn: &'static str,
    /// Body property carrying the new object's name in add requests.
    pub name_property: &'static str,
    /// Available `type`s; empty when the kind is not polymorphic.
    pub types: &'static [&'static str],
    /// Create/delete support.
    pub mode: ObjectMode,
    /// Attributes other than `id`, `name`, `type` and the parent name.
    pub attributes: &'static [AttributeDef],
}

impl ConfigObjectDef {
    /// Name of the managed resource, e.g. `pingdirectory_location`.
    pub fn resource_type_name(&self) -> String {
        format!("{}{}", TYPE_NAME_PREFIX, self.kind)
    }

    /// Name of the resource that adopts an existing object.
    pub fn default_resource_type_name(&self) -> String {
        format!("{}default_{}", TYPE_NAME_PREFIX, self.kind)
    }

    /// Name of the single-object data source.
    pub fn data_source_type_name(&self) -> String {
        self.resource_type_name()
    }

    /// Name of the list data source.
    pub fn list_data_source_type_name(&self) -> String {
        format!("{}{}", TYPE_NAME_PREFIX, self.plural)
    }

    /// Whether objects carry a `type`.
    pub fn is_polymorphic(&self) -> bool {
        !self.types.is_empty()
    }

    /// Schema URN for objects of `object_type`.
    pub fn schema_urn(&self, object_type: Option<&str>) -> String {
        match object_type {
            Some(t) if self.is_polymorphic() => format!("{}:{}", self.urn, t),
            _ => self.urn.to_string(),
        }
    }

    /// The `type` named by a response's `schemas` array.
    pub fn type_from_schemas(&self, body: &Value) -> Option<String> {
        if !self.is_polymorphic() {
            return None;
        }
        let prefix = format!("{}:", self.urn);
        body.get("schemas")?
            .as_array()?
            .iter()
            .filter_map(Value::as_str)
            .find_map(|urn| urn.strip_prefix(&prefix))
            .map(String::from)
    }

    /// Path of the collection, resolved under `parent_name` if needed.
    pub fn collection_path(&self, parent_name: Option<&str>) -> String {
        match (self.parent, parent_name) {
            (Some(parent), Some(parent_name)) => format!(
                "{}/{}{}",
                parent.collection,
                encode_segment(parent_name),
                self.collection
            ),
            _ => self.collection.to_string(),
        }
    }

    /// Path of one object.
    pub fn object_path(&self, parent_name: Option<&str>, name: &str) -> String {
        format!(
            "{}/{}",
            self.collection_path(parent_name),
            encode_segment(name)
        )
    }

    fn type_attribute(&self, requires_replace: bool) -> Attribute {
        let mut attr = Attribute::required_string().with_description(format!(
            "The type of {} resource. Options are [{}]",
            self.display_name,
            self.types.join(", ")
        ));
        if requires_replace {
            attr = attr.with_requires_replace();
        }
        attr
    }

    fn messages_attributes(schema: Schema) -> Schema {
        schema
            .with_attribute(
                "notifications",
                Attribute::computed_string_set()
                    .with_description("Notifications returned by the PingDirectory Configuration API."),
            )
            .with_attribute(
                "required_actions",
                Attribute::new(
                    AttributeType::set(AttributeType::object([
                        ("property", AttributeType::String),
                        ("type", AttributeType::String),
                        ("synopsis", AttributeType::String),
                    ])),
                    AttributeFlags::COMPUTED,
                )
                .with_description("Required actions returned by the PingDirectory Configuration API."),
            )
    }

    /// Schema of the managed (or default) resource.
    pub fn resource_schema(&self) -> Schema {
        let mut schema = Schema::v0()
            .with_description(format!("Manages a {}.", self.display_name))
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("The ID of this resource."),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_requires_replace()
                    .with_description(format!("Name of this {}.", self.display_name)),
            );
        if let Some(parent) = self.parent {
            schema = schema.with_attribute(
                parent.attribute,
                Attribute::required_string()
                    .with_requires_replace()
                    .with_description(parent.description),
            );
        }
        if self.is_polymorphic() {
            schema = schema.with_attribute("type", self.type_attribute(true));
        }
        for attr in self.attributes {
            schema = schema.with_attribute(attr.name, attr.resource_attribute());
        }
        Self::messages_attributes(schema)
    }

    /// Schema of the single-object data source.
    pub fn data_source_schema(&self) -> Schema {
        let mut schema = Schema::v0()
            .with_description(format!("Describes a {}.", self.display_name))
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("The ID of this resource."),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_description(format!("Name of this {}.", self.display_name)),
            );
        if let Some(parent) = self.parent {
            schema = schema.with_attribute(
                parent.attribute,
                Attribute::required_string().with_description(parent.description),
            );
        }
        if self.is_polymorphic() {
            schema = schema.with_attribute(
                "type",
                Attribute::computed_string()
                    .with_description(format!("The type of {} resource.", self.display_name)),
            );
        }
        for attr in self.attributes {
            schema = schema.with_attribute(attr.name, attr.data_source_attribute());
        }
        schema
    }

    /// Schema of the list data source.
    pub fn list_data_source_schema(&self) -> Schema {
        let mut schema = Schema::v0()
            .with_description(format!("Lists {} objects.", self.display_name))
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("The ID of this data source."),
            )
            .with_attribute(
                "filter",
                Attribute::optional_string().with_description(
                    "SCIM filter used when searching the configuration.",
                ),
            )
            .with_attribute(
                "ids",
                Attribute::computed_string_set()
                    .with_description(format!("{} IDs found in the configuration.", self.display_name)),
            );
        if let Some(parent) = self.parent {
            schema = schema.with_attribute(
                parent.attribute,
                Attribute::required_string().with_description(parent.description),
            );
        }
        schema
    }
}

static DEFINITIONS: &[&ConfigObjectDef] = &[
    &connection_criteria::DEFINITION,
    &location::DEFINITION,
    &log_field_syntax::DEFINITION,
    &monitoring_endpoint::DEFINITION,
    &token_claim_validation::DEFINITION,
];

/// Every configuration object kind served by the provider.
pub fn definitions() -> &'static [&'static ConfigObjectDef] {
    DEFINITIONS
}

/// How a registered type name is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Resource that creates and deletes objects.
    Managed,
    /// Resource that adopts an object that always exists.
    Default,
    /// Data source reading one object.
    DataSource,
    /// Data source listing object IDs.
    ListDataSource,
}

/// A type name resolved to its definition.
#[derive(Debug, Clone, Copy)]
pub struct Registered {
    /// The object kind.
    pub def: &'static ConfigObjectDef,
    /// How it is served.
    pub role: Role,
}

/// Resolve a resource type name.
pub fn lookup_resource(type_name: &str) -> Option<Registered> {
    definitions().iter().find_map(|def| {
        if def.mode == ObjectMode::Creatable && def.resource_type_name() == type_name {
            Some(Registered {
                def: *def,
                role: Role::Managed,
            })
        } else if def.default_resource_type_name() == type_name {
            Some(Registered {
                def: *def,
                role: Role::Default,
            })
        } else {
            None
        }
    })
}

/// Resolve a data source type name.
pub fn lookup_data_source(type_name: &str) -> Option<Registered> {
    definitions().iter().find_map(|def| {
        if def.data_source_type_name() == type_name {
            Some(Registered {
                def: *def,
                role: Role::DataSource,
            })
        } else if def.list_data_source_type_name() == type_name {
            Some(Registered {
                def: *def,
                role: Role::ListDataSource,
            })
        } else {
            None
        }
    })
}

/// Every resource type name with its schema.
pub fn resource_schemas() -> Vec<(String, Schema)> {
    let mut schemas = Vec::new();
    for def in definitions() {
        if def.mode == ObjectMode::Creatable {
            schemas.push((def.resource_type_name(), def.resource_schema()));
        }
        schemas.push((def.default_resource_type_name(), def.resource_schema()));
    }
    schemas
}

/// Every data source type name with its schema.
pub fn data_source_schemas() -> Vec<(String, Schema)> {
    let mut schemas = Vec::new();
    for def in definitions() {
        schemas.push((def.data_source_type_name(), def.data_source_schema()));
        schemas.push((def.list_data_source_type_name(), def.list_data_source_schema()));
    }
    schemas
}
