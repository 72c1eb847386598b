//! Read-only data sources over configuration objects.
//!
//! Each object kind gets a single-object data source, `pingdirectory_<kind>`,
//! and a list data source, `pingdirectory_<plural>`, that returns the IDs
//! matching an optional SCIM filter.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::ConfigApiClient;
use crate::error::ProviderError;
use crate::internaltypes;
use crate::resource::state::{self, ObjectId};
use crate::resource::{ConfigObjectDef, Role};
use crate::schema::{has_errors, Diagnostic};
use crate::validation::validate;

/// A configuration object kind served as a data source.
#[derive(Debug, Clone, Copy)]
pub struct ObjectDataSource {
    def: &'static ConfigObjectDef,
    list: bool,
}

impl ObjectDataSource {
    /// Serve `def` as a single-object (`Role::DataSource`) or list
    /// (`Role::ListDataSource`) data source.
    pub fn new(def: &'static ConfigObjectDef, role: Role) -> Self {
        Self {
            def,
            list: role == Role::ListDataSource,
        }
    }

    /// Data source type name.
    pub fn type_name(&self) -> String {
        if self.list {
            self.def.list_data_source_type_name()
        } else {
            self.def.data_source_type_name()
        }
    }

    /// Static checks on a data source configuration.
    pub fn validate_config(&self, config: &Value) -> Vec<Diagnostic> {
        let schema = if self.list {
            self.def.list_data_source_schema()
        } else {
            self.def.data_source_schema()
        };
        validate(&schema, config)
    }

    /// Read the data source.
    pub async fn read(
        &self,
        client: &ConfigApiClient,
        config: &Value,
    ) -> Result<Value, ProviderError> {
        let diagnostics = self.validate_config(config);
        if has_errors(&diagnostics) {
            let message = diagnostics
                .iter()
                .map(|d| d.summary.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ProviderError::Validation(message));
        }

        if self.list {
            self.read_list(client, config).await
        } else {
            self.read_one(client, config).await
        }
    }

    async fn read_one(
        &self,
        client: &ConfigApiClient,
        config: &Value,
    ) -> Result<Value, ProviderError> {
        let id = ObjectId::from_state(self.def, config)?;
        let response = client.get(&id.path(self.def)).await.map_err(|e| {
            ProviderError::api(
                format!(
                    "An error occurred while trying to read the {}",
                    self.def.display_name
                ),
                e,
            )
        })?;
        debug!(data_source = %self.type_name(), name = %id.name, "Read configuration object");
        Ok(state::data_source_state_from_response(
            self.def, &response, &id,
        ))
    }

    async fn read_list(
        &self,
        client: &ConfigApiClient,
        config: &Value,
    ) -> Result<Value, ProviderError> {
        let parent = self
            .def
            .parent
            .and_then(|p| internaltypes::string_value(&config[p.attribute], true));
        let filter = internaltypes::string_value(&config["filter"], true);
        let collection = self.def.collection_path(parent.as_deref());

        let objects = client
            .list(&collection, filter.as_deref())
            .await
            .map_err(|e| {
                ProviderError::api(
                    format!(
                        "An error occurred while trying to list the {} objects",
                        self.def.display_name
                    ),
                    e,
                )
            })?;
        let ids = internaltypes::string_set_value(
            objects
                .iter()
                .filter_map(|o| internaltypes::string_value(&o["id"], true)),
        );
        info!(
            data_source = %self.type_name(),
            count = ids.as_array().map(Vec::len).unwrap_or_default(),
            "Listed configuration objects"
        );

        let mut state = json!({
            "id": collection,
            "filter": internaltypes::string_value_or_null(filter.as_deref(), true),
            "ids": ids,
        });
        if let (Some(p), Value::Object(map)) = (self.def.parent, &mut state) {
            map.insert(
                p.attribute.to_string(),
                internaltypes::string_value_or_null(parent.as_deref(), true),
            );
        }
        Ok(state)
    }
}
