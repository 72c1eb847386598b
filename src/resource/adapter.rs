//! Generic CRUD for configuration objects.
//!
//! [`ObjectResource`] pairs a [`ConfigObjectDef`] with the [`Role`] it is
//! served under and drives the configuration API for every resource RPC.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::state::{self, ObjectId};
use super::{ConfigObjectDef, Role};
use crate::client::{ApiError, ConfigApiClient};
use crate::error::ProviderError;
use crate::operations::{log_update_operations, touched_paths};
use crate::schema::{has_errors, Diagnostic};
use crate::types::{ImportedResource, PlanResult};
use crate::validation::{validate, validate_type_restrictions};
use crate::version::ProductVersion;

/// A configuration object kind served as a resource.
#[derive(Debug, Clone, Copy)]
pub struct ObjectResource {
    def: &'static ConfigObjectDef,
    role: Role,
}

impl ObjectResource {
    /// Serve `def` under `role` (managed or default).
    pub fn new(def: &'static ConfigObjectDef, role: Role) -> Self {
        Self { def, role }
    }

    /// Resource type name this adapter answers to.
    pub fn type_name(&self) -> String {
        match self.role {
            Role::Default => self.def.default_resource_type_name(),
            _ => self.def.resource_type_name(),
        }
    }

    fn api_error(&self, action: &str, err: ApiError) -> ProviderError {
        ProviderError::api(
            format!(
                "An error occurred while trying to {} the {}",
                action, self.def.display_name
            ),
            err,
        )
    }

    /// Static checks on a resource configuration.
    pub fn validate_config(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validate(&self.def.resource_schema(), config);
        diagnostics.extend(validate_type_restrictions(self.def, config));
        diagnostics
    }

    /// Compute the plan for a configuration against the prior state.
    pub fn plan(
        &self,
        prior_state: Option<&Value>,
        config: &Value,
        version: &ProductVersion,
    ) -> Result<PlanResult, ProviderError> {
        if config.is_null() {
            return Ok(state::plan_destroy(prior_state.unwrap_or(&Value::Null)));
        }

        let mut diagnostics = self.validate_config(config);
        diagnostics.extend(state::check_attribute_versions(self.def, config, version));
        if has_errors(&diagnostics) {
            let message = diagnostics
                .iter()
                .filter(|d| d.is_error())
                .map(|d| d.summary.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ProviderError::Validation(message));
        }

        let result = state::plan(self.def, prior_state, config);
        debug!(
            resource_type = %self.type_name(),
            changes = result.changes.len(),
            requires_replace = result.requires_replace,
            "Planned configuration object"
        );
        Ok(result)
    }

    /// Create the object, or adopt it for a default resource.
    pub async fn create(
        &self,
        client: &ConfigApiClient,
        planned_state: &Value,
    ) -> Result<Value, ProviderError> {
        let id = ObjectId::from_state(self.def, planned_state)?;
        match self.role {
            Role::Managed => self.add(client, &id, planned_state).await,
            Role::Default => self.adopt(client, &id, planned_state).await,
            Role::DataSource | Role::ListDataSource => Err(ProviderError::UnknownResource(
                self.def.data_source_type_name(),
            )),
        }
    }

    async fn add(
        &self,
        client: &ConfigApiClient,
        id: &ObjectId,
        planned_state: &Value,
    ) -> Result<Value, ProviderError> {
        let body = state::add_request_body(self.def, planned_state, &id.name);
        let response = client
            .add(&id.collection_path(self.def), &body)
            .await
            .map_err(|e| self.api_error("create", e))?;
        state::log_messages(self.def, &id.name, &response);
        info!(
            resource_type = %self.type_name(),
            name = %id.name,
            "Created configuration object"
        );
        Ok(state::state_from_response(self.def, &response, id))
    }

    async fn adopt(
        &self,
        client: &ConfigApiClient,
        id: &ObjectId,
        planned_state: &Value,
    ) -> Result<Value, ProviderError> {
        let existing = client
            .get(&id.path(self.def))
            .await
            .map_err(|e| self.api_error("read", e))?;

        if self.def.is_polymorphic() {
            let existing_type = self.def.type_from_schemas(&existing);
            let planned_type = state::object_type(planned_state);
            if existing_type.as_deref() != planned_type {
                return Err(ProviderError::Validation(format!(
                    "Type of existing {} '{}' is '{}', but the configuration sets type '{}'",
                    self.def.display_name,
                    id.name,
                    existing_type.as_deref().unwrap_or_default(),
                    planned_type.unwrap_or_default()
                )));
            }
        }

        let current = state::state_from_response(self.def, &existing, id);
        let state = self.apply(client, id, planned_state, &current).await?;
        info!(
            resource_type = %self.type_name(),
            name = %id.name,
            "Adopted existing configuration object"
        );
        Ok(state)
    }

    /// PATCH `current` towards `planned`, or return `current` when nothing
    /// differs.
    async fn apply(
        &self,
        client: &ConfigApiClient,
        id: &ObjectId,
        planned_state: &Value,
        current: &Value,
    ) -> Result<Value, ProviderError> {
        let ops = state::update_operations(self.def, planned_state, current);
        log_update_operations(&id.name, &ops);
        if ops.is_empty() {
            return Ok(current.clone());
        }

        let response = client
            .update(&id.path(self.def), &ops)
            .await
            .map_err(|e| self.api_error("update", e))?;
        state::log_messages(self.def, &id.name, &response);
        debug!(
            resource_type = %self.type_name(),
            name = %id.name,
            paths = ?touched_paths(&ops),
            "Updated configuration object"
        );
        Ok(state::state_from_response(self.def, &response, id))
    }

    /// Read the object. `None` means it no longer exists.
    pub async fn read(
        &self,
        client: &ConfigApiClient,
        current_state: &Value,
    ) -> Result<Option<Value>, ProviderError> {
        let id = ObjectId::from_state(self.def, current_state)?;
        let result = client.get(&id.path(self.def)).await;
        match result.map_err(|e| self.api_error("read", e)) {
            Ok(response) => {
                state::log_messages(self.def, &id.name, &response);
                Ok(Some(state::state_from_response(self.def, &response, &id)))
            },
            Err(e) if e.is_not_found() => {
                warn!(
                    resource_type = %self.type_name(),
                    name = %id.name,
                    "Configuration object not found, removing from state"
                );
                Ok(None)
            },
            Err(e) => Err(e),
        }
    }

    /// Update the object from prior to planned state.
    pub async fn update(
        &self,
        client: &ConfigApiClient,
        prior_state: &Value,
        planned_state: &Value,
    ) -> Result<Value, ProviderError> {
        let id = ObjectId::from_state(self.def, planned_state)?;
        let ops = state::update_operations(self.def, planned_state, prior_state);
        if ops.is_empty() {
            log_update_operations(&id.name, &ops);
            let response = client
                .get(&id.path(self.def))
                .await
                .map_err(|e| self.api_error("read", e))?;
            return Ok(state::state_from_response(self.def, &response, &id));
        }
        self.apply(client, &id, planned_state, prior_state).await
    }

    /// Delete the object. Default resources are only dropped from state.
    pub async fn delete(
        &self,
        client: &ConfigApiClient,
        current_state: &Value,
    ) -> Result<(), ProviderError> {
        let id = ObjectId::from_state(self.def, current_state)?;
        if self.role == Role::Default {
            debug!(
                resource_type = %self.type_name(),
                name = %id.name,
                "Default configuration object is left in place on delete"
            );
            return Ok(());
        }

        let result = client.delete(&id.path(self.def)).await;
        match result.map_err(|e| self.api_error("delete", e)) {
            Ok(()) => {
                info!(
                    resource_type = %self.type_name(),
                    name = %id.name,
                    "Deleted configuration object"
                );
                Ok(())
            },
            Err(e) if e.is_not_found() => {
                warn!(
                    resource_type = %self.type_name(),
                    name = %id.name,
                    "Configuration object already deleted"
                );
                Ok(())
            },
            Err(e) => Err(e),
        }
    }

    /// Import an object by `name` (or `parent/name`).
    pub async fn import(
        &self,
        client: &ConfigApiClient,
        import_id: &str,
    ) -> Result<ImportedResource, ProviderError> {
        let id = ObjectId::from_import_id(self.def, import_id)?;
        let response = client.get(&id.path(self.def)).await.map_err(|e| {
            match self.api_error("read", e) {
                err if err.is_not_found() => ProviderError::NotFound(format!(
                    "{} '{}' does not exist",
                    self.def.display_name, import_id
                )),
                err => err,
            }
        })?;
        Ok(ImportedResource::new(
            self.type_name(),
            state::state_from_response(self.def, &response, &id),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{connection_criteria, location, monitoring_endpoint};
    use serde_json::json;

    fn version() -> ProductVersion {
        ProductVersion::new(9, 3, 0, 0)
    }

    #[test]
    fn test_type_names() {
        let managed = ObjectResource::new(&location::DEFINITION, Role::Managed);
        assert_eq!(managed.type_name(), "pingdirectory_location");
        let default = ObjectResource::new(&location::DEFINITION, Role::Default);
        assert_eq!(default.type_name(), "pingdirectory_default_location");
    }

    #[test]
    fn test_plan_rejects_invalid_config() {
        let resource = ObjectResource::new(&connection_criteria::DEFINITION, Role::Managed);
        let err = resource
            .plan(
                None,
                &json!({"name": "c", "type": "aggregate", "included_protocol": ["LDAP"]}),
                &version(),
            )
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
        assert!(err.message().contains("included_protocol"));
    }

    #[test]
    fn test_plan_rejects_attribute_newer_than_server() {
        let resource = ObjectResource::new(&monitoring_endpoint::DEFINITION, Role::Managed);
        let config = json!({
            "name": "m",
            "type": "statsd",
            "hostname": "metrics",
            "enabled": true,
            "connection_type": "encrypted-tcp"
        });
        let err = resource
            .plan(None, &config, &ProductVersion::new(9, 1, 0, 2))
            .unwrap_err();
        assert!(err.message().contains("connection_type"));
        assert!(resource.plan(None, &config, &version()).is_ok());
    }

    #[test]
    fn test_plan_destroy_on_null_config() {
        let resource = ObjectResource::new(&location::DEFINITION, Role::Managed);
        let result = resource
            .plan(Some(&json!({"id": "east", "name": "east"})), &Value::Null, &version())
            .unwrap();
        assert_eq!(result.planned_state, Value::Null);
        assert_eq!(result.changes.len(), 1);
    }

    #[test]
    fn test_validate_config_collects_all_problems() {
        let resource = ObjectResource::new(&monitoring_endpoint::DEFINITION, Role::Managed);
        let diagnostics = resource.validate_config(&json!({"name": "m", "type": "statsd"}));
        let attributes: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect();
        assert!(attributes.contains(&"enabled"));
        assert!(attributes.contains(&"hostname"));
    }
}
