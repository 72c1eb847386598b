//! The PingDirectory provider.
//!
//! [`PingDirectoryProvider`] implements [`ProviderService`] by resolving each
//! type name to a configuration object definition and handing the request to
//! the generic resource adapter or data source.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::client::ConfigApiClient;
use crate::config::ProviderConfig;
use crate::datasource::ObjectDataSource;
use crate::error::ProviderError;
use crate::resource::adapter::ObjectResource;
use crate::resource::{self, lookup_data_source, lookup_resource};
use crate::schema::{Diagnostic, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities};
use crate::version::ProductVersion;

/// Everything `Configure` establishes.
#[derive(Debug)]
struct ProviderContext {
    client: ConfigApiClient,
    version: ProductVersion,
}

/// Provider exposing the PingDirectory configuration API.
#[derive(Debug, Default)]
pub struct PingDirectoryProvider {
    context: RwLock<Option<Arc<ProviderContext>>>,
}

impl PingDirectoryProvider {
    /// An unconfigured provider; the host must call `Configure` first.
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider already configured with `client`, for servers reached
    /// without the provider block (tests against a mock API, for example).
    pub fn with_client(client: ConfigApiClient, version: ProductVersion) -> Self {
        Self {
            context: RwLock::new(Some(Arc::new(ProviderContext { client, version }))),
        }
    }

    async fn context(&self) -> Result<Arc<ProviderContext>, ProviderError> {
        self.context
            .read()
            .await
            .clone()
            .ok_or_else(|| ProviderError::Configuration("provider has not been configured".to_string()))
    }

    fn resource(&self, resource_type: &str) -> Result<ObjectResource, ProviderError> {
        lookup_resource(resource_type)
            .map(|r| ObjectResource::new(r.def, r.role))
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(&self, data_source_type: &str) -> Result<ObjectDataSource, ProviderError> {
        lookup_data_source(data_source_type)
            .map(|r| ObjectDataSource::new(r.def, r.role))
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))
    }
}

#[async_trait::async_trait]
impl ProviderService for PingDirectoryProvider {
    fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(ProviderConfig::schema());
        for (name, resource_schema) in resource::resource_schemas() {
            schema = schema.with_resource(name, resource_schema);
        }
        for (name, data_source_schema) in resource::data_source_schemas() {
            schema = schema.with_data_source(name, data_source_schema);
        }
        schema
    }

    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        ProviderMetadata {
            resources: schema.resources.keys().cloned().collect(),
            data_sources: schema.data_sources.keys().cloned().collect(),
            capabilities: ServerCapabilities { plan_destroy: true },
        }
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(match ProviderConfig::from_value(&config) {
            Ok((_, warnings)) => warnings,
            Err(errors) => errors,
        })
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let (config, mut diagnostics) = match ProviderConfig::from_value(&config) {
            Ok(resolved) => resolved,
            Err(errors) => return Ok(errors),
        };
        debug!(config = ?config, "Resolved provider configuration");

        let client = match ConfigApiClient::from_config(&config) {
            Ok(client) => client,
            Err(e) => {
                diagnostics.push(
                    Diagnostic::error("Unable to create PingDirectory client").with_detail(e.to_string()),
                );
                return Ok(diagnostics);
            },
        };

        info!(
            https_host = %config.https_host,
            product_version = %config.product_version,
            "Configured PingDirectory provider"
        );
        *self.context.write().await = Some(Arc::new(ProviderContext {
            client,
            version: config.product_version,
        }));
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        self.context.write().await.take();
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.resource(resource_type)?.validate_config(&config))
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        let context = self.context().await?;
        let config = if config.is_null() { proposed_state } else { config };
        resource.plan(prior_state.as_ref(), &config, &context.version)
    }

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let context = self.context().await?;
        resource.create(&context.client, &planned_state).await
    }

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Option<Value>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let context = self.context().await?;
        resource.read(&context.client, &current_state).await
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let context = self.context().await?;
        resource
            .update(&context.client, &prior_state, &planned_state)
            .await
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let context = self.context().await?;
        resource.delete(&context.client, &current_state).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let context = self.context().await?;
        Ok(vec![resource.import(&context.client, id).await?])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.data_source(data_source_type)?.validate_config(&config))
    }

    async fn read_data_source(&self, data_source_type: &str, config: Value) -> Result<Value, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        let context = self.context().await?;
        data_source.read(&context.client, &config).await
    }
}
