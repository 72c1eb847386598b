//! Plugin server.
//!
//! [`ProviderService`] is the Rust-side view of the plugin protocol; the
//! `serve*` functions expose an implementation over gRPC and print the
//! handshake line the host waits for.
//!
//! On SIGTERM or SIGINT the server stops accepting connections, gives
//! in-flight requests up to [`ServeOptions::shutdown_timeout`] to finish and
//! then calls [`ProviderService::stop`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpListener;
use tonic::transport::Server;
use tracing::{debug, error, info, instrument, warn};

use crate::error::ProviderError;
use crate::generated as pb;
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema, Schema};
use crate::types::{
    ImportedResource, PlanResult, ProviderMetadata, HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};

/// The operations a provider answers, one per plugin RPC.
///
/// Values are plain `serde_json::Value`s shaped by the schema the provider
/// returns; [`serve`] takes care of the protobuf encoding. Failures are
/// returned as [`ProviderError`] and surface on the host as an error
/// diagnostic built from [`ProviderError::summary`] and
/// [`ProviderError::detail`].
///
/// [`PingDirectoryProvider`](crate::PingDirectoryProvider) is the
/// implementation served by the binary.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// Provider, resource and data source schemas.
    fn schema(&self) -> ProviderSchema;

    /// Type names and capabilities, derived from the schema by default.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        ProviderMetadata {
            resources: schema.resources.keys().cloned().collect(),
            data_sources: schema.data_sources.keys().cloned().collect(),
            capabilities: Default::default(),
        }
    }

    /// Check the provider block without connecting anywhere.
    async fn validate_provider_config(&self, _config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(Vec::new())
    }

    /// Apply the provider block. Error diagnostics leave the provider
    /// unconfigured.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Release whatever `configure` set up.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Static checks on a resource configuration.
    async fn validate_resource_config(
        &self,
        _resource_type: &str,
        _config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(Vec::new())
    }

    /// Migrate state written under an older schema version. Every schema is
    /// still at version 0, so state passes through unchanged by default.
    async fn upgrade_resource_state(
        &self,
        _resource_type: &str,
        _version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        Ok(state)
    }

    /// Planned state and changes. `prior_state` is `None` on create; a null
    /// `config` plans a destroy.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create the resource and return its state.
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError>;

    /// Refresh the resource. `None` means the remote object is gone and the
    /// resource should be dropped from state.
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Option<Value>, ProviderError>;

    /// Move the resource from `prior_state` to `planned_state`.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete the resource.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Import an existing object by its import identifier.
    async fn import_resource(
        &self,
        resource_type: &str,
        _id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        Err(ProviderError::Unimplemented(format!(
            "Import not supported for resource type: {}",
            resource_type
        )))
    }

    /// Static checks on a data source configuration.
    async fn validate_data_source_config(
        &self,
        _data_source_type: &str,
        _config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(Vec::new())
    }

    /// Read a data source.
    async fn read_data_source(&self, data_source_type: &str, _config: Value) -> Result<Value, ProviderError> {
        Err(ProviderError::UnknownResource(data_source_type.to_string()))
    }
}

/// Adapts a [`ProviderService`] to the generated gRPC service trait.
struct ProviderGrpcService<P: ProviderService> {
    provider: Arc<P>,
}

/// Values cross the wire as JSON bytes; an empty or malformed payload is
/// treated as null.
fn decode(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or(Value::Null)
}

fn encode(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

fn diagnostics_to_proto(diagnostics: Vec<Diagnostic>) -> Vec<pb::Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| pb::Diagnostic {
            severity: match d.severity {
                DiagnosticSeverity::Error => pb::diagnostic::Severity::Error as i32,
                DiagnosticSeverity::Warning => pb::diagnostic::Severity::Warning as i32,
            },
            summary: d.summary,
            detail: d.detail.unwrap_or_default(),
            attribute: d.attribute.unwrap_or_default(),
        })
        .collect()
}

fn error_to_diagnostics(err: ProviderError) -> Vec<pb::Diagnostic> {
    vec![pb::Diagnostic {
        severity: pb::diagnostic::Severity::Error as i32,
        summary: err.summary(),
        detail: err.detail().unwrap_or_default(),
        attribute: String::new(),
    }]
}

fn schema_to_proto(schema: &Schema) -> pb::Schema {
    pb::Schema {
        version: schema.version as i64,
        attributes: schema
            .attributes
            .iter()
            .map(|(name, attr)| pb::Attribute {
                name: name.clone(),
                r#type: serde_json::to_vec(&attr.attr_type).unwrap_or_default(),
                required: attr.flags.required,
                optional: attr.flags.optional,
                computed: attr.flags.computed,
                sensitive: attr.flags.sensitive,
                description: attribute_description(attr),
                requires_replace: attr.requires_replace,
                default_value: attr.default.as_ref().map(encode).unwrap_or_default(),
            })
            .collect(),
        description: schema.description.clone().unwrap_or_default(),
    }
}

/// Allowed values have no slot on the wire; they are listed in the
/// description instead.
fn attribute_description(attr: &crate::schema::Attribute) -> String {
    let description = attr.description.clone().unwrap_or_default();
    if attr.allowed_values.is_empty() {
        description
    } else {
        format!(
            "{} Options are [{}]",
            description,
            attr.allowed_values.join(", ")
        )
        .trim()
        .to_string()
    }
}

fn gone_diagnostic(resource_type: &str) -> Diagnostic {
    Diagnostic::warning(format!(
        "{} no longer exists and will be removed from state",
        resource_type
    ))
    .with_detail("The configuration API returned 404 Not Found for the object")
}

/// Diagnostics for a validation-style RPC, logged by outcome.
fn checked(
    rpc: &str,
    type_name: &str,
    result: Result<Vec<Diagnostic>, ProviderError>,
) -> Vec<pb::Diagnostic> {
    match result {
        Ok(diagnostics) if crate::schema::has_errors(&diagnostics) => {
            warn!(rpc, type_name, diagnostics = diagnostics.len(), "Completed with errors");
            diagnostics_to_proto(diagnostics)
        },
        Ok(diagnostics) => {
            debug!(rpc, type_name, "Completed successfully");
            diagnostics_to_proto(diagnostics)
        },
        Err(e) => {
            error!(rpc, type_name, error = %e, "Failed");
            error_to_diagnostics(e)
        },
    }
}

/// Encoded state and diagnostics for an RPC that returns a state value.
fn state_or_error(
    rpc: &str,
    type_name: &str,
    result: Result<Value, ProviderError>,
) -> (Vec<u8>, Vec<pb::Diagnostic>) {
    match result {
        Ok(state) => {
            info!(rpc, type_name, "Completed successfully");
            (encode(&state), Vec::new())
        },
        Err(e) => {
            error!(rpc, type_name, error = %e, "Failed");
            (Vec::new(), error_to_diagnostics(e))
        },
    }
}

type RpcResult<T> = Result<tonic::Response<T>, tonic::Status>;

#[tonic::async_trait]
impl<P: ProviderService> pb::provider_server::Provider for ProviderGrpcService<P> {
    #[instrument(skip(self, _request), name = "grpc.get_metadata")]
    async fn get_metadata(
        &self,
        _request: tonic::Request<pb::GetMetadataRequest>,
    ) -> RpcResult<pb::GetMetadataResponse> {
        let metadata = self.provider.metadata();
        debug!(
            resources = metadata.resources.len(),
            data_sources = metadata.data_sources.len(),
            "GetMetadata completed"
        );
        Ok(tonic::Response::new(pb::GetMetadataResponse {
            server_capabilities: Some(pb::ServerCapabilities {
                plan_destroy: metadata.capabilities.plan_destroy,
            }),
            resources: metadata.resources,
            data_sources: metadata.data_sources,
            diagnostics: Vec::new(),
        }))
    }

    #[instrument(skip(self, _request), name = "grpc.get_schema")]
    async fn get_schema(
        &self,
        _request: tonic::Request<pb::GetSchemaRequest>,
    ) -> RpcResult<pb::GetSchemaResponse> {
        let schema = self.provider.schema();
        debug!(
            resources = schema.resources.len(),
            data_sources = schema.data_sources.len(),
            "GetSchema completed"
        );
        let convert = |schemas: &std::collections::BTreeMap<String, Schema>| {
            schemas
                .iter()
                .map(|(name, s)| (name.clone(), schema_to_proto(s)))
                .collect()
        };
        Ok(tonic::Response::new(pb::GetSchemaResponse {
            provider: Some(schema_to_proto(&schema.provider)),
            resources: convert(&schema.resources),
            data_sources: convert(&schema.data_sources),
            diagnostics: Vec::new(),
        }))
    }

    #[instrument(skip(self, request), name = "grpc.validate_provider_config")]
    async fn validate_provider_config(
        &self,
        request: tonic::Request<pb::ValidateProviderConfigRequest>,
    ) -> RpcResult<pb::ValidateProviderConfigResponse> {
        let config = decode(&request.into_inner().config);
        let result = self.provider.validate_provider_config(config).await;
        Ok(tonic::Response::new(pb::ValidateProviderConfigResponse {
            diagnostics: checked("ValidateProviderConfig", "provider", result),
        }))
    }

    #[instrument(skip(self, request), name = "grpc.configure")]
    async fn configure(
        &self,
        request: tonic::Request<pb::ConfigureRequest>,
    ) -> RpcResult<pb::ConfigureResponse> {
        let config = decode(&request.into_inner().config);
        let result = self.provider.configure(config).await;
        Ok(tonic::Response::new(pb::ConfigureResponse {
            diagnostics: checked("Configure", "provider", result),
        }))
    }

    #[instrument(skip(self, _request), name = "grpc.stop")]
    async fn stop(&self, _request: tonic::Request<pb::StopRequest>) -> RpcResult<pb::StopResponse> {
        let error = match self.provider.stop().await {
            Ok(()) => {
                info!("Provider stopped");
                String::new()
            },
            Err(e) => {
                error!(error = %e, "Stop failed");
                e.to_string()
            },
        };
        Ok(tonic::Response::new(pb::StopResponse { error }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.validate_resource_config")]
    async fn validate_resource_config(
        &self,
        request: tonic::Request<pb::ValidateResourceConfigRequest>,
    ) -> RpcResult<pb::ValidateResourceConfigResponse> {
        let req = request.into_inner();
        let result = self
            .provider
            .validate_resource_config(&req.resource_type, decode(&req.config))
            .await;
        Ok(tonic::Response::new(pb::ValidateResourceConfigResponse {
            diagnostics: checked("ValidateResourceConfig", &req.resource_type, result),
        }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.upgrade_resource_state")]
    async fn upgrade_resource_state(
        &self,
        request: tonic::Request<pb::UpgradeResourceStateRequest>,
    ) -> RpcResult<pb::UpgradeResourceStateResponse> {
        let req = request.into_inner();
        let result = self
            .provider
            .upgrade_resource_state(&req.resource_type, req.version, decode(&req.raw_state))
            .await;
        let (upgraded_state, diagnostics) =
            state_or_error("UpgradeResourceState", &req.resource_type, result);
        Ok(tonic::Response::new(pb::UpgradeResourceStateResponse {
            upgraded_state,
            diagnostics,
        }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.plan")]
    async fn plan(&self, request: tonic::Request<pb::PlanRequest>) -> RpcResult<pb::PlanResponse> {
        let req = request.into_inner();
        let prior_state = Some(decode(&req.prior_state)).filter(|v| !v.is_null());

        let response = match self
            .provider
            .plan(
                &req.resource_type,
                prior_state,
                decode(&req.proposed_state),
                decode(&req.config),
            )
            .await
        {
            Ok(result) => {
                info!(
                    changes = result.changes.len(),
                    requires_replace = result.requires_replace,
                    "Plan completed"
                );
                pb::PlanResponse {
                    planned_state: encode(&result.planned_state),
                    changes: result.changes.into_iter().map(Into::into).collect(),
                    requires_replace: result.requires_replace,
                    diagnostics: Vec::new(),
                }
            },
            Err(e) => {
                warn!(error = %e, "Plan failed");
                pb::PlanResponse {
                    diagnostics: error_to_diagnostics(e),
                    ..Default::default()
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.create")]
    async fn create(&self, request: tonic::Request<pb::CreateRequest>) -> RpcResult<pb::CreateResponse> {
        let req = request.into_inner();
        let result = self
            .provider
            .create(&req.resource_type, decode(&req.planned_state))
            .await;
        let (state, diagnostics) = state_or_error("Create", &req.resource_type, result);
        Ok(tonic::Response::new(pb::CreateResponse { state, diagnostics }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.read")]
    async fn read(&self, request: tonic::Request<pb::ReadRequest>) -> RpcResult<pb::ReadResponse> {
        let req = request.into_inner();
        let (state, diagnostics) = match self
            .provider
            .read(&req.resource_type, decode(&req.current_state))
            .await
        {
            Ok(Some(state)) => {
                debug!("Read completed");
                (encode(&state), Vec::new())
            },
            Ok(None) => (
                Vec::new(),
                diagnostics_to_proto(vec![gone_diagnostic(&req.resource_type)]),
            ),
            Err(e) => {
                error!(error = %e, "Read failed");
                (Vec::new(), error_to_diagnostics(e))
            },
        };
        Ok(tonic::Response::new(pb::ReadResponse { state, diagnostics }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.update")]
    async fn update(&self, request: tonic::Request<pb::UpdateRequest>) -> RpcResult<pb::UpdateResponse> {
        let req = request.into_inner();
        let result = self
            .provider
            .update(
                &req.resource_type,
                decode(&req.prior_state),
                decode(&req.planned_state),
            )
            .await;
        let (state, diagnostics) = state_or_error("Update", &req.resource_type, result);
        Ok(tonic::Response::new(pb::UpdateResponse { state, diagnostics }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.delete")]
    async fn delete(&self, request: tonic::Request<pb::DeleteRequest>) -> RpcResult<pb::DeleteResponse> {
        let req = request.into_inner();
        let result = self
            .provider
            .delete(&req.resource_type, decode(&req.current_state))
            .await
            .map(|()| Value::Null);
        let (_, diagnostics) = state_or_error("Delete", &req.resource_type, result);
        Ok(tonic::Response::new(pb::DeleteResponse { diagnostics }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type, id = %request.get_ref().id), name = "grpc.import_resource_state")]
    async fn import_resource_state(
        &self,
        request: tonic::Request<pb::ImportResourceStateRequest>,
    ) -> RpcResult<pb::ImportResourceStateResponse> {
        let req = request.into_inner();
        let response = match self.provider.import_resource(&req.resource_type, &req.id).await {
            Ok(imported) => {
                info!(imported = imported.len(), "ImportResourceState completed");
                pb::ImportResourceStateResponse {
                    imported: imported
                        .into_iter()
                        .map(|r| pb::ImportedResource {
                            state: encode(&r.state),
                            resource_type: r.resource_type,
                        })
                        .collect(),
                    diagnostics: Vec::new(),
                }
            },
            Err(e) => {
                error!(error = %e, "ImportResourceState failed");
                pb::ImportResourceStateResponse {
                    imported: Vec::new(),
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), fields(data_source_type = %request.get_ref().data_source_type), name = "grpc.validate_data_source_config")]
    async fn validate_data_source_config(
        &self,
        request: tonic::Request<pb::ValidateDataSourceConfigRequest>,
    ) -> RpcResult<pb::ValidateDataSourceConfigResponse> {
        let req = request.into_inner();
        let result = self
            .provider
            .validate_data_source_config(&req.data_source_type, decode(&req.config))
            .await;
        Ok(tonic::Response::new(pb::ValidateDataSourceConfigResponse {
            diagnostics: checked("ValidateDataSourceConfig", &req.data_source_type, result),
        }))
    }

    #[instrument(skip(self, request), fields(data_source_type = %request.get_ref().data_source_type), name = "grpc.read_data_source")]
    async fn read_data_source(
        &self,
        request: tonic::Request<pb::ReadDataSourceRequest>,
    ) -> RpcResult<pb::ReadDataSourceResponse> {
        let req = request.into_inner();
        let result = self
            .provider
            .read_data_source(&req.data_source_type, decode(&req.config))
            .await;
        let (state, diagnostics) = state_or_error("ReadDataSource", &req.data_source_type, result);
        Ok(tonic::Response::new(pb::ReadDataSourceResponse { state, diagnostics }))
    }
}

/// How long in-flight requests get after a shutdown signal.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Server settings.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Grace period for in-flight requests once SIGTERM or SIGINT arrives.
    pub shutdown_timeout: Duration,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl ServeOptions {
    /// Options with [`DEFAULT_SHUTDOWN_TIMEOUT`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the shutdown grace period.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// Resolves on SIGTERM or SIGINT (CTRL+C on Windows). Never resolves if the
/// handlers cannot be installed.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    warn!(error = %e, "Failed to install signal handlers");
                    return std::future::pending::<()>().await;
                },
            };

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
            _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install CTRL+C handler");
            return std::future::pending::<()>().await;
        }
        info!("Received CTRL+C, initiating graceful shutdown");
    }

    #[cfg(not(any(unix, windows)))]
    {
        std::future::pending::<()>().await;
    }
}

/// Serve `provider` on a free port on 127.0.0.1.
///
/// Prints `PINGDIRECTORY_PROVIDER|<protocol_version>|<address>` to stdout
/// once listening and returns after a signal-triggered shutdown.
pub async fn serve<P: ProviderService>(provider: P) -> Result<(), Box<dyn std::error::Error>> {
    serve_with_options(provider, ServeOptions::default()).await
}

/// [`serve`] with explicit [`ServeOptions`].
pub async fn serve_with_options<P: ProviderService>(
    provider: P,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    run(provider, listener, options).await
}

/// Serve `provider` on a fixed address.
pub async fn serve_on<P: ProviderService>(
    provider: P,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    serve_on_with_options(provider, addr, ServeOptions::default()).await
}

/// [`serve_on`] with explicit [`ServeOptions`].
pub async fn serve_on_with_options<P: ProviderService>(
    provider: P,
    addr: SocketAddr,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    run(provider, listener, options).await
}

async fn run<P: ProviderService>(
    provider: P,
    listener: TcpListener,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = listener.local_addr()?;
    println!("{}|{}|{}", HANDSHAKE_PREFIX, PROTOCOL_VERSION, addr);
    info!(address = %addr, "Provider server starting");

    let provider = Arc::new(provider);
    let service = pb::provider_server::ProviderServer::new(ProviderGrpcService {
        provider: Arc::clone(&provider),
    });

    // The grace period only starts once a signal has been received
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server_task = tokio::spawn(
        Server::builder()
            .add_service(service)
            .serve_with_incoming_shutdown(
                tokio_stream::wrappers::TcpListenerStream::new(listener),
                async {
                    let _ = shutdown_rx.await;
                },
            ),
    );

    tokio::select! {
        result = &mut server_task => {
            result??;
            info!("Server stopped");
        },
        _ = wait_for_shutdown_signal() => {
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(options.shutdown_timeout, &mut server_task).await {
                Ok(result) => {
                    result??;
                    info!("Server shutdown complete");
                },
                Err(_) => {
                    warn!(
                        timeout = ?options.shutdown_timeout,
                        "Shutdown timeout exceeded, forcing shutdown"
                    );
                    server_task.abort();
                },
            }
        },
    }

    if let Err(e) = provider.stop().await {
        warn!(error = %e, "Provider stop returned an error");
    }
    info!("Provider shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiError, ConfigApiClient};
    use crate::provider::PingDirectoryProvider;
    use crate::schema::Attribute;
    use crate::version::ProductVersion;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_error_to_diagnostics_uses_summary_and_detail() {
        let err = ProviderError::api(
            "An error occurred while trying to create the Location",
            ApiError::Status {
                status: 409,
                detail: "already exists".to_string(),
            },
        );
        let diagnostics = error_to_diagnostics(err);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].summary,
            "An error occurred while trying to create the Location"
        );
        assert_eq!(diagnostics[0].detail, "Error response: already exists");
        assert_eq!(
            diagnostics[0].severity,
            pb::diagnostic::Severity::Error as i32
        );
    }

    #[test]
    fn test_schema_to_proto() {
        let schema = Schema::v0()
            .with_description("Manages a Location.")
            .with_attribute("name", Attribute::required_string().with_requires_replace())
            .with_attribute(
                "communication_security_level",
                Attribute::optional_string()
                    .with_description("Security level.")
                    .with_allowed_values(["all", "secure-only"]),
            );
        let proto = schema_to_proto(&schema);
        assert_eq!(proto.description, "Manages a Location.");
        assert_eq!(proto.attributes.len(), 2);

        let level = &proto.attributes[0];
        assert_eq!(level.name, "communication_security_level");
        assert_eq!(level.description, "Security level. Options are [all, secure-only]");
        assert_eq!(level.r#type, b"\"string\"".to_vec());

        let name = &proto.attributes[1];
        assert!(name.required);
        assert!(name.requires_replace);
    }

    #[test]
    fn test_decode_tolerates_empty_payload() {
        assert_eq!(decode(b""), Value::Null);
        assert_eq!(decode(b"not json"), Value::Null);
        assert_eq!(decode(&encode(&serde_json::json!({"name": "east"})))["name"], "east");
    }

    #[test]
    fn test_checked_keeps_warnings() {
        let diagnostics = checked(
            "Configure",
            "provider",
            Ok(vec![Diagnostic::warning("Unrecognized PingDirectory version")]),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, pb::diagnostic::Severity::Warning as i32);
    }

    #[test]
    fn test_serve_options() {
        assert_eq!(ServeOptions::new().shutdown_timeout, DEFAULT_SHUTDOWN_TIMEOUT);
        let options = ServeOptions::new().with_shutdown_timeout(Duration::from_secs(5));
        assert_eq!(options.shutdown_timeout, Duration::from_secs(5));
    }

    fn grpc_service(server: &MockServer) -> ProviderGrpcService<PingDirectoryProvider> {
        let client = ConfigApiClient::new(
            format!("{}/config/v1", server.uri()),
            "cn=administrator",
            "2FederateM0re",
        )
        .unwrap();
        ProviderGrpcService {
            provider: Arc::new(PingDirectoryProvider::with_client(
                client,
                ProductVersion::new(9, 3, 0, 0),
            )),
        }
    }

    #[tokio::test]
    async fn test_read_rpc_drops_missing_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config/v1/locations/east"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let response = pb::provider_server::Provider::read(
            &grpc_service(&server),
            tonic::Request::new(pb::ReadRequest {
                resource_type: "pingdirectory_location".to_string(),
                current_state: encode(&json!({"id": "east", "name": "east"})),
            }),
        )
        .await
        .unwrap()
        .into_inner();

        assert!(response.state.is_empty());
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].severity,
            pb::diagnostic::Severity::Warning as i32
        );
    }

    #[tokio::test]
    async fn test_read_rpc_encodes_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config/v1/locations/east"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "schemas": ["urn:pingidentity:schemas:configuration:2.0:location"],
                "id": "east",
                "description": "East"
            })))
            .mount(&server)
            .await;

        let response = pb::provider_server::Provider::read(
            &grpc_service(&server),
            tonic::Request::new(pb::ReadRequest {
                resource_type: "pingdirectory_location".to_string(),
                current_state: encode(&json!({"name": "east"})),
            }),
        )
        .await
        .unwrap()
        .into_inner();

        assert!(response.diagnostics.is_empty());
        assert_eq!(decode(&response.state)["description"], "East");
    }

    #[tokio::test]
    async fn test_plan_rpc_reports_invalid_config() {
        let server = MockServer::start().await;
        let config = encode(&json!({"name": "m", "type": "statsd"}));

        let response = pb::provider_server::Provider::plan(
            &grpc_service(&server),
            tonic::Request::new(pb::PlanRequest {
                resource_type: "pingdirectory_monitoring_endpoint".to_string(),
                prior_state: Vec::new(),
                proposed_state: config.clone(),
                config,
            }),
        )
        .await
        .unwrap()
        .into_inner();

        assert!(response.planned_state.is_empty());
        assert!(response.changes.is_empty());
        assert!(!response.diagnostics.is_empty());
        assert!(response
            .diagnostics
            .iter()
            .all(|d| d.severity == pb::diagnostic::Severity::Error as i32));
    }

    #[tokio::test]
    async fn test_create_rpc_reports_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/config/v1/locations"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "status": "409",
                "detail": "An entry with name 'east' already exists"
            })))
            .mount(&server)
            .await;

        let response = pb::provider_server::Provider::create(
            &grpc_service(&server),
            tonic::Request::new(pb::CreateRequest {
                resource_type: "pingdirectory_location".to_string(),
                planned_state: encode(&json!({"name": "east", "description": null})),
            }),
        )
        .await
        .unwrap()
        .into_inner();

        assert!(response.state.is_empty());
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].summary,
            "An error occurred while trying to create the Location"
        );
        assert_eq!(
            response.diagnostics[0].detail,
            "Error response: An entry with name 'east' already exists"
        );
    }

    struct Minimal;

    #[async_trait::async_trait]
    impl ProviderService for Minimal {
        fn schema(&self) -> ProviderSchema {
            ProviderSchema::new()
        }

        async fn configure(&self, _config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
            Ok(Vec::new())
        }

        async fn plan(
            &self,
            _resource_type: &str,
            _prior_state: Option<Value>,
            proposed_state: Value,
            _config: Value,
        ) -> Result<PlanResult, ProviderError> {
            Ok(PlanResult::with_changes(proposed_state, Vec::new(), false))
        }

        async fn create(&self, _resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
            Ok(planned_state)
        }

        async fn read(&self, _resource_type: &str, current_state: Value) -> Result<Option<Value>, ProviderError> {
            Ok(Some(current_state))
        }

        async fn update(
            &self,
            _resource_type: &str,
            _prior_state: Value,
            planned_state: Value,
        ) -> Result<Value, ProviderError> {
            Ok(planned_state)
        }

        async fn delete(&self, _resource_type: &str, _current_state: Value) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_trait_defaults() {
        let provider = Minimal;
        let config = json!({"name": "east"});

        assert!(provider.validate_provider_config(config.clone()).await.unwrap().is_empty());
        assert!(provider
            .validate_resource_config("pingdirectory_location", config.clone())
            .await
            .unwrap()
            .is_empty());
        assert!(provider
            .validate_data_source_config("pingdirectory_location", config.clone())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            provider
                .upgrade_resource_state("pingdirectory_location", 0, config.clone())
                .await
                .unwrap(),
            config
        );

        let err = provider
            .import_resource("pingdirectory_location", "east")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unimplemented(_)));
        assert!(err.message().ends_with("pingdirectory_location"));

        let err = provider
            .read_data_source("pingdirectory_location", config)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
        assert!(provider.metadata().resources.is_empty());
    }

    #[test]
    fn test_gone_diagnostic_is_warning() {
        let diagnostics = diagnostics_to_proto(vec![gone_diagnostic("pingdirectory_location")]);
        assert_eq!(
            diagnostics[0].severity,
            pb::diagnostic::Severity::Warning as i32
        );
        assert!(diagnostics[0].summary.starts_with("pingdirectory_location"));
    }
}
