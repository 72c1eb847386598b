//! PingDirectory provider.
//!
//! Serves the PingDirectory configuration API (`/config/v1`) to an
//! infrastructure-as-code host over the plugin gRPC protocol. Every supported
//! configuration object kind is available four ways: as a managed resource,
//! as a default resource that adopts an object the server ships with, as a
//! single-object data source and as a list data source.
//!
//! The pieces, bottom up:
//!
//! - [`client`] talks to the configuration API over HTTPS.
//! - [`resource`] holds one static definition per object kind, and the
//!   generic adapter that turns plans into add, PATCH and delete requests.
//! - [`datasource`] reads single objects and filtered lists.
//! - [`provider`] routes type names to definitions; [`server`] exposes it
//!   over gRPC.
//!
//! ```ignore
//! use pingdirectory_provider::{init_logging, serve, PingDirectoryProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!     serve(PingDirectoryProvider::new()).await
//! }
//! ```
//!
//! # Handshake
//!
//! Once listening, [`serve`] writes one line to stdout and nothing else:
//!
//! ```text
//! PINGDIRECTORY_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! The fields are [`HANDSHAKE_PREFIX`], [`PROTOCOL_VERSION`] and the listen
//! address.
//!
//! # Resource Types
//!
//! | Kind | Managed | Default | Data sources |
//! |------|---------|---------|--------------|
//! | Connection criteria | `pingdirectory_connection_criteria` | `pingdirectory_default_connection_criteria` | `pingdirectory_connection_criteria`, `pingdirectory_connection_criterias` |
//! | Location | `pingdirectory_location` | `pingdirectory_default_location` | `pingdirectory_location`, `pingdirectory_locations` |
//! | Log field syntax | | `pingdirectory_default_log_field_syntax` | `pingdirectory_log_field_syntax`, `pingdirectory_log_field_syntaxes` |
//! | Monitoring endpoint | `pingdirectory_monitoring_endpoint` | `pingdirectory_default_monitoring_endpoint` | `pingdirectory_monitoring_endpoint`, `pingdirectory_monitoring_endpoints` |
//! | Token claim validation | `pingdirectory_token_claim_validation` | `pingdirectory_default_token_claim_validation` | `pingdirectory_token_claim_validation`, `pingdirectory_token_claim_validations` |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod datasource;
pub mod error;
pub mod internaltypes;
pub mod logging;
pub mod operations;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;
pub mod version;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated;

pub use client::{ApiError, ConfigApiClient};
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::PingDirectoryProvider;
pub use schema::ProviderSchema;
pub use server::{
    serve, serve_on, serve_on_with_options, serve_with_options, ProviderService, ServeOptions,
};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities,
    HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
pub use version::ProductVersion;

pub use async_trait::async_trait;
pub use serde_json;
pub use tonic;
pub use tracing;
