//! Provider configuration.
//!
//! Every attribute can be supplied in the provider block or through a
//! `PINGDIRECTORY_PROVIDER_*` environment variable; the block wins.

use serde::Deserialize;
use serde_json::Value;

use crate::schema::{Attribute, Diagnostic, Schema};
use crate::version::{self, ProductVersion, VersionSupport};

/// Environment variable for `https_host`.
pub const ENV_HTTPS_HOST: &str = "PINGDIRECTORY_PROVIDER_HTTPS_HOST";
/// Environment variable for `username`.
pub const ENV_USERNAME: &str = "PINGDIRECTORY_PROVIDER_USERNAME";
/// Environment variable for `password`.
pub const ENV_PASSWORD: &str = "PINGDIRECTORY_PROVIDER_PASSWORD";
/// Environment variable for `insecure_trust_all_tls`.
pub const ENV_INSECURE_TRUST_ALL_TLS: &str = "PINGDIRECTORY_PROVIDER_INSECURE_TRUST_ALL_TLS";
/// Environment variable for `ca_certificate_pem_files`, comma-separated.
pub const ENV_CA_CERTIFICATE_PEM_FILES: &str = "PINGDIRECTORY_PROVIDER_CA_CERTIFICATE_PEM_FILES";
/// Environment variable for `product_version`.
pub const ENV_PRODUCT_VERSION: &str = "PINGDIRECTORY_PROVIDER_PRODUCT_VERSION";

/// Raw provider block as sent by the host. Every field is optional because
/// environment variables may fill the gaps.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    https_host: Option<String>,
    username: Option<String>,
    password: Option<String>,
    insecure_trust_all_tls: Option<bool>,
    ca_certificate_pem_files: Option<Vec<String>>,
    product_version: Option<String>,
}

/// Resolved provider configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Base URL of the server, e.g. `https://localhost:1443`.
    pub https_host: String,
    /// Administrative user for basic authentication.
    pub username: String,
    /// Password for `username`.
    pub password: String,
    /// Accept any server certificate.
    pub insecure_trust_all_tls: bool,
    /// Extra PEM files trusted as certificate authorities.
    pub ca_certificate_pem_files: Vec<String>,
    /// Version of the server being configured.
    pub product_version: ProductVersion,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("https_host", &self.https_host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("insecure_trust_all_tls", &self.insecure_trust_all_tls)
            .field("ca_certificate_pem_files", &self.ca_certificate_pem_files)
            .field("product_version", &self.product_version)
            .finish()
    }
}

impl ProviderConfig {
    /// Resolve the configuration from the provider block and the process
    /// environment.
    pub fn from_value(config: &Value) -> Result<(Self, Vec<Diagnostic>), Vec<Diagnostic>> {
        Self::from_value_with_env(config, |key| std::env::var(key).ok())
    }

    /// Resolve the configuration using `env` to look up fallbacks.
    ///
    /// On success, returns the configuration and any warnings. On failure,
    /// returns every error found, not just the first.
    pub fn from_value_with_env<F>(
        config: &Value,
        env: F,
    ) -> Result<(Self, Vec<Diagnostic>), Vec<Diagnostic>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawConfig = match config {
            Value::Null => RawConfig::default(),
            other => serde_json::from_value(other.clone()).map_err(|e| {
                vec![Diagnostic::error("Invalid provider configuration").with_detail(e.to_string())]
            })?,
        };

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let lookup = |value: Option<String>, key: &str| {
            value
                .filter(|v| !v.is_empty())
                .or_else(|| env(key).filter(|v| !v.is_empty()))
        };

        let https_host = lookup(raw.https_host, ENV_HTTPS_HOST);
        let username = lookup(raw.username, ENV_USERNAME);
        let password = lookup(raw.password, ENV_PASSWORD);
        let product_version = lookup(raw.product_version, ENV_PRODUCT_VERSION);

        let insecure_trust_all_tls = match raw.insecure_trust_all_tls {
            Some(v) => v,
            None => match env(ENV_INSECURE_TRUST_ALL_TLS) {
                Some(v) => match v.trim().parse::<bool>() {
                    Ok(b) => b,
                    Err(_) => {
                        errors.push(
                            Diagnostic::error("Invalid value for insecure_trust_all_tls")
                                .with_detail(format!(
                                    "{} must be 'true' or 'false', got '{}'",
                                    ENV_INSECURE_TRUST_ALL_TLS, v
                                ))
                                .with_attribute("insecure_trust_all_tls"),
                        );
                        false
                    },
                },
                None => false,
            },
        };

        let ca_certificate_pem_files = match raw.ca_certificate_pem_files {
            Some(files) if !files.is_empty() => files,
            _ => env(ENV_CA_CERTIFICATE_PEM_FILES)
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        };

        for (value, attr, key) in [
            (&https_host, "https_host", ENV_HTTPS_HOST),
            (&username, "username", ENV_USERNAME),
            (&password, "password", ENV_PASSWORD),
            (&product_version, "product_version", ENV_PRODUCT_VERSION),
        ] {
            if value.is_none() {
                errors.push(missing(attr, key));
            }
        }

        if let Some(host) = &https_host {
            match url::Url::parse(host) {
                Ok(parsed) if parsed.scheme() == "https" => {},
                Ok(_) => errors.push(
                    Diagnostic::error("Invalid https_host")
                        .with_detail(format!("'{}' must use the https scheme", host))
                        .with_attribute("https_host"),
                ),
                Err(e) => errors.push(
                    Diagnostic::error("Invalid https_host")
                        .with_detail(format!("'{}' is not a valid URL: {}", host, e))
                        .with_attribute("https_host"),
                ),
            }
        }

        let parsed_version = match product_version.as_deref().map(str::parse::<ProductVersion>) {
            Some(Ok(v)) => match version::check_supported(&v) {
                Ok(VersionSupport::Supported) => Some(v),
                Ok(VersionSupport::Assumed(msg)) => {
                    warnings.push(
                        Diagnostic::warning("Unrecognized PingDirectory version")
                            .with_detail(msg)
                            .with_attribute("product_version"),
                    );
                    Some(v)
                },
                Err(e) => {
                    errors.push(
                        Diagnostic::error("Unsupported PingDirectory version")
                            .with_detail(e.message())
                            .with_attribute("product_version"),
                    );
                    None
                },
            },
            Some(Err(e)) => {
                errors.push(
                    Diagnostic::error("Invalid product_version")
                        .with_detail(e.message())
                        .with_attribute("product_version"),
                );
                None
            },
            None => None,
        };

        if insecure_trust_all_tls && !ca_certificate_pem_files.is_empty() {
            warnings.push(
                Diagnostic::warning("CA certificates ignored")
                    .with_detail(
                        "insecure_trust_all_tls is true, so ca_certificate_pem_files has no effect",
                    )
                    .with_attribute("ca_certificate_pem_files"),
            );
        }

        match (https_host, username, password, parsed_version) {
            (Some(https_host), Some(username), Some(password), Some(product_version))
                if errors.is_empty() =>
            {
                Ok((
                    Self {
                        https_host: https_host.trim_end_matches('/').to_string(),
                        username,
                        password,
                        insecure_trust_all_tls,
                        ca_certificate_pem_files,
                        product_version,
                    },
                    warnings,
                ))
            },
            _ => Err(errors),
        }
    }

    /// Schema of the provider block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Connection settings for the PingDirectory configuration API.")
            .with_attribute(
                "https_host",
                Attribute::optional_string().with_description(format!(
                    "URI for PingDirectory HTTPS port. Default value can be set with the `{}` environment variable.",
                    ENV_HTTPS_HOST
                )),
            )
            .with_attribute(
                "username",
                Attribute::optional_string().with_description(format!(
                    "Username for PingDirectory admin user. Default value can be set with the `{}` environment variable.",
                    ENV_USERNAME
                )),
            )
            .with_attribute(
                "password",
                Attribute::optional_string().sensitive().with_description(format!(
                    "Password for PingDirectory admin user. Default value can be set with the `{}` environment variable.",
                    ENV_PASSWORD
                )),
            )
            .with_attribute(
                "insecure_trust_all_tls",
                Attribute::optional_bool().with_default(Value::Bool(false)).with_description(format!(
                    "Set to true to trust any certificate when connecting to the PingDirectory server. This is insecure and should not be enabled outside of testing. Default value can be set with the `{}` environment variable.",
                    ENV_INSECURE_TRUST_ALL_TLS
                )),
            )
            .with_attribute(
                "ca_certificate_pem_files",
                Attribute::optional_string_set()
                    .with_description(format!(
                        "Paths to files containing PEM-encoded certificates to be trusted as root CAs when connecting to the PingDirectory server over HTTPS. Default value can be set with the `{}` environment variable, using commas to delimit multiple PEM files.",
                        ENV_CA_CERTIFICATE_PEM_FILES
                    )),
            )
            .with_attribute(
                "product_version",
                Attribute::optional_string().with_description(format!(
                    "Version of the PingDirectory server being configured. Default value can be set with the `{}` environment variable.",
                    ENV_PRODUCT_VERSION
                )),
            )
    }
}

fn missing(attr: &str, env_key: &str) -> Diagnostic {
    Diagnostic::error(format!("Missing {}", attr))
        .with_detail(format!(
            "Set '{}' in the provider configuration or the {} environment variable",
            attr, env_key
        ))
        .with_attribute(attr)
}
