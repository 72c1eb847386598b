//! PingDirectory product versions.
//!
//! The provider is told which server version it talks to (`product_version`)
//! and uses it to reject attributes the server does not know about yet.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::ProviderError;

/// A four-part PingDirectory version, e.g. `9.2.0.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Maintenance version.
    pub maintenance: u32,
    /// Patch version.
    pub patch: u32,
}

impl ProductVersion {
    /// Construct a version from its parts.
    pub const fn new(major: u32, minor: u32, maintenance: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            maintenance,
            patch,
        }
    }

    /// Whether two versions share a major.minor release line.
    pub fn same_release_line(&self, other: &ProductVersion) -> bool {
        self.major == other.major && self.minor == other.minor
    }

    /// Whether this version is `other` or newer.
    pub fn is_at_least(&self, other: &ProductVersion) -> bool {
        self.cmp(other) != Ordering::Less
    }
}

impl fmt::Display for ProductVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.maintenance, self.patch
        )
    }
}

impl FromStr for ProductVersion {
    type Err = ProviderError;

    /// Parses `a.b.c.d`; a three-part `a.b.c` gets a trailing `.0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .trim()
            .split('.')
            .map(|p| p.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid_version(s))?;

        match parts.as_slice() {
            [major, minor, maintenance] => Ok(Self::new(*major, *minor, *maintenance, 0)),
            [major, minor, maintenance, patch] => {
                Ok(Self::new(*major, *minor, *maintenance, *patch))
            },
            _ => Err(invalid_version(s)),
        }
    }
}

fn invalid_version(s: &str) -> ProviderError {
    ProviderError::Configuration(format!(
        "Invalid PingDirectory product version '{}'; expected a value like 9.3.0.0",
        s
    ))
}

/// Versions this provider has been tested against, oldest first.
pub const SUPPORTED_VERSIONS: &[ProductVersion] = &[
    ProductVersion::new(9, 0, 0, 0),
    ProductVersion::new(9, 0, 0, 1),
    ProductVersion::new(9, 0, 0, 2),
    ProductVersion::new(9, 1, 0, 0),
    ProductVersion::new(9, 1, 0, 1),
    ProductVersion::new(9, 1, 0, 2),
    ProductVersion::new(9, 2, 0, 0),
    ProductVersion::new(9, 2, 0, 1),
    ProductVersion::new(9, 3, 0, 0),
];

/// Outcome of checking a configured version against [`SUPPORTED_VERSIONS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSupport {
    /// The version is listed.
    Supported,
    /// Not listed, but its release line is; carries a warning message.
    Assumed(String),
}

/// Check a version against the supported list.
pub fn check_supported(version: &ProductVersion) -> Result<VersionSupport, ProviderError> {
    if SUPPORTED_VERSIONS.contains(version) {
        return Ok(VersionSupport::Supported);
    }

    if let Some(latest) = SUPPORTED_VERSIONS
        .iter()
        .filter(|v| v.same_release_line(version))
        .max()
    {
        return Ok(VersionSupport::Assumed(format!(
            "PingDirectory version {} is not explicitly supported; assuming it behaves like {}",
            version, latest
        )));
    }

    let supported = SUPPORTED_VERSIONS
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(ProviderError::Configuration(format!(
        "PingDirectory version {} is not supported. Supported versions: {}",
        version, supported
    )))
}
