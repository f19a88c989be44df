//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single downstream instance eligible for traffic
//! - Derive the probe/forward endpoint from the registered identity
//! - Define identity-based equality used by the registry

use std::fmt;
use url::Url;

/// Error type for backend construction.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The identity was empty or only whitespace.
    #[error("backend identity must not be empty")]
    EmptyIdentity,
    /// The identity could not be turned into an endpoint URL.
    #[error("invalid backend identity {identity:?}: {source}")]
    InvalidEndpoint {
        identity: String,
        #[source]
        source: url::ParseError,
    },
    /// The endpoint has no host component.
    #[error("backend identity {0:?} has no host")]
    MissingHost(String),
}

/// A single backend server.
///
/// Two backends are equal when their identities are equal, regardless of
/// which allocation they live in.
#[derive(Debug, Clone)]
pub struct Backend {
    /// Opaque identity as registered by the operator, usually `host:port`.
    identity: String,
    /// Endpoint used for health probes and forwarding.
    endpoint: Url,
}

impl Backend {
    /// Create a backend from an identity.
    ///
    /// Identities without a scheme are treated as `http://<identity>`.
    pub fn new(identity: impl Into<String>) -> Result<Self, BackendError> {
        let identity = identity.into().trim().to_string();
        if identity.is_empty() {
            return Err(BackendError::EmptyIdentity);
        }

        let raw = if identity.contains("://") {
            identity.clone()
        } else {
            format!("http://{}", identity)
        };

        let endpoint = Url::parse(&raw).map_err(|source| BackendError::InvalidEndpoint {
            identity: identity.clone(),
            source,
        })?;

        if endpoint.host_str().is_none() {
            return Err(BackendError::MissingHost(identity));
        }

        Ok(Self { identity, endpoint })
    }

    /// The registered identity.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// `host:port` used to open forwarding connections (port defaults to 80).
    pub fn authority(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        let port = self.endpoint.port_or_known_default().unwrap_or(80);
        if host.contains(':') && !host.starts_with('[') {
            format!("[{}]:{}", host, port)
        } else {
            format!("{}:{}", host, port)
        }
    }

    /// Full probe URI for the given path.
    pub fn probe_uri(&self, path: &str) -> String {
        let base = self.endpoint.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

impl PartialEq for Backend {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for Backend {}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity)
    }
}
