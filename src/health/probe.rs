//! Backend probing.
//!
//! # Responsibilities
//! - Issue a single GET against a backend's endpoint
//! - Collapse every failure mode (connect error, timeout, non-2xx) into
//!   `false`
//!
//! The same probe gates dispatch, drives the sweep and vets admin adds.

use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use futures_util::future::BoxFuture;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::load_balancer::backend::Backend;
use crate::observability::metrics;

/// A health probe. Implementations must never fail past this boundary.
pub trait Probe: Send + Sync + 'static {
    /// Returns `true` only if the backend answered healthily.
    fn probe<'a>(&'a self, backend: &'a Backend) -> BoxFuture<'a, bool>;
}

/// HTTP GET probe with a hard timeout.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client<HttpConnector, Body>,
    path: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(path: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            client,
            path: path.into(),
            timeout,
        }
    }

    pub fn from_config(config: &HealthCheckConfig) -> Self {
        Self::new(config.path.clone(), Duration::from_millis(config.timeout_ms))
    }

    async fn check(&self, backend: &Backend) -> bool {
        let uri = backend.probe_uri(&self.path);

        let request = match Request::builder()
            .method("GET")
            .uri(&uri)
            .header("user-agent", "tcp-balancer-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(backend = %backend, uri = %uri, error = %e, "Failed to build probe request");
                return false;
            }
        };

        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let success = response.status().is_success();
                if !success {
                    tracing::warn!(backend = %backend, status = %response.status(), "Probe failed: non-success status");
                }
                success
            }
            Ok(Err(e)) => {
                tracing::warn!(backend = %backend, error = %e, "Probe failed: connection error");
                false
            }
            Err(_) => {
                tracing::warn!(backend = %backend, timeout = ?self.timeout, "Probe failed: timeout");
                false
            }
        }
    }
}

impl Probe for HttpProbe {
    fn probe<'a>(&'a self, backend: &'a Backend) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            let healthy = self.check(backend).await;
            metrics::record_probe(healthy);
            healthy
        })
    }
}
