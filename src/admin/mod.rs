//! Administrative control surface.
//!
//! # Routes
//! ```text
//! GET /                      → "OK"
//! GET /add?identity=<id>     → probe, register if healthy
//! GET /remove?identity=<id>  → unregister
//! GET /list                  → comma-joined identities
//! GET /cooldown?seconds=<n>  → restart health sweep with new interval
//! GET /status                → counters
//! ```
//! Every route but `/` sits behind the optional bearer-token check.

pub mod auth;
pub mod control;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;

pub use control::{AdminControl, AdminError, ControlStatus};

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub control: Arc<AdminControl>,
    pub api_key: Option<String>,
}

impl AdminState {
    pub fn new(control: Arc<AdminControl>, api_key: Option<String>) -> Self {
        Self { control, api_key }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/add", get(add_backend))
        .route("/remove", get(remove_backend))
        .route("/list", get(list_backends))
        .route("/cooldown", get(set_cooldown))
        .route("/status", get(get_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .route("/", get(root))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
