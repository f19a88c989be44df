use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::control::AdminError;
use crate::admin::AdminState;

#[derive(Debug, Deserialize)]
pub struct IdentityQuery {
    #[serde(alias = "ip")]
    pub identity: String,
}

#[derive(Debug, Deserialize)]
pub struct CooldownQuery {
    pub seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendResponse {
    pub success: bool,
    pub identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListResponse {
    /// Comma-joined identities in round-robin order.
    pub backends: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CooldownResponse {
    pub success: bool,
    pub seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemStatus {
    pub version: String,
    pub backends: usize,
    pub cooldown_secs: u64,
    pub health_check_running: bool,
    pub completed_sweeps: u64,
}

fn error_status(error: &AdminError) -> StatusCode {
    match error {
        AdminError::InvalidIdentity(_) | AdminError::InvalidCooldown => StatusCode::BAD_REQUEST,
        AdminError::Unhealthy(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AdminError::Duplicate(_) => StatusCode::CONFLICT,
        AdminError::NotFound(_) => StatusCode::NOT_FOUND,
    }
}

pub async fn root() -> &'static str {
    "OK"
}

fn bad_identity_query(rejection: QueryRejection) -> (StatusCode, Json<BackendResponse>) {
    (
        rejection.status(),
        Json(BackendResponse {
            success: false,
            identity: String::new(),
            reason: Some(rejection.body_text()),
        }),
    )
}

pub async fn add_backend(
    State(state): State<AdminState>,
    query: Result<Query<IdentityQuery>, QueryRejection>,
) -> (StatusCode, Json<BackendResponse>) {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_identity_query(rejection),
    };
    match state.control.add_backend(&query.identity).await {
        Ok(backend) => (
            StatusCode::OK,
            Json(BackendResponse {
                success: true,
                identity: backend.identity().to_string(),
                reason: None,
            }),
        ),
        Err(e) => (
            error_status(&e),
            Json(BackendResponse {
                success: false,
                identity: query.identity,
                reason: Some(e.to_string()),
            }),
        ),
    }
}

pub async fn remove_backend(
    State(state): State<AdminState>,
    query: Result<Query<IdentityQuery>, QueryRejection>,
) -> (StatusCode, Json<BackendResponse>) {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_identity_query(rejection),
    };
    match state.control.remove_backend(&query.identity) {
        Ok(()) => (
            StatusCode::OK,
            Json(BackendResponse {
                success: true,
                identity: query.identity,
                reason: None,
            }),
        ),
        Err(e) => (
            error_status(&e),
            Json(BackendResponse {
                success: false,
                identity: query.identity,
                reason: Some(e.to_string()),
            }),
        ),
    }
}

pub async fn list_backends(State(state): State<AdminState>) -> Json<ListResponse> {
    let identities = state.control.list_backends();
    Json(ListResponse {
        count: identities.len(),
        backends: identities.join(","),
    })
}

pub async fn set_cooldown(
    State(state): State<AdminState>,
    query: Result<Query<CooldownQuery>, QueryRejection>,
) -> (StatusCode, Json<CooldownResponse>) {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            return (
                rejection.status(),
                Json(CooldownResponse {
                    success: false,
                    seconds: 0,
                    reason: Some(rejection.body_text()),
                }),
            )
        }
    };
    match state.control.set_cooldown(query.seconds).await {
        Ok(()) => (
            StatusCode::OK,
            Json(CooldownResponse {
                success: true,
                seconds: query.seconds,
                reason: None,
            }),
        ),
        Err(e) => (
            error_status(&e),
            Json(CooldownResponse {
                success: false,
                seconds: query.seconds,
                reason: Some(e.to_string()),
            }),
        ),
    }
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let status = state.control.status().await;
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        backends: status.backends,
        cooldown_secs: status.cooldown_secs,
        health_check_running: status.health_check_running,
        completed_sweeps: status.completed_sweeps,
    })
}
