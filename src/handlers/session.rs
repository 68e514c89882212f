use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::User;
use crate::services::session::GateDecision;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SessionResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_to: Option<String>,
}

impl From<GateDecision> for SessionResponse {
    fn from(decision: GateDecision) -> Self {
        match decision {
            GateDecision::Granted { user } => Self {
                status: "granted",
                user,
                redirect_to: None,
            },
            GateDecision::Denied { redirect_to } => Self {
                status: "denied",
                user: None,
                redirect_to: Some(redirect_to),
            },
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub token: String,
}

// GET /api/session
pub async fn get_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionResponse>, AppError> {
    let decision = state.user_gate.evaluate("/").await?;
    Ok(Json(decision.into()))
}

// POST /api/session/login
//
// Stores the credential and immediately resolves it, so a bad token
// surfaces (and is purged) here instead of on the next protected request.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    state.user_gate.login(&req.token).await?;
    let decision = state.user_gate.evaluate("/").await?;
    Ok(Json(decision.into()))
}

// POST /api/session/logout
pub async fn logout(State(state): State<Arc<AppState>>) -> Result<StatusCode, AppError> {
    state.user_gate.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/admin/session
pub async fn get_admin_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionResponse>, AppError> {
    let decision = state.admin_gate.evaluate("/admin").await?;
    Ok(Json(decision.into()))
}

// POST /api/admin/session/login
//
// The admin gate itself is presence-only, so the credential is checked
// against the configured token before it ever reaches the store.
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    if req.token != state.config.admin_token {
        return Err(AppError::Unauthorized {
            redirect_to: "/admin/login".to_string(),
        });
    }
    state.admin_gate.login(&req.token).await?;
    let decision = state.admin_gate.evaluate("/admin").await?;
    Ok(Json(decision.into()))
}

// POST /api/admin/session/logout
pub async fn admin_logout(State(state): State<Arc<AppState>>) -> Result<StatusCode, AppError> {
    state.admin_gate.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}
