pub mod admin;
pub mod booking;
pub mod catalog;
pub mod health;
pub mod session;

use chrono::NaiveDateTime;

use crate::errors::AppError;
use crate::models::User;
use crate::services::session::GateDecision;
use crate::state::AppState;

/// Evaluate the user gate for a protected route, yielding the confirmed
/// identity or an `Unauthorized` carrying the login redirect.
pub(crate) async fn require_user(state: &AppState, requested: &str) -> Result<User, AppError> {
    match state.user_gate.evaluate(requested).await? {
        GateDecision::Granted { user: Some(user) } => Ok(user),
        GateDecision::Granted { user: None } => Err(AppError::Config(
            "user gate granted without an identity".to_string(),
        )),
        GateDecision::Denied { redirect_to } => Err(AppError::Unauthorized { redirect_to }),
    }
}

pub(crate) async fn require_admin(state: &AppState, requested: &str) -> Result<(), AppError> {
    match state.admin_gate.evaluate(requested).await? {
        GateDecision::Granted { .. } => Ok(()),
        GateDecision::Denied { redirect_to } => Err(AppError::Unauthorized { redirect_to }),
    }
}

pub(crate) fn parse_ts(s: &str, field: &'static str) -> Result<NaiveDateTime, AppError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .map_err(|_| AppError::InvalidWindow { field })
}
