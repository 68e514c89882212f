use async_trait::async_trait;
use reqwest::StatusCode;

use crate::models::User;

/// Failure modes of identity confirmation. `Invalid` means the credential
/// itself is bad and must be purged; `Transient` means the service could not
/// be reached and the credential may still be good.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("credential invalid")]
    Invalid,

    #[error("identity service unavailable: {0}")]
    Transient(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve_current_user(&self, token: &str) -> Result<User, IdentityError>;
}

pub struct HttpIdentityProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpIdentityProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn resolve_current_user(&self, token: &str) -> Result<User, IdentityError> {
        let url = format!("{}/users/me", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IdentityError::Transient(e.to_string()))?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(IdentityError::Invalid);
        }

        let response = response
            .error_for_status()
            .map_err(|e| IdentityError::Transient(e.to_string()))?;

        response
            .json::<User>()
            .await
            .map_err(|e| IdentityError::Transient(e.to_string()))
    }
}
