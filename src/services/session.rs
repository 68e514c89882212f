use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::db::queries;
use crate::models::User;
use crate::services::identity::{IdentityError, IdentityProvider};

/// Durable storage for one opaque credential token. Injected so tests can
/// substitute an in-memory store for the SQLite-backed one.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> anyhow::Result<Option<String>>;
    fn set(&self, token: &str) -> anyhow::Result<()>;
    fn clear(&self) -> anyhow::Result<()>;
}

pub struct SqliteTokenStore {
    db: Arc<Mutex<Connection>>,
    namespace: &'static str,
}

impl SqliteTokenStore {
    pub fn new(db: Arc<Mutex<Connection>>, namespace: &'static str) -> Self {
        Self { db, namespace }
    }
}

impl TokenStore for SqliteTokenStore {
    fn get(&self) -> anyhow::Result<Option<String>> {
        let conn = self.db.lock().unwrap();
        queries::get_session_token(&conn, self.namespace)
    }

    fn set(&self, token: &str) -> anyhow::Result<()> {
        let conn = self.db.lock().unwrap();
        queries::set_session_token(&conn, self.namespace, token)
    }

    fn clear(&self) -> anyhow::Result<()> {
        let conn = self.db.lock().unwrap();
        queries::clear_session_token(&conn, self.namespace)
    }
}

pub struct InMemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl InMemoryTokenStore {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: Mutex::new(token.map(str::to_string)),
        }
    }
}

impl TokenStore for InMemoryTokenStore {
    fn get(&self) -> anyhow::Result<Option<String>> {
        Ok(self.token.lock().unwrap().clone())
    }

    fn set(&self, token: &str) -> anyhow::Result<()> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}

/// Observable gate state. `Pending` means a token is present but identity
/// confirmation has not resolved; callers render a neutral waiting state and
/// must never treat it as `Granted`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateStatus {
    Pending,
    Denied,
    Granted,
}

impl GateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateStatus::Pending => "pending",
            GateStatus::Denied => "denied",
            GateStatus::Granted => "granted",
        }
    }
}

/// Outcome of a gate evaluation for a specific requested destination.
/// Denials carry the login redirect with the destination so the caller can
/// resume after login instead of rendering an error.
#[derive(Debug, Clone)]
pub enum GateDecision {
    Granted { user: Option<User> },
    Denied { redirect_to: String },
}

enum GateMode {
    /// Token presence alone grants access (admin gate).
    PresenceOnly,
    /// Token must be confirmed against the identity service (user gate).
    Identity(Arc<dyn IdentityProvider>),
}

/// One authorization gate over one credential namespace. The user and admin
/// gates are two instances of this type with different modes; they share no
/// state, so one credential never grants the other scope.
pub struct SessionGate {
    login_path: String,
    mode: GateMode,
    tokens: Box<dyn TokenStore>,
    // Confirmed identity, cached until login/logout. The async mutex also
    // serializes confirmation attempts: a concurrent evaluation awaits the
    // in-flight one and reuses its outcome instead of issuing a second
    // lookup.
    confirmed: tokio::sync::Mutex<Option<User>>,
}

impl SessionGate {
    pub fn presence_only(login_path: &str, tokens: Box<dyn TokenStore>) -> Self {
        Self {
            login_path: login_path.to_string(),
            mode: GateMode::PresenceOnly,
            tokens,
            confirmed: tokio::sync::Mutex::new(None),
        }
    }

    pub fn with_identity(
        login_path: &str,
        tokens: Box<dyn TokenStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            login_path: login_path.to_string(),
            mode: GateMode::Identity(identity),
            tokens,
            confirmed: tokio::sync::Mutex::new(None),
        }
    }

    fn denied(&self, requested: &str) -> GateDecision {
        GateDecision::Denied {
            redirect_to: format!("{}?from={requested}", self.login_path),
        }
    }

    /// Snapshot of the gate without driving confirmation. Never reports
    /// `Granted` on the strength of token presence alone.
    pub async fn status(&self) -> anyhow::Result<GateStatus> {
        if self.tokens.get()?.is_none() {
            return Ok(GateStatus::Denied);
        }
        match &self.mode {
            GateMode::PresenceOnly => Ok(GateStatus::Granted),
            GateMode::Identity(_) => {
                if self.confirmed.lock().await.is_some() {
                    Ok(GateStatus::Granted)
                } else {
                    Ok(GateStatus::Pending)
                }
            }
        }
    }

    /// Decide whether a request for `requested` may proceed, resolving the
    /// asynchronous confirmation phase if it is still outstanding.
    pub async fn evaluate(&self, requested: &str) -> anyhow::Result<GateDecision> {
        // Synchronous presence phase: no token means an immediate denial
        // with no network call.
        let Some(token) = self.tokens.get()? else {
            return Ok(self.denied(requested));
        };

        let identity = match &self.mode {
            GateMode::PresenceOnly => return Ok(GateDecision::Granted { user: None }),
            GateMode::Identity(identity) => identity,
        };

        let mut confirmed = self.confirmed.lock().await;
        if let Some(user) = confirmed.as_ref() {
            return Ok(GateDecision::Granted {
                user: Some(user.clone()),
            });
        }

        match confirm_with_retry(identity.as_ref(), &token).await {
            Ok(user) => {
                *confirmed = Some(user.clone());
                Ok(GateDecision::Granted { user: Some(user) })
            }
            Err(IdentityError::Invalid) => {
                // Corrective action, not just a read: purge the bad
                // credential so the next evaluation denies without a call.
                self.tokens.clear()?;
                *confirmed = None;
                tracing::warn!("credential rejected by identity service, token cleared");
                Ok(self.denied(requested))
            }
            Err(IdentityError::Transient(e)) => {
                // The credential may still be good; keep the token but deny
                // this evaluation rather than looping on retries.
                tracing::warn!(error = %e, "identity confirmation unavailable");
                Ok(self.denied(requested))
            }
        }
    }

    /// Store a credential and reset the cached identity so the next
    /// evaluation re-confirms.
    pub async fn login(&self, token: &str) -> anyhow::Result<()> {
        self.tokens.set(token)?;
        *self.confirmed.lock().await = None;
        Ok(())
    }

    /// Clear the credential and cached identity entirely.
    pub async fn logout(&self) -> anyhow::Result<()> {
        self.tokens.clear()?;
        *self.confirmed.lock().await = None;
        Ok(())
    }
}

/// One transparent retry on transient failure; a second failure of any kind
/// is definitive for this attempt.
async fn confirm_with_retry(
    identity: &dyn IdentityProvider,
    token: &str,
) -> Result<User, IdentityError> {
    match identity.resolve_current_user(token).await {
        Ok(user) => Ok(user),
        Err(IdentityError::Invalid) => Err(IdentityError::Invalid),
        Err(IdentityError::Transient(first)) => {
            tracing::debug!(error = %first, "retrying identity confirmation once");
            identity.resolve_current_user(token).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn test_user() -> User {
        User {
            id: "user-1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
        }
    }

    struct MockIdentity {
        valid_token: &'static str,
        calls: AtomicUsize,
        transient_failures: AtomicUsize,
        delay: Option<Duration>,
    }

    impl MockIdentity {
        fn new(valid_token: &'static str) -> Self {
            Self {
                valid_token,
                calls: AtomicUsize::new(0),
                transient_failures: AtomicUsize::new(0),
                delay: None,
            }
        }

        fn failing_transiently(valid_token: &'static str, failures: usize) -> Self {
            Self {
                transient_failures: AtomicUsize::new(failures),
                ..Self::new(valid_token)
            }
        }

        fn slow(valid_token: &'static str) -> Self {
            Self {
                delay: Some(Duration::from_millis(50)),
                ..Self::new(valid_token)
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentityProvider for MockIdentity {
        async fn resolve_current_user(&self, token: &str) -> Result<User, IdentityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self
                .transient_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(IdentityError::Transient("connection refused".to_string()));
            }
            if token == self.valid_token {
                Ok(test_user())
            } else {
                Err(IdentityError::Invalid)
            }
        }
    }

    fn user_gate(token: Option<&str>, identity: Arc<MockIdentity>) -> SessionGate {
        SessionGate::with_identity("/login", Box::new(InMemoryTokenStore::new(token)), identity)
    }

    #[tokio::test]
    async fn test_no_token_denies_without_network_call() {
        let identity = Arc::new(MockIdentity::new("tok"));
        let gate = user_gate(None, Arc::clone(&identity));

        let decision = gate.evaluate("/bookings").await.unwrap();
        assert!(matches!(decision, GateDecision::Denied { .. }));
        assert_eq!(identity.call_count(), 0);
        assert_eq!(gate.status().await.unwrap(), GateStatus::Denied);
    }

    #[tokio::test]
    async fn test_token_presence_alone_is_pending_not_granted() {
        let identity = Arc::new(MockIdentity::new("tok"));
        let gate = user_gate(Some("tok"), Arc::clone(&identity));

        assert_eq!(gate.status().await.unwrap(), GateStatus::Pending);
        assert_ne!(gate.status().await.unwrap(), GateStatus::Granted);
        assert_eq!(identity.call_count(), 0);
    }

    #[tokio::test]
    async fn test_confirmation_grants_and_caches_identity() {
        let identity = Arc::new(MockIdentity::new("tok"));
        let gate = user_gate(Some("tok"), Arc::clone(&identity));

        let decision = gate.evaluate("/bookings").await.unwrap();
        match decision {
            GateDecision::Granted { user } => assert_eq!(user.unwrap().id, "user-1"),
            other => panic!("expected granted, got {other:?}"),
        }
        assert_eq!(gate.status().await.unwrap(), GateStatus::Granted);

        // Cached: a second evaluation does not hit the identity service.
        gate.evaluate("/bookings").await.unwrap();
        assert_eq!(identity.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_token_is_purged_then_denied_offline() {
        let identity = Arc::new(MockIdentity::new("good"));
        let gate = user_gate(Some("expired"), Arc::clone(&identity));

        let decision = gate.evaluate("/bookings").await.unwrap();
        match decision {
            GateDecision::Denied { redirect_to } => {
                assert_eq!(redirect_to, "/login?from=/bookings");
            }
            other => panic!("expected denied, got {other:?}"),
        }
        assert_eq!(identity.call_count(), 1);

        // Token was cleared, so the next evaluation is a presence-phase
        // denial with no further lookup.
        let decision = gate.evaluate("/bookings").await.unwrap();
        assert!(matches!(decision, GateDecision::Denied { .. }));
        assert_eq!(identity.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_retried_once_then_succeeds() {
        let identity = Arc::new(MockIdentity::failing_transiently("tok", 1));
        let gate = user_gate(Some("tok"), Arc::clone(&identity));

        let decision = gate.evaluate("/bookings").await.unwrap();
        assert!(matches!(decision, GateDecision::Granted { .. }));
        assert_eq!(identity.call_count(), 2);
    }

    #[tokio::test]
    async fn test_double_transient_failure_denies_but_keeps_token() {
        let identity = Arc::new(MockIdentity::failing_transiently("tok", 2));
        let gate = user_gate(Some("tok"), Arc::clone(&identity));

        let decision = gate.evaluate("/bookings").await.unwrap();
        assert!(matches!(decision, GateDecision::Denied { .. }));
        assert_eq!(identity.call_count(), 2);

        // Token survives, so once the service recovers the same credential
        // confirms.
        let decision = gate.evaluate("/bookings").await.unwrap();
        assert!(matches!(decision, GateDecision::Granted { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_evaluations_share_one_confirmation() {
        let identity = Arc::new(MockIdentity::slow("tok"));
        let gate = Arc::new(user_gate(Some("tok"), Arc::clone(&identity)));

        let a = tokio::spawn({
            let gate = Arc::clone(&gate);
            async move { gate.evaluate("/bookings").await.unwrap() }
        });
        let b = tokio::spawn({
            let gate = Arc::clone(&gate);
            async move { gate.evaluate("/account").await.unwrap() }
        });

        assert!(matches!(a.await.unwrap(), GateDecision::Granted { .. }));
        assert!(matches!(b.await.unwrap(), GateDecision::Granted { .. }));
        assert_eq!(identity.call_count(), 1);
    }

    #[tokio::test]
    async fn test_presence_only_gate_never_calls_identity() {
        let gate =
            SessionGate::presence_only("/admin/login", Box::new(InMemoryTokenStore::new(None)));

        let decision = gate.evaluate("/admin").await.unwrap();
        match decision {
            GateDecision::Denied { redirect_to } => {
                assert_eq!(redirect_to, "/admin/login?from=/admin");
            }
            other => panic!("expected denied, got {other:?}"),
        }

        gate.login("secret").await.unwrap();
        assert!(matches!(
            gate.evaluate("/admin").await.unwrap(),
            GateDecision::Granted { user: None }
        ));
        assert_eq!(gate.status().await.unwrap(), GateStatus::Granted);
    }

    #[tokio::test]
    async fn test_logout_clears_token_and_cached_identity() {
        let identity = Arc::new(MockIdentity::new("tok"));
        let gate = user_gate(Some("tok"), Arc::clone(&identity));

        gate.evaluate("/bookings").await.unwrap();
        gate.logout().await.unwrap();

        assert_eq!(gate.status().await.unwrap(), GateStatus::Denied);
        let decision = gate.evaluate("/bookings").await.unwrap();
        assert!(matches!(decision, GateDecision::Denied { .. }));
        assert_eq!(identity.call_count(), 1);
    }

    #[tokio::test]
    async fn test_login_resets_cache_and_reconfirms() {
        let identity = Arc::new(MockIdentity::new("tok-2"));
        let gate = user_gate(Some("tok-1"), Arc::clone(&identity));

        // First credential is rejected and purged.
        gate.evaluate("/bookings").await.unwrap();
        assert_eq!(identity.call_count(), 1);

        gate.login("tok-2").await.unwrap();
        assert_eq!(gate.status().await.unwrap(), GateStatus::Pending);

        let decision = gate.evaluate("/bookings").await.unwrap();
        assert!(matches!(decision, GateDecision::Granted { .. }));
        assert_eq!(identity.call_count(), 2);
    }
}
