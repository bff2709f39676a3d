//! Main Shelf client.

use crate::admin::AdminApi;
use crate::auth::AuthApi;
use crate::books::BooksApi;
use crate::borrowing::BorrowingApi;
use crate::config::{Capabilities, ClientConfig};
use crate::contact::ContactApi;
use crate::envelope::{Envelope, WireBody};
use crate::error::{ClientError, Result, GENERIC_FAILURE};
use crate::session::{MemoryStore, Session, SessionKey, SessionStore};
use crate::subscriptions::SubscriptionsApi;
use crate::users::UsersApi;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const REFRESH_ENDPOINT: &str = "/auth/refresh-token";
const REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-call overrides for [`ShelfClient::request`].
#[derive(Debug, Clone, Copy)]
pub struct RequestOptions {
    /// Overrides the configured default timeout
    pub timeout: Option<Duration>,
    /// Allows the one-shot refresh-and-retry on 401
    pub allow_retry: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            allow_retry: true,
        }
    }
}

impl RequestOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    pub fn no_retry() -> Self {
        Self {
            allow_retry: false,
            ..Self::default()
        }
    }
}

/// Client for the library backend.
///
/// Owns the session and the store it is persisted in. Share it between
/// tasks with an `Arc` rather than building several clients over one store:
/// the refresh gate only coordinates requests made through the same client.
///
/// # Example
///
/// ```ignore
/// use shelf_client::{ClientConfig, FileStore, ShelfClient};
/// use std::sync::Arc;
///
/// let store = Arc::new(FileStore::open("session.json")?);
/// let client = ShelfClient::new(ClientConfig::new("http://localhost:5000"), store)?;
///
/// client.auth().login("reader@example.com", "secret").await?;
/// let books = client.books().list(&Default::default()).await?;
/// ```
pub struct ShelfClient {
    http: Client,
    api_root: String,
    config: ClientConfig,
    store: Arc<dyn SessionStore>,
    session: RwLock<Session>,
    refreshing: AtomicBool,
}

/// Raw result of one HTTP exchange.
struct Exchange {
    status: StatusCode,
    body: WireBody,
    /// Access token the request was sent with
    token: Option<String>,
}

impl Exchange {
    fn into_result(self) -> Result<Envelope> {
        if self.status.is_success() {
            return Ok(self.body.into_envelope(true));
        }

        let message = self
            .body
            .message()
            .filter(|m| !m.is_empty())
            .or_else(|| self.status.canonical_reason())
            .unwrap_or(GENERIC_FAILURE)
            .to_string();

        Err(ClientError::http(
            self.status.as_u16(),
            message,
            self.body.into_raw(),
        ))
    }
}

/// Clears the in-progress flag however the refresh ends.
struct RefreshGuard<'a>(&'a AtomicBool);

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ShelfClient {
    /// Create a client, resuming any session persisted in `store`.
    pub fn new(config: ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
        let api_root = config.api_root()?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .cookie_store(true)
            .user_agent(format!("Shelf/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        let session = Session::load(store.as_ref());
        debug!(
            api_root = %api_root,
            resumed = session.access_token.is_some(),
            "Created client"
        );

        Ok(Self {
            http,
            api_root,
            config,
            store,
            session: RwLock::new(session),
            refreshing: AtomicBool::new(false),
        })
    }

    /// Create a client whose session lives only as long as the process.
    pub fn in_memory(config: ClientConfig) -> Result<Self> {
        Self::new(config, Arc::new(MemoryStore::new()))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.config.capabilities
    }

    /// Full URL for an endpoint relative to the API root.
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.api_root, endpoint)
        } else {
            format!("{}/{}", self.api_root, endpoint)
        }
    }

    pub(crate) fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Snapshot of the current session.
    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.access_token.is_some()
    }

    /// Whether an admin login flow marked this session.
    pub fn is_admin(&self) -> bool {
        self.store.get(SessionKey::IsAdmin).as_deref() == Some("true")
    }

    pub fn is_super_admin(&self) -> bool {
        self.is_admin() && self.store.get(SessionKey::AdminRole).as_deref() == Some("super_admin")
    }

    /// Update the session and persist every value that is present.
    ///
    /// A missing or empty access token removes the persisted one. Missing
    /// refresh token and user id leave the current values untouched. The
    /// in-memory session only changes once every store write succeeded.
    pub async fn set_auth_token(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<()> {
        let access_token = access_token.filter(|t| !t.is_empty());
        let refresh_token = refresh_token.filter(|t| !t.is_empty());
        let user_id = user_id.filter(|id| !id.is_empty());

        let mut session = self.session.write().await;

        if let Some(refresh) = refresh_token {
            self.store.set(SessionKey::RefreshToken, refresh)?;
        }
        if let Some(user_id) = user_id {
            self.store.set(SessionKey::UserId, user_id)?;
        }
        match access_token {
            Some(token) => self.store.set(SessionKey::AuthToken, token)?,
            None => self.store.remove(SessionKey::AuthToken)?,
        }

        session.access_token = access_token.map(str::to_string);
        if let Some(refresh) = refresh_token {
            session.refresh_token = Some(refresh.to_string());
        }
        if let Some(user_id) = user_id {
            session.user_id = Some(user_id.to_string());
        }
        Ok(())
    }

    /// Forget the session, in memory and in the store.
    pub async fn clear_auth(&self) -> Result<()> {
        *self.session.write().await = Session::default();

        let mut first_error = None;
        for key in SessionKey::ALL {
            if let Err(e) = self.store.remove(key) {
                warn!(key = key.as_str(), error = %e, "Failed to remove session key");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Send a request and normalize the response.
    ///
    /// On a 401 for an authenticated call the access token is refreshed once
    /// and the request replayed; if that is not possible the 401 is returned.
    pub async fn request(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
        requires_auth: bool,
        options: RequestOptions,
    ) -> Result<Envelope> {
        let timeout = options
            .timeout
            .unwrap_or_else(|| self.config.default_timeout());

        let exchange = self
            .send(endpoint, &method, body, requires_auth, timeout)
            .await?;

        if exchange.status == StatusCode::UNAUTHORIZED
            && requires_auth
            && self.config.auto_refresh
            && options.allow_retry
            && self.attempt_refresh(exchange.token.as_deref()).await
        {
            debug!(endpoint = %endpoint, "Retrying after token refresh");
            return self
                .send(endpoint, &method, body, requires_auth, timeout)
                .await?
                .into_result();
        }

        exchange.into_result()
    }

    pub(crate) async fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        requires_auth: bool,
    ) -> Result<Envelope> {
        self.request(
            endpoint,
            method,
            body.as_ref(),
            requires_auth,
            RequestOptions::default(),
        )
        .await
    }

    async fn send(
        &self,
        endpoint: &str,
        method: &Method,
        body: Option<&Value>,
        requires_auth: bool,
        timeout: Duration,
    ) -> Result<Exchange> {
        match tokio::time::timeout(
            timeout,
            self.exchange(endpoint, method, body, requires_auth),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    endpoint = %endpoint,
                    timeout_ms = timeout.as_millis() as u64,
                    "Request timed out"
                );
                Err(ClientError::Timeout)
            }
        }
    }

    async fn exchange(
        &self,
        endpoint: &str,
        method: &Method,
        body: Option<&Value>,
        requires_auth: bool,
    ) -> Result<Exchange> {
        let url = self.url(endpoint);
        let token = if requires_auth {
            self.session.read().await.access_token.clone()
        } else {
            None
        };

        debug!(url = %url, method = %method, bearer = token.is_some(), "Sending request");

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }

        if let Some(body) = body.filter(|_| sends_body(method)) {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Request failed");
            ClientError::from(e)
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        debug!(url = %url, status = status.as_u16(), "Received response");

        Ok(Exchange {
            status,
            body: WireBody::decode(content_type.as_deref(), &bytes),
            token,
        })
    }

    // =========================================================================
    // Token refresh
    // =========================================================================

    /// Try to obtain a new access token; `stale_token` is the one that was
    /// just rejected.
    async fn attempt_refresh(&self, stale_token: Option<&str>) -> bool {
        let (current, refresh_token) = {
            let session = self.session.read().await;
            (session.access_token.clone(), session.refresh_token.clone())
        };

        let Some(refresh_token) = refresh_token else {
            debug!("No refresh token, not refreshing");
            return false;
        };

        // Someone else already replaced the rejected token.
        if current.is_some() && current.as_deref() != stale_token {
            return true;
        }

        if self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return self.wait_for_refresh().await;
        }
        let _guard = RefreshGuard(&self.refreshing);

        match self.exchange_refresh_token(&refresh_token).await {
            Ok(true) => {
                info!("Access token refreshed");
                true
            }
            outcome => {
                match outcome {
                    Err(e) => warn!(error = %e, "Token refresh failed"),
                    _ => warn!("Token refresh response carried no access token"),
                }
                if let Err(e) = self.clear_auth().await {
                    warn!(error = %e, "Failed to clear session after refresh failure");
                }
                false
            }
        }
    }

    async fn wait_for_refresh(&self) -> bool {
        let deadline = Instant::now() + self.config.refresh_wait();
        let poll = self.config.refresh_poll();

        while self.refreshing.load(Ordering::Acquire) && Instant::now() < deadline {
            tokio::time::sleep(poll).await;
        }

        self.is_authenticated().await
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<bool> {
        let body = json!({ "refresh_token": refresh_token });
        let envelope = self
            .send(REFRESH_ENDPOINT, &Method::POST, Some(&body), false, REFRESH_TIMEOUT)
            .await?
            .into_result()?;

        let Some(access) = envelope
            .field_string("access_token")
            .or_else(|| envelope.field_string("token"))
        else {
            return Ok(false);
        };

        self.set_auth_token(
            Some(&access),
            envelope.field_string("refresh_token").as_deref(),
            envelope.field_string("user_id").as_deref(),
        )
        .await?;

        Ok(true)
    }

    // =========================================================================
    // Resources
    // =========================================================================

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn users(&self) -> UsersApi<'_> {
        UsersApi::new(self)
    }

    pub fn books(&self) -> BooksApi<'_> {
        BooksApi::new(self)
    }

    pub fn borrowing(&self) -> BorrowingApi<'_> {
        BorrowingApi::new(self)
    }

    pub fn admin(&self) -> AdminApi<'_> {
        AdminApi::new(self)
    }

    pub fn subscriptions(&self) -> SubscriptionsApi<'_> {
        SubscriptionsApi::new(self)
    }

    pub fn contact(&self) -> ContactApi<'_> {
        ContactApi::new(self)
    }

    /// Unauthenticated liveness probe.
    pub async fn health_check(&self) -> Result<Envelope> {
        self.call(Method::GET, "/health", None, false).await
    }

    pub async fn system_status(&self) -> Result<Envelope> {
        self.call(Method::GET, "/status", None, true).await
    }
}

fn sends_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MockSessionStore;
    use mockall::predicate::eq;

    fn config() -> ClientConfig {
        ClientConfig::new("http://localhost:5000")
    }

    #[test]
    fn test_url_joining() {
        let client = ShelfClient::in_memory(config()).unwrap();
        assert_eq!(client.url("/books"), "http://localhost:5000/api/books");
        assert_eq!(client.url("books/3"), "http://localhost:5000/api/books/3");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = ShelfClient::in_memory(ClientConfig::new("localhost:5000"));
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_sends_body() {
        assert!(sends_body(&Method::POST));
        assert!(sends_body(&Method::PUT));
        assert!(sends_body(&Method::PATCH));
        assert!(!sends_body(&Method::GET));
        assert!(!sends_body(&Method::DELETE));
    }

    #[test]
    fn test_error_message_priority() {
        let exchange = |status: u16, body: WireBody| Exchange {
            status: StatusCode::from_u16(status).unwrap(),
            body,
            token: None,
        };

        let server_message = WireBody::decode(
            Some("application/json"),
            br#"{"status": "error", "message": "Invalid credentials"}"#,
        );
        let err = exchange(401, server_message).into_result().unwrap_err();
        assert_eq!(err.message(), "Invalid credentials");

        let blank_message =
            WireBody::decode(Some("application/json"), br#"{"message": ""}"#);
        let err = exchange(403, blank_message).into_result().unwrap_err();
        assert_eq!(err.message(), "Forbidden");

        let err = exchange(599, WireBody::Empty).into_result().unwrap_err();
        assert_eq!(err.http_status(), 599);
        assert_eq!(err.message(), GENERIC_FAILURE);
        assert!(err.data().is_none());
    }

    #[tokio::test]
    async fn test_clear_auth_removes_every_key() {
        let mut store = MockSessionStore::new();
        store.expect_get().returning(|_| None);
        for key in SessionKey::ALL {
            store
                .expect_remove()
                .with(eq(key))
                .times(1)
                .returning(|_| Ok(()));
        }

        let client = ShelfClient::new(config(), Arc::new(store)).unwrap();
        client.clear_auth().await.unwrap();
        assert!(client.session().await.is_empty());
    }

    #[tokio::test]
    async fn test_set_auth_token_without_access_removes_it() {
        let mut store = MockSessionStore::new();
        store.expect_get().returning(|_| None);
        store
            .expect_set()
            .withf(|key, value| *key == SessionKey::UserId && value == "9")
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_remove()
            .with(eq(SessionKey::AuthToken))
            .times(1)
            .returning(|_| Ok(()));

        let client = ShelfClient::new(config(), Arc::new(store)).unwrap();
        client.set_auth_token(None, None, Some("9")).await.unwrap();

        let session = client.session().await;
        assert!(session.access_token.is_none());
        assert_eq!(session.user_id.as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_session_unchanged() {
        let mut store = MockSessionStore::new();
        store.expect_get().returning(|key| match key {
            SessionKey::AuthToken => Some("old".to_string()),
            SessionKey::RefreshToken => Some("R1".to_string()),
            _ => None,
        });
        store
            .expect_set()
            .withf(|key, _| *key == SessionKey::RefreshToken)
            .times(1)
            .returning(|_, _| Err(ClientError::Storage("disk full".into())));

        let client = ShelfClient::new(config(), Arc::new(store)).unwrap();
        let result = client
            .set_auth_token(Some("new"), Some("R2"), Some("9"))
            .await;
        assert!(matches!(result, Err(ClientError::Storage(_))));

        let session = client.session().await;
        assert_eq!(session.access_token.as_deref(), Some("old"));
        assert_eq!(session.refresh_token.as_deref(), Some("R1"));
        assert!(session.user_id.is_none());
    }

    #[tokio::test]
    async fn test_admin_flags() {
        let store = MemoryStore::new();
        let client = ShelfClient::new(config(), Arc::new(store.clone())).unwrap();
        assert!(!client.is_admin());

        store.set(SessionKey::IsAdmin, "true").unwrap();
        assert!(client.is_admin());
        assert!(!client.is_super_admin());

        store.set(SessionKey::AdminRole, "super_admin").unwrap();
        assert!(client.is_super_admin());
    }
}
