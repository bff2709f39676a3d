//! Authentication endpoints.

use crate::client::ShelfClient;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::session::SessionKey;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};

/// Login, registration, password recovery and admin-code management.
pub struct AuthApi<'a> {
    client: &'a ShelfClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ShelfClient) -> Self {
        Self { client }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<Envelope> {
        let body = json!({
            "name": name,
            "email": email,
            "password": password,
            "password_confirm": password_confirm,
        });
        self.client
            .call(Method::POST, "/auth/register", Some(body), false)
            .await
    }

    /// Log in as a regular user and store the returned tokens.
    ///
    /// Returns the response unchanged.
    pub async fn login(&self, email: &str, password: &str) -> Result<Envelope> {
        debug!(email = %email, "Attempting login");
        let body = json!({ "email": email, "password": password });
        let response = self
            .client
            .call(Method::POST, "/auth/login", Some(body), false)
            .await?;

        self.store_login(&response, LoginKind::User).await?;
        Ok(response)
    }

    /// Log in through the admin endpoint and mark the session as admin.
    pub async fn admin_login(&self, email: &str, password: &str) -> Result<Envelope> {
        debug!(email = %email, "Attempting admin login");
        let body = json!({ "email": email, "password": password });
        let response = self
            .client
            .call(Method::POST, "/auth/admin/login", Some(body), false)
            .await?;

        self.store_login(&response, LoginKind::Admin).await?;
        Ok(response)
    }

    async fn store_login(&self, response: &Envelope, kind: LoginKind) -> Result<()> {
        let Some(access) = response
            .field_string("access_token")
            .or_else(|| response.field_string("token"))
        else {
            warn!("Login response carried no access token");
            return Ok(());
        };

        let user_id = response
            .field_string("user_id")
            .or_else(|| response.field_string("admin_id"));

        self.client
            .set_auth_token(
                Some(&access),
                response.field_string("refresh_token").as_deref(),
                user_id.as_deref(),
            )
            .await?;

        let store = self.client.store();
        let role = response.field_string("role");
        let flagged_admin = role.as_deref() == Some("admin")
            || response
                .field("is_admin")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);

        match kind {
            LoginKind::Admin => {
                store.set(SessionKey::IsAdmin, "true")?;
                store.set(SessionKey::AdminRole, role.as_deref().unwrap_or("admin"))?;
            }
            LoginKind::User if flagged_admin => store.set(SessionKey::IsAdmin, "true")?,
            LoginKind::User => {}
        }

        info!(user_id = ?user_id, admin = self.client.is_admin(), "Login successful");
        Ok(())
    }

    /// Revoke the refresh token server-side and forget the session.
    ///
    /// The local session is cleared even when the call fails.
    pub async fn logout(&self) -> Result<Envelope> {
        let refresh_token = self.client.session().await.refresh_token;
        let body = json!({ "refresh_token": refresh_token });
        let result = self
            .client
            .call(Method::POST, "/auth/logout", Some(body), true)
            .await;

        self.client.clear_auth().await?;
        info!("Logged out");
        result
    }

    pub async fn forgot_password(&self, email: &str) -> Result<Envelope> {
        self.client
            .call(
                Method::POST,
                "/auth/forgot-password",
                Some(json!({ "email": email })),
                false,
            )
            .await
    }

    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        password_confirm: &str,
    ) -> Result<Envelope> {
        let body = json!({
            "token": token,
            "new_password": new_password,
            "password_confirm": password_confirm,
        });
        self.client
            .call(Method::POST, "/auth/reset-password", Some(body), false)
            .await
    }

    pub async fn check_session(&self) -> Result<Envelope> {
        self.client
            .call(Method::GET, "/auth/check-session", None, true)
            .await
    }

    pub async fn admin_check_session(&self) -> Result<Envelope> {
        self.client
            .call(Method::GET, "/auth/admin/check-session", None, true)
            .await
    }

    /// Call the refresh endpoint directly with the bearer token.
    ///
    /// The automatic refresh inside [`ShelfClient::request`] does not go
    /// through here; this exists for callers that drive it themselves.
    pub async fn refresh_token(&self) -> Result<Envelope> {
        self.client
            .call(Method::POST, "/auth/refresh-token", None, true)
            .await
    }

    /// Ask the backend to mirror the bearer token into a session cookie.
    pub async fn bootstrap_session(&self) -> Result<Envelope> {
        self.client
            .call(Method::POST, "/auth/bootstrap-session", None, true)
            .await
    }

    pub async fn admin_signup(
        &self,
        admin_code: &str,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Envelope> {
        let body = json!({
            "admin_code": admin_code,
            "username": username,
            "email": email,
            "password": password,
            "confirm_password": confirm_password,
        });
        self.client
            .call(Method::POST, "/auth/admin/signup", Some(body), false)
            .await
    }

    pub async fn generate_admin_code(
        &self,
        expires_days: u32,
        max_uses: u32,
        description: &str,
    ) -> Result<Envelope> {
        let body = json!({
            "expires_days": expires_days,
            "max_uses": max_uses,
            "description": description,
        });
        self.client
            .call(Method::POST, "/auth/admin/generate-code", Some(body), true)
            .await
    }

    pub async fn admin_codes(&self) -> Result<Envelope> {
        self.client
            .call(Method::GET, "/auth/admin/codes", None, true)
            .await
    }

    pub async fn deactivate_admin_code(&self, code: &str) -> Result<Envelope> {
        self.client
            .call(
                Method::POST,
                "/auth/admin/deactivate-code",
                Some(json!({ "code": code })),
                true,
            )
            .await
    }
}

#[derive(Debug, Clone, Copy)]
enum LoginKind {
    User,
    Admin,
}
