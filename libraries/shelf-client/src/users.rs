//! User profile and user management endpoints.

use crate::client::ShelfClient;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::query::Query;
use reqwest::Method;
use serde_json::{json, Value};

pub struct UsersApi<'a> {
    client: &'a ShelfClient,
}

impl<'a> UsersApi<'a> {
    pub(crate) fn new(client: &'a ShelfClient) -> Self {
        Self { client }
    }

    /// Profile of the logged-in user.
    pub async fn profile(&self) -> Result<Envelope> {
        self.client
            .call(Method::GET, "/users/profile", None, true)
            .await
    }

    /// Update name, phone and address of the logged-in user.
    pub async fn update_profile(&self, name: &str, phone: &str, address: &str) -> Result<Envelope> {
        let body = json!({ "name": name, "phone": phone, "address": address });
        self.client
            .call(Method::PUT, "/users/profile", Some(body), true)
            .await
    }

    /// Change the logged-in user's password.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<Envelope> {
        let body = json!({
            "current_password": current_password,
            "new_password": new_password,
            "confirm_password": confirm_password,
        });
        self.client
            .call(Method::POST, "/users/change-password", Some(body), true)
            .await
    }

    /// Dashboard statistics of the logged-in user.
    pub async fn stats(&self) -> Result<Envelope> {
        self.client
            .call(Method::GET, "/users/stats", None, true)
            .await
    }

    /// List users (admin).
    pub async fn list(&self, query: &Query) -> Result<Envelope> {
        let endpoint = format!("/users{}", query.to_query_string());
        self.client.call(Method::GET, &endpoint, None, true).await
    }

    /// Get a user by id.
    pub async fn get(&self, user_id: &str) -> Result<Envelope> {
        self.client
            .call(Method::GET, &format!("/users/{}", user_id), None, true)
            .await
    }

    /// Update arbitrary user fields.
    pub async fn update(&self, user_id: &str, changes: Value) -> Result<Envelope> {
        self.client
            .call(Method::PUT, &format!("/users/{}", user_id), Some(changes), true)
            .await
    }

    /// Set a user's account status, e.g. `active` or `suspended`.
    pub async fn update_status(&self, user_id: &str, status: &str) -> Result<Envelope> {
        self.client
            .call(
                Method::PUT,
                &format!("/users/{}/status", user_id),
                Some(json!({ "status": status })),
                true,
            )
            .await
    }

    /// Delete a user.
    pub async fn delete(&self, user_id: &str) -> Result<Envelope> {
        self.client
            .call(Method::DELETE, &format!("/users/{}", user_id), None, true)
            .await
    }
}
