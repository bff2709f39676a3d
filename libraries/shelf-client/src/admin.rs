//! Admin console endpoints.

use crate::client::ShelfClient;
use crate::envelope::Envelope;
use crate::error::{ClientError, Result};
use crate::query::Query;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;

/// Paging and filtering shared by the admin listings.
#[derive(Debug, Clone)]
pub struct AdminListQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub filter: Option<String>,
}

impl Default for AdminListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            search: None,
            filter: None,
        }
    }
}

impl AdminListQuery {
    fn to_query(&self) -> Query {
        Query::new()
            .param("page", self.page)
            .param("limit", self.limit)
            .param("search", self.search.as_deref().filter(|s| !s.is_empty()))
            .param("filter", self.filter.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Actions accepted by `PUT admin/subscriptions/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionAction {
    Suspend,
    Resume,
    Downgrade,
}

impl SubscriptionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionAction::Suspend => "suspend",
            SubscriptionAction::Resume => "resume",
            SubscriptionAction::Downgrade => "downgrade",
        }
    }
}

pub struct AdminApi<'a> {
    client: &'a ShelfClient,
}

impl<'a> AdminApi<'a> {
    pub(crate) fn new(client: &'a ShelfClient) -> Self {
        Self { client }
    }

    pub async fn profile(&self) -> Result<Envelope> {
        self.client
            .call(Method::GET, "/admin/profile", None, true)
            .await
    }

    pub async fn dashboard(&self) -> Result<Envelope> {
        self.client
            .call(Method::GET, "/admin/dashboard", None, true)
            .await
    }

    /// Other admin accounts.
    pub async fn admins(&self, page: u32, limit: u32) -> Result<Envelope> {
        self.paged("/admin/list", page, limit).await
    }

    pub async fn logs(&self, page: u32, limit: u32) -> Result<Envelope> {
        self.paged("/admin/logs", page, limit).await
    }

    pub async fn recent_activity(&self, limit: u32) -> Result<Envelope> {
        let q = Query::new().param("limit", limit);
        self.client
            .call(
                Method::GET,
                &format!("/admin/activity{}", q.to_query_string()),
                None,
                true,
            )
            .await
    }

    async fn paged(&self, endpoint: &str, page: u32, limit: u32) -> Result<Envelope> {
        let q = Query::new().param("page", page).param("limit", limit);
        self.client
            .call(
                Method::GET,
                &format!("{}{}", endpoint, q.to_query_string()),
                None,
                true,
            )
            .await
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub async fn users(&self, query: &AdminListQuery) -> Result<Envelope> {
        let endpoint = format!("/admin/users{}", query.to_query().to_query_string());
        self.client.call(Method::GET, &endpoint, None, true).await
    }

    pub async fn user(&self, user_id: &str) -> Result<Envelope> {
        self.client
            .call(Method::GET, &format!("/admin/users/{}", user_id), None, true)
            .await
    }

    pub async fn update_user(&self, user_id: &str, changes: Value) -> Result<Envelope> {
        self.client
            .call(
                Method::PUT,
                &format!("/admin/users/{}", user_id),
                Some(changes),
                true,
            )
            .await
    }

    pub async fn suspend_user(&self, user_id: &str) -> Result<Envelope> {
        self.update_user(user_id, json!({ "status": "suspended" }))
            .await
    }

    pub async fn unsuspend_user(&self, user_id: &str) -> Result<Envelope> {
        self.update_user(user_id, json!({ "status": "active" })).await
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    pub async fn subscriptions(&self, query: &AdminListQuery) -> Result<Envelope> {
        let endpoint = format!(
            "/admin/subscriptions{}",
            query.to_query().to_query_string()
        );
        self.client.call(Method::GET, &endpoint, None, true).await
    }

    pub async fn update_subscription(
        &self,
        subscription_id: &str,
        action: SubscriptionAction,
    ) -> Result<Envelope> {
        self.client
            .call(
                Method::PUT,
                &format!("/admin/subscriptions/{}", subscription_id),
                Some(json!({ "action": action.as_str() })),
                true,
            )
            .await
    }

    pub async fn suspend_subscription(&self, subscription_id: &str) -> Result<Envelope> {
        self.update_subscription(subscription_id, SubscriptionAction::Suspend)
            .await
    }

    pub async fn resume_subscription(&self, subscription_id: &str) -> Result<Envelope> {
        self.update_subscription(subscription_id, SubscriptionAction::Resume)
            .await
    }

    pub async fn downgrade_subscription(&self, subscription_id: &str) -> Result<Envelope> {
        self.update_subscription(subscription_id, SubscriptionAction::Downgrade)
            .await
    }

    // =========================================================================
    // Optional backend capabilities
    // =========================================================================

    /// Database connection pool status, if the backend exposes it.
    pub async fn pool_status(&self) -> Result<Envelope> {
        if !self.client.capabilities().pool_status {
            return Err(ClientError::Unsupported("pool_status"));
        }
        self.client
            .call(Method::GET, "/admin/pool-status", None, true)
            .await
    }

    /// Ask the backend to recycle its connection pool, if it supports that.
    pub async fn reset_pool(&self) -> Result<Envelope> {
        if !self.client.capabilities().pool_reset {
            return Err(ClientError::Unsupported("pool_reset"));
        }
        let response = self
            .client
            .call(Method::POST, "/admin/reset-pool", None, true)
            .await?;
        info!(status = ?response.status, "Requested connection pool reset");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_drops_blank_filters() {
        let q = AdminListQuery {
            search: Some(String::new()),
            filter: Some("active".into()),
            ..AdminListQuery::default()
        }
        .to_query()
        .to_query_string();

        assert_eq!(q, "?page=1&limit=20&filter=active");
    }

    #[test]
    fn test_subscription_actions() {
        assert_eq!(SubscriptionAction::Suspend.as_str(), "suspend");
        assert_eq!(SubscriptionAction::Resume.as_str(), "resume");
        assert_eq!(SubscriptionAction::Downgrade.as_str(), "downgrade");
    }
}
