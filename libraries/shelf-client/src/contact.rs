//! Contact messages, as seen from the admin console.

use crate::client::ShelfClient;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::query::Query;
use reqwest::Method;
use serde_json::json;

/// Filters for [`ContactApi::messages`].
#[derive(Debug, Clone)]
pub struct MessageQuery {
    pub page: u32,
    pub limit: u32,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl Default for MessageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            status: None,
            search: None,
        }
    }
}

pub struct ContactApi<'a> {
    client: &'a ShelfClient,
}

impl<'a> ContactApi<'a> {
    pub(crate) fn new(client: &'a ShelfClient) -> Self {
        Self { client }
    }

    /// List contact messages matching `query`.
    pub async fn messages(&self, query: &MessageQuery) -> Result<Envelope> {
        let q = Query::new()
            .param("page", query.page)
            .param("limit", query.limit)
            .param("status", query.status.as_deref())
            .param("search", query.search.as_deref());
        let endpoint = format!("/contact/messages{}", q.to_query_string());
        self.client.call(Method::GET, &endpoint, None, true).await
    }

    /// Get a single contact message.
    pub async fn message(&self, id: &str) -> Result<Envelope> {
        self.client
            .call(Method::GET, &format!("/contact/messages/{}", id), None, true)
            .await
    }

    /// Send a reply to the message's author.
    pub async fn reply(&self, id: &str, reply: &str) -> Result<Envelope> {
        self.client
            .call(
                Method::POST,
                &format!("/contact/messages/{}/reply", id),
                Some(json!({ "reply": reply })),
                true,
            )
            .await
    }

    /// Set a message status, e.g. `read` or `replied`.
    pub async fn update_status(&self, id: &str, status: &str) -> Result<Envelope> {
        self.client
            .call(
                Method::PUT,
                &format!("/contact/messages/{}/status", id),
                Some(json!({ "status": status })),
                true,
            )
            .await
    }

    /// Delete a contact message.
    pub async fn delete(&self, id: &str) -> Result<Envelope> {
        self.client
            .call(Method::DELETE, &format!("/contact/messages/{}", id), None, true)
            .await
    }

    /// Contact message statistics.
    pub async fn stats(&self) -> Result<Envelope> {
        self.client
            .call(Method::GET, "/contact/stats", None, true)
            .await
    }
}
