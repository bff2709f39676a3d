//! Subscription plans.

use crate::client::ShelfClient;
use crate::envelope::Envelope;
use crate::error::Result;
use reqwest::Method;
use serde_json::json;

pub struct SubscriptionsApi<'a> {
    client: &'a ShelfClient,
}

impl<'a> SubscriptionsApi<'a> {
    pub(crate) fn new(client: &'a ShelfClient) -> Self {
        Self { client }
    }

    /// Available subscription plans. Public.
    pub async fn plans(&self) -> Result<Envelope> {
        self.client
            .call(Method::GET, "/subscriptions/plans", None, false)
            .await
    }

    /// Subscribe the logged-in user to a plan.
    pub async fn subscribe(&self, plan_id: &str, auto_renew: bool) -> Result<Envelope> {
        let body = json!({ "plan_id": plan_id, "auto_renew": auto_renew });
        self.client
            .call(Method::POST, "/subscriptions/subscribe", Some(body), true)
            .await
    }

    /// Cancel a subscription.
    pub async fn cancel(&self, subscription_id: &str) -> Result<Envelope> {
        let body = json!({ "subscription_id": subscription_id });
        self.client
            .call(Method::POST, "/subscriptions/cancel", Some(body), true)
            .await
    }
}
