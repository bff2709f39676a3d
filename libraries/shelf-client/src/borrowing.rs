//! Borrow and return.

use crate::client::ShelfClient;
use crate::envelope::Envelope;
use crate::error::{ClientError, Result};
use reqwest::Method;
use serde_json::json;

pub struct BorrowingApi<'a> {
    client: &'a ShelfClient,
}

impl<'a> BorrowingApi<'a> {
    pub(crate) fn new(client: &'a ShelfClient) -> Self {
        Self { client }
    }

    /// Borrow a book for the logged-in user.
    pub async fn borrow(&self, book_id: &str) -> Result<Envelope> {
        self.client
            .call(
                Method::POST,
                "/borrow",
                Some(json!({ "book_id": book_id })),
                true,
            )
            .await
    }

    /// Return a borrowed book.
    pub async fn return_book(&self, book_id: &str) -> Result<Envelope> {
        self.client
            .call(
                Method::POST,
                "/return-book",
                Some(json!({ "book_id": book_id })),
                true,
            )
            .await
    }

    /// Borrowings of any user.
    pub async fn for_user(&self, user_id: &str) -> Result<Envelope> {
        self.client
            .call(
                Method::GET,
                &format!("/users/{}/borrowings", user_id),
                None,
                true,
            )
            .await
    }

    /// Borrowings of the logged-in user.
    ///
    /// Fails with [`ClientError::NotLoggedIn`] without touching the network
    /// when the session has no user id.
    pub async fn current(&self) -> Result<Envelope> {
        let user_id = self
            .client
            .session()
            .await
            .user_id
            .ok_or(ClientError::NotLoggedIn)?;
        self.for_user(&user_id).await
    }
}
