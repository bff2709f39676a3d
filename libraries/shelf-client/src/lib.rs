//! Shelf Client
//!
//! HTTP client for the library-management REST backend.
//!
//! # Features
//!
//! - **Sessions**: tokens persisted in a pluggable [`SessionStore`] and
//!   resumed on construction
//! - **Auto refresh**: one transparent token refresh and retry on 401, shared
//!   between concurrent requests
//! - **Envelopes**: every response normalized to `{status, data, message}`
//! - **Resources**: books, users, borrowing, admin console, subscriptions and
//!   contact messages
//!
//! # Example
//!
//! ```ignore
//! use shelf_client::{BookQuery, ClientConfig, ShelfClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ShelfClient::in_memory(ClientConfig::new("http://localhost:5000"))?;
//!
//!     client.auth().login("reader@example.com", "secret").await?;
//!
//!     let books = client.books().list(&BookQuery::default()).await?;
//!     println!("{:?}", books.data);
//!
//!     Ok(())
//! }
//! ```

mod admin;
mod auth;
mod books;
mod borrowing;
mod client;
mod config;
mod contact;
mod envelope;
mod error;
mod query;
mod session;
mod subscriptions;
mod users;

pub use client::{RequestOptions, ShelfClient};
pub use config::{Capabilities, ClientConfig};
pub use envelope::{Envelope, Status, WireBody};
pub use error::{ClientError, Result};
pub use query::{Query, QueryValue};
pub use session::{FileStore, MemoryStore, Session, SessionKey, SessionStore};

// Re-export sub-clients for direct use if needed
pub use admin::{AdminApi, AdminListQuery, SubscriptionAction};
pub use auth::AuthApi;
pub use books::{BookQuery, BooksApi};
pub use borrowing::BorrowingApi;
pub use contact::{ContactApi, MessageQuery};
pub use subscriptions::SubscriptionsApi;
pub use users::UsersApi;

pub use reqwest::Method;
