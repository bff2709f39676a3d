//! Book catalogue endpoints.

use crate::client::ShelfClient;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::query::Query;
use reqwest::Method;
use serde_json::Value;

/// Filters for [`BooksApi::list`].
#[derive(Debug, Clone)]
pub struct BookQuery {
    pub page: u32,
    pub limit: u32,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

impl Default for BookQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            category: None,
            search: None,
            sort: None,
        }
    }
}

impl BookQuery {
    fn to_query(&self) -> Query {
        Query::new()
            .param("page", self.page)
            .param("limit", self.limit)
            .param("category", self.category.as_deref())
            .param("search", self.search.as_deref())
            .param("sort", self.sort.as_deref())
    }
}

pub struct BooksApi<'a> {
    client: &'a ShelfClient,
}

impl<'a> BooksApi<'a> {
    pub(crate) fn new(client: &'a ShelfClient) -> Self {
        Self { client }
    }

    /// Browse the catalogue. Public.
    pub async fn list(&self, query: &BookQuery) -> Result<Envelope> {
        let endpoint = format!("/books{}", query.to_query().to_query_string());
        self.client.call(Method::GET, &endpoint, None, false).await
    }

    /// Get a book by id. Public.
    pub async fn get(&self, book_id: &str) -> Result<Envelope> {
        self.client
            .call(Method::GET, &format!("/books/{}", book_id), None, false)
            .await
    }

    /// List book categories. Public.
    pub async fn categories(&self) -> Result<Envelope> {
        self.client.call(Method::GET, "/categories", None, false).await
    }

    /// Catalogue statistics.
    pub async fn stats(&self) -> Result<Envelope> {
        self.client.call(Method::GET, "/books/stats", None, true).await
    }

    /// Add a book to the catalogue.
    pub async fn create(&self, book: Value) -> Result<Envelope> {
        self.client.call(Method::POST, "/books", Some(book), true).await
    }

    /// Update a book.
    pub async fn update(&self, book_id: &str, changes: Value) -> Result<Envelope> {
        self.client
            .call(Method::PUT, &format!("/books/{}", book_id), Some(changes), true)
            .await
    }

    /// Remove a book from the catalogue.
    pub async fn delete(&self, book_id: &str) -> Result<Envelope> {
        self.client
            .call(Method::DELETE, &format!("/books/{}", book_id), None, true)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query() {
        let q = BookQuery::default().to_query().to_query_string();
        assert_eq!(q, "?page=1&limit=10");
    }

    #[test]
    fn test_filtered_query() {
        let q = BookQuery {
            page: 3,
            limit: 25,
            category: Some("Science Fiction".into()),
            search: Some("dune".into()),
            sort: None,
        }
        .to_query()
        .to_query_string();

        assert!(q.contains("page=3"));
        assert!(q.contains("limit=25"));
        assert!(q.contains("category=Science+Fiction"));
        assert!(q.contains("search=dune"));
        assert!(!q.contains("sort"));
    }
}
