//! Table service client for the `bookmarks` collection.
//!
//! Exactly three calls are exposed: list (newest first), insert one row and
//! delete by id. Row ownership is enforced server-side by the access policy
//! attached to the bearer token.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use crate::services::auth_client::error_message;
use crate::types::bookmark::{Bookmark, NewBookmark};
use crate::types::errors::BookmarkError;
use crate::types::settings::BackendSettings;

pub const BOOKMARKS_TABLE: &str = "bookmarks";

/// Remote operations on the signed-in user's bookmarks.
#[async_trait]
pub trait BookmarkRemote: Send + Sync {
    /// All visible rows, ordered by `created_at` descending.
    async fn select_bookmarks(&self, access_token: &str) -> Result<Vec<Bookmark>, BookmarkError>;

    /// Inserts one row and returns it as stored, including `id` and `created_at`.
    async fn insert_bookmark(
        &self,
        access_token: &str,
        row: &NewBookmark,
    ) -> Result<Bookmark, BookmarkError>;

    /// Deletes the row with the given id.
    async fn delete_bookmark(&self, access_token: &str, id: &str) -> Result<(), BookmarkError>;
}

/// `BookmarkRemote` backed by the hosted table REST API.
pub struct PostgrestClient {
    http: Client,
    table_url: String,
    anon_key: String,
}

impl PostgrestClient {
    pub fn new(backend: &BackendSettings) -> Self {
        Self::with_client(Client::new(), backend)
    }

    pub fn with_client(http: Client, backend: &BackendSettings) -> Self {
        Self {
            http,
            table_url: format!("{}/{}", backend.rest_url(), BOOKMARKS_TABLE),
            anon_key: backend.anon_key.clone(),
        }
    }

    pub fn table_url(&self) -> &str {
        &self.table_url
    }

    fn request(&self, builder: RequestBuilder, access_token: &str) -> RequestBuilder {
        builder.header("apikey", &self.anon_key).bearer_auth(access_token)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, BookmarkError> {
        let response = builder
            .send()
            .await
            .map_err(|e| BookmarkError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BookmarkError::ApiError {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    async fn json_body(response: Response) -> Result<Value, BookmarkError> {
        response
            .json::<Value>()
            .await
            .map_err(|e| BookmarkError::NetworkError(format!("unreadable response: {}", e)))
    }
}

#[async_trait]
impl BookmarkRemote for PostgrestClient {
    async fn select_bookmarks(&self, access_token: &str) -> Result<Vec<Bookmark>, BookmarkError> {
        debug!(url = %self.table_url, "listing bookmarks");
        let builder = self
            .request(self.http.get(&self.table_url), access_token)
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        let response = self.send(builder).await?;
        Bookmark::list_from_value(Self::json_body(response).await?)
    }

    async fn insert_bookmark(
        &self,
        access_token: &str,
        row: &NewBookmark,
    ) -> Result<Bookmark, BookmarkError> {
        debug!(url = %self.table_url, "inserting bookmark");
        let builder = self
            .request(self.http.post(&self.table_url), access_token)
            .header("Prefer", "return=representation")
            .header("Accept", "application/vnd.pgrst.object+json")
            .json(&[row]);
        let response = self.send(builder).await?;
        Bookmark::from_value(Self::json_body(response).await?)
    }

    async fn delete_bookmark(&self, access_token: &str, id: &str) -> Result<(), BookmarkError> {
        debug!(url = %self.table_url, %id, "deleting bookmark");
        let filter = format!("eq.{}", id);
        let builder = self
            .request(self.http.delete(&self.table_url), access_token)
            .query(&[("id", filter.as_str())]);
        self.send(builder).await?;
        Ok(())
    }
}
