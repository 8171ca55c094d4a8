use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::BookmarkError;

/// A saved bookmark as stored in the remote `bookmarks` table.
///
/// `id` and `created_at` are assigned by the server; `created_at` is only
/// used for the default (descending) sort order of the initial fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub created_at: String,
    pub url: String,
    pub title: String,
    pub user_id: String,
}

impl Bookmark {
    /// Validates a single row returned by the table service.
    ///
    /// All five columns must be present as strings, and `id` / `user_id`
    /// must be non-empty. Extra columns are ignored.
    pub fn from_value(value: Value) -> Result<Self, BookmarkError> {
        let bookmark: Bookmark = serde_json::from_value(value)
            .map_err(|e| BookmarkError::MalformedRecord(e.to_string()))?;

        if bookmark.id.is_empty() {
            return Err(BookmarkError::MalformedRecord("empty id".to_string()));
        }
        if bookmark.user_id.is_empty() {
            return Err(BookmarkError::MalformedRecord(format!(
                "empty user_id on bookmark {}",
                bookmark.id
            )));
        }
        Ok(bookmark)
    }

    /// Validates a list response. Any malformed row rejects the whole list.
    pub fn list_from_value(value: Value) -> Result<Vec<Self>, BookmarkError> {
        match value {
            Value::Array(rows) => rows.into_iter().map(Self::from_value).collect(),
            other => Err(BookmarkError::MalformedRecord(format!(
                "expected an array of bookmarks, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Row payload for an insert. The server fills in `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookmark {
    pub url: String,
    pub title: String,
    pub user_id: String,
}

/// Contents of the add-bookmark form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkForm {
    pub title: String,
    pub url: String,
}

impl BookmarkForm {
    pub fn new(title: &str, url: &str) -> Self {
        Self {
            title: title.to_string(),
            url: url.to_string(),
        }
    }

    /// Both inputs are required. No URL format check is applied.
    pub fn is_complete(&self) -> bool {
        !self.title.is_empty() && !self.url.is_empty()
    }

    pub fn clear(&mut self) {
        self.title.clear();
        self.url.clear();
    }
}
