//! Bookmark Manager for SmartMark.
//!
//! Mirrors the signed-in user's remote bookmarks into a local list. After the
//! initial fetch the list is patched from each mutation's own response rather
//! than re-fetched: inserts are prepended (and empty the add form), deletes
//! are removed by id. Failed operations never touch local state.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::services::rest_client::BookmarkRemote;
use crate::types::bookmark::{Bookmark, BookmarkForm, NewBookmark};
use crate::types::errors::BookmarkError;
use crate::types::session::AuthSession;

/// Trait defining bookmark synchronization operations.
#[async_trait(?Send)]
pub trait BookmarkManagerTrait {
    /// Replaces the local list with the remote one (newest first).
    async fn list_bookmarks(&mut self, session: &AuthSession) -> Result<&[Bookmark], BookmarkError>;
    /// Inserts a bookmark owned by the session's user, prepends it locally
    /// and clears the add form.
    async fn add_bookmark(
        &mut self,
        session: &AuthSession,
        title: &str,
        url: &str,
    ) -> Result<Bookmark, BookmarkError>;
    /// Adds the form's contents, clearing the form only on success.
    async fn submit_form(&mut self, session: &AuthSession) -> Result<Bookmark, BookmarkError>;
    /// Deletes by id and removes every local item with that id.
    async fn delete_bookmark(&mut self, session: &AuthSession, id: &str) -> Result<(), BookmarkError>;
}

/// Local bookmark list and add-form state, synced through a [`BookmarkRemote`].
pub struct BookmarkManager {
    remote: Arc<dyn BookmarkRemote>,
    bookmarks: Vec<Bookmark>,
    form: BookmarkForm,
}

impl BookmarkManager {
    pub fn new(remote: Arc<dyn BookmarkRemote>) -> Self {
        Self {
            remote,
            bookmarks: Vec::new(),
            form: BookmarkForm::default(),
        }
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn form(&self) -> &BookmarkForm {
        &self.form
    }

    pub fn set_title(&mut self, title: &str) {
        self.form.title = title.to_string();
    }

    pub fn set_url(&mut self, url: &str) {
        self.form.url = url.to_string();
    }

    /// Empties the local list. The form is left alone.
    pub fn clear(&mut self) {
        self.bookmarks.clear();
    }
}

#[async_trait(?Send)]
impl BookmarkManagerTrait for BookmarkManager {
    async fn list_bookmarks(&mut self, session: &AuthSession) -> Result<&[Bookmark], BookmarkError> {
        match self.remote.select_bookmarks(&session.access_token).await {
            Ok(bookmarks) => {
                info!(count = bookmarks.len(), "bookmarks fetched");
                self.bookmarks = bookmarks;
                Ok(&self.bookmarks)
            }
            Err(e) => {
                warn!(error = %e, "fetch failed, keeping current list");
                Err(e)
            }
        }
    }

    async fn add_bookmark(
        &mut self,
        session: &AuthSession,
        title: &str,
        url: &str,
    ) -> Result<Bookmark, BookmarkError> {
        let row = NewBookmark {
            url: url.to_string(),
            title: title.to_string(),
            user_id: session.user.id.clone(),
        };

        match self.remote.insert_bookmark(&session.access_token, &row).await {
            Ok(created) => {
                info!(id = %created.id, "bookmark added");
                self.bookmarks.insert(0, created.clone());
                self.form.clear();
                Ok(created)
            }
            Err(e) => {
                error!(error = %e, "insert failed");
                Err(e)
            }
        }
    }

    async fn submit_form(&mut self, session: &AuthSession) -> Result<Bookmark, BookmarkError> {
        if !self.form.is_complete() {
            return Err(BookmarkError::IncompleteForm);
        }

        let BookmarkForm { title, url } = self.form.clone();
        self.add_bookmark(session, &title, &url).await
    }

    async fn delete_bookmark(&mut self, session: &AuthSession, id: &str) -> Result<(), BookmarkError> {
        match self.remote.delete_bookmark(&session.access_token, id).await {
            Ok(()) => {
                info!(%id, "bookmark deleted");
                self.bookmarks.retain(|bm| bm.id != id);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, %id, "delete failed, keeping bookmark");
                Err(e)
            }
        }
    }
}
