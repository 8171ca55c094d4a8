//! View model for the single SmartMark page.
//!
//! `render` maps application state to one of three screens. It performs no
//! I/O; favicon URLs are derived here but never fetched.

use serde::Serialize;

use crate::services::favicon::FaviconResolver;
use crate::types::bookmark::{Bookmark, BookmarkForm};
use crate::types::session::SessionState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum View {
    Loading,
    SignIn {
        provider: String,
    },
    Library {
        greeting: Option<String>,
        form: BookmarkForm,
        bookmarks: Vec<BookmarkItem>,
    },
}

/// One row of the collection list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookmarkItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub favicon_url: Option<String>,
}

impl BookmarkItem {
    fn from_bookmark(bookmark: &Bookmark, favicons: &FaviconResolver) -> Self {
        Self {
            id: bookmark.id.clone(),
            title: bookmark.title.clone(),
            url: bookmark.url.clone(),
            favicon_url: favicons.favicon_url(&bookmark.url),
        }
    }
}

/// Everything the page needs, borrowed from the controller.
pub struct RenderInput<'a> {
    pub state: &'a SessionState,
    pub bookmarks: &'a [Bookmark],
    pub form: &'a BookmarkForm,
    pub favicons: &'a FaviconResolver,
    pub provider: &'a str,
}

pub fn render(input: RenderInput<'_>) -> View {
    match input.state {
        SessionState::Loading => View::Loading,
        SessionState::Unauthenticated => View::SignIn {
            provider: input.provider.to_string(),
        },
        SessionState::Authenticated(user) => View::Library {
            greeting: user.display_name().map(|name| format!("Hi, {}", name)),
            form: input.form.clone(),
            bookmarks: input
                .bookmarks
                .iter()
                .map(|bm| BookmarkItem::from_bookmark(bm, input.favicons))
                .collect(),
        },
    }
}
