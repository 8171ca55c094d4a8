//! In-process stand-ins for the hosted auth and table services.
//!
//! Access tokens are `access-<user_id>`, and the fake table only returns rows
//! owned by the token's user, the way row-level security does on the server.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use smartmark::database::Database;
use smartmark::services::auth_client::AuthProvider;
use smartmark::services::rest_client::BookmarkRemote;
use smartmark::types::bookmark::{Bookmark, NewBookmark};
use smartmark::types::errors::{AuthError, BookmarkError};
use smartmark::types::session::{AuthSession, AuthUser};

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// A session for `user_id` expiring `expires_in` seconds from now.
pub fn session_for(user_id: &str, email: &str, expires_in: i64) -> AuthSession {
    AuthSession {
        access_token: format!("access-{}", user_id),
        refresh_token: format!("refresh-{}", user_id),
        expires_at: now() + expires_in,
        token_type: "bearer".to_string(),
        user: AuthUser {
            id: user_id.to_string(),
            email: Some(email.to_string()),
        },
    }
}

pub fn memory_db() -> Arc<Database> {
    Arc::new(Database::open_in_memory().expect("in-memory database"))
}

// ─── Auth ───

#[derive(Default)]
pub struct FakeAuthProvider {
    /// Session handed out for any callback URL containing `access_token`.
    pub callback_session: Mutex<Option<AuthSession>>,
    /// `None` makes refresh fail.
    pub refresh_result: Mutex<Option<AuthSession>>,
    pub sign_out_fails: AtomicBool,
    pub refresh_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
}

impl FakeAuthProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_callback(session: AuthSession) -> Arc<Self> {
        let fake = Self::default();
        *fake.callback_session.lock().unwrap() = Some(session);
        Arc::new(fake)
    }

    pub fn set_callback(&self, session: AuthSession) {
        *self.callback_session.lock().unwrap() = Some(session);
    }

    pub fn set_refresh(&self, session: Option<AuthSession>) {
        *self.refresh_result.lock().unwrap() = session;
    }
}

#[async_trait]
impl AuthProvider for FakeAuthProvider {
    fn authorize_url(&self, provider: &str, redirect_to: &str) -> Result<String, AuthError> {
        Ok(format!(
            "https://auth.test/authorize?provider={}&redirect_to={}",
            provider, redirect_to
        ))
    }

    async fn session_from_callback(&self, callback_url: &str) -> Result<AuthSession, AuthError> {
        if !callback_url.contains("access_token") {
            return Err(AuthError::InvalidCallback("missing access_token".to_string()));
        }
        self.callback_session
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AuthError::InvalidCallback("no session".to_string()))
    }

    async fn refresh_session(&self, _refresh_token: &str) -> Result<AuthSession, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_result.lock().unwrap().clone().ok_or(AuthError::ApiError {
            status: 400,
            message: "Invalid Refresh Token".to_string(),
        })
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.sign_out_fails.load(Ordering::SeqCst) {
            return Err(AuthError::NetworkError("connection reset".to_string()));
        }
        Ok(())
    }
}

// ─── Bookmarks ───

#[derive(Default)]
pub struct FakeBookmarkRemote {
    /// Newest first.
    rows: Mutex<Vec<Bookmark>>,
    seq: AtomicUsize,
    pub fail_select: AtomicBool,
    pub fail_insert: AtomicBool,
    pub fail_delete: AtomicBool,
    pub select_calls: AtomicUsize,
    pub insert_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl FakeBookmarkRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn next_timestamp(&self) -> String {
        let n = self.seq.fetch_add(1, Ordering::SeqCst);
        format!("2026-03-01T10:{:02}:{:02}Z", n / 60, n % 60)
    }

    /// Stores a row as if it had just been inserted.
    pub fn seed(&self, user_id: &str, title: &str, url: &str) -> Bookmark {
        let bookmark = Bookmark {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: self.next_timestamp(),
            url: url.to_string(),
            title: title.to_string(),
            user_id: user_id.to_string(),
        };
        self.rows.lock().unwrap().insert(0, bookmark.clone());
        bookmark
    }

    pub fn rows(&self) -> Vec<Bookmark> {
        self.rows.lock().unwrap().clone()
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn api_failure() -> BookmarkError {
        BookmarkError::ApiError {
            status: 503,
            message: "service unavailable".to_string(),
        }
    }
}

#[async_trait]
impl BookmarkRemote for FakeBookmarkRemote {
    async fn select_bookmarks(&self, access_token: &str) -> Result<Vec<Bookmark>, BookmarkError> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_select.load(Ordering::SeqCst) {
            return Err(Self::api_failure());
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|bm| format!("access-{}", bm.user_id) == access_token)
            .cloned()
            .collect())
    }

    async fn insert_bookmark(
        &self,
        access_token: &str,
        bookmark: &NewBookmark,
    ) -> Result<Bookmark, BookmarkError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(Self::api_failure());
        }
        if format!("access-{}", bookmark.user_id) != access_token {
            return Err(BookmarkError::ApiError {
                status: 403,
                message: "new row violates row-level security policy".to_string(),
            });
        }
        Ok(self.seed(&bookmark.user_id, &bookmark.title, &bookmark.url))
    }

    async fn delete_bookmark(&self, _access_token: &str, id: &str) -> Result<(), BookmarkError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Self::api_failure());
        }
        self.rows.lock().unwrap().retain(|bm| bm.id != id);
        Ok(())
    }
}
