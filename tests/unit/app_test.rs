//! Tests for the App controller: startup, session-driven list updates and
//! the guarded bookmark operations.

#[path = "../support/fakes.rs"]
mod fakes;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use fakes::{memory_db, session_for, FakeAuthProvider, FakeBookmarkRemote};
use smartmark::app::App;
use smartmark::database::Database;
use smartmark::managers::session_manager::SessionManagerTrait;
use smartmark::types::errors::BookmarkError;
use smartmark::types::session::SessionState;
use smartmark::types::settings::AppSettings;
use smartmark::ui::view::View;

const CALLBACK: &str = "http://localhost:3000/#access_token=abc&refresh_token=def";

struct Harness {
    db: Arc<Database>,
    auth: Arc<FakeAuthProvider>,
    remote: Arc<FakeBookmarkRemote>,
}

impl Harness {
    fn new() -> Self {
        Self {
            db: memory_db(),
            auth: FakeAuthProvider::new(),
            remote: FakeBookmarkRemote::new(),
        }
    }

    fn app(&self) -> App {
        App::new(
            AppSettings::default(),
            self.db.clone(),
            self.auth.clone(),
            self.remote.clone(),
        )
        .expect("App::new failed")
    }

    /// Signs `user_id` in on a throwaway app so the session is persisted.
    async fn persist_session(&self, user_id: &str, email: &str) {
        self.auth.set_callback(session_for(user_id, email, 3600));
        let mut app = self.app();
        app.session_manager.complete_sign_in(CALLBACK).await.unwrap();
    }
}

/// Starting with a stored session fetches exactly once, newest first.
#[tokio::test]
async fn test_startup_with_session_lists_once() {
    let h = Harness::new();
    h.remote.seed("u1", "Old", "https://old.example");
    h.remote.seed("u1", "New", "https://new.example");
    h.persist_session("u1", "ada@example.com").await;
    let mut app = h.app();

    app.startup().await;

    assert_eq!(FakeBookmarkRemote::calls(&h.remote.select_calls), 1);
    assert!(app.state().is_authenticated());
    let titles: Vec<_> = app.bookmarks().iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, ["New", "Old"]);
    assert_eq!(app.process_session_events().await, 0);
}

/// Starting without a session shows sign-in and never touches the table.
#[tokio::test]
async fn test_startup_without_session() {
    let h = Harness::new();
    let mut app = h.app();
    assert_eq!(app.view(), View::Loading);

    app.startup().await;

    assert_eq!(app.state(), &SessionState::Unauthenticated);
    assert_eq!(FakeBookmarkRemote::calls(&h.remote.select_calls), 0);
    assert_eq!(app.view(), View::SignIn { provider: "google".to_string() });
}

/// A failed initial fetch still signs the user in with an empty list.
#[tokio::test]
async fn test_startup_tolerates_fetch_failure() {
    let h = Harness::new();
    h.persist_session("u1", "ada@example.com").await;
    h.remote.fail_select.store(true, Ordering::SeqCst);
    let mut app = h.app();

    app.startup().await;

    assert!(app.state().is_authenticated());
    assert!(app.bookmarks().is_empty());
}

/// Completing sign-in switches to the library and loads the user's rows.
#[tokio::test]
async fn test_sign_in_loads_bookmarks() {
    let h = Harness::new();
    h.remote.seed("u1", "Rust", "https://rust-lang.org");
    h.auth.set_callback(session_for("u1", "ada@example.com", 3600));
    let mut app = h.app();
    app.startup().await;

    let user = app.complete_sign_in(CALLBACK).await.unwrap();

    assert_eq!(user.id, "u1");
    assert_eq!(app.bookmarks().len(), 1);
    match app.view() {
        View::Library { greeting, bookmarks, .. } => {
            assert_eq!(greeting.as_deref(), Some("Hi, ada"));
            assert_eq!(
                bookmarks[0].favicon_url.as_deref(),
                Some("https://www.google.com/s2/favicons?domain=rust-lang.org&sz=64")
            );
        }
        other => panic!("expected library view, got {:?}", other),
    }
}

/// Signing out empties the list and returns to the sign-in screen.
#[tokio::test]
async fn test_sign_out_clears_list() {
    let h = Harness::new();
    h.remote.seed("u1", "Rust", "https://rust-lang.org");
    h.persist_session("u1", "ada@example.com").await;
    let mut app = h.app();
    app.startup().await;
    assert_eq!(app.bookmarks().len(), 1);

    app.sign_out().await;

    assert_eq!(app.state(), &SessionState::Unauthenticated);
    assert!(app.bookmarks().is_empty());
}

/// Switching users never shows the previous user's rows.
#[tokio::test]
async fn test_switching_users_swaps_lists() {
    let h = Harness::new();
    h.remote.seed("u1", "Ada's", "https://ada.example");
    h.remote.seed("u2", "Grace's", "https://grace.example");
    h.persist_session("u1", "ada@example.com").await;
    let mut app = h.app();
    app.startup().await;

    app.sign_out().await;
    h.auth.set_callback(session_for("u2", "grace@example.com", 3600));
    app.complete_sign_in(CALLBACK).await.unwrap();

    let owners: Vec<_> = app.bookmarks().iter().map(|b| b.user_id.as_str()).collect();
    assert_eq!(owners, ["u2"]);
}

/// Submitting "Example" as user U puts a row owned by U at position 0.
#[tokio::test]
async fn test_submit_puts_new_row_first() {
    let h = Harness::new();
    h.remote.seed("u1", "Rust", "https://rust-lang.org");
    h.persist_session("u1", "ada@example.com").await;
    let mut app = h.app();
    app.startup().await;

    app.set_form(Some("Example"), Some("https://example.com"));
    let created = app.submit_bookmark().await.unwrap();

    assert_eq!(created.user_id, "u1");
    assert_eq!(app.bookmarks()[0].id, created.id);
    assert_eq!(app.bookmarks().len(), 2);
    assert!(app.bookmark_manager.form().title.is_empty());
}

/// A non-URL is stored anyway, and its row gets no icon.
#[tokio::test]
async fn test_non_url_is_stored_without_icon() {
    let h = Harness::new();
    h.persist_session("u1", "ada@example.com").await;
    let mut app = h.app();
    app.startup().await;

    app.add_bookmark("Odd", "not a url").await.unwrap();

    match app.view() {
        View::Library { bookmarks, .. } => {
            assert_eq!(bookmarks[0].url, "not a url");
            assert_eq!(bookmarks[0].favicon_url, None);
        }
        other => panic!("expected library view, got {:?}", other),
    }
}

/// Mutations while signed out fail without reaching the table service.
#[tokio::test]
async fn test_operations_require_sign_in() {
    let h = Harness::new();
    let mut app = h.app();
    app.startup().await;

    let add = app.add_bookmark("Example", "https://example.com").await;
    let delete = app.delete_bookmark("anything").await;
    let refresh = app.refresh_bookmarks().await;

    assert!(matches!(add, Err(BookmarkError::NotAuthenticated)));
    assert!(matches!(delete, Err(BookmarkError::NotAuthenticated)));
    assert!(matches!(refresh, Err(BookmarkError::NotAuthenticated)));
    assert_eq!(FakeBookmarkRemote::calls(&h.remote.insert_calls), 0);
    assert_eq!(FakeBookmarkRemote::calls(&h.remote.delete_calls), 0);
}

/// Deleting an unknown id leaves the list as it was.
#[tokio::test]
async fn test_delete_unknown_id_changes_nothing() {
    let h = Harness::new();
    h.remote.seed("u1", "Rust", "https://rust-lang.org");
    h.persist_session("u1", "ada@example.com").await;
    let mut app = h.app();
    app.startup().await;
    let before = app.bookmarks().to_vec();

    app.delete_bookmark("missing").await.unwrap();

    assert_eq!(app.bookmarks(), before.as_slice());
}

/// A session that expires underneath the app drops it back to sign-in.
#[tokio::test]
async fn test_expired_session_signs_app_out() {
    let h = Harness::new();
    h.remote.seed("u1", "Rust", "https://rust-lang.org");
    h.persist_session("u1", "ada@example.com").await;
    let mut app = h.app();
    app.startup().await;

    app.session_manager.expire_session().await;
    let applied = app.process_session_events().await;

    assert_eq!(applied, 1);
    assert_eq!(app.state(), &SessionState::Unauthenticated);
    assert!(app.bookmarks().is_empty());
}

/// After shutdown no session change reaches the app.
#[tokio::test]
async fn test_shutdown_releases_subscription() {
    let h = Harness::new();
    h.auth.set_callback(session_for("u1", "ada@example.com", 3600));
    let mut app = h.app();
    app.startup().await;
    assert_eq!(app.session_manager.subscriber_count(), 1);

    app.shutdown();
    app.session_manager.complete_sign_in(CALLBACK).await.unwrap();

    assert_eq!(app.session_manager.subscriber_count(), 0);
    assert_eq!(app.process_session_events().await, 0);
    assert_eq!(app.state(), &SessionState::Unauthenticated);
}
