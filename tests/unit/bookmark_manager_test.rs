//! Unit tests for the BookmarkManager public API.
//!
//! These tests drive list, add, submit and delete through
//! `BookmarkManagerTrait` against an in-process fake table service.

#[path = "../support/fakes.rs"]
mod fakes;

use std::sync::Arc;

use fakes::{session_for, FakeBookmarkRemote};
use smartmark::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use smartmark::types::bookmark::BookmarkForm;
use smartmark::types::errors::BookmarkError;
use smartmark::types::session::AuthSession;

/// Helper: a manager over a fake remote seeded with three rows for user `u1`.
fn setup() -> (Arc<FakeBookmarkRemote>, BookmarkManager, AuthSession) {
    let remote = FakeBookmarkRemote::new();
    remote.seed("u1", "Rust", "https://rust-lang.org");
    remote.seed("u1", "Tokio", "https://tokio.rs");
    remote.seed("u1", "Crates", "https://crates.io");
    let mgr = BookmarkManager::new(remote.clone());
    (remote, mgr, session_for("u1", "ada@example.com", 3600))
}

/// Listing replaces the local list with the remote rows, newest first.
#[tokio::test]
async fn test_list_returns_newest_first() {
    let (_remote, mut mgr, session) = setup();

    let titles: Vec<_> = mgr
        .list_bookmarks(&session)
        .await
        .unwrap()
        .iter()
        .map(|b| b.title.clone())
        .collect();

    assert_eq!(titles, ["Crates", "Tokio", "Rust"]);
}

/// Rows belonging to another user never reach the local list.
#[tokio::test]
async fn test_list_only_contains_own_rows() {
    let (remote, mut mgr, session) = setup();
    remote.seed("u2", "Other", "https://other.example");

    mgr.list_bookmarks(&session).await.unwrap();

    assert_eq!(mgr.bookmarks().len(), 3);
    assert!(mgr.bookmarks().iter().all(|b| b.user_id == "u1"));
}

/// A failed fetch leaves the previously fetched list in place.
#[tokio::test]
async fn test_failed_list_keeps_stale_list() {
    let (remote, mut mgr, session) = setup();
    mgr.list_bookmarks(&session).await.unwrap();
    let before = mgr.bookmarks().to_vec();

    remote.fail_select.store(true, std::sync::atomic::Ordering::SeqCst);
    let result = mgr.list_bookmarks(&session).await;

    assert!(matches!(result, Err(BookmarkError::ApiError { status: 503, .. })));
    assert_eq!(mgr.bookmarks(), before.as_slice());
}

/// A successful add prepends the stored row, owned by the session's user.
#[tokio::test]
async fn test_add_prepends_with_owner() {
    let (_remote, mut mgr, session) = setup();
    mgr.list_bookmarks(&session).await.unwrap();

    let created = mgr
        .add_bookmark(&session, "Example", "https://example.com")
        .await
        .unwrap();

    assert_eq!(created.user_id, "u1");
    assert_eq!(created.title, "Example");
    assert_eq!(mgr.bookmarks()[0], created);
    assert_eq!(mgr.bookmarks().len(), 4);
}

/// Submitting a complete form adds it and empties both fields.
#[tokio::test]
async fn test_submit_clears_form_on_success() {
    let (_remote, mut mgr, session) = setup();
    mgr.set_title("Example");
    mgr.set_url("https://example.com");

    let created = mgr.submit_form(&session).await.unwrap();

    assert_eq!(created.url, "https://example.com");
    assert_eq!(mgr.form(), &BookmarkForm::default());
    assert_eq!(mgr.bookmarks()[0].id, created.id);
}

/// An incomplete form is rejected before any remote call.
#[tokio::test]
async fn test_submit_incomplete_form_is_rejected() {
    let (remote, mut mgr, session) = setup();
    mgr.set_title("Only a title");

    let result = mgr.submit_form(&session).await;

    assert!(matches!(result, Err(BookmarkError::IncompleteForm)));
    assert_eq!(FakeBookmarkRemote::calls(&remote.insert_calls), 0);
    assert_eq!(mgr.form().title, "Only a title");
}

/// No URL format check: "not a url" is still sent to the server.
#[tokio::test]
async fn test_submit_does_not_validate_url_format() {
    let (remote, mut mgr, session) = setup();
    mgr.set_title("Odd");
    mgr.set_url("not a url");

    let created = mgr.submit_form(&session).await.unwrap();

    assert_eq!(created.url, "not a url");
    assert_eq!(FakeBookmarkRemote::calls(&remote.insert_calls), 1);
}

/// A failed insert leaves both the list and the form untouched.
#[tokio::test]
async fn test_failed_submit_keeps_list_and_form() {
    let (remote, mut mgr, session) = setup();
    mgr.list_bookmarks(&session).await.unwrap();
    mgr.set_title("Example");
    mgr.set_url("https://example.com");
    let before = mgr.bookmarks().to_vec();

    remote.fail_insert.store(true, std::sync::atomic::Ordering::SeqCst);
    let result = mgr.submit_form(&session).await;

    assert!(result.is_err());
    assert_eq!(mgr.bookmarks(), before.as_slice());
    assert_eq!(mgr.form(), &BookmarkForm::new("Example", "https://example.com"));
}

/// Deleting removes exactly that id and keeps the others in order.
#[tokio::test]
async fn test_delete_removes_only_target() {
    let (_remote, mut mgr, session) = setup();
    mgr.list_bookmarks(&session).await.unwrap();
    let middle = mgr.bookmarks()[1].id.clone();

    mgr.delete_bookmark(&session, &middle).await.unwrap();

    let titles: Vec<_> = mgr.bookmarks().iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, ["Crates", "Rust"]);
}

/// Deleting an id that isn't in the list changes nothing and is not an error.
#[tokio::test]
async fn test_delete_unknown_id_is_a_no_op() {
    let (_remote, mut mgr, session) = setup();
    mgr.list_bookmarks(&session).await.unwrap();
    let before = mgr.bookmarks().to_vec();

    mgr.delete_bookmark(&session, "does-not-exist").await.unwrap();

    assert_eq!(mgr.bookmarks(), before.as_slice());
}

/// A failed delete keeps the bookmark visible.
#[tokio::test]
async fn test_failed_delete_keeps_item() {
    let (remote, mut mgr, session) = setup();
    mgr.list_bookmarks(&session).await.unwrap();
    let target = mgr.bookmarks()[0].id.clone();

    remote.fail_delete.store(true, std::sync::atomic::Ordering::SeqCst);
    let result = mgr.delete_bookmark(&session, &target).await;

    assert!(result.is_err());
    assert_eq!(mgr.bookmarks().len(), 3);
    assert_eq!(mgr.bookmarks()[0].id, target);
}

/// `clear` empties the list but not the form.
#[tokio::test]
async fn test_clear_empties_list_only() {
    let (_remote, mut mgr, session) = setup();
    mgr.list_bookmarks(&session).await.unwrap();
    mgr.set_title("draft");

    mgr.clear();

    assert!(mgr.bookmarks().is_empty());
    assert_eq!(mgr.form().title, "draft");
}

/// Any successful add empties the form, not only a form submission.
#[tokio::test]
async fn test_add_clears_form() {
    let (_remote, mut mgr, session) = setup();
    mgr.set_title("draft title");
    mgr.set_url("https://draft.example");

    mgr.add_bookmark(&session, "Example", "https://example.com")
        .await
        .unwrap();

    assert_eq!(mgr.form(), &BookmarkForm::default());
}

/// A failed add keeps the form as typed.
#[tokio::test]
async fn test_failed_add_keeps_form() {
    let (remote, mut mgr, session) = setup();
    mgr.set_title("draft title");
    remote.fail_insert.store(true, std::sync::atomic::Ordering::SeqCst);

    let result = mgr.add_bookmark(&session, "Example", "https://example.com").await;

    assert!(result.is_err());
    assert_eq!(mgr.form().title, "draft title");
}
