//! RPC method handler for the SmartMark JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested without stdin.
//! `handle_method` dispatches one call to the [`App`] controller.

use serde_json::{json, Value};

use crate::app::App;
use crate::types::bookmark::Bookmark;

fn str_param<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

fn bookmark_json(bm: &Bookmark) -> Value {
    json!({
        "id": bm.id,
        "created_at": bm.created_at,
        "url": bm.url,
        "title": bm.title,
        "user_id": bm.user_id,
    })
}

fn bookmarks_json(bookmarks: &[Bookmark]) -> Value {
    Value::Array(bookmarks.iter().map(bookmark_json).collect())
}

/// Dispatch a JSON-RPC method call.
///
/// Pending session changes are applied first so every call sees the current
/// identity. Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &mut App, method: &str, params: &Value) -> Result<Value, String> {
    app.process_session_events().await;

    match method {
        // ─── Session ───
        "session.get" => serde_json::to_value(app.state()).map_err(|e| e.to_string()),
        "auth.sign_in" => {
            let url = app.sign_in().map_err(|e| e.to_string())?;
            Ok(json!({"url": url}))
        }
        "auth.callback" => {
            let url = str_param(params, "url").ok_or("missing url")?;
            let user = app.complete_sign_in(url).await.map_err(|e| e.to_string())?;
            Ok(json!({"id": user.id, "email": user.email}))
        }
        "auth.sign_out" => {
            app.sign_out().await;
            Ok(json!({"ok": true}))
        }

        // ─── Bookmarks ───
        "bookmark.list" => Ok(bookmarks_json(app.bookmarks())),
        "bookmark.refresh" => {
            // A failed fetch still answers with the list we already have.
            let error = app.refresh_bookmarks().await.err().map(|e| e.to_string());
            let bookmarks = bookmarks_json(app.bookmarks());
            Ok(match error {
                Some(e) => json!({"bookmarks": bookmarks, "error": e}),
                None => json!({"bookmarks": bookmarks}),
            })
        }
        "form.set" => {
            app.set_form(str_param(params, "title"), str_param(params, "url"));
            Ok(json!({"ok": true}))
        }
        "bookmark.submit" => {
            let created = app.submit_bookmark().await.map_err(|e| e.to_string())?;
            Ok(bookmark_json(&created))
        }
        "bookmark.add" => {
            let title = str_param(params, "title").ok_or("missing title")?;
            let url = str_param(params, "url").ok_or("missing url")?;
            let created = app.add_bookmark(title, url).await.map_err(|e| e.to_string())?;
            Ok(bookmark_json(&created))
        }
        "bookmark.delete" => {
            let id = str_param(params, "id").ok_or("missing id")?;
            app.delete_bookmark(id).await.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── View ───
        "view.render" => serde_json::to_value(app.view()).map_err(|e| e.to_string()),
        "favicon.resolve" => {
            let url = str_param(params, "url").ok_or("missing url")?;
            Ok(json!({"favicon_url": app.favicons.favicon_url(url)}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
