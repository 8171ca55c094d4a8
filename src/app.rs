//! App Core for SmartMark.
//!
//! The top-level controller: owns the session state, the bookmark list and the
//! subscription that keeps them in step with sign-in and sign-out.

use std::error::Error;
use std::sync::Arc;

use tracing::{debug, info};

use crate::database::connection::Database;
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::managers::session_manager::{SessionManager, SessionManagerTrait, SessionSubscription};
use crate::platform;
use crate::services::auth_client::{AuthProvider, GoTrueClient};
use crate::services::favicon::FaviconResolver;
use crate::services::rest_client::{BookmarkRemote, PostgrestClient};
use crate::types::bookmark::Bookmark;
use crate::types::errors::{AuthError, BookmarkError, SessionError};
use crate::types::session::{AuthChange, AuthSession, AuthUser, SessionState};
use crate::types::settings::AppSettings;
use crate::ui::view::{self, RenderInput, View};

/// Central application struct.
pub struct App {
    pub settings: AppSettings,
    pub session_manager: SessionManager,
    pub bookmark_manager: BookmarkManager,
    pub favicons: FaviconResolver,
    state: SessionState,
    subscription: Option<SessionSubscription>,
}

impl App {
    /// Wires the app against explicit collaborators.
    pub fn new(
        settings: AppSettings,
        db: Arc<Database>,
        auth: Arc<dyn AuthProvider>,
        remote: Arc<dyn BookmarkRemote>,
    ) -> Result<Self, SessionError> {
        let session_manager = SessionManager::with_secret(
            db,
            auth,
            settings.auth.clone(),
            settings.storage.session_secret.as_deref(),
        )?;
        let bookmark_manager = BookmarkManager::new(remote);
        let favicons = FaviconResolver::new(&settings.favicon);

        Ok(Self {
            settings,
            session_manager,
            bookmark_manager,
            favicons,
            state: SessionState::Loading,
            subscription: None,
        })
    }

    /// Wires the app against the hosted backend named in `settings`.
    pub fn from_settings(settings: AppSettings) -> Result<Self, Box<dyn Error>> {
        let db_path = match &settings.storage.database_path {
            Some(path) => path.into(),
            None => platform::default_database_path(),
        };
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Arc::new(Database::open(&db_path)?);

        let http = reqwest::Client::new();
        let auth = Arc::new(GoTrueClient::with_client(http.clone(), &settings.backend));
        let remote = Arc::new(PostgrestClient::with_client(http, &settings.backend));

        Ok(Self::new(settings, db, auth, remote)
            .map_err(|e| format!("SessionManager init failed: {}", e))?)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        self.bookmark_manager.bookmarks()
    }

    /// Startup sequence: resolve the initial session, fetch once if signed in,
    /// then start listening for changes.
    pub async fn startup(&mut self) {
        self.state = SessionState::Loading;

        match self.session_manager.get_current_session().await {
            Some(session) => {
                self.state = SessionState::Authenticated(session.user.clone());
                let _ = self.bookmark_manager.list_bookmarks(&session).await;
            }
            None => self.state = SessionState::Unauthenticated,
        }

        self.subscription = Some(self.session_manager.on_session_change());
        info!(authenticated = self.state.is_authenticated(), "startup complete");
    }

    /// Applies every queued session change. Returns how many were applied.
    pub async fn process_session_events(&mut self) -> usize {
        let mut applied = 0;
        while let Some(change) = self.subscription.as_mut().and_then(|s| s.try_recv()) {
            self.apply_session_change(change).await;
            applied += 1;
        }
        applied
    }

    async fn apply_session_change(&mut self, change: AuthChange) {
        debug!(event = ?change.event, "session change");
        match change.session {
            Some(session) => {
                self.state = SessionState::Authenticated(session.user.clone());
                let _ = self.bookmark_manager.list_bookmarks(&session).await;
            }
            None => {
                self.state = SessionState::Unauthenticated;
                self.bookmark_manager.clear();
            }
        }
    }

    /// The live session for remote calls, refreshed if needed.
    async fn active_session(&mut self) -> Result<AuthSession, BookmarkError> {
        if !self.state.is_authenticated() {
            return Err(BookmarkError::NotAuthenticated);
        }
        match self.session_manager.get_current_session().await {
            Some(session) => Ok(session),
            None => {
                // The session expired underneath us; pick up the sign-out.
                self.process_session_events().await;
                Err(BookmarkError::NotAuthenticated)
            }
        }
    }

    pub fn sign_in(&self) -> Result<String, AuthError> {
        self.session_manager.sign_in()
    }

    pub async fn complete_sign_in(&mut self, callback_url: &str) -> Result<AuthUser, SessionError> {
        let user = self.session_manager.complete_sign_in(callback_url).await?;
        self.process_session_events().await;
        Ok(user)
    }

    pub async fn sign_out(&mut self) {
        self.session_manager.sign_out().await;
        self.process_session_events().await;
    }

    /// Re-fetches the list. A failure leaves the current list in place.
    pub async fn refresh_bookmarks(&mut self) -> Result<&[Bookmark], BookmarkError> {
        let session = self.active_session().await?;
        self.bookmark_manager.list_bookmarks(&session).await
    }

    pub fn set_form(&mut self, title: Option<&str>, url: Option<&str>) {
        if let Some(title) = title {
            self.bookmark_manager.set_title(title);
        }
        if let Some(url) = url {
            self.bookmark_manager.set_url(url);
        }
    }

    /// Submits the add form. On failure the form keeps what the user typed.
    pub async fn submit_bookmark(&mut self) -> Result<Bookmark, BookmarkError> {
        let session = self.active_session().await?;
        self.bookmark_manager.submit_form(&session).await
    }

    pub async fn add_bookmark(&mut self, title: &str, url: &str) -> Result<Bookmark, BookmarkError> {
        let session = self.active_session().await?;
        self.bookmark_manager.add_bookmark(&session, title, url).await
    }

    pub async fn delete_bookmark(&mut self, id: &str) -> Result<(), BookmarkError> {
        let session = self.active_session().await?;
        self.bookmark_manager.delete_bookmark(&session, id).await
    }

    pub fn view(&self) -> View {
        view::render(RenderInput {
            state: &self.state,
            bookmarks: self.bookmark_manager.bookmarks(),
            form: self.bookmark_manager.form(),
            favicons: &self.favicons,
            provider: &self.settings.auth.provider,
        })
    }

    /// Releases the session subscription. No change is applied afterwards.
    pub fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}
