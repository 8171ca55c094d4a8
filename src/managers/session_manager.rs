//! Session Manager for SmartMark.
//!
//! Tracks the signed-in identity. The current session is kept in memory and
//! persisted (AES-256-GCM sealed) in SQLite so a restart picks it back up.
//! The seal only protects the file if a session secret is configured; the
//! salt lives in the same database.
//! Every sign-in, sign-out, refresh and expiry is announced on a broadcast
//! channel; views hold a [`SessionSubscription`] for as long as they live.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::database::connection::Database;
use crate::services::auth_client::AuthProvider;
use crate::services::crypto_service::{CryptoService, CryptoServiceTrait};
use crate::types::credential::EncryptedData;
use crate::types::errors::{AuthError, SessionError};
use crate::types::session::{AuthChange, AuthEvent, AuthSession, AuthUser};
use crate::types::settings::AuthSettings;

const SESSION_KEY_PASSPHRASE: &str = "smartmark-session-key-v1";
const SESSION_ROW_ID: &str = "current";
const SALT_META_KEY: &str = "session_salt";
const SALT_LENGTH: usize = 16;
const EVENT_CAPACITY: usize = 16;

/// Trait defining session management operations.
#[async_trait(?Send)]
pub trait SessionManagerTrait {
    /// The persisted session, refreshed if it is about to expire. Absence is
    /// the only failure mode.
    async fn get_current_session(&mut self) -> Option<AuthSession>;
    /// Registers for change notifications until the subscription is dropped.
    fn on_session_change(&self) -> SessionSubscription;
    /// Starts a redirect-based sign-in and returns the URL to send the user to.
    fn sign_in(&self) -> Result<String, AuthError>;
    /// Finishes a sign-in from the provider's redirect back to us.
    async fn complete_sign_in(&mut self, callback_url: &str) -> Result<AuthUser, SessionError>;
    /// Ends the session locally and on the provider. Provider errors are ignored.
    async fn sign_out(&mut self);
    /// Drops the session after the provider reported it expired.
    async fn expire_session(&mut self);
}

/// A live registration for session-change notifications.
///
/// Dropping the subscription (or calling [`unsubscribe`](Self::unsubscribe))
/// releases it; nothing is delivered to a released subscriber.
pub struct SessionSubscription {
    receiver: broadcast::Receiver<AuthChange>,
}

impl SessionSubscription {
    /// Waits for the next change. Returns `None` once the manager is gone.
    pub async fn recv(&mut self) -> Option<AuthChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Some(change),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "session subscriber lagged, older changes dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns a pending change without waiting.
    pub fn try_recv(&mut self) -> Option<AuthChange> {
        loop {
            match self.receiver.try_recv() {
                Ok(change) => return Some(change),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "session subscriber lagged, older changes dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {
        debug!("session subscription released");
    }
}

/// Session manager backed by an [`AuthProvider`] and the local database.
pub struct SessionManager {
    db: Arc<Database>,
    crypto: CryptoService,
    encryption_key: Vec<u8>,
    auth: Arc<dyn AuthProvider>,
    settings: AuthSettings,
    events: broadcast::Sender<AuthChange>,
    current: Option<AuthSession>,
}

impl SessionManager {
    /// Creates a SessionManager whose key depends only on the database.
    ///
    /// Anyone holding the database file can rebuild this key; use
    /// [`with_secret`](Self::with_secret) to keep sessions sealed at rest.
    pub fn new(
        db: Arc<Database>,
        auth: Arc<dyn AuthProvider>,
        settings: AuthSettings,
    ) -> Result<Self, SessionError> {
        Self::with_secret(db, auth, settings, None)
    }

    /// Creates a SessionManager.
    ///
    /// The session encryption key is derived from `secret` (kept outside the
    /// database) and a per-database random salt, which is created on first use.
    pub fn with_secret(
        db: Arc<Database>,
        auth: Arc<dyn AuthProvider>,
        settings: AuthSettings,
        secret: Option<&str>,
    ) -> Result<Self, SessionError> {
        let crypto = CryptoService::new();
        let salt = Self::load_or_create_salt(&db, &crypto)?;
        let passphrase = match secret {
            Some(secret) => format!("{}:{}", SESSION_KEY_PASSPHRASE, secret),
            None => {
                warn!("no session secret configured, persisted session is only obfuscated");
                SESSION_KEY_PASSPHRASE.to_string()
            }
        };
        let encryption_key = crypto
            .derive_key(&passphrase, &salt)
            .map_err(|e| SessionError::CryptoError(e.to_string()))?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            db,
            crypto,
            encryption_key,
            auth,
            settings,
            events,
            current: None,
        })
    }

    fn load_or_create_salt(db: &Database, crypto: &CryptoService) -> Result<Vec<u8>, SessionError> {
        let conn = db.connection();
        let existing: Option<Vec<u8>> = conn
            .query_row(
                "SELECT value FROM app_meta WHERE key = ?1",
                params![SALT_META_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        if let Some(salt) = existing {
            return Ok(salt);
        }

        let salt = crypto
            .generate_random_bytes(SALT_LENGTH)
            .map_err(|e| SessionError::CryptoError(e.to_string()))?;
        conn.execute(
            "INSERT INTO app_meta (key, value) VALUES (?1, ?2)",
            params![SALT_META_KEY, salt],
        )
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;
        Ok(salt)
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// The user of the in-memory session, if any. Does not touch storage.
    pub fn current_user(&self) -> Option<&AuthUser> {
        self.current.as_ref().map(|s| &s.user)
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    fn notify(&self, event: AuthEvent, session: Option<AuthSession>) {
        // No subscribers is not an error.
        let _ = self.events.send(AuthChange { event, session });
    }

    /// Serializes, encrypts and stores the session, replacing any previous one.
    pub fn persist(&self, session: &AuthSession) -> Result<(), SessionError> {
        let json = serde_json::to_vec(session)
            .map_err(|e| SessionError::SerializationError(e.to_string()))?;

        let encrypted = self
            .crypto
            .encrypt_aes256gcm(&json, &self.encryption_key)
            .map_err(|e| SessionError::CryptoError(e.to_string()))?;

        self.db
            .connection()
            .execute(
                "INSERT OR REPLACE INTO auth_sessions (id, encrypted_data, iv, auth_tag, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![SESSION_ROW_ID, encrypted.ciphertext, encrypted.iv, encrypted.auth_tag, Self::now()],
            )
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// Reads back the persisted session, if one exists.
    pub fn load_persisted(&self) -> Result<Option<AuthSession>, SessionError> {
        let encrypted = self
            .db
            .connection()
            .query_row(
                "SELECT encrypted_data, iv, auth_tag FROM auth_sessions WHERE id = ?1",
                params![SESSION_ROW_ID],
                |row| {
                    Ok(EncryptedData {
                        ciphertext: row.get(0)?,
                        iv: row.get(1)?,
                        auth_tag: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        let Some(encrypted) = encrypted else {
            return Ok(None);
        };

        let json_bytes = self
            .crypto
            .decrypt_aes256gcm(&encrypted, &self.encryption_key)
            .map_err(|e| SessionError::CryptoError(e.to_string()))?;

        let session: AuthSession = serde_json::from_slice(&json_bytes)
            .map_err(|e| SessionError::SerializationError(e.to_string()))?;

        Ok(Some(session))
    }

    pub fn clear_persisted(&self) -> Result<(), SessionError> {
        self.db
            .connection()
            .execute("DELETE FROM auth_sessions", [])
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    fn forget(&mut self) {
        self.current = None;
        if let Err(e) = self.clear_persisted() {
            warn!(error = %e, "failed to clear persisted session");
        }
    }

    /// Refreshes `session`. A token that has already expired is dropped when
    /// the refresh fails; one that is merely close to expiry is kept.
    async fn refresh(&mut self, session: AuthSession) -> Option<AuthSession> {
        match self.auth.refresh_session(&session.refresh_token).await {
            Ok(fresh) => {
                if let Err(e) = self.persist(&fresh) {
                    warn!(error = %e, "failed to persist refreshed session");
                }
                info!(user = %fresh.user.id, "session refreshed");
                self.current = Some(fresh.clone());
                self.notify(AuthEvent::TokenRefreshed, Some(fresh.clone()));
                Some(fresh)
            }
            Err(e) if session.expires_within(Self::now(), 0) => {
                warn!(error = %e, "session expired and could not be refreshed");
                self.forget();
                self.notify(AuthEvent::SignedOut, None);
                None
            }
            Err(e) => {
                warn!(error = %e, "session refresh failed, keeping current token");
                self.current = Some(session.clone());
                Some(session)
            }
        }
    }
}

#[async_trait(?Send)]
impl SessionManagerTrait for SessionManager {
    async fn get_current_session(&mut self) -> Option<AuthSession> {
        let session = match self.current.clone() {
            Some(session) => session,
            None => match self.load_persisted() {
                Ok(session) => session?,
                Err(e) => {
                    warn!(error = %e, "discarding unreadable persisted session");
                    self.forget();
                    return None;
                }
            },
        };

        if session.expires_within(Self::now(), self.settings.refresh_margin_secs) {
            return self.refresh(session).await;
        }

        self.current = Some(session.clone());
        Some(session)
    }

    fn on_session_change(&self) -> SessionSubscription {
        SessionSubscription {
            receiver: self.events.subscribe(),
        }
    }

    fn sign_in(&self) -> Result<String, AuthError> {
        let url = self
            .auth
            .authorize_url(&self.settings.provider, &self.settings.redirect_to)?;
        info!(provider = %self.settings.provider, "starting sign-in redirect");
        Ok(url)
    }

    async fn complete_sign_in(&mut self, callback_url: &str) -> Result<AuthUser, SessionError> {
        let session = self.auth.session_from_callback(callback_url).await?;
        self.persist(&session)?;
        info!(user = %session.user.id, "signed in");

        let user = session.user.clone();
        self.current = Some(session.clone());
        self.notify(AuthEvent::SignedIn, Some(session));
        Ok(user)
    }

    async fn sign_out(&mut self) {
        let session = match self.current.take() {
            Some(session) => Some(session),
            None => self.load_persisted().ok().flatten(),
        };

        if let Some(session) = session {
            if let Err(e) = self.auth.sign_out(&session.access_token).await {
                warn!(error = %e, "provider sign-out failed, clearing local session anyway");
            }
        }

        self.forget();
        info!("signed out");
        self.notify(AuthEvent::SignedOut, None);
    }

    async fn expire_session(&mut self) {
        self.forget();
        info!("session expired");
        self.notify(AuthEvent::SignedOut, None);
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.crypto.zeroize_memory(&mut self.encryption_key);
    }
}
