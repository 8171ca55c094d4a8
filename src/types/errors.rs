use thiserror::Error;

// === CryptoError ===

/// Errors related to cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Failed to derive encryption key from password.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
    /// Encryption operation failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),
    /// Decryption operation failed.
    #[error("Decryption failed: {0}")]
    Decryption(String),
    /// Failed to generate random bytes.
    #[error("Random generation failed: {0}")]
    RandomGeneration(String),
    /// The provided key is invalid.
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

// === BookmarkError ===

/// Errors related to remote bookmark operations.
#[derive(Debug, Error)]
pub enum BookmarkError {
    /// No signed-in user to act on behalf of.
    #[error("Not signed in")]
    NotAuthenticated,
    /// Title or URL was left empty.
    #[error("Title and URL are required")]
    IncompleteForm,
    /// The request never reached the table service, or its response was unreadable.
    #[error("Bookmark network error: {0}")]
    NetworkError(String),
    /// The table service rejected the request.
    #[error("Bookmark API error ({status}): {message}")]
    ApiError { status: u16, message: String },
    /// A returned row did not have the expected shape.
    #[error("Malformed bookmark record: {0}")]
    MalformedRecord(String),
}

// === AuthError ===

/// Errors related to the identity provider.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A network error occurred while communicating with the auth service.
    #[error("Auth network error: {0}")]
    NetworkError(String),
    /// The auth service returned an error.
    #[error("Auth API error ({status}): {message}")]
    ApiError { status: u16, message: String },
    /// The sign-in redirect did not carry a usable session.
    #[error("Invalid sign-in callback: {0}")]
    InvalidCallback(String),
    /// The auth service answered with an unexpected body.
    #[error("Malformed auth response: {0}")]
    MalformedResponse(String),
}

// === SessionError ===

/// Errors related to session persistence.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Failed to serialize or deserialize session data.
    #[error("Session serialization error: {0}")]
    SerializationError(String),
    /// Database operation failed.
    #[error("Session database error: {0}")]
    DatabaseError(String),
    /// Cryptographic operation failed during session encryption/decryption.
    #[error("Session crypto error: {0}")]
    CryptoError(String),
    /// The identity provider refused or failed the request.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// A required value is not configured.
    #[error("Missing settings value: {0}")]
    MissingValue(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}
