use serde::{Deserialize, Serialize};

/// Top-level application settings container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub backend: BackendSettings,
    pub auth: AuthSettings,
    pub favicon: FaviconSettings,
    pub storage: StorageSettings,
}

/// Where the hosted backend lives and the public key used to reach it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendSettings {
    /// Base project URL, e.g. `https://abcd.supabase.co`.
    pub project_url: String,
    /// Public (anon) API key sent as the `apikey` header.
    pub anon_key: String,
}

impl BackendSettings {
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.project_url.trim_end_matches('/'))
    }

    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.project_url.trim_end_matches('/'))
    }
}

/// OAuth sign-in settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthSettings {
    pub provider: String,
    pub redirect_to: String,
    /// Sessions expiring within this many seconds are refreshed on access.
    pub refresh_margin_secs: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            provider: "google".to_string(),
            redirect_to: "http://localhost:3000".to_string(),
            refresh_margin_secs: 60,
        }
    }
}

/// Third-party favicon image service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FaviconSettings {
    pub service_url: String,
    pub size: u32,
}

impl Default for FaviconSettings {
    fn default() -> Self {
        Self {
            service_url: "https://www.google.com/s2/favicons".to_string(),
            size: 64,
        }
    }
}

/// Local storage for the persisted session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite file path. `None` uses the platform data directory.
    pub database_path: Option<String>,
    /// Secret mixed into the session encryption key. Without one the key is
    /// derivable from the database file alone, so sealing is only obfuscation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_secret: Option<String>,
}
