// SmartMark Settings Engine
// Loads backend/auth/favicon settings from a JSON file, layers environment overrides on top,
// and validates that the backend is reachable in principle before the app starts.

use std::fs;
use std::path::Path;

use reqwest::Url;
use tracing::{debug, info};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::AppSettings;

pub const CONFIG_PATH_VAR: &str = "SMARTMARK_CONFIG";
pub const PROJECT_URL_VAR: &str = "SMARTMARK_PROJECT_URL";
pub const ANON_KEY_VAR: &str = "SMARTMARK_ANON_KEY";
pub const REDIRECT_TO_VAR: &str = "SMARTMARK_REDIRECT_TO";
pub const OAUTH_PROVIDER_VAR: &str = "SMARTMARK_OAUTH_PROVIDER";
pub const DB_PATH_VAR: &str = "SMARTMARK_DB_PATH";
pub const SESSION_SECRET_VAR: &str = "SMARTMARK_SESSION_SECRET";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<AppSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &AppSettings;
    fn apply_overrides(&mut self, lookup: &dyn Fn(&str) -> Option<String>);
    fn validate(&self) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine implementation that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: AppSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise, uses the platform-specific config directory with `settings.json`.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = match path_override {
            Some(p) => p,
            None => platform::get_config_dir()
                .join("settings.json")
                .to_string_lossy()
                .to_string(),
        };

        Self {
            config_path,
            settings: AppSettings::default(),
        }
    }

    /// Creates an engine honoring `SMARTMARK_CONFIG`, loads it and applies
    /// process environment overrides.
    pub fn from_env() -> Result<Self, SettingsError> {
        let mut engine = Self::new(std::env::var(CONFIG_PATH_VAR).ok());
        engine.load()?;
        engine.apply_overrides(&|key| std::env::var(key).ok());
        Ok(engine)
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// If the file does not exist, returns default settings.
    /// If the file exists but is malformed, returns a serialization error.
    fn load(&mut self) -> Result<AppSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            info!(path = %self.config_path, "no settings file, using defaults");
            self.settings = AppSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        let settings: AppSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;

        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Saves the current settings to the JSON config file.
    ///
    /// Creates parent directories if they don't exist.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Overrides file values with any of the `SMARTMARK_*` variables `lookup` knows.
    fn apply_overrides(&mut self, lookup: &dyn Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(PROJECT_URL_VAR) {
            debug!("{} overrides backend.project_url", PROJECT_URL_VAR);
            self.settings.backend.project_url = url;
        }
        if let Some(key) = lookup(ANON_KEY_VAR) {
            debug!("{} overrides backend.anon_key", ANON_KEY_VAR);
            self.settings.backend.anon_key = key;
        }
        if let Some(redirect) = lookup(REDIRECT_TO_VAR) {
            self.settings.auth.redirect_to = redirect;
        }
        if let Some(provider) = lookup(OAUTH_PROVIDER_VAR) {
            self.settings.auth.provider = provider;
        }
        if let Some(db_path) = lookup(DB_PATH_VAR) {
            self.settings.storage.database_path = Some(db_path);
        }
        if let Some(secret) = lookup(SESSION_SECRET_VAR).filter(|s| !s.is_empty()) {
            debug!("{} sets the session key secret", SESSION_SECRET_VAR);
            self.settings.storage.session_secret = Some(secret);
        }
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let backend = &self.settings.backend;
        if backend.project_url.is_empty() {
            return Err(SettingsError::MissingValue("backend.project_url".to_string()));
        }
        let url = Url::parse(&backend.project_url).map_err(|e| {
            SettingsError::InvalidValue(format!("backend.project_url: {}", e))
        })?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(SettingsError::InvalidValue(format!(
                "backend.project_url: unsupported scheme '{}'",
                url.scheme()
            )));
        }
        if backend.anon_key.is_empty() {
            return Err(SettingsError::MissingValue("backend.anon_key".to_string()));
        }
        if self.settings.auth.provider.is_empty() {
            return Err(SettingsError::MissingValue("auth.provider".to_string()));
        }
        Ok(())
    }

    /// Resets all settings to factory defaults and saves to disk.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = AppSettings::default();
        self.save()?;
        Ok(())
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
