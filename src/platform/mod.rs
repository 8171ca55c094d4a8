// SmartMark platform paths
// Where the settings file and the session database live on each OS.
//
//   Linux:   $XDG_CONFIG_HOME/smartmark, $XDG_DATA_HOME/smartmark
//   macOS:   ~/Library/Application Support/SmartMark (both)
//   Windows: %APPDATA%/SmartMark (both)
//
// Each OS gets its own module; other targets fall back to ~/.smartmark.

use std::env;
use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

const DATABASE_FILE: &str = "smartmark.db";

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// Returns the directory holding `settings.json`.
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        home_dir().join(".smartmark")
    }
}

/// Returns the directory holding the local session database.
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        get_config_dir()
    }
}

/// Default location of the session database.
pub fn default_database_path() -> PathBuf {
    get_data_dir().join(DATABASE_FILE)
}
