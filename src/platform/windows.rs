// SmartMark platform paths for Windows
// Config and data share %APPDATA%/SmartMark

use std::env;
use std::path::PathBuf;

use super::home_dir;

/// `%APPDATA%/SmartMark`, or `~/AppData/Roaming/SmartMark` when APPDATA is unset.
pub fn get_config_dir() -> PathBuf {
    env::var("APPDATA")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join("AppData").join("Roaming"))
        .join("SmartMark")
}

pub fn get_data_dir() -> PathBuf {
    get_config_dir()
}
