// SmartMark platform paths for macOS
// Config and data share ~/Library/Application Support/SmartMark

use std::path::PathBuf;

use super::home_dir;

pub fn get_config_dir() -> PathBuf {
    home_dir()
        .join("Library")
        .join("Application Support")
        .join("SmartMark")
}

/// The session database sits next to the settings file.
pub fn get_data_dir() -> PathBuf {
    get_config_dir()
}
