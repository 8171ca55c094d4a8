// SmartMark platform paths for Linux
// Config: $XDG_CONFIG_HOME/smartmark, else ~/.config/smartmark
// Data:   $XDG_DATA_HOME/smartmark, else ~/.local/share/smartmark

use std::env;
use std::path::PathBuf;

use super::home_dir;

/// XDG base directory, falling back to `~/<fallback>` when unset or empty.
fn xdg_dir(var: &str, fallback: &[&str]) -> PathBuf {
    match env::var(var) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => fallback.iter().fold(home_dir(), |path, part| path.join(part)),
    }
}

pub fn get_config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", &[".config"]).join("smartmark")
}

pub fn get_data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", &[".local", "share"]).join("smartmark")
}
