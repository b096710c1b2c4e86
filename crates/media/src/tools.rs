//! Locating the external tools the adapters shell out to.

use std::path::PathBuf;

/// Find a binary at an explicit path or in PATH.
///
/// If `config_path` is Some it is checked first; a configured path that does
/// not exist falls back to the PATH search for `name`.
pub fn find_binary(name: &str, config_path: Option<&str>) -> Option<PathBuf> {
    if let Some(path_str) = config_path {
        let path = expand_tilde(path_str);
        if path.is_file() {
            return Some(path);
        }
        // A bare command name ("ffmpeg6") is looked up like `name` would be.
        if let Ok(found) = which::which(path_str) {
            return Some(found);
        }
    }

    which::which(name).ok()
}

/// Expand `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(dirs) = directories::BaseDirs::new()
    {
        return dirs.home_dir().join(stripped);
    }
    PathBuf::from(path)
}
