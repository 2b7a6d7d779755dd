// Platform path utilities.
// Resolves where the config file and the log file live.

use std::path::PathBuf;

use directories::ProjectDirs;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "postcache")
}

/// Get the config directory (~/.config/postcache on Linux).
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Path to the optional config file.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.json"))
}

/// Get the cache directory (~/.cache/postcache on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Path to the log file written while the TUI owns the terminal.
pub fn log_path() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join("postcache.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        // Path construction only; nothing touches the filesystem
        if let Some(path) = config_path() {
            assert!(path.ends_with("config.json"));
        }
        if let Some(path) = log_path() {
            assert!(path.ends_with("postcache.log"));
        }
    }
}
