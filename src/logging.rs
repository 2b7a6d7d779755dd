// Tracing setup.
// The TUI owns stdout, so log lines go to a file under the cache directory.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::paths;
use crate::error::{PostcacheError, Result};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "postcache=info";

/// Initialize the global tracing subscriber.
///
/// Verbosity follows `RUST_LOG` (e.g. `RUST_LOG=postcache=debug`), falling
/// back to [`DEFAULT_FILTER`]. Returns the log file path, or `None` if the
/// platform has no cache directory, in which case logging stays off.
pub fn setup_tracing() -> Result<Option<std::path::PathBuf>> {
    let Some(path) = paths::log_path() else {
        return Ok(None);
    };
    let file = open_log_file(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| PostcacheError::Logging(e.to_string()))?;

    Ok(Some(path))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Open `path` for appending, creating its directory first.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_open_log_file_creates_dir_and_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("postcache.log");

        let mut file = open_log_file(&path).unwrap();
        writeln!(file, "first").unwrap();
        drop(file);

        let mut file = open_log_file(&path).unwrap();
        writeln!(file, "second").unwrap();
        drop(file);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
