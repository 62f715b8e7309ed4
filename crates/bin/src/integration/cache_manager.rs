//! Location of the accident cache and downloaded archives.

use std::path::PathBuf;
use transito::data::DataError;
use transito::data::cache::AccidentCache;

/// Get the default cache directory path.
///
/// Uses platform-specific cache directories:
/// - Linux: `~/.cache/transito/`
/// - macOS: `~/Library/Caches/transito/`
/// - Windows: `%LOCALAPPDATA%\transito\`
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("transito")
}

/// Get the default cache database path.
pub(crate) fn default_cache_path() -> PathBuf {
    default_cache_dir().join("transito.db")
}

/// Directory downloaded archives are kept in.
pub(crate) fn default_download_dir() -> PathBuf {
    default_cache_dir().join("archives")
}

/// Open the cache, creating the directory if needed.
pub(crate) fn open_cache() -> Result<AccidentCache, DataError> {
    let cache_path = default_cache_path();

    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    AccidentCache::new(&cache_path)
}
