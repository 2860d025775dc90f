//! Platform-specific cache root resolution.

use std::env;
use std::path::PathBuf;

use super::error::PathError;
use crate::settings::Settings;

const CACHE_DIR_NAME: &str = "mcpman";

/// Get the root directory of the mcpman cache.
///
/// Resolution order:
/// 1. `settings.cache_dir` (from `MCPMAN_CACHE_DIR`)
/// 2. System cache directory + `mcpman` (e.g. `~/Library/Caches/mcpman`,
///    `~/.cache/mcpman`)
///
/// The directory is not created here; see [`super::ensure_directory`].
pub fn cache_root(settings: &Settings) -> Result<PathBuf, PathError> {
    if let Some(raw) = settings.cache_dir.as_deref() {
        return normalize_user_path(raw);
    }

    let base = dirs::cache_dir().ok_or(PathError::NoCacheDir)?;
    Ok(base.join(CACHE_DIR_NAME))
}

/// Normalize a user-provided path, expanding `~` and making it absolute.
pub fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed == "~" {
        dirs::home_dir().ok_or(PathError::NoHomeDir)?
    } else if let Some(rest) = trimmed.strip_prefix("~/") {
        dirs::home_dir().ok_or(PathError::NoHomeDir)?.join(rest)
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(expanded))
            .map_err(|e| PathError::CurrentDirError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_root_override() {
        let settings = Settings {
            cache_dir: Some("/var/tmp/mcpman-test".to_string()),
            ..Settings::default()
        };
        assert_eq!(
            cache_root(&settings).unwrap(),
            PathBuf::from("/var/tmp/mcpman-test")
        );
    }

    #[test]
    fn test_relative_override_becomes_absolute() {
        let settings = Settings {
            cache_dir: Some("cache-here".to_string()),
            ..Settings::default()
        };
        let root = cache_root(&settings).unwrap();
        assert!(root.is_absolute());
        assert!(root.ends_with("cache-here"));
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert!(matches!(
            normalize_user_path("   "),
            Err(PathError::EmptyPath)
        ));
    }
}
