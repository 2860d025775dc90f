//! Executable validation and child PATH construction.
//!
//! - Validate absolute executable paths (exists, is a file, executable bit)
//! - Build the PATH for child processes (exe dir first, then the parent PATH)

use std::collections::HashSet;
use std::env;
use std::ffi::OsString;
use std::path::Path;

/// Platform-specific PATH separator
#[cfg(unix)]
const PATH_SEPARATOR: &str = ":";
#[cfg(windows)]
const PATH_SEPARATOR: &str = ";";

/// Validate an absolute executable path.
///
/// Returns Ok(()) if:
/// - File exists
/// - File is a regular file
/// - File is executable (Unix)
///
/// Bare command names (`node`, `npx`) are not checked; the spawn resolves
/// them through PATH.
pub fn validate_exe_path(exe_path: &str) -> Result<(), String> {
    let path = Path::new(exe_path);

    if !path.is_absolute() {
        return Ok(());
    }

    if !path.exists() {
        return Err(format!("Executable not found: {exe_path}"));
    }

    if !path.is_file() {
        return Err(format!("Executable path is not a file: {exe_path}"));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(path) {
            Ok(metadata) => {
                if metadata.permissions().mode() & 0o111 == 0 {
                    return Err(format!("File is not executable: {exe_path}"));
                }
            }
            Err(e) => return Err(format!("Failed to check permissions: {e}")),
        }
    }

    Ok(())
}

/// Build the PATH for a child process.
///
/// 1. Directory containing the executable (so scripts find their interpreters)
/// 2. Current process PATH
///
/// Entries are deduplicated, first occurrence wins.
pub fn build_effective_path(exe_path: &str) -> OsString {
    let mut entries = Vec::new();

    let exe = Path::new(exe_path);
    if exe.is_absolute() {
        if let Some(dir) = exe.parent().and_then(Path::to_str) {
            entries.push(dir.to_string());
        }
    }

    if let Some(current) = env::var_os("PATH") {
        if let Some(current) = current.to_str() {
            entries.extend(
                current
                    .split(PATH_SEPARATOR)
                    .filter(|entry| !entry.is_empty())
                    .map(str::to_string),
            );
        }
    }

    let mut seen = HashSet::new();
    let deduped: Vec<String> = entries
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect();

    OsString::from(deduped.join(PATH_SEPARATOR))
}
