use std::path::Path;

use walkdir::WalkDir;

/// Current on-disk footprint of the session cache in bytes.
///
/// Purely informational telemetry for the bounded-cache policy: any
/// traversal failure yields 0 instead of an error, so a degraded or
/// vanished cache directory can never block the caller.
pub fn session_size(dir: &Path) -> u64 {
    try_session_size(dir).unwrap_or(0)
}

fn try_session_size(dir: &Path) -> Result<u64, walkdir::Error> {
    let mut total = 0;
    // Symlinks are counted but not followed, so cycles terminate.
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}
