use std::fs;

use tracing::{debug, trace};

use crate::config::RuntimeConfig;
use crate::error::LayoutError;

/// Validate the makefiles directory and ensure the sessions directory
/// exists. Runs once, before the compile service is constructed.
///
/// The makefiles directory holds the build templates for every supported
/// target; the supervisor cannot synthesize those, so a missing directory
/// is fatal. The sessions directory is owned by the service and is simply
/// reused as-is when already present.
pub fn prepare(config: &RuntimeConfig) -> Result<(), LayoutError> {
    if !config.makefiles_dir.is_dir() {
        return Err(LayoutError::MakefilesMissing(config.makefiles_dir.clone()));
    }
    trace!("makefiles directory available at {}", config.makefiles_dir.display());

    if config.sessions_dir.is_dir() {
        debug!("reusing sessions directory at {}", config.sessions_dir.display());
    } else {
        fs::create_dir_all(&config.sessions_dir).map_err(|source| {
            LayoutError::CreateSessionsDir { path: config.sessions_dir.clone(), source }
        })?;
        debug!("created sessions directory at {}", config.sessions_dir.display());
    }

    Ok(())
}
