use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Requests are answered with a wildcard origin unless the service is
/// reconfigured; the `-a` flag only reasserts this.
const ANY_ORIGIN_DEFAULT: bool = true;

/// Resolved runtime configuration. Built once at startup, read-only
/// afterwards; every component receives it by reference.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub port: u16,
    pub max_clients: u32,
    pub max_sessions: u32,
    pub verbosity: u8,
    pub allow_any_origin: bool,
    /// Root working directory, the process current directory at startup.
    pub root: PathBuf,
    /// Directory holding the per-target build templates. Must pre-exist.
    pub makefiles_dir: PathBuf,
    /// Session cache directory, created on demand.
    pub sessions_dir: PathBuf,
    pub logfile: Option<PathBuf>,
    pub recover_cmd: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Merge CLI overrides over the default layout rooted at `root`.
    ///
    /// `root` must be absolute; every directory field of the result then
    /// is as well. A relative sessions-dir override is resolved against
    /// `root`, an absolute one replaces the default entirely.
    pub fn resolve(cli: Cli, root: &Path) -> Self {
        debug_assert!(root.is_absolute());

        let makefiles_dir = root.join("makefiles");
        let sessions_dir = match cli.sessions_dir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => root.join(dir),
            None => root.join("sessions"),
        };

        RuntimeConfig {
            port: cli.port,
            max_clients: cli.max_clients,
            max_sessions: cli.max_sessions,
            verbosity: cli.verbose,
            allow_any_origin: cli.any_origin || ANY_ORIGIN_DEFAULT,
            root: root.to_path_buf(),
            makefiles_dir,
            sessions_dir,
            logfile: None,
            recover_cmd: cli.recover_cmd,
        }
    }
}
