use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal problems with the on-disk working layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("no makefiles directory available at {}", .0.display())]
    MakefilesMissing(PathBuf),

    #[error("unable to create sessions directory at {}", .path.display())]
    CreateSessionsDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Fatal problems bringing the compile service up.
#[derive(Debug, Error)]
pub enum ServiceStartError {
    #[error("unable to bind port {port}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("unable to open logfile {}", .path.display())]
    Logfile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to start the service runtime")]
    Runtime(#[source] io::Error),
}
