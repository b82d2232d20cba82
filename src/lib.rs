pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod recovery;
pub mod service;
pub mod sessions;

// re-export selected public API
pub use cli::Cli;
pub use config::RuntimeConfig;
pub use service::{CompileService, ServiceSettings};
