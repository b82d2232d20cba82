use std::fs::{File, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{Json, Router, routing::get};
use chrono::Local;
use serde::Serialize;
use tokio::runtime::Runtime;
use tracing::{error, info};

use crate::config::RuntimeConfig;
use crate::error::ServiceStartError;

/// Construction-time settings handed over by the supervisor. Everything
/// behind this boundary is owned by the service.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub port: u16,
    pub max_clients: u32,
    pub sessions_dir: PathBuf,
    pub makefiles_dir: PathBuf,
    pub logfile: Option<PathBuf>,
    pub max_sessions: u32,
}

impl ServiceSettings {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        ServiceSettings {
            port: config.port,
            max_clients: config.max_clients,
            sessions_dir: config.sessions_dir.clone(),
            makefiles_dir: config.makefiles_dir.clone(),
            logfile: config.logfile.clone(),
            max_sessions: config.max_sessions,
        }
    }
}

/// Operator-facing snapshot served on `/status`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub service: &'static str,
    pub port: u16,
    pub max_clients: u32,
    pub max_sessions: u32,
    pub sessions_dir: PathBuf,
    pub makefiles_dir: PathBuf,
}

/// The compilation/session HTTP service. The supervisor constructs it,
/// starts it once and never stops it; upload, compile and eviction
/// traffic is the service's own business.
pub struct CompileService {
    settings: ServiceSettings,
    logfile: Option<File>,
    runtime: Option<Runtime>,
}

impl CompileService {
    pub fn new(settings: ServiceSettings) -> Self {
        CompileService { settings, logfile: None, runtime: None }
    }

    /// Bind the listening socket and bring the HTTP surface up on a
    /// service-owned runtime. Binding happens synchronously so a busy
    /// port surfaces here rather than in a background task.
    pub fn start(&mut self) -> Result<(), ServiceStartError> {
        if let Some(path) = &self.settings.logfile {
            let file = OpenOptions::new().append(true).create(true).open(path).map_err(
                |source| ServiceStartError::Logfile { path: path.clone(), source },
            )?;
            self.logfile = Some(file);
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(ServiceStartError::Runtime)?;

        let port = self.settings.port;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = runtime
            .block_on(tokio::net::TcpListener::bind(addr))
            .map_err(|source| ServiceStartError::Bind { port, source })?;
        let local = listener
            .local_addr()
            .map_err(|source| ServiceStartError::Bind { port, source })?;

        let router = self.router();
        runtime.spawn(async move {
            if let Err(err) = axum::serve(listener, router).await {
                error!("compile service terminated: {err}");
            }
        });

        self.runtime = Some(runtime);
        self.log_line(&format!("compile service listening on {local}"));
        info!("compile service listening on {local}");
        Ok(())
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            service: "forgeweb",
            port: self.settings.port,
            max_clients: self.settings.max_clients,
            max_sessions: self.settings.max_sessions,
            sessions_dir: self.settings.sessions_dir.clone(),
            makefiles_dir: self.settings.makefiles_dir.clone(),
        }
    }

    fn router(&self) -> Router {
        let status = self.status();
        Router::new().route(
            "/status",
            get(move || {
                let status = status.clone();
                async move { Json(status) }
            }),
        )
    }

    fn log_line(&mut self, line: &str) {
        if let Some(file) = self.logfile.as_mut() {
            // best-effort sink
            let _ = writeln!(file, "[{}] {line}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        }
    }
}
