use std::process::Command;
use std::time::Duration;
use std::{env, thread};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use forgeweb::cli::Cli;
use forgeweb::config::RuntimeConfig;
use forgeweb::service::{CompileService, ServiceSettings};
use forgeweb::{layout, recovery, sessions};
use tracing::{Level, error, info, trace};

fn main() -> Result<()> {
    // --help and malformed flags exit here, before any directory or
    // signal-handler side effects.
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = env::current_dir()
        .and_then(|dir| dir.canonicalize())
        .context("resolving the working directory")?;
    let config = RuntimeConfig::resolve(cli, &root);

    layout::prepare(&config)?;

    info!("forgeweb starting {}", Local::now().format("%a %b %e %T %Y"));
    info!("listening port {}", config.port);
    info!("working directory {}", config.root.display());
    info!("makefiles directory {}", config.makefiles_dir.display());
    info!("sessions directory {}", config.sessions_dir.display());
    info!("sessions size {} bytes", sessions::session_size(&config.sessions_dir));
    info!("verbosity {}", config.verbosity);
    if let Some(cmd) = &config.recover_cmd {
        info!("recovery command {}", cmd.display());
    }

    report_build_tool();
    if config.verbosity >= 2 {
        dump_environment();
    }

    recovery::install(config.recover_cmd.as_deref())?;

    let mut service = CompileService::new(ServiceSettings::from_config(&config));
    service
        .start()
        .with_context(|| format!("unable to start the compile service; check if port {} is available", config.port))?;

    info!("type ctrl-c to quit");

    // The service is never stopped; the process stays resident until a
    // signal takes it down.
    loop {
        thread::sleep(Duration::from_secs(30));
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();
}

/// The build templates drive `make`; surface its presence and version at
/// startup. Never fatal.
fn report_build_tool() {
    match Command::new("make").arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            info!("build tool: {}", version.lines().next().unwrap_or_default());
        }
        _ => error!("make not found; compile requests will fail"),
    }
}

fn dump_environment() {
    trace!("BEGIN ENVIRONMENT");
    for (key, value) in env::vars_os() {
        trace!("{}={}", key.to_string_lossy(), value.to_string_lossy());
    }
    trace!("END ENVIRONMENT");
}
