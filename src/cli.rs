use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "forgeweb", version, about = "forgeweb compilation service supervisor")]
pub struct Cli {
    /// Directory in which session files will be written
    #[arg(short = 'd', long = "sessions-dir", value_name = "DIR")]
    pub sessions_dir: Option<PathBuf>,

    /// Add any origin when answering requests
    #[arg(short = 'a', long = "any-origin")]
    pub any_origin: bool,

    /// Maximum number of clients allowed to concurrently upload
    #[arg(short = 'm', long = "max-clients", value_name = "N", default_value_t = 2)]
    pub max_clients: u32,

    /// The listening port
    #[arg(short = 'p', long, value_name = "PORT", default_value_t = 8888)]
    pub port: u16,

    /// Maximum number of cached sessions
    #[arg(short = 'n', long = "max-sessions", value_name = "N", default_value_t = 50)]
    pub max_sessions: u32,

    /// 0: normal; 1: verbose; 2: very verbose
    #[arg(
        short = 'v',
        long,
        value_name = "LEVEL",
        default_value_t = 0,
        value_parser = clap::value_parser!(u8).range(0..=2)
    )]
    pub verbose: u8,

    /// Program (usually self) to launch after crash recovery
    #[arg(short = 'r', long = "recover-cmd", value_name = "PATH")]
    pub recover_cmd: Option<PathBuf>,
}
