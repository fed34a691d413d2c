use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::constants::{CONFIG_DIR_ENV, DEFAULT_LOG_FILENAME};

#[derive(Parser, Debug)]
#[command(name = "voyager", version, about = "Terminal client for GraphQL, HTTP and WebSocket APIs", long_about = None)]
struct ClapArgs {
    /// Write debug logs to a file
    #[arg(long)]
    debug: bool,

    /// Log file used with --debug
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Directory holding state.json
    #[arg(long, value_name = "DIR", env = CONFIG_DIR_ENV)]
    config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CommandLineArgs {
    debug: bool,
    log_file: PathBuf,
    config_dir: Option<PathBuf>,
}

impl CommandLineArgs {
    pub fn parse() -> Self {
        Self::from_clap(ClapArgs::parse())
    }

    pub fn parse_from<I, T>(itr: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::from_clap(ClapArgs::parse_from(itr))
    }

    fn from_clap(args: ClapArgs) -> Self {
        Self {
            debug: args.debug,
            log_file: args
                .log_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILENAME)),
            config_dir: args.config_dir.filter(|d| !d.as_os_str().is_empty()),
        }
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn log_file(&self) -> &PathBuf {
        &self.log_file
    }

    /// Explicit state directory, if one was given.
    pub fn config_dir(&self) -> Option<&PathBuf> {
        self.config_dir.as_ref()
    }
}
