pub(crate) mod client;
pub(crate) mod run;
pub(crate) mod server;

use clap::Parser;
use std::{path::PathBuf, time::Duration};
use wgapi_lib::constant::{CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH};

/// Options shared by every mode.
#[derive(Debug, Parser, Clone)]
pub struct AgentArgs {
    /// Config file.
    #[clap(
        short,
        long,
        env = CONFIG_ENV_VAR,
        default_value = DEFAULT_CONFIG_PATH,
        help = "Config file."
    )]
    pub config: PathBuf,

    /// Overrides `refresh_interval` from the config file.
    #[clap(long, value_parser = humantime::parse_duration, help = "Refresh interval, e.g. `30s`.")]
    pub interval: Option<Duration>,

    #[clap(long, default_value = "wg", help = "Path to the `wg` binary.")]
    pub wg: PathBuf,

    #[clap(long, default_value = "wg-quick", help = "Path to the `wg-quick` binary.")]
    pub wg_quick: PathBuf,
}
