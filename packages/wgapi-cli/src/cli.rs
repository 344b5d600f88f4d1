pub(crate) use crate::command::{client, run, server};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[clap(name = "wgapi-agent", about = "WireGuard API agent", version)]
pub struct Opt {
    /// The command to run
    #[clap(subcommand)]
    pub command: WgApiCli,
}

#[derive(Subcommand, Debug)]
pub enum WgApiCli {
    #[clap(name = "run", about = "Run in the mode named by the config's `type`.")]
    Run(run::Args),
    #[clap(name = "server", about = "Run as a hub and keep its peers in sync.")]
    Server(server::Args),
    #[clap(name = "client", about = "Provision every configured peering once.")]
    Client(client::Args),
}

pub async fn run_cli() -> Result<(), anyhow::Error> {
    let opt = Opt::parse();

    match opt.command {
        WgApiCli::Run(command) => run::exec(command).await,
        WgApiCli::Server(command) => server::exec(command).await,
        WgApiCli::Client(command) => client::exec(command).await,
    }
}
