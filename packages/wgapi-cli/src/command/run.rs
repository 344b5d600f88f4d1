use crate::{command::AgentArgs, ops::agent};
use clap::Parser;

/// Run in whichever mode the config file names.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    pub agent: AgentArgs,
}

pub async fn exec(args: Args) -> anyhow::Result<()> {
    let config = agent::init(&args.agent).await?;
    agent::run(config, &args.agent).await
}
