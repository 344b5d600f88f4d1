use crate::{command::AgentArgs, ops::agent};
use clap::Parser;
use wgapi_lib::AgentKind;

/// Provision peerings regardless of the config's `type`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    pub agent: AgentArgs,
}

pub async fn exec(args: Args) -> anyhow::Result<()> {
    let config = agent::init(&args.agent).await?;
    agent::run_as(AgentKind::Client, config, &args.agent).await
}
