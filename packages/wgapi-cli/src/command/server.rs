use crate::{command::AgentArgs, ops::agent};
use clap::Parser;
use wgapi_lib::AgentKind;

/// Run as a hub regardless of the config's `type`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    pub agent: AgentArgs,
}

pub async fn exec(args: Args) -> anyhow::Result<()> {
    let config = agent::init(&args.agent).await?;
    agent::run_as(AgentKind::Server, config, &args.agent).await
}
