mod args;
mod config_file;
mod server;

use crate::args::GatewaydArgs;
use anyhow::Result;
use clap::Parser;
use gateway_core::{DefaultBackendParser, Gateway};
use log::{info, trace, LevelFilter};
use std::sync::Arc;
use tokio::sync::RwLock;

#[tokio::main]
async fn main() -> Result<()> {
    let args = GatewaydArgs::parse();
    pretty_env_logger::env_logger::builder().format_timestamp(None).filter_level(if args.verbose { LevelFilter::Trace } else { LevelFilter::Info }).init();

    info!("starting gatewayd");
    trace!("arguments: {args:#?}");

    let mut config = config_file::try_load(&args.config_path).await?;
    args.apply_overrides(&mut config);

    let gateway = Arc::new(Gateway::new(config, DefaultBackendParser));
    let state = Arc::new(RwLock::new(gateway));

    if args.watch {
        config_file::watch(args.config_path.clone(), state.clone());
    }

    server::run(args.addr, args.mount_prefix.clone(), state).await
}
