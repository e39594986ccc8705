// SPDX-License-Identifier: MIT OR Apache-2.0
//! splatstage - scene editor tooling for gaussian splat viewers
//!
//! Command line front end over `splatstage_core`: create starter scenes,
//! inspect scene files headless, and export the viewer document.

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("splatstage=info,splatstage_core=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::debug!("splatstage v{} {:?}", env!("CARGO_PKG_VERSION"), cli.command);

    match commands::run(cli) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    }
}
