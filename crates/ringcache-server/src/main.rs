mod cli;
mod control;
mod workers;

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use cli::Cli;
use ringcache_table::Table;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();

    let table = match Table::new(cli.buckets) {
        Ok(table) => Arc::new(table),
        Err(err) => {
            error!(%err, buckets = cli.buckets, "invalid bucket count");
            return ExitCode::FAILURE;
        }
    };

    let num_workers = cli.workers.unwrap_or_else(|| {
        core_affinity::get_core_ids().map_or(1, |ids| ids.len().max(1))
    });

    let listen_addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let control_addr = SocketAddr::from(([0, 0, 0, 0], cli.control_port));

    thread::Builder::new()
        .name("ringcache-control".to_owned())
        .spawn(move || {
            if let Err(err) = control::run(control_addr, control::LoggingControlHandler) {
                error!(%err, "control channel stopped");
            }
        })
        .expect("failed to spawn control channel thread");

    if let Err(err) = workers::run(listen_addr, num_workers, table) {
        error!(%err, "cache listener stopped");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
