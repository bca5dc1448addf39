use clap::Parser;

/// An in-memory cache server speaking the memcached binary protocol.
#[derive(Debug, Parser)]
#[command(name = "ringcache-server", version)]
pub struct Cli {
    /// TCP port the cache listener binds (`MCDPORT` in the original).
    #[arg(long, default_value_t = 11211)]
    pub port: u16,

    /// UDP port the control channel binds.
    #[arg(long, default_value_t = 6666)]
    pub control_port: u16,

    /// Number of worker threads, one per pinned core. Defaults to every
    /// core `core_affinity::get_core_ids()` reports.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Number of buckets in the cache table. Must be a power of two.
    #[arg(long, default_value_t = 8192)]
    pub buckets: usize,
}
