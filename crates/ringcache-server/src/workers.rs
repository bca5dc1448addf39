use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mio::{Events, Poll, Token};
use ringcache_network::tcp::{Worker, WorkerHandle, bind_listener};
use ringcache_table::Table;
use ringcache_utils::{ThreadPriority, thread_boot};
use tracing::{info, warn};

const ACCEPT_TOKEN: Token = Token(usize::MAX - 1);

/// Spawns `num_workers` worker threads, each pinned to its own core and
/// driving its own `mio::Poll` loop over the sessions accepted onto it,
/// plus one accept thread that owns the listening socket and hands new
/// connections off round robin. Blocks forever servicing the accept loop
/// on the calling thread.
pub fn run(addr: SocketAddr, num_workers: usize, table: Arc<Table>) -> io::Result<()> {
    let core_ids = core_affinity::get_core_ids().unwrap_or_default();

    let mut handles = Vec::with_capacity(num_workers);
    for i in 0..num_workers {
        let (mut worker, handle) = Worker::new(Arc::clone(&table))?;
        let core = core_ids.get(i % core_ids.len().max(1)).copied();
        thread::Builder::new()
            .name(format!("ringcache-worker-{i}"))
            .spawn(move || {
                thread_boot(core.map(|c| c.id), ThreadPriority::High);
                loop {
                    if let Err(err) = worker.run_once(Some(Duration::from_millis(500))) {
                        warn!(?err, "worker poll loop error");
                    }
                }
            })?;
        handles.push(handle);
    }

    accept_loop(addr, handles)
}

fn accept_loop(addr: SocketAddr, handles: Vec<WorkerHandle>) -> io::Result<()> {
    let poll = Poll::new()?;
    let listener = bind_listener(&poll, addr, ACCEPT_TOKEN)?;
    info!(%addr, workers = handles.len(), "cache listener bound");

    let mut events = Events::with_capacity(256);
    let mut cpu_index = 0usize;

    loop {
        poll.poll(&mut events, None)?;
        for event in events.iter() {
            if event.token() != ACCEPT_TOKEN {
                continue;
            }
            loop {
                match listener.accept() {
                    Ok((stream, peer_addr)) => {
                        let target = cpu_index % handles.len();
                        cpu_index = cpu_index.wrapping_add(1);
                        if let Err(err) = handles[target].dispatch(stream, peer_addr) {
                            warn!(?err, %peer_addr, "failed to hand connection off to a worker");
                        }
                    }
                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(err) => return Err(err),
                }
            }
        }
    }
}
