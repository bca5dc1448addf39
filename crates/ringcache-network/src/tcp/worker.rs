use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::Duration;

use mio::{Events, Interest, Poll, Token, Waker};
use ringcache_table::Table;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::session::Session;
use crate::tcp::stream::{ConnState, TcpStream};

/// Reserved for the `Waker` the accept thread uses to interrupt a
/// worker's `Poll::poll` as soon as it hands off a new connection.
const WAKE_TOKEN: Token = Token(usize::MAX);

/// A freshly accepted connection handed from the accept loop to one
/// worker thread. Sessions are pinned at accept time to exactly one
/// worker, assigned round robin across the pool.
struct Handoff {
    stream: mio::net::TcpStream,
    peer_addr: SocketAddr,
}

/// The accept thread's handle onto one worker: a channel to push new
/// connections onto, plus a `Waker` so the worker's poll loop notices the
/// handoff without waiting for its next socket event.
#[derive(Clone)]
pub struct WorkerHandle {
    sender: Sender<Handoff>,
    waker: Arc<Waker>,
}

impl WorkerHandle {
    /// Hands `stream` off to this worker. Non-blocking: the worker picks
    /// it up on its own thread at its next poll iteration.
    pub fn dispatch(&self, stream: mio::net::TcpStream, peer_addr: SocketAddr) -> io::Result<()> {
        self.sender
            .send(Handoff { stream, peer_addr })
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "worker thread is gone"))?;
        self.waker.wake()
    }
}

/// Binds and registers a listening socket against `poll`. Intended for
/// the accept thread's own small `Poll` (see `ringcache-server::workers`),
/// which contains nothing but this listener — all per-connection IO
/// happens on the worker threads `WorkerHandle::dispatch` hands
/// connections off to.
pub fn bind_listener(poll: &Poll, addr: SocketAddr, token: Token) -> io::Result<mio::net::TcpListener> {
    let mut listener = mio::net::TcpListener::bind(addr)?;
    poll.registry().register(&mut listener, token, Interest::READABLE)?;
    Ok(listener)
}

/// One worker thread's share of the server: its own `mio::Poll`, the
/// `Session`s pinned to it, and the inbound handoff channel from the
/// accept thread. Receive callback, processing, and send all run on this
/// one thread for every session pinned to it, so no session-local
/// locking is needed.
pub struct Worker {
    poll: Poll,
    events: Events,
    streams: HashMap<Token, TcpStream>,
    sessions: HashMap<Token, Session>,
    inbox: Receiver<Handoff>,
    table: Arc<Table>,
    next_token: usize,
}

impl Worker {
    /// Builds a worker bound to the shared cache `table`, returning it
    /// alongside the handle the accept thread will dispatch connections
    /// through.
    pub fn new(table: Arc<Table>) -> io::Result<(Worker, WorkerHandle)> {
        let poll = Poll::new()?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKE_TOKEN)?);
        let (sender, inbox) = channel();
        let worker = Worker {
            poll,
            events: Events::with_capacity(256),
            streams: HashMap::new(),
            sessions: HashMap::new(),
            inbox,
            table,
            next_token: 0,
        };
        Ok((worker, WorkerHandle { sender, waker }))
    }

    fn mint_token(&mut self) -> Token {
        let token = Token(self.next_token);
        self.next_token += 1;
        token
    }

    fn accept_handoffs(&mut self) {
        while let Ok(Handoff { mut stream, peer_addr }) = self.inbox.try_recv() {
            let token = self.mint_token();
            if let Err(err) = self.poll.registry().register(&mut stream, token, Interest::READABLE) {
                warn!(?err, %peer_addr, "failed to register handed-off connection");
                continue;
            }
            match TcpStream::new(stream, peer_addr) {
                Ok(conn) => {
                    debug!(%peer_addr, ?token, "session accepted");
                    self.streams.insert(token, conn);
                    self.sessions.insert(token, Session::new(Arc::clone(&self.table)));
                }
                Err(err) => warn!(?err, %peer_addr, "failed to prepare accepted stream"),
            }
        }
    }

    fn close(&mut self, token: Token) {
        if let Some(mut stream) = self.streams.remove(&token) {
            let _ = stream.deregister(self.poll.registry());
            stream.close();
        }
        self.sessions.remove(&token);
    }

    /// One poll iteration: picks up any connections handed off since the
    /// last call, then services every socket with a pending event —
    /// draining complete requests through each one's `Session` and
    /// flushing whatever replies they produce.
    pub fn run_once(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.poll.poll(&mut self.events, timeout)?;

        let tokens: Vec<Token> = self.events.iter().map(|event| event.token()).collect();
        let mut woke = false;
        for token in tokens {
            if token == WAKE_TOKEN {
                woke = true;
            } else {
                self.service(token);
            }
        }
        if woke {
            self.accept_handoffs();
        }
        Ok(())
    }

    fn service(&mut self, token: Token) {
        let mut close = false;

        if let Some(stream) = self.streams.get_mut(&token) {
            loop {
                match stream.try_read() {
                    Ok(Some(bytes)) => {
                        let Some(session) = self.sessions.get_mut(&token) else {
                            close = true;
                            break;
                        };
                        let outcome = session.on_recv(bytes);
                        if let Some(reply) = &outcome.reply {
                            match stream.send(self.poll.registry(), token, reply) {
                                Ok(ConnState::Alive) => {}
                                Ok(ConnState::Disconnected) | Err(_) => {
                                    close = true;
                                    break;
                                }
                            }
                        }
                        if outcome.close {
                            close = true;
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        let err = SessionError::from(err);
                        debug!(%err, ?token, "read failed");
                        close = true;
                        break;
                    }
                }
            }

            if !close {
                match stream.writable(self.poll.registry(), token) {
                    Ok(ConnState::Alive) => {}
                    Ok(ConnState::Disconnected) | Err(_) => close = true,
                }
            }
        }

        if close {
            self.close(token);
        }
    }
}
