use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use mio::{Interest, Registry, Token};
use ringcache_buf::Chain;
use tracing::debug;

/// Whether a connection is still usable after a read/write attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum ConnState {
    Alive,
    Disconnected,
}

/// Bytes pulled off the kernel socket in one `read()` call. This is raw,
/// unframed memcached wire bytes — `ringcache-network::framer` does the
/// reassembly downstream of this read.
const RECV_BUF_SIZE: usize = 64 * 1024;

/// One non-blocking `mio`-backed connection carrying the memcached binary
/// protocol.
///
/// Reading copies exactly once: bytes come off the kernel socket into a
/// freshly allocated `Bytes` (there is no way around that first copy with
/// a standard socket API). Everything after that — framing, request
/// decoding, cache storage, and response assembly — stays zero-copy over
/// that one allocation. Writing is the same in reverse:
/// [`TcpStream::send`] queues the response chain's segments as `Bytes`
/// views (`Chain::iter_bytes`, a refcount bump each) and only ever copies
/// if the kernel can't take all of them immediately, in which case the
/// unsent remainder sits in `send_backlog` until the socket reports
/// writable again.
pub struct TcpStream {
    stream: mio::net::TcpStream,
    peer_addr: SocketAddr,
    send_backlog: VecDeque<Bytes>,
    writable_armed: bool,
}

impl TcpStream {
    pub(crate) fn new(stream: mio::net::TcpStream, peer_addr: SocketAddr) -> io::Result<Self> {
        stream.set_nodelay(true)?;
        Ok(Self { stream, peer_addr, send_backlog: VecDeque::new(), writable_armed: false })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Reads one `read()` worth of bytes (non-blocking). `Ok(None)` means
    /// the socket would block right now (no more data this poll
    /// iteration); `Ok(Some(bytes))` may span multiple memcached messages
    /// or only a fragment of one — the framer handles either.
    pub fn try_read(&mut self) -> io::Result<Option<Bytes>> {
        let mut buf = BytesMut::zeroed(RECV_BUF_SIZE);
        match self.stream.read(&mut buf) {
            Ok(0) => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "peer closed connection")),
            Ok(n) => {
                buf.truncate(n);
                Ok(Some(buf.freeze()))
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Queues `chain` for sending and writes as much of it as the kernel
    /// will take right now. Callers batch every reply produced within one
    /// receive callback into a single chain handed to one `send` call
    /// here.
    pub fn send(&mut self, registry: &Registry, token: Token, chain: &Chain) -> io::Result<ConnState> {
        self.send_backlog.extend(chain.iter_bytes());
        self.flush_backlog(registry, token)
    }

    /// Called when the socket reports writable — drains whatever is left
    /// in the backlog from a previous partial write.
    pub fn writable(&mut self, registry: &Registry, token: Token) -> io::Result<ConnState> {
        self.flush_backlog(registry, token)
    }

    fn flush_backlog(&mut self, registry: &Registry, token: Token) -> io::Result<ConnState> {
        while let Some(front) = self.send_backlog.front_mut() {
            match self.stream.write(front) {
                Ok(0) => return Ok(ConnState::Disconnected),
                Ok(n) if n == front.len() => {
                    self.send_backlog.pop_front();
                }
                Ok(n) => {
                    let _ = front.split_to(n);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.arm_writable(registry, token)?;
                    return Ok(ConnState::Alive);
                }
                Err(e) => return Err(e),
            }
        }
        self.disarm_writable(registry, token)?;
        Ok(ConnState::Alive)
    }

    fn arm_writable(&mut self, registry: &Registry, token: Token) -> io::Result<()> {
        if !self.writable_armed {
            registry.reregister(&mut self.stream, token, Interest::READABLE | Interest::WRITABLE)?;
            self.writable_armed = true;
        }
        Ok(())
    }

    fn disarm_writable(&mut self, registry: &Registry, token: Token) -> io::Result<()> {
        if self.writable_armed {
            registry.reregister(&mut self.stream, token, Interest::READABLE)?;
            self.writable_armed = false;
        }
        Ok(())
    }

    pub fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        registry.deregister(&mut self.stream)
    }

    pub fn close(&mut self) {
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
        debug!(peer = %self.peer_addr, "connection closed");
    }
}
