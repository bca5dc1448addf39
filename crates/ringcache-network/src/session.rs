use std::sync::Arc;

use bytes::Bytes;
use ringcache_buf::Chain;
use ringcache_protocol::{Opcode, Request, empty_ok, hit, miss, not_supported, strip_key};
use ringcache_table::Table;
use tracing::warn;

use crate::error::SessionError;
use crate::framer;

/// What happened while draining a batch of newly received bytes.
#[derive(Debug, Default)]
pub struct SessionOutcome {
    /// Every reply produced this callback, prepended onto one chain in
    /// request order so the caller can send it in a single `write` call.
    /// `None` when nothing warrants a reply — e.g. the batch was entirely
    /// quiet opcodes, or didn't complete a message at all.
    pub reply: Option<Chain>,
    /// Set once QUIT/QUITQ is processed, or the framer/decoder hits a
    /// protocol-fatal condition: bad magic, or an unknown opcode. The
    /// caller flushes `reply` (if any) and then closes the connection; no
    /// further bytes from this peer are processed.
    pub close: bool,
}

/// Per-connection state: the accumulated pending receive chain and a
/// shared handle to the cache table.
///
/// One `Session` is pinned to whichever worker thread accepted its
/// connection and is driven exclusively from that thread — nothing here
/// needs its own locking.
pub struct Session {
    pending: Chain,
    table: Arc<Table>,
}

impl Session {
    pub fn new(table: Arc<Table>) -> Self {
        Self { pending: Chain::new(), table }
    }

    /// Receive callback. Appends `data` to the pending chain, then drains
    /// every complete message now available, running each through the
    /// cache table and batching the replies.
    pub fn on_recv(&mut self, data: Bytes) -> SessionOutcome {
        self.pending.append_chain(Chain::from_bytes(data));

        let mut rbuf = Chain::new();
        let mut close = false;

        loop {
            let message = match framer::next_message(&mut self.pending) {
                Ok(Some(message)) => message,
                Ok(None) => break,
                Err(err) => {
                    let err = SessionError::from(err);
                    warn!(%err, "closing session: framing error");
                    close = true;
                    break;
                }
            };

            match self.process(message) {
                Ok(reply) => {
                    if let Some(reply) = reply {
                        rbuf.append_chain(reply);
                    }
                }
                Err(reply) => {
                    if let Some(reply) = reply {
                        rbuf.append_chain(reply);
                    }
                    close = true;
                }
            }

            if close {
                break;
            }
        }

        SessionOutcome { reply: (rbuf.chain_len() > 0).then_some(rbuf), close }
    }

    /// Decodes and dispatches one fully-framed message. `Ok(reply)` is the
    /// response to append to this callback's batch (`None` for quiet
    /// suppression). `Err(reply)` means this request ends the session
    /// (QUIT/QUITQ, or a request this server can't even decode) — still
    /// carrying a reply to flush first when one is owed.
    fn process(&self, message: Chain) -> Result<Option<Chain>, Option<Chain>> {
        let request = match Request::decode(message) {
            Ok(request) => request,
            Err(err) => {
                let err = SessionError::from(err);
                warn!(%err, "closing session: malformed request");
                return Err(None);
            }
        };

        let opcode_byte = request.header.opcode;
        let opaque = request.opaque;
        let quiet = request.opcode.is_quiet();

        match request.opcode {
            Opcode::Get | Opcode::GetQ | Opcode::GetK | Opcode::GetKQ => {
                Ok(self.process_get(&request, opcode_byte, opaque))
            }
            Opcode::Set | Opcode::SetQ => {
                let key = Bytes::from(request.key.to_vec());
                self.table.set(key, &request.message, &request.header);
                Ok((!quiet).then(|| empty_ok(opcode_byte, opaque)))
            }
            Opcode::Noop => Ok(Some(empty_ok(opcode_byte, opaque))),
            Opcode::Flush | Opcode::FlushQ => {
                self.table.clear();
                Ok((!quiet).then(|| empty_ok(opcode_byte, opaque)))
            }
            Opcode::Quit | Opcode::QuitQ => Err((!quiet).then(|| empty_ok(opcode_byte, opaque))),
            Opcode::NotSupported => Ok(Some(not_supported(opcode_byte, opaque))),
        }
    }

    fn process_get(&self, request: &Request, opcode_byte: u8, opaque: u32) -> Option<Chain> {
        let key = request.key.to_vec();
        match self.table.find(&key) {
            Some(entry) => {
                let full = entry.binary();
                let echo_key = request.opcode.echoes_key_on_hit();
                let body = if echo_key { full.clone_view() } else { strip_key(full.clone_view(), entry.keylen) };
                let keylen = if echo_key { entry.keylen as u16 } else { 0 };
                Some(hit(opcode_byte, opaque, keylen, body))
            }
            None => {
                if request.opcode.is_quiet() {
                    None
                } else {
                    Some(miss(opcode_byte, opaque))
                }
            }
        }
    }
}
