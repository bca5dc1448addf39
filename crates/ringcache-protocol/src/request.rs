use ringcache_buf::Chain;

use crate::error::DecodeError;
use crate::header::{HEADER_LEN, RequestHeader};
use crate::opcode::Opcode;

/// A fully decoded binary protocol request: header fields plus zero-copy
/// views over the key and value regions of the original message.
pub struct Request {
    pub opcode: Opcode,
    pub opaque: u32,
    /// The complete, undecomposed message chain (header + extras + key +
    /// value) — the cache table needs this whole, to build the cached
    /// response view without re-copying the header's own trailing bytes.
    pub message: Chain,
    pub header: RequestHeader,
    pub key: Chain,
    pub value: Chain,
}

impl Request {
    /// Decodes `message`, a chain already known by the framer to hold
    /// exactly one request (`chain_len() == 24 + bodylen`).
    pub fn decode(message: Chain) -> Result<Request, DecodeError> {
        let header = RequestHeader::parse(&message)?;
        let opcode = Opcode::from_byte(header.opcode).ok_or(DecodeError::UnknownOpcode(header.opcode))?;

        let mut rest = message.clone_view();
        rest.advance_chain(HEADER_LEN + header.extlen as usize);
        let key = rest.split_to(header.keylen as usize);
        let value = rest;

        Ok(Request { opcode, opaque: header.opaque, message, header, key, value })
    }
}
