use bytes::{Buf, BufMut};
use ringcache_buf::Chain;

use crate::error::DecodeError;

pub const HEADER_LEN: usize = 24;
pub const REQUEST_MAGIC: u8 = 0x80;
pub const RESPONSE_MAGIC: u8 = 0x81;

/// Response status codes.
pub mod status {
    pub const SUCCESS: u16 = 0x0000;
    pub const KEY_ENOENT: u16 = 0x0001;
    pub const NOT_SUPPORTED: u16 = 0x0081;
}

/// The 24-byte binary protocol request header, parsed out in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub opcode: u8,
    pub keylen: u16,
    pub extlen: u8,
    pub datatype: u8,
    pub bodylen: u32,
    pub opaque: u32,
    pub cas: u64,
}

impl RequestHeader {
    /// Parses the header from the front of `chain` without consuming it —
    /// peeking costs a refcounted clone of the chain's nodes, not a copy of
    /// their bytes.
    pub fn parse(chain: &Chain) -> Result<RequestHeader, DecodeError> {
        if chain.chain_len() < HEADER_LEN {
            return Err(DecodeError::TooShort);
        }
        let mut cursor = chain.clone_view();
        let magic = cursor.get_u8();
        if magic != REQUEST_MAGIC {
            return Err(DecodeError::NotBinaryProtocol);
        }
        let opcode = cursor.get_u8();
        let keylen = cursor.get_u16();
        let extlen = cursor.get_u8();
        let datatype = cursor.get_u8();
        cursor.advance(2); // reserved
        let bodylen = cursor.get_u32();
        let opaque = cursor.get_u32();
        let cas = cursor.get_u64();
        Ok(RequestHeader { opcode, keylen, extlen, datatype, bodylen, opaque, cas })
    }

    pub fn message_len(&self) -> usize {
        HEADER_LEN + self.bodylen as usize
    }
}

/// A response header under construction. Built fresh per
/// request and serialized to exactly 24 bytes.
#[derive(Debug, Clone, Copy)]
pub struct ResponseHeader {
    pub opcode: u8,
    pub extlen: u8,
    pub keylen: u16,
    pub status: u16,
    pub bodylen: u32,
    pub opaque: u32,
    pub cas: u64,
}

impl ResponseHeader {
    pub fn new(opcode: u8, opaque: u32) -> Self {
        Self { opcode, extlen: 0, keylen: 0, status: status::SUCCESS, bodylen: 0, opaque, cas: 0 }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        let mut w = &mut buf[..];
        w.put_u8(RESPONSE_MAGIC);
        w.put_u8(self.opcode);
        w.put_u16(self.keylen);
        w.put_u8(self.extlen);
        w.put_u8(0); // datatype
        w.put_u16(self.status);
        w.put_u32(self.bodylen);
        w.put_u32(self.opaque);
        w.put_u64(self.cas);
        buf
    }
}
