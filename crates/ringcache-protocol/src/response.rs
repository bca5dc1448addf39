use bytes::Bytes;
use ringcache_buf::Chain;

use crate::header::{HEADER_LEN, RequestHeader, ResponseHeader, status};

/// The four zero bytes that replace a SET request's flags/expiry extras in
/// the cached response form. Flags and expiry are not preserved — a known
/// protocol deviation from a fully faithful memcached implementation.
pub const ZERO_EXTRAS: [u8; 4] = [0; 4];

/// Builds the cached `<0000, key, value>` view a `GetResponse` stores, from
/// the originating SET's full message chain.
///
/// Clones the message's nodes (a refcount bump each), skips past the
/// 24-byte header and the original extras, and prepends a single shared
/// static 4-byte zero segment in their place. No payload byte is copied.
pub fn cached_response_view(message: &Chain, header: &RequestHeader) -> Chain {
    let mut rest = message.clone_view();
    rest.advance_chain(HEADER_LEN + header.extlen as usize);
    let mut view = Chain::from_bytes(Bytes::from_static(&ZERO_EXTRAS));
    view.append_chain(rest);
    view
}

/// Removes the `keylen`-byte key region from a cached `<0000, key, value>`
/// view, producing `<0000, value>` for a plain (non-K) GET hit. The 4-byte
/// extras prefix and the value suffix are kept as-is; the key segment in
/// between is simply not re-included in the returned chain.
pub fn strip_key(mut full: Chain, keylen: usize) -> Chain {
    let mut out = full.split_to(4);
    full.advance_chain(keylen);
    out.append_chain(full);
    out
}

/// Assembles a full response chain: a freshly encoded 24-byte header
/// prepended to `body` (which may be empty).
fn build(opcode: u8, opaque: u32, status: u16, keylen: u16, extlen: u8, body: Chain) -> Chain {
    let mut header = ResponseHeader::new(opcode, opaque);
    header.status = status;
    header.keylen = keylen;
    header.extlen = extlen;
    header.bodylen = body.chain_len() as u32;
    let mut out = Chain::from_bytes(Bytes::copy_from_slice(&header.encode()));
    out.append_chain(body);
    out
}

/// An empty, successful response (SET, NOOP, QUIT, FLUSH acks).
pub fn empty_ok(opcode: u8, opaque: u32) -> Chain {
    build(opcode, opaque, status::SUCCESS, 0, 0, Chain::new())
}

/// `KEY_ENOENT` miss response for non-quiet GET-family opcodes.
pub fn miss(opcode: u8, opaque: u32) -> Chain {
    build(opcode, opaque, status::KEY_ENOENT, 0, 0, Chain::new())
}

/// `NOT_SUPPORTED` response for the value-mutation opcode family.
pub fn not_supported(opcode: u8, opaque: u32) -> Chain {
    build(opcode, opaque, status::NOT_SUPPORTED, 0, 0, Chain::new())
}

/// A GET-family hit. `body` is `<0000, value>` for GET/GETQ or
/// `<0000, key, value>` for GETK/GETKQ; `keylen` must match what `body`
/// actually carries (0 for the former, the key's length for the latter).
pub fn hit(opcode: u8, opaque: u32, keylen: u16, body: Chain) -> Chain {
    build(opcode, opaque, status::SUCCESS, keylen, 4, body)
}

#[cfg(test)]
mod tests {
    use bytes::Buf;

    use super::*;
    use crate::header::REQUEST_MAGIC;

    fn set_header(keylen: u16, extlen: u8, bodylen: u32) -> RequestHeader {
        RequestHeader { opcode: 0x01, keylen, extlen, datatype: 0, bodylen, opaque: 0, cas: 0 }
    }

    fn set_message(key: &[u8], value: &[u8]) -> Chain {
        use bytes::BufMut;
        let mut v = Vec::new();
        v.put_u8(REQUEST_MAGIC);
        v.put_u8(0x01);
        v.put_u16(key.len() as u16);
        v.put_u8(0);
        v.put_u8(0);
        v.put_u16(0);
        v.put_u32((key.len() + value.len()) as u32);
        v.put_u32(0);
        v.put_u64(0);
        v.extend_from_slice(key);
        v.extend_from_slice(value);
        Chain::from_bytes(Bytes::from(v))
    }

    #[test]
    fn cached_view_zeroes_extras_and_keeps_key_and_value() {
        let msg = set_message(b"foo", b"hello world");
        let header = set_header(3, 0, 14);
        let view = cached_response_view(&msg, &header);
        assert_eq!(view.to_vec(), b"\x00\x00\x00\x00foohello world");
    }

    #[test]
    fn strip_key_removes_only_the_key_region() {
        let msg = set_message(b"foo", b"hello world");
        let header = set_header(3, 0, 14);
        let full = cached_response_view(&msg, &header);
        let stripped = strip_key(full, 3);
        assert_eq!(stripped.to_vec(), b"\x00\x00\x00\x00hello world");
    }

    #[test]
    fn hit_response_encodes_expected_header() {
        let body = Chain::from_bytes(Bytes::from_static(b"\x00\x00\x00\x00hello world"));
        let mut reply = hit(0x00, 7, 0, body);
        assert_eq!(reply.get_u8(), 0x81);
        assert_eq!(reply.get_u8(), 0x00);
        assert_eq!(reply.get_u16(), 0); // keylen
        assert_eq!(reply.get_u8(), 4); // extlen
        reply.advance(1); // datatype
        assert_eq!(reply.get_u16(), status::SUCCESS);
        assert_eq!(reply.get_u32(), 15); // bodylen = 4 + 11
        assert_eq!(reply.get_u32(), 7); // opaque
    }

    #[test]
    fn miss_response_has_empty_body_and_enoent_status() {
        let mut reply = miss(0x00, 0);
        assert_eq!(reply.remaining(), HEADER_LEN);
        reply.advance(6);
        assert_eq!(reply.get_u16(), status::KEY_ENOENT);
    }
}
