use ringcache_buf::Chain;
use ringcache_protocol::{DecodeError, RequestHeader};

/// Extracts the next complete request message from `pending`.
///
/// `Ok(None)` means `pending` doesn't yet hold a complete message — not
/// even a full 24-byte header, or a header whose declared `bodylen`
/// hasn't all arrived yet. `pending` is left untouched; the caller grows
/// it with the next receive callback's bytes and calls again.
///
/// `Ok(Some(message))` hands back exactly one message, and `pending` is
/// left holding whatever bytes came after it (possibly none, possibly
/// several more messages — callers loop until `Ok(None)` to drain a
/// pipelined batch).
///
/// `Err` is protocol-fatal: the first byte of the next message wasn't the
/// binary magic `0x80`. The caller closes the session; there is no
/// framing that recovers from this.
///
/// `Chain::split_to` already implements the no-copy node-boundary-or-split
/// logic (walk nodes, cut the one node that straddles the boundary into
/// two shared views), so this function is just that plus the header peek
/// needed to learn `message_len`.
pub fn next_message(pending: &mut Chain) -> Result<Option<Chain>, DecodeError> {
    let header = match RequestHeader::parse(pending) {
        Ok(header) => header,
        Err(DecodeError::TooShort) => return Ok(None),
        Err(err) => return Err(err),
    };

    let message_len = header.message_len();
    if pending.chain_len() < message_len {
        return Ok(None);
    }

    Ok(Some(pending.split_to(message_len)))
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, Bytes};
    use ringcache_protocol::REQUEST_MAGIC;

    use super::*;

    fn message_bytes(opcode: u8, key: &[u8], value: &[u8]) -> Vec<u8> {
        let mut v = Vec::new();
        v.put_u8(REQUEST_MAGIC);
        v.put_u8(opcode);
        v.put_u16(key.len() as u16);
        v.put_u8(0);
        v.put_u8(0);
        v.put_u16(0);
        v.put_u32((key.len() + value.len()) as u32);
        v.put_u32(0);
        v.put_u64(0);
        v.extend_from_slice(key);
        v.extend_from_slice(value);
        v
    }

    #[test]
    fn returns_none_until_header_is_complete() {
        let mut pending = Chain::from_bytes(Bytes::from_static(b"\x80\x00\x00"));
        assert_eq!(next_message(&mut pending).unwrap(), None);
        assert_eq!(pending.chain_len(), 3);
    }

    #[test]
    fn returns_none_until_body_is_complete() {
        let full = message_bytes(0x00, b"foo", b"hello world");
        let mut pending = Chain::from_bytes(Bytes::from(full[..30].to_vec()));
        assert_eq!(next_message(&mut pending).unwrap(), None);
        assert_eq!(pending.chain_len(), 30);
    }

    #[test]
    fn extracts_one_complete_message_exactly() {
        let full = message_bytes(0x01, b"foo", b"hello world");
        let mut pending = Chain::from_bytes(Bytes::from(full.clone()));
        let message = next_message(&mut pending).unwrap().expect("complete message");
        assert_eq!(message.to_vec(), full);
        assert_eq!(pending.chain_len(), 0);
    }

    /// SET and GET concatenated in one chunk.
    #[test]
    fn drains_multiple_pipelined_messages() {
        let set = message_bytes(0x01, b"foo", b"hello world");
        let get = message_bytes(0x00, b"foo", b"");
        let mut combined = set.clone();
        combined.extend_from_slice(&get);

        let mut pending = Chain::from_bytes(Bytes::from(combined));
        let first = next_message(&mut pending).unwrap().expect("set message");
        assert_eq!(first.to_vec(), set);

        let second = next_message(&mut pending).unwrap().expect("get message");
        assert_eq!(second.to_vec(), get);

        assert_eq!(next_message(&mut pending).unwrap(), None);
    }

    /// The same message split across a node boundary that lands
    /// mid-message rather than on a message boundary.
    #[test]
    fn splits_a_message_straddling_node_boundary_without_copying() {
        let full = message_bytes(0x01, b"foo", b"hello world");
        let mut pending = Chain::new();
        pending.push_back(ringcache_buf::Segment::from_bytes(Bytes::from(full[..10].to_vec())));
        pending.push_back(ringcache_buf::Segment::from_bytes(Bytes::from(full[10..].to_vec())));

        let message = next_message(&mut pending).unwrap().expect("complete message");
        assert_eq!(message.to_vec(), full);
        assert_eq!(pending.chain_len(), 0);
    }

    #[test]
    fn preserves_leftover_bytes_after_the_last_complete_message() {
        let full = message_bytes(0x01, b"foo", b"hello world");
        let mut trailing = full.clone();
        trailing.extend_from_slice(b"\x80\x00"); // start of a second, incomplete message

        let mut pending = Chain::from_bytes(Bytes::from(trailing));
        let message = next_message(&mut pending).unwrap().expect("complete message");
        assert_eq!(message.to_vec(), full);
        assert_eq!(next_message(&mut pending).unwrap(), None);
        assert_eq!(pending.to_vec(), b"\x80\x00");
    }

    #[test]
    fn non_binary_magic_is_protocol_fatal() {
        let mut bytes = message_bytes(0x01, b"foo", b"bar");
        bytes[0] = 0x00;
        let mut pending = Chain::from_bytes(Bytes::from(bytes));
        assert_eq!(next_message(&mut pending), Err(DecodeError::NotBinaryProtocol));
    }
}
