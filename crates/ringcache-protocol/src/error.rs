use thiserror::Error;

/// Reasons a byte chain known to be one complete message (per the framer)
/// still fails to decode as a binary protocol request. All are
/// protocol-fatal: the caller closes the session.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("message shorter than the 24-byte header")]
    TooShort,
    #[error("first byte of message was not the binary protocol magic 0x80")]
    NotBinaryProtocol,
    #[error("opcode {0:#04x} is not a recognized binary protocol opcode")]
    UnknownOpcode(u8),
}
