/// Binary protocol opcodes this server understands.
///
/// `NotSupported` covers the value-mutation family (ADD, REPLACE, DELETE,
/// INCR, DECR, APPEND, PREPEND) that the original source terminated the
/// session on; per the Design Notes these should instead draw a
/// `NOT_SUPPORTED` response rather than killing the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Get,
    Set,
    Quit,
    Flush,
    GetQ,
    Noop,
    GetK,
    GetKQ,
    SetQ,
    QuitQ,
    FlushQ,
    NotSupported,
}

impl Opcode {
    pub fn from_byte(b: u8) -> Option<Opcode> {
        Some(match b {
            0x00 => Opcode::Get,
            0x01 => Opcode::Set,
            0x07 => Opcode::Quit,
            0x08 => Opcode::Flush,
            0x09 => Opcode::GetQ,
            0x0A => Opcode::Noop,
            0x0C => Opcode::GetK,
            0x0D => Opcode::GetKQ,
            0x11 => Opcode::SetQ,
            0x14 => Opcode::QuitQ,
            0x18 => Opcode::FlushQ,
            // ADD, REPLACE, DELETE, INCR, DECR, APPEND, PREPEND
            0x02 | 0x03 | 0x04 | 0x05 | 0x06 | 0x0E | 0x0F => Opcode::NotSupported,
            _ => return None,
        })
    }

    /// For diagnostics only (`tracing` fields on protocol errors), not wire
    /// behavior — carried over from the original's `com2str` table.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Get => "GET",
            Opcode::Set => "SET",
            Opcode::Quit => "QUIT",
            Opcode::Flush => "FLUSH",
            Opcode::GetQ => "GETQ",
            Opcode::Noop => "NOOP",
            Opcode::GetK => "GETK",
            Opcode::GetKQ => "GETKQ",
            Opcode::SetQ => "SETQ",
            Opcode::QuitQ => "QUITQ",
            Opcode::FlushQ => "FLUSHQ",
            Opcode::NotSupported => "NOT_SUPPORTED",
        }
    }

    pub fn is_quiet(self) -> bool {
        matches!(self, Opcode::GetQ | Opcode::GetKQ | Opcode::SetQ | Opcode::QuitQ | Opcode::FlushQ)
    }

    pub fn is_get_family(self) -> bool {
        matches!(self, Opcode::Get | Opcode::GetQ | Opcode::GetK | Opcode::GetKQ)
    }

    pub fn echoes_key_on_hit(self) -> bool {
        matches!(self, Opcode::GetK | Opcode::GetKQ)
    }

    pub fn closes_session(self) -> bool {
        matches!(self, Opcode::Quit | Opcode::QuitQ)
    }
}
