use std::net::{SocketAddr, UdpSocket};

use tracing::{info, warn};

/// Reacts to a parsed control-channel command. This is an operator-facing
/// debug shim, not part of the cache contract: the built-in implementation
/// just logs what it received. A deployment wanting real behavior (e.g.
/// per-core power-state tuning) implements this trait and passes it to
/// [`run`].
pub trait ControlHandler: Send + 'static {
    fn handle(&self, verb: &str, param: i64);
}

/// Logs every command at `info` and does nothing else.
pub struct LoggingControlHandler;

impl ControlHandler for LoggingControlHandler {
    fn handle(&self, verb: &str, param: i64) {
        info!(verb, param, "control command received");
    }
}

/// Splits a `<verb>,<param>` datagram: everything before the first comma
/// is the verb, everything after is parsed as an integer parameter (`0`
/// if it isn't one, matching C's `atoi` non-fatal default on unparsable
/// input).
fn parse_command(datagram: &str) -> Option<(&str, i64)> {
    let (verb, param) = datagram.split_once(',')?;
    let param = param.trim().parse().unwrap_or(0);
    Some((verb, param))
}

/// Binds the UDP control channel and services it in a blocking loop until
/// the socket errors. Intended to be the body of its own dedicated
/// thread — unlike the TCP cache listener, the control channel isn't on
/// the hot path, so there's no need for `mio` here.
pub fn run(addr: SocketAddr, handler: impl ControlHandler) -> std::io::Result<()> {
    let socket = UdpSocket::bind(addr)?;
    info!(%addr, "control channel listening");

    let mut buf = [0u8; 512];
    loop {
        let (n, from) = socket.recv_from(&mut buf)?;
        let datagram = String::from_utf8_lossy(&buf[..n]);
        match parse_command(&datagram) {
            Some((verb, param)) => handler.handle(verb, param),
            None => warn!(%from, %datagram, "malformed control datagram"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verb_and_integer_param() {
        assert_eq!(parse_command("cpu_config_write,0"), Some(("cpu_config_write", 0)));
        assert_eq!(parse_command("cpu_config_read,3"), Some(("cpu_config_read", 3)));
    }

    #[test]
    fn non_numeric_param_defaults_to_zero() {
        assert_eq!(parse_command("some_verb,not_a_number"), Some(("some_verb", 0)));
    }

    #[test]
    fn missing_comma_is_rejected() {
        assert_eq!(parse_command("no_comma_here"), None);
    }
}
