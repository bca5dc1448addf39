//! Stream framer and per-connection session driver, plus the
//! non-blocking `mio` transport that drives them.
//!
//! [`framer::next_message`] turns a connection's accumulated receive
//! chain into zero-copy message-sized chains. [`Session`] decodes each
//! one, dispatches it against a shared [`ringcache_table::Table`], and
//! batches the replies produced within one receive callback into a single
//! outbound chain. [`tcp::Worker`] owns the per-thread `mio::Poll` and the
//! `Session`s pinned to it.

mod error;
mod framer;
mod session;
pub mod tcp;

pub use error::SessionError;
pub use framer::next_message;
pub use session::{Session, SessionOutcome};
