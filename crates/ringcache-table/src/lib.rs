//! Concurrent cache table and per-entry cached response.
//!
//! [`Table::find`] is lock-free: readers walk bucket chains without ever
//! taking `Table`'s write lock, which only serializes `set`/`clear`. Each
//! entry's [`GetResponse`] holds the cached `<extras, key, value>` view a
//! GET hit replays; `GetResponse::swap` publishes a new view atomically so
//! a reader that already cloned the old one never observes a torn update.

mod error;
mod response;
mod table;

pub use error::ConfigError;
pub use response::GetResponse;
pub use table::{Entry, Table};
