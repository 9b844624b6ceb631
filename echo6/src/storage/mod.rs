//! Buffer memory shared by all connections of a network.
//!
//! Received messages that no receiver is waiting for are kept in a segmented [`Pool`] and queued
//! per connection in a [`Readahead`] until a later receive call drains them.
//!
//! [`Pool`]: struct.Pool.html
//! [`Readahead`]: struct.Readahead.html
mod pool;
mod readahead;

pub use self::pool::{Chain, Pool};
pub use self::readahead::Readahead;
