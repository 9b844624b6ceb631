//! Receiving ICMPv6 echo replies.
//!
//! An echo socket records the requests it sent with [`Socket::note_request`]: the device they left
//! through and the identifier they carry. Each recorded request entitles the socket to receive one
//! reply carrying the same identifier from the same device.
//!
//! ## Receiving
//!
//! A reply arriving while a receive call waits on its socket is handed over directly. The waiting
//! call registered an interest in the events of its device and the device polling thread copies
//! the reply into that registration before waking the caller. A reply arriving while nobody waits
//! is queued on the socket in a read-ahead queue, and the next receive call takes it without
//! waiting at all.
//!
//! Both ways deliver the complete ICMPv6 message, echo header included. A receive buffer shorter
//! than the message silently truncates it.
//!
//! ## Matching
//!
//! Replies are matched by device and echo identifier only. With several requests outstanding a
//! reply can not be attributed to a particular one of them; the sequence number is not checked.
//!
//! Once all requests were answered the socket returns to its pristine state: it forgets the device
//! and identifier and discards replies still buffered.
//!
//! [`Socket::note_request`]: struct.Socket.html#method.note_request
mod callback;
mod conn;
mod input;
mod recv;
mod socket;
#[cfg(test)]
mod tests;

pub(crate) use self::callback::Callbacks;
pub(crate) use self::conn::{Connection, Connections};

pub use self::socket::Socket;
