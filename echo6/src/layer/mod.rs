//! The process logic of protocol layers.
//!
//! ## Layering
//!
//! Each protocol layer is split into two parts; the packet logic contained in `wire` and the
//! processing part in this module. A connection represents the local state of a protocol socket.
//! Its state is owned by the [`Network`] and only mutated while holding the network lock, either
//! by a receive call on the socket or by a device delivering packets.
//!
//! ## Receiving
//!
//! Packets enter through device polling and are matched against the connections. A matching packet
//! is either handed directly to a receive call blocked on the connection or, when nobody waits,
//! queued for a later call. See the [`icmpv6`] module for the details of echo replies.
//!
//! [`Network`]: ../stack/struct.Network.html
//! [`icmpv6`]: icmpv6/index.html
pub mod icmpv6;

/// The result type of socket operations.
pub type Result<T> = core::result::Result<T, Error>;

/// The error type of socket operations.
///
/// Every variant corresponds to a classic errno value, see [`errno`](#method.errno).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Error {
    /// An argument was missing or too small.
    ///
    /// Returned for receive buffers shorter than the echo header and address outputs that can not
    /// hold an IPv6 socket address.
    #[error("invalid argument")]
    InvalidArgument,

    /// The socket is not in a state where a reply is expected.
    ///
    /// No request is outstanding or the socket was never bound to a device.
    #[error("no echo request outstanding")]
    Protocol,

    /// The device the socket is bound to went down.
    #[error("network is unreachable")]
    NetUnreachable,

    /// The action could not be completed because there were not enough resources.
    ///
    /// Returned when the registration or connection table is full or a pool can not hold a
    /// message.
    #[error("resources exhausted")]
    Exhausted,

    /// A buffered message could not be read back.
    #[error("buffered message is corrupted")]
    Corrupted,

    /// No buffered message is available.
    #[error("no data available")]
    NoData,

    /// The receive timeout passed without a reply.
    #[error("timed out")]
    TimedOut,

    /// The receive call was interrupted.
    #[error("interrupted")]
    Interrupted,

    /// Another receive call is already waiting on the socket.
    #[error("socket busy")]
    Busy,
}

impl Error {
    /// The positive errno value of the error.
    pub fn errno(self) -> i32 {
        match self {
            Error::InvalidArgument => libc::EINVAL,
            Error::Protocol => libc::EPROTO,
            Error::NetUnreachable => libc::ENETUNREACH,
            Error::Exhausted => libc::ENOMEM,
            Error::Corrupted => libc::EIO,
            Error::NoData => libc::ENODATA,
            Error::TimedOut => libc::ETIMEDOUT,
            Error::Interrupted => libc::EINTR,
            Error::Busy => libc::EBUSY,
        }
    }
}

/// Can convert from a wire error.
///
/// This indicates some layer tried to operate on a packet but failed.
impl From<crate::wire::Error> for Error {
    fn from(_: crate::wire::Error) -> Self {
        Error::InvalidArgument
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn errno_values() {
        assert_eq!(Error::InvalidArgument.errno(), libc::EINVAL);
        assert_eq!(Error::TimedOut.errno(), libc::ETIMEDOUT);
        assert_eq!(Error::Busy.errno(), libc::EBUSY);
        assert_eq!(Error::NetUnreachable.to_string(), "network is unreachable");
    }
}
