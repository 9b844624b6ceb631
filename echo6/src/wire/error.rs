/// The error type for parsing of the network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Error {
    /// An incoming packet could not be parsed because it was shorter than assumed.
    ///
    /// The packet may be shorter than the minimum length specified, a size longer than the actual
    /// payload. For variable length packets, this may be because some of its fields were out of
    /// bounds of the received data.
    #[error("truncated packet")]
    Truncated,

    /// An incoming packet could not be recognized and was dropped.
    ///
    /// E.g. an IPv6 packet carrying some other upper layer protocol or an ICMPv6 message that is
    /// not an echo reply. In most settings this is not fatal, the packet is simply not meant for
    /// the echo sockets.
    #[error("unrecognized packet")]
    Unrecognized,

    /// An incoming packet was recognized but was self-contradictory.
    ///
    /// Examples: an IPv6 header whose version field is not 6; a socket address with a family
    /// other than `AF_INET6`.
    #[error("malformed packet")]
    Malformed,
}

/// The result type for the networking stack.
pub type Result<T> = core::result::Result<T, Error>;
