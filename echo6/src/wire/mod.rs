/*! Low-level packet access and construction.

The `wire` module deals with the packet *representation*. Only the small part of IPv6 that the echo
sockets need is modelled here: the fixed IPv6 header, the ICMPv6 echo header and the socket
address layout handed back to receivers.

 * The lowercase structures, [`ipv6`] and [`icmpv6`], are dynamically sized wrappers around
   sequences of octets. They extract fields from and insert fields into the underlying bytes.
 * The `Repr` structures are compact, high-level representations of header data that can be
   emitted into a sequence of octets.

A lowercase wrapper guarantees that, if `check_len()` returned `Ok(())` (or it was created with
`new_checked`), then no field accessor or setter method will panic.

[`ipv6`]: ipv6/struct.ipv6.html
[`icmpv6`]: icmpv6/struct.icmpv6.html
*/
mod error;
pub mod icmpv6;
pub mod ipv6;
pub mod sockaddr;

pub use self::error::{Error, Result};

pub use self::ipv6::{
    Address as Ipv6Address,
    Protocol as IpProtocol,
};

pub use self::sockaddr::SockAddrBuf;

mod field {
    pub(crate) type Field = ::core::ops::Range<usize>;
}
