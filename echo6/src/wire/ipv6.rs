//! The fixed IPv6 header.
//!
//! Echo replies arrive as raw IPv6 packets without any extension headers. Only the parts of the
//! header the receive path inspects are exposed: the version, the payload length, the next header
//! and the two addresses.
use core::fmt;
use std::net::Ipv6Addr;

use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result};
use super::field::Field;

/// Length of the fixed IPv6 header, without any extension headers.
pub const HEADER_LEN: usize = field::DST_ADDR.end;

/// Hop limit of the packets built by this crate.
const DEFAULT_HOP_LIMIT: u8 = 64;

/// A sixteen-octet IPv6 address, in network byte order.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Address(pub [u8; 16]);

enum_with_unknown! {
    /// The next header field of an IPv6 header.
    pub doc enum Protocol(u8) {
        /// Internet control message protocol for IPv6.
        Icmpv6 = 0x3a,
    }
}

impl Address {
    /// The [loopback address] `::1`.
    ///
    /// [loopback address]: https://tools.ietf.org/html/rfc4291#section-2.5.3
    pub const LOOPBACK: Address = Address(Ipv6Addr::LOCALHOST.octets());

    /// Construct an address from its eight 16-bit groups.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        a0: u16, a1: u16, a2: u16, a3: u16,
        a4: u16, a5: u16, a6: u16, a7: u16,
    ) -> Address {
        Ipv6Addr::new(a0, a1, a2, a3, a4, a5, a6, a7).into()
    }

    /// The octets of the address.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Ipv6Addr> for Address {
    fn from(addr: Ipv6Addr) -> Address {
        Address(addr.octets())
    }
}

impl From<Address> for Ipv6Addr {
    fn from(Address(octets): Address) -> Ipv6Addr {
        octets.into()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&Ipv6Addr::from(*self), f)
    }
}

byte_wrapper! {
    /// A byte sequence representing an IPv6 packet.
    #[derive(Debug, PartialEq, Eq)]
    pub struct ipv6([u8]);
}

// The fixed header, see https://tools.ietf.org/html/rfc8200#section-3
//
//  0      4       12                     32
// +------+--------+----------------------+
// | ver  | class  |      flow label      |
// +------+--------+-------+--------------+
// |  payload length       | next | hops  |
// +-----------------------+------+-------+
// |       source address (16 octets)     |
// +--------------------------------------+
// |    destination address (16 octets)   |
// +--------------------------------------+
mod field {
    use crate::wire::field::Field;

    pub(super) const VER_TC_FLOW: Field = 0..4;
    pub(super) const LENGTH: Field = 4..6;
    pub(super) const NXT_HDR: usize = 6;
    pub(super) const HOP_LIMIT: usize = 7;
    pub(super) const SRC_ADDR: Field = 8..24;
    pub(super) const DST_ADDR: Field = 24..40;
}

impl ipv6 {
    /// Treat a buffer as an IPv6 packet without checking its length.
    #[inline]
    pub fn new_unchecked(buffer: &[u8]) -> &Self {
        Self::__from_macro_new_unchecked(buffer)
    }

    /// Treat a mutable buffer as an IPv6 packet without checking its length.
    #[inline]
    pub fn new_unchecked_mut(buffer: &mut [u8]) -> &mut Self {
        Self::__from_macro_new_unchecked_mut(buffer)
    }

    /// Treat a buffer as an IPv6 packet, failing if it is shorter than the packet claims.
    pub fn new_checked(buffer: &[u8]) -> Result<&Self> {
        let packet = Self::new_unchecked(buffer);
        packet.check_len()?;
        Ok(packet)
    }

    /// Return `Err(Error::Truncated)` unless the buffer holds the header and the whole payload.
    ///
    /// Trailing bytes after the payload are allowed.
    pub fn check_len(&self) -> Result<()> {
        if self.0.len() < HEADER_LEN || self.0.len() < self.payload_end() {
            return Err(Error::Truncated);
        }
        Ok(())
    }

    /// The version nibble, 6 for every valid packet.
    #[inline]
    pub fn version(&self) -> u8 {
        self.0[field::VER_TC_FLOW.start] >> 4
    }

    /// The payload length field.
    #[inline]
    pub fn payload_len(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::LENGTH])
    }

    /// The protocol of the payload.
    #[inline]
    pub fn next_header(&self) -> Protocol {
        self.0[field::NXT_HDR].into()
    }

    /// The remaining hop limit.
    #[inline]
    pub fn hop_limit(&self) -> u8 {
        self.0[field::HOP_LIMIT]
    }

    /// The address of the sender.
    #[inline]
    pub fn src_addr(&self) -> Address {
        self.address(field::SRC_ADDR)
    }

    /// The address of the receiver.
    #[inline]
    pub fn dst_addr(&self) -> Address {
        self.address(field::DST_ADDR)
    }

    /// The payload, as far as the payload length field covers it.
    pub fn payload_slice(&self) -> &[u8] {
        &self.0[HEADER_LEN..self.payload_end()]
    }

    /// The payload for writing, as far as the payload length field covers it.
    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        let end = self.payload_end();
        &mut self.0[HEADER_LEN..end]
    }

    fn payload_end(&self) -> usize {
        HEADER_LEN + usize::from(self.payload_len())
    }

    fn address(&self, range: Field) -> Address {
        let mut octets = [0; 16];
        octets.copy_from_slice(&self.0[range]);
        Address(octets)
    }
}

/// The fields of a fixed IPv6 header.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Repr {
    /// Address of the sender.
    pub src_addr: Address,
    /// Address of the receiver.
    pub dst_addr: Address,
    /// Protocol of the payload.
    pub next_header: Protocol,
    /// Length of the payload.
    pub payload_len: u16,
    /// Remaining hop limit.
    pub hop_limit: u8,
}

impl Repr {
    /// Read the header of a packet.
    ///
    /// Returns `Error::Malformed` for anything other than version 6.
    pub fn parse(packet: &ipv6) -> Result<Repr> {
        packet.check_len()?;
        if packet.version() != 6 {
            return Err(Error::Malformed);
        }

        Ok(Repr {
            src_addr: packet.src_addr(),
            dst_addr: packet.dst_addr(),
            next_header: packet.next_header(),
            payload_len: packet.payload_len(),
            hop_limit: packet.hop_limit(),
        })
    }

    /// A header for a packet carrying `payload_len` bytes of `next_header`.
    ///
    /// Returns `Error::Malformed` if the payload would need a jumbogram.
    pub fn new(src_addr: Address, dst_addr: Address, next_header: Protocol, payload_len: usize)
        -> Result<Repr>
    {
        let payload_len = u16::try_from(payload_len)
            .map_err(|_| Error::Malformed)?;
        Ok(Repr {
            src_addr,
            dst_addr,
            next_header,
            payload_len,
            hop_limit: DEFAULT_HOP_LIMIT,
        })
    }

    /// The length of the whole packet described by this header.
    pub fn total_len(&self) -> usize {
        HEADER_LEN + usize::from(self.payload_len)
    }

    /// Write the header to the start of `packet`.
    ///
    /// Traffic class and flow label are zero.
    pub fn emit(&self, packet: &mut ipv6) {
        let bytes = &mut packet.0;
        NetworkEndian::write_u32(&mut bytes[field::VER_TC_FLOW], 6 << 28);
        NetworkEndian::write_u16(&mut bytes[field::LENGTH], self.payload_len);
        bytes[field::NXT_HDR] = self.next_header.into();
        bytes[field::HOP_LIMIT] = self.hop_limit;
        bytes[field::SRC_ADDR].copy_from_slice(self.src_addr.as_bytes());
        bytes[field::DST_ADDR].copy_from_slice(self.dst_addr.as_bytes());
    }
}
