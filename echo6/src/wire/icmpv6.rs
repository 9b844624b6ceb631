//! ICMPv6 messages and the echo header.
//!
//! Only echo requests and replies are given a representation. Every other message type can be
//! named through [`Message`] but is rejected by [`EchoRepr::parse`].
//!
//! [`Message`]: enum.Message.html
//! [`EchoRepr::parse`]: struct.EchoRepr.html#method.parse
use core::fmt;
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result};
use super::ipv6::{self, Address, Protocol};

/// Length of the ICMPv6 echo header.
///
/// This is also the smallest buffer a receiver may offer for an echo reply.
pub const HEADER_LEN: usize = field::HEADER_END;

enum_with_unknown! {
    /// Internet protocol control message type.
    pub doc enum Message(u8) {
        /// Destination Unreachable.
        DstUnreachable  = 0x01,
        /// Packet Too Big.
        PktTooBig       = 0x02,
        /// Time Exceeded.
        TimeExceeded    = 0x03,
        /// Parameter Problem.
        ParamProblem    = 0x04,
        /// Echo Request
        EchoRequest     = 0x80,
        /// Echo Reply
        EchoReply       = 0x81,
        /// Multicast Listener Query
        MldQuery        = 0x82,
        /// Router Solicitation
        RouterSolicit   = 0x85,
        /// Router Advertisement
        RouterAdvert    = 0x86,
        /// Neighbor Solicitation
        NeighborSolicit = 0x87,
        /// Neighbor Advertisement
        NeighborAdvert  = 0x88,
        /// Redirect
        Redirect        = 0x89,
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Message::DstUnreachable  => write!(f, "destination unreachable"),
            Message::PktTooBig       => write!(f, "packet too big"),
            Message::TimeExceeded    => write!(f, "time exceeded"),
            Message::ParamProblem    => write!(f, "parameter problem"),
            Message::EchoRequest     => write!(f, "echo request"),
            Message::EchoReply       => write!(f, "echo reply"),
            Message::MldQuery        => write!(f, "multicast listener query"),
            Message::RouterSolicit   => write!(f, "router solicitation"),
            Message::RouterAdvert    => write!(f, "router advertisement"),
            Message::NeighborSolicit => write!(f, "neighbor solicitation"),
            Message::NeighborAdvert  => write!(f, "neighbor advert"),
            Message::Redirect        => write!(f, "redirect"),
            Message::Unknown(id)     => write!(f, "{}", id)
        }
    }
}

byte_wrapper! {
    /// A byte sequence representing an ICMPv6 message.
    #[derive(Debug, PartialEq, Eq)]
    pub struct icmpv6([u8]);
}

mod field {
    use crate::wire::field::Field;

    pub(super) const TYPE:       usize = 0;
    pub(super) const CODE:       usize = 1;
    pub(super) const CHECKSUM:   Field = 2..4;

    pub(super) const ECHO_IDENT: Field = 4..6;
    pub(super) const ECHO_SEQNO: Field = 6..8;

    pub(super) const HEADER_END: usize = 8;
}

impl icmpv6 {
    /// Imbue a raw octet buffer with ICMPv6 message structure.
    pub fn new_unchecked(buffer: &[u8]) -> &icmpv6 {
        Self::__from_macro_new_unchecked(buffer)
    }

    /// Imbue a mutable octet buffer with ICMPv6 message structure.
    pub fn new_unchecked_mut(buffer: &mut [u8]) -> &mut icmpv6 {
        Self::__from_macro_new_unchecked_mut(buffer)
    }

    /// Shorthand for a combination of [new_unchecked] and [check_len].
    ///
    /// [new_unchecked]: #method.new_unchecked
    /// [check_len]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&icmpv6> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// Unwrap the packet as a raw byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Ensure that no accessor method will panic if called.
    /// Returns `Err(Error::Truncated)` if the buffer is too short.
    pub fn check_len(&self) -> Result<()> {
        if self.0.len() < field::HEADER_END {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// Return the message type field.
    #[inline]
    pub fn msg_type(&self) -> Message {
        Message::from(self.0[field::TYPE])
    }

    /// Return the message code field.
    #[inline]
    pub fn msg_code(&self) -> u8 {
        self.0[field::CODE]
    }

    /// Return the checksum field.
    #[inline]
    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::CHECKSUM])
    }

    /// Return the identifier field (for echo request and reply packets).
    #[inline]
    pub fn echo_ident(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::ECHO_IDENT])
    }

    /// Return the sequence number field (for echo request and reply packets).
    #[inline]
    pub fn echo_seq_no(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::ECHO_SEQNO])
    }

    /// Set the message type field.
    #[inline]
    pub fn set_msg_type(&mut self, value: Message) {
        self.0[field::TYPE] = value.into();
    }

    /// Set the message code field.
    #[inline]
    pub fn set_msg_code(&mut self, value: u8) {
        self.0[field::CODE] = value;
    }

    /// Set the checksum field.
    #[inline]
    pub fn set_checksum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::CHECKSUM], value);
    }

    /// Set the identifier field (for echo request and reply packets).
    #[inline]
    pub fn set_echo_ident(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::ECHO_IDENT], value);
    }

    /// Set the sequence number field (for echo request and reply packets).
    #[inline]
    pub fn set_echo_seq_no(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::ECHO_SEQNO], value);
    }

    /// Return the payload as a byte slice.
    pub fn payload_slice(&self) -> &[u8] {
        &self.0[field::HEADER_END..]
    }

    /// Return the payload as a mutable byte slice.
    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0[field::HEADER_END..]
    }
}

impl AsRef<[u8]> for icmpv6 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A high-level representation of an echo request or reply header.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct EchoRepr {
    /// Either `Message::EchoRequest` or `Message::EchoReply`.
    pub message: Message,
    /// The identifier correlating requests with replies.
    pub ident: u16,
    /// The sequence number of the request.
    pub seq_no: u16,
}

impl EchoRepr {
    /// Parse an echo message.
    ///
    /// Returns `Error::Unrecognized` for all other message types. The checksum is not verified.
    pub fn parse(packet: &icmpv6) -> Result<EchoRepr> {
        packet.check_len()?;
        match packet.msg_type() {
            message @ Message::EchoRequest | message @ Message::EchoReply => {
                if packet.msg_code() != 0 {
                    return Err(Error::Malformed);
                }

                Ok(EchoRepr {
                    message,
                    ident: packet.echo_ident(),
                    seq_no: packet.echo_seq_no(),
                })
            },
            _ => Err(Error::Unrecognized),
        }
    }

    /// Return the length of the message header.
    pub fn buffer_len(&self) -> usize {
        HEADER_LEN
    }

    /// Emit the header into a message buffer, leaving the payload untouched.
    ///
    /// The checksum field is cleared.
    pub fn emit(&self, packet: &mut icmpv6) {
        packet.set_msg_type(self.message);
        packet.set_msg_code(0);
        packet.set_checksum(0);
        packet.set_echo_ident(self.ident);
        packet.set_echo_seq_no(self.seq_no);
    }

    /// Build a complete IPv6 packet carrying this echo message and `payload`.
    ///
    /// Returns `Error::Malformed` if the message does not fit into an IPv6 packet without a jumbo
    /// payload option.
    pub fn frame(&self, src_addr: Address, dst_addr: Address, payload: &[u8]) -> Result<Vec<u8>> {
        let ip_repr = ipv6::Repr::new(
            src_addr, dst_addr, Protocol::Icmpv6, self.buffer_len() + payload.len())?;

        let mut buffer = vec![0; ip_repr.total_len()];
        let packet = ipv6::ipv6::new_unchecked_mut(&mut buffer);
        ip_repr.emit(packet);

        let message = icmpv6::new_unchecked_mut(packet.payload_mut_slice());
        self.emit(message);
        message.payload_mut_slice().copy_from_slice(payload);
        Ok(buffer)
    }
}
