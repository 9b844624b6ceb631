//! The `sockaddr_in6` layout handed to receivers.
//!
//! Family is stored in native byte order, as the C library does, while the port and flow
//! information use network byte order.
use std::net::{Ipv6Addr, SocketAddrV6};

use byteorder::{ByteOrder, NativeEndian, NetworkEndian};

use super::{Error, Result};

/// The encoded length of an IPv6 socket address.
pub const SOCKADDR_IN6_LEN: usize = field::SCOPE_ID.end;

mod field {
    use crate::wire::field::Field;

    pub(super) const FAMILY:   Field = 0..2;
    pub(super) const PORT:     Field = 2..4;
    pub(super) const FLOWINFO: Field = 4..8;
    pub(super) const ADDR:     Field = 8..24;
    pub(super) const SCOPE_ID: Field = 24..28;
}

fn family() -> u16 {
    libc::AF_INET6 as u16
}

/// Write `addr` into the first `SOCKADDR_IN6_LEN` bytes of `buffer`.
///
/// # Panics
/// This function panics if the buffer is shorter than `SOCKADDR_IN6_LEN`.
pub fn emit(addr: &SocketAddrV6, buffer: &mut [u8]) {
    let buffer = &mut buffer[..SOCKADDR_IN6_LEN];
    NativeEndian::write_u16(&mut buffer[field::FAMILY], family());
    NetworkEndian::write_u16(&mut buffer[field::PORT], addr.port());
    NetworkEndian::write_u32(&mut buffer[field::FLOWINFO], addr.flowinfo());
    buffer[field::ADDR].copy_from_slice(&addr.ip().octets());
    NativeEndian::write_u32(&mut buffer[field::SCOPE_ID], addr.scope_id());
}

/// Read a socket address from its encoded form.
pub fn parse(buffer: &[u8]) -> Result<SocketAddrV6> {
    if buffer.len() < SOCKADDR_IN6_LEN {
        return Err(Error::Truncated);
    }

    if NativeEndian::read_u16(&buffer[field::FAMILY]) != family() {
        return Err(Error::Malformed);
    }

    let mut octets = [0; 16];
    octets.copy_from_slice(&buffer[field::ADDR]);

    Ok(SocketAddrV6::new(
        Ipv6Addr::from(octets),
        NetworkEndian::read_u16(&buffer[field::PORT]),
        NetworkEndian::read_u32(&buffer[field::FLOWINFO]),
        NativeEndian::read_u32(&buffer[field::SCOPE_ID]),
    ))
}

/// Caller owned storage for the source address of a received message.
///
/// Mirrors the `(addr, addrlen)` pair of the socket interface: the capacity is fixed by the
/// borrowed buffer while the length is updated to the number of meaningful bytes.
#[derive(Debug)]
pub struct SockAddrBuf<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> SockAddrBuf<'a> {
    /// Wrap an output buffer. Its full length is the capacity.
    pub fn new(buf: &'a mut [u8]) -> Self {
        SockAddrBuf { buf, len: 0 }
    }

    /// The number of bytes the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// The number of bytes written by the last receive.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if no address has been written.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The written part of the buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Decode the written address.
    pub fn socket_addr(&self) -> Result<SocketAddrV6> {
        parse(self.as_bytes())
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut [u8] {
        &mut *self.buf
    }

    pub(crate) fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.buf.len());
        self.len = len;
    }

    /// Encode `addr` at the start of the buffer.
    ///
    /// Callers check the capacity before writing.
    pub(crate) fn write(&mut self, addr: &SocketAddrV6) {
        emit(addr, &mut *self.buf);
        self.len = SOCKADDR_IN6_LEN;
    }
}
