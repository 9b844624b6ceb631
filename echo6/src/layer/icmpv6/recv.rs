//! Receiving echo replies.
use std::net::SocketAddrV6;

use parking_lot::MutexGuard;

use crate::layer::{Error, Result};
use crate::nic::DeviceId;
use crate::stack::{Network, Tables};
use crate::time::Expiration;
use crate::wire::icmpv6::HEADER_LEN;
use crate::wire::sockaddr::{SockAddrBuf, SOCKADDR_IN6_LEN};

use super::callback::{Completion, Handle};
use super::conn::ConnId;
use super::Socket;

/// A registered receive call.
///
/// Dropping it removes the registration from the table, on every way out of the wait.
struct Armed<'a, 'g> {
    tables: &'a mut MutexGuard<'g, Tables>,
    conn: ConnId,
    handle: Handle,
}

impl Armed<'_, '_> {
    fn completed(&self) -> bool {
        self.tables.callbacks.result(self.handle).is_some()
    }

    /// Remove the registration, returning what it captured.
    fn finish(self) -> Option<Completion> {
        let mut this = self;
        this.release()
    }

    fn release(&mut self) -> Option<Completion> {
        let tables = &mut **self.tables;
        if let Some(conn) = tables.conns.get_mut(self.conn) {
            if conn.receiver() == Some(self.handle) {
                conn.set_receiver(None);
            }
        }
        tables.callbacks.unregister(self.handle)
    }
}

impl Drop for Armed<'_, '_> {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

impl Socket {
    /// Receive one echo reply.
    ///
    /// Takes the oldest buffered reply if there is one. Otherwise waits, up to the receive timeout,
    /// for a reply from the bound device carrying the expected identifier. The ICMPv6 message,
    /// header included, is copied into `buf` and truncated silently if it does not fit. Returns the
    /// number of bytes copied.
    ///
    /// If `from` is given the address of the sender is written to it.
    ///
    /// # Errors
    /// * `InvalidArgument` if `buf` can not hold an echo header or `from` can not hold an IPv6
    ///   socket address.
    /// * `Protocol` if no request is outstanding.
    /// * `Busy` if another call is already waiting on the socket.
    /// * `TimedOut`, `Interrupted` and `NetUnreachable` if the wait ended without a reply.
    /// * `Exhausted` if too many calls are waiting on the network.
    pub fn recv_from(&self, buf: &mut [u8], mut from: Option<&mut SockAddrBuf>) -> Result<usize> {
        if buf.len() < HEADER_LEN {
            return Err(Error::InvalidArgument);
        }

        if let Some(from) = from.as_deref() {
            if from.capacity() < SOCKADDR_IN6_LEN {
                return Err(Error::InvalidArgument);
            }
        }

        let network = self.network();
        let mut tables = network.lock();
        let result = recv_locked(network, &mut tables, self.conn, buf, from.as_deref_mut());

        let Tables { pool, conns, .. } = &mut *tables;
        conns[self.conn].reset_if_idle(pool);
        drop(tables);

        if let Err(err) = result {
            net_debug!("{:?}: receive failed: {}", self.conn, err);
        }
        result
    }

    /// Receive one echo reply, returning the byte count or a negated errno value.
    pub fn recv_from_raw(&self, buf: &mut [u8], from: Option<&mut SockAddrBuf>) -> isize {
        match self.recv_from(buf, from) {
            Ok(len) => len as isize,
            Err(err) => -(err.errno() as isize),
        }
    }

    /// Receive one echo reply together with the address of its sender.
    pub fn recv_with_addr(&self, buf: &mut [u8]) -> Result<(usize, SocketAddrV6)> {
        let mut storage = [0; SOCKADDR_IN6_LEN];
        let mut from = SockAddrBuf::new(&mut storage);
        let len = self.recv_from(buf, Some(&mut from))?;
        let addr = from.socket_addr()?;
        Ok((len, addr))
    }
}

fn recv_locked(
    network: &Network,
    tables: &mut MutexGuard<'_, Tables>,
    conn: ConnId,
    buf: &mut [u8],
    from: Option<&mut SockAddrBuf>,
) -> Result<usize> {
    let device = {
        let Tables { pool, conns, .. } = &mut **tables;
        let connection = &mut conns[conn];

        if connection.outstanding() < 1 {
            return Err(Error::Protocol);
        }

        if !connection.readahead().is_empty() {
            let len = connection.readahead_mut().drain(pool, buf, from)?;
            connection.consume_reply();
            net_trace!("{:?}: took buffered reply of {} bytes", conn, len);
            return Ok(len);
        }

        match connection.bound_device() {
            Some(device) => device,
            None => return Err(Error::Protocol),
        }
    };

    let completion = await_reply(network, tables, conn, device, buf.len())?;
    let len = match completion.result {
        Some(result) => result?,
        None => return Err(Error::TimedOut),
    };

    buf[..len].copy_from_slice(&completion.staged[..len]);
    if let (Some(from), Some(src)) = (from, completion.from) {
        from.write(&SocketAddrV6::new(src.into(), 0, 0, 0));
    }

    Ok(len)
}

/// Wait for a reply with the network lock released.
fn await_reply(
    network: &Network,
    tables: &mut MutexGuard<'_, Tables>,
    conn: ConnId,
    device: DeviceId,
    capacity: usize,
) -> Result<Completion> {
    if tables.conns[conn].receiver().is_some() {
        return Err(Error::Busy);
    }

    let handle = tables.callbacks.register(device, conn, capacity)?;
    tables.conns[conn].set_receiver(Some(handle));
    let expiration = Expiration::after(tables.conns[conn].recv_timeout());
    net_trace!("{:?}: waiting on {} until {:?}", conn, device, expiration);

    let armed = Armed { tables, conn, handle };
    while !armed.completed() {
        match expiration {
            Expiration::Never => network.signal().wait(armed.tables),
            Expiration::When(deadline) => {
                if network.signal().wait_until(armed.tables, deadline).timed_out() {
                    break;
                }
            },
        }
    }

    // A result captured concurrently with the timeout is still delivered.
    armed.finish().ok_or(Error::TimedOut)
}
