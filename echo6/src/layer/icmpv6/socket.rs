use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::nic::DeviceId;
use crate::stack::{Network, Tables};

use super::conn::ConnId;

/// An ICMPv6 echo socket.
///
/// Created with [`Network::socket`]. The socket may be shared between threads, but only one of them
/// may wait for a reply at any time; a concurrent receive call fails with `Busy`.
///
/// [`Network::socket`]: ../../stack/struct.Network.html#method.socket
pub struct Socket {
    net: Arc<Network>,
    pub(crate) conn: ConnId,
}

impl Socket {
    pub(crate) fn new(net: Arc<Network>, conn: ConnId) -> Self {
        Socket { net, conn }
    }

    /// The network the socket belongs to.
    pub fn network(&self) -> &Arc<Network> {
        &self.net
    }

    /// Record an echo request with identifier `ident` sent through `device`.
    ///
    /// Every recorded request permits one reply to be received. The socket is bound to the device
    /// and expects replies with this identifier from now on.
    pub fn note_request(&self, device: DeviceId, ident: u16) {
        let mut tables = self.net.lock();
        tables.conns[self.conn].note_request(device, ident);
        net_trace!("{:?}: request {:#06x} on {}, {} outstanding",
            self.conn, ident, device, tables.conns[self.conn].outstanding());
    }

    /// Set the receive timeout. `None` and a zero duration wait indefinitely.
    pub fn set_recv_timeout(&self, timeout: Option<Duration>) {
        let timeout = timeout.unwrap_or(Duration::ZERO);
        self.net.lock().conns[self.conn].set_recv_timeout(timeout);
    }

    /// The receive timeout, `None` if receiving waits indefinitely.
    pub fn recv_timeout(&self) -> Option<Duration> {
        let timeout = self.net.lock().conns[self.conn].recv_timeout();
        Some(timeout).filter(|timeout| *timeout != Duration::ZERO)
    }

    /// The number of requests still expecting a reply.
    pub fn outstanding(&self) -> usize {
        self.net.lock().conns[self.conn].outstanding()
    }

    /// The identifier replies are expected to carry.
    pub fn expected_id(&self) -> u16 {
        self.net.lock().conns[self.conn].expected_id()
    }

    /// The device the socket sent its requests on.
    pub fn bound_device(&self) -> Option<DeviceId> {
        self.net.lock().conns[self.conn].bound_device()
    }

    /// The number of replies buffered for later receive calls.
    pub fn readahead_len(&self) -> usize {
        self.net.lock().conns[self.conn].readahead().len()
    }

    /// Check if a receive call is waiting for a reply.
    pub fn is_receiving(&self) -> bool {
        self.net.lock().conns[self.conn].receiver().is_some()
    }

    /// Wake up the receive call waiting on this socket, failing it with `Interrupted`.
    ///
    /// Returns `false` if no call was waiting or it had already been completed.
    pub fn interrupt(&self) -> bool {
        let mut tables = self.net.lock();
        let Tables { conns, callbacks, .. } = &mut *tables;
        let interrupted = match conns[self.conn].receiver() {
            Some(handle) => callbacks.interrupt(handle),
            None => false,
        };
        drop(tables);

        if interrupted {
            net_debug!("{:?}: receive interrupted", self.conn);
            self.net.signal().notify_all();
        }
        interrupted
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        let mut tables = self.net.lock();
        let Tables { pool, conns, .. } = &mut *tables;
        if let Some(connection) = conns.close(self.conn) {
            connection.close(pool);
        }
        net_debug!("closed echo socket {:?}", self.conn);
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Socket")
            .field("conn", &self.conn)
            .finish()
    }
}
