use core::ops;
use std::time::Duration;

use crate::layer::{Error, Result};
use crate::nic::DeviceId;
use crate::storage::{Pool, Readahead};

use super::callback::Handle;

/// Index of a connection in the connection table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ConnId(usize);

/// The state of one echo socket.
#[derive(Debug)]
pub(crate) struct Connection {
    /// Identifier carried by the requests of this socket and expected in replies.
    expected_id: u16,
    /// Requests sent for which no reply has been consumed yet.
    outstanding: usize,
    /// The device requests were sent on.
    bound_device: Option<DeviceId>,
    readahead: Readahead,
    recv_timeout: Duration,
    /// The registration of the receive call currently waiting, if any.
    receiver: Option<Handle>,
}

/// Fixed-capacity table of open connections.
#[derive(Debug)]
pub(crate) struct Connections {
    slots: Vec<Option<Connection>>,
}

impl Connection {
    pub(crate) fn new(recv_timeout: Duration) -> Self {
        Connection {
            expected_id: 0,
            outstanding: 0,
            bound_device: None,
            readahead: Readahead::new(),
            recv_timeout,
            receiver: None,
        }
    }

    /// Record a request sent on `device` with identifier `ident`.
    pub(crate) fn note_request(&mut self, device: DeviceId, ident: u16) {
        self.bound_device = Some(device);
        self.expected_id = ident;
        self.outstanding += 1;
    }

    /// Account for one reply handed to a receiver.
    pub(crate) fn consume_reply(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
    }

    /// Return to the pristine state once no request is outstanding.
    ///
    /// Buffered replies that nobody will ask for anymore go back to the pool.
    pub(crate) fn reset_if_idle(&mut self, pool: &mut Pool) {
        if self.outstanding > 0 {
            return;
        }

        if !self.readahead.is_empty() {
            net_trace!("discarding {} unclaimed replies", self.readahead.len());
        }

        self.expected_id = 0;
        self.bound_device = None;
        self.readahead.clear(pool);
    }

    pub(crate) fn close(mut self, pool: &mut Pool) {
        self.readahead.clear(pool);
    }

    pub(crate) fn expected_id(&self) -> u16 {
        self.expected_id
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub(crate) fn bound_device(&self) -> Option<DeviceId> {
        self.bound_device
    }

    pub(crate) fn readahead(&self) -> &Readahead {
        &self.readahead
    }

    pub(crate) fn readahead_mut(&mut self) -> &mut Readahead {
        &mut self.readahead
    }

    pub(crate) fn recv_timeout(&self) -> Duration {
        self.recv_timeout
    }

    pub(crate) fn set_recv_timeout(&mut self, timeout: Duration) {
        self.recv_timeout = timeout;
    }

    pub(crate) fn receiver(&self) -> Option<Handle> {
        self.receiver
    }

    pub(crate) fn set_receiver(&mut self, receiver: Option<Handle>) {
        self.receiver = receiver;
    }

    /// Check if an echo reply from `device` with identifier `ident` belongs here.
    pub(crate) fn expects(&self, device: DeviceId, ident: u16) -> bool {
        self.outstanding > 0
            && self.bound_device == Some(device)
            && self.expected_id == ident
    }
}

impl Connections {
    pub(crate) fn new(capacity: usize) -> Self {
        Connections {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Insert a connection into a free slot.
    pub(crate) fn open(&mut self, connection: Connection) -> Result<ConnId> {
        let index = self.slots.iter()
            .position(Option::is_none)
            .ok_or(Error::Exhausted)?;
        self.slots[index] = Some(connection);
        Ok(ConnId(index))
    }

    /// Remove a connection, leaving its slot free.
    pub(crate) fn close(&mut self, id: ConnId) -> Option<Connection> {
        self.slots.get_mut(id.0)?.take()
    }

    pub(crate) fn get_mut(&mut self, id: ConnId) -> Option<&mut Connection> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    /// Find the connection an unclaimed echo reply should be queued on.
    pub(crate) fn find_reply_mut(&mut self, device: DeviceId, ident: u16) -> Option<&mut Connection> {
        self.slots.iter_mut()
            .filter_map(Option::as_mut)
            .find(|conn| conn.expects(device, ident))
    }
}

/// Access to an open connection.
///
/// # Panics
/// Panics if the connection was closed. Only sockets hold identifiers and they close their
/// connection when dropped.
impl ops::Index<ConnId> for Connections {
    type Output = Connection;

    fn index(&self, id: ConnId) -> &Connection {
        match self.slots.get(id.0) {
            Some(Some(conn)) => conn,
            _ => panic!("connection {:?} is not open", id),
        }
    }
}

impl ops::IndexMut<ConnId> for Connections {
    fn index_mut(&mut self, id: ConnId) -> &mut Connection {
        match self.slots.get_mut(id.0) {
            Some(Some(conn)) => conn,
            _ => panic!("connection {:?} is not open", id),
        }
    }
}
