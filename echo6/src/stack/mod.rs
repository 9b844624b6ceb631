//! The network owning all socket state.
//!
//! A [`Network`] is the meeting point of the two kinds of threads in the system: threads calling
//! into sockets and threads polling devices. All connection state, the buffer pool and the table of
//! waiting receive calls live behind one lock, the network lock. A receive call that has to wait
//! sleeps on the condition variable tied to that lock, which releases it so that device polling
//! can deliver the awaited reply.
//!
//! [`Network`]: struct.Network.html
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::layer::Result;
use crate::layer::icmpv6::{Callbacks, Connection, Connections, Socket};
use crate::nic::DeviceId;
use crate::storage::Pool;

mod config;

pub use self::config::Config;

/// Owner of connections, buffers and waiting receive calls.
pub struct Network {
    tables: Mutex<Tables>,
    signal: Condvar,
    devices: AtomicU32,
    config: Config,
}

/// The state protected by the network lock.
pub(crate) struct Tables {
    pub(crate) pool: Pool,
    pub(crate) conns: Connections,
    pub(crate) callbacks: Callbacks,
}

/// What became of a packet handed to [`Network::input`].
///
/// [`Network::input`]: struct.Network.html#method.input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// A waiting receive call took the packet.
    Consumed,
    /// The packet was queued for a later receive call.
    Buffered,
    /// Nobody expected the packet or there was no room for it.
    Dropped,
}

impl Network {
    /// Create a network, preallocating all tables.
    ///
    /// Fails with `Exhausted` if the buffer pool the configuration asks for can not be allocated.
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let pool = Pool::new(config.segments(), config.segment_len())?;
        let tables = Tables {
            pool,
            conns: Connections::new(config.connections()),
            callbacks: Callbacks::new(config.callbacks()),
        };

        Ok(Arc::new(Network {
            tables: Mutex::new(tables),
            signal: Condvar::new(),
            devices: AtomicU32::new(0),
            config,
        }))
    }

    /// The configuration the network was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reserve an identifier for a new device.
    pub fn attach(&self) -> DeviceId {
        DeviceId::new(self.devices.fetch_add(1, Ordering::Relaxed))
    }

    /// Open a new ICMPv6 echo socket.
    ///
    /// Fails with `Exhausted` if the connection table is full.
    pub fn socket(self: &Arc<Self>) -> Result<Socket> {
        let connection = Connection::new(self.config.recv_timeout());
        let conn = self.lock().conns.open(connection)?;
        net_debug!("opened echo socket {:?}", conn);
        Ok(Socket::new(Arc::clone(self), conn))
    }

    /// The number of buffer segments not holding any queued message.
    pub fn pool_available(&self) -> usize {
        self.lock().pool.available()
    }

    /// The number of receive calls currently registered.
    pub fn waiting(&self) -> usize {
        self.lock().callbacks.registered()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock()
    }

    pub(crate) fn signal(&self) -> &Condvar {
        &self.signal
    }
}
