use std::time::Duration;

/// Sizes of the preallocated tables of a network.
///
/// All memory is reserved when the network is created. Running out of any of these resources is
/// reported as `Error::Exhausted` instead of growing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    callbacks: usize,
    connections: usize,
    segments: usize,
    segment_len: usize,
    recv_timeout: Duration,
}

impl Config {
    /// The number of receive calls that may wait at the same time.
    pub fn callbacks(&self) -> usize {
        self.callbacks
    }

    /// The number of sockets that may be open at the same time.
    pub fn connections(&self) -> usize {
        self.connections
    }

    /// The number of buffer segments shared by all read-ahead queues.
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// The length of each buffer segment.
    pub fn segment_len(&self) -> usize {
        self.segment_len
    }

    /// The receive timeout of new sockets, zero for none.
    pub fn recv_timeout(&self) -> Duration {
        self.recv_timeout
    }

    /// Set the registration table capacity.
    pub fn set_callbacks(&mut self, count: usize) -> &mut Self {
        self.callbacks = count;
        self
    }

    /// Set the connection table capacity.
    pub fn set_connections(&mut self, count: usize) -> &mut Self {
        self.connections = count;
        self
    }

    /// Set the number of buffer segments.
    pub fn set_segments(&mut self, count: usize) -> &mut Self {
        self.segments = count;
        self
    }

    /// Set the length of each buffer segment.
    ///
    /// A zero length is raised to one byte.
    pub fn set_segment_len(&mut self, len: usize) -> &mut Self {
        self.segment_len = len.max(1);
        self
    }

    /// Set the receive timeout of new sockets.
    pub fn set_recv_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.recv_timeout = timeout;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            callbacks: 8,
            connections: 8,
            segments: 32,
            segment_len: 196,
            recv_timeout: Duration::ZERO,
        }
    }
}
