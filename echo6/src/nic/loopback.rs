//! Implementation of a software loop-back device.
use std::collections::VecDeque;

use crate::layer::{Error, Result};
use crate::stack::{Delivery, Network};

use super::DeviceId;

/// A software loop-back device.
///
/// Maintains a bounded queue of packets in flight. Everything transmitted is received on the next
/// poll, in order. The device itself is not shared; the thread polling it is the one that delivers
/// into the network.
#[derive(Debug)]
pub struct Loopback {
    id: DeviceId,
    queue: VecDeque<Vec<u8>>,
    capacity: usize,
    up: bool,
}

impl Loopback {
    /// Attach a new loop-back device holding up to `capacity` packets in flight.
    pub fn new(network: &Network, capacity: usize) -> Self {
        Loopback {
            id: network.attach(),
            queue: VecDeque::with_capacity(capacity),
            capacity,
            up: true,
        }
    }

    /// The identifier under which the device is attached.
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// The number of packets waiting to be received.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Check if the device is still operational.
    pub fn is_up(&self) -> bool {
        self.up
    }

    /// Queue a raw IPv6 packet to be received.
    pub fn tx(&mut self, frame: &[u8]) -> Result<()> {
        if !self.up {
            return Err(Error::NetUnreachable);
        }

        if self.queue.len() >= self.capacity {
            return Err(Error::Exhausted);
        }

        self.queue.push_back(frame.to_vec());
        Ok(())
    }

    /// Deliver up to `max` queued packets into the network.
    ///
    /// Returns the number of packets handed over, regardless of whether the network found any use
    /// for them.
    pub fn rx(&mut self, network: &Network, max: usize) -> Result<usize> {
        if !self.up {
            return Err(Error::NetUnreachable);
        }

        let mut count = 0;
        while count < max {
            let frame = match self.queue.pop_front() {
                None => break,
                Some(frame) => frame,
            };

            match network.input(self.id, &frame) {
                Delivery::Dropped => net_trace!("{}: dropped {} byte frame", self.id, frame.len()),
                Delivery::Consumed | Delivery::Buffered => (),
            }
            count += 1;
        }

        Ok(count)
    }

    /// Take the device down, discarding packets in flight.
    ///
    /// Every receive call waiting on this device fails. Returns the number of woken receivers.
    pub fn set_down(&mut self, network: &Network) -> usize {
        self.up = false;
        self.queue.clear();
        network.device_down(self.id)
    }
}
