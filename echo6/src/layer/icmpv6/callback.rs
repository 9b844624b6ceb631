//! Registrations of receive calls waiting for device events.
//!
//! A receive call that finds nothing buffered registers its interest here and goes to sleep. Device
//! polling then dispatches every event to the armed registrations while holding the network lock.
//! The first registration a reply matches captures it into its one-shot result slot, which the
//! sleeping call collects after waking up.
use crate::layer::{Error, Result};
use crate::nic::{DeviceId, Event};
use crate::wire::Ipv6Address;

use super::conn::{ConnId, Connection, Connections};

/// Names one registration.
///
/// Handles are never reused. A handle whose registration was removed stays invalid even when its
/// slot is taken by a later registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Handle {
    index: usize,
    generation: u32,
}

/// An echo reply as seen by the registrations.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Inbound<'a> {
    /// Source address from the IPv6 header.
    pub(crate) src: Ipv6Address,
    /// Identifier of the echo reply.
    pub(crate) ident: u16,
    /// The complete ICMPv6 message, header included.
    pub(crate) message: &'a [u8],
}

/// What a registration captured by the time it was removed.
#[derive(Debug)]
pub(crate) struct Completion {
    /// The captured result. Absent if no event completed the registration.
    pub(crate) result: Option<Result<usize>>,
    /// The bytes copied from the reply.
    pub(crate) staged: Vec<u8>,
    /// The sender of the reply.
    pub(crate) from: Option<Ipv6Address>,
}

#[derive(Debug)]
struct Interest {
    generation: u32,
    device: DeviceId,
    conn: ConnId,
    /// Events still listened for. Empty once the registration completed.
    events: Event,
    capacity: usize,
    staged: Vec<u8>,
    from: Option<Ipv6Address>,
    result: Option<Result<usize>>,
}

/// Fixed-capacity table of registrations.
#[derive(Debug)]
pub(crate) struct Callbacks {
    slots: Vec<Option<Interest>>,
    generation: u32,
}

impl Interest {
    fn is_armed(&self) -> bool {
        !self.events.is_empty()
    }

    fn complete(&mut self, result: Result<usize>) {
        self.result = Some(result);
        self.events = Event::empty();
    }

    /// Decide what the event means for the waiting receive call.
    ///
    /// Returns `true` if the registration completed.
    fn recv_event(
        &mut self,
        conn: &mut Connection,
        device: DeviceId,
        flags: &mut Event,
        inbound: Option<&Inbound>,
    ) -> bool {
        net_trace!("{}: event {:?} for {:?}", device, flags, self.conn);

        if flags.contains(Event::DEVICE_DOWN) {
            net_debug!("{}: device down, failing receive on {:?}", device, self.conn);
            self.complete(Err(Error::NetUnreachable));
            return true;
        }

        if conn.bound_device() != Some(device) {
            return false;
        }

        if !flags.contains(Event::NEW_DATA) {
            return false;
        }

        let inbound = match inbound {
            Some(inbound) => inbound,
            None => return false,
        };

        if inbound.ident != conn.expected_id() {
            net_trace!("{}: echo id {:#06x} is not {:#06x}",
                device, inbound.ident, conn.expected_id());
            return false;
        }

        let len = inbound.message.len().min(self.capacity);
        self.staged.clear();
        self.staged.extend_from_slice(&inbound.message[..len]);
        self.from = Some(inbound.src);

        flags.remove(Event::NEW_DATA);
        conn.consume_reply();
        self.complete(Ok(len));
        net_debug!("{}: resuming receive on {:?} with {} bytes from {}",
            device, self.conn, len, inbound.src);
        true
    }
}

impl Callbacks {
    pub(crate) fn new(capacity: usize) -> Self {
        Callbacks {
            slots: (0..capacity).map(|_| None).collect(),
            generation: 0,
        }
    }

    /// The number of registrations, armed or completed.
    pub(crate) fn registered(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// The number of registrations still listening for events.
    #[cfg(test)]
    pub(crate) fn armed(&self) -> usize {
        self.slots.iter()
            .flatten()
            .filter(|interest| interest.is_armed())
            .count()
    }

    /// Register a receive call on `conn` for events of `device`.
    ///
    /// At most `capacity` bytes of a matching reply are captured.
    pub(crate) fn register(&mut self, device: DeviceId, conn: ConnId, capacity: usize)
        -> Result<Handle>
    {
        let index = self.slots.iter()
            .position(Option::is_none)
            .ok_or(Error::Exhausted)?;

        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        self.slots[index] = Some(Interest {
            generation,
            device,
            conn,
            events: Event::RECEIVE,
            capacity,
            staged: Vec::with_capacity(capacity),
            from: None,
            result: None,
        });

        Ok(Handle { index, generation })
    }

    /// Remove a registration and hand out what it captured.
    ///
    /// Returns `None` if the handle is stale, in which case nothing changes.
    pub(crate) fn unregister(&mut self, handle: Handle) -> Option<Completion> {
        let slot = self.slots.get_mut(handle.index)?;
        match slot {
            Some(interest) if interest.generation == handle.generation => (),
            _ => return None,
        }

        let interest = slot.take()?;
        Some(Completion {
            result: interest.result,
            staged: interest.staged,
            from: interest.from,
        })
    }

    /// The captured result, if the registration completed.
    pub(crate) fn result(&self, handle: Handle) -> Option<Result<usize>> {
        self.get(handle)?.result
    }

    /// Complete an armed registration with `Interrupted`.
    ///
    /// Returns `false` if the registration was already completed or is gone.
    pub(crate) fn interrupt(&mut self, handle: Handle) -> bool {
        match self.get_mut(handle) {
            Some(interest) if interest.is_armed() => {
                interest.complete(Err(Error::Interrupted));
                true
            },
            _ => false,
        }
    }

    /// Offer device events to every armed registration.
    ///
    /// Device down events only reach registrations made on that device. New data is offered to
    /// all of them and is taken out of the flags by the first one it completes. Returns the
    /// remaining flags and the number of completed registrations.
    pub(crate) fn dispatch(
        &mut self,
        conns: &mut Connections,
        device: DeviceId,
        mut flags: Event,
        inbound: Option<&Inbound>,
    ) -> (Event, usize) {
        let mut woken = 0;

        for interest in self.slots.iter_mut().flatten() {
            if !interest.events.intersects(flags) {
                continue;
            }

            if flags.contains(Event::DEVICE_DOWN) && interest.device != device {
                continue;
            }

            let conn = match conns.get_mut(interest.conn) {
                Some(conn) => conn,
                None => continue,
            };

            if interest.recv_event(conn, device, &mut flags, inbound) {
                woken += 1;
            }
        }

        (flags, woken)
    }

    fn get(&self, handle: Handle) -> Option<&Interest> {
        self.slots.get(handle.index)?
            .as_ref()
            .filter(|interest| interest.generation == handle.generation)
    }

    fn get_mut(&mut self, handle: Handle) -> Option<&mut Interest> {
        self.slots.get_mut(handle.index)?
            .as_mut()
            .filter(|interest| interest.generation == handle.generation)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use super::*;

    static REPLY: [u8; 12] =
        [0x81, 0x00, 0x00, 0x00,
         0x12, 0x34, 0x00, 0x01,
         0xaa, 0xbb, 0xcc, 0xdd];

    fn setup(capacity: usize) -> (Callbacks, Connections, ConnId) {
        let mut conns = Connections::new(2);
        let mut conn = Connection::new(Duration::ZERO);
        conn.note_request(DeviceId::new(0), 0x1234);
        let id = conns.open(conn).unwrap();
        (Callbacks::new(capacity), conns, id)
    }

    fn inbound(ident: u16) -> Inbound<'static> {
        Inbound {
            src: Ipv6Address::LOOPBACK,
            ident,
            message: &REPLY,
        }
    }

    #[test]
    fn registration_is_bounded() {
        let (mut callbacks, _, id) = setup(1);
        let first = callbacks.register(DeviceId::new(0), id, 16).unwrap();
        assert_eq!(callbacks.register(DeviceId::new(0), id, 16), Err(Error::Exhausted));
        assert!(callbacks.unregister(first).is_some());
        assert!(callbacks.register(DeviceId::new(0), id, 16).is_ok());
    }

    #[test]
    fn stale_handle_is_ignored() {
        let (mut callbacks, _, id) = setup(1);
        let first = callbacks.register(DeviceId::new(0), id, 16).unwrap();
        assert!(callbacks.unregister(first).is_some());
        assert!(callbacks.unregister(first).is_none());

        let second = callbacks.register(DeviceId::new(0), id, 16).unwrap();
        assert_ne!(first, second);
        assert!(callbacks.unregister(first).is_none());
        assert!(!callbacks.interrupt(first));
        assert_eq!(callbacks.registered(), 1);
        assert!(callbacks.unregister(second).is_some());
    }

    #[test]
    fn matching_reply_completes() {
        let (mut callbacks, mut conns, id) = setup(2);
        let handle = callbacks.register(DeviceId::new(0), id, 10).unwrap();

        let (flags, woken) = callbacks.dispatch(
            &mut conns, DeviceId::new(0), Event::NEW_DATA, Some(&inbound(0x1234)));
        assert!(!flags.contains(Event::NEW_DATA));
        assert_eq!(woken, 1);
        assert_eq!(conns[id].outstanding(), 0);
        assert_eq!(callbacks.armed(), 0);
        assert_eq!(callbacks.result(handle), Some(Ok(10)));

        let completion = callbacks.unregister(handle).unwrap();
        assert_eq!(&completion.staged[..], &REPLY[..10]);
        assert_eq!(completion.from, Some(Ipv6Address::LOOPBACK));
    }

    #[test]
    fn mismatches_leave_flags() {
        let (mut callbacks, mut conns, id) = setup(2);
        let handle = callbacks.register(DeviceId::new(0), id, 64).unwrap();

        let (flags, woken) = callbacks.dispatch(
            &mut conns, DeviceId::new(0), Event::NEW_DATA, Some(&inbound(0x4321)));
        assert_eq!((flags, woken), (Event::NEW_DATA, 0));

        let (flags, woken) = callbacks.dispatch(
            &mut conns, DeviceId::new(1), Event::NEW_DATA, Some(&inbound(0x1234)));
        assert_eq!((flags, woken), (Event::NEW_DATA, 0));

        assert_eq!(conns[id].outstanding(), 1);
        assert_eq!(callbacks.result(handle), None);
        assert_eq!(callbacks.armed(), 1);
    }

    #[test]
    fn device_down_only_on_device() {
        let (mut callbacks, mut conns, id) = setup(2);
        let handle = callbacks.register(DeviceId::new(0), id, 64).unwrap();

        let (_, woken) = callbacks.dispatch(&mut conns, DeviceId::new(1), Event::DEVICE_DOWN, None);
        assert_eq!(woken, 0);

        let (_, woken) = callbacks.dispatch(&mut conns, DeviceId::new(0), Event::DEVICE_DOWN, None);
        assert_eq!(woken, 1);
        assert_eq!(callbacks.result(handle), Some(Err(Error::NetUnreachable)));
        assert_eq!(conns[id].outstanding(), 1);
    }

    #[test]
    fn interrupt_once() {
        let (mut callbacks, _, id) = setup(2);
        let handle = callbacks.register(DeviceId::new(0), id, 64).unwrap();
        assert!(callbacks.interrupt(handle));
        assert!(!callbacks.interrupt(handle));
        assert_eq!(callbacks.result(handle), Some(Err(Error::Interrupted)));
    }
}
