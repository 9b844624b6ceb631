//! Network devices and the events they raise.
//!
//! A device is anything that delivers raw IPv6 packets into a [`Network`]. Polling a device feeds
//! its frames to [`Network::input`] and a device that stops operating reports so through
//! [`Network::device_down`]. Both surface as [`Event`] flags to every receive call blocked on the
//! device.
//!
//! [`Network`]: ../stack/struct.Network.html
//! [`Network::input`]: ../stack/struct.Network.html#method.input
//! [`Network::device_down`]: ../stack/struct.Network.html#method.device_down
//! [`Event`]: struct.Event.html
use core::{fmt, ops};

pub mod loopback;

pub use self::loopback::Loopback;

/// Identifies a device attached to a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(u32);

impl DeviceId {
    pub(crate) fn new(index: u32) -> Self {
        DeviceId(index)
    }

    /// The index of the device in the order of attachment.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "dev{}", self.0)
    }
}

/// A set of device poll events.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Event(u16);

impl Event {
    /// A new packet was received by the device.
    pub const NEW_DATA: Event = Event(0x0002);

    /// The device is no longer operational.
    pub const DEVICE_DOWN: Event = Event(0x8000);

    /// The set of all events a blocked receiver listens for.
    pub const RECEIVE: Event = Event(Self::NEW_DATA.0 | Self::DEVICE_DOWN.0);

    /// The empty set.
    pub const fn empty() -> Self {
        Event(0)
    }

    /// The raw bits of the set.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Check if no event is contained.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Check if all events of `other` are contained.
    pub const fn contains(self, other: Event) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check if any event of `other` is contained.
    pub const fn intersects(self, other: Event) -> bool {
        self.0 & other.0 != 0
    }

    /// Remove all events of `other`.
    pub fn remove(&mut self, other: Event) {
        self.0 &= !other.0;
    }
}

impl ops::BitOr for Event {
    type Output = Event;

    fn bitor(self, other: Event) -> Event {
        Event(self.0 | other.0)
    }
}

impl ops::BitOrAssign for Event {
    fn bitor_assign(&mut self, other: Event) {
        self.0 |= other.0;
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut list = f.debug_set();
        if self.contains(Event::NEW_DATA) {
            list.entry(&format_args!("NEW_DATA"));
        }
        if self.contains(Event::DEVICE_DOWN) {
            list.entry(&format_args!("DEVICE_DOWN"));
        }
        let unknown = self.0 & !Event::RECEIVE.0;
        if unknown != 0 {
            list.entry(&format_args!("{:#06x}", unknown));
        }
        list.finish()
    }
}
