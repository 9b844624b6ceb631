//! Demultiplexing of device input to the echo sockets.
use std::net::SocketAddrV6;

use crate::nic::{DeviceId, Event};
use crate::stack::{Delivery, Network, Tables};
use crate::wire::{self, IpProtocol};
use crate::wire::icmpv6::{icmpv6, Message};
use crate::wire::ipv6;

use super::callback::Inbound;

/// Extract an echo reply from a raw IPv6 packet.
fn parse(frame: &[u8]) -> wire::Result<Inbound<'_>> {
    let packet = ipv6::ipv6::new_checked(frame)?;
    let repr = ipv6::Repr::parse(packet)?;
    if repr.next_header != IpProtocol::Icmpv6 {
        return Err(wire::Error::Unrecognized);
    }

    let message = icmpv6::new_checked(packet.payload_slice())?;
    if message.msg_type() != Message::EchoReply {
        return Err(wire::Error::Unrecognized);
    }

    Ok(Inbound {
        src: repr.src_addr,
        ident: message.echo_ident(),
        message: message.as_bytes(),
    })
}

impl Network {
    /// Deliver a raw IPv6 packet received on `device`.
    ///
    /// An echo reply is first offered to the receive calls waiting for it. If none takes it, it
    /// is queued on the socket expecting it, provided the pool has room. Everything else is
    /// dropped.
    pub fn input(&self, device: DeviceId, frame: &[u8]) -> Delivery {
        let inbound = match parse(frame) {
            Ok(inbound) => inbound,
            Err(err) => {
                net_trace!("{}: ignoring packet: {}", device, err);
                return Delivery::Dropped;
            },
        };

        let mut tables = self.lock();
        let Tables { pool, conns, callbacks } = &mut *tables;
        let (flags, woken) = callbacks.dispatch(conns, device, Event::NEW_DATA, Some(&inbound));

        let delivery = if !flags.contains(Event::NEW_DATA) {
            Delivery::Consumed
        } else {
            match conns.find_reply_mut(device, inbound.ident) {
                None => {
                    net_trace!("{}: no socket expects echo id {:#06x}", device, inbound.ident);
                    Delivery::Dropped
                },
                Some(conn) => {
                    let src = SocketAddrV6::new(inbound.src.into(), 0, 0, 0);
                    match conn.readahead_mut().push(pool, &src, inbound.message) {
                        Ok(()) => Delivery::Buffered,
                        Err(err) => {
                            net_debug!("{}: dropping echo reply from {}: {}", device, inbound.src, err);
                            Delivery::Dropped
                        },
                    }
                },
            }
        };
        drop(tables);

        if woken > 0 {
            self.signal().notify_all();
        }
        delivery
    }

    /// Report that `device` stopped operating.
    ///
    /// Every receive call waiting on the device fails with `NetUnreachable`. Returns the number
    /// of such calls.
    pub fn device_down(&self, device: DeviceId) -> usize {
        let mut tables = self.lock();
        let Tables { conns, callbacks, .. } = &mut *tables;
        let (_, woken) = callbacks.dispatch(conns, device, Event::DEVICE_DOWN, None);
        drop(tables);

        if woken > 0 {
            net_warn!("{} went down with {} waiting receivers", device, woken);
            self.signal().notify_all();
        }
        woken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::icmpv6::EchoRepr;
    use crate::wire::Ipv6Address;

    #[test]
    fn parse_reply() {
        let repr = EchoRepr { message: Message::EchoReply, ident: 0x1234, seq_no: 1 };
        let frame = repr.frame(Ipv6Address::LOOPBACK, Ipv6Address::LOOPBACK, &[1, 2, 3, 4]).unwrap();
        let inbound = parse(&frame).unwrap();
        assert_eq!(inbound.ident, 0x1234);
        assert_eq!(inbound.src, Ipv6Address::LOOPBACK);
        assert_eq!(inbound.message.len(), 12);
    }

    #[test]
    fn parse_rejects_request() {
        let repr = EchoRepr { message: Message::EchoRequest, ident: 0x1234, seq_no: 1 };
        let frame = repr.frame(Ipv6Address::LOOPBACK, Ipv6Address::LOOPBACK, &[]).unwrap();
        assert_eq!(parse(&frame).err(), Some(wire::Error::Unrecognized));
        assert_eq!(parse(&frame[..30]).err(), Some(wire::Error::Truncated));
    }
}
