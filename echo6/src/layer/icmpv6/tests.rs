use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::layer::Error;
use crate::nic::{DeviceId, Loopback};
use crate::stack::{Config, Delivery, Network};
use crate::wire::icmpv6::{EchoRepr, Message};
use crate::wire::sockaddr::{SockAddrBuf, SOCKADDR_IN6_LEN};
use crate::wire::Ipv6Address;

use super::Socket;

const IDENT: u16 = 0x1234;

static PAYLOAD: [u8; 24] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07,
    0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17,
];

fn peer() -> Ipv6Address {
    Ipv6Address::new(0xfe80, 0, 0, 0, 0, 0, 0, 2)
}

fn reply(ident: u16, seq_no: u16, payload: &[u8]) -> Vec<u8> {
    let repr = EchoRepr {
        message: Message::EchoReply,
        ident,
        seq_no,
    };
    repr.frame(peer(), Ipv6Address::LOOPBACK, payload).unwrap()
}

fn setup(config: &Config) -> (Arc<Network>, DeviceId, Socket) {
    let network = Network::new(config.clone()).unwrap();
    let device = network.attach();
    let socket = network.socket().unwrap();
    (network, device, socket)
}

fn wait_until_receiving(socket: &Socket) {
    while !socket.is_receiving() {
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn buffered_reply_without_waiting() {
    let (network, device, socket) = setup(&Config::default());
    socket.note_request(device, IDENT);
    assert_eq!(network.input(device, &reply(IDENT, 1, &PAYLOAD)), Delivery::Buffered);
    assert_eq!(socket.readahead_len(), 1);

    let mut buf = [0; 64];
    assert_eq!(socket.recv_from(&mut buf, None), Ok(32));
    assert_eq!(&buf[8..32], &PAYLOAD[..]);
    assert_eq!(socket.readahead_len(), 0);
    assert_eq!(socket.outstanding(), 0);
    assert_eq!(network.waiting(), 0);
}

#[test]
fn nothing_outstanding() {
    let (network, device, socket) = setup(&Config::default());
    let available = network.pool_available();
    assert_eq!(network.input(device, &reply(IDENT, 1, &PAYLOAD)), Delivery::Dropped);

    let mut buf = [0; 64];
    assert_eq!(socket.recv_from(&mut buf, None), Err(Error::Protocol));
    assert_eq!(socket.recv_from_raw(&mut buf, None), -(libc::EPROTO as isize));
    assert_eq!(network.pool_available(), available);
    assert_eq!(network.waiting(), 0);
}

#[test]
fn invalid_arguments() {
    let (_network, device, socket) = setup(&Config::default());
    socket.note_request(device, IDENT);

    let mut small = [0; 7];
    assert_eq!(socket.recv_from(&mut small, None), Err(Error::InvalidArgument));

    let mut buf = [0; 64];
    let mut addr = [0; SOCKADDR_IN6_LEN - 1];
    let mut from = SockAddrBuf::new(&mut addr);
    assert_eq!(socket.recv_from(&mut buf, Some(&mut from)), Err(Error::InvalidArgument));
    assert_eq!(socket.outstanding(), 1);
}

#[test]
fn replies_in_arrival_order() {
    let (network, device, socket) = setup(&Config::default());
    for _ in 0..3 {
        socket.note_request(device, IDENT);
    }
    for seq_no in 0..3 {
        assert_eq!(network.input(device, &reply(IDENT, seq_no, &PAYLOAD)), Delivery::Buffered);
    }

    for seq_no in 0..3u8 {
        let mut buf = [0; 64];
        assert_eq!(socket.recv_from(&mut buf, None), Ok(32));
        assert_eq!(buf[7], seq_no);
        assert_eq!(socket.outstanding(), 2 - usize::from(seq_no));
    }
}

#[test]
fn queued_reply_fits_larger_buffer() {
    let (network, device, socket) = setup(&Config::default());
    socket.note_request(device, IDENT);
    network.input(device, &reply(IDENT, 1, &PAYLOAD));

    let mut buf = [0; 40];
    let mut addr = [0; SOCKADDR_IN6_LEN];
    let mut from = SockAddrBuf::new(&mut addr);
    assert_eq!(socket.recv_from(&mut buf, Some(&mut from)), Ok(32));
    assert_eq!(buf[0], 0x81);
    assert_eq!(from.len(), SOCKADDR_IN6_LEN);
    let addr = from.socket_addr().unwrap();
    assert_eq!(Ipv6Address::from(*addr.ip()), peer());
    assert_eq!(addr.port(), 0);
}

#[test]
fn live_reply_truncated() {
    let (network, device, socket) = setup(&Config::default());
    socket.note_request(device, IDENT);

    thread::scope(|scope| {
        let receiver = scope.spawn(|| {
            let mut buf = [0; 16];
            let result = socket.recv_with_addr(&mut buf);
            (result, buf)
        });

        wait_until_receiving(&socket);
        assert_eq!(network.input(device, &reply(IDENT, 1, &PAYLOAD)), Delivery::Consumed);

        let (result, buf) = receiver.join().unwrap();
        let (len, addr) = result.unwrap();
        assert_eq!(len, 16);
        assert_eq!(&buf[8..], &PAYLOAD[..8]);
        assert_eq!(Ipv6Address::from(*addr.ip()), peer());
    });

    assert_eq!(socket.outstanding(), 0);
    assert_eq!(socket.bound_device(), None);
    assert_eq!(network.waiting(), 0);
}

#[test]
fn wrong_id_never_completes() {
    let (network, device, socket) = setup(&Config::default());
    socket.note_request(device, IDENT);
    socket.set_recv_timeout(Some(Duration::from_millis(50)));

    thread::scope(|scope| {
        let receiver = scope.spawn(|| socket.recv_from(&mut [0; 64], None));

        wait_until_receiving(&socket);
        assert_eq!(network.input(device, &reply(IDENT + 1, 1, &PAYLOAD)), Delivery::Dropped);
        assert_eq!(receiver.join().unwrap(), Err(Error::TimedOut));
    });

    assert_eq!(socket.outstanding(), 1);
    assert_eq!(socket.readahead_len(), 0);
}

#[test]
fn other_device_is_ignored() {
    let (network, device, socket) = setup(&Config::default());
    let other = network.attach();
    socket.note_request(device, IDENT);
    socket.set_recv_timeout(Some(Duration::from_millis(50)));

    thread::scope(|scope| {
        let receiver = scope.spawn(|| socket.recv_from(&mut [0; 64], None));

        wait_until_receiving(&socket);
        assert_eq!(network.input(other, &reply(IDENT, 1, &PAYLOAD)), Delivery::Dropped);
        assert_eq!(network.device_down(other), 0);
        assert_eq!(receiver.join().unwrap(), Err(Error::TimedOut));
    });

    assert_eq!(socket.outstanding(), 1);
}

#[test]
fn device_down_unblocks() {
    let (network, device, socket) = setup(&Config::default());
    socket.note_request(device, IDENT);

    thread::scope(|scope| {
        let receiver = scope.spawn(|| socket.recv_from(&mut [0; 64], None));

        wait_until_receiving(&socket);
        assert_eq!(network.waiting(), 1);
        assert_eq!(network.device_down(device), 1);
        assert_eq!(receiver.join().unwrap(), Err(Error::NetUnreachable));
    });

    assert!(!socket.is_receiving());
    assert_eq!(network.waiting(), 0);
    assert_eq!(socket.outstanding(), 1);
}

#[test]
fn timeout_keeps_counter() {
    let (network, device, socket) = setup(&Config::default());
    socket.note_request(device, IDENT);
    socket.set_recv_timeout(Some(Duration::from_millis(20)));
    assert_eq!(socket.recv_timeout(), Some(Duration::from_millis(20)));

    assert_eq!(socket.recv_from(&mut [0; 64], None), Err(Error::TimedOut));
    assert_eq!(socket.recv_from_raw(&mut [0; 64], None), -(libc::ETIMEDOUT as isize));
    assert_eq!(socket.outstanding(), 1);
    assert_eq!(socket.bound_device(), Some(device));
    assert_eq!(network.waiting(), 0);
}

#[test]
fn late_reply_is_buffered_after_timeout() {
    let (network, device, socket) = setup(&Config::default());
    socket.note_request(device, IDENT);
    socket.set_recv_timeout(Some(Duration::from_millis(20)));
    assert_eq!(socket.recv_from(&mut [0; 64], None), Err(Error::TimedOut));

    // The expired call is gone, so the reply waits in the queue for the next one.
    assert_eq!(network.input(device, &reply(IDENT, 1, &PAYLOAD)), Delivery::Buffered);
    assert_eq!(socket.readahead_len(), 1);
    assert_eq!(socket.outstanding(), 1);

    assert_eq!(socket.recv_from(&mut [0; 64], None), Ok(32));
    assert_eq!(socket.outstanding(), 0);
    assert_eq!(network.waiting(), 0);
}

#[test]
fn sockets_on_one_device_get_own_replies() {
    let (network, device, first) = setup(&Config::default());
    let second = network.socket().unwrap();
    first.note_request(device, IDENT);
    second.note_request(device, IDENT + 1);

    thread::scope(|scope| {
        let first_receiver = scope.spawn(|| {
            let mut buf = [0; 64];
            first.recv_from(&mut buf, None).map(|len| (len, buf[7]))
        });
        let second_receiver = scope.spawn(|| {
            let mut buf = [0; 64];
            second.recv_from(&mut buf, None).map(|len| (len, buf[7]))
        });

        wait_until_receiving(&first);
        wait_until_receiving(&second);
        assert_eq!(network.waiting(), 2);

        assert_eq!(network.input(device, &reply(IDENT + 1, 2, &PAYLOAD)), Delivery::Consumed);
        assert_eq!(second_receiver.join().unwrap(), Ok((32, 2)));
        assert!(first.is_receiving());

        assert_eq!(network.input(device, &reply(IDENT, 1, &PAYLOAD)), Delivery::Consumed);
        assert_eq!(first_receiver.join().unwrap(), Ok((32, 1)));
    });

    assert_eq!(first.outstanding(), 0);
    assert_eq!(second.outstanding(), 0);
    assert_eq!(network.waiting(), 0);
}

#[test]
fn idle_socket_is_reset() {
    let (network, device, socket) = setup(&Config::default());
    let available = network.pool_available();
    socket.note_request(device, IDENT);
    network.input(device, &reply(IDENT, 1, &PAYLOAD));
    network.input(device, &reply(IDENT, 2, &PAYLOAD));
    assert_eq!(socket.readahead_len(), 2);

    assert_eq!(socket.recv_from(&mut [0; 64], None), Ok(32));
    assert_eq!(socket.outstanding(), 0);
    assert_eq!(socket.readahead_len(), 0);
    assert_eq!(socket.bound_device(), None);
    assert_eq!(socket.expected_id(), 0);
    assert_eq!(network.pool_available(), available);
}

#[test]
fn second_receiver_is_busy() {
    let (network, device, socket) = setup(&Config::default());
    socket.note_request(device, IDENT);
    socket.note_request(device, IDENT);

    thread::scope(|scope| {
        let receiver = scope.spawn(|| socket.recv_from(&mut [0; 64], None));

        wait_until_receiving(&socket);
        assert_eq!(socket.recv_from(&mut [0; 64], None), Err(Error::Busy));
        assert!(socket.is_receiving());

        assert_eq!(network.input(device, &reply(IDENT, 1, &PAYLOAD)), Delivery::Consumed);
        assert_eq!(receiver.join().unwrap(), Ok(32));
    });

    assert_eq!(socket.outstanding(), 1);
}

#[test]
fn interrupt_wakes_receiver() {
    let (network, device, socket) = setup(&Config::default());
    socket.note_request(device, IDENT);
    assert!(!socket.interrupt());

    thread::scope(|scope| {
        let receiver = scope.spawn(|| socket.recv_from(&mut [0; 64], None));

        wait_until_receiving(&socket);
        assert!(socket.interrupt());
        assert_eq!(receiver.join().unwrap(), Err(Error::Interrupted));
    });

    assert_eq!(socket.outstanding(), 1);
    assert_eq!(network.waiting(), 0);
}

#[test]
fn registrations_exhausted() {
    let mut config = Config::default();
    config.set_callbacks(0);
    let (_network, device, socket) = setup(&config);
    socket.note_request(device, IDENT);
    assert_eq!(socket.recv_from(&mut [0; 64], None), Err(Error::Exhausted));
    assert!(!socket.is_receiving());
}

#[test]
fn exhausted_pool_drops_reply() {
    let mut config = Config::default();
    config.set_segments(1).set_segment_len(16);
    let (network, device, socket) = setup(&config);
    socket.note_request(device, IDENT);

    assert_eq!(network.input(device, &reply(IDENT, 1, &PAYLOAD)), Delivery::Dropped);
    assert_eq!(socket.readahead_len(), 0);
    assert_eq!(socket.outstanding(), 1);
    assert_eq!(network.pool_available(), 1);
}

#[test]
fn socket_table_exhausted() {
    let mut config = Config::default();
    config.set_connections(1);
    let network = Network::new(config).unwrap();
    let first = network.socket().unwrap();
    assert!(matches!(network.socket(), Err(Error::Exhausted)));
    drop(first);
    assert!(network.socket().is_ok());
}

#[test]
fn oversized_pool_is_refused() {
    let mut config = Config::default();
    config.set_segments(usize::MAX);
    assert!(matches!(Network::new(config), Err(Error::Exhausted)));
}

#[test]
fn dropped_socket_returns_segments() {
    let (network, device, socket) = setup(&Config::default());
    let available = network.pool_available();
    for seq_no in 0..4 {
        socket.note_request(device, IDENT);
        network.input(device, &reply(IDENT, seq_no, &PAYLOAD));
    }
    assert!(network.pool_available() < available);

    drop(socket);
    assert_eq!(network.pool_available(), available);
}

#[test]
fn loopback_delivery() {
    let network = Network::new(Config::default()).unwrap();
    let mut device = Loopback::new(&network, 4);
    let socket = network.socket().unwrap();
    socket.note_request(device.id(), IDENT);
    socket.note_request(device.id(), IDENT);

    device.tx(&reply(IDENT, 1, &PAYLOAD)).unwrap();
    device.tx(&reply(IDENT, 2, &PAYLOAD)).unwrap();

    thread::scope(|scope| {
        let receiver = scope.spawn(|| socket.recv_from(&mut [0; 64], None));
        wait_until_receiving(&socket);
        assert_eq!(device.rx(&network, 1), Ok(1));
        assert_eq!(receiver.join().unwrap(), Ok(32));
    });

    assert_eq!(device.rx(&network, 4), Ok(1));
    assert_eq!(socket.readahead_len(), 1);
    assert_eq!(socket.recv_from(&mut [0; 64], None), Ok(32));
    assert_eq!(socket.outstanding(), 0);
}
