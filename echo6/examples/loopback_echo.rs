//! Receives echo replies through a loop-back device polled on a second thread.
//!
//! # Usage
//!
//! The main thread records an echo request, then blocks in a receive call. A polling thread plays
//! the remote side: it answers every request by transmitting an echo reply on the loop-back device
//! and polls the device, which wakes the receiver. Every second reply is delayed so that it arrives
//! before the receive call and is taken from the read-ahead queue instead.
//!
//!   > $ RUST_LOG=echo6=trace cargo run --example loopback_echo -- --count 4 --payload 24
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use echo6::{Config, Network};
use echo6::nic::Loopback;
use echo6::wire::{icmpv6::{EchoRepr, Message}, Ipv6Address};

const IDENT: u16 = 0xec60;

#[derive(StructOpt)]
struct Opts {
    /// Number of echo replies to receive.
    #[structopt(long, default_value = "4")]
    count: u16,
    /// Bytes of echo payload.
    #[structopt(long, default_value = "24")]
    payload: usize,
    /// Receive buffer length, replies longer than this are truncated.
    #[structopt(long, default_value = "64")]
    buffer: usize,
    /// Receive timeout in milliseconds, zero waits forever.
    #[structopt(long, default_value = "1000")]
    timeout_ms: u64,
    /// Buffer segments available for read-ahead.
    #[structopt(long, default_value = "32")]
    segments: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::from_args();

    let mut config = Config::default();
    config
        .set_segments(opts.segments)
        .set_recv_timeout(Duration::from_millis(opts.timeout_ms));

    let network = Network::new(config).expect("Couldn't allocate the buffer pool");
    let mut device = Loopback::new(&network, 16);
    let device_id = device.id();
    let socket = network.socket().expect("Couldn't open echo socket");
    let remote = Ipv6Address::new(0xfe80, 0, 0, 0, 0, 0, 0, 2);

    let (requests, answers) = mpsc::channel::<u16>();
    let payload = vec![0xa5; opts.payload];
    let poll_network = network.clone();
    let poller = thread::spawn(move || {
        for seq_no in answers {
            let reply = EchoRepr { message: Message::EchoReply, ident: IDENT, seq_no };
            let frame = reply.frame(remote, Ipv6Address::LOOPBACK, &payload)
                .expect("Echo payload too large");
            if seq_no % 2 == 0 {
                thread::sleep(Duration::from_millis(10));
            }
            device.tx(&frame).expect("Loop-back device full");
            device.rx(&poll_network, 16).expect("Loop-back device down");
        }
        device.set_down(&poll_network);
    });

    let mut buf = vec![0; opts.buffer];
    for seq_no in 0..opts.count {
        socket.note_request(device_id, IDENT);
        requests.send(seq_no).expect("Poll thread exited");
        if seq_no % 2 == 1 {
            thread::sleep(Duration::from_millis(10));
        }

        match socket.recv_with_addr(&mut buf) {
            Ok((len, from)) => println!("{} bytes from {}: seq={}", len, from.ip(), seq_no),
            Err(err) => println!("seq={}: {} (errno {})", seq_no, err, err.errno()),
        }
    }

    drop(requests);
    poller.join().expect("Poll thread panicked");
}

