//! Blocking ICMPv6 echo reply sockets for a user-space network stack.
//!
//! ## Table of contents
//!
//! 1. [Design](#design-and-relevant-core-concepts)
//! 2. [The wire module](wire/index.html)
//! 3. [Echo sockets](layer/icmpv6/index.html)
//! 4. [The network and its configuration](stack/index.html)
//! 5. [Network devices](nic/index.html)
//! 6. Internals
//!    1. [The storage module](storage/index.html)
//!    2. [Timeouts](time/index.html)
//!
//! ## Design and relevant core concepts
//!
//! A [`Network`] owns all state: the sockets' connection records, a pool of buffer memory for
//! replies nobody was waiting for yet and a table of receive calls that are currently blocked. Two
//! kinds of threads meet there. Application threads call [`Socket::recv_from`] and device polling
//! threads hand received packets to [`Network::input`].
//!
//! All memory is allocated when the network is created. The number of sockets, of concurrently
//! blocked receive calls and of buffer segments is fixed by the [`Config`]. Running out of any of
//! them is an error returned to the caller, never a reason to grow.
//!
//! ```
//! use echo6::{Config, Network};
//! use echo6::wire::{icmpv6::{EchoRepr, Message}, Ipv6Address};
//!
//! let network = Network::new(Config::default()).unwrap();
//! let device = network.attach();
//! let socket = network.socket().unwrap();
//!
//! // An echo request with identifier 7 went out on `device`.
//! socket.note_request(device, 7);
//!
//! let reply = EchoRepr { message: Message::EchoReply, ident: 7, seq_no: 0 };
//! let frame = reply.frame(Ipv6Address::LOOPBACK, Ipv6Address::LOOPBACK, b"ping").unwrap();
//! network.input(device, &frame);
//!
//! let mut buf = [0; 64];
//! let (len, from) = socket.recv_with_addr(&mut buf).unwrap();
//! assert_eq!(&buf[8..len], b"ping");
//! assert!(from.ip().is_loopback());
//! ```
//!
//! [`Network`]: stack/struct.Network.html
//! [`Network::input`]: stack/struct.Network.html#method.input
//! [`Socket::recv_from`]: layer/icmpv6/struct.Socket.html#method.recv_from
//! [`Config`]: stack/struct.Config.html
#![warn(missing_docs)]
#![warn(unreachable_pub)]

#[macro_use] mod macros;
pub mod layer;
pub mod nic;
pub mod stack;
pub mod storage;
pub mod time;
pub mod wire;

pub use crate::layer::{Error, Result};
pub use crate::layer::icmpv6::Socket;
pub use crate::stack::{Config, Delivery, Network};
