use std::collections::VecDeque;
use std::net::SocketAddrV6;

use super::pool::{Chain, Pool};
use crate::layer::{Error, Result};
use crate::wire::sockaddr::{self, SockAddrBuf, SOCKADDR_IN6_LEN};

/// Replies that arrived while no receiver was waiting, oldest first.
///
/// Each entry is a chain of pool segments laid out as one address length byte, the encoded source
/// address and the message bytes. The queue owns its chains but not the pool, which is shared by
/// all connections of a network and passed into every operation.
#[derive(Debug, Default)]
pub struct Readahead {
    entries: VecDeque<Chain>,
}

impl Readahead {
    /// Create an empty queue.
    pub fn new() -> Self {
        Readahead::default()
    }

    /// The number of queued messages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no message is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queue a message received from `from`.
    ///
    /// Fails with `Exhausted` if the pool can not hold the entry, in which case nothing is
    /// allocated.
    pub fn push(&mut self, pool: &mut Pool, from: &SocketAddrV6, payload: &[u8]) -> Result<()> {
        let mut addr = [0; SOCKADDR_IN6_LEN];
        sockaddr::emit(from, &mut addr);
        self.push_parts(pool, &[&[SOCKADDR_IN6_LEN as u8], &addr, payload])
    }

    /// Queue an entry made of the concatenation of `parts`.
    pub(crate) fn push_parts(&mut self, pool: &mut Pool, parts: &[&[u8]]) -> Result<()> {
        let len = parts.iter().map(|part| part.len()).sum();
        let chain = pool.alloc(len).ok_or(Error::Exhausted)?;

        let mut offset = 0;
        for part in parts {
            offset += pool.copy_in(&chain, offset, part);
        }
        debug_assert_eq!(offset, len);

        self.entries.push_back(chain);
        Ok(())
    }

    /// Deliver the oldest message into `dest`.
    ///
    /// Copies at most `dest.len()` bytes of the message and silently drops the rest. The source
    /// address is written to `from` if requested. The entry is removed and its segments freed
    /// whether or not delivery succeeded.
    pub fn drain(
        &mut self,
        pool: &mut Pool,
        dest: &mut [u8],
        from: Option<&mut SockAddrBuf>,
    ) -> Result<usize> {
        let chain = match self.entries.pop_front() {
            Some(chain) => chain,
            None => return Err(Error::NoData),
        };

        let result = Self::deliver(pool, &chain, dest, from);
        pool.free(chain);
        result
    }

    /// Free every queued entry.
    pub fn clear(&mut self, pool: &mut Pool) {
        for chain in self.entries.drain(..) {
            pool.free(chain);
        }
    }

    fn deliver(
        pool: &Pool,
        chain: &Chain,
        dest: &mut [u8],
        from: Option<&mut SockAddrBuf>,
    ) -> Result<usize> {
        let mut prefix = [0; 1];
        if pool.copy_out(chain, 0, &mut prefix) != prefix.len() {
            return Err(Error::Corrupted);
        }

        let addr_len = usize::from(prefix[0]);
        match from {
            Some(from) => {
                Self::read_addr(pool, chain, addr_len, from.buffer_mut())?;
                from.set_len(addr_len);
            },
            None => {
                let mut scratch = [0; SOCKADDR_IN6_LEN];
                Self::read_addr(pool, chain, addr_len, &mut scratch)?;
            },
        }

        Ok(pool.copy_out(chain, prefix.len() + addr_len, dest))
    }

    fn read_addr(pool: &Pool, chain: &Chain, addr_len: usize, buf: &mut [u8]) -> Result<()> {
        if addr_len > buf.len() {
            return Err(Error::InvalidArgument);
        }

        if pool.copy_out(chain, 1, &mut buf[..addr_len]) != addr_len {
            return Err(Error::Corrupted);
        }

        Ok(())
    }
}
