//! A memory pool of fixed-size segments.
use core::fmt;

use crate::layer::{Error, Result};

/// Preallocated memory split into equally sized segments.
///
/// Allocation hands out a [`Chain`] of segment indices. A chain is the only token granting access
/// to its segments and can not be cloned, so it must be given back with [`free`] exactly once.
///
/// [`Chain`]: struct.Chain.html
/// [`free`]: #method.free
pub struct Pool {
    /// The entirety of memory.
    memory: Box<[u8]>,

    /// The size of each segment.
    segment_len: usize,

    /// All remaining segments.
    free: Vec<usize>,
}

/// A sequence of segments holding one buffered message.
#[must_use = "segments of a chain must be returned to the pool"]
pub struct Chain {
    segments: Vec<usize>,
    len: usize,
}

impl Pool {
    /// Preallocate `count` segments of `segment_len` bytes each.
    ///
    /// Fails with `InvalidArgument` if `segment_len` is zero and with `Exhausted` if the memory
    /// can not be allocated.
    pub fn new(count: usize, segment_len: usize) -> Result<Self> {
        if segment_len == 0 {
            return Err(Error::InvalidArgument);
        }

        let total_len = count.checked_mul(segment_len).ok_or(Error::Exhausted)?;
        let mut memory = Vec::new();
        memory.try_reserve_exact(total_len).map_err(|_| Error::Exhausted)?;
        memory.resize(total_len, 0);

        let mut free = Vec::new();
        free.try_reserve_exact(count).map_err(|_| Error::Exhausted)?;
        // Reversed so that allocation pops the lowest segment first.
        free.extend((0..count).rev());

        Ok(Pool {
            memory: memory.into_boxed_slice(),
            segment_len,
            free,
        })
    }

    /// The size of each segment.
    pub fn segment_len(&self) -> usize {
        self.segment_len
    }

    /// The total number of segments.
    pub fn capacity(&self) -> usize {
        self.memory.len() / self.segment_len
    }

    /// The number of segments currently not handed out.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Allocate enough segments to hold `len` bytes.
    ///
    /// Either all required segments are reserved or none is.
    pub fn alloc(&mut self, len: usize) -> Option<Chain> {
        let count = (len + self.segment_len - 1) / self.segment_len;
        if count > self.free.len() {
            return None;
        }

        let at = self.free.len() - count;
        let mut segments = self.free.split_off(at);
        segments.reverse();
        Some(Chain { segments, len })
    }

    /// Copy `data` into the chain, starting at byte `offset` of the chain.
    ///
    /// Returns the number of bytes copied, which is less than `data.len()` only if the chain ends.
    pub fn copy_in(&mut self, chain: &Chain, offset: usize, data: &[u8]) -> usize {
        let mut copied = 0;
        while copied < data.len() {
            let at = offset + copied;
            let segment = match self.segment_range(chain, at) {
                Some(range) => range,
                None => break,
            };
            let count = segment.len().min(data.len() - copied);
            self.memory[segment.start..segment.start + count]
                .copy_from_slice(&data[copied..copied + count]);
            copied += count;
        }
        copied
    }

    /// Copy bytes of the chain starting at `offset` into `buf`.
    ///
    /// Returns the number of bytes copied, which is short when the chain holds fewer bytes.
    pub fn copy_out(&self, chain: &Chain, offset: usize, buf: &mut [u8]) -> usize {
        let mut copied = 0;
        while copied < buf.len() {
            let at = offset + copied;
            let segment = match self.segment_range(chain, at) {
                Some(range) => range,
                None => break,
            };
            let count = segment.len().min(buf.len() - copied);
            buf[copied..copied + count]
                .copy_from_slice(&self.memory[segment.start..segment.start + count]);
            copied += count;
        }
        copied
    }

    /// Give all segments of the chain back to the pool.
    pub fn free(&mut self, chain: Chain) {
        debug_assert!(self.free.len() + chain.segments.len() <= self.capacity());
        self.free.extend(chain.segments.into_iter().rev());
    }

    /// The memory range from chain byte `at` up to the end of the containing segment.
    ///
    /// Limited to the valid length of the chain.
    fn segment_range(&self, chain: &Chain, at: usize) -> Option<core::ops::Range<usize>> {
        if at >= chain.len {
            return None;
        }

        let index = chain.segments[at / self.segment_len];
        let within = at % self.segment_len;
        let remaining = (self.segment_len - within).min(chain.len - at);
        let start = index * self.segment_len + within;
        Some(start..start + remaining)
    }
}

impl Chain {
    /// The number of valid bytes in the chain.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the chain holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of segments reserved by the chain.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Pool")
            .field("segment_len", &self.segment_len)
            .field("capacity", &self.capacity())
            .field("available", &self.available())
            .finish()
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Chain")
            .field("segments", &self.segments.len())
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_is_all_or_nothing() {
        let mut pool = Pool::new(4, 8).unwrap();
        assert_eq!(pool.capacity(), 4);

        let big = pool.alloc(20).unwrap();
        assert_eq!(big.segment_count(), 3);
        assert_eq!(pool.available(), 1);

        assert!(pool.alloc(9).is_none());
        assert_eq!(pool.available(), 1);

        pool.free(big);
        assert_eq!(pool.available(), 4);
    }

    #[test]
    fn copy_across_segments() {
        let mut pool = Pool::new(4, 4).unwrap();
        let data: Vec<u8> = (0..10).collect();
        let chain = pool.alloc(data.len()).unwrap();
        assert_eq!(pool.copy_in(&chain, 0, &data), 10);

        let mut out = [0; 16];
        assert_eq!(pool.copy_out(&chain, 0, &mut out), 10);
        assert_eq!(&out[..10], &data[..]);

        let mut tail = [0; 4];
        assert_eq!(pool.copy_out(&chain, 7, &mut tail), 3);
        assert_eq!(&tail[..3], &[7, 8, 9]);

        pool.free(chain);
    }

    #[test]
    fn oversized_pool_is_refused() {
        assert!(matches!(Pool::new(usize::MAX, 2), Err(Error::Exhausted)));
        assert!(matches!(Pool::new(usize::MAX, 1), Err(Error::Exhausted)));
        assert!(matches!(Pool::new(4, 0), Err(Error::InvalidArgument)));
    }

    #[test]
    fn empty_chain() {
        let mut pool = Pool::new(1, 4).unwrap();
        let chain = pool.alloc(0).unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.segment_count(), 0);
        assert_eq!(pool.available(), 1);
        pool.free(chain);
    }
}
