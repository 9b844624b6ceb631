/*! Deadlines of blocking operations.

Socket options express timeouts as a relative [Duration] where zero traditionally means that the
operation never times out. Internally that convention is replaced by an explicit [Expiration] so
that no code path has to remember what a zero duration stands for.

[Duration]: https://doc.rust-lang.org/std/time/struct.Duration.html
[Expiration]: enum.Expiration.html
*/
use std::time::{Duration, Instant};

/// An expiration time, inversion of `Option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Expires at the given instant.
    When(Instant),
    /// Never expires.
    Never,
}

use Expiration::{When, Never};

impl Expiration {
    /// The expiration of a socket timeout started now.
    ///
    /// A zero `timeout` never expires. So does a timeout that is so large that its deadline can
    /// not be represented.
    pub fn after(timeout: Duration) -> Self {
        Self::after_from(Instant::now(), timeout)
    }

    /// The expiration of a socket timeout started at `start`.
    pub fn after_from(start: Instant, timeout: Duration) -> Self {
        if timeout == Duration::ZERO {
            return Never;
        }

        match start.checked_add(timeout) {
            Some(deadline) => When(deadline),
            None => Never,
        }
    }
}
