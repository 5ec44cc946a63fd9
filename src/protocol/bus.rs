use defmt::Format;

use super::catalog::Frame;

/// Bound on a bus operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum Timeout {
    /// Single attempt, no waiting
    Poll,
    /// Retry for up to given number of milliseconds
    After(u32),
    /// Wait as long as needed
    Never,
}

impl Timeout {
    /// Check if the time limit has passed, handles clock wrap-around
    pub fn expired(&self, start_ms: u32, now_ms: u32) -> bool {
        match self {
            Self::Poll => true,
            Self::After(ms) => now_ms.wrapping_sub(start_ms) >= *ms,
            Self::Never => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum TxError {
    /// No transmit slot became free before the timeout
    Timeout,
    /// Driver reported an error
    Bus,
    /// Frame cannot be represented by the driver
    InvalidFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum RxError {
    /// Nothing received before the timeout
    Timeout,
    /// Driver reported an error, e.g. receive FIFO overrun
    Bus,
}

/// Shared bus transport
///
/// Both operations block the caller for at most the given [`Timeout`].
pub trait Bus {
    fn transmit(&mut self, frame: &Frame, timeout: Timeout) -> Result<(), TxError>;

    fn receive(&mut self, timeout: Timeout) -> Result<Frame, RxError>;
}

/// Monotonic millisecond counter, allowed to wrap
pub trait Clock {
    fn now_ms(&self) -> u32;
}

impl<F: Fn() -> u32> Clock for F {
    fn now_ms(&self) -> u32 {
        self()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_expires_immediately() {
        assert!(Timeout::Poll.expired(100, 100));
    }

    #[test]
    fn never_expires() {
        assert!(!Timeout::Never.expired(0, u32::MAX));
    }

    #[test]
    fn after_expires_at_limit() {
        let t = Timeout::After(1000);
        assert!(!t.expired(500, 500));
        assert!(!t.expired(500, 1499));
        assert!(t.expired(500, 1500));
    }

    #[test]
    fn after_handles_wrap_around() {
        let t = Timeout::After(10);
        let start = u32::MAX - 3;
        assert!(!t.expired(start, start.wrapping_add(9)));
        assert!(t.expired(start, start.wrapping_add(10)));
    }

    #[test]
    fn closure_as_clock() {
        let clock = || 42u32;
        assert_eq!(clock.now_ms(), 42);
    }
}
