use crate::config::PortRange;
use crate::error::{Error, Result};
use rand::Rng;
use std::net::{Ipv4Addr, TcpListener};

/// Number of random candidates probed before giving up.
pub const MAX_ATTEMPTS: usize = 50;

/// Picks free local TCP ports from an inclusive range.
///
/// Candidates are drawn uniformly at random rather than scanned linearly, so
/// concurrent allocators rarely collide on the same port. A candidate counts
/// as free when an exclusive bind on all interfaces succeeds; the listener is
/// dropped immediately, so another process may still grab the port before the
/// server binds it.
#[derive(Debug, Clone, Copy)]
pub struct PortAllocator {
    range: PortRange,
    attempts: usize,
}

impl PortAllocator {
    pub fn new(range: PortRange) -> Self {
        Self {
            range,
            attempts: MAX_ATTEMPTS,
        }
    }

    pub fn range(&self) -> PortRange {
        self.range
    }

    /// Returns a port that was bindable at the moment of the probe.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`] when every attempt hit a busy port.
    pub fn allocate(&self) -> Result<u16> {
        let PortRange { start, end } = self.range;
        if start > end {
            return Err(Error::ResourceExhausted { start, end });
        }

        let mut rng = rand::thread_rng();
        for attempt in 1..=self.attempts {
            let candidate = rng.gen_range(start..=end);
            if is_bindable(candidate) {
                tracing::debug!(port = candidate, attempt, "Allocated port");
                return Ok(candidate);
            }
            tracing::trace!(port = candidate, attempt, "Port busy, retrying");
        }

        tracing::warn!(start, end, attempts = self.attempts, "Port range exhausted");
        Err(Error::ResourceExhausted { start, end })
    }
}

/// Allocates a free port in `start..=end` with the default retry budget.
pub fn allocate(start: u16, end: u16) -> Result<u16> {
    PortAllocator::new(PortRange { start, end }).allocate()
}

fn is_bindable(port: u16) -> bool {
    TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).is_ok()
}
