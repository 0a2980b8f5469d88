use super::*;

const LOW_WORD: u64 = 0xFFFF_FFFF;

/// Hands out disjoint, contiguous nonce windows for one job.
///
/// Every worker mining the job shares one allocator. A reservation is a single
/// `fetch_add` on the counter, so two callers can never receive overlapping
/// windows. Once the counter runs past the usable span of the mask the
/// allocator is exhausted and stays that way.
#[derive(Debug, Default)]
pub struct NonceAllocator {
    counter: AtomicU64,
    exhausted: AtomicBool,
}

impl NonceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn with_position(position: u64) -> Self {
        Self {
            counter: AtomicU64::new(position),
            exhausted: AtomicBool::new(false),
        }
    }

    /// Reserve `reserve_count` nonces and return `nonce` with its `mask` bits
    /// replaced by the start of the reserved window.
    ///
    /// Returns `None` when `reserve_count` is zero, when the mask cannot hold
    /// a window of that size, or when the allocator is exhausted. Windows never
    /// straddle a 32-bit boundary, so callers may step through a window by
    /// incrementing the low word alone.
    pub fn reserve(&self, nonce: u64, reserve_count: u32, mask: u64) -> Option<u64> {
        if self.exhausted.load(Ordering::Relaxed) {
            return None;
        }

        let mask = mask & !(1 << 63);
        let reserve = u64::from(reserve_count);

        if reserve == 0 || mask < reserve - 1 {
            return None;
        }

        let mut counter = self.counter.fetch_add(reserve, Ordering::Relaxed);

        loop {
            if mask < counter {
                return self.exhaust();
            }

            if mask - counter <= reserve - 1 {
                if mask - counter < reserve - 1 {
                    return self.exhaust();
                }
            } else if LOW_WORD - (counter & LOW_WORD) < reserve - 1 {
                counter = self.counter.fetch_add(reserve, Ordering::Relaxed);
                continue;
            }

            return Some((nonce & !mask) | counter);
        }
    }

    #[cfg(test)]
    pub(crate) fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Relaxed)
    }

    /// Start of the next window that would be handed out.
    #[cfg(test)]
    pub(crate) fn position(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    fn exhaust(&self) -> Option<u64> {
        self.exhausted.store(true, Ordering::Relaxed);
        None
    }
}
