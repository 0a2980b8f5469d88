use super::*;

/// Counters shared by the workers, the client and the reporter. The reporter
/// drains them every interval; lifetime totals are kept alongside.
#[derive(Debug, Default)]
pub struct Stats {
    hashes: AtomicU64,
    jobs: AtomicU64,
    submitted: AtomicU64,
    accepted: AtomicU64,
    failed: AtomicU64,
    total: Mutex<Snapshot>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub hashes: u64,
    pub jobs: u64,
    pub submitted: u64,
    pub accepted: u64,
    pub failed: u64,
}

impl Snapshot {
    fn add(&mut self, other: &Self) {
        self.hashes += other.hashes;
        self.jobs += other.jobs;
        self.submitted += other.submitted;
        self.accepted += other.accepted;
        self.failed += other.failed;
    }
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hashes(&self, hashes: u64) {
        self.hashes.fetch_add(hashes, Ordering::Relaxed);
    }

    pub fn add_job(&self) {
        self.jobs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Read and zero every counter.
    pub fn sample_and_reset(&self) -> Snapshot {
        let snapshot = Snapshot {
            hashes: self.hashes.swap(0, Ordering::Relaxed),
            jobs: self.jobs.swap(0, Ordering::Relaxed),
            submitted: self.submitted.swap(0, Ordering::Relaxed),
            accepted: self.accepted.swap(0, Ordering::Relaxed),
            failed: self.failed.swap(0, Ordering::Relaxed),
        };

        self.total.lock().add(&snapshot);

        snapshot
    }

    /// Everything counted so far, drained or not.
    pub fn totals(&self) -> Snapshot {
        let mut totals = *self.total.lock();

        totals.add(&Snapshot {
            hashes: self.hashes.load(Ordering::Relaxed),
            jobs: self.jobs.load(Ordering::Relaxed),
            submitted: self.submitted.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        });

        totals
    }
}
