use super::*;

const HASH_FLUSH_INTERVAL: u64 = 1024;

/// Assignment slot between the dispatcher and one worker thread.
#[derive(Debug, Default)]
pub struct WorkerSlot {
    pending: Mutex<Option<WorkerJob>>,
    mining: AtomicBool,
}

impl WorkerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `job` for the worker, replacing any job it has not picked up yet.
    pub fn set_job(&self, job: WorkerJob) {
        *self.pending.lock() = Some(job);
    }

    /// Nothing queued and nothing being mined.
    pub fn is_idle(&self) -> bool {
        let pending = self.pending.lock();
        pending.is_none() && !self.mining.load(Ordering::Acquire)
    }

    pub(crate) fn take(&self) -> Option<WorkerJob> {
        let mut pending = self.pending.lock();
        let job = pending.take();
        self.mining.store(job.is_some(), Ordering::Release);
        job
    }
}

pub struct Worker {
    pub(crate) id: usize,
    pub(crate) slot: Arc<WorkerSlot>,
    pub(crate) generation: Arc<Generation>,
    pub(crate) hasher: Arc<dyn Hasher>,
    pub(crate) stats: Arc<Stats>,
    pub(crate) results: mpsc::Sender<JobResult>,
    pub(crate) cancel: CancellationToken,
}

impl Worker {
    pub fn spawn(self) -> io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("worker-{}", self.id))
            .spawn(move || self.run())
    }

    fn run(self) {
        debug!("Worker {} started", self.id);

        let mut next = None;

        while !self.cancel.is_cancelled() {
            match next.take().or_else(|| self.slot.take()) {
                Some(job) => next = self.mine(job),
                None => thread::sleep(IDLE_POLL_INTERVAL),
            }
        }

        debug!("Worker {} stopped", self.id);
    }

    /// Hash until the job goes stale, its nonce space runs out or shutdown is
    /// requested. Returns the successor job if the dispatcher queued one.
    fn mine(&self, mut job: WorkerJob) -> Option<WorkerJob> {
        let shared = job.job().clone();
        let mut hashes = 0;

        while self.generation.is_current(job.generation()) && !self.cancel.is_cancelled() {
            let digest = self.hasher.sum(job.blob(), shared.algorithm, shared.height);
            let nonce = job.nonce();
            let more = job.advance(RESERVE_COUNT, 1);

            if hasher::hash_value(&digest) < shared.target
                && self
                    .results
                    .blocking_send(JobResult::new(shared.clone(), nonce, digest))
                    .is_err()
            {
                break;
            }

            hashes += 1;

            if hashes == HASH_FLUSH_INTERVAL {
                self.stats.add_hashes(hashes);
                hashes = 0;
            }

            if !more {
                debug!(
                    "Worker {} exhausted nonce space for job {}",
                    self.id, shared.id
                );
                break;
            }
        }

        self.stats.add_hashes(hashes);

        self.slot.take()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, job::fixtures};

    /// Returns a winning digest only for `winning_nonce`, and counts calls.
    struct MockHasher {
        calls: AtomicU64,
        winning_nonce: Option<u32>,
    }

    impl MockHasher {
        fn new(winning_nonce: Option<u32>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU64::new(0),
                winning_nonce,
            })
        }
    }

    impl Hasher for MockHasher {
        fn sum(&self, blob: &[u8], algorithm: Algorithm, _height: u64) -> [u8; 32] {
            self.calls.fetch_add(1, Ordering::Relaxed);

            let offset = algorithm.nonce_offset();
            let nonce = LittleEndian::read_u32(&blob[offset..offset + 4]);

            match self.winning_nonce {
                None => [0; 32],
                Some(winning) if winning == nonce => [0; 32],
                Some(_) => [0xFF; 32],
            }
        }

        fn self_test(&self, _algorithm: Algorithm) -> bool {
            true
        }
    }

    struct Harness {
        slot: Arc<WorkerSlot>,
        generation: Arc<Generation>,
        stats: Arc<Stats>,
        results: mpsc::Receiver<JobResult>,
        cancel: CancellationToken,
        handle: thread::JoinHandle<()>,
    }

    impl Harness {
        fn start(hasher: Arc<dyn Hasher>, capacity: usize) -> Self {
            let slot = Arc::new(WorkerSlot::new());
            let generation = Arc::new(Generation::new());
            let stats = Arc::new(Stats::new());
            let cancel = CancellationToken::new();
            let (results_tx, results) = mpsc::channel(capacity);

            let handle = Worker {
                id: 0,
                slot: slot.clone(),
                generation: generation.clone(),
                hasher,
                stats: stats.clone(),
                results: results_tx,
                cancel: cancel.clone(),
            }
            .spawn()
            .unwrap();

            Self {
                slot,
                generation,
                stats,
                results,
                cancel,
                handle,
            }
        }

        fn dispatch(&self, job: Arc<Job>, allocator: Arc<NonceAllocator>) {
            let generation = self.generation.bump();
            self.slot
                .set_job(WorkerJob::new(job, generation, allocator, RESERVE_COUNT).unwrap());
        }

        fn wait_idle(&self) {
            let start = Instant::now();
            while !self.slot.is_idle() {
                assert!(
                    start.elapsed() < Duration::from_secs(30),
                    "worker never went idle"
                );
                thread::sleep(Duration::from_millis(1));
            }
        }

        fn stop(self) -> Arc<Stats> {
            let Self {
                stats,
                results,
                cancel,
                handle,
                ..
            } = self;

            cancel.cancel();
            drop(results);
            handle.join().unwrap();
            stats
        }
    }

    fn easy_job() -> Arc<Job> {
        Arc::new(fixtures::job("1", "cn/r", "ffffffff"))
    }

    #[test]
    fn winning_hashes_are_reported_in_nonce_order() {
        let mut harness = Harness::start(MockHasher::new(None), 8);

        harness.dispatch(easy_job(), Arc::new(NonceAllocator::new()));

        for expected in 0..8 {
            let result = harness.results.blocking_recv().unwrap();
            assert_eq!(result.nonce, expected);
            assert_eq!(result.job.id, "1");
            assert_eq!(result.digest, [0; 32]);
        }

        harness.stop();
    }

    #[test]
    fn stale_job_is_never_hashed() {
        let hasher = MockHasher::new(None);
        let harness = Harness::start(hasher.clone(), 8);

        let generation = harness.generation.bump();
        let job = WorkerJob::new(
            easy_job(),
            generation,
            Arc::new(NonceAllocator::new()),
            RESERVE_COUNT,
        )
        .unwrap();
        harness.generation.bump();
        harness.slot.set_job(job);

        harness.wait_idle();

        assert_eq!(hasher.calls.load(Ordering::Relaxed), 0);
        assert_eq!(harness.stop().totals().hashes, 0);
    }

    #[test]
    fn exhausted_job_checks_last_hash_then_idles() {
        let hasher = MockHasher::new(Some(u32::MAX));
        let mut harness = Harness::start(hasher.clone(), 8);

        let job = Arc::new(fixtures::job("1", "cn/r", fixtures::TARGET));
        harness.dispatch(
            job,
            Arc::new(NonceAllocator::with_position(
                0x1_0000_0000 - 2 * u64::from(RESERVE_COUNT),
            )),
        );

        let result = harness.results.blocking_recv().unwrap();
        assert_eq!(result.nonce, u64::from(u32::MAX));

        harness.wait_idle();

        assert_eq!(
            hasher.calls.load(Ordering::Relaxed),
            2 * u64::from(RESERVE_COUNT)
        );
        assert_eq!(
            harness.stop().totals().hashes,
            2 * u64::from(RESERVE_COUNT)
        );
    }

    #[test]
    fn newer_job_replaces_current() {
        let mut harness = Harness::start(MockHasher::new(None), 1);

        harness.dispatch(easy_job(), Arc::new(NonceAllocator::new()));
        assert_eq!(harness.results.blocking_recv().unwrap().job.id, "1");

        let second = Arc::new(fixtures::job("2", "cn/r", "ffffffff"));
        harness.dispatch(second, Arc::new(NonceAllocator::new()));

        let start = Instant::now();
        loop {
            let result = harness.results.blocking_recv().unwrap();
            if result.job.id == "2" {
                break;
            }
            assert!(start.elapsed() < Duration::from_secs(30));
        }

        harness.stop();
    }

    #[test]
    fn idle_worker_stops_on_cancel() {
        let harness = Harness::start(MockHasher::new(None), 1);
        assert!(harness.slot.is_idle());
        harness.stop();
    }
}
