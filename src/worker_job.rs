use super::*;

/// One worker's private view of a job: its own copy of the blob with the
/// nonce field stepped through the windows it reserves.
#[derive(Debug)]
pub struct WorkerJob {
    job: Arc<Job>,
    generation: u64,
    allocator: Arc<NonceAllocator>,
    blob: Vec<u8>,
    rounds: u32,
    nonce_mask: u64,
}

impl WorkerJob {
    /// Returns `None` if the allocator has no window left for this worker.
    pub fn new(
        job: Arc<Job>,
        generation: u64,
        allocator: Arc<NonceAllocator>,
        reserve_count: u32,
    ) -> Option<Self> {
        let mut worker_job = Self {
            blob: job.blob().to_vec(),
            nonce_mask: job.nonce_mask(),
            job,
            generation,
            allocator,
            rounds: 0,
        };

        let nonce =
            worker_job
                .allocator
                .reserve(worker_job.nonce(), reserve_count, worker_job.nonce_mask)?;

        worker_job.set_nonce(nonce);

        Some(worker_job)
    }

    /// Move to the next nonce. Every `batch_size` calls a fresh window of
    /// `batch_size * step_size` nonces is reserved; in between the low word is
    /// bumped by `step_size`. Returns `false` once the allocator is exhausted.
    pub fn advance(&mut self, batch_size: u32, step_size: u32) -> bool {
        debug_assert!(batch_size.is_power_of_two());

        self.rounds = self.rounds.wrapping_add(1);

        if self.rounds & (batch_size - 1) == 0 {
            match self.allocator.reserve(
                self.nonce(),
                batch_size.saturating_mul(step_size),
                self.nonce_mask,
            ) {
                Some(nonce) => self.set_nonce(nonce),
                None => return false,
            }
        } else {
            let offset = self.job.nonce_offset();
            let field = &mut self.blob[offset..offset + 4];
            let low = LittleEndian::read_u32(field);
            LittleEndian::write_u32(field, low.wrapping_add(step_size));
        }

        true
    }

    pub fn job(&self) -> &Arc<Job> {
        &self.job
    }

    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn nonce_mask(&self) -> u64 {
        self.nonce_mask
    }

    pub fn nonce(&self) -> u64 {
        job::read_nonce(&self.blob, self.job.nonce_offset(), self.job.nonce_size())
    }

    fn set_nonce(&mut self, nonce: u64) {
        job::write_nonce(
            &mut self.blob,
            self.job.nonce_offset(),
            self.job.nonce_size(),
            nonce,
        );
    }
}
