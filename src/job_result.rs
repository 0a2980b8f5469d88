use super::*;

/// A hash below the job target, on its way to the pool.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub job: Arc<Job>,
    pub nonce: u64,
    pub digest: [u8; 32],
    pub found: Instant,
}

impl JobResult {
    pub fn new(job: Arc<Job>, nonce: u64, digest: [u8; 32]) -> Self {
        Self {
            job,
            nonce,
            digest,
            found: Instant::now(),
        }
    }

    /// Nonce as it appears in the blob: little-endian, one byte per two hex
    /// characters.
    pub fn nonce_hex(&self) -> String {
        match self.job.nonce_size() {
            8 => hex::encode(self.nonce.to_le_bytes()),
            _ => hex::encode((self.nonce as u32).to_le_bytes()),
        }
    }

    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }

    pub fn submit(&self, session: &str, include_algorithm: bool) -> Submit {
        Submit {
            id: session.into(),
            job_id: self.job.id.clone(),
            nonce: self.nonce_hex(),
            result: self.digest_hex(),
            algo: include_algorithm.then(|| self.job.algorithm.name().into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, job::fixtures};

    #[test]
    fn four_byte_nonce() {
        let result = JobResult::new(
            Arc::new(fixtures::job("7", "cn/r", fixtures::TARGET)),
            0x0a0b_0c0d,
            [0xab; 32],
        );

        assert_eq!(result.nonce_hex(), "0d0c0b0a");
        assert_eq!(result.digest_hex(), "ab".repeat(32));
    }

    #[test]
    fn eight_byte_nonce() {
        let result = JobResult::new(
            Arc::new(fixtures::job("7", "kawpow", fixtures::TARGET)),
            0x0102_0304_0506_0708,
            [0; 32],
        );

        assert_eq!(result.nonce_hex(), "0807060504030201");
    }

    #[test]
    fn submit_params() {
        let result = JobResult::new(
            Arc::new(fixtures::job("7", "cn/r", fixtures::TARGET)),
            1,
            [0; 32],
        );

        let submit = result.submit("session", false);
        assert_eq!(submit.id, "session");
        assert_eq!(submit.job_id, "7");
        assert_eq!(submit.nonce, "01000000");
        assert_eq!(submit.algo, None);

        assert_eq!(
            result.submit("session", true).algo.as_deref(),
            Some("cn/r")
        );
    }
}
