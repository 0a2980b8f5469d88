use {
    crate::{Algorithm, JobParams, MAX_BLOB_SIZE, SEED_SIZE, algorithm::UnknownAlgorithm},
    byteorder::{ByteOrder, LittleEndian},
    snafu::{ResultExt, Snafu, ensure},
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum JobError {
    #[snafu(display("job has no job_id"))]
    MissingJobId,

    #[snafu(display("job names no algorithm and no default is configured"))]
    MissingAlgorithm,

    #[snafu(display("job algorithm: {source}"))]
    JobAlgorithm { source: UnknownAlgorithm },

    #[snafu(display("blob is empty"))]
    EmptyBlob,

    #[snafu(display("blob has odd hex length {len}"))]
    OddBlob { len: usize },

    #[snafu(display(
        "blob is {size} bytes, expected at least {min} and less than {}",
        MAX_BLOB_SIZE
    ))]
    BlobSize { size: usize, min: usize },

    #[snafu(display("blob is not valid hex: {source}"))]
    BlobHex { source: hex::FromHexError },

    #[snafu(display("target is not valid hex: {source}"))]
    TargetHex { source: hex::FromHexError },

    #[snafu(display("target is {len} bytes, expected 4 or 8"))]
    TargetLength { len: usize },

    #[snafu(display("target is zero"))]
    ZeroTarget,

    #[snafu(display("{algorithm} job has no seed_hash"))]
    MissingSeed { algorithm: Algorithm },

    #[snafu(display("seed_hash must be {} hex characters", SEED_SIZE * 2))]
    SeedLength,

    #[snafu(display("seed_hash is not valid hex: {source}"))]
    SeedHex { source: hex::FromHexError },
}

/// A unit of work from the pool, parsed once and shared read-only by every
/// worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: String,
    pub algorithm: Algorithm,
    blob: Vec<u8>,
    /// Hashes strictly below this value are shares.
    pub target: u64,
    pub diff: u64,
    pub height: u64,
    pub seed: Option<[u8; SEED_SIZE]>,
    pub nicehash: bool,
}

impl Job {
    /// Build a job from a `job` notification or the job embedded in a login
    /// reply. `nicehash` carries the session's sticky nicehash state.
    pub fn parse(
        params: &JobParams,
        default_algorithm: Option<Algorithm>,
        nicehash: bool,
    ) -> Result<Self, JobError> {
        ensure!(!params.job_id.is_empty(), MissingJobIdSnafu);

        let algorithm = match params.algo.as_deref().filter(|algo| !algo.is_empty()) {
            Some(algo) => algo.parse().context(JobAlgorithmSnafu)?,
            None => default_algorithm.ok_or(JobError::MissingAlgorithm)?,
        };

        let mut job = Self {
            id: params.job_id.clone(),
            algorithm,
            blob: Vec::new(),
            target: 0,
            diff: 0,
            height: params.height,
            seed: None,
            nicehash,
        };

        job.set_blob(&params.blob)?;
        job.set_target(&params.target)?;

        if algorithm.requires_seed() {
            job.set_seed_hash(params.seed_hash.as_deref().unwrap_or_default())?;
        }

        Ok(job)
    }

    pub fn set_blob(&mut self, blob: &str) -> Result<(), JobError> {
        ensure!(!blob.is_empty(), EmptyBlobSnafu);
        ensure!(blob.len() % 2 == 0, OddBlobSnafu { len: blob.len() });

        let size = blob.len() / 2;
        let min = self.nonce_offset() + self.nonce_size();

        ensure!(size >= min && size < MAX_BLOB_SIZE, BlobSizeSnafu { size, min });

        self.blob = hex::decode(blob).context(BlobHexSnafu)?;

        if self.nonce() != 0 {
            self.nicehash = true;
        }

        Ok(())
    }

    /// Accepts the 4-byte compact form, rescaled to 64 bits, or a full 8-byte
    /// target. Both are little-endian.
    pub fn set_target(&mut self, target: &str) -> Result<(), JobError> {
        let raw = hex::decode(target).context(TargetHexSnafu)?;

        self.target = match raw.len() {
            4 => {
                let short = LittleEndian::read_u32(&raw);
                ensure!(short != 0, ZeroTargetSnafu);
                u64::MAX / (u64::from(u32::MAX) / u64::from(short))
            }
            8 => LittleEndian::read_u64(&raw),
            len => return TargetLengthSnafu { len }.fail(),
        };

        self.diff = if self.target == 0 {
            0
        } else {
            u64::MAX / self.target
        };

        Ok(())
    }

    pub fn set_seed_hash(&mut self, seed_hash: &str) -> Result<(), JobError> {
        if seed_hash.is_empty() {
            return MissingSeedSnafu {
                algorithm: self.algorithm,
            }
            .fail();
        }

        ensure!(seed_hash.len() == SEED_SIZE * 2, SeedLengthSnafu);

        let mut seed = [0; SEED_SIZE];
        hex::decode_to_slice(seed_hash, &mut seed).context(SeedHexSnafu)?;
        self.seed = Some(seed);

        Ok(())
    }

    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    pub fn size(&self) -> usize {
        self.blob.len()
    }

    pub fn nonce_offset(&self) -> usize {
        self.algorithm.nonce_offset()
    }

    pub fn nonce_size(&self) -> usize {
        self.algorithm.nonce_size()
    }

    /// Nonce field of the template as sent by the pool.
    pub fn nonce(&self) -> u64 {
        read_nonce(&self.blob, self.nonce_offset(), self.nonce_size())
    }

    /// Bits of the nonce a worker may change. In nicehash mode the pool owns
    /// the top byte.
    pub fn nonce_mask(&self) -> u64 {
        match (self.nonce_size(), self.nicehash) {
            (8, true) => 0x00FF_FFFF_FFFF_FFFF,
            (8, false) => u64::MAX,
            (_, true) => 0x00FF_FFFF,
            (_, false) => 0xFFFF_FFFF,
        }
    }
}

pub(crate) fn read_nonce(blob: &[u8], offset: usize, size: usize) -> u64 {
    match size {
        8 => LittleEndian::read_u64(&blob[offset..offset + 8]),
        _ => u64::from(LittleEndian::read_u32(&blob[offset..offset + 4])),
    }
}

pub(crate) fn write_nonce(blob: &mut [u8], offset: usize, size: usize, nonce: u64) {
    match size {
        8 => LittleEndian::write_u64(&mut blob[offset..offset + 8], nonce),
        _ => LittleEndian::write_u32(&mut blob[offset..offset + 4], nonce as u32),
    }
}


#[cfg(test)]
mod tests {
    use {super::*, fixtures::*};

    #[test]
    fn parse_cryptonight_job() {
        let job = job("1", "cn/r", TARGET);

        assert_eq!(job.id, "1");
        assert_eq!(job.algorithm, Algorithm::CnR);
        assert_eq!(job.size(), 268);
        assert_eq!(job.blob(), hex::decode(BLOB).unwrap());
        assert_eq!(hex::encode(job.blob()), BLOB);
        assert_eq!(job.height, HEIGHT);
        assert_eq!(job.target, 3689348814741910);
        assert_eq!(job.diff, 5000);
        assert_eq!(job.seed, None);
        assert!(!job.nicehash);
        assert_eq!(job.nonce(), 0);
        assert_eq!(job.nonce_mask(), 0xFFFF_FFFF);
    }

    #[test]
    fn long_target_is_used_directly() {
        let job = job("1", "cn/r", "0000000000010000");

        assert_eq!(job.target, 1 << 48);
        assert_eq!(job.diff, u64::MAX >> 48);
    }

    #[test]
    fn easiest_short_target() {
        assert_eq!(job("1", "cn/r", "ffffffff").target, u64::MAX);
        assert_eq!(job("1", "cn/r", "ffffffff").diff, 1);
    }

    #[test]
    fn zero_long_target_has_zero_diff() {
        let job = job("1", "cn/r", "0000000000000000");

        assert_eq!(job.target, 0);
        assert_eq!(job.diff, 0);
    }

    #[test]
    fn bad_targets() {
        for target in ["", "00000000", "711b0d", "711b0d0000", "zz1b0d00"] {
            assert!(
                Job::parse(&params("1", "cn/r", target), None, false).is_err(),
                "{target}"
            );
        }
    }

    #[test]
    fn randomx_requires_seed() {
        let job = job("1", "rx/0", TARGET);
        assert_eq!(job.seed.unwrap(), *b"12345678901234567890123456789012");

        let mut params = params("1", "rx/0", TARGET);

        params.seed_hash = None;
        assert!(matches!(
            Job::parse(&params, None, false),
            Err(JobError::MissingSeed { .. })
        ));

        params.seed_hash = Some("abcd".into());
        assert!(matches!(
            Job::parse(&params, None, false),
            Err(JobError::SeedLength)
        ));

        params.seed_hash = Some("zz".repeat(32));
        assert!(matches!(
            Job::parse(&params, None, false),
            Err(JobError::SeedHex { .. })
        ));
    }

    #[test]
    fn seed_ignored_for_other_families() {
        let mut params = params("1", "cn/r", TARGET);
        params.seed_hash = Some("not hex".into());

        assert_eq!(Job::parse(&params, None, false).unwrap().seed, None);
    }

    #[test]
    fn kawpow_layout_and_nicehash() {
        let job = job("1", "kawpow", TARGET);

        assert_eq!(job.nonce_offset(), 32);
        assert_eq!(job.nonce_size(), 8);
        assert_eq!(job.nonce(), 0x000a_80d5_404e_b5d7);
        assert!(job.nicehash);
        assert_eq!(job.nonce_mask(), 0x00FF_FFFF_FFFF_FFFF);
    }

    #[test]
    fn nonzero_template_nonce_enables_nicehash() {
        let mut blob = hex::decode(BLOB).unwrap();
        blob[42] = 0x7f;

        let params = JobParams {
            blob: hex::encode(&blob),
            ..params("1", "cn/r", TARGET)
        };

        let job = Job::parse(&params, None, false).unwrap();

        assert!(job.nicehash);
        assert_eq!(job.nonce(), 0x7f00_0000);
        assert_eq!(job.nonce_mask(), 0x00FF_FFFF);
    }

    #[test]
    fn session_nicehash_is_kept() {
        let job = Job::parse(&params("1", "cn/r", TARGET), None, true).unwrap();
        assert!(job.nicehash);
    }

    #[test]
    fn algorithm_falls_back_to_default() {
        let mut params = params("1", "cn/r", TARGET);

        params.algo = None;
        assert!(matches!(
            Job::parse(&params, None, false),
            Err(JobError::MissingAlgorithm)
        ));
        assert_eq!(
            Job::parse(&params, Some(Algorithm::CnHalf), false)
                .unwrap()
                .algorithm,
            Algorithm::CnHalf
        );

        params.algo = Some("".into());
        assert_eq!(
            Job::parse(&params, Some(Algorithm::CnHalf), false)
                .unwrap()
                .algorithm,
            Algorithm::CnHalf
        );

        params.algo = Some("cn/0".into());
        assert_eq!(
            Job::parse(&params, Some(Algorithm::CnHalf), false)
                .unwrap()
                .algorithm,
            Algorithm::Cn0
        );

        params.algo = Some("nope".into());
        assert!(matches!(
            Job::parse(&params, Some(Algorithm::CnHalf), false),
            Err(JobError::JobAlgorithm { .. })
        ));
    }

    #[test]
    fn missing_job_id() {
        assert!(matches!(
            Job::parse(&params("", "cn/r", TARGET), None, false),
            Err(JobError::MissingJobId)
        ));
    }

    #[test]
    fn blob_bounds() {
        let parse = |blob: String| {
            Job::parse(
                &JobParams {
                    blob,
                    ..params("1", "cn/r", TARGET)
                },
                None,
                false,
            )
        };

        assert!(matches!(parse(String::new()), Err(JobError::EmptyBlob)));
        assert!(matches!(parse("abc".into()), Err(JobError::OddBlob { len: 3 })));
        assert!(matches!(
            parse("00".repeat(42)),
            Err(JobError::BlobSize { size: 42, min: 43 })
        ));
        assert!(parse("00".repeat(43)).is_ok());
        assert!(parse("00".repeat(MAX_BLOB_SIZE - 1)).is_ok());
        assert!(matches!(
            parse("00".repeat(MAX_BLOB_SIZE)),
            Err(JobError::BlobSize { .. })
        ));
        assert!(matches!(
            parse("zz".repeat(76)),
            Err(JobError::BlobHex { .. })
        ));
    }

    #[test]
    fn nonce_helpers() {
        let mut blob = vec![0; 48];

        write_nonce(&mut blob, 39, 4, 0x1234_5678);
        assert_eq!(&blob[39..43], &[0x78, 0x56, 0x34, 0x12]);
        assert_eq!(read_nonce(&blob, 39, 4), 0x1234_5678);

        write_nonce(&mut blob, 32, 8, 0x0102_0304_0506_0708);
        assert_eq!(read_nonce(&blob, 32, 8), 0x0102_0304_0506_0708);
    }
}
