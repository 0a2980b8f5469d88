use {
    super::*,
    bitcoin::hashes::{Hash, HashEngine, sha256d},
};

pub(crate) const SELF_TEST_BLOB: &str = "1010f1c2eb830614c310e956721ef3e47e882d077c2d2f161a9a2ae5567419b4d7b54e40d5800a0000000070b340380900000020123822000000000000000000000000000000000000000000000000000000000000000000000000308f1744ee050000c06891b8c30000000000000000000000000000000000000000000000000000000000000000000000202708d10516000000c78abc7b1600000025b190ff16000000fda372b1170000931ecff705873a888568c0fb25a4a979ca5ca798f2f9994a6266ec197d175eee4398a8d498c4b875f8cbc9147cda00d98bbe60103a293aad30157bd2a51a4fd5b99d52ce015b5ee297c58f79d409ff2b793e08e05a1f94bf76b6013e120db18001";
pub(crate) const SELF_TEST_HEIGHT: u64 = 835301;

/// Proof-of-work function. Implementations must be safe to call from many
/// worker threads at once.
pub trait Hasher: Send + Sync {
    fn sum(&self, blob: &[u8], algorithm: Algorithm, height: u64) -> [u8; 32];

    fn self_test(&self, algorithm: Algorithm) -> bool;
}

/// The value compared against a job target: the last eight digest bytes,
/// little-endian.
pub fn hash_value(digest: &[u8; 32]) -> u64 {
    LittleEndian::read_u64(&digest[24..])
}

/// Reference backend: double SHA-256 over the blob, the algorithm's short
/// name and the little-endian height.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256dHasher;

impl Hasher for Sha256dHasher {
    fn sum(&self, blob: &[u8], algorithm: Algorithm, height: u64) -> [u8; 32] {
        let mut engine = sha256d::Hash::engine();
        engine.input(blob);
        engine.input(algorithm.name().as_bytes());
        engine.input(&height.to_le_bytes());
        sha256d::Hash::from_engine(engine).to_byte_array()
    }

    fn self_test(&self, algorithm: Algorithm) -> bool {
        let Ok(mut blob) = hex::decode(SELF_TEST_BLOB) else {
            return false;
        };

        let first = self.sum(&blob, algorithm, SELF_TEST_HEIGHT);
        let second = self.sum(&blob, algorithm, SELF_TEST_HEIGHT);

        blob[algorithm.nonce_offset()] ^= 1;

        let neighbour = self.sum(&blob, algorithm, SELF_TEST_HEIGHT);

        first == second && first != neighbour
    }
}
