use super::*;

const SI_PREFIXES: &[(&str, f64)] = &[
    ("", 1.0),
    ("K", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
    ("P", 1e15),
];

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct HashRate(pub f64);

impl HashRate {
    pub const ZERO: Self = Self(0.0);

    pub fn from_hashes(hashes: u64, elapsed: Duration) -> Self {
        if elapsed.is_zero() {
            return Self::ZERO;
        }

        Self(hashes as f64 / elapsed.as_secs_f64())
    }
}

impl Display for HashRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0 == 0.0 {
            return write!(f, "0 H/s");
        }

        let (prefix, divisor) = SI_PREFIXES
            .iter()
            .rev()
            .find(|(_, div)| self.0.abs() >= *div)
            .unwrap_or(&SI_PREFIXES[0]);

        let scaled = format!("{:.3}", self.0 / divisor);
        let trimmed = scaled.trim_end_matches('0').trim_end_matches('.');

        write!(f, "{trimmed} {prefix}H/s")
    }
}
