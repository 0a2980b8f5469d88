use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Cn,
    CnLite,
    CnHeavy,
    CnPico,
    RandomX,
    Argon2,
    AstroBwt,
    KawPow,
}

impl Display for Family {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Cn => "cn",
                Self::CnLite => "cn-lite",
                Self::CnHeavy => "cn-heavy",
                Self::CnPico => "cn-pico",
                Self::RandomX => "rx",
                Self::Argon2 => "argon2",
                Self::AstroBwt => "astrobwt",
                Self::KawPow => "kawpow",
            }
        )
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("unknown algorithm `{name}`"))]
pub struct UnknownAlgorithm {
    name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub enum Algorithm {
    Cn0,
    Cn1,
    Cn2,
    CnR,
    CnFast,
    CnHalf,
    CnXao,
    CnRto,
    CnRwz,
    CnZls,
    CnDouble,
    CnCcx,
    CnLite0,
    CnLite1,
    CnHeavy0,
    CnHeavyTube,
    CnHeavyXhv,
    CnPico0,
    CnPicoTlo,
    Rx0,
    RxWow,
    RxArq,
    RxSfx,
    RxKeva,
    Argon2Chukwa,
    Argon2ChukwaV2,
    Argon2Wrkz,
    AstroBwt,
    KawPow,
}

impl Algorithm {
    pub const ALL: [Self; 29] = [
        Self::Cn0,
        Self::Cn1,
        Self::Cn2,
        Self::CnR,
        Self::CnFast,
        Self::CnHalf,
        Self::CnXao,
        Self::CnRto,
        Self::CnRwz,
        Self::CnZls,
        Self::CnDouble,
        Self::CnCcx,
        Self::CnLite0,
        Self::CnLite1,
        Self::CnHeavy0,
        Self::CnHeavyTube,
        Self::CnHeavyXhv,
        Self::CnPico0,
        Self::CnPicoTlo,
        Self::Rx0,
        Self::RxWow,
        Self::RxArq,
        Self::RxSfx,
        Self::RxKeva,
        Self::Argon2Chukwa,
        Self::Argon2ChukwaV2,
        Self::Argon2Wrkz,
        Self::AstroBwt,
        Self::KawPow,
    ];

    /// Canonical short name, used in logs and in the `algo` submit field.
    pub fn name(self) -> &'static str {
        match self {
            Self::Cn0 => "cn/0",
            Self::Cn1 => "cn/1",
            Self::Cn2 => "cn/2",
            Self::CnR => "cn/r",
            Self::CnFast => "cn/fast",
            Self::CnHalf => "cn/half",
            Self::CnXao => "cn/xao",
            Self::CnRto => "cn/rto",
            Self::CnRwz => "cn/rwz",
            Self::CnZls => "cn/zls",
            Self::CnDouble => "cn/double",
            Self::CnCcx => "cn/ccx",
            Self::CnLite0 => "cn-lite/0",
            Self::CnLite1 => "cn-lite/1",
            Self::CnHeavy0 => "cn-heavy/0",
            Self::CnHeavyTube => "cn-heavy/tube",
            Self::CnHeavyXhv => "cn-heavy/xhv",
            Self::CnPico0 => "cn-pico",
            Self::CnPicoTlo => "cn-pico/tlo",
            Self::Rx0 => "rx/0",
            Self::RxWow => "rx/wow",
            Self::RxArq => "rx/arq",
            Self::RxSfx => "rx/sfx",
            Self::RxKeva => "rx/keva",
            Self::Argon2Chukwa => "argon2/chukwa",
            Self::Argon2ChukwaV2 => "argon2/chukwav2",
            Self::Argon2Wrkz => "argon2/wrkz",
            Self::AstroBwt => "astrobwt",
            Self::KawPow => "kawpow",
        }
    }

    /// Other names pools and users know the algorithm by. Matching is
    /// case-insensitive.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Cn0 => &["cryptonight/0", "cryptonight", "cn"],
            Self::Cn1 => &[
                "cryptonight/1",
                "cryptonight-monerov7",
                "cryptonight_v7",
            ],
            Self::Cn2 => &[
                "cryptonight/2",
                "cryptonight-monerov8",
                "cryptonight_v8",
            ],
            Self::CnR => &["cryptonight/r", "cryptonight_r"],
            Self::CnFast => &["cryptonight/fast", "cryptonight/msr", "cn/msr"],
            Self::CnHalf => &["cryptonight/half"],
            Self::CnXao => &["cryptonight/xao", "cryptonight_alloy"],
            Self::CnRto => &["cryptonight/rto"],
            Self::CnRwz => &["cryptonight/rwz"],
            Self::CnZls => &["cryptonight/zls"],
            Self::CnDouble => &["cryptonight/double"],
            Self::CnCcx => &["cryptonight/ccx", "cryptonight/conceal", "cn/conceal"],
            Self::CnLite0 => &["cryptonight-lite/0"],
            Self::CnLite1 => &[
                "cryptonight-lite/1",
                "cryptonight-lite",
                "cn-lite",
                "cryptonight-light",
                "cn-light",
                "cryptonight_lite",
                "cryptonight-aeonv7",
                "cryptonight_lite_v7",
            ],
            Self::CnHeavy0 => &[
                "cryptonight-heavy/0",
                "cryptonight-heavy",
                "cn-heavy",
                "cryptonight_heavy",
            ],
            Self::CnHeavyTube => &["cryptonight-heavy/tube", "cryptonight-bittube2"],
            Self::CnHeavyXhv => &["cryptonight-heavy/xhv", "cryptonight_haven"],
            Self::CnPico0 => &[
                "cryptonight-pico",
                "cryptonight-pico/trtl",
                "cn-pico/trtl",
                "cryptonight-turtle",
                "cn-trtl",
                "cryptonight-ultralite",
                "cn-ultralite",
                "cryptonight_turtle",
                "cn_turtle",
            ],
            Self::CnPicoTlo => &[
                "cryptonight-pico/tlo",
                "cryptonight/ultra",
                "cn/ultra",
                "cryptonight-talleo",
                "cn-talleo",
                "cryptonight_talleo",
                "cn_talleo",
            ],
            Self::Rx0 => &["randomx/0", "randomx/test", "rx/test", "randomx", "rx"],
            Self::RxWow => &["randomx/wow", "randomwow"],
            Self::RxArq => &["randomx/arq", "randomarq"],
            Self::RxSfx => &["randomx/sfx", "randomsfx"],
            Self::RxKeva => &["randomx/keva", "randomkeva"],
            Self::Argon2Chukwa => &["chukwa"],
            Self::Argon2ChukwaV2 => &["chukwav2"],
            Self::Argon2Wrkz => &[],
            Self::AstroBwt => &["astrobwt/dero"],
            Self::KawPow => &["kawpow/rvn"],
        }
    }

    pub fn family(self) -> Family {
        match self {
            Self::Cn0
            | Self::Cn1
            | Self::Cn2
            | Self::CnR
            | Self::CnFast
            | Self::CnHalf
            | Self::CnXao
            | Self::CnRto
            | Self::CnRwz
            | Self::CnZls
            | Self::CnDouble
            | Self::CnCcx => Family::Cn,
            Self::CnLite0 | Self::CnLite1 => Family::CnLite,
            Self::CnHeavy0 | Self::CnHeavyTube | Self::CnHeavyXhv => Family::CnHeavy,
            Self::CnPico0 | Self::CnPicoTlo => Family::CnPico,
            Self::Rx0 | Self::RxWow | Self::RxArq | Self::RxSfx | Self::RxKeva => Family::RandomX,
            Self::Argon2Chukwa | Self::Argon2ChukwaV2 | Self::Argon2Wrkz => Family::Argon2,
            Self::AstroBwt => Family::AstroBwt,
            Self::KawPow => Family::KawPow,
        }
    }

    /// Byte offset of the nonce field inside a job blob.
    pub fn nonce_offset(self) -> usize {
        match self.family() {
            Family::KawPow => 32,
            _ => 39,
        }
    }

    /// Width of the nonce field in bytes, either 4 or 8.
    pub fn nonce_size(self) -> usize {
        match self.family() {
            Family::KawPow => 8,
            _ => 4,
        }
    }

    pub fn requires_seed(self) -> bool {
        self.family() == Family::RandomX
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|algorithm| {
                algorithm.name().eq_ignore_ascii_case(s)
                    || algorithm
                        .aliases()
                        .iter()
                        .any(|alias| alias.eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| UnknownAlgorithm { name: s.into() })
    }
}
