use super::*;

/// Protocol extension a pool may advertise in its login reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub enum Extension {
    /// Jobs may carry an `algo` field and submits report the algorithm.
    Algo,
    /// The pool fixes the high byte of the nonce.
    Nicehash,
    Connect,
    /// The pool expects `keepalived` requests on idle connections.
    Keepalive,
}

impl Extension {
    pub const ALL: [Extension; 4] = [
        Extension::Algo,
        Extension::Nicehash,
        Extension::Connect,
        Extension::Keepalive,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Algo => "algo",
            Self::Nicehash => "nicehash",
            Self::Connect => "connect",
            Self::Keepalive => "keepalive",
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Extension {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|extension| extension.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| InternalError::Parse {
                message: format!("unknown extension '{s}'"),
            })
    }
}
