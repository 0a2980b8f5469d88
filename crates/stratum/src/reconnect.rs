use super::*;

/// Params of `client.reconnect`: `[host, port, wait]`. Pools send the port and
/// the wait in seconds either as numbers or as strings; both may be omitted,
/// in which case the client reconnects to its current host and port.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconnect {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub wait: u64,
}

impl Reconnect {
    /// `host:port` to use for the next connection, if the pool named one.
    pub fn address(&self) -> Option<String> {
        match (&self.host, self.port) {
            (Some(host), Some(port)) => Some(format!("{host}:{port}")),
            _ => None,
        }
    }
}

fn number<T: FromStr>(value: Option<&Value>, field: &'static str) -> Result<Option<T>, String> {
    let text = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if s.is_empty() => return Ok(None),
        Some(Value::String(s)) => s.clone(),
        Some(other) => return Err(format!("invalid {field}: {other}")),
    };

    text.parse()
        .map(Some)
        .map_err(|_| format!("invalid {field}: {text}"))
}

impl<'de> Deserialize<'de> for Reconnect {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let params = match Value::deserialize(deserializer)? {
            Value::Null => Vec::new(),
            Value::Array(params) => params,
            other => return Err(de::Error::custom(format!("expected array, got {other}"))),
        };

        let host = match params.first() {
            None | Some(Value::Null) => None,
            Some(Value::String(host)) if host.is_empty() => None,
            Some(Value::String(host)) => Some(host.clone()),
            Some(other) => return Err(de::Error::custom(format!("invalid host: {other}"))),
        };

        Ok(Self {
            host,
            port: number(params.get(1), "port").map_err(de::Error::custom)?,
            wait: number(params.get(2), "wait")
                .map_err(de::Error::custom)?
                .unwrap_or_default(),
        })
    }
}
