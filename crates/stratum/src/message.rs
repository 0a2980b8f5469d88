use super::*;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Clone)]
#[serde(untagged)]
pub enum Id {
    Null,
    Number(u64),
    String(String),
}

impl Id {
    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(s) => s.parse().ok(),
            Self::Null => None,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Message {
    Request {
        id: Id,
        method: String,
        params: Value,
    },
    Response {
        id: Id,
        result: Option<Value>,
        error: Option<JsonRpcError>,
    },
    Notification {
        method: String,
        params: Value,
    },
}

/// Pools announce new work with `"id":0`, with `"id":null`, or with no id at
/// all. All three are treated as notifications. Anything carrying a `result`
/// or an `error` is a response, whatever its id.
impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        if !value.is_object() {
            return Err(de::Error::custom("message is not a JSON object"));
        }

        let has_method = value.get("method").is_some_and(|method| !method.is_null());

        let is_response = !has_method
            && (value.get("result").is_some() || value.get("error").is_some());

        let is_notification = has_method
            && match value.get("id") {
                None | Some(Value::Null) => true,
                Some(id) => id.as_u64() == Some(0),
            };

        if is_response {
            #[derive(Deserialize)]
            struct Resp {
                id: Id,
                result: Option<Value>,
                error: Option<JsonRpcError>,
            }

            let r: Resp = serde_json::from_value(value).map_err(de::Error::custom)?;

            Ok(Message::Response {
                id: r.id,
                result: r.result,
                error: r.error,
            })
        } else if is_notification {
            let method = value
                .get("method")
                .and_then(Value::as_str)
                .ok_or_else(|| de::Error::missing_field("method"))?
                .to_string();

            let params = value.get("params").cloned().unwrap_or(Value::Null);

            Ok(Message::Notification { method, params })
        } else if has_method {
            #[derive(Deserialize)]
            struct Req {
                id: Id,
                method: String,
                #[serde(default)]
                params: Value,
            }

            let r: Req = serde_json::from_value(value).map_err(de::Error::custom)?;

            Ok(Message::Request {
                id: r.id,
                method: r.method,
                params: r.params,
            })
        } else {
            Err(de::Error::custom("unknown message format"))
        }
    }
}
