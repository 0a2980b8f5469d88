use {
    derive_more::Display,
    serde::{
        Deserialize, Serialize,
        de::{self, Deserializer},
    },
    serde_json::Value,
    serde_with::{DeserializeFromStr, SerializeDisplay},
    snafu::Snafu,
    std::{
        fmt::{self, Formatter},
        str::FromStr,
    },
};

pub use {
    error::{InternalError, JsonRpcError},
    extension::Extension,
    job::JobParams,
    keepalive::Keepalive,
    login::{Login, LoginResult},
    message::{Id, Message},
    reconnect::Reconnect,
    submit::Submit,
};

mod error;
mod extension;
mod job;
mod keepalive;
mod login;
mod message;
mod reconnect;
mod submit;

/// Request id the client uses for its login request.
pub const LOGIN_ID: u64 = 1;

pub const METHOD_JOB: &str = "job";
pub const METHOD_KEEPALIVED: &str = "keepalived";
pub const METHOD_LOGIN: &str = "login";
pub const METHOD_SUBMIT: &str = "submit";

pub const METHOD_GET_VERSION: &str = "client.get_version";
pub const METHOD_RECONNECT: &str = "client.reconnect";
pub const METHOD_SHOW_MESSAGE: &str = "client.show_message";

#[cfg(test)]
use serde_json::json;
