use {super::*, derive_more::Display, tokio_util::codec::LinesCodecError};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ClientError {
    #[snafu(display("Connection timeout: {source}"))]
    Timeout { source: tokio::time::error::Elapsed },

    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },

    #[snafu(display("Framing error: {source}"))]
    Framing { source: LinesCodecError },

    #[snafu(display("Serialization error: {source}"))]
    Serialization { source: serde_json::Error },

    #[snafu(display("Not connected"))]
    NotConnected,

    #[snafu(display("Login rejected: {error}"))]
    LoginRejected { error: JsonRpcError },

    #[snafu(display("Login timed out"))]
    LoginTimeout,

    #[snafu(display("Disconnected: {reason}"))]
    Disconnected { reason: DisconnectReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DisconnectReason {
    #[display("server closed connection")]
    ServerClosed,
    #[display("shutdown requested")]
    Shutdown,
    #[display("reconnect requested")]
    Reconnect,
}
