use adsrs_core::ads::AdsReturnCode;
use thiserror::Error;

/// Errors surfaced by the client.
///
/// Mirrors the two-tier taxonomy of the underlying protocol: fatal transport/framing
/// failures that make the connection unusable, and protocol-level failures (a non-zero
/// ADS return code) that only fail the individual call. `Result<T, ClientError>` is the
/// uniform return type for every fallible operation; there is no sentinel empty-result
/// convention as there would be in a null-object-returning implementation.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Socket-level failure: connect, read, or write.
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),
    /// A response frame failed to decode (bad framing, truncated buffer, wrong command).
    #[error("protocol error: {0}")]
    Protocol(#[from] adsrs_core::protocol::ProtocolError),
    /// The remote device returned a non-zero ADS result code.
    #[error("device returned an ADS error: {0}")]
    Ads(AdsReturnCode),
    /// No response arrived within the configured retry budget.
    #[error("operation timed out waiting for a response")]
    Timeout,
    /// The connection was torn down (explicitly or by a fatal transport error).
    #[error("connection closed")]
    ConnectionClosed,
    /// A response frame parsed correctly but carried an unexpected command/shape.
    #[error("unexpected response")]
    UnexpectedResponse,
    /// A symbol name or data length did not fit the fixed-capacity wire representation.
    #[error("value does not fit the wire representation: {0}")]
    Encoding(String),
    /// Failed to parse a `ConnectionConfig` from TOML.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    /// The target is not the loopback address and no `source_net_id` override was
    /// configured, so there is no router to ask for a self-assigned AMS identity.
    #[error(
        "no source AMS identity available: target is not loopback and \
         ConnectionConfig::source_net_id was not set"
    )]
    MissingSourceIdentity,
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// True for errors that make the connection itself unusable (as opposed to failing
    /// only the call that produced them).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClientError::Io(_) | ClientError::Timeout | ClientError::ConnectionClosed
        )
    }
}
