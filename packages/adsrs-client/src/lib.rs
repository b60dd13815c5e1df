//! Async client for the TwinCAT ADS protocol.
//!
//! [`Connection`] owns a single multiplexed TCP socket to an AMS router or device and
//! exposes the high-level ADS operations (`read`/`write`/notifications/symbol lookup)
//! as async methods, implemented in [`ops`]. [`ConnectionConfig`] carries connection-time
//! defaults; [`ClientError`] is the uniform error type for every fallible operation.

pub mod config;
pub mod connection;
pub mod error;
pub mod ops;
pub mod symbols;

pub use adsrs_core::ads::{AdsReturnCode, AdsState, AdsString, AdsTransMode, NotificationHandle};
pub use adsrs_core::ams::{AmsAddr, AmsNetId, AmsPort};

pub use config::{ConnectionConfig, DEFAULT_ADS_PORT, DEFAULT_ROUTER_PORT};
pub use connection::{Connection, NotificationCallback, DEFAULT_SOURCE_PORT};
pub use error::{ClientError, Result};
pub use ops::WireValue;
pub use symbols::SymbolInfo;
