use crate::ads::{AdsCommand, AdsError};
use crate::ams::{AmsCommand, AmsError};
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
    #[error("AMS Error: {0}")]
    Ams(#[from] AmsError),
    #[error("ADS Error: {0}")]
    Ads(#[from] AdsError),
    #[error("Unexpected AMS Command: expected {expected:?}, got {got:?}")]
    UnexpectedCommand { expected: AmsCommand, got: AmsCommand },
    #[error("Unexpected ADS Command: expected {expected:?}, got {got:?}")]
    UnexpectedAdsCommand {
        expected: AdsCommand,
        got: AdsCommand,
    },
    #[error("Unexpected Length: expected {expected}, got {got}")]
    UnexpectedLength { expected: usize, got: usize },
    /// Payload too short to even hold a fixed-size header.
    #[error("Payload truncated: need at least {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },
}
