//! Frame construction and the stream types that read/write frames over a transport.

pub mod frame;
pub mod tokio;

pub use frame::AmsFrame;
