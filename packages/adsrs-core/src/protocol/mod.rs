//! Binary wire format definitions for ADS/AMS communication.
//!
//! This module provides the low-level structs and enums that map directly to the byte streams
//! exchanged with ADS devices. It covers the main layers of an AMS message:
//!
//! * **Framing**: The `packet` and `header` modules handle the AMS Packet structure and Routing Header.
//! * **Payloads**: The `commands` module defines the specific data layouts for operations like Read, Write, or Device Info.
//! * **Metadata**: Helper types like `state_flags` and `index_groups` provide constants and bitmasks required for valid communication.
//!
//! These types are transport-agnostic; they describe *what* is sent, not *how* it is sent (TCP vs UDP).

pub mod error;
pub mod get_local_net_id;
pub mod index_groups;
pub mod messages;
pub mod notification;
pub mod port_connect;

pub use error::ProtocolError;
pub use get_local_net_id::{GetLocalNetIdRequest, GetLocalNetIdResponse};
pub use index_groups::ReservedIndexGroup;
pub use messages::{
    AdsAddDeviceNotificationRequest, AdsAddDeviceNotificationResponse, AdsDeviceInfoResponse,
    AdsDeleteDeviceNotificationRequest, AdsDeleteDeviceNotificationResponse, AdsReadRequest,
    AdsReadResponse, AdsReadStateResponse, AdsReadWriteRequest, AdsReadWriteResponse,
    AdsWriteControlRequest, AdsWriteControlResponse, AdsWriteRequest, AdsWriteResponse,
};
pub use notification::{
    AdsDeviceNotification, AdsDeviceNotificationOwned, AdsNotificationSample,
    AdsNotificationSampleOwned, AdsStampHeader, AdsStampHeaderOwned,
};
pub use port_connect::{PortConnectRequest, PortConnectResponse};
