use crate::ams::{self, AmsCommand, AmsNetId};
use crate::io::frame::AmsFrame;
use crate::protocol::ProtocolError;

/// Request for the router's currently assigned local AMS Net ID.
///
/// Sent once at connect time when the caller hasn't been told its own NetId
/// out of band (e.g. no loopback PortConnect handshake was performed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GetLocalNetIdRequest;

impl GetLocalNetIdRequest {
    pub fn into_frame() -> AmsFrame {
        AmsFrame::from(Self)
    }
}

impl From<GetLocalNetIdRequest> for AmsFrame {
    fn from(_: GetLocalNetIdRequest) -> Self {
        Self::new(AmsCommand::GetLocalNetId, [0u8; 4])
    }
}

/// Response carrying the router's local AMS Net ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GetLocalNetIdResponse {
    net_id: AmsNetId,
}

impl GetLocalNetIdResponse {
    pub fn net_id(&self) -> AmsNetId {
        self.net_id
    }
}

impl TryFrom<AmsFrame> for GetLocalNetIdResponse {
    type Error = ProtocolError;

    fn try_from(value: AmsFrame) -> Result<Self, Self::Error> {
        let header = value.header();

        if header.command() != AmsCommand::GetLocalNetId {
            return Err(ProtocolError::UnexpectedCommand {
                expected: AmsCommand::GetLocalNetId,
                got: header.command(),
            });
        }

        if value.payload().len() < ams::NETID_LEN {
            return Err(ProtocolError::Truncated {
                expected: ams::NETID_LEN,
                got: value.payload().len(),
            });
        }

        let net_id = AmsNetId::try_from(&value.payload()[..ams::NETID_LEN])
            .map_err(ams::AmsError::from)?;

        Ok(Self { net_id })
    }
}
