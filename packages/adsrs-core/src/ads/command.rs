use super::error::AdsCommandError;

/// ADS command IDs carried in the AMS header's command field.
///
/// Identifies which operation a request/response pair performs. See the ADS
/// specification for the full semantics of each command.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AdsCommand {
    /// Invalid/unset command ID.
    Invalid,
    /// Read the name and version number of the ADS device (0x0001).
    AdsReadDeviceInfo,
    /// Read data addressed by Index Group and Index Offset (0x0002).
    AdsRead,
    /// Write data addressed by Index Group and Index Offset (0x0003).
    AdsWrite,
    /// Read the ADS state and device state (0x0004).
    AdsReadState,
    /// Change the ADS state and device state (0x0005).
    AdsWriteControl,
    /// Register a device notification (0x0006).
    AdsAddDeviceNotification,
    /// Cancel a previously registered device notification (0x0007).
    AdsDeleteDeviceNotification,
    /// Unsolicited notification delivery, normally sent Server -> Client (0x0008).
    AdsDeviceNotification,
    /// Write data and read data back in a single round trip (0x0009).
    AdsReadWrite,
    /// A command ID not recognized by this library version.
    Unknown(u16),
}

impl AdsCommand {
    /// The length of the ADS Command ID in bytes.
    pub const LENGTH: usize = 2;

    /// Creates a new `AdsCommand` from a 2-byte array (Little Endian).
    pub fn from_bytes(bytes: [u8; Self::LENGTH]) -> Self {
        Self::from(bytes)
    }

    /// Converts the command to a 2-byte array (Little Endian).
    pub fn to_bytes(&self) -> [u8; Self::LENGTH] {
        (*self).into()
    }

    /// Tries to parse an `AdsCommand` from a byte slice.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, AdsCommandError> {
        bytes.try_into()
    }
}

impl From<u16> for AdsCommand {
    fn from(value: u16) -> Self {
        match value {
            0x0000 => Self::Invalid,
            0x0001 => Self::AdsReadDeviceInfo,
            0x0002 => Self::AdsRead,
            0x0003 => Self::AdsWrite,
            0x0004 => Self::AdsReadState,
            0x0005 => Self::AdsWriteControl,
            0x0006 => Self::AdsAddDeviceNotification,
            0x0007 => Self::AdsDeleteDeviceNotification,
            0x0008 => Self::AdsDeviceNotification,
            0x0009 => Self::AdsReadWrite,
            n => Self::Unknown(n),
        }
    }
}

impl From<AdsCommand> for u16 {
    fn from(value: AdsCommand) -> Self {
        match value {
            AdsCommand::Invalid => 0x0000,
            AdsCommand::AdsReadDeviceInfo => 0x0001,
            AdsCommand::AdsRead => 0x0002,
            AdsCommand::AdsWrite => 0x0003,
            AdsCommand::AdsReadState => 0x0004,
            AdsCommand::AdsWriteControl => 0x0005,
            AdsCommand::AdsAddDeviceNotification => 0x0006,
            AdsCommand::AdsDeleteDeviceNotification => 0x0007,
            AdsCommand::AdsDeviceNotification => 0x0008,
            AdsCommand::AdsReadWrite => 0x0009,
            AdsCommand::Unknown(n) => n,
        }
    }
}

impl From<[u8; Self::LENGTH]> for AdsCommand {
    fn from(bytes: [u8; Self::LENGTH]) -> Self {
        u16::from_le_bytes(bytes).into()
    }
}

impl From<AdsCommand> for [u8; AdsCommand::LENGTH] {
    fn from(command: AdsCommand) -> Self {
        u16::from(command).to_le_bytes()
    }
}

impl TryFrom<&[u8]> for AdsCommand {
    type Error = AdsCommandError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() < AdsCommand::LENGTH {
            return Err(AdsCommandError::UnexpectedLength {
                expected: AdsCommand::LENGTH,
                got: bytes.len(),
            });
        }
        Ok(Self::from([bytes[0], bytes[1]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ads_command_conversion() {
        assert_eq!(AdsCommand::from(0x0001), AdsCommand::AdsReadDeviceInfo);
        assert_eq!(AdsCommand::from(0x0009), AdsCommand::AdsReadWrite);
        assert_eq!(AdsCommand::from(0x00FF), AdsCommand::Unknown(0x00FF));
        assert_eq!(AdsCommand::from(0), AdsCommand::Invalid);

        assert_eq!(u16::from(AdsCommand::AdsReadDeviceInfo), 0x0001);
        assert_eq!(u16::from(AdsCommand::AdsReadWrite), 0x0009);
        assert_eq!(u16::from(AdsCommand::Unknown(123)), 123);
    }

    #[test]
    fn test_ads_command_bytes_roundtrip() {
        assert_eq!(AdsCommand::AdsRead.to_bytes(), [0x02, 0x00]);
        assert_eq!(AdsCommand::from_bytes([0x08, 0x00]), AdsCommand::AdsDeviceNotification);
    }

    #[test]
    fn test_ads_command_try_from_slice() {
        assert_eq!(
            AdsCommand::try_from_slice(&[0x02, 0x00]).unwrap(),
            AdsCommand::AdsRead
        );
        assert!(matches!(
            AdsCommand::try_from_slice(&[0x02]),
            Err(AdsCommandError::UnexpectedLength { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_ads_command_ord() {
        assert!(AdsCommand::AdsReadDeviceInfo < AdsCommand::AdsReadWrite);
    }
}
