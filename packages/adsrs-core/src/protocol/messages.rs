//! Typed request and response payloads for every ADS command.
//!
//! Each type parses or writes only the *fixed* portion of its payload; variable-length
//! data (read results, write data, notification samples) immediately follows in the
//! stream and is handled by the caller, which already knows the declared length.

use std::io::{self, Read, Write};
use std::time::Duration;

use crate::ads::{AdsReturnCode, AdsState, AdsString, AdsTransMode, NotificationHandle};

/// Payload for `AdsRead`. Client -> Server.
///
/// ```text
/// [ Index Group (4) ] [ Index Offset (4) ] [ Length (4) ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdsReadRequest {
    index_group: u32,
    index_offset: u32,
    length: u32,
}

impl AdsReadRequest {
    pub const SIZE: usize = 12;

    pub fn new(index_group: u32, index_offset: u32, length: u32) -> Self {
        Self {
            index_group,
            index_offset,
            length,
        }
    }

    pub fn index_group(&self) -> u32 {
        self.index_group
    }

    pub fn index_offset(&self) -> u32 {
        self.index_offset
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.index_group.to_le_bytes())?;
        w.write_all(&self.index_offset.to_le_bytes())?;
        w.write_all(&self.length.to_le_bytes())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)?;
        Ok(Self {
            index_group: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            index_offset: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            length: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
        })
    }
}

/// Fixed header for `AdsRead` response. Server -> Client.
///
/// The actual read data immediately follows in the stream.
///
/// ```text
/// [ Result (4) ] [ Length (4) ] [ Data (n)... ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdsReadResponse {
    result: AdsReturnCode,
    length: u32,
}

impl AdsReadResponse {
    pub const SIZE: usize = 8;

    pub fn new(result: AdsReturnCode, length: u32) -> Self {
        Self { result, length }
    }

    pub fn result(&self) -> AdsReturnCode {
        self.result
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&u32::from(self.result).to_le_bytes())?;
        w.write_all(&self.length.to_le_bytes())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)?;
        Ok(Self {
            result: AdsReturnCode::from(u32::from_le_bytes(buf[0..4].try_into().unwrap())),
            length: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
        })
    }
}

/// Fixed header for `AdsWrite`. Client -> Server. Data follows in the stream.
///
/// ```text
/// [ Index Group (4) ] [ Index Offset (4) ] [ Length (4) ] [ Data (n)... ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdsWriteRequest {
    index_group: u32,
    index_offset: u32,
    length: u32,
}

impl AdsWriteRequest {
    pub const SIZE: usize = 12;

    pub fn new(index_group: u32, index_offset: u32, length: u32) -> Self {
        Self {
            index_group,
            index_offset,
            length,
        }
    }

    pub fn index_group(&self) -> u32 {
        self.index_group
    }

    pub fn index_offset(&self) -> u32 {
        self.index_offset
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.index_group.to_le_bytes())?;
        w.write_all(&self.index_offset.to_le_bytes())?;
        w.write_all(&self.length.to_le_bytes())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)?;
        Ok(Self {
            index_group: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            index_offset: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            length: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
        })
    }
}

/// Response for `AdsWrite`. Server -> Client.
///
/// ```text
/// [ Result (4) ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdsWriteResponse {
    result: AdsReturnCode,
}

impl AdsWriteResponse {
    pub const SIZE: usize = 4;

    pub fn new(result: AdsReturnCode) -> Self {
        Self { result }
    }

    pub fn result(&self) -> AdsReturnCode {
        self.result
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&u32::from(self.result).to_le_bytes())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)?;
        Ok(Self {
            result: AdsReturnCode::from(u32::from_le_bytes(buf)),
        })
    }
}

/// Fixed header for `AdsReadWrite`. Client -> Server. Write data follows in the stream.
///
/// ```text
/// [ Group (4) ] [ Offset (4) ] [ ReadLen (4) ] [ WriteLen (4) ] [ Write Data (n)... ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdsReadWriteRequest {
    index_group: u32,
    index_offset: u32,
    read_length: u32,
    write_length: u32,
}

impl AdsReadWriteRequest {
    pub const SIZE: usize = 16;

    pub fn new(index_group: u32, index_offset: u32, read_length: u32, write_length: u32) -> Self {
        Self {
            index_group,
            index_offset,
            read_length,
            write_length,
        }
    }

    pub fn index_group(&self) -> u32 {
        self.index_group
    }

    pub fn index_offset(&self) -> u32 {
        self.index_offset
    }

    pub fn read_length(&self) -> u32 {
        self.read_length
    }

    pub fn write_length(&self) -> u32 {
        self.write_length
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.index_group.to_le_bytes())?;
        w.write_all(&self.index_offset.to_le_bytes())?;
        w.write_all(&self.read_length.to_le_bytes())?;
        w.write_all(&self.write_length.to_le_bytes())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)?;
        Ok(Self {
            index_group: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            index_offset: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            read_length: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            write_length: u32::from_le_bytes(buf[12..16].try_into().unwrap()),
        })
    }
}

/// Response for `AdsReadWrite`. Identical wire shape to [`AdsReadResponse`].
pub type AdsReadWriteResponse = AdsReadResponse;

/// Payload for `AdsWriteControl`. Client -> Server. Additional data follows in the stream.
///
/// ```text
/// [ AdsState (2) ] [ DevState (2) ] [ Length (4) ] [ Data... ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdsWriteControlRequest {
    ads_state: AdsState,
    device_state: u16,
    length: u32,
}

impl AdsWriteControlRequest {
    pub const SIZE: usize = 8;

    pub fn new(ads_state: AdsState, device_state: u16, length: u32) -> Self {
        Self {
            ads_state,
            device_state,
            length,
        }
    }

    pub fn ads_state(&self) -> AdsState {
        self.ads_state
    }

    pub fn device_state(&self) -> u16 {
        self.device_state
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&u16::from(self.ads_state).to_le_bytes())?;
        w.write_all(&self.device_state.to_le_bytes())?;
        w.write_all(&self.length.to_le_bytes())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)?;
        Ok(Self {
            ads_state: AdsState::from(u16::from_le_bytes(buf[0..2].try_into().unwrap())),
            device_state: u16::from_le_bytes(buf[2..4].try_into().unwrap()),
            length: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
        })
    }
}

/// Response for `AdsWriteControl`. Identical wire shape to [`AdsWriteResponse`].
pub type AdsWriteControlResponse = AdsWriteResponse;

/// Response for `AdsReadDeviceInfo`. Server -> Client.
///
/// ```text
/// [ Result (4) ] [ Maj (1) ] [ Min (1) ] [ Build (2) ] [ Device Name (16) ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdsDeviceInfoResponse {
    result: AdsReturnCode,
    major_version: u8,
    minor_version: u8,
    version_build: u16,
    device_name: AdsString<16>,
}

impl AdsDeviceInfoResponse {
    pub const SIZE: usize = 24;

    pub fn new(result: AdsReturnCode, major: u8, minor: u8, build: u16, name: AdsString<16>) -> Self {
        Self {
            result,
            major_version: major,
            minor_version: minor,
            version_build: build,
            device_name: name,
        }
    }

    pub fn result(&self) -> AdsReturnCode {
        self.result
    }

    pub fn major_version(&self) -> u8 {
        self.major_version
    }

    pub fn minor_version(&self) -> u8 {
        self.minor_version
    }

    pub fn version_build(&self) -> u16 {
        self.version_build
    }

    pub fn device_name(&self) -> &AdsString<16> {
        &self.device_name
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&u32::from(self.result).to_le_bytes())?;
        w.write_all(&self.major_version.to_le_bytes())?;
        w.write_all(&self.minor_version.to_le_bytes())?;
        w.write_all(&self.version_build.to_le_bytes())?;
        w.write_all(self.device_name.as_bytes())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)?;

        let name_bytes: [u8; 16] = buf[8..24].try_into().unwrap();
        Ok(Self {
            result: AdsReturnCode::from(u32::from_le_bytes(buf[0..4].try_into().unwrap())),
            major_version: buf[4],
            minor_version: buf[5],
            version_build: u16::from_le_bytes(buf[6..8].try_into().unwrap()),
            device_name: AdsString::from(name_bytes),
        })
    }
}

/// Response for `AdsReadState`. Server -> Client.
///
/// ```text
/// [ Result (4) ] [ AdsState (2) ] [ DevState (2) ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdsReadStateResponse {
    result: AdsReturnCode,
    ads_state: AdsState,
    device_state: u16,
}

impl AdsReadStateResponse {
    pub const SIZE: usize = 8;

    pub fn new(result: AdsReturnCode, ads_state: AdsState, device_state: u16) -> Self {
        Self {
            result,
            ads_state,
            device_state,
        }
    }

    pub fn result(&self) -> AdsReturnCode {
        self.result
    }

    pub fn ads_state(&self) -> AdsState {
        self.ads_state
    }

    pub fn device_state(&self) -> u16 {
        self.device_state
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&u32::from(self.result).to_le_bytes())?;
        w.write_all(&u16::from(self.ads_state).to_le_bytes())?;
        w.write_all(&self.device_state.to_le_bytes())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)?;
        Ok(Self {
            result: AdsReturnCode::from(u32::from_le_bytes(buf[0..4].try_into().unwrap())),
            ads_state: AdsState::from(u16::from_le_bytes(buf[4..6].try_into().unwrap())),
            device_state: u16::from_le_bytes(buf[6..8].try_into().unwrap()),
        })
    }
}

/// Payload for `AdsAddDeviceNotification`. Client -> Server.
///
/// ```text
/// [ Group (4) ] [ Offset (4) ] [ Len (4) ] [ Mode (4) ] [ Delay (4) ] [ Cycle (4) ] [ Reserved (16) ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdsAddDeviceNotificationRequest {
    index_group: u32,
    index_offset: u32,
    length: u32,
    transmission_mode: AdsTransMode,
    max_delay: Duration,
    cycle_time: Duration,
    reserved: [u8; 16],
}

impl AdsAddDeviceNotificationRequest {
    pub const SIZE: usize = 40;

    pub fn new(
        index_group: u32,
        index_offset: u32,
        length: u32,
        transmission_mode: AdsTransMode,
        max_delay: Duration,
        cycle_time: Duration,
    ) -> Self {
        Self {
            index_group,
            index_offset,
            length,
            transmission_mode,
            max_delay,
            cycle_time,
            reserved: [0; 16],
        }
    }

    pub fn index_group(&self) -> u32 {
        self.index_group
    }

    pub fn index_offset(&self) -> u32 {
        self.index_offset
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn transmission_mode(&self) -> AdsTransMode {
        self.transmission_mode
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn cycle_time(&self) -> Duration {
        self.cycle_time
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.index_group.to_le_bytes())?;
        w.write_all(&self.index_offset.to_le_bytes())?;
        w.write_all(&self.length.to_le_bytes())?;
        w.write_all(&u32::from(self.transmission_mode).to_le_bytes())?;

        let delay_ticks = (self.max_delay.as_nanos() / 100) as u32;
        w.write_all(&delay_ticks.to_le_bytes())?;

        let cycle_ticks = (self.cycle_time.as_nanos() / 100) as u32;
        w.write_all(&cycle_ticks.to_le_bytes())?;

        w.write_all(&self.reserved)
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)?;

        let delay_ticks = u32::from_le_bytes(buf[16..20].try_into().unwrap());
        let cycle_ticks = u32::from_le_bytes(buf[20..24].try_into().unwrap());

        Ok(Self {
            index_group: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            index_offset: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            length: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            transmission_mode: AdsTransMode::from(u32::from_le_bytes(buf[12..16].try_into().unwrap())),
            max_delay: Duration::from_nanos(delay_ticks as u64 * 100),
            cycle_time: Duration::from_nanos(cycle_ticks as u64 * 100),
            reserved: buf[24..40].try_into().unwrap(),
        })
    }
}

/// Response for `AdsAddDeviceNotification`. Server -> Client.
///
/// ```text
/// [ Result (4) ] [ Handle (4) ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdsAddDeviceNotificationResponse {
    result: AdsReturnCode,
    handle: NotificationHandle,
}

impl AdsAddDeviceNotificationResponse {
    pub const SIZE: usize = 8;

    pub fn new(result: AdsReturnCode, handle: NotificationHandle) -> Self {
        Self { result, handle }
    }

    pub fn result(&self) -> AdsReturnCode {
        self.result
    }

    pub fn handle(&self) -> NotificationHandle {
        self.handle
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&u32::from(self.result).to_le_bytes())?;
        w.write_all(&self.handle.to_bytes())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)?;
        Ok(Self {
            result: AdsReturnCode::from(u32::from_le_bytes(buf[0..4].try_into().unwrap())),
            handle: NotificationHandle::from_bytes(buf[4..8].try_into().unwrap()),
        })
    }
}

/// Payload for `AdsDeleteDeviceNotification`. Client -> Server.
///
/// ```text
/// [ Handle (4) ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdsDeleteDeviceNotificationRequest {
    handle: NotificationHandle,
}

impl AdsDeleteDeviceNotificationRequest {
    pub const SIZE: usize = 4;

    pub fn new(handle: NotificationHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> NotificationHandle {
        self.handle
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.handle.to_bytes())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)?;
        Ok(Self {
            handle: NotificationHandle::from_bytes(buf),
        })
    }
}

/// Response for `AdsDeleteDeviceNotification`. Identical wire shape to [`AdsWriteResponse`].
pub type AdsDeleteDeviceNotificationResponse = AdsWriteResponse;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ads_read_request_roundtrip() {
        let req = AdsReadRequest::new(0x4020, 0, 4);
        let mut buf = Vec::new();
        req.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), AdsReadRequest::SIZE);

        let parsed = AdsReadRequest::read_from(&mut &buf[..]).unwrap();
        assert_eq!(parsed, req);
    }

    #[test]
    fn ads_read_response_roundtrip() {
        let resp = AdsReadResponse::new(AdsReturnCode::Ok, 4);
        let mut buf = Vec::new();
        resp.write_to(&mut buf).unwrap();

        let parsed = AdsReadResponse::read_from(&mut &buf[..]).unwrap();
        assert_eq!(parsed, resp);
    }

    #[test]
    fn ads_add_device_notification_request_roundtrip() {
        let req = AdsAddDeviceNotificationRequest::new(
            0xF005,
            0,
            4,
            AdsTransMode::OnChange,
            Duration::from_millis(100),
            Duration::from_millis(10),
        );
        let mut buf = Vec::new();
        req.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), AdsAddDeviceNotificationRequest::SIZE);

        let parsed = AdsAddDeviceNotificationRequest::read_from(&mut &buf[..]).unwrap();
        assert_eq!(parsed.transmission_mode(), AdsTransMode::OnChange);
        assert_eq!(parsed.max_delay(), Duration::from_millis(100));
        assert_eq!(parsed.cycle_time(), Duration::from_millis(10));
    }

    #[test]
    fn ads_add_device_notification_response_roundtrip() {
        let resp = AdsAddDeviceNotificationResponse::new(AdsReturnCode::Ok, NotificationHandle::new(7));
        let mut buf = Vec::new();
        resp.write_to(&mut buf).unwrap();

        let parsed = AdsAddDeviceNotificationResponse::read_from(&mut &buf[..]).unwrap();
        assert_eq!(parsed, resp);
    }

    #[test]
    fn ads_device_info_response_roundtrip() {
        let resp = AdsDeviceInfoResponse::new(
            AdsReturnCode::Ok,
            3,
            1,
            4027,
            AdsString::<16>::try_from("TC RTOS").unwrap(),
        );
        let mut buf = Vec::new();
        resp.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), AdsDeviceInfoResponse::SIZE);

        let parsed = AdsDeviceInfoResponse::read_from(&mut &buf[..]).unwrap();
        assert_eq!(parsed.major_version(), 3);
        assert_eq!(parsed.minor_version(), 1);
        assert_eq!(parsed.version_build(), 4027);
    }
}
