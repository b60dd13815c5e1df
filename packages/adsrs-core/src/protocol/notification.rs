//! Zero-copy parsing of the `AdsDeviceNotification` stream sent unsolicited by the device.
//!
//! Wire layout:
//!
//! ```text
//! [ Length (4) ] [ StampCount (4) ] [ Stamp 1... ] [ Stamp 2... ]
//! ```
//!
//! Each stamp:
//!
//! ```text
//! [ Timestamp (8) ] [ SampleCount (4) ] [ Sample 1... ] [ Sample 2... ]
//! ```
//!
//! Each sample:
//!
//! ```text
//! [ Handle (4) ] [ SampleSize (4) ] [ Data (n)... ]
//! ```

use crate::ads::{AdsCommand, NotificationHandle, WindowsFileTime};
use crate::ams::AmsCommand;
use crate::io::AmsFrame;
use crate::protocol::ProtocolError;

/// A zero-copy view of a single ADS notification sample.
///
/// Identifies the subscription via the [`NotificationHandle`] assigned when the
/// subscription was created via `AdsAddDeviceNotification`. The `data` field borrows
/// directly from the [`AmsFrame`] that was parsed, so dispatching a notification never
/// copies the sample payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdsNotificationSample<'a> {
    handle: NotificationHandle,
    data: &'a [u8],
}

impl<'a> AdsNotificationSample<'a> {
    /// Handle (4) + Sample Size (4): the minimum a sample occupies on the wire.
    pub const MIN_SAMPLE_SIZE: usize = NotificationHandle::LENGTH + 4;

    pub fn new(handle: NotificationHandle, data: &'a [u8]) -> Self {
        Self { handle, data }
    }

    pub fn handle(&self) -> NotificationHandle {
        self.handle
    }

    pub fn sample_size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        self.data
    }

    pub fn into_owned(self) -> AdsNotificationSampleOwned {
        AdsNotificationSampleOwned {
            handle: self.handle,
            data: self.data.to_vec(),
        }
    }

    pub fn to_owned(&self) -> AdsNotificationSampleOwned {
        AdsNotificationSampleOwned {
            handle: self.handle,
            data: self.data.to_vec(),
        }
    }

    /// Parses one sample off the front of `buf`, returning the sample and the remainder.
    ///
    /// Returns `None` (rather than an error) if `buf` is too short to hold even the
    /// fixed header, or if the declared sample size overruns what's left - the caller
    /// is expected to stop iterating and discard the malformed tail instead of
    /// failing the whole notification.
    fn parse(buf: &'a [u8]) -> Option<(Self, &'a [u8])> {
        if buf.len() < Self::MIN_SAMPLE_SIZE {
            return None;
        }
        let handle = NotificationHandle::from_bytes(buf[0..4].try_into().unwrap());
        let size = u32::from_le_bytes(buf[4..8].try_into().unwrap()) as usize;
        let rest = &buf[8..];
        if size > rest.len() {
            return None;
        }
        Some((
            Self {
                handle,
                data: &rest[..size],
            },
            &rest[size..],
        ))
    }
}

/// An owned ADS notification sample, suitable for storage past the frame's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdsNotificationSampleOwned {
    handle: NotificationHandle,
    data: Vec<u8>,
}

impl AdsNotificationSampleOwned {
    pub fn new(handle: NotificationHandle, data: impl Into<Vec<u8>>) -> Self {
        Self {
            handle,
            data: data.into(),
        }
    }

    pub fn handle(&self) -> NotificationHandle {
        self.handle
    }

    pub fn sample_size(&self) -> usize {
        self.data.len()
    }

    pub fn wire_size(&self) -> usize {
        AdsNotificationSample::MIN_SAMPLE_SIZE + self.sample_size()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn write_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.handle.to_bytes());
        buf.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.data);
    }

    pub fn as_view(&self) -> AdsNotificationSample<'_> {
        AdsNotificationSample {
            handle: self.handle,
            data: &self.data,
        }
    }
}

impl<'a> From<AdsNotificationSample<'a>> for AdsNotificationSampleOwned {
    fn from(value: AdsNotificationSample<'a>) -> Self {
        value.into_owned()
    }
}

impl<'a> From<&'a AdsNotificationSampleOwned> for AdsNotificationSample<'a> {
    fn from(value: &'a AdsNotificationSampleOwned) -> Self {
        value.as_view()
    }
}

/// One timestamped group of samples within a notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdsStampHeader<'a> {
    timestamp: WindowsFileTime,
    samples: Vec<AdsNotificationSample<'a>>,
}

impl<'a> AdsStampHeader<'a> {
    /// Timestamp (8) + SampleCount (4): the minimum a stamp occupies on the wire.
    pub const MIN_STAMP_SIZE: usize = 12;

    pub fn timestamp(&self) -> WindowsFileTime {
        self.timestamp
    }

    pub fn samples(&self) -> &[AdsNotificationSample<'a>] {
        &self.samples
    }

    pub fn into_owned(self) -> AdsStampHeaderOwned {
        AdsStampHeaderOwned {
            timestamp: self.timestamp,
            samples: self.samples.into_iter().map(|s| s.into_owned()).collect(),
        }
    }

    pub fn to_owned(&self) -> AdsStampHeaderOwned {
        AdsStampHeaderOwned {
            timestamp: self.timestamp,
            samples: self.samples.iter().map(|s| s.to_owned()).collect(),
        }
    }

    /// Parses one stamp off the front of `buf`.
    ///
    /// Sample-level truncation (a declared sample size that overruns the buffer) stops
    /// the sample loop early rather than failing the stamp: whatever valid samples were
    /// parsed before the truncated one are kept. This mirrors the requirement that a
    /// single corrupted trailing record must not discard an otherwise well-formed batch.
    fn parse(buf: &'a [u8]) -> Option<(Self, &'a [u8])> {
        if buf.len() < Self::MIN_STAMP_SIZE {
            return None;
        }
        let timestamp = WindowsFileTime::from_bytes(buf[0..8].try_into().unwrap());
        let sample_count = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        let mut rest = &buf[12..];

        let mut samples = Vec::with_capacity(sample_count as usize);
        for _ in 0..sample_count {
            match AdsNotificationSample::parse(rest) {
                Some((sample, remainder)) => {
                    samples.push(sample);
                    rest = remainder;
                }
                None => break,
            }
        }

        Some((Self { timestamp, samples }, rest))
    }
}

/// An owned timestamped group of samples.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdsStampHeaderOwned {
    timestamp: WindowsFileTime,
    samples: Vec<AdsNotificationSampleOwned>,
}

impl AdsStampHeaderOwned {
    pub fn new(timestamp: WindowsFileTime, samples: Vec<AdsNotificationSampleOwned>) -> Self {
        Self { timestamp, samples }
    }

    pub fn timestamp(&self) -> WindowsFileTime {
        self.timestamp
    }

    pub fn samples(&self) -> &[AdsNotificationSampleOwned] {
        &self.samples
    }

    pub fn wire_size(&self) -> usize {
        AdsStampHeader::MIN_STAMP_SIZE + self.samples.iter().map(|s| s.wire_size()).sum::<usize>()
    }

    pub fn write_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.timestamp.to_bytes());
        buf.extend_from_slice(&(self.samples.len() as u32).to_le_bytes());
        for sample in &self.samples {
            sample.write_into(buf);
        }
    }

    pub fn as_view(&self) -> AdsStampHeader<'_> {
        AdsStampHeader {
            timestamp: self.timestamp,
            samples: self.samples.iter().map(|s| s.as_view()).collect(),
        }
    }
}

/// The minimum payload size for an `AdsDeviceNotification`: Length (4) + StampCount (4).
const MIN_PAYLOAD_SIZE: usize = 8;

/// A parsed `AdsDeviceNotification` stream, zero-copy over the source [`AmsFrame`]'s payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdsDeviceNotification<'a> {
    stamps: Vec<AdsStampHeader<'a>>,
}

impl<'a> AdsDeviceNotification<'a> {
    /// Parses an `AdsDeviceNotification` payload (the ADS header must already be stripped).
    ///
    /// A malformed trailing stamp (one that overruns the declared length or the buffer)
    /// is dropped rather than failing the whole batch; stamps and samples parsed
    /// successfully before it are still returned.
    pub fn parse(payload: &'a [u8]) -> Result<Self, ProtocolError> {
        if payload.len() < MIN_PAYLOAD_SIZE {
            return Err(ProtocolError::Truncated {
                expected: MIN_PAYLOAD_SIZE,
                got: payload.len(),
            });
        }

        let stamp_count = u32::from_le_bytes(payload[4..8].try_into().unwrap());
        let mut rest = &payload[8..];

        let mut stamps = Vec::with_capacity(stamp_count as usize);
        for _ in 0..stamp_count {
            match AdsStampHeader::parse(rest) {
                Some((stamp, remainder)) => {
                    stamps.push(stamp);
                    rest = remainder;
                }
                None => break,
            }
        }

        Ok(Self { stamps })
    }

    /// Parses an `AdsDeviceNotification` out of a complete [`AmsFrame`], validating that
    /// its router-level command is `AdsCommand` and that the embedded ADS command ID is
    /// `AdsDeviceNotification`.
    pub fn try_from_frame(frame: &'a AmsFrame) -> Result<Self, ProtocolError> {
        if frame.header().command() != AmsCommand::AdsCommand {
            return Err(ProtocolError::UnexpectedCommand {
                expected: AmsCommand::AdsCommand,
                got: frame.header().command(),
            });
        }

        let payload = frame.payload();
        if payload.len() < crate::ads::ADS_HEADER_LEN {
            return Err(ProtocolError::Truncated {
                expected: crate::ads::ADS_HEADER_LEN,
                got: payload.len(),
            });
        }

        let header = crate::ads::AdsHeader::try_from_slice(&payload[..crate::ads::ADS_HEADER_LEN])
            .map_err(|_| ProtocolError::Truncated {
                expected: crate::ads::ADS_HEADER_LEN,
                got: payload.len(),
            })?;

        if header.command_id() != AdsCommand::AdsDeviceNotification {
            return Err(ProtocolError::UnexpectedAdsCommand {
                expected: AdsCommand::AdsDeviceNotification,
                got: header.command_id(),
            });
        }

        Self::parse(&payload[crate::ads::ADS_HEADER_LEN..])
    }

    pub fn stamps(&self) -> &[AdsStampHeader<'a>] {
        &self.stamps
    }

    /// Flattens every sample across every stamp, paired with the stamp's timestamp.
    pub fn iter_samples(&self) -> impl Iterator<Item = (WindowsFileTime, &AdsNotificationSample<'a>)> {
        self.stamps
            .iter()
            .flat_map(|stamp| stamp.samples.iter().map(move |s| (stamp.timestamp, s)))
    }

    pub fn into_owned(self) -> AdsDeviceNotificationOwned {
        AdsDeviceNotificationOwned {
            stamps: self.stamps.into_iter().map(|s| s.into_owned()).collect(),
        }
    }

    pub fn to_owned(&self) -> AdsDeviceNotificationOwned {
        AdsDeviceNotificationOwned {
            stamps: self.stamps.iter().map(|s| s.to_owned()).collect(),
        }
    }
}

/// An owned `AdsDeviceNotification`, suitable for sending across an async channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdsDeviceNotificationOwned {
    stamps: Vec<AdsStampHeaderOwned>,
}

impl AdsDeviceNotificationOwned {
    pub fn new(stamps: Vec<AdsStampHeaderOwned>) -> Self {
        Self { stamps }
    }

    pub fn stamps(&self) -> &[AdsStampHeaderOwned] {
        &self.stamps
    }

    pub fn iter_samples(&self) -> impl Iterator<Item = (WindowsFileTime, &AdsNotificationSampleOwned)> {
        self.stamps
            .iter()
            .flat_map(|stamp| stamp.samples.iter().map(move |s| (stamp.timestamp, s)))
    }

    pub fn stamps_wire_size(&self) -> usize {
        self.stamps.iter().map(|s| s.wire_size()).sum()
    }

    pub fn as_view(&self) -> AdsDeviceNotification<'_> {
        AdsDeviceNotification {
            stamps: self.stamps.iter().map(|s| s.as_view()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ads::WindowsFileTime;

    fn build_payload(stamps: &[(u64, &[(u32, &[u8])])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (ts, samples) in stamps {
            body.extend_from_slice(&ts.to_le_bytes());
            body.extend_from_slice(&(samples.len() as u32).to_le_bytes());
            for (handle, data) in *samples {
                body.extend_from_slice(&handle.to_le_bytes());
                body.extend_from_slice(&(data.len() as u32).to_le_bytes());
                body.extend_from_slice(data);
            }
        }

        let mut payload = Vec::new();
        payload.extend_from_slice(&(body.len() as u32).to_le_bytes());
        payload.extend_from_slice(&(stamps.len() as u32).to_le_bytes());
        payload.extend_from_slice(&body);
        payload
    }

    #[test]
    fn parses_single_stamp_single_sample() {
        let data: &[u8] = &[0xDE, 0xAD, 0xBE, 0xEF];
        let payload = build_payload(&[(123, &[(7, data)])]);

        let notif = AdsDeviceNotification::parse(&payload).unwrap();
        assert_eq!(notif.stamps().len(), 1);
        assert_eq!(notif.stamps()[0].timestamp(), WindowsFileTime::from_raw(123));
        assert_eq!(notif.stamps()[0].samples()[0].handle(), NotificationHandle::from(7u32));
        assert_eq!(notif.stamps()[0].samples()[0].data(), data);
    }

    #[test]
    fn parses_multiple_stamps_and_samples() {
        let d1: &[u8] = &[1, 2];
        let d2: &[u8] = &[3, 4, 5];
        let d3: &[u8] = &[6];
        let payload = build_payload(&[(10, &[(1, d1), (2, d2)]), (20, &[(3, d3)])]);

        let notif = AdsDeviceNotification::parse(&payload).unwrap();
        assert_eq!(notif.stamps().len(), 2);

        let samples: Vec<_> = notif.iter_samples().collect();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].0, WindowsFileTime::from_raw(10));
        assert_eq!(samples[2].0, WindowsFileTime::from_raw(20));
    }

    #[test]
    fn zero_copy_sample_data() {
        let data: &[u8] = &[9, 9, 9, 9];
        let payload = build_payload(&[(1, &[(1, data)])]);

        let notif = AdsDeviceNotification::parse(&payload).unwrap();
        let sample_data = notif.stamps()[0].samples()[0].data();

        // Must point inside `payload`, proving no copy was made while parsing.
        let payload_range = payload.as_ptr_range();
        let sample_ptr = sample_data.as_ptr();
        assert!(payload_range.contains(&sample_ptr));
    }

    #[test]
    fn truncated_trailing_sample_is_dropped_not_fatal() {
        let d1: &[u8] = &[1, 2, 3];
        let mut payload = build_payload(&[(1, &[(1, d1)])]);

        // Append a second, truncated sample header directly onto the stream without
        // adjusting the stamp's declared sample count - simulates a partially
        // written/corrupt trailing record.
        payload.extend_from_slice(&[0xAA; 6]);

        // Bump the declared sample count for the first (only) stamp from 1 to 2, and
        // the declared body length accordingly, so the parser attempts the second
        // sample and must recover instead of erroring.
        let stamp_count_offset = 8 + 8; // payload header + timestamp
        payload[stamp_count_offset..stamp_count_offset + 4].copy_from_slice(&2u32.to_le_bytes());

        let notif = AdsDeviceNotification::parse(&payload).unwrap();
        assert_eq!(notif.stamps()[0].samples().len(), 1);
        assert_eq!(notif.stamps()[0].samples()[0].data(), d1);
    }

    #[test]
    fn empty_notification() {
        let payload = build_payload(&[]);
        let notif = AdsDeviceNotification::parse(&payload).unwrap();
        assert!(notif.stamps().is_empty());
        assert_eq!(notif.iter_samples().count(), 0);
    }

    #[test]
    fn rejects_payload_shorter_than_header() {
        let err = AdsDeviceNotification::parse(&[0, 0, 0]).unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { .. }));
    }

    #[test]
    fn owned_roundtrip_preserves_samples() {
        let data: &[u8] = &[1, 2, 3, 4];
        let payload = build_payload(&[(42, &[(5, data)])]);

        let notif = AdsDeviceNotification::parse(&payload).unwrap();
        let owned = notif.to_owned();
        let view = owned.as_view();

        assert_eq!(view.stamps()[0].timestamp(), WindowsFileTime::from_raw(42));
        assert_eq!(view.stamps()[0].samples()[0].data(), data);
    }
}
