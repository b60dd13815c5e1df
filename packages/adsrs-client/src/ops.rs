//! High-level ADS operations built on top of [`Connection::request_ads`].
//!
//! Each function here encodes one ADS command's fixed-size request header, sends it
//! (with any variable-length data appended), and decodes the matching response. Every
//! operation inspects the response's own `result` field and maps a non-zero code to
//! [`ClientError::Ads`] - this is separate from the ADS header's `error_code`, which
//! the connection's receiver loop already handles before a payload ever reaches here.

use std::time::Duration;

use adsrs_core::ads::{AdsCommand, AdsReturnCode, AdsState, AdsString, AdsTransMode, NotificationHandle};
use adsrs_core::protocol::{
    AdsAddDeviceNotificationRequest, AdsAddDeviceNotificationResponse, AdsDeleteDeviceNotificationRequest,
    AdsDeviceInfoResponse, AdsReadRequest, AdsReadResponse, AdsReadStateResponse, AdsReadWriteRequest,
    AdsReadWriteResponse, AdsWriteControlRequest, AdsWriteControlResponse, AdsWriteRequest, AdsWriteResponse,
    ReservedIndexGroup,
};

use crate::connection::{Connection, NotificationCallback};
use crate::error::{ClientError, Result};
use crate::symbols::{self, SymbolInfo};

fn check(result: AdsReturnCode) -> Result<()> {
    if result.is_success() {
        Ok(())
    } else {
        Err(ClientError::Ads(result))
    }
}

/// Symbol names travel over the wire NUL-terminated.
fn name_with_nul(name: &str) -> Vec<u8> {
    let mut bytes = name.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

/// A scalar PLC value type with a fixed-width little-endian wire representation.
///
/// Implemented for the primitive types that map directly onto IEC 61131-3 elementary
/// types (`BOOL`, `INT`, `DINT`, `LREAL`, ...). [`Connection::read_value`] and
/// [`Connection::write_value`] are generic over this trait instead of a fixed type
/// list so new scalar types only need one small `impl` block.
pub trait WireValue: Sized + Copy + Send + 'static {
    /// Size of this value's wire representation, in bytes.
    const SIZE: usize;

    fn from_le_bytes(bytes: &[u8]) -> Option<Self>;
    fn to_le_bytes(&self) -> Vec<u8>;
}

macro_rules! impl_wire_value {
    ($t:ty, $size:expr) => {
        impl WireValue for $t {
            const SIZE: usize = $size;

            fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
                let arr: [u8; $size] = bytes.get(..$size)?.try_into().ok()?;
                Some(<$t>::from_le_bytes(arr))
            }

            fn to_le_bytes(&self) -> Vec<u8> {
                <$t>::to_le_bytes(*self).to_vec()
            }
        }
    };
}

impl_wire_value!(u8, 1);
impl_wire_value!(i8, 1);
impl_wire_value!(u16, 2);
impl_wire_value!(i16, 2);
impl_wire_value!(u32, 4);
impl_wire_value!(i32, 4);
impl_wire_value!(u64, 8);
impl_wire_value!(i64, 8);
impl_wire_value!(f32, 4);
impl_wire_value!(f64, 8);

impl WireValue for bool {
    const SIZE: usize = 1;

    fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
        bytes.first().map(|b| *b != 0)
    }

    fn to_le_bytes(&self) -> Vec<u8> {
        vec![u8::from(*self)]
    }
}

impl Connection {
    /// Reads `length` bytes at `index_group`/`index_offset`.
    pub async fn read(&self, index_group: u32, index_offset: u32, length: u32) -> Result<Vec<u8>> {
        let mut body = Vec::with_capacity(AdsReadRequest::SIZE);
        AdsReadRequest::new(index_group, index_offset, length)
            .write_to(&mut body)
            .expect("writing to a Vec never fails");

        let response = self.request_ads(AdsCommand::AdsRead, body).await?;
        let header = AdsReadResponse::read_from(&mut &response[..])
            .map_err(|_| ClientError::UnexpectedResponse)?;
        check(header.result())?;

        let data = &response[AdsReadResponse::SIZE..];
        if data.len() < header.length() as usize {
            return Err(ClientError::UnexpectedResponse);
        }
        Ok(data[..header.length() as usize].to_vec())
    }

    /// Writes `data` at `index_group`/`index_offset`.
    pub async fn write(&self, index_group: u32, index_offset: u32, data: &[u8]) -> Result<()> {
        let mut body = Vec::with_capacity(AdsWriteRequest::SIZE + data.len());
        AdsWriteRequest::new(index_group, index_offset, data.len() as u32)
            .write_to(&mut body)
            .expect("writing to a Vec never fails");
        body.extend_from_slice(data);

        let response = self.request_ads(AdsCommand::AdsWrite, body).await?;
        let header = AdsWriteResponse::read_from(&mut &response[..])
            .map_err(|_| ClientError::UnexpectedResponse)?;
        check(header.result())
    }

    /// Writes `write_data`, then reads `read_length` bytes back in a single round trip.
    pub async fn read_write(
        &self,
        index_group: u32,
        index_offset: u32,
        read_length: u32,
        write_data: &[u8],
    ) -> Result<Vec<u8>> {
        let mut body = Vec::with_capacity(AdsReadWriteRequest::SIZE + write_data.len());
        AdsReadWriteRequest::new(index_group, index_offset, read_length, write_data.len() as u32)
            .write_to(&mut body)
            .expect("writing to a Vec never fails");
        body.extend_from_slice(write_data);

        let response = self.request_ads(AdsCommand::AdsReadWrite, body).await?;
        let header = AdsReadWriteResponse::read_from(&mut &response[..])
            .map_err(|_| ClientError::UnexpectedResponse)?;
        check(header.result())?;

        let data = &response[AdsReadWriteResponse::SIZE..];
        if data.len() < header.length() as usize {
            return Err(ClientError::UnexpectedResponse);
        }
        Ok(data[..header.length() as usize].to_vec())
    }

    /// Reads the device's current ADS state and device-specific status word.
    pub async fn get_state(&self) -> Result<(AdsState, u16)> {
        let response = self.request_ads(AdsCommand::AdsReadState, Vec::new()).await?;
        let header = AdsReadStateResponse::read_from(&mut &response[..])
            .map_err(|_| ClientError::UnexpectedResponse)?;
        check(header.result())?;
        Ok((header.ads_state(), header.device_state()))
    }

    /// Sets the device's ADS state and device-specific status word, with an optional
    /// data payload.
    pub async fn write_control(&self, ads_state: AdsState, device_state: u16, data: &[u8]) -> Result<()> {
        let mut body = Vec::with_capacity(AdsWriteControlRequest::SIZE + data.len());
        AdsWriteControlRequest::new(ads_state, device_state, data.len() as u32)
            .write_to(&mut body)
            .expect("writing to a Vec never fails");
        body.extend_from_slice(data);

        let response = self.request_ads(AdsCommand::AdsWriteControl, body).await?;
        let header = AdsWriteControlResponse::read_from(&mut &response[..])
            .map_err(|_| ClientError::UnexpectedResponse)?;
        check(header.result())
    }

    /// Reads device name and version information.
    pub async fn get_info(&self) -> Result<(u8, u8, u16, String)> {
        let response = self
            .request_ads(AdsCommand::AdsReadDeviceInfo, Vec::new())
            .await?;
        let info = AdsDeviceInfoResponse::read_from(&mut &response[..])
            .map_err(|_| ClientError::UnexpectedResponse)?;
        check(info.result())?;
        Ok((
            info.major_version(),
            info.minor_version(),
            info.version_build(),
            info.device_name().as_str().into_owned(),
        ))
    }

    /// Resolves a symbol name to a handle, for repeated `read_value`/`write_value` calls
    /// without re-sending the name each time.
    ///
    /// The handle is tracked and released automatically by [`disconnect`](Connection::disconnect);
    /// call [`release_handle`](Connection::release_handle) to release it earlier.
    pub async fn get_handle(&self, symbol_name: &str) -> Result<u32> {
        if symbol_name.len() > u32::MAX as usize {
            return Err(symbols::too_long("symbol name", u32::MAX as usize));
        }

        let data = self
            .read_write(
                ReservedIndexGroup::GetSymHandleByName.into(),
                0,
                4,
                &name_with_nul(symbol_name),
            )
            .await?;
        if data.len() < 4 {
            return Err(ClientError::UnexpectedResponse);
        }
        let handle = u32::from_le_bytes(data[..4].try_into().unwrap());
        self.track_handle(handle).await;
        Ok(handle)
    }

    /// Releases a handle obtained from [`get_handle`](Connection::get_handle).
    pub async fn release_handle(&self, handle: u32) -> Result<()> {
        self.write(
            ReservedIndexGroup::ReleaseSymHandle.into(),
            0,
            &handle.to_le_bytes(),
        )
        .await?;
        self.untrack_handle(handle).await;
        Ok(())
    }

    /// Reads the full symbol table of the connected device.
    pub async fn get_symbols(&self) -> Result<Vec<SymbolInfo>> {
        let info = self
            .read(ReservedIndexGroup::SymUploadInfo.into(), 0, 8)
            .await?;
        if info.len() < 8 {
            return Err(ClientError::UnexpectedResponse);
        }
        let count = u32::from_le_bytes(info[0..4].try_into().unwrap());
        let length = u32::from_le_bytes(info[4..8].try_into().unwrap());

        let table = self
            .read(ReservedIndexGroup::SymUpload.into(), 0, length)
            .await?;
        symbols::parse_symbol_table(&table, count)
    }

    /// Reads a scalar value by handle.
    pub async fn read_value<T: WireValue>(&self, handle: u32) -> Result<T> {
        let data = self
            .read(
                ReservedIndexGroup::ReadWriteSymValByHandle.into(),
                handle,
                T::SIZE as u32,
            )
            .await?;
        T::from_le_bytes(&data).ok_or(ClientError::UnexpectedResponse)
    }

    /// Writes a scalar value by handle.
    pub async fn write_value<T: WireValue>(&self, handle: u32, value: T) -> Result<()> {
        self.write(
            ReservedIndexGroup::ReadWriteSymValByHandle.into(),
            handle,
            &value.to_le_bytes(),
        )
        .await
    }

    /// Reads `len` scalar elements by handle.
    pub async fn read_array<T: WireValue>(&self, handle: u32, len: usize) -> Result<Vec<T>> {
        let data = self
            .read(
                ReservedIndexGroup::ReadWriteSymValByHandle.into(),
                handle,
                (T::SIZE * len) as u32,
            )
            .await?;
        data.chunks_exact(T::SIZE)
            .map(|chunk| T::from_le_bytes(chunk).ok_or(ClientError::UnexpectedResponse))
            .collect()
    }

    /// Writes a slice of scalar elements by handle.
    pub async fn write_array<T: WireValue>(&self, handle: u32, values: &[T]) -> Result<()> {
        let mut buf = Vec::with_capacity(T::SIZE * values.len());
        for value in values {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        self.write(ReservedIndexGroup::ReadWriteSymValByHandle.into(), handle, &buf)
            .await
    }

    /// Reads a scalar value by symbol name, in a single round trip (no handle acquired).
    pub async fn read_value_by_name<T: WireValue>(&self, symbol_name: &str) -> Result<T> {
        let data = self
            .read_write(
                ReservedIndexGroup::ReadWriteSymValByName.into(),
                0,
                T::SIZE as u32,
                &name_with_nul(symbol_name),
            )
            .await?;
        T::from_le_bytes(&data).ok_or(ClientError::UnexpectedResponse)
    }

    /// Writes a scalar value by symbol name. Resolves a handle first (tracked for
    /// release on [`disconnect`](Connection::disconnect)) and writes through it.
    pub async fn write_value_by_name<T: WireValue>(&self, symbol_name: &str, value: T) -> Result<()> {
        let handle = self.get_handle(symbol_name).await?;
        self.write_value(handle, value).await
    }

    /// Reads a `STRING(N)` (`N` = total buffer size including the null terminator) by handle.
    pub async fn read_string<const N: usize>(&self, handle: u32) -> Result<AdsString<N>> {
        let data = self
            .read(
                ReservedIndexGroup::ReadWriteSymValByHandle.into(),
                handle,
                N as u32,
            )
            .await?;
        if data.len() != N {
            return Err(ClientError::UnexpectedResponse);
        }
        let mut buf = [0u8; N];
        buf.copy_from_slice(&data);
        Ok(AdsString::from(buf))
    }

    /// Writes a `STRING(N)` by handle.
    pub async fn write_string<const N: usize>(&self, handle: u32, value: &AdsString<N>) -> Result<()> {
        self.write(
            ReservedIndexGroup::ReadWriteSymValByHandle.into(),
            handle,
            value.as_bytes(),
        )
        .await
    }

    /// Subscribes to change notifications for `length` bytes at `index_group`/`index_offset`.
    ///
    /// `callback` runs on its own spawned task each time a sample arrives, outside any
    /// internal lock. The returned handle is tracked and cleaned up automatically by
    /// [`disconnect`](Connection::disconnect); pass it to
    /// [`remove_notification`](Connection::remove_notification) to unsubscribe earlier.
    pub async fn add_notification(
        &self,
        index_group: u32,
        index_offset: u32,
        length: u32,
        mode: AdsTransMode,
        max_delay: Duration,
        cycle_time: Duration,
    ) -> Result<NotificationHandle> {
        let mut body = Vec::with_capacity(AdsAddDeviceNotificationRequest::SIZE);
        AdsAddDeviceNotificationRequest::new(index_group, index_offset, length, mode, max_delay, cycle_time)
            .write_to(&mut body)
            .expect("writing to a Vec never fails");

        let response = self
            .request_ads(AdsCommand::AdsAddDeviceNotification, body)
            .await?;
        let resp = AdsAddDeviceNotificationResponse::read_from(&mut &response[..])
            .map_err(|_| ClientError::UnexpectedResponse)?;
        check(resp.result())?;
        Ok(resp.handle())
    }

    /// Convenience wrapper over [`add_notification`](Connection::add_notification) that
    /// resolves `name` to a handle and decodes each sample as a scalar value before
    /// invoking `callback`.
    pub async fn on_change<T: WireValue>(
        &self,
        name: &str,
        cycle_time: Duration,
        max_delay: Duration,
        callback: impl Fn(T) + Send + Sync + 'static,
    ) -> Result<NotificationHandle> {
        let handle = self.get_handle(name).await?;

        let notification = self
            .add_notification(
                ReservedIndexGroup::ReadWriteSymValByHandle.into(),
                handle,
                T::SIZE as u32,
                AdsTransMode::OnChange,
                max_delay,
                cycle_time,
            )
            .await?;

        let typed: NotificationCallback = std::sync::Arc::new(move |data: &[u8]| {
            if let Some(value) = T::from_le_bytes(data) {
                callback(value);
            }
        });
        self.register_callback(notification, typed).await;
        Ok(notification)
    }

    /// Cancels a subscription created by [`add_notification`](Connection::add_notification)
    /// or [`on_change`](Connection::on_change).
    pub async fn remove_notification(&self, handle: NotificationHandle) -> Result<()> {
        let mut body = Vec::with_capacity(AdsDeleteDeviceNotificationRequest::SIZE);
        AdsDeleteDeviceNotificationRequest::new(handle)
            .write_to(&mut body)
            .expect("writing to a Vec never fails");

        let response = self
            .request_ads(AdsCommand::AdsDeleteDeviceNotification, body)
            .await?;
        let resp = AdsWriteResponse::read_from(&mut &response[..])
            .map_err(|_| ClientError::UnexpectedResponse)?;
        check(resp.result())?;
        self.unregister_callback(handle).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_value_roundtrip() {
        assert_eq!(i32::from_le_bytes(&42i32.to_le_bytes()), Some(42));
        assert_eq!(f64::from_le_bytes(&1.5f64.to_le_bytes()), Some(1.5));
        assert_eq!(bool::from_le_bytes(&true.to_le_bytes()), Some(true));
        assert_eq!(bool::from_le_bytes(&[0]), Some(false));
    }

    #[test]
    fn wire_value_short_buffer_rejected() {
        assert_eq!(u32::from_le_bytes(&[1, 2]), None);
    }
}
