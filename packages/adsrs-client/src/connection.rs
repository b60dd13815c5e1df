//! Connection lifecycle: dialing, the request multiplexer, and the receiver loop.
//!
//! An async, multiplexed ADS client connection over a single TCP socket. A
//! [`Connection`] is cheap to clone (it's an `Arc` handle) and safe to share across
//! tasks: concurrent callers serialize on the outgoing side via a command mutex and
//! are woken individually as their response arrives.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{lookup_host, TcpStream};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use adsrs_core::ads::{AdsCommand, AdsHeader, AdsReturnCode, NotificationHandle, ADS_HEADER_LEN};
use adsrs_core::ams::{AmsAddr, AmsCommand, AmsNetId, AmsPort, StateFlag};
use adsrs_core::io::tokio::{AmsReader, AmsStream, AmsWriter};
use adsrs_core::io::AmsFrame;
use adsrs_core::protocol::{AdsDeviceNotification, PortConnectRequest, PortConnectResponse};

use crate::config::ConnectionConfig;
use crate::error::{ClientError, Result};

/// A callback invoked with the raw sample bytes of a device notification.
///
/// Runs outside any internal lock, on its own spawned task, so it may call back into
/// the [`Connection`] (e.g. to read another value) without deadlocking.
pub type NotificationCallback = Arc<dyn Fn(&[u8]) + Send + Sync + 'static>;

/// Invoke IDs wrap at 2^30 rather than 2^32, leaving the top two bits free for a
/// future fragmentation/priority scheme without touching the correlation key format.
const INVOKE_ID_MASK: u32 = (1 << 30) - 1;

/// AMS port this client identifies itself with when it self-assigns rather than
/// performing the loopback [`PortConnectRequest`] handshake.
pub const DEFAULT_SOURCE_PORT: AmsPort = 30_000;

/// The well-known Beckhoff/TwinCAT convention for deriving a NetId from an IPv4
/// address when none was configured explicitly: the address octets followed by `.1.1`.
fn net_id_from_ipv4(ip: std::net::Ipv4Addr) -> AmsNetId {
    let [a, b, c, d] = ip.octets();
    AmsNetId::new(a, b, c, d, 1, 1)
}

fn correlation_key(command: AdsCommand, invoke_id: u32) -> u64 {
    (u16::from(command) as u64) << 32 | invoke_id as u64
}

struct State {
    source: AmsAddr,
    target: AmsAddr,
    invoke_id: u32,
    correlation: HashMap<u64, Vec<u8>>,
    callbacks: HashMap<u32, NotificationCallback>,
    owned_handles: HashSet<u32>,
    owned_notifications: HashSet<u32>,
    ads_error: AdsReturnCode,
}

impl State {
    fn new(source: AmsAddr, target: AmsAddr) -> Self {
        Self {
            source,
            target,
            invoke_id: 0,
            correlation: HashMap::new(),
            callbacks: HashMap::new(),
            owned_handles: HashSet::new(),
            owned_notifications: HashSet::new(),
            ads_error: AdsReturnCode::Ok,
        }
    }

    fn next_invoke_id(&mut self) -> u32 {
        let id = self.invoke_id;
        self.invoke_id = (self.invoke_id + 1) & INVOKE_ID_MASK;
        id
    }
}

struct Inner {
    writer: Mutex<AmsWriter<OwnedWriteHalf>>,
    command_mutex: Mutex<()>,
    state: Mutex<State>,
    response_ready: Notify,
    config: ConnectionConfig,
    connected: AtomicBool,
    closed: AtomicBool,
    fatal: AtomicBool,
    receiver: Mutex<Option<JoinHandle<()>>>,
}

/// A live, multiplexed connection to an ADS device.
///
/// Cloning shares the same underlying socket and request-tracking state; every
/// clone sees the same correlation table, callback registry, and fatal-error flag.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

impl Connection {
    /// Connects to the local TwinCAT router using [`ConnectionConfig::default`].
    pub async fn connect() -> Result<Self> {
        Self::connect_with_config(ConnectionConfig::default()).await
    }

    /// Connects using an explicit [`ConnectionConfig`].
    ///
    /// Resolves `config.host` to an IP address (used only to derive a default
    /// target NetId and to decide whether the loopback self-registration handshake
    /// applies), dials the AMS router, optionally performs that handshake, and spawns
    /// the receiver loop.
    pub async fn connect_with_config(config: ConnectionConfig) -> Result<Self> {
        let resolved_ip = resolve_host_ip(&config.host, config.router_port).await?;
        let target = resolve_target(&config, resolved_ip);

        let mut stream = AmsStream::<TcpStream>::connect((config.host.as_str(), config.router_port)).await?;
        let source = resolve_source(&config, resolved_ip, &mut stream).await?;

        let (reader, writer) = stream.into_split();

        let inner = Arc::new(Inner {
            writer: Mutex::new(writer),
            command_mutex: Mutex::new(()),
            state: Mutex::new(State::new(source, target)),
            response_ready: Notify::new(),
            config,
            connected: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            fatal: AtomicBool::new(false),
            receiver: Mutex::new(None),
        });

        let receiver_inner = Arc::clone(&inner);
        let handle = tokio::spawn(async move { Self::receiver_loop(receiver_inner, reader).await });
        *inner.receiver.lock().await = Some(handle);

        Ok(Connection { inner })
    }

    /// This connection's own AMS address, as resolved/derived at connect time.
    pub async fn local_addr(&self) -> AmsAddr {
        self.inner.state.lock().await.source
    }

    /// The remote device's AMS address this connection is talking to.
    pub async fn target_addr(&self) -> AmsAddr {
        self.inner.state.lock().await.target
    }

    /// True once the connection has been torn down, either explicitly or by a fatal
    /// transport error.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// True if a fatal transport error (peer closed, I/O failure, response timeout)
    /// has torn down the connection. Distinct from [`is_closed`](Connection::is_closed),
    /// which is also true after a clean [`disconnect`](Connection::disconnect).
    pub fn has_fatal_error(&self) -> bool {
        self.inner.fatal.load(Ordering::Acquire)
    }

    /// True if the most recent request completed with a non-zero ADS return code.
    ///
    /// Reflects the same latched value as [`last_error`](Connection::last_error);
    /// useful from contexts (like a notification callback) that cannot inspect a
    /// `Result` directly.
    pub async fn has_error(&self) -> bool {
        self.inner.state.lock().await.ads_error != AdsReturnCode::Ok
    }

    /// The most recently recorded ADS return code, or [`AdsReturnCode::Ok`] if the
    /// last request succeeded (or none has completed yet).
    pub async fn last_error(&self) -> AdsReturnCode {
        self.inner.state.lock().await.ads_error
    }

    async fn mark_fatal(&self, reason: String) {
        Self::mark_fatal_static(&self.inner, reason).await;
    }

    async fn mark_fatal_static(inner: &Arc<Inner>, reason: String) {
        tracing::error!(reason = %reason, "connection entering fatal state");
        inner.connected.store(false, Ordering::Release);
        inner.fatal.store(true, Ordering::Release);
        inner.response_ready.notify_waiters();
    }

    /// Issues a request over the command mutex and waits for its correlated response.
    ///
    /// `command` identifies the ADS operation; `payload` is the operation's request
    /// body (everything after the 32-byte ADS header). Returns the response payload
    /// (everything after the response's own ADS header) on success.
    pub(crate) async fn request_ads(&self, command: AdsCommand, payload: Vec<u8>) -> Result<Vec<u8>> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(ClientError::ConnectionClosed);
        }

        let _guard = self.inner.command_mutex.lock().await;

        let (key, frame) = {
            let mut state = self.inner.state.lock().await;
            let invoke_id = state.next_invoke_id();
            let header = AdsHeader::new(
                state.target,
                state.source,
                command,
                StateFlag::tcp_ads_request(),
                payload.len() as u32,
                AdsReturnCode::Ok,
                invoke_id,
            );
            let key = correlation_key(command, invoke_id);

            let mut buf = Vec::with_capacity(ADS_HEADER_LEN + payload.len());
            buf.extend_from_slice(&header.to_bytes());
            buf.extend_from_slice(&payload);
            (key, AmsFrame::new(AmsCommand::AdsCommand, buf))
        };

        {
            let mut writer = self.inner.writer.lock().await;
            if let Err(e) = writer.write_frame(&frame).await {
                self.mark_fatal(format!("write failed: {e}")).await;
                return Err(ClientError::Io(e));
            }
        }

        self.wait_for_response(key).await
    }

    async fn wait_for_response(&self, key: u64) -> Result<Vec<u8>> {
        let retries = self.inner.config.response_retries.max(1);

        for _ in 0..retries {
            // Register interest in a wakeup *before* checking state, so a response
            // that lands between our check and the wait is never missed.
            let notified = self.inner.response_ready.notified();

            {
                let mut state = self.inner.state.lock().await;
                if let Some(payload) = state.correlation.remove(&key) {
                    return Ok(payload);
                }
                if state.ads_error != AdsReturnCode::Ok {
                    let err = state.ads_error;
                    state.ads_error = AdsReturnCode::Ok;
                    return Err(ClientError::Ads(err));
                }
            }

            if !self.inner.connected.load(Ordering::Acquire) {
                return Err(ClientError::ConnectionClosed);
            }

            let _ = tokio::time::timeout(self.inner.config.response_wait, notified).await;
        }

        self.mark_fatal("response timeout".to_string()).await;
        Err(ClientError::Timeout)
    }

    async fn receiver_loop(inner: Arc<Inner>, mut reader: AmsReader<OwnedReadHalf>) {
        loop {
            if !inner.connected.load(Ordering::Acquire) {
                break;
            }

            let frame = tokio::select! {
                res = reader.read_frame() => res,
                _ = tokio::time::sleep(inner.config.receiver_poll_interval) => continue,
            };

            match frame {
                Ok(frame) => Self::dispatch_frame(&inner, frame).await,
                Err(e) => {
                    tracing::error!(error = %e, "receiver loop: fatal transport error");
                    Self::mark_fatal_static(&inner, format!("receiver error: {e}")).await;
                    break;
                }
            }
        }

        inner.connected.store(false, Ordering::Release);
        inner.response_ready.notify_waiters();
        tracing::debug!("receiver loop exited");
    }

    async fn dispatch_frame(inner: &Arc<Inner>, frame: AmsFrame) {
        if frame.header().command() != AmsCommand::AdsCommand {
            tracing::debug!(command = ?frame.header().command(), "dropping non-ADS AMS frame");
            return;
        }

        let payload = frame.payload();
        if payload.len() < ADS_HEADER_LEN {
            tracing::warn!("short ADS frame dropped");
            return;
        }

        let header = match AdsHeader::try_from_slice(&payload[..ADS_HEADER_LEN]) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(error = %e, "malformed ADS header dropped");
                return;
            }
        };
        let body = &payload[ADS_HEADER_LEN..];

        let mut state = inner.state.lock().await;
        if header.target().port() != state.source.port() || header.source().port() != state.target.port() {
            tracing::debug!(
                header_source_port = header.source().port(),
                header_target_port = header.target().port(),
                our_source_port = state.source.port(),
                our_target_port = state.target.port(),
                "dropping frame addressed to a different connection (shared router)"
            );
            return;
        }

        if header.command_id() == AdsCommand::AdsDeviceNotification {
            drop(state);
            Self::dispatch_notification(inner, body).await;
            return;
        }

        let key = correlation_key(header.command_id(), header.invoke_id());
        if header.error_code() != AdsReturnCode::Ok {
            state.ads_error = header.error_code();
        } else {
            state.correlation.insert(key, body.to_vec());
        }
        drop(state);
        inner.response_ready.notify_waiters();
    }

    async fn dispatch_notification(inner: &Arc<Inner>, body: &[u8]) {
        let notif = match AdsDeviceNotification::parse(body) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed device notification");
                return;
            }
        };
        let owned = notif.to_owned();

        let callbacks: Vec<(NotificationCallback, Vec<u8>)> = {
            let state = inner.state.lock().await;
            owned
                .iter_samples()
                .filter_map(|(_, sample)| {
                    state
                        .callbacks
                        .get(&sample.handle().as_u32())
                        .cloned()
                        .map(|cb| (cb, sample.data().to_vec()))
                })
                .collect()
        };

        for (callback, data) in callbacks {
            tokio::spawn(async move { callback(&data) });
        }
    }

    pub(crate) async fn register_callback(&self, handle: NotificationHandle, callback: NotificationCallback) {
        let mut state = self.inner.state.lock().await;
        state.owned_notifications.insert(handle.as_u32());
        state.callbacks.insert(handle.as_u32(), callback);
    }

    pub(crate) async fn unregister_callback(&self, handle: NotificationHandle) {
        let mut state = self.inner.state.lock().await;
        state.owned_notifications.remove(&handle.as_u32());
        state.callbacks.remove(&handle.as_u32());
    }

    pub(crate) async fn track_handle(&self, handle: u32) {
        self.inner.state.lock().await.owned_handles.insert(handle);
    }

    pub(crate) async fn untrack_handle(&self, handle: u32) {
        self.inner.state.lock().await.owned_handles.remove(&handle);
    }

    /// Tears down the connection: releases owned notifications and symbol handles
    /// (best-effort), then stops the receiver loop and joins its task.
    ///
    /// Safe to call more than once; only the first call does any work. Cleanup RPCs
    /// run *before* the receiver is told to stop, since the receiver is what delivers
    /// their responses - stopping it first would make every cleanup call time out.
    pub async fn disconnect(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let (notifications, handles) = {
            let state = self.inner.state.lock().await;
            (
                state.owned_notifications.clone(),
                state.owned_handles.clone(),
            )
        };

        for handle in notifications {
            if let Err(e) = self.remove_notification(NotificationHandle::from(handle)).await {
                tracing::warn!(error = %e, handle, "best-effort notification removal failed during disconnect");
            }
        }
        for handle in handles {
            if let Err(e) = self.release_handle(handle).await {
                tracing::warn!(error = %e, handle, "best-effort handle release failed during disconnect");
            }
        }

        self.inner.connected.store(false, Ordering::Release);
        tokio::time::sleep(Duration::from_millis(50)).await;

        if let Some(task) = self.inner.receiver.lock().await.take() {
            if tokio::time::timeout(Duration::from_secs(2), task)
                .await
                .is_err()
            {
                tracing::warn!("receiver task did not exit within the shutdown grace period");
            }
        }

        tracing::info!("connection closed");
        Ok(())
    }
}

/// Resolves `host` to an [`IpAddr`], used only to derive a default target NetId and
/// to classify the connection as loopback for the self-registration handshake.
async fn resolve_host_ip(host: &str, port: u16) -> Result<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    lookup_host((host, port))
        .await?
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| ClientError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, format!("could not resolve host {host}"))))
}

fn resolve_target(config: &ConnectionConfig, resolved_ip: IpAddr) -> AmsAddr {
    let net_id = config.target_net_id.unwrap_or_else(|| match resolved_ip {
        IpAddr::V4(ip) => net_id_from_ipv4(ip),
        IpAddr::V6(_) => AmsNetId::UNSET,
    });
    let port = config.target_port.unwrap_or(config.ads_port);
    AmsAddr::new(net_id, port)
}

/// Resolves this client's own AMS identity.
///
/// If `config.source_net_id` is set, that override is used directly (the `setSource`
/// pre-connect equivalent - no handshake). Otherwise, if the router is loopback, a
/// [`PortConnectRequest`] handshake asks the local router to self-assign a port.
/// A non-loopback router with no override has no local router to ask, so this
/// returns [`ClientError::MissingSourceIdentity`].
async fn resolve_source(
    config: &ConnectionConfig,
    resolved_ip: IpAddr,
    stream: &mut AmsStream<TcpStream>,
) -> Result<AmsAddr> {
    if let Some(net_id) = config.source_net_id {
        let port = config.source_port.unwrap_or(DEFAULT_SOURCE_PORT);
        return Ok(AmsAddr::new(net_id, port));
    }

    if !resolved_ip.is_loopback() {
        return Err(ClientError::MissingSourceIdentity);
    }

    stream
        .write_frame(&PortConnectRequest::new(0).into_frame())
        .await?;
    let frame = stream.read_frame().await?;
    let response = PortConnectResponse::from_frame(frame)?;
    Ok(*response.addr())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsrs_core::ads::AdsState;
    use adsrs_core::protocol::AdsReadStateResponse;
    use tokio::net::TcpListener;

    #[test]
    fn correlation_key_distinguishes_command_and_invoke_id() {
        let a = correlation_key(AdsCommand::AdsRead, 7);
        let b = correlation_key(AdsCommand::AdsWrite, 7);
        let c = correlation_key(AdsCommand::AdsRead, 8);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, correlation_key(AdsCommand::AdsRead, 7));
    }

    #[test]
    fn state_next_invoke_id_wraps() {
        let addr = AmsAddr::new(AmsNetId::UNSET, 0);
        let mut state = State::new(addr, addr);
        state.invoke_id = INVOKE_ID_MASK;
        assert_eq!(state.next_invoke_id(), INVOKE_ID_MASK);
        assert_eq!(state.next_invoke_id(), 0);
    }

    /// Spawns a mock router+device on a loopback socket: answers the `PortConnect`
    /// handshake, then a single `AdsReadState` request, mirroring the byte-level
    /// round trip a real TwinCAT runtime performs for `getState`.
    async fn spawn_mock_router_and_device(listener: TcpListener, ads_state: AdsState, device_state: u16) {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut mock = AmsStream::new(stream);

        let connect_frame = mock.read_frame().await.expect("read PortConnect request");
        assert_eq!(connect_frame.header().command(), AmsCommand::PortConnect);
        let assigned = AmsAddr::new(AmsNetId::new(127, 0, 0, 1, 1, 1), DEFAULT_SOURCE_PORT);
        mock.write_frame(&PortConnectResponse::new(assigned).into_frame())
            .await
            .expect("write PortConnect response");

        let request_frame = mock.read_frame().await.expect("read ADS request");
        assert_eq!(request_frame.header().command(), AmsCommand::AdsCommand);
        let request_header = AdsHeader::try_from_slice(&request_frame.payload()[..ADS_HEADER_LEN])
            .expect("parse ADS request header");
        assert_eq!(request_header.command_id(), AdsCommand::AdsReadState);

        let mut body = Vec::new();
        AdsReadStateResponse::new(AdsReturnCode::Ok, ads_state, device_state)
            .write_to(&mut body)
            .expect("writing to a Vec never fails");

        let response_header = AdsHeader::new(
            request_header.source().clone(),
            request_header.target().clone(),
            AdsCommand::AdsReadState,
            StateFlag::tcp_ads_response(),
            body.len() as u32,
            AdsReturnCode::Ok,
            request_header.invoke_id(),
        );
        let mut payload = response_header.to_bytes().to_vec();
        payload.extend_from_slice(&body);
        mock.write_frame(&AmsFrame::new(AmsCommand::AdsCommand, payload))
            .await
            .expect("write ADS response");
    }

    #[tokio::test]
    async fn get_state_round_trip_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock router");
        let router_port = listener.local_addr().expect("local addr").port();

        let server = tokio::spawn(spawn_mock_router_and_device(listener, AdsState::Run, 0));

        let config = ConnectionConfig {
            router_port,
            response_retries: 5,
            response_wait: Duration::from_millis(500),
            receiver_poll_interval: Duration::from_millis(20),
            ..ConnectionConfig::default()
        };
        let conn = Connection::connect_with_config(config).await.expect("connect");

        let (state, device_state) = conn.get_state().await.expect("get_state");
        assert_eq!(state, AdsState::Run);
        assert_eq!(device_state, 0);

        server.await.expect("mock router task");

        conn.disconnect().await.expect("disconnect");
        assert!(conn.is_closed());
    }
}
