//! In-memory fakes of the device bridge, session client and binary provider
//! shared by the host service tests.
//!
//! Every fake records the calls it receives so tests can assert on ordering
//! and short-circuiting. Clones share state.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context as TaskContext, Poll};

use anyhow::Result;
use interceptor_common::Target;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, DuplexStream, ReadBuf};

use crate::application::ports::{
    ByteStream, DeviceBridge, DeviceFs, DeviceNetwork, DeviceProperties, DeviceShell, DirEntry,
    InstrumentationSession, ServerBinaryProvider, SessionConnector, TunnelStream,
};

// ── Tunnel ────────────────────────────────────────────────────────────────────

/// Tunnel that tracks how many are still alive.
struct CountedTunnel {
    inner: DuplexStream,
    live: Arc<AtomicUsize>,
}

impl CountedTunnel {
    fn open(live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        let (inner, _peer) = tokio::io::duplex(64);
        Self {
            inner,
            live: Arc::clone(live),
        }
    }
}

impl Drop for CountedTunnel {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AsyncRead for CountedTunnel {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for CountedTunnel {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(
        mut self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

// ── Device ────────────────────────────────────────────────────────────────────

/// A file pushed to a [`FakeDevice`].
#[derive(Debug, Clone)]
pub struct Pushed {
    pub path: String,
    pub mode: u32,
    pub contents: Vec<u8>,
}

#[derive(Default)]
struct DeviceState {
    open_ports: RefCell<HashSet<u16>>,
    launch_opens: Cell<Option<u16>>,
    dir: RefCell<Option<Vec<DirEntry>>>,
    root: RefCell<Option<Vec<String>>>,
    root_error: Cell<bool>,
    shell_output: RefCell<Option<String>>,
    properties: RefCell<HashMap<String, String>>,
    calls: RefCell<Vec<String>>,
    pushed: RefCell<Vec<Pushed>>,
    live_tunnels: Arc<AtomicUsize>,
}

/// Scriptable device. By default every port is closed, the server directory
/// is unreadable and root is unavailable.
#[derive(Clone, Default)]
pub struct FakeDevice {
    state: Rc<DeviceState>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_open_port(self, port: u16) -> Self {
        self.state.open_ports.borrow_mut().insert(port);
        self
    }

    pub fn with_dir(self, entries: Vec<DirEntry>) -> Self {
        *self.state.dir.borrow_mut() = Some(entries);
        self
    }

    pub fn with_root(self, prefix: &[&str]) -> Self {
        *self.state.root.borrow_mut() = Some(prefix.iter().map(|s| (*s).to_string()).collect());
        self
    }

    pub fn with_root_error(self) -> Self {
        self.state.root_error.set(true);
        self
    }

    /// Fixed output for every `shell` call, instead of completing commands.
    pub fn with_shell_output(self, output: &str) -> Self {
        *self.state.shell_output.borrow_mut() = Some(output.to_string());
        self
    }

    pub fn with_property(self, key: &str, value: &str) -> Self {
        self.state
            .properties
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Simulate a server that starts listening on `port` once launched.
    pub fn opening_port_on_launch(self, port: u16) -> Self {
        self.state.launch_opens.set(Some(port));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.calls.borrow().clone()
    }

    pub fn pushed(&self) -> Vec<Pushed> {
        self.state.pushed.borrow().clone()
    }

    pub fn live_tunnels(&self) -> usize {
        self.state.live_tunnels.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        self.state.calls.borrow_mut().push(call);
    }
}

impl DeviceFs for FakeDevice {
    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        self.record(format!("read_dir {path}"));
        self.state
            .dir
            .borrow()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("{path}: No such file or directory"))
    }

    async fn push(&self, mut contents: ByteStream, path: &str, mode: u32) -> Result<()> {
        self.record(format!("push {path} {mode:o}"));
        let mut buf = Vec::new();
        contents.read_to_end(&mut buf).await?;
        self.state.pushed.borrow_mut().push(Pushed {
            path: path.to_string(),
            mode,
            contents: buf,
        });
        Ok(())
    }
}

impl DeviceShell for FakeDevice {
    async fn root_command(&self) -> Result<Option<Vec<String>>> {
        self.record("root_command".to_string());
        if self.state.root_error.get() {
            anyhow::bail!("su: not found");
        }
        Ok(self.state.root.borrow().clone())
    }

    async fn shell(&self, args: &[&str]) -> Result<String> {
        let command = args.join(" ");
        self.record(format!("shell {command}"));
        if let Some(output) = self.state.shell_output.borrow().clone() {
            return Ok(output);
        }
        Ok(match command.rsplit_once(" && echo ") {
            Some((_, marker)) => format!("{marker}\n"),
            None => String::new(),
        })
    }

    async fn shell_stream(&self, args: &[&str]) -> Result<ByteStream> {
        self.record(format!("shell_stream {}", args.join(" ")));
        if let Some(port) = self.state.launch_opens.get() {
            self.state.open_ports.borrow_mut().insert(port);
        }
        Ok(Box::new(&b"Frida server listening\n"[..]))
    }
}

impl DeviceNetwork for FakeDevice {
    async fn open_tunnel(&self, port: u16) -> Result<TunnelStream> {
        self.record(format!("open_tunnel {port}"));
        if self.state.open_ports.borrow().contains(&port) {
            Ok(Box::new(CountedTunnel::open(&self.state.live_tunnels)))
        } else {
            anyhow::bail!("connection refused on tcp:{port}")
        }
    }

    async fn reverse(&self, remote_port: u16, local_port: u16) -> Result<()> {
        self.record(format!("reverse {remote_port} {local_port}"));
        Ok(())
    }
}

impl DeviceProperties for FakeDevice {
    async fn properties(&self) -> Result<HashMap<String, String>> {
        self.record("properties".to_string());
        Ok(self.state.properties.borrow().clone())
    }
}

// ── Bridge ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct BridgeState {
    devices: RefCell<Vec<(String, FakeDevice)>>,
    list_calls: Cell<u32>,
    list_error: Cell<bool>,
}

/// Bridge over a fixed set of [`FakeDevice`]s. Unknown ids get a fresh,
/// unreachable device.
#[derive(Clone, Default)]
pub struct FakeBridge {
    state: Rc<BridgeState>,
}

impl FakeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(self, id: &str, device: FakeDevice) -> Self {
        self.state.devices.borrow_mut().push((id.to_string(), device));
        self
    }

    pub fn failing(self) -> Self {
        self.state.list_error.set(true);
        self
    }

    pub fn list_calls(&self) -> u32 {
        self.state.list_calls.get()
    }
}

impl DeviceBridge for FakeBridge {
    type Device = FakeDevice;

    async fn list_devices(&self) -> Result<Vec<String>> {
        self.state.list_calls.set(self.state.list_calls.get() + 1);
        // Let concurrent callers interleave with the lookup.
        tokio::task::yield_now().await;
        if self.state.list_error.get() {
            anyhow::bail!("adb server not running");
        }
        Ok(self
            .state
            .devices
            .borrow()
            .iter()
            .map(|(id, _)| id.clone())
            .collect())
    }

    fn device(&self, id: &str) -> FakeDevice {
        self.state
            .devices
            .borrow()
            .iter()
            .find(|(known, _)| known == id)
            .map(|(_, device)| device.clone())
            .unwrap_or_default()
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct SessionState {
    apps: RefCell<Vec<Target>>,
    failing_connects: Cell<u32>,
    connects: Cell<u32>,
    spawned: RefCell<Vec<(String, String)>>,
    disconnects: Cell<u32>,
}

/// Session connector whose sessions share one recorded state.
#[derive(Clone, Default)]
pub struct FakeConnector {
    state: Rc<SessionState>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_app(self, id: &str, name: &str) -> Self {
        self.state.apps.borrow_mut().push(Target {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    /// Fail the first `count` connection attempts.
    pub fn failing_first(self, count: u32) -> Self {
        self.state.failing_connects.set(count);
        self
    }

    pub fn connects(&self) -> u32 {
        self.state.connects.get()
    }

    pub fn spawned(&self) -> Vec<(String, String)> {
        self.state.spawned.borrow().clone()
    }

    pub fn disconnects(&self) -> u32 {
        self.state.disconnects.get()
    }
}

pub struct FakeSession {
    state: Rc<SessionState>,
    _stream: TunnelStream,
}

impl SessionConnector for FakeConnector {
    type Session = FakeSession;

    async fn connect(&self, stream: TunnelStream) -> Result<FakeSession> {
        self.state.connects.set(self.state.connects.get() + 1);
        let remaining = self.state.failing_connects.get();
        if remaining > 0 {
            self.state.failing_connects.set(remaining - 1);
            anyhow::bail!("unable to handshake with frida-server");
        }
        Ok(FakeSession {
            state: Rc::clone(&self.state),
            _stream: stream,
        })
    }
}

/// Pid returned for every spawn.
pub const SPAWNED_PID: u32 = 4242;

impl InstrumentationSession for FakeSession {
    async fn enumerate_applications(&self) -> Result<Vec<Target>> {
        Ok(self.state.apps.borrow().clone())
    }

    async fn spawn_with_script(&self, app_id: &str, script: &str) -> Result<u32> {
        if !self.state.apps.borrow().iter().any(|app| app.id == app_id) {
            anyhow::bail!("unable to find application with identifier '{app_id}'");
        }
        self.state
            .spawned
            .borrow_mut()
            .push((app_id.to_string(), script.to_string()));
        Ok(SPAWNED_PID)
    }

    async fn disconnect(self) -> Result<()> {
        self.state.disconnects.set(self.state.disconnects.get() + 1);
        Ok(())
    }
}

// ── Binary provider ───────────────────────────────────────────────────────────

/// Provider serving fixed bytes for any request.
pub struct FakeProvider {
    contents: Vec<u8>,
    requests: RefCell<Vec<(String, String, String)>>,
}

impl FakeProvider {
    pub fn new(contents: &[u8]) -> Self {
        Self {
            contents: contents.to_vec(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, String, String)> {
        self.requests.borrow().clone()
    }
}

impl ServerBinaryProvider for FakeProvider {
    async fn fetch(&self, version: &str, platform: &str, arch: &str) -> Result<ByteStream> {
        self.requests.borrow_mut().push((
            version.to_string(),
            platform.to_string(),
            arch.to_string(),
        ));
        Ok(Box::new(std::io::Cursor::new(self.contents.clone())))
    }
}
