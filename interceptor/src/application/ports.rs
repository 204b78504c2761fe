//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that collaborators must fulfil: the
//! adb device bridge, the Frida session client, and the server binary source.
//! This file imports only from `crate::domain` and the shared types crate.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use interceptor_common::Target;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::domain::InterceptorConfig;

// ── Value Types ───────────────────────────────────────────────────────────────

/// A readable byte stream: shell output, or a binary to push.
pub type ByteStream = Box<dyn AsyncRead + Unpin + Send>;

/// Bidirectional stream used for tunnels.
pub trait Duplex: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> Duplex for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// A TCP connection tunnelled through the device bridge to a device port.
pub type TunnelStream = Box<dyn Duplex>;

/// One entry of a device directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    /// Unix permission bits.
    pub mode: u32,
}

// ── Device Bridge Ports ───────────────────────────────────────────────────────

/// Entry point to the device bridge: enumerates devices and hands out
/// per-device handles.
#[allow(async_fn_in_trait)]
pub trait DeviceBridge {
    type Device: DeviceHandle;

    /// Ids of every connected device.
    async fn list_devices(&self) -> Result<Vec<String>>;

    /// Handle for one device. Creating a handle performs no I/O; a device
    /// that has gone away surfaces as an error from the handle's operations.
    fn device(&self, id: &str) -> Self::Device;
}

/// File operations on a device.
#[allow(async_fn_in_trait)]
pub trait DeviceFs {
    /// List a directory.
    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>>;
    /// Write `contents` to `path` with the given permission bits.
    async fn push(&self, contents: ByteStream, path: &str, mode: u32) -> Result<()>;
}

/// Command execution on a device.
#[allow(async_fn_in_trait)]
pub trait DeviceShell {
    /// Command prefix that runs its arguments as root, e.g. `["su", "-c"]`.
    ///
    /// `Ok(None)` when root is unavailable; `Ok(Some(vec![]))` when the shell
    /// already runs as root.
    async fn root_command(&self) -> Result<Option<Vec<String>>>;
    /// Run a command and collect its output.
    async fn shell(&self, args: &[&str]) -> Result<String>;
    /// Start a command and stream its output while it runs.
    async fn shell_stream(&self, args: &[&str]) -> Result<ByteStream>;
}

/// Port forwarding to and from a device.
#[allow(async_fn_in_trait)]
pub trait DeviceNetwork {
    /// Connect to `port` on the device.
    async fn open_tunnel(&self, port: u16) -> Result<TunnelStream>;
    /// Make host port `local_port` reachable from the device on `remote_port`.
    async fn reverse(&self, remote_port: u16, local_port: u16) -> Result<()>;
}

/// System properties of a device.
#[allow(async_fn_in_trait)]
pub trait DeviceProperties {
    async fn properties(&self) -> Result<HashMap<String, String>>;
}

/// Composite trait: any type implementing all four sub-traits is a device.
pub trait DeviceHandle: DeviceFs + DeviceShell + DeviceNetwork + DeviceProperties {}

/// Blanket implementation: any type implementing all four sub-traits is a `DeviceHandle`.
impl<T> DeviceHandle for T where T: DeviceFs + DeviceShell + DeviceNetwork + DeviceProperties {}

// ── Instrumentation Session Ports ─────────────────────────────────────────────

/// Opens Frida sessions over an existing tunnel.
#[allow(async_fn_in_trait)]
pub trait SessionConnector {
    type Session: InstrumentationSession;

    async fn connect(&self, stream: TunnelStream) -> Result<Self::Session>;
}

/// A connected Frida session.
#[allow(async_fn_in_trait)]
pub trait InstrumentationSession {
    /// Installed applications.
    async fn enumerate_applications(&self) -> Result<Vec<Target>>;
    /// Spawn `app_id` suspended, load `script` into it, then resume it.
    /// Returns the spawned pid.
    async fn spawn_with_script(&self, app_id: &str, script: &str) -> Result<u32>;
    /// Close the session.
    async fn disconnect(self) -> Result<()>;
}

// ── Server Binary Port ────────────────────────────────────────────────────────

/// Source of Frida server binaries.
#[allow(async_fn_in_trait)]
pub trait ServerBinaryProvider {
    /// The server for `version` built for `platform`/`arch`.
    async fn fetch(&self, version: &str, platform: &str, arch: &str) -> Result<ByteStream>;
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts configuration persistence (load/save).
#[cfg_attr(test, mockall::automock)]
pub trait ConfigStore {
    /// Load the configuration, returning defaults when none is stored.
    fn load(&self) -> Result<InterceptorConfig>;
    /// Persist the configuration.
    fn save(&self, config: &InterceptorConfig) -> Result<()>;
    /// Location of the stored configuration.
    fn path(&self) -> Result<PathBuf>;
}
