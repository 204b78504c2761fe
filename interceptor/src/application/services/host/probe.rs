//! Cheap boolean probes of a device.
//!
//! Every probe here swallows its own failures: an unreachable port, an
//! unreadable directory or an unsupported `su` all mean "no".

use tracing::debug;

use crate::application::ports::{DeviceFs, DeviceNetwork, DeviceShell};
use crate::domain::device::{DEVICE_SERVER_DIR, SERVER_BINARY_NAME, is_executable};

/// Whether something on the device accepts connections on `port`.
///
/// The tunnel is dropped as soon as it opens; whatever happens to it after
/// that is irrelevant to the answer.
pub async fn is_port_open(device: &impl DeviceNetwork, port: u16) -> bool {
    match device.open_tunnel(port).await {
        Ok(stream) => {
            drop(stream);
            true
        }
        Err(e) => {
            debug!(port, error = %e, "port probe failed");
            false
        }
    }
}

/// Whether an executable server binary is already installed.
pub async fn is_installed(device: &impl DeviceFs) -> bool {
    match device.read_dir(DEVICE_SERVER_DIR).await {
        Ok(entries) => entries
            .iter()
            .any(|entry| entry.name == SERVER_BINARY_NAME && is_executable(entry.mode)),
        Err(e) => {
            debug!(dir = DEVICE_SERVER_DIR, error = %e, "install probe failed");
            false
        }
    }
}

/// Whether root can be obtained on the device.
pub async fn is_rooted(device: &impl DeviceShell) -> bool {
    match device.root_command().await {
        Ok(prefix) => prefix.is_some(),
        Err(e) => {
            debug!(error = %e, "root probe failed");
            false
        }
    }
}
