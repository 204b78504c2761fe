//! Host state resolution.
//!
//! Derives a [`HostState`] from live observations every time it is asked.
//! Nothing is stored between calls.

use interceptor_common::HostState;
use tracing::debug;

use super::probe::{is_installed, is_port_open, is_rooted};
use crate::application::ports::{DeviceFs, DeviceNetwork, DeviceShell};
use crate::domain::device::{FRIDA_ALTERNATE_PORT, FRIDA_DEFAULT_PORT};

/// Resolve the current state of one device.
///
/// Both server ports are probed together. The install and root probes only
/// run, in that order, while the answer is still unknown: a listening server
/// skips both, and an installed binary skips the root probe.
pub async fn resolve_state(device: &(impl DeviceFs + DeviceNetwork + DeviceShell)) -> HostState {
    let (default_open, alternate_open) = tokio::join!(
        is_port_open(device, FRIDA_DEFAULT_PORT),
        is_port_open(device, FRIDA_ALTERNATE_PORT),
    );

    let state = if default_open || alternate_open {
        HostState::Available
    } else if is_installed(device).await {
        HostState::LaunchRequired
    } else if is_rooted(device).await {
        HostState::SetupRequired
    } else {
        HostState::Unavailable
    };
    debug!(default_open, alternate_open, %state, "resolved host state");
    state
}
