//! Server provisioning: install the binary, then launch it.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};
use interceptor_common::HostState;
use tokio::io::AsyncBufReadExt;
use tracing::{debug, info};

use super::status::resolve_state;
use crate::application::ports::{
    ByteStream, DeviceFs, DeviceHandle, DeviceProperties, DeviceShell, ServerBinaryProvider,
};
use crate::application::services::readiness::wait_until;
use crate::domain::config::ReadinessConfig;
use crate::domain::device::{
    DEVICE_SERVER_DIR, SERVER_BINARY_MODE, SERVER_PLATFORM, root_invocation, server_listen_address,
    server_path,
};
use crate::domain::{InterceptorError, device_abis, select_arch};

/// Install the Frida server matching the device's architecture.
///
/// Safe to repeat: an existing binary is overwritten.
///
/// # Errors
///
/// Returns [`InterceptorError::UnrecognizedArchitecture`] before anything is
/// fetched or pushed when no reported ABI is supported, or an error if the
/// binary cannot be fetched or pushed.
pub async fn install(
    device: &(impl DeviceProperties + DeviceShell + DeviceFs),
    provider: &impl ServerBinaryProvider,
    host_id: &str,
    version: &str,
) -> Result<()> {
    let properties = device
        .properties()
        .await
        .with_context(|| format!("reading properties of {host_id}"))?;
    let abis = device_abis(&properties);
    let arch = select_arch(&abis)?;
    info!(host_id, %arch, version, "installing Frida server");

    let binary = provider
        .fetch(version, SERVER_PLATFORM, arch.as_str())
        .await
        .with_context(|| format!("fetching Frida server {version} for {SERVER_PLATFORM}-{arch}"))?;

    device
        .shell(&["mkdir", "-p", DEVICE_SERVER_DIR])
        .await
        .with_context(|| format!("creating {DEVICE_SERVER_DIR} on {host_id}"))?;
    device
        .push(binary, &server_path(), SERVER_BINARY_MODE)
        .await
        .with_context(|| format!("pushing Frida server to {host_id}"))?;

    info!(host_id, "Frida server installed");
    Ok(())
}

/// Start the installed server as root and wait until it accepts connections.
///
/// The server keeps running after this returns; its output is logged at
/// debug level for as long as it runs.
///
/// # Errors
///
/// Returns [`InterceptorError::AccessDenied`] when root is unavailable, and
/// an error wrapping [`InterceptorError::ReadinessTimeout`] when the server
/// never becomes reachable.
pub async fn launch(
    device: &impl DeviceHandle,
    host_id: &str,
    readiness: &ReadinessConfig,
) -> Result<()> {
    let root = device
        .root_command()
        .await
        .with_context(|| format!("checking root access on {host_id}"))?
        .ok_or_else(|| InterceptorError::AccessDenied {
            host_id: host_id.to_string(),
        })?;

    let path = server_path();
    let listen = server_listen_address();
    let args = root_invocation(&root, &[&path, "-l", &listen]);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    info!(host_id, %listen, "launching Frida server");
    let output = device
        .shell_stream(&args)
        .await
        .with_context(|| format!("starting Frida server on {host_id}"))?;
    tokio::spawn(forward_output(host_id.to_string(), output));

    wait_until(
        &format!("Frida server on {host_id}"),
        readiness.interval(),
        readiness.max_attempts,
        || async move { Ok(resolve_state(device).await == HostState::Available) },
    )
    .await
    .with_context(|| format!("Failed to launch Frida server for {host_id}"))?;

    info!(host_id, "Frida server available");
    Ok(())
}

async fn forward_output(host_id: String, output: ByteStream) {
    let mut lines = tokio::io::BufReader::new(output).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => debug!(host_id = %host_id, "frida-server: {line}"),
            Ok(None) => break,
            Err(e) => {
                debug!(host_id = %host_id, error = %e, "frida-server output closed");
                break;
            }
        }
    }
    debug!(host_id = %host_id, "frida-server output ended");
}
