//! Frida sessions: connecting, listing targets, and intercepting an app.

use anyhow::{Context, Result};
use interceptor_common::Target;
use tracing::{debug, info};

use crate::application::ports::{DeviceNetwork, InstrumentationSession, SessionConnector};
use crate::domain::device::{DEVICE_PROXY_HOST, SESSION_PORTS};
use crate::domain::script::build_android_script;

/// Open a session, trying the alternate port before the default one.
///
/// # Errors
///
/// Returns the last failure when no port yields a session.
pub async fn connect_session<C: SessionConnector>(
    device: &impl DeviceNetwork,
    connector: &C,
) -> Result<C::Session> {
    let mut last_error = None;
    for port in SESSION_PORTS {
        let attempt = async {
            let stream = device.open_tunnel(port).await?;
            connector.connect(stream).await
        };
        match attempt.await {
            Ok(session) => {
                debug!(port, "Frida session connected");
                return Ok(session);
            }
            Err(e) => {
                debug!(port, error = %e, "Frida session attempt failed");
                last_error = Some(e);
            }
        }
    }
    Err(last_error
        .unwrap_or_else(|| anyhow::anyhow!("no Frida ports to try"))
        .context("connecting to Frida server"))
}

/// Applications installed on the device.
///
/// # Errors
///
/// Returns an error if no session can be opened or the listing fails.
pub async fn list_targets(
    device: &impl DeviceNetwork,
    connector: &impl SessionConnector,
) -> Result<Vec<Target>> {
    let session = connect_session(device, connector).await?;
    let targets = session
        .enumerate_applications()
        .await
        .context("listing applications");
    disconnect(session).await;
    targets
}

/// Spawn `target_id` with the interception script for the proxy on
/// `proxy_port`, and return the spawned pid.
///
/// The proxy port is reverse-tunnelled first so the app reaches the proxy
/// at the same port on the device's loopback address. Failures inside the
/// injected script after spawn are not reported here.
///
/// # Errors
///
/// Returns an error if the tunnel, session, or spawn fails.
pub async fn intercept(
    device: &impl DeviceNetwork,
    connector: &impl SessionConnector,
    target_id: &str,
    ca_cert_pem: &str,
    proxy_port: u16,
) -> Result<u32> {
    device
        .reverse(proxy_port, proxy_port)
        .await
        .with_context(|| format!("forwarding proxy port {proxy_port} to the device"))?;

    let session = connect_session(device, connector).await?;
    let script = build_android_script(ca_cert_pem, DEVICE_PROXY_HOST, proxy_port);
    let pid = session
        .spawn_with_script(target_id, &script)
        .await
        .with_context(|| format!("spawning {target_id} with interception script"));
    disconnect(session).await;

    let pid = pid?;
    info!(target_id, pid, proxy_port, "target intercepted");
    Ok(pid)
}

async fn disconnect(session: impl InstrumentationSession) {
    if let Err(e) = session.disconnect().await {
        debug!(error = %e, "Frida session did not disconnect cleanly");
    }
}
