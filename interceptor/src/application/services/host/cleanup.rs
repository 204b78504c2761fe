//! Stopping what activation started: intercepted apps and launched servers.
//!
//! Both run through the device's root prefix, since the processes belong to
//! root or to another app's user.

use anyhow::{Context, Result};
use tracing::info;

use crate::application::ports::DeviceShell;
use crate::domain::device::{COMMAND_DONE_MARKER, root_invocation, server_path};

/// Kill an intercepted process.
///
/// # Errors
///
/// Returns an error if root is unavailable or the kill did not succeed.
pub async fn kill_process(device: &impl DeviceShell, host_id: &str, pid: u32) -> Result<()> {
    run_as_root(device, host_id, &["kill", "-9", &pid.to_string()]).await?;
    info!(host_id, pid, "intercepted process killed");
    Ok(())
}

/// Stop any server launched from the installed binary.
///
/// # Errors
///
/// Returns an error if root is unavailable or no server process was
/// stopped.
pub async fn stop_server(device: &impl DeviceShell, host_id: &str) -> Result<()> {
    let path = server_path();
    run_as_root(device, host_id, &["pkill", "-f", &path]).await?;
    info!(host_id, "Frida server stopped");
    Ok(())
}

async fn run_as_root(device: &impl DeviceShell, host_id: &str, command: &[&str]) -> Result<()> {
    let root = device
        .root_command()
        .await
        .with_context(|| format!("checking root access on {host_id}"))?
        .with_context(|| format!("root access lost on {host_id}"))?;
    let mut checked = command.to_vec();
    checked.extend(["&&", "echo", COMMAND_DONE_MARKER]);
    let args = root_invocation(&root, &checked);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = device
        .shell(&args)
        .await
        .with_context(|| format!("running '{}' on {host_id}", command.join(" ")))?;
    anyhow::ensure!(
        output.lines().any(|line| line.trim() == COMMAND_DONE_MARKER),
        "'{}' failed on {host_id}: {}",
        command.join(" "),
        output.trim()
    );
    Ok(())
}
