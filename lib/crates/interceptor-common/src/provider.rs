//! The contract an interception provider fulfils for the interceptor host.

use std::time::Duration;

use anyhow::Result;
use serde_json::Value;

use crate::types::{Host, HostsMetadata, MetadataKind, TargetsMetadata};

/// A pluggable source of interceptable hosts.
///
/// The host application drives every provider through this trait: it lists
/// hosts for display, asks for per-host metadata on demand, and activates a
/// provider against the proxy listening on `proxy_port`.
#[allow(async_fn_in_trait)]
pub trait Interceptor {
    /// Stable provider id.
    fn id(&self) -> &'static str;

    /// Provider version.
    fn version(&self) -> &'static str;

    /// How long the host should wait for `activate` before reporting it as
    /// slow. A hint only; activation is never cancelled.
    fn activable_timeout(&self) -> Duration;

    /// Hosts currently reachable through this provider.
    ///
    /// Overlapping calls may share one lookup; a call joins it when made,
    /// not when its future is first polled.
    fn list_hosts(&self) -> impl Future<Output = Result<Vec<Host>>>;

    /// Whether at least one host is reachable. Joins like [`list_hosts`].
    ///
    /// [`list_hosts`]: Interceptor::list_hosts
    fn is_activable(&self) -> impl Future<Output = Result<bool>>;

    /// Whether an interception is running against `proxy_port`.
    fn is_active(&self, proxy_port: u16) -> bool;

    /// Metadata describing every host. Joins like [`list_hosts`].
    ///
    /// [`list_hosts`]: Interceptor::list_hosts
    fn get_metadata(&self, kind: MetadataKind) -> impl Future<Output = Result<HostsMetadata>>;

    /// Metadata describing one host's targets.
    async fn get_sub_metadata(&self, host_id: &str) -> Result<TargetsMetadata>;

    /// Perform the activation described by `options`.
    async fn activate(&self, proxy_port: u16, options: &Value) -> Result<()>;

    /// Stop everything activated against `proxy_port`.
    async fn deactivate(&self, proxy_port: u16) -> Result<()>;

    /// Stop everything this provider has started.
    async fn deactivate_all(&self) -> Result<()>;
}
