//! The Android Frida interceptor: the entry point the interceptor host drives.
//!
//! `FridaInterceptor` wires the bridge, session client and binary provider
//! into the host services and keeps track of what activation started so
//! deactivation can stop it.

use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use interceptor_common::{
    ActivationAction, Host, HostsMetadata, Interceptor, MetadataKind, Target, TargetsMetadata,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::application::ports::{
    ConfigStore, DeviceBridge, ServerBinaryProvider, SessionConnector,
};
use crate::application::services::config_service::load_config;
use crate::application::services::discovery::DiscoveryCache;
use crate::application::services::host::{cleanup, provision, session};
use crate::application::services::tracking::{ActiveInterception, InterceptionRegistry};
use crate::domain::{InterceptorConfig, InterceptorError, validate_config};
use crate::infra::server_cache::CachedServerProvider;

/// Provider id reported to the interceptor host.
pub const INTERCEPTOR_ID: &str = "android-frida";

/// Provider version reported to the interceptor host.
pub const INTERCEPTOR_VERSION: &str = "1.0.0";

/// How long activation may take before the host reports it as slow.
pub const ACTIVABLE_TIMEOUT: Duration = Duration::from_secs(3);

/// Intercepts Android apps by injecting a Frida script at spawn.
pub struct FridaInterceptor<B, C, P> {
    bridge: Rc<B>,
    connector: C,
    provider: P,
    config: InterceptorConfig,
    ca_cert_pem: Option<String>,
    discovery: DiscoveryCache<B>,
    registry: InterceptionRegistry,
}

impl<B, C> FridaInterceptor<B, C, CachedServerProvider>
where
    B: DeviceBridge + 'static,
    C: SessionConnector,
{
    /// Build from a validated configuration, reading the CA certificate
    /// from `ca_cert_path` when set and caching server binaries as
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the CA
    /// certificate cannot be read.
    pub fn from_config(bridge: B, connector: C, config: InterceptorConfig) -> Result<Self> {
        validate_config(&config)?;
        let provider = CachedServerProvider::from_config(&config.server_cache)?;
        let ca_cert_pem = config
            .ca_cert_path
            .as_deref()
            .map(read_ca_certificate)
            .transpose()?;
        let interceptor = Self::new(bridge, connector, provider, config);
        Ok(match ca_cert_pem {
            Some(pem) => interceptor.with_ca_certificate(pem),
            None => interceptor,
        })
    }

    /// Build from the configuration held by `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or is invalid.
    pub fn load(bridge: B, connector: C, store: &impl ConfigStore) -> Result<Self> {
        let config = load_config(store)?;
        Self::from_config(bridge, connector, config)
    }
}

impl<B, C, P> FridaInterceptor<B, C, P>
where
    B: DeviceBridge + 'static,
    C: SessionConnector,
    P: ServerBinaryProvider,
{
    #[must_use]
    pub fn new(bridge: B, connector: C, provider: P, config: InterceptorConfig) -> Self {
        let bridge = Rc::new(bridge);
        Self {
            discovery: DiscoveryCache::new(Rc::clone(&bridge)),
            bridge,
            connector,
            provider,
            config,
            ca_cert_pem: None,
            registry: InterceptionRegistry::new(),
        }
    }

    /// Set the PEM certificate intercepted apps are made to trust.
    #[must_use]
    pub fn with_ca_certificate(mut self, pem: impl Into<String>) -> Self {
        self.ca_cert_pem = Some(pem.into());
        self
    }

    #[must_use]
    pub fn config(&self) -> &InterceptorConfig {
        &self.config
    }

    /// What activation has started so far.
    #[must_use]
    pub fn registry(&self) -> &InterceptionRegistry {
        &self.registry
    }

    /// Applications installed on `host_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if no session can be opened on the host, including
    /// when the host is no longer connected.
    pub async fn targets(&self, host_id: &str) -> Result<Vec<Target>> {
        let device = self.bridge.device(host_id);
        session::list_targets(&device, &self.connector)
            .await
            .with_context(|| format!("listing targets on {host_id}"))
    }

    /// Run one provisioning stage.
    ///
    /// # Errors
    ///
    /// Returns the stage's error; see [`provision::install`],
    /// [`provision::launch`] and [`session::intercept`].
    pub async fn activate_action(&self, proxy_port: u16, action: ActivationAction) -> Result<()> {
        match action {
            ActivationAction::Setup { host_id } => {
                let device = self.bridge.device(&host_id);
                provision::install(&device, &self.provider, &host_id, &self.config.frida.version)
                    .await
            }
            ActivationAction::Launch { host_id } => {
                let device = self.bridge.device(&host_id);
                provision::launch(&device, &host_id, &self.config.readiness).await?;
                self.registry.record_launch(&host_id);
                Ok(())
            }
            ActivationAction::Intercept { host_id, target_id } => {
                let ca_cert_pem =
                    self.ca_cert_pem
                        .as_deref()
                        .ok_or_else(|| InterceptorError::InvalidConfig {
                            field: "ca_cert_path".to_string(),
                            reason: "a CA certificate is required to intercept".to_string(),
                        })?;
                let device = self.bridge.device(&host_id);
                let pid = session::intercept(
                    &device,
                    &self.connector,
                    &target_id,
                    ca_cert_pem,
                    proxy_port,
                )
                .await?;
                self.registry.record_interception(
                    proxy_port,
                    ActiveInterception {
                        host_id,
                        target_id,
                        pid,
                    },
                );
                Ok(())
            }
        }
    }

    async fn stop_interceptions(&self, interceptions: Vec<ActiveInterception>) {
        for interception in interceptions {
            let device = self.bridge.device(&interception.host_id);
            if let Err(e) =
                cleanup::kill_process(&device, &interception.host_id, interception.pid).await
            {
                warn!(
                    host_id = %interception.host_id,
                    target_id = %interception.target_id,
                    pid = interception.pid,
                    error = %format!("{e:#}"),
                    "failed to stop intercepted process"
                );
            }
        }
    }
}

impl<B, C, P> Interceptor for FridaInterceptor<B, C, P>
where
    B: DeviceBridge + 'static,
    C: SessionConnector,
    P: ServerBinaryProvider,
{
    fn id(&self) -> &'static str {
        INTERCEPTOR_ID
    }

    fn version(&self) -> &'static str {
        INTERCEPTOR_VERSION
    }

    fn activable_timeout(&self) -> Duration {
        ACTIVABLE_TIMEOUT
    }

    fn list_hosts(&self) -> impl Future<Output = Result<Vec<Host>>> {
        self.discovery.hosts()
    }

    fn is_activable(&self) -> impl Future<Output = Result<bool>> {
        let hosts = self.discovery.hosts();
        async move { Ok(!hosts.await?.is_empty()) }
    }

    fn is_active(&self, proxy_port: u16) -> bool {
        self.registry.is_active(proxy_port)
    }

    fn get_metadata(&self, _kind: MetadataKind) -> impl Future<Output = Result<HostsMetadata>> {
        let hosts = self.discovery.hosts();
        async move {
            Ok(HostsMetadata {
                hosts: hosts.await?,
            })
        }
    }

    async fn get_sub_metadata(&self, host_id: &str) -> Result<TargetsMetadata> {
        Ok(TargetsMetadata {
            targets: self.targets(host_id).await?,
        })
    }

    async fn activate(&self, proxy_port: u16, options: &Value) -> Result<()> {
        let action = ActivationAction::from_value(options).map_err(InterceptorError::from)?;
        info!(proxy_port, host_id = action.host_id(), "activating");
        self.activate_action(proxy_port, action).await
    }

    async fn deactivate(&self, proxy_port: u16) -> Result<()> {
        let interceptions = self.registry.take_port(proxy_port);
        info!(proxy_port, count = interceptions.len(), "deactivating");
        self.stop_interceptions(interceptions).await;
        Ok(())
    }

    async fn deactivate_all(&self) -> Result<()> {
        let interceptions = self
            .registry
            .take_all()
            .into_iter()
            .map(|(_, interception)| interception)
            .collect();
        self.stop_interceptions(interceptions).await;

        for host_id in self.registry.take_launched() {
            let device = self.bridge.device(&host_id);
            if let Err(e) = cleanup::stop_server(&device, &host_id).await {
                warn!(host_id = %host_id, error = %format!("{e:#}"), "failed to stop Frida server");
            }
        }
        Ok(())
    }
}

fn read_ca_certificate(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("cannot read CA certificate {}", path.display()))?;
    String::from_utf8(bytes)
        .ok()
        .filter(|pem| pem.contains("-----BEGIN CERTIFICATE-----"))
        .with_context(|| format!("{} is not a PEM certificate", path.display()))
}
