//! Host discovery and its single-flight cache.
//!
//! Discovery asks the bridge for devices and resolves every device's state.
//! [`DiscoveryCache`] makes overlapping callers share one discovery instead
//! of each starting their own. It never keeps a result: once a discovery
//! settles, the next caller starts a fresh one.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::{FutureExt, LocalBoxFuture, Shared, join_all};
use interceptor_common::Host;
use tracing::debug;

use super::host::status::resolve_state;
use crate::application::ports::DeviceBridge;

/// List every bridge-visible device with its current state.
///
/// Devices are resolved concurrently. Hosts come back in bridge order.
///
/// # Errors
///
/// Returns an error if the bridge cannot list devices. Per-device probe
/// failures never surface; they only lower the resolved state.
pub async fn list_hosts(bridge: &impl DeviceBridge) -> Result<Vec<Host>> {
    let ids = bridge.list_devices().await.context("listing devices")?;
    let devices: Vec<_> = ids.iter().map(|id| bridge.device(id)).collect();
    let states = join_all(devices.iter().map(resolve_state)).await;

    let hosts: Vec<Host> = ids
        .into_iter()
        .zip(states)
        .map(|(id, state)| Host::android(id, state))
        .collect();
    debug!(count = hosts.len(), "hosts discovered");
    Ok(hosts)
}

// ── Single-flight cache ──────────────────────────────────────────────────────

/// Discovery failure shared by every caller of the same discovery.
#[derive(Debug, Clone)]
struct SharedError(Arc<anyhow::Error>);

impl fmt::Display for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for SharedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

type SharedDiscovery = Shared<LocalBoxFuture<'static, Result<Vec<Host>, SharedError>>>;

struct InFlight {
    generation: u64,
    discovery: SharedDiscovery,
}

/// Single-flight wrapper around [`list_hosts`].
pub struct DiscoveryCache<B> {
    bridge: Rc<B>,
    slot: Rc<RefCell<Option<InFlight>>>,
    next_generation: Cell<u64>,
}

impl<B: DeviceBridge + 'static> DiscoveryCache<B> {
    #[must_use]
    pub fn new(bridge: Rc<B>) -> Self {
        Self {
            bridge,
            slot: Rc::new(RefCell::new(None)),
            next_generation: Cell::new(0),
        }
    }

    /// Join the discovery in flight, or start one.
    ///
    /// The discovery is joined when this is called, not when the returned
    /// future is first polled.
    ///
    /// # Errors
    ///
    /// Every caller of a failed discovery receives its error.
    pub fn hosts(&self) -> impl Future<Output = Result<Vec<Host>>> {
        let discovery = self.join_or_start();
        async move { discovery.await.map_err(anyhow::Error::new) }
    }

    /// Whether a discovery is currently running.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.slot.borrow().is_some()
    }

    fn join_or_start(&self) -> SharedDiscovery {
        if let Some(in_flight) = self.slot.borrow().as_ref() {
            debug!(generation = in_flight.generation, "joining discovery in flight");
            return in_flight.discovery.clone();
        }

        let generation = self.next_generation.get();
        self.next_generation.set(generation.wrapping_add(1));

        let bridge = Rc::clone(&self.bridge);
        let slot = Rc::downgrade(&self.slot);
        let discovery = async move {
            let result = list_hosts(bridge.as_ref())
                .await
                .map_err(|e| SharedError(Arc::new(e)));
            // Only the discovery that filled the slot may empty it.
            if let Some(slot) = slot.upgrade() {
                let mut slot = slot.borrow_mut();
                if slot.as_ref().is_some_and(|f| f.generation == generation) {
                    *slot = None;
                }
            }
            result
        }
        .boxed_local()
        .shared();

        *self.slot.borrow_mut() = Some(InFlight {
            generation,
            discovery: discovery.clone(),
        });
        discovery
    }
}
