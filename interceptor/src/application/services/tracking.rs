//! Bookkeeping of what activation has started, so it can be stopped again.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

/// One app spawned with the interception script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveInterception {
    pub host_id: String,
    pub target_id: String,
    pub pid: u32,
}

/// Interceptions per proxy port, plus every host a server was launched on.
///
/// Records are taken out before anything is stopped, so a failed stop never
/// leaves a port reported as active.
#[derive(Debug, Default)]
pub struct InterceptionRegistry {
    active: RefCell<BTreeMap<u16, Vec<ActiveInterception>>>,
    launched: RefCell<BTreeSet<String>>,
}

impl InterceptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_interception(&self, proxy_port: u16, interception: ActiveInterception) {
        self.active
            .borrow_mut()
            .entry(proxy_port)
            .or_default()
            .push(interception);
    }

    #[must_use]
    pub fn is_active(&self, proxy_port: u16) -> bool {
        self.active
            .borrow()
            .get(&proxy_port)
            .is_some_and(|records| !records.is_empty())
    }

    /// Remove and return the interceptions of one port.
    pub fn take_port(&self, proxy_port: u16) -> Vec<ActiveInterception> {
        self.active
            .borrow_mut()
            .remove(&proxy_port)
            .unwrap_or_default()
    }

    /// Remove and return every interception, in port order.
    pub fn take_all(&self) -> Vec<(u16, ActiveInterception)> {
        std::mem::take(&mut *self.active.borrow_mut())
            .into_iter()
            .flat_map(|(port, records)| records.into_iter().map(move |r| (port, r)))
            .collect()
    }

    pub fn record_launch(&self, host_id: &str) {
        self.launched.borrow_mut().insert(host_id.to_string());
    }

    #[must_use]
    pub fn launched(&self) -> Vec<String> {
        self.launched.borrow().iter().cloned().collect()
    }

    /// Remove and return every host a server was launched on.
    pub fn take_launched(&self) -> Vec<String> {
        std::mem::take(&mut *self.launched.borrow_mut())
            .into_iter()
            .collect()
    }
}
