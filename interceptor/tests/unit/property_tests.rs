//! Property-based tests for state resolution and activation parsing.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used)]

use frida_interceptor::FridaInterceptor;
use frida_interceptor::domain::device::{FRIDA_ALTERNATE_PORT, FRIDA_DEFAULT_PORT};
use frida_interceptor::domain::{InterceptorConfig, InterceptorError};
use interceptor_common::{HostState, Interceptor, KNOWN_ACTIONS};
use proptest::prelude::*;
use serde_json::json;

use crate::mocks::{SimBridge, SimConnector, SimDevice, SimProvider};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(future)
}

fn interceptor(device: SimDevice) -> FridaInterceptor<SimBridge, SimConnector, SimProvider> {
    FridaInterceptor::new(
        SimBridge::new().with_device("dev", device),
        SimConnector::default(),
        SimProvider::new(),
        InterceptorConfig::default(),
    )
}

proptest! {
    /// A listening server wins over an installed binary, which wins over root.
    #[test]
    fn prop_state_follows_precedence(
        default_open in any::<bool>(),
        alternate_open in any::<bool>(),
        installed in any::<bool>(),
        rooted in any::<bool>(),
    ) {
        let mut device = SimDevice::new();
        if default_open {
            device = device.listening_on(FRIDA_DEFAULT_PORT);
        }
        if alternate_open {
            device = device.listening_on(FRIDA_ALTERNATE_PORT);
        }
        if installed {
            device = device.with_server_installed();
        }
        if rooted {
            device = device.rooted();
        }

        let expected = if default_open || alternate_open {
            HostState::Available
        } else if installed {
            HostState::LaunchRequired
        } else if rooted {
            HostState::SetupRequired
        } else {
            HostState::Unavailable
        };

        let hosts = block_on(interceptor(device).list_hosts()).expect("hosts");
        prop_assert_eq!(hosts.len(), 1);
        prop_assert_eq!(hosts[0].state, expected);
    }

    /// Any tag outside the known set is rejected as unknown, whatever else
    /// the options contain.
    #[test]
    fn prop_unknown_actions_rejected(tag in "[a-zA-Z_-]{1,16}", host in "[a-z0-9-]{0,12}") {
        prop_assume!(!KNOWN_ACTIONS.contains(&tag.as_str()));
        let device = SimDevice::new().rooted();
        let interceptor = interceptor(device.clone());

        let err = block_on(interceptor.activate(8000, &json!({ "action": tag, "hostId": host })))
            .expect_err("unknown action");

        prop_assert!(
            matches!(
                err.downcast_ref::<InterceptorError>(),
                Some(InterceptorError::UnknownAction(t)) if *t == tag
            ),
            "got: {err:#}"
        );
        prop_assert!(!device.touched());
    }
}
