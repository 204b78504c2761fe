//! Builds the script injected into intercepted Android apps.

const CONFIG_TEMPLATE: &str = include_str!("../../scripts/android/config.js");

/// Scripts run after the config block, in order.
const ANDROID_SCRIPTS: &[(&str, &str)] = &[
    (
        "proxy-override.js",
        include_str!("../../scripts/android/proxy-override.js"),
    ),
    (
        "certificate-trust.js",
        include_str!("../../scripts/android/certificate-trust.js"),
    ),
];

/// Assemble the Android interception script for one proxy.
///
/// Values are embedded as JSON literals, which are valid JavaScript
/// expressions, so certificate newlines and quotes need no extra escaping.
#[must_use]
pub fn build_android_script(ca_cert_pem: &str, proxy_host: &str, proxy_port: u16) -> String {
    let config = CONFIG_TEMPLATE
        .replace("{{CERT_PEM}}", &js_string(ca_cert_pem))
        .replace("{{PROXY_HOST}}", &js_string(proxy_host))
        .replace("{{PROXY_PORT}}", &proxy_port.to_string());

    let mut script = config;
    for (name, body) in ANDROID_SCRIPTS {
        script.push_str("\n// --- ");
        script.push_str(name);
        script.push_str(" ---\n");
        script.push_str(body);
    }
    script
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
