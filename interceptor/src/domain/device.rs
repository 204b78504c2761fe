//! Well-known device-side locations and ports.
//!
//! These values must match what previously provisioned devices already
//! contain, so they are constants rather than configuration.

/// Directory on the device holding the installed server binary.
pub const DEVICE_SERVER_DIR: &str = "/data/local/tmp/.httptoolkit";

/// File name of the installed server binary.
pub const SERVER_BINARY_NAME: &str = "adirf-server";

/// Port a stock Frida server listens on.
pub const FRIDA_DEFAULT_PORT: u16 = 27042;

/// Port our own server is launched on. Preferred everywhere, since nothing
/// else on the device is expected to listen there.
pub const FRIDA_ALTERNATE_PORT: u16 = 24072;

/// Session ports in order of preference.
pub const SESSION_PORTS: [u16; 2] = [FRIDA_ALTERNATE_PORT, FRIDA_DEFAULT_PORT];

/// Address the proxy is reachable on from inside the device, via the
/// reverse tunnel set up before interception.
pub const DEVICE_PROXY_HOST: &str = "127.0.0.1";

/// Mode the server binary is pushed with.
pub const SERVER_BINARY_MODE: u32 = 0o755;

/// Platform tag used to pick a server binary.
pub const SERVER_PLATFORM: &str = "android";

/// Echoed by a root command only once the command itself succeeded, since a
/// refused `su` still leaves the adb shell exiting cleanly.
pub const COMMAND_DONE_MARKER: &str = "frida-interceptor:done";

/// Absolute path of the server binary on the device.
#[must_use]
pub fn server_path() -> String {
    format!("{DEVICE_SERVER_DIR}/{SERVER_BINARY_NAME}")
}

/// Listen address passed to a launched server.
#[must_use]
pub fn server_listen_address() -> String {
    format!("127.0.0.1:{FRIDA_ALTERNATE_PORT}")
}

/// Whether any principal may execute a file with this mode.
#[must_use]
pub fn is_executable(mode: u32) -> bool {
    mode & 0o111 != 0
}

/// Wrap `command` so it runs through the root `prefix`.
///
/// `su -c` takes the whole command as one argument; other prefixes (`su 0`,
/// `su root`, or none when adb already runs as root) take it as separate
/// arguments.
#[must_use]
pub fn root_invocation(prefix: &[String], command: &[&str]) -> Vec<String> {
    let mut args = prefix.to_vec();
    if prefix.last().is_some_and(|last| last == "-c") {
        args.push(command.join(" "));
    } else {
        args.extend(command.iter().map(|arg| (*arg).to_string()));
    }
    args
}
