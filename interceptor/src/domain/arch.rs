//! Mapping from Android ABIs to Frida server architectures.
//!
//! Pure functions only: no I/O, no async.

use std::collections::HashMap;

use crate::domain::error::InterceptorError;

/// Device property listing every supported ABI, comma separated.
pub const ABI_LIST_PROPERTY: &str = "ro.product.cpu.abilist";

/// Device property holding the primary ABI on older devices.
pub const PRIMARY_ABI_PROPERTY: &str = "ro.product.cpu.abi";

/// Architectures Frida publishes Android server builds for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FridaArch {
    Arm,
    Arm64,
    X86,
    X86_64,
}

impl FridaArch {
    /// Architecture tag as used in server binary names.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
        }
    }

    /// Map a single Android ABI string.
    #[must_use]
    pub fn from_abi(abi: &str) -> Option<Self> {
        match abi.trim() {
            "arm64-v8a" => Some(Self::Arm64),
            "armeabi" | "armeabi-v7a" => Some(Self::Arm),
            "x86" => Some(Self::X86),
            "x86_64" => Some(Self::X86_64),
            _ => None,
        }
    }
}

impl std::fmt::Display for FridaArch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ABIs a device reports, in the device's order of preference.
///
/// Reads the ABI list property and falls back to the primary ABI when the
/// list is missing or blank.
#[must_use]
pub fn device_abis(properties: &HashMap<String, String>) -> Vec<String> {
    let from_list: Vec<String> = properties
        .get(ABI_LIST_PROPERTY)
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|abi| !abi.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    if !from_list.is_empty() {
        return from_list;
    }
    properties
        .get(PRIMARY_ABI_PROPERTY)
        .map(|abi| abi.trim())
        .filter(|abi| !abi.is_empty())
        .map(|abi| vec![abi.to_string()])
        .unwrap_or_default()
}

/// Pick the first recognised ABI.
///
/// # Errors
///
/// Returns [`InterceptorError::UnrecognizedArchitecture`] naming every
/// reported ABI when none of them map to a Frida architecture.
pub fn select_arch(abis: &[String]) -> Result<FridaArch, InterceptorError> {
    abis.iter()
        .find_map(|abi| FridaArch::from_abi(abi))
        .ok_or_else(|| InterceptorError::UnrecognizedArchitecture {
            abis: abis.to_vec(),
        })
}
