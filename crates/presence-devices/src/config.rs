//! Shared constants and configuration lookups.
//!
//! Defaults live here as named constants; they are passed explicitly into the
//! codecs rather than read as ambient globals.

use std::path::{Path, PathBuf};

use crate::builtin_types::fp300_descriptor_table;
use crate::protocol::table::{DescriptorTable, TableError};

/// Zigbee identifiers used by the FP300.
pub mod zigbee {
    /// Model identifier reported by the device
    pub const FP300_MODEL: &str = "lumi.sensor_occupy.agl8";
    /// Vendor manufacturer code carried on every request
    pub const LUMI_MANUFACTURER_CODE: u16 = 0x115F;
    /// manuSpecificLumi cluster
    pub const LUMI_CLUSTER: u16 = 0xFCC0;

    pub const POWER_CONFIG_CLUSTER: u16 = 0x0001;
    pub const IDENTIFY_CLUSTER: u16 = 0x0003;
    pub const ILLUMINANCE_CLUSTER: u16 = 0x0400;
    pub const TEMPERATURE_CLUSTER: u16 = 0x0402;
    pub const HUMIDITY_CLUSTER: u16 = 0x0405;
}

/// Environment variable names.
pub mod env_vars {
    /// Path to a JSON descriptor table overriding the built-in one
    pub const DESCRIPTOR_TABLE: &str = "PRESENCE_DESCRIPTOR_TABLE";
    /// Emit JSON logs when set to `true`
    pub const LOG_JSON: &str = "PRESENCE_LOG_JSON";
    /// Log filter used when `RUST_LOG` is unset
    pub const LOG_FILTER: &str = "PRESENCE_LOG";
}

/// Default values.
pub mod defaults {
    /// Log filter used when neither `RUST_LOG` nor `PRESENCE_LOG` is set
    pub const LOG_FILTER: &str = "presence=info";
}

/// Descriptor table path from the environment, if any.
pub fn descriptor_table_path() -> Option<PathBuf> {
    std::env::var_os(env_vars::DESCRIPTOR_TABLE)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Whether JSON logging was requested.
pub fn log_json() -> bool {
    std::env::var(env_vars::LOG_JSON)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false)
}

/// Log filter from the environment, or the default.
pub fn log_filter() -> String {
    std::env::var(env_vars::LOG_FILTER).unwrap_or_else(|_| defaults::LOG_FILTER.to_string())
}

/// Load the descriptor table.
///
/// An explicit path wins, then `PRESENCE_DESCRIPTOR_TABLE`, then the
/// built-in FP300 table.
pub fn load_descriptor_table(path: Option<&Path>) -> Result<DescriptorTable, TableError> {
    match path.map(Path::to_path_buf).or_else(descriptor_table_path) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading descriptor table");
            DescriptorTable::from_file(path)
        }
        None => Ok(fp300_descriptor_table()),
    }
}
