//! Presence Sensor Capability Crate
//!
//! Translates between user-facing capabilities of the Aqara FP300 presence
//! sensor and the numbered vendor attributes it exposes over Zigbee.
//!
//! ## Architecture
//!
//! - **Codecs**: pure conversions between wire values and capability values
//! - **DescriptorTable**: which attribute and codec back each capability
//! - **CapabilityBridge**: decodes reports and performs writes through an
//!   [`AttributeTransport`]
//!
//! The host owns the capability state. The bridge receives a snapshot and
//! returns a [`CapabilityPatch`] to merge.

pub mod builtin_types;
pub mod capability;
pub mod codec;
pub mod config;
pub mod protocol;
pub mod service;
pub mod transport;

// Re-exports for convenience
pub use builtin_types::{builtin_descriptor_tables, fp300_descriptor_table};
pub use capability::{CapabilityPatch, CapabilityState, CapabilityValue};
pub use codec::{CodecError, CodecKind, CodecResult};
pub use protocol::{
    Access, AttributeAddress, AttributeId, CapabilityDescriptor, ClusterId, DescriptorTable,
    TableError, WireType, WireValue,
};
pub use service::{AttributeReport, BridgeError, BridgeResult, CapabilityBridge};
pub use transport::{
    AttributeRequest, AttributeTransport, DeviceSnapshot, MemoryTransport, TransportError,
    TransportResult,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build information
pub const BUILD_PROFILE: &str = if cfg!(debug_assertions) {
    "debug"
} else {
    "release"
};
