//! Protocol Mapping Layer
//!
//! Binds user-facing capabilities to numbered wire attributes. Descriptors
//! are static; the table is the single place that knows which attribute
//! backs which capability.
//!
//! ## Architecture
//!
//! ```text
//! Capability                         Wire attribute (cluster/attribute)
//! ├─ motion_sensitivity     ──────→  ├─ 0xFCC0/0x010C  UINT8   enum lookup
//! ├─ detection_range        ──┐
//! ├─ detection_range_buckets──┴───→  ├─ 0xFCC0/0x019A  OCTET_STR  prefix + 24-bit range
//! ├─ schedule_start_time    ──┐
//! └─ schedule_end_time      ──┴───→  └─ 0xFCC0/0x023E  UINT32  packed HH:MM window
//! ```

pub mod descriptor;
pub mod table;
pub mod wire;

// Re-exports
pub use descriptor::{Access, CapabilityDescriptor};
pub use table::{DescriptorTable, TableError};
pub use wire::{AttributeAddress, AttributeId, ClusterId, WireType, WireValue};
