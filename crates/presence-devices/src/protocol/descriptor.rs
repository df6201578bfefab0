//! Capability descriptors.
//!
//! A descriptor binds one user-facing capability to one wire attribute and
//! the codec that translates between them. Descriptors are built once from a
//! table and never mutated.

use serde::{Deserialize, Serialize};

use crate::capability::CapabilityValue;
use crate::codec::{CodecError, CodecKind, CodecResult, WriteIntent};
use crate::config::zigbee;
use crate::protocol::wire::{AttributeAddress, AttributeId, ClusterId, WireType};

fn default_cluster() -> ClusterId {
    zigbee::LUMI_CLUSTER
}

/// Which directions a capability supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// Reported by the device only
    Read,
    /// Action, never reported back
    Write,
    #[default]
    ReadWrite,
}

impl Access {
    pub fn readable(&self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    pub fn writable(&self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// Static metadata for one capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Unique capability name
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default = "default_cluster")]
    pub cluster: ClusterId,
    pub attribute_id: AttributeId,
    pub wire_type: WireType,
    #[serde(default)]
    pub access: Access,
    pub codec: CodecKind,
}

impl CapabilityDescriptor {
    /// Create a read-write descriptor on the vendor cluster.
    pub fn new(
        name: impl Into<String>,
        attribute_id: AttributeId,
        wire_type: WireType,
        codec: CodecKind,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            cluster: default_cluster(),
            attribute_id,
            wire_type,
            access: Access::default(),
            codec,
        }
    }

    pub fn with_cluster(mut self, cluster: ClusterId) -> Self {
        self.cluster = cluster;
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn address(&self) -> AttributeAddress {
        AttributeAddress::new(self.cluster, self.attribute_id)
    }

    /// Validate a user value for this capability, including the wire width.
    pub fn parse_intent(&self, value: &CapabilityValue) -> CodecResult<WriteIntent> {
        let intent = self.codec.parse_intent(value)?;
        if let WriteIntent::Scalar(raw) = intent {
            if !self.wire_type.fits(raw) {
                return Err(CodecError::OutOfRange(format!(
                    "{} encodes to {}, which does not fit {}",
                    self.name, raw, self.wire_type
                )));
            }
        }
        Ok(intent)
    }
}
