//! Capability Bridge - translation layer between the capability store and
//! the device transport
//!
//! The bridge provides:
//! - Inbound report decoding into capability patches (fail-soft per field)
//! - Capability writes with validation before any I/O
//! - At most one read-before-write when a range prefix or window half is unknown
//! - On-demand refresh of one capability

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capability::{CapabilityPatch, CapabilityState, CapabilityValue};
use crate::codec::CodecError;
use crate::protocol::descriptor::CapabilityDescriptor;
use crate::protocol::table::DescriptorTable;
use crate::protocol::wire::{AttributeAddress, AttributeId, ClusterId, WireValue};
use crate::transport::{AttributeRequest, AttributeTransport, TransportError};

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Error type for bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No descriptor with this name
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    /// Capability is reported by the device and cannot be written
    #[error("Capability is read-only: {0}")]
    ReadOnly(String),

    /// Capability is an action and cannot be read
    #[error("Capability is write-only: {0}")]
    WriteOnly(String),

    /// Input rejected or device value undecodable
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// One inbound attribute report from a single cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeReport {
    pub cluster: ClusterId,
    pub attributes: Vec<(AttributeId, WireValue)>,
}

impl AttributeReport {
    pub fn new(cluster: ClusterId) -> Self {
        Self {
            cluster,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeId, value: impl Into<WireValue>) -> Self {
        self.attributes.push((attribute, value.into()));
        self
    }
}

/// Capability bridge for one device endpoint.
pub struct CapabilityBridge<T: AttributeTransport> {
    table: Arc<DescriptorTable>,
    transport: T,
}

impl<T: AttributeTransport> CapabilityBridge<T> {
    pub fn new(table: Arc<DescriptorTable>, transport: T) -> Self {
        Self { table, transport }
    }

    pub fn table(&self) -> &DescriptorTable {
        &self.table
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Decode an inbound report.
    ///
    /// Fields that fail to decode are logged and left out of the patch; the
    /// remaining fields still update.
    pub fn handle_report(&self, report: &AttributeReport) -> CapabilityPatch {
        let mut patch = CapabilityPatch::new();
        for (attribute, wire) in &report.attributes {
            let address = AttributeAddress::new(report.cluster, *attribute);
            match self.table.decode_attribute(address, wire) {
                Ok(decoded) if decoded.is_empty() => {
                    tracing::trace!("Ignoring report for attribute {}", address);
                }
                Ok(decoded) => {
                    for (name, value) in &decoded.values {
                        tracing::debug!("Decoded {} = {} from {}", name, value, address);
                    }
                    patch.merge(decoded);
                }
                Err(e) => {
                    tracing::warn!("Dropping attribute {} ({}): {}", address, wire, e);
                }
            }
        }
        patch
    }

    /// Write one capability value.
    ///
    /// The value is validated before any I/O. When the encode needs prior
    /// device context the state does not hold, one read is issued first. A
    /// read that returns an undecodable value falls back to the defaults;
    /// a read that fails aborts the write. Exactly one wire write is issued
    /// on success and none on failure.
    pub async fn write_capability(
        &self,
        name: &str,
        value: &CapabilityValue,
        state: &CapabilityState,
    ) -> BridgeResult<CapabilityPatch> {
        let descriptor = self.descriptor(name)?;
        if !descriptor.access.writable() {
            return Err(BridgeError::ReadOnly(name.to_string()));
        }

        let intent = descriptor.parse_intent(value)?;
        let mut context = self.table.encode_context(descriptor, state);
        let request = self.request(descriptor);

        if context.needs_read(&intent) {
            tracing::debug!(
                "Reading {} before writing {} to fill missing context",
                descriptor.address(),
                name
            );
            let current = self.transport.read_attribute(&request).await?;
            match descriptor.codec.decode_word(descriptor.wire_type, &current) {
                Ok(word) => context.fill_from(&word),
                Err(e) => tracing::warn!(
                    "Ignoring undecodable value {} of {}: {}",
                    current,
                    descriptor.address(),
                    e
                ),
            }
        }

        let encoded = self.table.encode(descriptor, &intent, &context)?;
        tracing::info!(
            "Writing {} = {} to {} as {}",
            name,
            value,
            descriptor.address(),
            encoded.wire
        );
        self.transport.write_attribute(&request, &encoded.wire).await?;
        Ok(encoded.patch)
    }

    /// Read one capability from the device. The patch covers every view
    /// sharing the attribute.
    pub async fn refresh_capability(&self, name: &str) -> BridgeResult<CapabilityPatch> {
        let descriptor = self.descriptor(name)?;
        if !descriptor.access.readable() {
            return Err(BridgeError::WriteOnly(name.to_string()));
        }

        let wire = self
            .transport
            .read_attribute(&self.request(descriptor))
            .await?;
        let patch = self.table.decode_attribute(descriptor.address(), &wire)?;
        Ok(patch)
    }

    fn descriptor(&self, name: &str) -> BridgeResult<&CapabilityDescriptor> {
        self.table
            .get(name)
            .ok_or_else(|| BridgeError::UnknownCapability(name.to_string()))
    }

    fn request(&self, descriptor: &CapabilityDescriptor) -> AttributeRequest {
        AttributeRequest {
            address: descriptor.address(),
            wire_type: descriptor.wire_type,
            manufacturer_code: self.table.manufacturer_code,
        }
    }
}
