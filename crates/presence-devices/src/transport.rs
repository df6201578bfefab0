//! Attribute transport interface.
//!
//! The transport performs the actual attribute reads and writes against one
//! device endpoint. It is an external collaborator; this crate only defines
//! the contract and an in-memory implementation used by tests and the CLI
//! simulator. Retry and backoff belong to real transports, not to callers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::protocol::wire::{AttributeAddress, WireType, WireValue};

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Operation timeout
    #[error("Operation timeout after {0}ms")]
    Timeout(u64),

    /// Communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Attribute not supported by the device
    #[error("Unsupported attribute: {0}")]
    UnsupportedAttribute(AttributeAddress),

    /// Other error
    #[error("Transport error: {0}")]
    Other(#[from] anyhow::Error),
}

/// One attribute request, scoped to a single endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRequest {
    pub address: AttributeAddress,
    pub wire_type: WireType,
    /// Vendor identifier carried on every request
    pub manufacturer_code: u16,
}

/// Attribute read/write contract consumed by the bridge.
#[async_trait]
pub trait AttributeTransport: Send + Sync {
    async fn read_attribute(&self, request: &AttributeRequest) -> TransportResult<WireValue>;

    async fn write_attribute(
        &self,
        request: &AttributeRequest,
        value: &WireValue,
    ) -> TransportResult<()>;
}

#[async_trait]
impl<T: AttributeTransport + ?Sized> AttributeTransport for Arc<T> {
    async fn read_attribute(&self, request: &AttributeRequest) -> TransportResult<WireValue> {
        (**self).read_attribute(request).await
    }

    async fn write_attribute(
        &self,
        request: &AttributeRequest,
        value: &WireValue,
    ) -> TransportResult<()> {
        (**self).write_attribute(request, value).await
    }
}

/// Operation recorded by [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOp {
    Read(AttributeRequest),
    Write(AttributeRequest, WireValue),
}

/// One stored attribute in a device snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    #[serde(flatten)]
    pub address: AttributeAddress,
    pub value: WireValue,
}

/// Serializable attribute dump of a simulated device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    #[serde(default)]
    pub attributes: Vec<SnapshotEntry>,
}

/// In-memory device endpoint.
///
/// Reads of attributes that were never stored fail with
/// [`TransportError::UnsupportedAttribute`].
#[derive(Debug, Default)]
pub struct MemoryTransport {
    attributes: RwLock<HashMap<AttributeAddress, WireValue>>,
    operations: RwLock<Vec<TransportOp>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an attribute value.
    pub fn with_attribute(mut self, address: AttributeAddress, value: impl Into<WireValue>) -> Self {
        self.attributes.get_mut().insert(address, value.into());
        self
    }

    pub fn from_snapshot(snapshot: DeviceSnapshot) -> Self {
        snapshot
            .attributes
            .into_iter()
            .fold(Self::new(), |transport, entry| {
                transport.with_attribute(entry.address, entry.value)
            })
    }

    /// Current attributes, sorted by address.
    pub async fn snapshot(&self) -> DeviceSnapshot {
        let attributes = self.attributes.read().await;
        let mut entries: Vec<SnapshotEntry> = attributes
            .iter()
            .map(|(address, value)| SnapshotEntry {
                address: *address,
                value: value.clone(),
            })
            .collect();
        entries.sort_by_key(|e| e.address);
        DeviceSnapshot {
            attributes: entries,
        }
    }

    pub async fn value(&self, address: AttributeAddress) -> Option<WireValue> {
        self.attributes.read().await.get(&address).cloned()
    }

    pub async fn operations(&self) -> Vec<TransportOp> {
        self.operations.read().await.clone()
    }

    pub async fn write_count(&self) -> usize {
        self.operations
            .read()
            .await
            .iter()
            .filter(|op| matches!(op, TransportOp::Write(..)))
            .count()
    }

    pub async fn read_count(&self) -> usize {
        self.operations
            .read()
            .await
            .iter()
            .filter(|op| matches!(op, TransportOp::Read(_)))
            .count()
    }
}

#[async_trait]
impl AttributeTransport for MemoryTransport {
    async fn read_attribute(&self, request: &AttributeRequest) -> TransportResult<WireValue> {
        self.operations.write().await.push(TransportOp::Read(*request));
        self.attributes
            .read()
            .await
            .get(&request.address)
            .cloned()
            .ok_or(TransportError::UnsupportedAttribute(request.address))
    }

    async fn write_attribute(
        &self,
        request: &AttributeRequest,
        value: &WireValue,
    ) -> TransportResult<()> {
        self.operations
            .write()
            .await
            .push(TransportOp::Write(*request, value.clone()));
        self.attributes
            .write()
            .await
            .insert(request.address, value.clone());
        Ok(())
    }
}
