//! Descriptor table.
//!
//! The table is effectively the wire format of one device model. Attribute
//! IDs are vendor-private and shift between firmware revisions, so tables
//! carry a revision string and can be loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::capability::{CapabilityPatch, CapabilityState, CapabilityValue};
use crate::codec::{
    encode_intent, time_window, AttributeWord, CodecFamily, CodecKind, CodecResult,
    EncodeContext, Encoded, PartialWindow, WriteIntent,
};
use crate::config::zigbee;
use crate::protocol::descriptor::CapabilityDescriptor;
use crate::protocol::wire::{AttributeAddress, WireValue};

fn default_manufacturer_code() -> u16 {
    zigbee::LUMI_MANUFACTURER_CODE
}

/// Errors raised while loading or validating a descriptor table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("Duplicate capability name: {0}")]
    DuplicateName(String),

    #[error("Incompatible views on attribute {0}")]
    IncompatibleViews(String),

    #[error("Wire type does not suit codec of {0}")]
    WireTypeMismatch(String),

    #[error("Invalid codec for {name}: {reason}")]
    InvalidCodec { name: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// All capability descriptors of one device model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorTable {
    /// Zigbee model identifier
    pub model: String,
    /// Firmware revision the attribute layout was taken from
    pub revision: String,
    #[serde(default = "default_manufacturer_code")]
    pub manufacturer_code: u16,
    pub descriptors: Vec<CapabilityDescriptor>,
}

impl DescriptorTable {
    /// Build and validate a table.
    pub fn new(
        model: impl Into<String>,
        revision: impl Into<String>,
        descriptors: Vec<CapabilityDescriptor>,
    ) -> Result<Self, TableError> {
        let table = Self {
            model: model.into(),
            revision: revision.into(),
            manufacturer_code: default_manufacturer_code(),
            descriptors,
        };
        table.validate()?;
        Ok(table)
    }

    pub fn from_json_str(json: &str) -> Result<Self, TableError> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, TableError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Names must be unique, codec parameters must round-trip, only range
    /// codecs sit on buffer attributes, and views sharing an attribute must
    /// agree on wire type and codec family.
    pub fn validate(&self) -> Result<(), TableError> {
        for (i, descriptor) in self.descriptors.iter().enumerate() {
            if self.descriptors[..i].iter().any(|d| d.name == descriptor.name) {
                return Err(TableError::DuplicateName(descriptor.name.clone()));
            }
            descriptor
                .codec
                .check()
                .map_err(|reason| TableError::InvalidCodec {
                    name: descriptor.name.clone(),
                    reason,
                })?;
            let is_range = descriptor.codec.family() == CodecFamily::Range;
            if descriptor.wire_type.is_buffer() != is_range {
                return Err(TableError::WireTypeMismatch(descriptor.name.clone()));
            }
            let conflicting = self.views(descriptor.address()).any(|other| {
                other.wire_type != descriptor.wire_type
                    || other.codec.family() != descriptor.codec.family()
            });
            if conflicting {
                return Err(TableError::IncompatibleViews(descriptor.address().to_string()));
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Every descriptor viewing the given attribute.
    pub fn views(&self, address: AttributeAddress) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.descriptors
            .iter()
            .filter(move |d| d.address() == address)
    }

    /// Decode one wire attribute into a patch covering all of its views.
    ///
    /// Attributes without a descriptor yield an empty patch.
    pub fn decode_attribute(
        &self,
        address: AttributeAddress,
        wire: &WireValue,
    ) -> CodecResult<CapabilityPatch> {
        let Some(first) = self.views(address).next() else {
            return Ok(CapabilityPatch::new());
        };
        let word = first.codec.decode_word(first.wire_type, wire)?;
        self.render_views(address, &word)
    }

    /// Render a canonical word into every readable view of the attribute.
    ///
    /// Views render independently. A view that cannot show the word is
    /// logged and skipped; the call only fails when no view rendered.
    pub fn render_views(
        &self,
        address: AttributeAddress,
        word: &AttributeWord,
    ) -> CodecResult<CapabilityPatch> {
        let mut patch = CapabilityPatch::new();
        let mut failures = Vec::new();
        for view in self.views(address) {
            match view.codec.render(word) {
                Ok(Some(value)) => patch.insert(view.name.clone(), value),
                Ok(None) => {}
                Err(e) => failures.push((view.name.as_str(), e)),
            }
        }
        if patch.values.is_empty() {
            if let Some((_, e)) = failures.into_iter().next() {
                return Err(e);
            }
        } else {
            for (name, e) in failures {
                tracing::warn!("Skipping view {} of {}: {}", name, address, e);
            }
        }
        if let AttributeWord::Range(range) = word {
            if let Some(prefix) = range.prefix {
                patch.set_prefix(address, prefix);
            }
        }
        Ok(patch)
    }

    /// Collect the prior context for a write from a state snapshot.
    pub fn encode_context(
        &self,
        descriptor: &CapabilityDescriptor,
        state: &CapabilityState,
    ) -> EncodeContext {
        let address = descriptor.address();
        let mut window = PartialWindow::default();
        for view in self.views(address) {
            if let CodecKind::TimeWindow { field } = view.codec {
                if let Some(time) = state.get(&view.name).and_then(time_window::from_capability) {
                    window = window.with(field, time);
                }
            }
        }
        EncodeContext {
            prefix: state.prefix(address),
            window,
        }
    }

    /// Encode a validated intent. The patch updates every view of the
    /// attribute, so sibling views never disagree after a write.
    pub fn encode(
        &self,
        descriptor: &CapabilityDescriptor,
        intent: &WriteIntent,
        context: &EncodeContext,
    ) -> CodecResult<Encoded> {
        let (wire, word) = encode_intent(intent, context);
        let patch = self.render_views(descriptor.address(), &word)?;
        Ok(Encoded { wire, word, patch })
    }

    /// Validate and encode a value against a state snapshot, without I/O.
    ///
    /// Missing prior context falls back to the documented defaults.
    pub fn encode_value(
        &self,
        descriptor: &CapabilityDescriptor,
        value: &CapabilityValue,
        state: &CapabilityState,
    ) -> CodecResult<Encoded> {
        let intent = descriptor.parse_intent(value)?;
        let context = self.encode_context(descriptor, state);
        self.encode(descriptor, &intent, &context)
    }
}
