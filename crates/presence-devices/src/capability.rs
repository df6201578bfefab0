//! User-facing capability values, state snapshots and patches.
//!
//! The capability state is owned by the host store. Codecs only ever read a
//! snapshot of it and hand back a [`CapabilityPatch`] for the host to merge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::protocol::wire::{address_map_serde, AttributeAddress};

/// A capability value as seen by end users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityValue {
    Boolean(bool),
    Integer(i64),
    /// Physical quantity, already scaled
    Quantity(f64),
    /// Enum label, clock time or display placeholder
    Text(String),
    /// Ordered bucket vector, nearest bucket first
    Buckets(Vec<bool>),
    /// Named boolean fields
    Flags(BTreeMap<String, bool>),
}

impl CapabilityValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Quantity(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Integer view of the value. Quantities only convert when they are whole.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Quantity(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Quantity(_) => "quantity",
            Self::Text(_) => "text",
            Self::Buckets(_) => "buckets",
            Self::Flags(_) => "flags",
        }
    }
}

impl std::fmt::Display for CapabilityValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Quantity(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
            Self::Buckets(v) => {
                let bits: String = v.iter().map(|on| if *on { '1' } else { '0' }).collect();
                write!(f, "[{}]", bits)
            }
            Self::Flags(v) => {
                let enabled: Vec<&str> = v
                    .iter()
                    .filter(|(_, on)| **on)
                    .map(|(name, _)| name.as_str())
                    .collect();
                write!(f, "{{{}}}", enabled.join(", "))
            }
        }
    }
}

impl From<bool> for CapabilityValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for CapabilityValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for CapabilityValue {
    fn from(v: f64) -> Self {
        Self::Quantity(v)
    }
}

impl From<&str> for CapabilityValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for CapabilityValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<bool>> for CapabilityValue {
    fn from(v: Vec<bool>) -> Self {
        Self::Buckets(v)
    }
}

/// Snapshot of every capability value known for one device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityState {
    #[serde(default)]
    pub values: BTreeMap<String, CapabilityValue>,
    /// Last vendor prefix seen per range attribute
    #[serde(default, with = "address_map_serde")]
    pub wire_prefixes: BTreeMap<AttributeAddress, u16>,
}

impl CapabilityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<CapabilityValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with_prefix(mut self, address: AttributeAddress, prefix: u16) -> Self {
        self.wire_prefixes.insert(address, prefix);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityValue> {
        self.values.get(name)
    }

    pub fn prefix(&self, address: AttributeAddress) -> Option<u16> {
        self.wire_prefixes.get(&address).copied()
    }

    /// Merge a patch into this state. Patch entries win.
    pub fn apply(&mut self, patch: CapabilityPatch) {
        self.values.extend(patch.values);
        self.wire_prefixes.extend(patch.wire_prefixes);
    }
}

/// Partial capability state produced by a decode or encode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityPatch {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, CapabilityValue>,
    #[serde(
        default,
        with = "address_map_serde",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub wire_prefixes: BTreeMap<AttributeAddress, u16>,
}

impl CapabilityPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: CapabilityValue) {
        self.values.insert(name.into(), value);
    }

    pub fn set_prefix(&mut self, address: AttributeAddress, prefix: u16) {
        self.wire_prefixes.insert(address, prefix);
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityValue> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.wire_prefixes.is_empty()
    }

    pub fn merge(&mut self, other: CapabilityPatch) {
        self.values.extend(other.values);
        self.wire_prefixes.extend(other.wire_prefixes);
    }
}
