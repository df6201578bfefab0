//! Wire-level attribute addressing and values.
//!
//! A wire value is what the transport hands us: either a fixed-width integer
//! or, for range-style attributes, a short byte buffer.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Numeric attribute identifier inside a cluster.
pub type AttributeId = u16;

/// Numeric cluster identifier.
pub type ClusterId = u16;

// Byte buffers travel as hex strings in JSON snapshots and reports.
mod wire_bytes_serde {
    use super::*;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}

/// Location of one attribute on the device endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeAddress {
    pub cluster: ClusterId,
    pub attribute: AttributeId,
}

impl AttributeAddress {
    pub fn new(cluster: ClusterId, attribute: AttributeId) -> Self {
        Self { cluster, attribute }
    }
}

impl fmt::Display for AttributeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}/0x{:04X}", self.cluster, self.attribute)
    }
}

/// Error parsing an attribute address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid attribute address: {0}")]
pub struct AddressParseError(String);

impl FromStr for AttributeAddress {
    type Err = AddressParseError;

    /// Parses the display form, `0xFCC0/0x019A`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AddressParseError(s.to_string());
        let hex = |part: &str| {
            let digits = part
                .strip_prefix("0x")
                .or_else(|| part.strip_prefix("0X"))
                .ok_or_else(invalid)?;
            u16::from_str_radix(digits, 16).map_err(|_| invalid())
        };
        let (cluster, attribute) = s.trim().split_once('/').ok_or_else(invalid)?;
        Ok(Self::new(hex(cluster)?, hex(attribute)?))
    }
}

/// Maps keyed by [`AttributeAddress`], written as JSON objects whose keys are
/// the address display form.
pub(crate) mod address_map_serde {
    use super::*;

    pub fn serialize<V, S>(map: &BTreeMap<AttributeAddress, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_map(map.iter().map(|(address, value)| (address.to_string(), value)))
    }

    pub fn deserialize<'de, V, D>(deserializer: D) -> Result<BTreeMap<AttributeAddress, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        BTreeMap::<String, V>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, value)| {
                key.parse::<AttributeAddress>()
                    .map(|address| (address, value))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

/// Primitive wire type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WireType {
    Boolean,
    Uint8,
    Uint16,
    Uint32,
    Int16,
    Enum8,
    Bitmap40,
    OctetStr,
}

impl WireType {
    /// Inclusive integer range representable by this type.
    ///
    /// Returns None for buffer types.
    pub fn integer_range(&self) -> Option<(i64, i64)> {
        match self {
            Self::Boolean => Some((0, 1)),
            Self::Uint8 | Self::Enum8 => Some((0, u8::MAX as i64)),
            Self::Uint16 => Some((0, u16::MAX as i64)),
            Self::Uint32 => Some((0, u32::MAX as i64)),
            Self::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            Self::Bitmap40 => Some((0, (1_i64 << 40) - 1)),
            Self::OctetStr => None,
        }
    }

    /// Check whether an integer fits this type's width.
    pub fn fits(&self, value: i64) -> bool {
        self.integer_range()
            .is_some_and(|(min, max)| value >= min && value <= max)
    }

    /// Whether values of this type are carried as byte buffers.
    pub fn is_buffer(&self) -> bool {
        matches!(self, Self::OctetStr)
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "BOOLEAN",
            Self::Uint8 => "UINT8",
            Self::Uint16 => "UINT16",
            Self::Uint32 => "UINT32",
            Self::Int16 => "INT16",
            Self::Enum8 => "ENUM8",
            Self::Bitmap40 => "BITMAP40",
            Self::OctetStr => "OCTET_STR",
        };
        f.pad(name)
    }
}

/// A value as read from or written to the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Integer(i64),
    /// Byte buffer, serialized as a hex string
    #[serde(with = "wire_bytes_serde")]
    Bytes(Vec<u8>),
}

impl WireValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            Self::Integer(_) => None,
        }
    }
}

impl From<i64> for WireValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<Vec<u8>> for WireValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{} (0x{:X})", v, v),
            Self::Bytes(b) => write!(f, "[{}]", hex::encode(b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_type_widths() {
        assert!(WireType::Uint8.fits(255));
        assert!(!WireType::Uint8.fits(256));
        assert!(!WireType::Uint16.fits(-1));
        assert!(WireType::Int16.fits(-2500));
        assert!(WireType::Uint32.fits(u32::MAX as i64));
        assert!(!WireType::Boolean.fits(2));
        assert!(!WireType::OctetStr.fits(0));
        assert!(WireType::OctetStr.is_buffer());
    }

    #[test]
    fn test_wire_value_json() {
        let bytes: WireValue = serde_json::from_str("\"0003ffff00\"").unwrap();
        assert_eq!(bytes, WireValue::Bytes(vec![0x00, 0x03, 0xFF, 0xFF, 0x00]));

        let int: WireValue = serde_json::from_str("300").unwrap();
        assert_eq!(int, WireValue::Integer(300));

        assert_eq!(serde_json::to_string(&bytes).unwrap(), "\"0003ffff00\"");
    }

    #[test]
    fn test_address_display() {
        let addr = AttributeAddress::new(0xFCC0, 0x019A);
        assert_eq!(addr.to_string(), "0xFCC0/0x019A");
        assert_eq!("0xFCC0/0x019A".parse::<AttributeAddress>().unwrap(), addr);
        assert_eq!("0xfcc0/0x19a".parse::<AttributeAddress>().unwrap(), addr);
    }

    #[test]
    fn test_address_parse_rejects_malformed() {
        assert!("0xFCC0".parse::<AttributeAddress>().is_err());
        assert!("FCC0/019A".parse::<AttributeAddress>().is_err());
        assert!("0xFCC0/0x1019A".parse::<AttributeAddress>().is_err());
        assert!("410".parse::<AttributeAddress>().is_err());
    }

    #[test]
    fn test_wire_type_serde_names() {
        let ty: WireType = serde_json::from_str("\"OCTET_STR\"").unwrap();
        assert_eq!(ty, WireType::OctetStr);
        assert_eq!(serde_json::to_string(&WireType::Uint32).unwrap(), "\"UINT32\"");
    }
}
