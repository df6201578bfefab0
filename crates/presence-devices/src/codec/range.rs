//! Detection range codec.
//!
//! The attribute is a 5-byte buffer: a 2-byte vendor prefix followed by a
//! 24-bit little-endian payload. Bit `i` of the payload enables the distance
//! bucket `[i * 0.25 m, (i + 1) * 0.25 m)`. Two views read the same payload:
//! a plain integer and an ordered vector of 24 booleans.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CodecError, CodecResult};
use crate::capability::CapabilityValue;
use crate::protocol::wire::WireValue;

/// Number of distance buckets in the payload.
pub const RANGE_BUCKETS: usize = 24;
/// Width of one bucket.
pub const BUCKET_WIDTH_CM: u32 = 25;
/// Largest valid payload.
pub const MAX_PAYLOAD: u32 = (1 << RANGE_BUCKETS) - 1;
/// Payload reported when the device sent no data.
pub const UNKNOWN_PAYLOAD: u32 = 0x00FF_FFFF;
/// Prefix written when no prior value was ever seen.
pub const DEFAULT_PREFIX: u16 = 0x0300;
/// Exact length of a non-empty range buffer.
pub const BUFFER_LEN: usize = 5;

/// Which view of the range a descriptor exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeView {
    Integer,
    Buckets,
}

/// Decoded range attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeWord {
    /// Vendor prefix, None when the buffer was empty
    pub prefix: Option<u16>,
    pub payload: u32,
}

impl RangeWord {
    pub fn new(prefix: Option<u16>, payload: u32) -> Self {
        Self {
            prefix,
            payload: payload & MAX_PAYLOAD,
        }
    }

    pub fn prefix_or_default(&self) -> u16 {
        self.prefix.unwrap_or(DEFAULT_PREFIX)
    }

    /// Prefix bytes are written back in the order they were read.
    pub fn to_bytes(&self) -> [u8; BUFFER_LEN] {
        let prefix = self.prefix_or_default().to_le_bytes();
        let payload = self.payload.to_le_bytes();
        [prefix[0], prefix[1], payload[0], payload[1], payload[2]]
    }
}

/// Decode the 5-byte range buffer. An empty buffer means "all unknown".
pub fn decode_buffer(wire: &WireValue) -> CodecResult<RangeWord> {
    let bytes = wire.as_bytes().ok_or_else(|| {
        CodecError::MalformedWireValue(format!("range attribute expects a buffer, got {}", wire))
    })?;
    match bytes.len() {
        0 => Ok(RangeWord::new(None, UNKNOWN_PAYLOAD)),
        BUFFER_LEN => {
            let prefix = u16::from_le_bytes([bytes[0], bytes[1]]);
            let payload = u32::from_le_bytes([bytes[2], bytes[3], bytes[4], 0]);
            Ok(RangeWord::new(Some(prefix), payload))
        }
        len => Err(CodecError::MalformedWireValue(format!(
            "range buffer must be {} bytes, got {}",
            BUFFER_LEN, len
        ))),
    }
}

/// Bucket flags, nearest bucket first.
pub fn buckets(payload: u32) -> Vec<bool> {
    (0..RANGE_BUCKETS).map(|i| (payload >> i) & 1 == 1).collect()
}

/// Field name of bucket `index`, e.g. `0.25m-0.50m`.
pub fn bucket_name(index: usize) -> String {
    let start = index as u32 * BUCKET_WIDTH_CM;
    let end = start + BUCKET_WIDTH_CM;
    format!(
        "{}.{:02}m-{}.{:02}m",
        start / 100,
        start % 100,
        end / 100,
        end % 100
    )
}

/// Missing trailing entries count as `false`.
pub fn payload_from_buckets(flags: &[bool]) -> CodecResult<u32> {
    if flags.len() > RANGE_BUCKETS {
        return Err(CodecError::OutOfRange(format!(
            "{} buckets given, at most {} exist",
            flags.len(),
            RANGE_BUCKETS
        )));
    }
    Ok(flags
        .iter()
        .enumerate()
        .filter(|(_, on)| **on)
        .fold(0, |acc, (i, _)| acc | (1 << i)))
}

/// Named fields not present in the map count as `false`.
pub fn payload_from_flags(flags: &BTreeMap<String, bool>) -> CodecResult<u32> {
    let mut payload = 0;
    for (name, on) in flags {
        let index = (0..RANGE_BUCKETS)
            .find(|i| bucket_name(*i) == *name)
            .ok_or_else(|| CodecError::InvalidLabel(format!("unknown range bucket '{}'", name)))?;
        if *on {
            payload |= 1 << index;
        }
    }
    Ok(payload)
}

pub fn render(view: RangeView, payload: u32) -> CapabilityValue {
    match view {
        RangeView::Integer => CapabilityValue::Integer(i64::from(payload)),
        RangeView::Buckets => CapabilityValue::Buckets(buckets(payload)),
    }
}

/// Validate user input for one view. Both views replace the whole payload.
pub fn parse(view: RangeView, value: &CapabilityValue) -> CodecResult<u32> {
    match (view, value) {
        (RangeView::Integer, value) => {
            let raw = value.as_i64().ok_or_else(|| {
                CodecError::TypeMismatch(format!("expected an integer, got {}", value.type_name()))
            })?;
            u32::try_from(raw)
                .ok()
                .filter(|v| *v <= MAX_PAYLOAD)
                .ok_or_else(|| {
                    CodecError::OutOfRange(format!("{} not in [0, {}]", raw, MAX_PAYLOAD))
                })
        }
        (RangeView::Buckets, CapabilityValue::Buckets(flags)) => payload_from_buckets(flags),
        (RangeView::Buckets, CapabilityValue::Flags(flags)) => payload_from_flags(flags),
        (RangeView::Buckets, other) => Err(CodecError::TypeMismatch(format!(
            "expected bucket flags, got {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_buffer_is_unknown() {
        let word = decode_buffer(&WireValue::Bytes(vec![])).unwrap();
        assert_eq!(word.prefix, None);
        assert_eq!(word.prefix_or_default(), 0x0300);
        assert_eq!(word.payload, 0xFFFFFF);
    }

    #[test]
    fn test_decode_buffer_layout() {
        // prefix 0x0300, payload 0x00000F (first metre)
        let word = decode_buffer(&WireValue::Bytes(vec![0x00, 0x03, 0x0F, 0x00, 0x00])).unwrap();
        assert_eq!(word.prefix, Some(0x0300));
        assert_eq!(word.payload, 0x0F);

        let word = decode_buffer(&WireValue::Bytes(vec![0x00, 0x03, 0x01, 0x02, 0x80])).unwrap();
        assert_eq!(word.payload, 0x80_0201);
    }

    #[test]
    fn test_malformed_buffers() {
        for len in [1, 4, 6] {
            let err = decode_buffer(&WireValue::Bytes(vec![0; len])).unwrap_err();
            assert!(matches!(err, CodecError::MalformedWireValue(_)));
        }
        assert!(decode_buffer(&WireValue::Integer(15)).is_err());
    }

    #[test]
    fn test_prefix_preserved_verbatim() {
        let mut bytes = 0xABCD_u16.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
        let read = decode_buffer(&WireValue::Bytes(bytes.clone())).unwrap();

        let written = RangeWord::new(read.prefix, 0x0000F0).to_bytes();
        assert_eq!(written[..2], bytes[..2]);
        assert_eq!(u16::from_le_bytes([written[0], written[1]]), 0xABCD);
        assert_eq!(written[2..], [0xF0, 0x00, 0x00]);
    }

    #[test]
    fn test_default_prefix_without_prior() {
        assert_eq!(RangeWord::new(None, 1).to_bytes(), [0x00, 0x03, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_bucket_names() {
        assert_eq!(bucket_name(0), "0.00m-0.25m");
        assert_eq!(bucket_name(3), "0.75m-1.00m");
        assert_eq!(bucket_name(23), "5.75m-6.00m");
    }

    #[test]
    fn test_buckets_low_bit_first() {
        let flags = buckets(0b101);
        assert_eq!(flags.len(), RANGE_BUCKETS);
        assert!(flags[0]);
        assert!(!flags[1]);
        assert!(flags[2]);
        assert!(flags[3..].iter().all(|f| !f));
    }

    #[test]
    fn test_bucket_input_is_full_replace() {
        // Only the first two buckets given; everything else is cleared.
        assert_eq!(payload_from_buckets(&[true, true]).unwrap(), 0b11);

        let mut flags = BTreeMap::new();
        flags.insert(bucket_name(1), true);
        flags.insert(bucket_name(2), false);
        assert_eq!(payload_from_flags(&flags).unwrap(), 0b10);
    }

    #[test]
    fn test_bucket_input_errors() {
        assert!(matches!(
            payload_from_buckets(&[false; 25]),
            Err(CodecError::OutOfRange(_))
        ));
        let mut flags = BTreeMap::new();
        flags.insert("9m".to_string(), true);
        assert!(matches!(payload_from_flags(&flags), Err(CodecError::InvalidLabel(_))));
    }

    #[test]
    fn test_integer_view_bounds() {
        assert_eq!(parse(RangeView::Integer, &CapabilityValue::Integer(0)).unwrap(), 0);
        assert_eq!(
            parse(RangeView::Integer, &CapabilityValue::Integer(0xFFFFFF)).unwrap(),
            0xFFFFFF
        );
        assert!(matches!(
            parse(RangeView::Integer, &CapabilityValue::Integer(0x1000000)),
            Err(CodecError::OutOfRange(_))
        ));
        assert!(matches!(
            parse(RangeView::Integer, &CapabilityValue::Integer(-1)),
            Err(CodecError::OutOfRange(_))
        ));
        assert!(matches!(
            parse(RangeView::Integer, &CapabilityValue::Text("all".into())),
            Err(CodecError::TypeMismatch(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_bucket_view_idempotent(payload in 0u32..=MAX_PAYLOAD) {
            let once = buckets(payload);
            let again = buckets(payload_from_buckets(&once).unwrap());
            prop_assert_eq!(once, again);
        }
    }
}
