//! Attribute codecs.
//!
//! Every descriptor carries a [`CodecKind`], a closed set of codec variants
//! each holding its own typed payload. Decoding goes through one canonical
//! [`AttributeWord`] per wire attribute, which is then rendered into every
//! capability view sharing that attribute. Encoding is split in two phases:
//! [`CodecKind::parse_intent`] validates user input without any I/O, and
//! [`encode_intent`] folds in the prior context and produces the wire value.

pub mod lookup;
pub mod numeric;
pub mod range;
pub mod time_window;

use serde::{Deserialize, Serialize};

use crate::capability::{CapabilityPatch, CapabilityValue};
use crate::protocol::wire::{WireType, WireValue};

pub use lookup::{BinaryCodec, LookupOption, LookupTable};
pub use numeric::{Bounds, NumericCodec};
pub use range::{RangeView, RangeWord};
pub use time_window::{PartialWindow, TimeField, TimeWindow};

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while converting between wire and capability values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// Value outside the descriptor bounds or the wire type width
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// Wire value with no mapping
    #[error("Unknown wire value: {0}")]
    UnknownValue(String),

    /// Label or field name with no mapping
    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    /// Wire value of the wrong shape
    #[error("Malformed wire value: {0}")]
    MalformedWireValue(String),

    /// Clock string not matching H:MM / HH:MM
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    /// Capability value of the wrong kind for this codec
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
}

/// Codec families. Views sharing one attribute must share a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecFamily {
    Scalar,
    Range,
    Window,
}

/// Canonical decoded form of one wire attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeWord {
    Scalar(i64),
    Range(RangeWord),
    /// None when the device reported an out-of-range word
    Window(Option<TimeWindow>),
}

/// A validated write request, before prior state is folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteIntent {
    Scalar(i64),
    /// New 24-bit range payload; replaces the previous payload entirely
    Range(u32),
    Window(PartialWindow),
}

/// Prior device context an encode may need.
///
/// Both parts are optional so callers can express "no prior value" and
/// "prior value known" explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeContext {
    /// Last-known vendor prefix of a range attribute
    pub prefix: Option<u16>,
    /// Last-known halves of a time window
    pub window: PartialWindow,
}

impl EncodeContext {
    pub fn with_prefix(mut self, prefix: u16) -> Self {
        self.prefix = Some(prefix);
        self
    }

    pub fn with_window(mut self, window: PartialWindow) -> Self {
        self.window = window;
        self
    }

    /// Whether encoding this intent needs a fresh read of the attribute.
    pub fn needs_read(&self, intent: &WriteIntent) -> bool {
        match intent {
            WriteIntent::Scalar(_) => false,
            WriteIntent::Range(_) => self.prefix.is_none(),
            WriteIntent::Window(update) => TimeField::ALL
                .iter()
                .any(|field| update.get(*field).is_none() && self.window.get(*field).is_none()),
        }
    }

    /// Fill missing parts from a freshly decoded word. Known parts are kept.
    pub fn fill_from(&mut self, word: &AttributeWord) {
        match word {
            AttributeWord::Range(w) => {
                if self.prefix.is_none() {
                    self.prefix = w.prefix;
                }
            }
            AttributeWord::Window(Some(w)) => {
                self.window = self.window.or(PartialWindow::from(*w));
            }
            AttributeWord::Window(None) | AttributeWord::Scalar(_) => {}
        }
    }
}

/// Result of encoding one capability write.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    /// Value to send to the device
    pub wire: WireValue,
    /// Canonical word the wire value carries
    pub word: AttributeWord,
    /// State update covering every view of the attribute
    pub patch: CapabilityPatch,
}

/// Codec selection for one descriptor, with its typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodecKind {
    /// Linear scale between a raw integer and a physical quantity
    Numeric(NumericCodec),
    /// Integer to label lookup
    EnumLookup(LookupTable),
    /// Integer pair to boolean
    Binary(BinaryCodec),
    /// 24-bit distance range behind a vendor prefix
    Range { view: RangeView },
    /// One half of a packed start/end clock window
    TimeWindow { field: TimeField },
    /// Write-only action sending a fixed value
    Trigger { value: i64 },
}

impl CodecKind {
    pub fn family(&self) -> CodecFamily {
        match self {
            Self::Numeric(_) | Self::EnumLookup(_) | Self::Binary(_) | Self::Trigger { .. } => {
                CodecFamily::Scalar
            }
            Self::Range { .. } => CodecFamily::Range,
            Self::TimeWindow { .. } => CodecFamily::Window,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::EnumLookup(_) => "enum_lookup",
            Self::Binary(_) => "binary",
            Self::Range { .. } => "range",
            Self::TimeWindow { .. } => "time_window",
            Self::Trigger { .. } => "trigger",
        }
    }

    /// Reject codec parameters that cannot round-trip a value.
    pub fn check(&self) -> Result<(), String> {
        match self {
            Self::Numeric(codec) => codec.check(),
            Self::EnumLookup(table) => table.check(),
            Self::Binary(codec) => codec.check(),
            Self::Range { .. } | Self::TimeWindow { .. } | Self::Trigger { .. } => Ok(()),
        }
    }

    /// Decode a wire value into the canonical word for this codec family.
    pub fn decode_word(&self, wire_type: WireType, wire: &WireValue) -> CodecResult<AttributeWord> {
        match self.family() {
            CodecFamily::Scalar => scalar_from_wire(wire_type, wire).map(AttributeWord::Scalar),
            CodecFamily::Range => range::decode_buffer(wire).map(AttributeWord::Range),
            CodecFamily::Window => {
                let raw = scalar_from_wire(wire_type, wire)?;
                let word = u32::try_from(raw).map_err(|_| {
                    CodecError::MalformedWireValue(format!("{} is not a 32-bit word", raw))
                })?;
                Ok(AttributeWord::Window(TimeWindow::decode(word)))
            }
        }
    }

    /// Render the canonical word as this view's capability value.
    ///
    /// Returns None for write-only codecs.
    pub fn render(&self, word: &AttributeWord) -> CodecResult<Option<CapabilityValue>> {
        match (self, word) {
            (Self::Trigger { .. }, _) => Ok(None),
            (Self::Numeric(codec), AttributeWord::Scalar(raw)) => Ok(Some(codec.decode(*raw))),
            (Self::EnumLookup(table), AttributeWord::Scalar(raw)) => {
                let label = table.decode(*raw)?;
                Ok(Some(CapabilityValue::Text(label.to_string())))
            }
            (Self::Binary(codec), AttributeWord::Scalar(raw)) => {
                codec.decode(*raw).map(|v| Some(CapabilityValue::Boolean(v)))
            }
            (Self::Range { view }, AttributeWord::Range(w)) => Ok(Some(range::render(*view, w.payload))),
            (Self::TimeWindow { field }, AttributeWord::Window(w)) => {
                Ok(Some(time_window::render(*field, w.as_ref())))
            }
            (codec, word) => Err(CodecError::MalformedWireValue(format!(
                "{:?} cannot be rendered by the {} codec",
                word,
                codec.name()
            ))),
        }
    }

    /// Validate a user value and turn it into a write intent.
    ///
    /// Performs no I/O and reads no prior state.
    pub fn parse_intent(&self, value: &CapabilityValue) -> CodecResult<WriteIntent> {
        match self {
            Self::Numeric(codec) => {
                let quantity = value.as_f64().ok_or_else(|| mismatch("a number", value))?;
                codec.encode(quantity).map(WriteIntent::Scalar)
            }
            Self::EnumLookup(table) => {
                let label = value.as_str().ok_or_else(|| mismatch("a label", value))?;
                table.encode(label).map(WriteIntent::Scalar)
            }
            Self::Binary(codec) => {
                let flag = value.as_bool().ok_or_else(|| mismatch("a boolean", value))?;
                Ok(WriteIntent::Scalar(codec.encode(flag)))
            }
            Self::Range { view } => range::parse(*view, value).map(WriteIntent::Range),
            Self::TimeWindow { field } => {
                let text = value.as_str().ok_or_else(|| mismatch("an HH:MM string", value))?;
                let time = time_window::parse_clock(text)?;
                Ok(WriteIntent::Window(PartialWindow::default().with(*field, time)))
            }
            Self::Trigger { value: trigger } => match value {
                CapabilityValue::Boolean(true) => Ok(WriteIntent::Scalar(*trigger)),
                other => Err(mismatch("true", other)),
            },
        }
    }
}

/// Produce the wire value and canonical word for a validated intent.
///
/// A range write without a known prefix uses [`range::DEFAULT_PREFIX`]; a
/// window half with no prior value falls back to midnight.
pub fn encode_intent(
    intent: &WriteIntent,
    context: &EncodeContext,
) -> (WireValue, AttributeWord) {
    match intent {
        WriteIntent::Scalar(raw) => (WireValue::Integer(*raw), AttributeWord::Scalar(*raw)),
        WriteIntent::Range(payload) => {
            let prefix = context.prefix.unwrap_or(range::DEFAULT_PREFIX);
            let word = RangeWord::new(Some(prefix), *payload);
            (WireValue::Bytes(word.to_bytes().to_vec()), AttributeWord::Range(word))
        }
        WriteIntent::Window(update) => {
            let window = update.or(context.window).resolve();
            (
                WireValue::Integer(i64::from(window.encode())),
                AttributeWord::Window(Some(window)),
            )
        }
    }
}

/// Extract an integer wire value, checking it fits the declared type.
fn scalar_from_wire(wire_type: WireType, wire: &WireValue) -> CodecResult<i64> {
    let raw = wire.as_integer().ok_or_else(|| {
        CodecError::MalformedWireValue(format!("expected {} integer, got {}", wire_type, wire))
    })?;
    if !wire_type.fits(raw) {
        return Err(CodecError::MalformedWireValue(format!(
            "{} does not fit {}",
            raw, wire_type
        )));
    }
    Ok(raw)
}

fn mismatch(expected: &str, got: &CapabilityValue) -> CodecError {
    CodecError::TypeMismatch(format!("expected {}, got {}", expected, got.type_name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensitivity() -> CodecKind {
        CodecKind::EnumLookup(LookupTable::new([("low", 1), ("medium", 2), ("high", 3)]))
    }

    #[test]
    fn test_codec_kind_json_tagging() {
        let json = r#"{"kind":"numeric","scale":100.0,"bounds":{"min":0.2,"max":3.0,"step":0.1}}"#;
        let codec: CodecKind = serde_json::from_str(json).unwrap();
        assert!(matches!(codec, CodecKind::Numeric(ref c) if c.scale == 100.0));

        let codec: CodecKind =
            serde_json::from_str(r#"{"kind":"range","view":"buckets"}"#).unwrap();
        assert_eq!(codec, CodecKind::Range { view: RangeView::Buckets });

        let codec: CodecKind =
            serde_json::from_str(r#"{"kind":"time_window","field":"end"}"#).unwrap();
        assert_eq!(codec, CodecKind::TimeWindow { field: TimeField::End });
    }

    #[test]
    fn test_scalar_decode_checks_width() {
        let codec = sensitivity();
        let err = codec
            .decode_word(WireType::Uint8, &WireValue::Integer(300))
            .unwrap_err();
        assert!(matches!(err, CodecError::MalformedWireValue(_)));

        let err = codec
            .decode_word(WireType::Uint8, &WireValue::Bytes(vec![1]))
            .unwrap_err();
        assert!(matches!(err, CodecError::MalformedWireValue(_)));
    }

    #[test]
    fn test_enum_render_unknown_value() {
        let codec = sensitivity();
        let word = codec.decode_word(WireType::Uint8, &WireValue::Integer(9)).unwrap();
        assert!(matches!(codec.render(&word), Err(CodecError::UnknownValue(_))));
    }

    #[test]
    fn test_parse_intent_type_mismatch() {
        let err = sensitivity().parse_intent(&CapabilityValue::Integer(2)).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch(_)));
    }

    #[test]
    fn test_trigger_only_accepts_true() {
        let trigger = CodecKind::Trigger { value: 1 };
        assert_eq!(
            trigger.parse_intent(&CapabilityValue::Boolean(true)).unwrap(),
            WriteIntent::Scalar(1)
        );
        assert!(trigger.parse_intent(&CapabilityValue::Boolean(false)).is_err());
        assert_eq!(trigger.render(&AttributeWord::Scalar(1)).unwrap(), None);
    }

    #[test]
    fn test_needs_read() {
        let empty = EncodeContext::default();
        assert!(!empty.needs_read(&WriteIntent::Scalar(1)));
        assert!(empty.needs_read(&WriteIntent::Range(0)));
        assert!(!empty.with_prefix(0x0300).needs_read(&WriteIntent::Range(0)));

        let start_only = PartialWindow::default()
            .with(TimeField::Start, time_window::parse_clock("08:00").unwrap());
        assert!(empty.needs_read(&WriteIntent::Window(start_only)));

        let known_end = PartialWindow::default()
            .with(TimeField::End, time_window::parse_clock("18:00").unwrap());
        assert!(!empty
            .with_window(known_end)
            .needs_read(&WriteIntent::Window(start_only)));
    }

    #[test]
    fn test_fill_from_keeps_known_prefix() {
        let mut context = EncodeContext::default().with_prefix(0xABCD);
        context.fill_from(&AttributeWord::Range(RangeWord::new(Some(0x1111), 0)));
        assert_eq!(context.prefix, Some(0xABCD));

        let mut context = EncodeContext::default();
        context.fill_from(&AttributeWord::Range(RangeWord::new(Some(0x1111), 0)));
        assert_eq!(context.prefix, Some(0x1111));
    }
}
