//! Label lookup and boolean codecs for mode attributes.

use serde::{Deserialize, Serialize};

use super::{CodecError, CodecResult};

/// One label of an enum lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOption {
    pub label: String,
    pub value: i64,
}

/// Fixed `label -> integer` table. Decode is the reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LookupTable {
    pub options: Vec<LookupOption>,
}

impl LookupTable {
    pub fn new<'a>(options: impl IntoIterator<Item = (&'a str, i64)>) -> Self {
        Self {
            options: options
                .into_iter()
                .map(|(label, value)| LookupOption {
                    label: label.to_string(),
                    value,
                })
                .collect(),
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|o| o.label.as_str())
    }

    /// Labels and values must both be unique, or one direction is ambiguous.
    pub fn check(&self) -> Result<(), String> {
        for (i, option) in self.options.iter().enumerate() {
            for earlier in &self.options[..i] {
                if earlier.label == option.label {
                    return Err(format!("label '{}' listed twice", option.label));
                }
                if earlier.value == option.value {
                    return Err(format!(
                        "value {} shared by '{}' and '{}'",
                        option.value, earlier.label, option.label
                    ));
                }
            }
        }
        Ok(())
    }

    /// Unknown integers fail; there is no fallback label.
    pub fn decode(&self, raw: i64) -> CodecResult<&str> {
        self.options
            .iter()
            .find(|o| o.value == raw)
            .map(|o| o.label.as_str())
            .ok_or_else(|| CodecError::UnknownValue(raw.to_string()))
    }

    pub fn encode(&self, label: &str) -> CodecResult<i64> {
        self.options
            .iter()
            .find(|o| o.label == label)
            .map(|o| o.value)
            .ok_or_else(|| {
                let known: Vec<&str> = self.labels().collect();
                CodecError::InvalidLabel(format!("'{}' (expected one of {})", label, known.join(", ")))
            })
    }
}

fn default_on() -> i64 {
    1
}

/// Boolean carried as an on/off integer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryCodec {
    #[serde(default = "default_on")]
    pub on: i64,
    #[serde(default)]
    pub off: i64,
}

impl Default for BinaryCodec {
    fn default() -> Self {
        Self { on: 1, off: 0 }
    }
}

impl BinaryCodec {
    pub fn check(&self) -> Result<(), String> {
        if self.on == self.off {
            return Err(format!("on and off are both {}", self.on));
        }
        Ok(())
    }

    pub fn decode(&self, raw: i64) -> CodecResult<bool> {
        if raw == self.on {
            Ok(true)
        } else if raw == self.off {
            Ok(false)
        } else {
            Err(CodecError::UnknownValue(format!(
                "{} (expected {} or {})",
                raw, self.on, self.off
            )))
        }
    }

    pub fn encode(&self, value: bool) -> i64 {
        if value {
            self.on
        } else {
            self.off
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection_options() -> LookupTable {
        LookupTable::new([("both", 0), ("mmwave", 1), ("pir", 2)])
    }

    #[test]
    fn test_lookup_roundtrip_all_labels() {
        let table = detection_options();
        for label in table.labels() {
            let raw = table.encode(label).unwrap();
            assert_eq!(table.decode(raw).unwrap(), label);
        }
    }

    #[test]
    fn test_unknown_value_is_an_error() {
        assert_eq!(
            detection_options().decode(7),
            Err(CodecError::UnknownValue("7".into()))
        );
    }

    #[test]
    fn test_invalid_label() {
        let err = detection_options().encode("radar").unwrap_err();
        assert!(matches!(err, CodecError::InvalidLabel(ref msg) if msg.contains("mmwave")));
    }

    #[test]
    fn test_check_rejects_ambiguous_tables() {
        assert!(detection_options().check().is_ok());

        let err = LookupTable::new([("low", 1), ("low", 2)]).check().unwrap_err();
        assert!(err.contains("low"));
        let err = LookupTable::new([("low", 1), ("high", 1)]).check().unwrap_err();
        assert!(err.contains("value 1"));

        assert!(BinaryCodec { on: 1, off: 1 }.check().is_err());
    }

    #[test]
    fn test_binary_codec() {
        let codec = BinaryCodec::default();
        assert!(codec.decode(1).unwrap());
        assert!(!codec.decode(0).unwrap());
        assert!(codec.decode(2).is_err());
        assert_eq!(codec.encode(true), 1);

        let inverted: BinaryCodec = serde_json::from_str(r#"{"on":0,"off":1}"#).unwrap();
        assert_eq!(inverted.encode(true), 0);
    }
}
