//! Built-in Descriptor Tables
//!
//! The FP300 attribute layout, written in the same JSON shape that
//! [`DescriptorTable::from_file`] accepts so the built-in table can be
//! exported, edited for a new firmware revision and loaded back.

use crate::protocol::table::DescriptorTable;
use serde_json::json;

/// Firmware revision the built-in FP300 layout was taken from.
pub const FP300_REVISION: &str = "fp300-2025.1";

/// Get all built-in descriptor tables.
pub fn builtin_descriptor_tables() -> Vec<DescriptorTable> {
    vec![fp300_descriptor_table()]
}

/// Aqara FP300 presence sensor (`lumi.sensor_occupy.agl8`).
///
/// Vendor settings live on manuSpecificLumi (0xFCC0); environmental readings
/// come from the standard measurement clusters.
pub fn fp300_descriptor_table() -> DescriptorTable {
    let table: DescriptorTable = serde_json::from_value(json!({
        "model": "lumi.sensor_occupy.agl8",
        "revision": FP300_REVISION,
        "manufacturer_code": 0x115F,
        "descriptors": [
            // Presence
            {
                "name": "presence",
                "description": "Someone is present",
                "attribute_id": 0x0142,
                "wire_type": "UINT8",
                "access": "read",
                "codec": {"kind": "binary"}
            },
            {
                "name": "motion_sensitivity",
                "description": "Presence detection sensitivity",
                "attribute_id": 0x010C,
                "wire_type": "UINT8",
                "codec": {"kind": "enum_lookup", "options": [
                    {"label": "low", "value": 1},
                    {"label": "medium", "value": 2},
                    {"label": "high", "value": 3}
                ]}
            },
            {
                "name": "presence_detection_options",
                "description": "Sensors used for presence detection",
                "attribute_id": 0x0199,
                "wire_type": "UINT8",
                "codec": {"kind": "enum_lookup", "options": [
                    {"label": "both", "value": 0},
                    {"label": "mmwave", "value": 1},
                    {"label": "pir", "value": 2}
                ]}
            },
            {
                "name": "absence_delay_timer",
                "description": "Delay before reporting absence",
                "attribute_id": 0x0197,
                "wire_type": "UINT32",
                "codec": {"kind": "numeric", "bounds": {"min": 10.0, "max": 300.0, "step": 5.0}, "unit": "s"}
            },
            {
                "name": "pir_detection_interval",
                "description": "Minimum interval between PIR detections",
                "attribute_id": 0x014F,
                "wire_type": "UINT16",
                "codec": {"kind": "numeric", "bounds": {"min": 2.0, "max": 300.0, "step": 1.0}, "unit": "s"}
            },
            {
                "name": "ai_interference_source_selfidentification",
                "description": "AI interference source self-identification",
                "attribute_id": 0x015E,
                "wire_type": "UINT8",
                "codec": {"kind": "binary"}
            },
            {
                "name": "ai_sensitivity_adaptive",
                "description": "AI adaptive sensitivity",
                "attribute_id": 0x015D,
                "wire_type": "UINT8",
                "codec": {"kind": "binary"}
            },
            {
                "name": "target_distance",
                "description": "Distance to the detected target",
                "attribute_id": 0x015F,
                "wire_type": "UINT32",
                "access": "read",
                "codec": {"kind": "numeric", "scale": 100.0, "unit": "m"}
            },
            {
                "name": "power_outage_count",
                "description": "Number of power outages since pairing",
                "attribute_id": 0x0002,
                "wire_type": "UINT16",
                "access": "read",
                "codec": {"kind": "numeric"}
            },
            // Detection range: two views over one attribute
            {
                "name": "detection_range",
                "description": "Enabled distance buckets as a 24-bit mask",
                "attribute_id": 0x019A,
                "wire_type": "OCTET_STR",
                "codec": {"kind": "range", "view": "integer"}
            },
            {
                "name": "detection_range_buckets",
                "description": "Enabled distance buckets, 0.25 m each, nearest first",
                "attribute_id": 0x019A,
                "wire_type": "OCTET_STR",
                "codec": {"kind": "range", "view": "buckets"}
            },
            // Temperature and humidity sampling
            {
                "name": "temp_and_humidity_sampling",
                "attribute_id": 0x0170,
                "wire_type": "UINT8",
                "codec": {"kind": "enum_lookup", "options": [
                    {"label": "off", "value": 0},
                    {"label": "low", "value": 1},
                    {"label": "medium", "value": 2},
                    {"label": "high", "value": 3},
                    {"label": "custom", "value": 4}
                ]}
            },
            {
                "name": "temp_and_humidity_sampling_period",
                "attribute_id": 0x0162,
                "wire_type": "UINT32",
                "codec": {"kind": "numeric", "scale": 1000.0, "bounds": {"min": 0.5, "max": 3600.0, "step": 0.5}, "unit": "s"}
            },
            {
                "name": "temp_reporting_interval",
                "attribute_id": 0x0163,
                "wire_type": "UINT32",
                "codec": {"kind": "numeric", "scale": 1000.0, "bounds": {"min": 600.0, "max": 3600.0, "step": 600.0}, "unit": "s"}
            },
            {
                "name": "temp_reporting_threshold",
                "attribute_id": 0x0164,
                "wire_type": "UINT16",
                "codec": {"kind": "numeric", "scale": 100.0, "bounds": {"min": 0.2, "max": 3.0, "step": 0.1}, "unit": "°C"}
            },
            {
                "name": "temp_reporting_mode",
                "attribute_id": 0x0165,
                "wire_type": "UINT8",
                "codec": {"kind": "enum_lookup", "options": [
                    {"label": "threshold", "value": 1},
                    {"label": "reporting_interval", "value": 2},
                    {"label": "threshold_and_interval", "value": 3}
                ]}
            },
            {
                "name": "humidity_reporting_interval",
                "attribute_id": 0x016A,
                "wire_type": "UINT32",
                "codec": {"kind": "numeric", "scale": 1000.0, "bounds": {"min": 600.0, "max": 3600.0, "step": 600.0}, "unit": "s"}
            },
            {
                "name": "humidity_reporting_threshold",
                "attribute_id": 0x016B,
                "wire_type": "UINT16",
                "codec": {"kind": "numeric", "scale": 100.0, "bounds": {"min": 2.0, "max": 10.0, "step": 0.5}, "unit": "%"}
            },
            {
                "name": "humidity_reporting_mode",
                "attribute_id": 0x016C,
                "wire_type": "UINT8",
                "codec": {"kind": "enum_lookup", "options": [
                    {"label": "threshold", "value": 1},
                    {"label": "reporting_interval", "value": 2},
                    {"label": "threshold_and_interval", "value": 3}
                ]}
            },
            // Light sampling
            {
                "name": "light_sampling",
                "attribute_id": 0x0192,
                "wire_type": "UINT8",
                "codec": {"kind": "enum_lookup", "options": [
                    {"label": "off", "value": 0},
                    {"label": "low", "value": 1},
                    {"label": "medium", "value": 2},
                    {"label": "high", "value": 3},
                    {"label": "custom", "value": 4}
                ]}
            },
            {
                "name": "light_sampling_period",
                "attribute_id": 0x0193,
                "wire_type": "UINT32",
                "codec": {"kind": "numeric", "scale": 1000.0, "bounds": {"min": 0.5, "max": 3600.0, "step": 0.5}, "unit": "s"}
            },
            {
                "name": "light_reporting_interval",
                "attribute_id": 0x0194,
                "wire_type": "UINT32",
                "codec": {"kind": "numeric", "scale": 1000.0, "bounds": {"min": 20.0, "max": 3600.0, "step": 20.0}, "unit": "s"}
            },
            {
                "name": "light_reporting_threshold",
                "attribute_id": 0x0195,
                "wire_type": "UINT16",
                "codec": {"kind": "numeric", "scale": 100.0, "bounds": {"min": 3.0, "max": 20.0, "step": 0.5}, "unit": "%"}
            },
            {
                "name": "light_reporting_mode",
                "attribute_id": 0x0196,
                "wire_type": "UINT8",
                "codec": {"kind": "enum_lookup", "options": [
                    {"label": "no_reporting", "value": 0},
                    {"label": "threshold", "value": 1},
                    {"label": "reporting_interval", "value": 2},
                    {"label": "threshold_and_interval", "value": 3}
                ]}
            },
            // LED indicator and its night schedule
            {
                "name": "led_disabled_night",
                "description": "Turn the LED off during the schedule window",
                "attribute_id": 0x0203,
                "wire_type": "BOOLEAN",
                "codec": {"kind": "binary"}
            },
            {
                "name": "schedule_start_time",
                "description": "LED night schedule start (HH:MM)",
                "attribute_id": 0x023E,
                "wire_type": "UINT32",
                "codec": {"kind": "time_window", "field": "start"}
            },
            {
                "name": "schedule_end_time",
                "description": "LED night schedule end (HH:MM)",
                "attribute_id": 0x023E,
                "wire_type": "UINT32",
                "codec": {"kind": "time_window", "field": "end"}
            },
            // Actions
            {
                "name": "spatial_learning",
                "description": "Learn the empty room to filter static interference",
                "attribute_id": 0x0157,
                "wire_type": "UINT8",
                "access": "write",
                "codec": {"kind": "trigger", "value": 1}
            },
            {
                "name": "restart_device",
                "attribute_id": 0x00E8,
                "wire_type": "BOOLEAN",
                "access": "write",
                "codec": {"kind": "trigger", "value": 0}
            },
            {
                "name": "identify",
                "description": "Blink the LED for a few seconds",
                "cluster": 0x0003,
                "attribute_id": 0x0000,
                "wire_type": "UINT16",
                "access": "write",
                "codec": {"kind": "trigger", "value": 3}
            },
            // Standard measurement clusters
            {
                "name": "temperature",
                "cluster": 0x0402,
                "attribute_id": 0x0000,
                "wire_type": "INT16",
                "access": "read",
                "codec": {"kind": "numeric", "scale": 100.0, "unit": "°C"}
            },
            {
                "name": "humidity",
                "cluster": 0x0405,
                "attribute_id": 0x0000,
                "wire_type": "UINT16",
                "access": "read",
                "codec": {"kind": "numeric", "scale": 100.0, "unit": "%"}
            },
            {
                "name": "illuminance",
                "cluster": 0x0400,
                "attribute_id": 0x0000,
                "wire_type": "UINT16",
                "access": "read",
                "codec": {"kind": "numeric", "unit": "lx"}
            },
            {
                "name": "battery",
                "cluster": 0x0001,
                "attribute_id": 0x0021,
                "wire_type": "UINT8",
                "access": "read",
                "codec": {"kind": "numeric", "scale": 2.0, "unit": "%"}
            }
        ]
    }))
    .expect("Invalid FP300 descriptor table");

    if let Err(e) = table.validate() {
        panic!("Invalid FP300 descriptor table: {}", e);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecKind, RangeView, TimeField};
    use crate::config::zigbee;
    use crate::protocol::{Access, AttributeAddress};

    #[test]
    fn test_fp300_table_is_valid() {
        let table = fp300_descriptor_table();
        assert_eq!(table.model, zigbee::FP300_MODEL);
        assert_eq!(table.manufacturer_code, zigbee::LUMI_MANUFACTURER_CODE);
        assert!(table.validate().is_ok());
        assert_eq!(builtin_descriptor_tables().len(), 1);
    }

    #[test]
    fn test_range_views_share_attribute() {
        let table = fp300_descriptor_table();
        let views: Vec<_> = table
            .views(AttributeAddress::new(zigbee::LUMI_CLUSTER, 0x019A))
            .map(|d| d.codec.clone())
            .collect();
        assert_eq!(
            views,
            vec![
                CodecKind::Range { view: RangeView::Integer },
                CodecKind::Range { view: RangeView::Buckets }
            ]
        );
    }

    #[test]
    fn test_schedule_views_share_attribute() {
        let table = fp300_descriptor_table();
        let start = table.get("schedule_start_time").unwrap();
        let end = table.get("schedule_end_time").unwrap();
        assert_eq!(start.address(), end.address());
        assert_eq!(start.codec, CodecKind::TimeWindow { field: TimeField::Start });
    }

    #[test]
    fn test_measurements_are_read_only() {
        let table = fp300_descriptor_table();
        for name in [
            "temperature",
            "humidity",
            "illuminance",
            "battery",
            "presence",
            "power_outage_count",
        ] {
            assert_eq!(table.get(name).unwrap().access, Access::Read, "{}", name);
        }
        assert_eq!(
            table.get("temperature").unwrap().cluster,
            zigbee::TEMPERATURE_CLUSTER
        );
    }

    #[test]
    fn test_identify_is_a_write_only_action() {
        let table = fp300_descriptor_table();
        let identify = table.get("identify").unwrap();
        assert_eq!(identify.access, Access::Write);
        assert_eq!(
            identify.address(),
            AttributeAddress::new(zigbee::IDENTIFY_CLUSTER, 0x0000)
        );
        assert_eq!(identify.codec, CodecKind::Trigger { value: 3 });
    }
}
