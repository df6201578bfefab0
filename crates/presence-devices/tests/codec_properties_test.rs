//! Property tests over the built-in FP300 table.
//!
//! Values written through one view must read back identically through the
//! device decode path, and sibling views must agree.

use presence_devices::codec::range;
use presence_devices::config::zigbee;
use presence_devices::{
    fp300_descriptor_table, AttributeAddress, CapabilityState, CapabilityValue, DescriptorTable,
};
use proptest::prelude::*;

fn encode_then_decode(
    table: &DescriptorTable,
    name: &str,
    value: CapabilityValue,
    state: &CapabilityState,
) -> presence_devices::CapabilityPatch {
    let descriptor = table.get(name).unwrap();
    let encoded = table.encode_value(descriptor, &value, state).unwrap();
    table
        .decode_attribute(descriptor.address(), &encoded.wire)
        .unwrap()
}

proptest! {
    #[test]
    fn schedule_halves_survive_the_device(
        start_h in 0u32..24, start_m in 0u32..60, end_h in 0u32..24, end_m in 0u32..60
    ) {
        let table = fp300_descriptor_table();
        let start = format!("{:02}:{:02}", start_h, start_m);
        let end = format!("{:02}:{:02}", end_h, end_m);
        let state = CapabilityState::new().with_value("schedule_start_time", start.as_str());

        let patch = encode_then_decode(&table, "schedule_end_time", end.as_str().into(), &state);

        prop_assert_eq!(patch.get("schedule_start_time"), Some(&CapabilityValue::from(start)));
        prop_assert_eq!(patch.get("schedule_end_time"), Some(&CapabilityValue::from(end)));
    }

    #[test]
    fn range_views_agree(payload in 0u32..=0xFF_FFFF, prefix in any::<u16>()) {
        let table = fp300_descriptor_table();
        let address = AttributeAddress::new(zigbee::LUMI_CLUSTER, 0x019A);
        let state = CapabilityState::new().with_prefix(address, prefix);

        let patch = encode_then_decode(
            &table,
            "detection_range",
            CapabilityValue::Integer(i64::from(payload)),
            &state,
        );

        prop_assert_eq!(patch.get("detection_range"), Some(&CapabilityValue::Integer(i64::from(payload))));
        prop_assert_eq!(
            patch.get("detection_range_buckets"),
            Some(&CapabilityValue::Buckets(range::buckets(payload)))
        );
        prop_assert_eq!(patch.wire_prefixes.get(&address), Some(&prefix));
    }

    #[test]
    fn motion_sensitivity_labels_roundtrip(index in 0usize..3) {
        let table = fp300_descriptor_table();
        let label = ["low", "medium", "high"][index];

        let patch = encode_then_decode(&table, "motion_sensitivity", label.into(), &CapabilityState::new());

        prop_assert_eq!(patch.get("motion_sensitivity"), Some(&CapabilityValue::from(label)));
    }

    #[test]
    fn absence_delay_accepts_the_whole_range(seconds in 10i64..=300) {
        let table = fp300_descriptor_table();

        let patch = encode_then_decode(
            &table,
            "absence_delay_timer",
            CapabilityValue::Integer(seconds),
            &CapabilityState::new(),
        );

        prop_assert_eq!(patch.get("absence_delay_timer"), Some(&CapabilityValue::Quantity(seconds as f64)));
    }
}

#[test]
fn every_readable_capability_decodes_from_its_own_encoding() {
    let table = fp300_descriptor_table();
    let samples: Vec<(&str, CapabilityValue)> = vec![
        ("presence_detection_options", "mmwave".into()),
        ("pir_detection_interval", CapabilityValue::Quantity(2.0)),
        ("ai_interference_source_selfidentification", true.into()),
        ("temp_and_humidity_sampling_period", CapabilityValue::Quantity(0.5)),
        ("humidity_reporting_threshold", CapabilityValue::Quantity(10.0)),
        ("light_reporting_mode", "no_reporting".into()),
        ("led_disabled_night", false.into()),
        ("power_outage_count", CapabilityValue::Quantity(12.0)),
    ];

    for (name, value) in samples {
        let patch = encode_then_decode(&table, name, value.clone(), &CapabilityState::new());
        assert_eq!(patch.get(name), Some(&value), "{}", name);
    }
}

#[test]
fn measurement_clusters_are_distinct_addresses() {
    let table = fp300_descriptor_table();
    for (name, cluster) in [
        ("temperature", zigbee::TEMPERATURE_CLUSTER),
        ("humidity", zigbee::HUMIDITY_CLUSTER),
        ("illuminance", zigbee::ILLUMINANCE_CLUSTER),
    ] {
        let address = AttributeAddress::new(cluster, 0x0000);
        let views: Vec<_> = table.views(address).map(|d| d.name.as_str()).collect();
        assert_eq!(views, vec![name]);
    }
}
