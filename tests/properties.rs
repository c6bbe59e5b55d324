//! Property tests for coercion, aggregation, and configuration normalization.

use powermix::calc::aggregate::{aggregate, round_to_precision};
use powermix::calc::coerce::{NumberLike, coerce};
use powermix::calc::units::{PowerUnit, normalize_unit, to_watts};
use powermix::config::DerivationConfig;
use proptest::prelude::*;

fn reading() -> impl Strategy<Value = NumberLike> {
    prop_oneof![
        Just(NumberLike::Absent),
        (-1.0e6..1.0e6f64).prop_map(NumberLike::from),
        (-100_000i64..100_000).prop_map(NumberLike::from),
        (-1.0e6..1.0e6f64).prop_map(|v| NumberLike::from(format!(" {v} "))),
        prop::sample::select(vec!["unknown", "Unavailable", "NONE", "nan", "n/a", ""])
            .prop_map(NumberLike::from),
        any::<bool>().prop_map(NumberLike::from),
    ]
}

proptest! {
    #[test]
    fn coerce_never_panics_on_arbitrary_text(text in ".*") {
        let _ = coerce(&NumberLike::from(text));
    }

    #[test]
    fn normalize_unit_is_total_over_arbitrary_labels(text in ".*") {
        let unit = normalize_unit(Some(text.as_str()));
        let label = text.trim().to_lowercase();
        let expected = match label.as_str() {
            "kw" | "kilowatt" | "kilowatts" => Some(PowerUnit::Kilowatt),
            "w" | "watt" | "watts" => Some(PowerUnit::Watt),
            _ => None,
        };
        prop_assert_eq!(unit, expected);
    }

    #[test]
    fn boolean_parts_count_as_one_or_zero(main in -1.0e6..1.0e6f64, flag in any::<bool>()) {
        let parts = [NumberLike::from(flag)];
        let expected = aggregate(&NumberLike::from(main), &[NumberLike::from(f64::from(u8::from(flag)))], true);
        prop_assert_eq!(aggregate(&NumberLike::from(main), &parts, true), expected);
    }

    #[test]
    fn clamped_remainder_is_never_negative(
        main in reading(),
        parts in prop::collection::vec(reading(), 0..8),
    ) {
        if let Some(value) = aggregate(&main, &parts, false) {
            prop_assert!(value >= 0.0);
        }
    }

    #[test]
    fn absent_main_always_gives_absent(parts in prop::collection::vec(reading(), 0..8)) {
        prop_assert_eq!(aggregate(&NumberLike::Absent, &parts, true), None);
        prop_assert_eq!(aggregate(&NumberLike::from("unavailable"), &parts, false), None);
    }

    #[test]
    fn signed_remainder_matches_difference(
        main in -1.0e6..1.0e6f64,
        parts in prop::collection::vec(-1.0e5..1.0e5f64, 0..8),
    ) {
        let inputs: Vec<NumberLike> = parts.iter().copied().map(NumberLike::from).collect();
        let expected = main - parts.iter().sum::<f64>();
        let value = aggregate(&NumberLike::from(main), &inputs, true);
        prop_assert!(value.is_some());
        let diff = (value.unwrap_or(f64::NAN) - expected).abs();
        prop_assert!(diff <= 0.0005 + 1e-6, "diff {} too large", diff);
    }

    #[test]
    fn rounding_is_idempotent(value in -1.0e9..1.0e9f64) {
        let once = round_to_precision(value);
        prop_assert_eq!(round_to_precision(once), once);
    }

    #[test]
    fn kilowatts_scale_by_one_thousand(value in -1.0e4..1.0e4f64) {
        let reading = to_watts(&NumberLike::from(value), Some(" KW "));
        prop_assert_eq!(reading.value, Some(value * 1000.0));
        prop_assert_eq!(reading.unit.as_deref(), Some("W"));
    }

    #[test]
    fn derivation_excludes_main_and_repeats(
        main in "sensor\\.[a-c]",
        consumers in prop::collection::vec("sensor\\.[a-e]", 0..10),
        producers in prop::collection::vec("sensor\\.[a-e]", 0..10),
    ) {
        let cfg = DerivationConfig::new(&main, &consumers, &producers, "");
        for list in [cfg.consumers(), cfg.producers()] {
            prop_assert!(list.iter().all(|id| id != &main));
            let mut sorted = list.to_vec();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), list.len());
        }
        prop_assert_eq!(cfg.allow_negative(), !cfg.producers().is_empty());
        prop_assert_eq!(cfg.prefix(), "Powermix");
    }
}
