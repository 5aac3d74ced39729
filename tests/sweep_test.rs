//! Behavioural coverage for the sweep dataset model.

use std::collections::HashMap;

use labsweep::{DaqError, Sweep, TraceAttr};

fn traces(entries: &[(&str, &[f64])]) -> Vec<(String, Vec<f64>)> {
    entries
        .iter()
        .map(|(name, values)| (name.to_string(), values.to_vec()))
        .collect()
}

fn wl_power_traces() -> Vec<(String, Vec<f64>)> {
    traces(&[
        ("wl", &[1540.0, 1545.0, 1550.0, 1555.0, 1560.0]),
        ("p1", &[3.0, 1.0, 4.0, 1.0, 5.0]),
        ("p2", &[-1.0, -2.0, -3.0, -4.0, -5.0]),
    ])
}

fn power_attrs() -> HashMap<String, TraceAttr> {
    let mut attrs = HashMap::new();
    attrs.insert("wl".to_string(), TraceAttr::new("Wavelength", "nm"));
    attrs.insert("p1".to_string(), TraceAttr::new("Power", "W"));
    attrs.insert("p2".to_string(), TraceAttr::new("Return Loss", "dB"));
    attrs
}

#[test]
fn constructing_with_fewer_than_two_traces_fails() {
    assert!(matches!(
        Sweep::new(vec![], None),
        Err(DaqError::Shape(_))
    ));
    assert!(matches!(
        Sweep::new(traces(&[("wl", &[1.0, 2.0])]), None),
        Err(DaqError::Shape(_))
    ));
}

#[test]
fn length_mismatch_names_the_offending_trace() {
    let input = traces(&[
        ("wl", &[1540.0, 1545.0, 1550.0]),
        ("p1", &[0.1, 0.2, 0.3]),
        ("p2", &[0.1, 0.2]),
    ]);
    match Sweep::new(input, None) {
        Err(DaqError::LengthMismatch {
            trace,
            expected,
            actual,
        }) => {
            assert_eq!(trace, "p2");
            assert_eq!(expected, 3);
            assert_eq!(actual, 2);
        }
        other => panic!("expected length mismatch, got {other:?}"),
    }
}

#[test]
fn uniform_lengths_accepted_and_cached() {
    let sweep = Sweep::new(wl_power_traces(), None).unwrap();
    assert_eq!(sweep.len(), 5);
    for name in sweep.trace_names() {
        assert_eq!(sweep.get(name).unwrap().len(), sweep.len());
    }
}

#[test]
fn positional_aliases_resolve_in_order() {
    let sweep = Sweep::new(wl_power_traces(), None).unwrap();
    assert_eq!(sweep.resolve("x").unwrap(), "wl");
    assert_eq!(sweep.resolve("y").unwrap(), "p1");
    assert_eq!(sweep.resolve("y0").unwrap(), "p1");
    assert_eq!(sweep.resolve("y1").unwrap(), "p2");
    // canonical names resolve to themselves
    assert_eq!(sweep.resolve("p2").unwrap(), "p2");

    assert_eq!(sweep.x_col(), "wl");
    assert_eq!(sweep.y_cols(), ["p1".to_string(), "p2".to_string()]);
}

#[test]
fn attrs_keys_must_match_trace_keys() {
    // missing entry
    let mut missing = power_attrs();
    missing.remove("p2");
    assert!(matches!(
        Sweep::new(wl_power_traces(), Some(missing)),
        Err(DaqError::AttrsMismatch)
    ));

    // extra entry
    let mut extra = power_attrs();
    extra.insert("p3".to_string(), TraceAttr::new("Phantom", "?"));
    assert!(matches!(
        Sweep::new(wl_power_traces(), Some(extra)),
        Err(DaqError::AttrsMismatch)
    ));

    // exact match is fine
    assert!(Sweep::new(wl_power_traces(), Some(power_attrs())).is_ok());
}

#[test]
fn ranges_computed_at_construction() {
    let sweep = Sweep::new(wl_power_traces(), None).unwrap();
    assert_eq!(sweep.ranges()["p1"], (1.0, 5.0));
    assert_eq!(sweep.ranges()["p2"], (-5.0, -1.0));
    assert_eq!(sweep.range("y1").unwrap(), (-5.0, -1.0));
}

#[test]
fn rescale_multiplies_values_in_place() {
    let input = traces(&[("wl", &[1.0, 2.0, 3.0]), ("p1", &[1.0, 2.0, 3.0])]);
    let mut sweep = Sweep::new(input, None).unwrap();

    sweep.rescale("p1", 2.0, Some("mW"), None).unwrap();
    assert_eq!(sweep.get("p1").unwrap(), [2.0, 4.0, 6.0]);
    // the x trace is untouched
    assert_eq!(sweep.get("x").unwrap(), [1.0, 2.0, 3.0]);
}

#[test]
fn rescale_updates_metadata() {
    let mut sweep = Sweep::new(wl_power_traces(), Some(power_attrs())).unwrap();

    sweep.rescale("p1", 1000.0, Some("mW"), None).unwrap();
    assert_eq!(sweep.attrs()["p1"], TraceAttr::new("Power", "mW"));

    sweep
        .rescale("p1", 1.0, Some("mW"), Some("Optical Power"))
        .unwrap();
    assert_eq!(sweep.attrs()["p1"], TraceAttr::new("Optical Power", "mW"));
}

#[test]
fn rescale_on_annotated_sweep_requires_unit() {
    let mut sweep = Sweep::new(wl_power_traces(), Some(power_attrs())).unwrap();
    for coeff in [0.0, 1.0, -2.5, 1e6] {
        assert!(matches!(
            sweep.rescale("p1", coeff, None, None),
            Err(DaqError::MissingUnit)
        ));
    }
    // values untouched by the failed calls
    assert_eq!(sweep.get("p1").unwrap(), [3.0, 1.0, 4.0, 1.0, 5.0]);
}

#[test]
fn rescale_on_unannotated_sweep_is_purely_numeric() {
    let mut sweep = Sweep::new(wl_power_traces(), None).unwrap();
    sweep.rescale("y", 10.0, None, None).unwrap();
    assert_eq!(sweep.get("p1").unwrap(), [30.0, 10.0, 40.0, 10.0, 50.0]);
    assert!(sweep.attrs().is_empty());
}

#[test]
fn rescale_keeps_ranges_current() {
    let mut sweep = Sweep::new(wl_power_traces(), Some(power_attrs())).unwrap();
    sweep.rescale("p1", -1.0, Some("W"), None).unwrap();
    assert_eq!(sweep.ranges()["p1"], (-5.0, -1.0));
}

#[test]
fn unknown_names_fail_lookup() {
    let mut sweep = Sweep::new(wl_power_traces(), None).unwrap();

    for col in ["nonexistent", "y2", "X", ""] {
        assert!(matches!(
            sweep.resolve(col),
            Err(DaqError::TraceNotFound(_))
        ));
        assert!(matches!(sweep.get(col), Err(DaqError::TraceNotFound(_))));
    }
    assert!(matches!(
        sweep.rescale("nonexistent", 2.0, None, None),
        Err(DaqError::TraceNotFound(_))
    ));
}

#[test]
fn axis_labels_render_description_and_unit() {
    let sweep = Sweep::new(wl_power_traces(), Some(power_attrs())).unwrap();

    let labels = sweep.axis_labels(false).unwrap();
    assert_eq!(labels["wl"], "Wavelength (nm)");
    assert_eq!(labels["p1"], "Power (W)");
    assert_eq!(labels["p2"], "Return Loss (dB)");

    let generic = sweep.axis_labels(true).unwrap();
    assert_eq!(generic.len(), 3);
    assert_eq!(generic["x"], "Wavelength (nm)");
    assert_eq!(generic["y0"], "Power (W)");
    assert_eq!(generic["y1"], "Return Loss (dB)");
    // the synonymous plain "y" is not an output key
    assert!(!generic.contains_key("y"));
}

#[test]
fn axis_labels_require_attrs() {
    let sweep = Sweep::new(wl_power_traces(), None).unwrap();
    assert!(matches!(sweep.axis_labels(false), Err(DaqError::NoAttrs)));
    assert!(matches!(sweep.axis_labels(true), Err(DaqError::NoAttrs)));
}

#[test]
fn raw_columns_convert_or_fail_with_the_trace_name() {
    let ok = vec![
        ("wl".to_string(), vec!["1540.0", "1545.0"]),
        ("p1".to_string(), vec!["1.2e-3", " 2.4E-3 "]),
    ];
    let sweep = Sweep::from_raw(ok, None).unwrap();
    assert_eq!(sweep.get("p1").unwrap(), [1.2e-3, 2.4e-3]);

    let bad = vec![
        ("wl".to_string(), vec!["1540.0", "1545.0"]),
        ("p1".to_string(), vec!["1.2e-3", "not-a-number"]),
    ];
    match Sweep::from_raw(bad, None) {
        Err(DaqError::Numeric { trace, value, .. }) => {
            assert_eq!(trace, "p1");
            assert_eq!(value, "not-a-number");
        }
        other => panic!("expected numeric conversion error, got {other:?}"),
    }
}
