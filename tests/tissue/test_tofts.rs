//! Tofts model behaviour through the public API

use approx::assert_relative_eq;
use perfusion::prelude::*;
use serde_json::json;

use super::{assert_all_close, geometric_time_array, max, onset_offset, time_array};

fn ktrans() -> Rate {
    Rate::PerMinute(0.6)
}

#[test]
fn test_peak_below_aif_peak() {
    for t in [time_array(), geometric_time_array()] {
        let ca = parker(&t, 0.0, 0.0);
        let ct = tofts(&t, &ca, ktrans(), 0.2, &ModelOptions::default()).unwrap();
        assert_eq!(ct.len(), t.len());
        assert!(max(&ct).round() < max(&ca).round());
    }
}

#[test]
fn test_arterial_delay_offset() {
    let t = time_array();
    let ca = parker(&t, 0.0, 0.0);
    let options = ModelOptions::default().with_arterial_delay(60.0);
    let ct = tofts(&t, &ca, ktrans(), 0.2, &options).unwrap();
    assert_eq!(onset_offset(&ca, &ct), 60);
}

#[test]
fn test_discretizations_agree_on_fine_grid() {
    let t = arange(0.0, 360.0, 0.01);
    let ca = parker(&t, 0.0, 0.0);
    let conv = tofts(&t, &ca, ktrans(), 0.2, &ModelOptions::default()).unwrap();
    let exp = tofts(
        &t,
        &ca,
        ktrans(),
        0.2,
        &ModelOptions::default().with_discretization(Discretization::Exp),
    )
    .unwrap();
    assert_all_close(&conv, &exp, 1e-4, 1e-3);
}

#[test]
fn test_area_ratio_matches_ve() {
    let t = time_array();
    let ca = parker(&t, 0.0, 0.0);
    for method in [Discretization::Conv, Discretization::Exp] {
        let options = ModelOptions::default().with_discretization(method);
        let ct = tofts(&t, &ca, ktrans(), 0.2, &options).unwrap();
        let ratio = trapezoid(&t, &ct).unwrap() / trapezoid(&t, &ca).unwrap();
        assert_relative_eq!(ratio, 0.2, epsilon = 0.1);
    }
}

#[test]
fn test_no_exchange_gives_zero_curve() {
    let t = time_array();
    let ca = parker(&t, 0.0, 0.0);
    for method in [Discretization::Conv, Discretization::Exp] {
        let options = ModelOptions::default().with_discretization(method);
        for (k, ve) in [(0.0, 0.2), (0.6, 0.0)] {
            let ct = tofts(&t, &ca, Rate::PerMinute(k), ve, &options).unwrap();
            assert!(ct.iter().all(|&c| c == 0.0));
        }
    }
}

#[test]
fn test_rate_units_are_equivalent() {
    let t = time_array();
    let ca = parker(&t, 0.0, 0.0);
    let options = ModelOptions::default();
    let per_minute = tofts(&t, &ca, Rate::PerMinute(0.6), 0.2, &options).unwrap();
    let per_second = tofts(&t, &ca, Rate::PerSecond(0.01), 0.2, &options).unwrap();
    assert_all_close(&per_minute, &per_second, 1e-12, 1e-14);
}

#[test]
fn test_invalid_parameters() {
    let t = time_array();
    let ca = parker(&t, 0.0, 0.0);
    let options = ModelOptions::default();

    let err = tofts(&t, &ca, Rate::PerMinute(-0.1), 0.2, &options).unwrap_err();
    assert!(err.to_string().contains("non-negative"));

    let err = tofts(&t, &ca, ktrans(), -0.2, &options).unwrap_err();
    assert!(err.to_string().contains("in range [0, 1]"));

    let err = tofts(&t, &ca, ktrans(), 0.2, &options.with_arterial_delay(-5.0)).unwrap_err();
    assert!(err.to_string().contains("non-negative"));

    let err = tofts(&t, &ca, Rate::PerMinute(f64::NAN), 0.2, &options).unwrap_err();
    assert!(err.to_string().contains("numeric scalar"));

    for (key, value) in [("Ktrans", json!("invalid")), ("ve", json!([0.2]))] {
        let mut description = json!({"model": "tofts", "Ktrans": 0.6, "ve": 0.2, "Ta": 30.0});
        description[key] = value;
        let err = TissueModel::from_json(&description).unwrap_err();
        assert!(err.to_string().contains("numeric scalar"));
    }
}

#[test]
fn test_mismatched_inputs() {
    let t = time_array();
    let ca = parker(&t[..100], 0.0, 0.0);
    assert!(matches!(
        tofts(&t, &ca, ktrans(), 0.2, &ModelOptions::default()),
        Err(TissueError::Grid(_))
    ));
}
