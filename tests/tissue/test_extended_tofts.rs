//! Extended Tofts model behaviour through the public API

use approx::assert_relative_eq;
use perfusion::prelude::*;
use serde_json::json;

use super::{assert_all_close, geometric_time_array, max, onset_offset, time_array};

#[test]
fn test_peak_below_aif_peak() {
    for t in [linspace(0.0, 360.0, 360), geometric_time_array()] {
        let ca = parker(&t, 0.0, 0.0);
        let ct = extended_tofts(
            &t,
            &ca,
            Rate::PerMinute(0.6),
            0.2,
            0.3,
            &ModelOptions::default(),
        )
        .unwrap();
        assert!(max(&ct).round() < max(&ca).round());
    }
}

#[test]
fn test_arterial_delay_offset() {
    let t = time_array();
    let ca = parker(&t, 0.0, 0.0);
    let options = ModelOptions::default().with_arterial_delay(60.0);
    let ct = extended_tofts(&t, &ca, Rate::PerMinute(0.6), 0.2, 0.3, &options).unwrap();
    assert_eq!(onset_offset(&ca, &ct), 60);
}

#[test]
fn test_discretizations_agree_on_fine_grid() {
    let t = arange(0.0, 360.0, 0.01);
    let ca = parker(&t, 0.0, 0.0);
    let model = ExtendedTofts::new(Rate::PerMinute(0.6), 0.2, 0.3);
    let conv = model
        .concentration(&t, &ca, &ModelOptions::default())
        .unwrap();
    let exp = model
        .concentration(
            &t,
            &ca,
            &ModelOptions::default().with_discretization(Discretization::Exp),
        )
        .unwrap();
    assert_all_close(&conv, &exp, 1e-4, 1e-3);
}

#[test]
fn test_area_ratio_matches_total_volume() {
    let t = time_array();
    let ca = parker(&t, 0.0, 0.0);
    for method in [Discretization::Conv, Discretization::Exp] {
        let options = ModelOptions::default().with_discretization(method);
        let ct = extended_tofts(&t, &ca, Rate::PerMinute(0.6), 0.2, 0.3, &options).unwrap();
        let ratio = trapezoid(&t, &ct).unwrap() / trapezoid(&t, &ca).unwrap();
        assert_relative_eq!(ratio, 0.5, epsilon = 0.1);
    }
}

#[test]
fn test_no_exchange_leaves_vascular_term() {
    let t = time_array();
    let ca = parker(&t, 0.0, 0.0);
    for method in [Discretization::Conv, Discretization::Exp] {
        let options = ModelOptions::default().with_discretization(method);
        for (k, ve) in [(0.0, 0.2), (0.6, 0.0)] {
            let ct = extended_tofts(&t, &ca, Rate::PerMinute(k), ve, 0.3, &options).unwrap();
            let expected: Vec<f64> = ca.iter().map(|c| 0.3 * c).collect();
            assert_all_close(&ct, &expected, 1e-12, 1e-12);
        }
    }
}

#[test]
fn test_invalid_parameters() {
    let t = time_array();
    let ca = parker(&t, 0.0, 0.0);
    let options = ModelOptions::default();
    let k = Rate::PerMinute(0.6);

    let cases = [
        (extended_tofts(&t, &ca, Rate::PerMinute(-0.1), 0.2, 0.3, &options), "non-negative"),
        (extended_tofts(&t, &ca, k, -0.2, 0.3, &options), "in range [0, 1]"),
        (extended_tofts(&t, &ca, k, 0.2, -0.2, &options), "in range [0, 1]"),
        (extended_tofts(&t, &ca, k, 0.2, 1.1, &options), "in range [0, 1]"),
        (
            extended_tofts(&t, &ca, k, 0.2, 0.3, &options.with_arterial_delay(-5.0)),
            "non-negative",
        ),
        (extended_tofts(&t, &ca, k, 0.8, 0.3, &options), "exceeds 1"),
    ];
    for (result, message) in cases {
        let err = result.unwrap_err();
        assert!(
            err.to_string().contains(message),
            "{} does not mention {}",
            err,
            message
        );
    }

    for (key, value) in [
        ("Ktrans", json!("invalid")),
        ("ve", json!([0.2])),
        ("vp", json!([0.2])),
    ] {
        let mut description =
            json!({"model": "extended_tofts", "Ktrans": 0.6, "ve": 0.2, "vp": 0.3});
        description[key] = value;
        let err = TissueModel::from_json(&description).unwrap_err();
        assert_eq!(err.to_string(), format!("{} must be a numeric scalar", key));
    }
}
