//! Two-Compartment Exchange Model behaviour through the public API

use approx::assert_relative_eq;
use perfusion::prelude::*;
use serde_json::json;

use super::{assert_all_close, geometric_time_array, max, onset_offset, time_array};

fn flow(value: f64) -> Flow {
    Flow::Ml100PerMinute(value)
}

#[test]
fn test_peak_below_aif_peak() {
    for t in [linspace(0.0, 360.0, 360), geometric_time_array()] {
        let ca = parker(&t, 0.0, 0.0);
        let ct = two_compartment_exchange_model(
            &t,
            &ca,
            flow(10.0),
            flow(5.0),
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
    let ct =
        two_compartment_exchange_model(&t, &ca, flow(10.0), flow(5.0), 0.2, 0.3, &options).unwrap();
    assert_eq!(onset_offset(&ca, &ct), 60);
}

#[test]
fn test_zero_vp_matches_tofts() {
    let t = time_array();
    let ca = parker(&t, 0.0, 0.0);
    let options = ModelOptions::default();
    let ct =
        two_compartment_exchange_model(&t, &ca, flow(10.0), flow(5.0), 0.2, 0.0, &options).unwrap();
    let reference = tofts(&t, &ca, Rate::PerMinute(3.93), 0.2, &options).unwrap();
    assert_all_close(&ct, &reference, 1e-4, 1e-3);
}

#[test]
fn test_compartments_sum_to_total() {
    let t = time_array();
    let ca = parker(&t, 0.0, 0.0);
    let options = ModelOptions::default();
    let model = TwoCompartmentExchange::new(flow(30.0), flow(10.0), 0.2, 0.1);
    let parts = model.compartments(&t, &ca, &options).unwrap();
    let total = model.concentration(&t, &ca, &options).unwrap();
    assert_eq!(parts.total(), total);
    assert!(parts.plasma.iter().all(|&c| c >= -1e-12));
    assert!(parts.extravascular.iter().all(|&c| c >= -1e-12));
}

#[test]
fn test_area_ratio_approaches_total_volume() {
    // Long acquisition so most of the tracer has left the tissue again
    let t = arange(0.0, 1200.0, 0.5);
    let ca = parker(&t, 0.0, 0.0);
    let options = ModelOptions::default().with_arterial_delay(0.0);
    let ct =
        two_compartment_exchange_model(&t, &ca, flow(60.0), flow(20.0), 0.2, 0.1, &options).unwrap();
    let ratio = trapezoid(&t, &ct).unwrap() / trapezoid(&t, &ca).unwrap();
    assert_relative_eq!(ratio, 0.3, epsilon = 0.1);
}

#[test]
fn test_invalid_parameters() {
    let t = time_array();
    let ca = parker(&t, 0.0, 0.0);
    let options = ModelOptions::default();

    let err = two_compartment_exchange_model(&t, &ca, flow(0.0), flow(5.0), 0.2, 0.3, &options)
        .unwrap_err();
    assert!(err.to_string().contains("Fp must be positive"));

    let err = two_compartment_exchange_model(&t, &ca, flow(10.0), flow(-1.0), 0.2, 0.3, &options)
        .unwrap_err();
    assert!(err.to_string().contains("PS must be non-negative"));

    let err = two_compartment_exchange_model(&t, &ca, flow(10.0), flow(5.0), 0.8, 0.3, &options)
        .unwrap_err();
    assert!(err
        .to_string()
        .starts_with("Sum of ve (0.8) and vp (0.3) exceeds 1"));

    let err = TissueModel::from_json(&json!({
        "model": "2cxm", "Fp": [10], "PS": 5, "ve": 0.2, "vp": 0.3
    }))
    .unwrap_err();
    assert_eq!(err.to_string(), "Fp must be a numeric scalar");
}
