use super::*;

fn pt(x: f64, y: f64) -> CurvePoint {
    CurvePoint::new(x, y, format!("p{x}"))
}

#[test]
fn bake_requires_at_least_one_point() {
    assert!(CurveLut::bake(&[]).is_err());
}

#[test]
fn bake_rejects_out_of_range_and_non_finite_points() {
    assert!(CurveLut::bake(&[pt(1.5, 0.0)]).is_err());
    assert!(CurveLut::bake(&[pt(-0.1, 0.0)]).is_err());
    assert!(CurveLut::bake(&[pt(0.5, f64::NAN)]).is_err());
}

#[test]
fn boundaries_return_first_and_last_values() {
    let lut = CurveLut::bake(&[pt(0.2, 3.0), pt(0.8, 7.0)]).unwrap();
    assert_eq!(lut.sample(0.0), 3.0);
    assert_eq!(lut.sample(1.0), 7.0);
    // Clamped outside [0, 1] too.
    assert_eq!(lut.sample(-4.0), 3.0);
    assert_eq!(lut.sample(2.0), 7.0);
}

#[test]
fn interpolation_is_linear_between_points() {
    let lut = CurveLut::bake(&[pt(0.0, 0.0), pt(1.0, 1.0)]).unwrap();
    for frac in [0.1, 0.25, 0.5, 0.75, 0.9] {
        assert!((lut.sample(frac) - frac).abs() < 0.01, "at {frac}");
    }
}

#[test]
fn unsorted_points_are_sorted_before_baking() {
    let sorted = CurveLut::bake(&[pt(0.0, 1.0), pt(0.5, 0.0), pt(1.0, 1.0)]).unwrap();
    let shuffled = CurveLut::bake(&[pt(0.5, 0.0), pt(1.0, 1.0), pt(0.0, 1.0)]).unwrap();
    assert_eq!(sorted, shuffled);
}

#[test]
fn single_point_bakes_to_a_constant() {
    let lut = CurveLut::bake(&[pt(0.3, 0.6)]).unwrap();
    for frac in [0.0, 0.3, 0.7, 1.0] {
        assert_eq!(lut.sample(frac), 0.6);
    }
    assert_eq!(lut, CurveLut::constant(0.6));
}

#[test]
fn non_finite_sample_fraction_falls_back_to_start() {
    let lut = CurveLut::bake(&[pt(0.0, 2.0), pt(1.0, 9.0)]).unwrap();
    assert_eq!(lut.sample(f64::NAN), 2.0);
}

#[test]
fn serde_roundtrip_preserves_samples() {
    let lut = CurveLut::bake(&[pt(0.0, 0.0), pt(1.0, 1.0)]).unwrap();
    let json = serde_json::to_string(&lut).unwrap();
    let back: CurveLut = serde_json::from_str(&json).unwrap();
    assert_eq!(lut, back);
}
