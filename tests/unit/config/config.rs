use super::*;
use crate::gradient::spec::BlurEdge;

#[test]
fn defaults_match_documented_values() {
    let c = BlurConfig::default();
    assert_eq!(c.blur_texture_dimensions, 128);
    assert_eq!(c.tint_color, TintColor::transparent());
    assert!(c.enable_horizontal_pass && c.enable_vertical_pass);
    assert_eq!(c.horizontal_side, BlurAxisSide::Symmetric);
    assert_eq!(c.vertical_side, BlurAxisSide::Symmetric);
    assert_eq!(c.map_mode, BlurMapMode::BlendWithBlurred);
    assert_eq!(c.map_exponent, 2.0);
    assert_eq!(c.device_pixel_scale, 1.0);
    assert_eq!(c.original_sampling, OriginalSampling::Direct);
    c.validate().unwrap();
}

#[test]
fn json_fills_missing_fields_with_defaults() {
    let c = BlurConfig::from_json_str(
        r#"{"sigma": 3.5, "map_mode": "modulate_sigma", "vertical_side": "negative"}"#,
    )
    .unwrap();
    assert_eq!(c.sigma, 3.5);
    assert_eq!(c.map_mode, BlurMapMode::ModulateSigma);
    assert_eq!(c.vertical_side, BlurAxisSide::Negative);
    assert_eq!(c.blur_texture_dimensions, 128);
}

#[test]
fn json_round_trips_through_pretty_output() {
    let c = BlurConfig::default()
        .with_sigma(12.0)
        .with_tint_color(TintColor::new(0.1, 0.2, 0.3, 0.4))
        .with_original_sampling(OriginalSampling::MirroredY);
    let back = BlurConfig::from_json_str(&c.to_json_string().unwrap()).unwrap();
    assert_eq!(back, c);
}

#[test]
fn invalid_settings_are_rejected() {
    for bad in [
        BlurConfig::default().with_sigma(-1.0),
        BlurConfig::default().with_sigma(f32::NAN),
        BlurConfig::default().with_blur_texture_dimensions(0),
        BlurConfig::default().with_blur_texture_dimensions(70_000),
        BlurConfig::default().with_device_pixel_scale(0.0),
    ] {
        let err = bad.validate().unwrap_err();
        assert!(err.to_string().starts_with("validation error:"), "{err}");
    }
    assert!(BlurConfig::from_json_str(r#"{"sigma": -2}"#).is_err());
    let err = BlurConfig::from_json_str("{not json").unwrap_err();
    assert!(err.to_string().starts_with("serialization error:"));
}

#[test]
fn pass_parameters_follow_enable_flags_and_sides() {
    let c = BlurConfig::default()
        .with_sigma(6.0)
        .with_passes(false, true)
        .with_sides(BlurAxisSide::Positive, BlurAxisSide::Negative);
    let size = RasterSize::new(10, 10).unwrap();

    let h = c.pass_parameters(Axis::Horizontal, size);
    assert_eq!(h.sigma, 0.0);
    assert_eq!(h.side, BlurAxisSide::Positive);
    assert!(!h.is_final);

    let v = c.pass_parameters(Axis::Vertical, size);
    assert_eq!(v.sigma, 6.0);
    assert_eq!(v.side, BlurAxisSide::Negative);
    assert!(v.is_final);
}

#[test]
fn documents_carry_a_tagged_strength_spec() {
    let doc = BlurDocument::from_json_str(
        r#"{
            "config": {"sigma": 4},
            "strength": {"kind": "edge", "edge": "top", "start": 0.0, "end": 0.4, "samples": 3}
        }"#,
    )
    .unwrap();
    assert_eq!(doc.config.sigma, 4.0);
    let spec = doc.strength.unwrap().to_gradient();
    let expected = EdgeBlur::new(BlurEdge::Top, 0.0)
        .with_end(0.4)
        .with_samples(3)
        .build();
    assert_eq!(spec, expected);

    let explicit = BlurDocument::from_json_str(
        r#"{"strength": {"kind": "gradient", "stops": [0, 1], "values": [0.5, 0],
            "start": {"x": 0, "y": 0.5}, "end": {"x": 1, "y": 0.5}}}"#,
    )
    .unwrap();
    assert_eq!(explicit.config, BlurConfig::default());
    assert_eq!(explicit.strength.unwrap().to_gradient().values(), &[0.5, 0.0]);
}

#[test]
fn documents_reject_mismatched_gradients() {
    let err = BlurDocument::from_json_str(
        r#"{"strength": {"kind": "gradient", "stops": [0, 0.5, 1], "values": [1, 0],
            "start": {"x": 0, "y": 0}, "end": {"x": 0, "y": 1}}}"#,
    );
    assert!(err.is_err());
}
