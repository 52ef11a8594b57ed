use super::*;

fn size(w: u32, h: u32) -> RasterSize {
    RasterSize::new(w, h).unwrap()
}

fn solid_strength(s: u8) -> Vec<u8> {
    vec![s, 0, 0, 255]
}

fn params(map_mode: BlurMapMode, is_final: bool, sigma: f32, child: RasterSize) -> PassParameters {
    PassParameters {
        sigma,
        axis: Axis::Horizontal,
        side: BlurAxisSide::Symmetric,
        map_mode,
        is_final,
        tint: TintColor::new(1.0, 0.0, 0.0, 0.5),
        map_exponent: 1.0,
        child_size: child,
        device_pixel_scale: 1.0,
        original_sampling: OriginalSampling::Direct,
    }
}

fn approx4(a: [f32; 4], b: [f32; 4]) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
}

#[test]
fn degenerate_final_blend_mixes_tint_then_original() {
    let child = [0u8, 0, 255, 255];
    let original = [0u8, 255, 0, 255];
    let strength = solid_strength(128);
    let s = PassSamplers {
        child: TextureView::new(&child, size(1, 1)).unwrap(),
        strength: TextureView::new(&strength, size(1, 1)).unwrap(),
        original: Some(TextureView::new(&original, size(1, 1)).unwrap()),
    };
    let p = params(BlurMapMode::BlendWithBlurred, true, 0.0, size(1, 1));

    let k = 128.0 / 255.0;
    let tint = [1.0, 0.0, 0.0, 0.5];
    let tinted = mix4([0.0, 0.0, 1.0, 1.0], tint, k * 0.5);
    let expected = mix4([0.0, 1.0, 0.0, 1.0], tinted, k);
    assert!(approx4(shade_pixel([0.5, 0.5], &s, &p), expected));
}

#[test]
fn degenerate_intermediate_blend_passes_through() {
    let child = [10u8, 20, 30, 40];
    let strength = solid_strength(255);
    let s = PassSamplers {
        child: TextureView::new(&child, size(1, 1)).unwrap(),
        strength: TextureView::new(&strength, size(1, 1)).unwrap(),
        original: None,
    };
    let p = params(BlurMapMode::BlendWithBlurred, false, 0.0, size(1, 1));
    assert!(approx4(
        shade_pixel([0.5, 0.5], &s, &p),
        rgba8_to_f32([10, 20, 30, 40])
    ));
}

#[test]
fn modulate_with_zero_strength_is_identity_even_with_large_sigma() {
    let child: Vec<u8> = (0..4u8).flat_map(|i| [i * 60, 0, 0, 255]).collect();
    let strength = solid_strength(0);
    let s = PassSamplers {
        child: TextureView::new(&child, size(4, 1)).unwrap(),
        strength: TextureView::new(&strength, size(1, 1)).unwrap(),
        original: None,
    };
    let p = params(BlurMapMode::ModulateSigma, false, 50.0, size(4, 1));
    for x in 0..4u8 {
        let uv = [(f32::from(x) + 0.5) / 4.0, 0.5];
        assert!(approx4(shade_pixel(uv, &s, &p), rgba8_to_f32([x * 60, 0, 0, 255])));
    }
}

#[test]
fn modulate_tints_by_strength_times_tint_alpha() {
    let child = [0u8, 0, 0, 255];
    let strength = solid_strength(255);
    let s = PassSamplers {
        child: TextureView::new(&child, size(1, 1)).unwrap(),
        strength: TextureView::new(&strength, size(1, 1)).unwrap(),
        original: None,
    };
    let p = params(BlurMapMode::ModulateSigma, true, 4.0, size(1, 1));
    let out = shade_pixel([0.5, 0.5], &s, &p);
    assert!(approx4(out, [0.5, 0.0, 0.0, 0.75]));

    // The intermediate pass only convolves.
    let intermediate = params(BlurMapMode::ModulateSigma, false, 4.0, size(1, 1));
    assert!(approx4(shade_pixel([0.5, 0.5], &s, &intermediate), [0.0, 0.0, 0.0, 1.0]));
}

#[test]
fn blend_mode_ignores_one_sided_request() {
    let child: Vec<u8> = (0..16u8).flat_map(|i| [i * 16, 255 - i * 16, 7, 255]).collect();
    let strength = solid_strength(200);
    let s = PassSamplers {
        child: TextureView::new(&child, size(16, 1)).unwrap(),
        strength: TextureView::new(&strength, size(1, 1)).unwrap(),
        original: None,
    };
    let sym = params(BlurMapMode::BlendWithBlurred, false, 3.0, size(16, 1));
    for side in [BlurAxisSide::Positive, BlurAxisSide::Negative] {
        let one_sided = PassParameters { side, ..sym };
        assert_eq!(one_sided.effective_side(), BlurAxisSide::Symmetric);
        for x in 0..16 {
            let uv = [(x as f32 + 0.5) / 16.0, 0.5];
            assert_eq!(shade_pixel(uv, &s, &one_sided), shade_pixel(uv, &s, &sym));
        }
    }
}

#[test]
fn modulate_honours_one_sided_request() {
    // Step edge: left half black, right half white.
    let child: Vec<u8> = (0..8u8)
        .flat_map(|i| if i < 4 { [0, 0, 0, 255] } else { [255, 255, 255, 255] })
        .collect();
    let strength = solid_strength(255);
    let s = PassSamplers {
        child: TextureView::new(&child, size(8, 1)).unwrap(),
        strength: TextureView::new(&strength, size(1, 1)).unwrap(),
        original: None,
    };
    let base = PassParameters {
        tint: TintColor::transparent(),
        ..params(BlurMapMode::ModulateSigma, false, 1.0, size(8, 1))
    };
    let uv = [2.5 / 8.0, 0.5];
    let neg = shade_pixel(uv, &s, &PassParameters { side: BlurAxisSide::Negative, ..base });
    let pos = shade_pixel(uv, &s, &PassParameters { side: BlurAxisSide::Positive, ..base });
    // Looking left from x=2 only sees black; looking right reaches the white half.
    assert_eq!(neg[0], 0.0);
    assert!(pos[0] > 0.0);
}

#[test]
fn horizontal_pass_never_mixes_rows() {
    // Rows differ, columns are constant: a horizontal blur must leave it untouched.
    let child: Vec<u8> = (0..4u8)
        .flat_map(|y| (0..5).flat_map(move |_| [y * 80, 0, 0, 255]))
        .collect();
    let strength = solid_strength(255);
    let s = PassSamplers {
        child: TextureView::new(&child, size(5, 4)).unwrap(),
        strength: TextureView::new(&strength, size(1, 1)).unwrap(),
        original: None,
    };
    let p = params(BlurMapMode::BlendWithBlurred, false, 2.0, size(5, 4));
    for y in 0..4u8 {
        let uv = [0.5, (f32::from(y) + 0.5) / 4.0];
        let out = shade_pixel(uv, &s, &p);
        assert!((out[0] - f32::from(y * 80) / 255.0).abs() < 1e-5);
    }
}

#[test]
fn original_lookup_coordinate_space_is_pinned() {
    // Strength 0 makes the final blend return the original sample alone, exposing which
    // original texel each convention reads.
    let child = [0u8; 8];
    let original = [255u8, 0, 0, 255, 0, 0, 255, 255];
    let strength = solid_strength(0);
    let s = PassSamplers {
        child: TextureView::new(&child, size(1, 2)).unwrap(),
        strength: TextureView::new(&strength, size(1, 1)).unwrap(),
        original: Some(TextureView::new(&original, size(1, 2)).unwrap()),
    };
    let direct = params(BlurMapMode::BlendWithBlurred, true, 0.0, size(1, 2));
    let mirrored = PassParameters {
        original_sampling: OriginalSampling::MirroredY,
        ..direct
    };
    let top = [0.5, 0.25];
    assert!(approx4(shade_pixel(top, &s, &direct), [1.0, 0.0, 0.0, 1.0]));
    assert!(approx4(shade_pixel(top, &s, &mirrored), [0.0, 0.0, 1.0, 1.0]));
}

#[test]
fn exponent_is_floored_and_applied() {
    let mut p = params(BlurMapMode::ModulateSigma, false, 1.0, size(1, 1));
    p.map_exponent = 2.0;
    assert!((p.response(0.5) - 0.25).abs() < 1e-6);
    p.map_exponent = -3.0;
    assert_eq!(p.exponent(), MIN_MAP_EXPONENT);
    assert!(p.response(0.5) > 0.999);
    p.map_exponent = f32::NAN;
    assert_eq!(p.exponent(), MIN_MAP_EXPONENT);
}

#[test]
fn uniforms_follow_slot_layout() {
    let total: usize = FLOAT_SLOTS.iter().map(|(_, n)| n).sum();
    assert_eq!(total, UNIFORM_FLOATS);
    assert_eq!(SAMPLER_SLOTS[1], "blur_texture");

    let p = PassParameters {
        axis: Axis::Vertical,
        side: BlurAxisSide::Negative,
        map_exponent: 0.0,
        ..params(BlurMapMode::BlendWithBlurred, true, 12.5, size(64, 32))
    };
    let f = p.uniforms().to_floats();
    assert_eq!(
        f,
        [64.0, 32.0, 12.5, 1.0, -1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.5, MIN_MAP_EXPONENT]
    );

    let back = PassUniforms::from_floats(f)
        .to_parameters(1.0, OriginalSampling::Direct)
        .unwrap();
    assert_eq!(back.axis, Axis::Vertical);
    assert_eq!(back.side, BlurAxisSide::Negative);
    assert_eq!(back.map_mode, BlurMapMode::BlendWithBlurred);
    assert!(back.is_final);
    assert_eq!(back.child_size, size(64, 32));
}

#[test]
fn uniform_decoding_rejects_unknown_encodings() {
    let mut f = params(BlurMapMode::ModulateSigma, false, 1.0, size(2, 2))
        .uniforms()
        .to_floats();
    f[4] = 0.5;
    assert!(
        PassUniforms::from_floats(f)
            .to_parameters(1.0, OriginalSampling::Direct)
            .is_err()
    );
}

#[test]
fn bilinear_sampling_interpolates_between_texel_centres() {
    let data = [0u8, 0, 0, 255, 255, 0, 0, 255];
    let t = TextureView::new(&data, size(2, 1)).unwrap();
    let mid = t.sample_bilinear([0.5, 0.5]);
    assert!((mid[0] - 0.5).abs() < 1e-6);
    assert_eq!(t.sample_bilinear([0.0, 0.5])[0], 0.0);
    assert_eq!(t.sample_bilinear([1.0, 0.5])[0], 1.0);
}

#[test]
fn texture_view_checks_length() {
    assert!(TextureView::new(&[0u8; 7], size(1, 2)).is_err());
}

#[test]
fn map_mode_names_parse() {
    assert_eq!("blend".parse::<BlurMapMode>().unwrap(), BlurMapMode::BlendWithBlurred);
    assert_eq!(
        "modulate-sigma".parse::<BlurMapMode>().unwrap(),
        BlurMapMode::ModulateSigma
    );
    assert!("sharpen".parse::<BlurMapMode>().is_err());
}
