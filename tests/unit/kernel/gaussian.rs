use super::*;

#[test]
fn radius_for_sigma_10_is_untruncated() {
    assert_eq!(kernel_radius(10.0), 30);
    let k = ConvolutionKernel::new(10.0, BlurAxisSide::Symmetric).unwrap();
    assert_eq!(k.radius(), 30);
    assert_eq!(k.width(), 61);
}

#[test]
fn radius_for_sigma_200_is_truncated_to_tap_budget() {
    assert_eq!(kernel_radius(200.0), 127);
    let k = ConvolutionKernel::new(200.0, BlurAxisSide::Symmetric).unwrap();
    assert_eq!(k.radius(), 127);
    assert_eq!(k.width(), 255);
}

#[test]
fn radius_boundary_at_tap_budget() {
    // ceil(3 * 42.33) = 127 -> 255 taps, still allowed.
    assert_eq!(kernel_radius(42.33), 127);
    // ceil(3 * 42.4) = 128 -> 257 taps, truncated.
    assert_eq!(kernel_radius(42.4), 127);
    assert_eq!(kernel_radius(f32::INFINITY), 127);
    assert_eq!(kernel_radius(-1.0), 0);
}

#[test]
fn tiny_sigma_is_degenerate() {
    assert!(ConvolutionKernel::new(0.0, BlurAxisSide::Symmetric).is_none());
    assert!(ConvolutionKernel::new(5e-6, BlurAxisSide::Positive).is_none());
    assert!(ConvolutionKernel::new(f32::NAN, BlurAxisSide::Symmetric).is_none());
}

#[test]
fn weights_sum_to_one_for_every_side_and_truncation() {
    for sigma in [0.3f32, 1.0, 2.5, 10.0, 42.0, 200.0, 1000.0] {
        for side in [
            BlurAxisSide::Symmetric,
            BlurAxisSide::Positive,
            BlurAxisSide::Negative,
        ] {
            let k = ConvolutionKernel::new(sigma, side).unwrap();
            assert!(
                (k.weight_sum() - 1.0).abs() < 1e-4,
                "sigma {sigma} side {side:?} sum {}",
                k.weight_sum()
            );
        }
    }
}

#[test]
fn one_sided_kernels_only_sample_their_side() {
    let pos = ConvolutionKernel::new(3.0, BlurAxisSide::Positive).unwrap();
    assert_eq!(pos.width(), pos.radius() + 1);
    assert!(pos.taps().iter().all(|t| t.offset >= 0));

    let neg = ConvolutionKernel::new(3.0, BlurAxisSide::Negative).unwrap();
    assert!(neg.taps().iter().all(|t| t.offset <= 0));
    for (p, n) in pos.taps().iter().zip(neg.taps()) {
        assert_eq!(p.offset, -n.offset);
        assert_eq!(p.weight, n.weight);
    }
}

#[test]
fn symmetric_weights_peak_at_centre_and_mirror() {
    let k = ConvolutionKernel::new(2.0, BlurAxisSide::Symmetric).unwrap();
    let taps = k.taps();
    let mid = taps.len() / 2;
    assert_eq!(taps[mid].offset, 0);
    for i in 0..mid {
        assert_eq!(taps[i].weight, taps[taps.len() - 1 - i].weight);
        assert!(taps[i].weight < taps[mid].weight);
    }
}

#[test]
fn convolving_a_constant_is_lossless() {
    let k = ConvolutionKernel::new(200.0, BlurAxisSide::Symmetric).unwrap();
    let out = k.convolve(|_| [0.5, 0.25, 1.0, 1.0]);
    for (o, e) in out.iter().zip([0.5f32, 0.25, 1.0, 1.0]) {
        assert!((o - e).abs() < 1e-4);
    }
}

#[test]
fn side_names_parse() {
    assert_eq!("+".parse::<BlurAxisSide>().unwrap(), BlurAxisSide::Positive);
    assert_eq!("negative".parse::<BlurAxisSide>().unwrap(), BlurAxisSide::Negative);
    assert!("up".parse::<BlurAxisSide>().is_err());
}
