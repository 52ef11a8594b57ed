use super::*;
use crate::gradient::spec::{BlurEdge, EdgeBlur};
use crate::render::source::{CaptureFn, SceneSource};

fn scene() -> SceneSource {
    SceneSource::new([20, 40, 60, 255])
        .with_rect(kurbo::Rect::new(2.0, 2.0, 6.0, 6.0), [200, 180, 160, 255])
}

fn spec(start: f32) -> GradientBlurSpec {
    EdgeBlur::new(BlurEdge::Bottom, start).with_samples(6).build()
}

fn logical() -> RasterSize {
    RasterSize::new(8, 8).unwrap()
}

#[test]
fn strength_is_regenerated_only_when_spec_or_size_changes() {
    let cfg = BlurConfig::default().with_sigma(1.5).with_blur_texture_dimensions(32);
    let mut blur = ProgressiveBlur::new(cfg.clone(), spec(0.3)).unwrap();
    let mut src = scene();

    blur.render_frame(&mut src, logical()).unwrap();
    blur.render_frame(&mut src, logical()).unwrap();
    assert_eq!(blur.stats().strength_regenerations, 1);

    blur.set_spec(spec(0.3));
    blur.render_frame(&mut src, logical()).unwrap();
    assert_eq!(blur.stats().strength_regenerations, 1);

    blur.set_spec(spec(0.5));
    blur.render_frame(&mut src, logical()).unwrap();
    assert_eq!(blur.stats().strength_regenerations, 2);

    blur.set_config(cfg.with_blur_texture_dimensions(48)).unwrap();
    assert_eq!(
        blur.strength_texture().unwrap().size(),
        RasterSize::square(48).unwrap()
    );
    assert_eq!(blur.stats().strength_regenerations, 3);
    assert_eq!(blur.stats().frames_rendered, 4);
}

#[test]
fn caller_textures_are_shared_not_regenerated() {
    let tex = Arc::new(
        StrengthTexture::from_strengths(RasterSize::new(2, 2).unwrap(), &[0.0, 1.0, 0.5, 0.25])
            .unwrap(),
    );
    let mut blur =
        ProgressiveBlur::new(BlurConfig::default(), StrengthSource::Texture(Arc::clone(&tex)))
            .unwrap();
    blur.render_frame(&mut scene(), logical()).unwrap();
    blur.teardown();
    assert_eq!(blur.stats().strength_regenerations, 0);
    assert_eq!(Arc::strong_count(&tex), 2);
    assert_eq!(blur.strength_texture().unwrap(), tex.as_ref());
}

#[test]
fn switching_to_a_texture_releases_the_owned_one() {
    let mut blur = ProgressiveBlur::new(BlurConfig::default(), spec(0.0)).unwrap();
    blur.strength_texture().unwrap();
    assert!(blur.cache.is_some());
    blur.set_strength(
        StrengthTexture::from_strengths(RasterSize::new(1, 1).unwrap(), &[1.0]).unwrap(),
    );
    assert!(blur.cache.is_none());
}

#[test]
fn stages_advance_and_reset_on_failure() {
    let mut blur = ProgressiveBlur::new(BlurConfig::default(), spec(0.2)).unwrap();
    assert_eq!(blur.last_stage(), FrameStage::Idle);

    blur.render_frame(&mut scene(), logical()).unwrap();
    assert_eq!(blur.last_stage(), FrameStage::Composited);

    let mut failing = CaptureFn(|_: RasterSize, _: f32| -> BlurResult<vello_cpu::Pixmap> {
        Err(BlurError::render("camera unplugged"))
    });
    let err = blur.render_frame(&mut failing, logical()).unwrap_err();
    assert!(err.to_string().contains("camera unplugged"));
    assert_eq!(blur.last_stage(), FrameStage::Idle);
    assert_eq!(blur.stats().frames_failed, 1);
    assert_eq!(blur.stats().frames_rendered, 1);
}

#[test]
fn teardown_releases_owned_texture() {
    let mut blur = ProgressiveBlur::new(BlurConfig::default(), spec(0.2)).unwrap();
    blur.render_frame(&mut scene(), logical()).unwrap();
    assert!(blur.cache.is_some());
    blur.teardown();
    assert!(blur.cache.is_none());
    assert_eq!(blur.last_stage(), FrameStage::Idle);
}

#[test]
fn invalid_configs_are_rejected_up_front() {
    assert!(ProgressiveBlur::new(BlurConfig::default().with_sigma(-3.0), spec(0.0)).is_err());
    let mut blur = ProgressiveBlur::new(BlurConfig::default(), spec(0.0)).unwrap();
    assert!(
        blur.set_config(BlurConfig::default().with_blur_texture_dimensions(0))
            .is_err()
    );
    assert_eq!(blur.config(), &BlurConfig::default());
}
