//! Frame sources: whatever provides the raster the blur is applied to.

use std::sync::Arc;

use crate::foundation::core::{RasterSize, premultiply_rgba8_in_place};
use crate::foundation::error::{BlurError, BlurResult};

/// Supplies the captured raster for one frame.
///
/// `capture` must return a premultiplied pixmap of exactly `logical.scaled(scale)` pixels.
pub trait FrameSource {
    /// Rasterize the content at `logical` size times `scale`.
    fn capture(&mut self, logical: RasterSize, scale: f32) -> BlurResult<vello_cpu::Pixmap>;
}

/// Adapts a closure into a [`FrameSource`].
pub struct CaptureFn<F>(pub F);

impl<F> FrameSource for CaptureFn<F>
where
    F: FnMut(RasterSize, f32) -> BlurResult<vello_cpu::Pixmap>,
{
    fn capture(&mut self, logical: RasterSize, scale: f32) -> BlurResult<vello_cpu::Pixmap> {
        (self.0)(logical, scale)
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn capture(&mut self, logical: RasterSize, scale: f32) -> BlurResult<vello_cpu::Pixmap> {
        (**self).capture(logical, scale)
    }
}

/// A solid rectangle in logical coordinates.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneRect {
    /// Bounds in logical pixels.
    pub rect: kurbo::Rect,
    /// Straight-alpha fill colour.
    pub rgba: [u8; 4],
}

/// Background colour plus solid rectangles, rasterized with `vello_cpu`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneSource {
    /// Straight-alpha background colour.
    pub background: [u8; 4],
    /// Rectangles drawn in order over the background.
    pub rects: Vec<SceneRect>,
}

impl SceneSource {
    /// Empty scene over `background`.
    pub fn new(background: [u8; 4]) -> Self {
        Self {
            background,
            rects: Vec::new(),
        }
    }

    /// Append a rectangle.
    pub fn with_rect(mut self, rect: kurbo::Rect, rgba: [u8; 4]) -> Self {
        self.rects.push(SceneRect { rect, rgba });
        self
    }
}

impl FrameSource for SceneSource {
    fn capture(&mut self, logical: RasterSize, scale: f32) -> BlurResult<vello_cpu::Pixmap> {
        let size = logical.scaled(scale)?;
        let (w, h) = size.to_u16()?;
        let mut ctx = vello_cpu::RenderContext::new(w, h);

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(color(self.background));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(w), f64::from(h)));

        ctx.set_transform(vello_cpu::kurbo::Affine::scale(f64::from(scale)));
        for r in &self.rects {
            ctx.set_paint(color(r.rgba));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                r.rect.x0, r.rect.y0, r.rect.x1, r.rect.y1,
            ));
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(pixmap)
    }
}

fn color(rgba: [u8; 4]) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = rgba;
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

/// A decoded straight-alpha image, stretched over the logical frame.
#[derive(Clone)]
pub struct ImageSource {
    size: RasterSize,
    pixmap: Arc<vello_cpu::Pixmap>,
}

impl std::fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSource").field("size", &self.size).finish()
    }
}

impl ImageSource {
    /// Premultiply `img` once; captures reuse the pixmap.
    pub fn new(img: &image::RgbaImage) -> BlurResult<Self> {
        let size = RasterSize::new(img.width(), img.height())?;
        let mut bytes = img.as_raw().clone();
        premultiply_rgba8_in_place(&mut bytes);
        let pixmap = pixmap_from_premul_bytes(&bytes, size)?;
        Ok(Self {
            size,
            pixmap: Arc::new(pixmap),
        })
    }

    /// Decode any format `image` understands.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> BlurResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| {
            BlurError::render(format!("failed to decode '{}': {e}", path.display()))
        })?;
        Self::new(&img.to_rgba8())
    }

    /// Natural image size.
    pub fn size(&self) -> RasterSize {
        self.size
    }
}

impl FrameSource for ImageSource {
    fn capture(&mut self, logical: RasterSize, scale: f32) -> BlurResult<vello_cpu::Pixmap> {
        let target = logical.scaled(scale)?;
        if target == self.size {
            return pixmap_from_premul_bytes(self.pixmap.data_as_u8_slice(), target);
        }

        let (w, h) = target.to_u16()?;
        let mut ctx = vello_cpu::RenderContext::new(w, h);
        let sx = f64::from(target.width) / f64::from(self.size.width);
        let sy = f64::from(target.height) / f64::from(self.size.height);
        ctx.set_transform(vello_cpu::kurbo::Affine::scale_non_uniform(sx, sy));
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::clone(&self.pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        });
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.size.width),
            f64::from(self.size.height),
        ));

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(pixmap)
    }
}

/// Wrap premultiplied RGBA8 bytes in a pixmap.
pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    size: RasterSize,
) -> BlurResult<vello_cpu::Pixmap> {
    let (w, h) = size.to_u16()?;
    if bytes.len() != size.byte_len() {
        return Err(BlurError::render("pixmap byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

/// Dimensions of a pixmap.
pub(crate) fn pixmap_size(pixmap: &vello_cpu::Pixmap) -> BlurResult<RasterSize> {
    RasterSize::new(u32::from(pixmap.width()), u32::from(pixmap.height()))
}

#[cfg(test)]
#[path = "../../tests/unit/render/source.rs"]
mod tests;
