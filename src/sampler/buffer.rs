use std::sync::Arc;

use crate::foundation::core::{Point, Rect, Rgba, TRANSPARENT, rect_xywh};
use crate::foundation::error::{FirtreeError, FirtreeResult};
use crate::foundation::math::lerp4;
use crate::render::format::BufferDesc;

/// Immutable premultiplied texels, row-major.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PixelStore {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) texels: Vec<Rgba>,
}

impl PixelStore {
    pub(crate) fn new(width: u32, height: u32, texels: Vec<Rgba>) -> FirtreeResult<Self> {
        let expected = width as usize * height as usize;
        if texels.len() != expected {
            return Err(FirtreeError::format(format!(
                "{width}x{height} image needs {expected} texels, got {}",
                texels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// Like [`filled`](Self::filled), failing instead of aborting when the grid cannot be
    /// allocated.
    pub(crate) fn try_filled(width: u32, height: u32, color: Rgba) -> FirtreeResult<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .filter(|&n| {
                n.checked_mul(std::mem::size_of::<Rgba>())
                    .is_some_and(|bytes| bytes <= isize::MAX as usize)
            })
            .ok_or_else(|| FirtreeError::invalid_graph(format!("{width}x{height} pixel grid is too large")))?;
        let mut texels = Vec::new();
        texels.try_reserve_exact(len).map_err(|err| {
            FirtreeError::invalid_graph(format!("cannot allocate {width}x{height} pixel grid: {err}"))
        })?;
        texels.resize(len, color);
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    pub(crate) fn filled(width: u32, height: u32, color: Rgba) -> Self {
        Self {
            width,
            height,
            texels: vec![color; width as usize * height as usize],
        }
    }

    /// Texel at integer pixel coordinates; transparent outside the image.
    pub(crate) fn texel(&self, x: i64, y: i64) -> Rgba {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return TRANSPARENT;
        }
        self.texels[y as usize * self.width as usize + x as usize]
    }

    /// Pixel `(i, j)` covers `[i, i + 1) x [j, j + 1)`.
    pub(crate) fn sample_nearest(&self, p: Point) -> Rgba {
        if !p.x.is_finite() || !p.y.is_finite() {
            return TRANSPARENT;
        }
        self.texel(p.x.floor() as i64, p.y.floor() as i64)
    }

    /// Bilinear blend of the four texel centers around `p`. Missing neighbours are transparent.
    pub(crate) fn sample_bilinear(&self, p: Point) -> Rgba {
        if !p.x.is_finite() || !p.y.is_finite() {
            return TRANSPARENT;
        }
        let fx = p.x - 0.5;
        let fy = p.y - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = (fx - x0) as f32;
        let ty = (fy - y0) as f32;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = lerp4(self.texel(x0, y0), self.texel(x0 + 1, y0), tx);
        let bottom = lerp4(self.texel(x0, y0 + 1), self.texel(x0 + 1, y0 + 1), tx);
        lerp4(top, bottom, ty)
    }

    pub(crate) fn sample(&self, p: Point, interpolate: bool) -> Rgba {
        if interpolate {
            self.sample_bilinear(p)
        } else {
            self.sample_nearest(p)
        }
    }
}

/// A leaf image backed by decoded pixels.
///
/// Pixel `(i, j)` occupies the unit square at `(i, j)` in sampler space. The reported extent
/// defaults to the pixel rectangle and can be overridden; sampling is unaffected by the
/// override and reads transparent black outside the pixels.
#[derive(Clone, Debug)]
pub struct BufferSampler {
    store: Arc<PixelStore>,
    extent: Option<Rect>,
    interpolate: bool,
}

impl BufferSampler {
    /// Decode a caller-owned packed buffer. The bytes are copied.
    pub fn new(data: &[u8], desc: BufferDesc) -> FirtreeResult<Self> {
        let texels = desc.decode(data)?;
        Ok(Self::from_store(PixelStore::new(desc.width, desc.height, texels)?))
    }

    /// Wrap already premultiplied `f32` texels, row-major.
    pub fn from_premultiplied(width: u32, height: u32, texels: Vec<Rgba>) -> FirtreeResult<Self> {
        Ok(Self::from_store(PixelStore::new(width, height, texels)?))
    }

    /// A `width` x `height` image of one premultiplied color.
    pub fn solid(width: u32, height: u32, color: Rgba) -> Self {
        Self::from_store(PixelStore::filled(width, height, color))
    }

    /// A zero-sized image with extent `(0, 0, 0, 0)`.
    pub fn empty() -> Self {
        Self::from_store(PixelStore::filled(0, 0, TRANSPARENT))
    }

    pub(crate) fn from_store(store: PixelStore) -> Self {
        Self {
            store: Arc::new(store),
            extent: None,
            interpolate: false,
        }
    }

    /// Use bilinear rather than nearest-neighbour sampling.
    pub fn with_interpolation(mut self, interpolate: bool) -> Self {
        self.interpolate = interpolate;
        self
    }

    /// Report `extent` instead of the pixel rectangle.
    pub fn with_extent(mut self, extent: Rect) -> Self {
        self.extent = Some(extent);
        self
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.store.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.store.height
    }

    /// Whether bilinear sampling is enabled.
    pub fn interpolate(&self) -> bool {
        self.interpolate
    }

    /// Custom extent, or `(0, 0, width, height)`.
    pub fn extent(&self) -> Rect {
        self.extent.unwrap_or_else(|| {
            rect_xywh(
                0.0,
                0.0,
                f64::from(self.store.width),
                f64::from(self.store.height),
            )
        })
    }

    /// Premultiplied texel at `(x, y)`, if inside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        (x < self.store.width && y < self.store.height)
            .then(|| self.store.texel(i64::from(x), i64::from(y)))
    }

    pub(crate) fn store(&self) -> &Arc<PixelStore> {
        &self.store
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sampler/buffer.rs"]
mod tests;
