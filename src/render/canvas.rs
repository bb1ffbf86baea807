use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::foundation::core::{Point, Rect, Rgba, is_infinite, rect_xywh};
use crate::foundation::error::{FirtreeError, FirtreeResult};
use crate::foundation::math::over;
use crate::render::eval::Evaluator;
use crate::render::format::BufferDesc;
use crate::render::opts::RenderOpts;
use crate::render::plan::GraphPlan;
use crate::render::stack::on_eval_stack;
use crate::sampler::Sampler;
use crate::sampler::buffer::PixelStore;

struct CanvasInner {
    extent: Rect,
    opts: RenderOpts,
    /// Serializes composites; readers never take it.
    writer: Mutex<()>,
    pixels: RwLock<Arc<PixelStore>>,
}

/// A persistent premultiplied pixel buffer covering a fixed extent.
///
/// Composites accumulate with the over operator until the next [`clear`](Self::clear). The
/// contents can re-enter a graph through [`image`](Self::image); samplers read the pixels as
/// they are when a render is planned, so a canvas may be composited onto itself.
#[derive(Clone)]
pub struct AccumulationCanvas {
    inner: Arc<CanvasInner>,
}

impl AccumulationCanvas {
    /// Transparent canvas over `extent`. The pixel grid is the extent's size rounded up.
    pub fn new(extent: Rect) -> FirtreeResult<Self> {
        Self::with_opts(extent, RenderOpts::default())
    }

    /// Canvas with its origin at `(0, 0)`.
    pub fn with_size(width: u32, height: u32) -> FirtreeResult<Self> {
        Self::new(rect_xywh(0.0, 0.0, f64::from(width), f64::from(height)))
    }

    /// Like [`new`](Self::new), with explicit evaluation options for composites.
    pub fn with_opts(extent: Rect, opts: RenderOpts) -> FirtreeResult<Self> {
        let finite = [extent.x0, extent.y0, extent.x1, extent.y1]
            .iter()
            .all(|v| v.is_finite());
        if !finite || is_infinite(extent) || extent.width() < 0.0 || extent.height() < 0.0 {
            return Err(FirtreeError::invalid_graph(format!(
                "canvas extent {extent:?} must be finite and non-negative"
            )));
        }
        let width = grid_len(extent.width(), extent)?;
        let height = grid_len(extent.height(), extent)?;
        let pixels = PixelStore::try_filled(width, height, [0.0; 4])?;
        Ok(Self {
            inner: Arc::new(CanvasInner {
                extent,
                opts,
                writer: Mutex::new(()),
                pixels: RwLock::new(Arc::new(pixels)),
            }),
        })
    }

    /// Region covered by the canvas.
    pub fn extent(&self) -> Rect {
        self.inner.extent
    }

    /// Pixel columns.
    pub fn width(&self) -> u32 {
        self.snapshot().width
    }

    /// Pixel rows.
    pub fn height(&self) -> u32 {
        self.snapshot().height
    }

    /// Fill every pixel with the premultiplied color `(r, g, b, a)`.
    pub fn clear(&self, r: f32, g: f32, b: f32, a: f32) {
        let _guard = self.lock_writer();
        let (w, h) = {
            let store = self.snapshot();
            (store.width, store.height)
        };
        self.commit(PixelStore::filled(w, h, [r, g, b, a]));
    }

    /// Composite `src` over the canvas, aligned with the canvas extent.
    pub fn render_image(&self, src: &Sampler) -> FirtreeResult<()> {
        self.render_with_origin(src, Point::ORIGIN)
    }

    /// Composite `src` over the canvas with `src`'s origin placed at `origin`.
    ///
    /// Canvas pixel centers `c` read `src` at `c - origin`. Fails without modifying the canvas
    /// when the graph cannot be evaluated.
    #[tracing::instrument(skip(self, src), fields(extent = ?self.inner.extent))]
    pub fn render_with_origin(&self, src: &Sampler, origin: Point) -> FirtreeResult<()> {
        let _guard = self.lock_writer();
        let opts = &self.inner.opts;
        let current = self.snapshot();
        let x0 = self.inner.extent.x0;
        let y0 = self.inner.extent.y0;
        let texels = on_eval_stack(opts, || {
            let plan = GraphPlan::for_sampler(src, opts).inspect_err(|err| {
                tracing::warn!(error = %err, "refusing to composite invalid graph");
            })?;
            let eval = Evaluator::new(&plan, opts);

            let mut texels = Vec::with_capacity(current.texels.len());
            for row in 0..current.height {
                for col in 0..current.width {
                    let c = Point::new(x0 + f64::from(col) + 0.5, y0 + f64::from(row) + 0.5);
                    let src_color = eval.eval_root(c - origin.to_vec2())?;
                    let dst = current.texels[row as usize * current.width as usize + col as usize];
                    texels.push(over(src_color, dst));
                }
            }
            Ok(texels)
        })?;
        self.commit(PixelStore::new(current.width, current.height, texels)?);
        Ok(())
    }

    /// Current contents as a leaf sampler positioned at the canvas extent.
    pub fn image(&self) -> Sampler {
        Sampler::from_canvas(self.clone())
    }

    /// Copy the current contents into `out`, laid out per `desc`.
    ///
    /// `desc` must match the canvas pixel grid.
    pub fn read_pixels(&self, out: &mut [u8], desc: BufferDesc) -> FirtreeResult<()> {
        let store = self.snapshot();
        if desc.width != store.width || desc.height != store.height {
            return Err(FirtreeError::format(format!(
                "canvas is {}x{} but the buffer describes {}x{}",
                store.width, store.height, desc.width, desc.height
            )));
        }
        desc.encode(&store.texels, out)
    }

    /// Premultiplied color of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let store = self.snapshot();
        (x < store.width && y < store.height)
            .then(|| store.texels[y as usize * store.width as usize + x as usize])
    }

    pub(crate) fn snapshot(&self) -> Arc<PixelStore> {
        let guard = self
            .inner
            .pixels
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    fn commit(&self, store: PixelStore) {
        let mut guard = self
            .inner
            .pixels
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(store);
    }

    fn lock_writer(&self) -> std::sync::MutexGuard<'_, ()> {
        self.inner
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for AccumulationCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccumulationCanvas")
            .field("extent", &self.inner.extent)
            .finish_non_exhaustive()
    }
}

/// Pixel count covering `len` units of `extent`, rounded up.
fn grid_len(len: f64, extent: Rect) -> FirtreeResult<u32> {
    let n = len.ceil();
    if n > f64::from(u32::MAX) {
        return Err(FirtreeError::invalid_graph(format!(
            "canvas extent {extent:?} is too large"
        )));
    }
    Ok(n as u32)
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
