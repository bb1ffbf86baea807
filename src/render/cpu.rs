use crate::foundation::core::{Point, Rect, Rgba};
use crate::foundation::error::{FirtreeError, FirtreeResult};
use crate::render::eval::Evaluator;
use crate::render::format::BufferDesc;
use crate::render::opts::RenderOpts;
use crate::render::plan::GraphPlan;
use crate::render::stack::on_eval_stack;
use crate::render::surface::Surface;
use crate::sampler::Sampler;

/// Renders a sampler graph into pixel buffers on the CPU.
///
/// The renderer maps `rect` in the root sampler's space onto the output grid and evaluates
/// one color per pixel at the pixel center. A render either writes every pixel or fails
/// without touching the output.
#[derive(Clone, Debug, Default)]
pub struct CpuRenderer {
    sampler: Sampler,
    opts: RenderOpts,
}

impl CpuRenderer {
    /// Renderer for `sampler` with default options.
    pub fn new(sampler: Sampler) -> Self {
        Self::with_opts(sampler, RenderOpts::default())
    }

    /// Renderer for `sampler` with explicit options.
    pub fn with_opts(sampler: Sampler, opts: RenderOpts) -> Self {
        Self { sampler, opts }
    }

    /// The root sampler.
    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Replace the root sampler.
    pub fn set_sampler(&mut self, sampler: Sampler) {
        self.sampler = sampler;
    }

    /// Active options.
    pub fn opts(&self) -> &RenderOpts {
        &self.opts
    }

    /// Render `rect` into a caller-owned buffer described by `desc`.
    #[tracing::instrument(skip(self, out), fields(w = desc.width, h = desc.height, format = %desc.format))]
    pub fn render_into_buffer(&self, rect: Rect, out: &mut [u8], desc: BufferDesc) -> FirtreeResult<()> {
        desc.validate(out.len())?;
        let texels = render_texels(&self.sampler, rect, desc.width, desc.height, &self.opts)?;
        desc.encode(&texels, out)
    }

    /// Render `rect` into a [`Surface`].
    pub fn render_into_surface(&self, rect: Rect, surface: &mut dyn Surface) -> FirtreeResult<()> {
        let desc = surface.desc();
        self.render_into_buffer(rect, surface.data_mut(), desc)
    }

    /// Render `rect` into a new straight-alpha RGBA8 image.
    pub fn render_to_image(&self, rect: Rect, width: u32, height: u32) -> FirtreeResult<image::RgbaImage> {
        let mut img = image::RgbaImage::new(width, height);
        self.render_into_surface(rect, &mut img)?;
        Ok(img)
    }
}

/// Render `rect` of `sampler` into `out` with default options.
pub fn render_into_buffer(
    sampler: &Sampler,
    rect: Rect,
    out: &mut [u8],
    desc: BufferDesc,
) -> FirtreeResult<()> {
    CpuRenderer::new(sampler.clone()).render_into_buffer(rect, out, desc)
}

/// Premultiplied colors for a `width` x `height` grid over `rect`, row-major.
pub(crate) fn render_texels(
    sampler: &Sampler,
    rect: Rect,
    width: u32,
    height: u32,
    opts: &RenderOpts,
) -> FirtreeResult<Vec<Rgba>> {
    if ![rect.x0, rect.y0, rect.x1, rect.y1].iter().all(|v| v.is_finite()) {
        return Err(FirtreeError::format(format!("render rectangle {rect:?} is not finite")));
    }
    on_eval_stack(opts, || {
        let plan = GraphPlan::for_sampler(sampler, opts).inspect_err(|err| {
            tracing::warn!(error = %err, "refusing to render invalid graph");
        })?;
        let eval = Evaluator::new(&plan, opts);

        let mut texels = Vec::with_capacity(width as usize * height as usize);
        for row in 0..height {
            for col in 0..width {
                let p = pixel_center(rect, col, row, width, height);
                texels.push(eval.eval_root(p)?);
            }
        }
        Ok(texels)
    })
}

/// Center of output pixel `(col, row)` in the coordinate space of `rect`.
pub(crate) fn pixel_center(rect: Rect, col: u32, row: u32, width: u32, height: u32) -> Point {
    let sx = (rect.x1 - rect.x0) / f64::from(width.max(1));
    let sy = (rect.y1 - rect.y0) / f64::from(height.max(1));
    Point::new(
        rect.x0 + (f64::from(col) + 0.5) * sx,
        rect.y0 + (f64::from(row) + 0.5) * sy,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
