use anyhow::Context;

use crate::foundation::error::FirtreeResult;
use crate::render::format::{BufferDesc, PixelFormat};
use crate::sampler::buffer::BufferSampler;

/// Decode an encoded image (PNG, JPEG, ...) into a leaf sampler.
///
/// The decoded pixels are straight-alpha RGBA8 and are premultiplied on load.
pub fn decode_image(bytes: &[u8]) -> FirtreeResult<BufferSampler> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    BufferSampler::new(rgba.as_raw(), BufferDesc::packed(width, height, PixelFormat::Rgba32))
}

/// Read and decode an image file.
pub fn load_image(path: impl AsRef<std::path::Path>) -> FirtreeResult<BufferSampler> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
