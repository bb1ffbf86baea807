use crate::render::format::{BufferDesc, PixelFormat};

/// A host-owned pixel buffer the renderer can write into.
pub trait Surface {
    /// Geometry and layout of [`data_mut`](Self::data_mut).
    fn desc(&self) -> BufferDesc;
    /// Backing bytes, at least `desc().required_len()` long.
    fn data_mut(&mut self) -> &mut [u8];
}

/// An owned, packed surface.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageSurface {
    desc: BufferDesc,
    data: Vec<u8>,
}

impl ImageSurface {
    /// Zero-filled surface with packed rows.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let desc = BufferDesc::packed(width, height, format);
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            desc,
            data: vec![0; len],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.desc.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.desc.height
    }

    /// Pixel layout.
    pub fn format(&self) -> PixelFormat {
        self.desc.format
    }

    /// Packed bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.desc.width || y >= self.desc.height {
            return None;
        }
        let bpp = self.desc.format.bytes_per_pixel();
        let start = y as usize * self.desc.stride + x as usize * bpp;
        self.data.get(start..start + bpp)
    }

    /// Take the packed bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl Surface for ImageSurface {
    fn desc(&self) -> BufferDesc {
        self.desc
    }

    fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Straight-alpha RGBA8, as produced and consumed by the `image` crate.
impl Surface for image::RgbaImage {
    fn desc(&self) -> BufferDesc {
        BufferDesc::packed(self.width(), self.height(), PixelFormat::Rgba32)
    }

    fn data_mut(&mut self) -> &mut [u8] {
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
