use std::fmt;
use std::str::FromStr;

use crate::foundation::core::Rgba;
use crate::foundation::error::{FirtreeError, FirtreeResult};
use crate::foundation::math::{premultiply, u8_to_unit, unit_to_u8, unpremultiply};

/// Packed pixel layouts accepted by buffer samplers and the renderer.
///
/// Names list channels in memory byte order: `ARGB32` stores alpha in byte 0. `X` bytes are
/// ignored on read and written as `0xff`. Formats without `_PREMULTIPLIED` hold straight
/// (unassociated) alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PixelFormat {
    /// 3 bytes: red, green, blue.
    #[serde(rename = "RGB24")]
    Rgb24,
    /// 3 bytes: blue, green, red.
    #[serde(rename = "BGR24")]
    Bgr24,
    /// 4 bytes: red, green, blue, ignored.
    #[serde(rename = "RGBX32")]
    Rgbx32,
    /// 4 bytes: ignored, blue, green, red.
    #[serde(rename = "XBGR32")]
    Xbgr32,
    /// 4 bytes: ignored, red, green, blue.
    #[serde(rename = "XRGB32")]
    Xrgb32,
    /// 4 bytes: blue, green, red, ignored.
    #[serde(rename = "BGRX32")]
    Bgrx32,
    /// 4 bytes: alpha, red, green, blue (straight).
    #[serde(rename = "ARGB32")]
    Argb32,
    /// 4 bytes: alpha, red, green, blue (premultiplied).
    #[serde(rename = "ARGB32_PREMULTIPLIED")]
    Argb32Premultiplied,
    /// 4 bytes: red, green, blue, alpha (straight).
    #[serde(rename = "RGBA32")]
    Rgba32,
    /// 4 bytes: red, green, blue, alpha (premultiplied).
    #[serde(rename = "RGBA32_PREMULTIPLIED")]
    Rgba32Premultiplied,
    /// 4 bytes: alpha, blue, green, red (straight).
    #[serde(rename = "ABGR32")]
    Abgr32,
    /// 4 bytes: alpha, blue, green, red (premultiplied).
    #[serde(rename = "ABGR32_PREMULTIPLIED")]
    Abgr32Premultiplied,
    /// 4 bytes: blue, green, red, alpha (straight).
    #[serde(rename = "BGRA32")]
    Bgra32,
    /// 4 bytes: blue, green, red, alpha (premultiplied).
    #[serde(rename = "BGRA32_PREMULTIPLIED")]
    Bgra32Premultiplied,
    /// 16 bytes: red, green, blue, alpha as native-endian `f32`, premultiplied.
    #[serde(rename = "RGBA_F32_PREMULTIPLIED")]
    RgbaF32Premultiplied,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Channel {
    R,
    G,
    B,
    A,
    X,
}

impl PixelFormat {
    /// Every supported format.
    pub const ALL: [PixelFormat; 15] = [
        Self::Rgb24,
        Self::Bgr24,
        Self::Rgbx32,
        Self::Xbgr32,
        Self::Xrgb32,
        Self::Bgrx32,
        Self::Argb32,
        Self::Argb32Premultiplied,
        Self::Rgba32,
        Self::Rgba32Premultiplied,
        Self::Abgr32,
        Self::Abgr32Premultiplied,
        Self::Bgra32,
        Self::Bgra32Premultiplied,
        Self::RgbaF32Premultiplied,
    ];

    /// Canonical upper-case name, e.g. `"ARGB32_PREMULTIPLIED"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Rgb24 => "RGB24",
            Self::Bgr24 => "BGR24",
            Self::Rgbx32 => "RGBX32",
            Self::Xbgr32 => "XBGR32",
            Self::Xrgb32 => "XRGB32",
            Self::Bgrx32 => "BGRX32",
            Self::Argb32 => "ARGB32",
            Self::Argb32Premultiplied => "ARGB32_PREMULTIPLIED",
            Self::Rgba32 => "RGBA32",
            Self::Rgba32Premultiplied => "RGBA32_PREMULTIPLIED",
            Self::Abgr32 => "ABGR32",
            Self::Abgr32Premultiplied => "ABGR32_PREMULTIPLIED",
            Self::Bgra32 => "BGRA32",
            Self::Bgra32Premultiplied => "BGRA32_PREMULTIPLIED",
            Self::RgbaF32Premultiplied => "RGBA_F32_PREMULTIPLIED",
        }
    }

    /// Size of one pixel in bytes.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb24 | Self::Bgr24 => 3,
            Self::RgbaF32Premultiplied => 16,
            _ => 4,
        }
    }

    /// True when stored color channels are already multiplied by alpha.
    ///
    /// Formats without an alpha channel are opaque, so either convention reads the same.
    pub fn is_premultiplied(self) -> bool {
        matches!(
            self,
            Self::Argb32Premultiplied
                | Self::Rgba32Premultiplied
                | Self::Abgr32Premultiplied
                | Self::Bgra32Premultiplied
                | Self::RgbaF32Premultiplied
        )
    }

    /// False for the 24-bit and `X` formats, which read as opaque.
    pub fn has_alpha(self) -> bool {
        self.channels().contains(&Channel::A)
    }

    fn channels(self) -> &'static [Channel] {
        use Channel::*;
        match self {
            Self::Rgb24 => &[R, G, B],
            Self::Bgr24 => &[B, G, R],
            Self::Rgbx32 => &[R, G, B, X],
            Self::Xbgr32 => &[X, B, G, R],
            Self::Xrgb32 => &[X, R, G, B],
            Self::Bgrx32 => &[B, G, R, X],
            Self::Argb32 | Self::Argb32Premultiplied => &[A, R, G, B],
            Self::Rgba32 | Self::Rgba32Premultiplied | Self::RgbaF32Premultiplied => &[R, G, B, A],
            Self::Abgr32 | Self::Abgr32Premultiplied => &[A, B, G, R],
            Self::Bgra32 | Self::Bgra32Premultiplied => &[B, G, R, A],
        }
    }

    /// Read one pixel (exactly [`bytes_per_pixel`](Self::bytes_per_pixel) bytes) as premultiplied RGBA.
    pub fn decode_pixel(self, px: &[u8]) -> Rgba {
        if self == Self::RgbaF32Premultiplied {
            let mut out = [0.0f32; 4];
            for (i, chunk) in px.chunks_exact(4).take(4).enumerate() {
                out[i] = f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            }
            return out;
        }

        let mut c = [0.0, 0.0, 0.0, 1.0];
        for (ch, &byte) in self.channels().iter().zip(px) {
            let v = u8_to_unit(byte);
            match ch {
                Channel::R => c[0] = v,
                Channel::G => c[1] = v,
                Channel::B => c[2] = v,
                Channel::A => c[3] = v,
                Channel::X => {}
            }
        }
        if self.is_premultiplied() { c } else { premultiply(c) }
    }

    /// Write premultiplied `c` into `out` (exactly [`bytes_per_pixel`](Self::bytes_per_pixel) bytes).
    pub fn encode_pixel(self, c: Rgba, out: &mut [u8]) {
        if self == Self::RgbaF32Premultiplied {
            for (chunk, v) in out.chunks_exact_mut(4).zip(c) {
                chunk.copy_from_slice(&v.to_ne_bytes());
            }
            return;
        }

        let c = if self.is_premultiplied() {
            c
        } else {
            unpremultiply(c)
        };
        for (ch, byte) in self.channels().iter().zip(out.iter_mut()) {
            *byte = match ch {
                Channel::R => unit_to_u8(c[0]),
                Channel::G => unit_to_u8(c[1]),
                Channel::B => unit_to_u8(c[2]),
                Channel::A => unit_to_u8(c[3]),
                Channel::X => 0xff,
            };
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = FirtreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FirtreeError::format(format!("unknown pixel format '{s}'")))
    }
}

/// Geometry and layout of a caller-owned pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BufferDesc {
    /// Pixels per row.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Bytes between the starts of consecutive rows.
    pub stride: usize,
    /// Layout of each pixel.
    pub format: PixelFormat,
}

impl BufferDesc {
    /// Description with an explicit row stride.
    pub fn new(width: u32, height: u32, stride: usize, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            stride,
            format,
        }
    }

    /// Description with rows packed back to back.
    pub fn packed(width: u32, height: u32, format: PixelFormat) -> Self {
        Self::new(width, height, width as usize * format.bytes_per_pixel(), format)
    }

    /// Bytes one row of pixels occupies, excluding padding.
    pub fn row_bytes(&self) -> FirtreeResult<usize> {
        (self.width as usize)
            .checked_mul(self.format.bytes_per_pixel())
            .ok_or_else(|| FirtreeError::format("row size overflows"))
    }

    /// Minimum buffer length that holds every described pixel.
    pub fn required_len(&self) -> FirtreeResult<usize> {
        let row = self.row_bytes()?;
        if self.height == 0 || row == 0 {
            return Ok(0);
        }
        (self.height as usize - 1)
            .checked_mul(self.stride)
            .and_then(|n| n.checked_add(row))
            .ok_or_else(|| FirtreeError::format("buffer size overflows"))
    }

    /// Check that a buffer of `len` bytes matches this description.
    pub fn validate(&self, len: usize) -> FirtreeResult<()> {
        let row = self.row_bytes()?;
        if self.height > 1 && self.stride < row {
            return Err(FirtreeError::format(format!(
                "stride {} is smaller than a row of {} {} pixels ({row} bytes)",
                self.stride, self.width, self.format
            )));
        }
        let need = self.required_len()?;
        if len < need {
            return Err(FirtreeError::format(format!(
                "buffer holds {len} bytes but {}x{} {} with stride {} needs {need}",
                self.width, self.height, self.format, self.stride
            )));
        }
        Ok(())
    }

    /// Unpack `data` into premultiplied texels, row-major.
    pub(crate) fn decode(&self, data: &[u8]) -> FirtreeResult<Vec<Rgba>> {
        self.validate(data.len())?;
        let bpp = self.format.bytes_per_pixel();
        let row = self.row_bytes()?;
        let mut texels = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height as usize {
            let start = y * self.stride;
            let line = &data[start..start + row];
            texels.extend(line.chunks_exact(bpp).map(|px| self.format.decode_pixel(px)));
        }
        Ok(texels)
    }

    /// Pack row-major premultiplied texels into `out`. Padding bytes are left untouched.
    pub(crate) fn encode(&self, texels: &[Rgba], out: &mut [u8]) -> FirtreeResult<()> {
        self.validate(out.len())?;
        let w = self.width as usize;
        if texels.len() != w * self.height as usize {
            return Err(FirtreeError::format(format!(
                "expected {} texels, got {}",
                w * self.height as usize,
                texels.len()
            )));
        }
        let bpp = self.format.bytes_per_pixel();
        let row = self.row_bytes()?;
        for (y, src) in texels.chunks_exact(w.max(1)).enumerate().take(self.height as usize) {
            let start = y * self.stride;
            let line = &mut out[start..start + row];
            for (px, &c) in line.chunks_exact_mut(bpp).zip(src) {
                self.format.encode_pixel(c, px);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/format.rs"]
mod tests;
