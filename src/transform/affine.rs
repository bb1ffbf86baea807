//! 2D affine transforms.
//!
//! Elements follow `(m11, m12, m21, m22, tx, ty)`:
//!
//! ```text
//! x' = m11 * x + m12 * y + tx
//! y' = m21 * x + m22 * y + ty
//! ```
//!
//! Composition is expressed relative to the transform being edited: *appending* applies the
//! other transform after this one, *prepending* applies it before.

use crate::foundation::core::{Affine, Point, Size};
use crate::foundation::error::{FirtreeError, FirtreeResult};

/// An invertible-or-not 2D affine transform backed by [`kurbo::Affine`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AffineTransform(Affine);

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    /// The identity transform.
    pub fn identity() -> Self {
        Self(Affine::IDENTITY)
    }

    /// Build from `(m11, m12, m21, m22, tx, ty)`.
    pub fn from_elements(m11: f64, m12: f64, m21: f64, m22: f64, tx: f64, ty: f64) -> Self {
        Self(Affine::new([m11, m21, m12, m22, tx, ty]))
    }

    /// `(m11, m12, m21, m22, tx, ty)`.
    pub fn elements(&self) -> [f64; 6] {
        let [a, b, c, d, e, f] = self.0.as_coeffs();
        [a, c, b, d, e, f]
    }

    /// Underlying kurbo matrix.
    pub fn to_affine(self) -> Affine {
        self.0
    }

    /// Wrap a kurbo matrix.
    pub fn from_affine(a: Affine) -> Self {
        Self(a)
    }

    /// Apply `other` after this transform.
    pub fn append(&mut self, other: &AffineTransform) -> &mut Self {
        self.0 = other.0 * self.0;
        self
    }

    /// Apply `other` before this transform.
    pub fn prepend(&mut self, other: &AffineTransform) -> &mut Self {
        self.0 = self.0 * other.0;
        self
    }

    /// Append a non-uniform scale.
    pub fn scale(&mut self, sx: f64, sy: f64) -> &mut Self {
        self.0 = Affine::scale_non_uniform(sx, sy) * self.0;
        self
    }

    /// Append a translation.
    pub fn translate(&mut self, tx: f64, ty: f64) -> &mut Self {
        self.0 = Affine::translate((tx, ty)) * self.0;
        self
    }

    /// Append a counter-clockwise rotation (y axis up).
    pub fn rotate_by_radians(&mut self, theta: f64) -> &mut Self {
        self.0 = Affine::rotate(theta) * self.0;
        self
    }

    /// Append a rotation given in degrees.
    pub fn rotate_by_degrees(&mut self, degrees: f64) -> &mut Self {
        self.rotate_by_radians(degrees.to_radians())
    }

    /// `m11 * m22 - m12 * m21`.
    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }

    /// True when the linear part cannot be inverted reliably.
    pub fn is_singular(&self) -> bool {
        let [m11, m12, m21, m22, _, _] = self.elements();
        let det = self.determinant();
        let scale = m11 * m11 + m12 * m12 + m21 * m21 + m22 * m22;
        !det.is_finite() || scale == 0.0 || det.abs() <= f64::EPSILON * scale
    }

    /// The inverse transform, or [`FirtreeError::SingularTransform`].
    pub fn inverse(&self) -> FirtreeResult<Self> {
        if self.is_singular() {
            return Err(FirtreeError::singular_transform(format!(
                "determinant {} of {:?}",
                self.determinant(),
                self.elements()
            )));
        }
        let [m11, m12, m21, m22, tx, ty] = self.elements();
        let d = self.determinant();
        Ok(Self::from_elements(
            m22 / d,
            -m12 / d,
            -m21 / d,
            m11 / d,
            (m12 * ty - m22 * tx) / d,
            (m21 * tx - m11 * ty) / d,
        ))
    }

    /// Invert in place. A singular transform is left unchanged.
    pub fn invert(&mut self) -> FirtreeResult<&mut Self> {
        *self = self.inverse()?;
        Ok(self)
    }

    /// Exact comparison with the identity.
    pub fn is_identity(&self) -> bool {
        self.0 == Affine::IDENTITY
    }

    /// Map a point, including translation.
    pub fn transform_point(&self, p: Point) -> Point {
        self.0 * p
    }

    /// Map a size (linear part only).
    pub fn transform_size(&self, s: Size) -> Size {
        let [m11, m12, m21, m22, _, _] = self.elements();
        Size::new(
            m11 * s.width + m12 * s.height,
            m21 * s.width + m22 * s.height,
        )
    }
}

impl From<Affine> for AffineTransform {
    fn from(a: Affine) -> Self {
        Self(a)
    }
}

impl From<AffineTransform> for Affine {
    fn from(t: AffineTransform) -> Self {
        t.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transform/affine.rs"]
mod tests;
