/// 2D affine transforms attached to sampler nodes.
pub mod affine;
