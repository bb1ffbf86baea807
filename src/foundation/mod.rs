/// Geometry re-exports and extent helpers.
pub mod core;
/// Error taxonomy shared by every engine API.
pub mod error;
/// Small numeric helpers for color math.
pub(crate) mod math;
