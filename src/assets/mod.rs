/// Image codec adapter producing leaf samplers.
pub mod decode;

pub use decode::{decode_image, load_image};
