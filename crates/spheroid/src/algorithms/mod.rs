pub mod preprocessing;
pub mod extraction;
pub mod color;

pub use preprocessing::*;
pub use extraction::*;
pub use color::{background_mask, invert_mask, luma, rgb_to_hsv, to_gray};
