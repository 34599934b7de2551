pub mod downscale;
pub mod encode;

pub use downscale::*;
pub use encode::*;
