pub mod slim;

pub use slim::*;
