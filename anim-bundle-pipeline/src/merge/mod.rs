pub mod clip;
pub mod export;
pub mod job;
pub mod report;


pub use clip::*;
pub use export::*;
pub use job::*;
pub use report::*;
