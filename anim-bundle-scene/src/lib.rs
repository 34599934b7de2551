pub mod animation;
pub mod arena;
pub mod armature;
pub mod image;
pub mod material;
pub mod mesh;
pub mod object;
pub mod scene;
pub mod texture;
pub mod transform;

pub use arena::{Arena, Id, Named};
pub use scene::{DataBlock, DataKind, Scene};
