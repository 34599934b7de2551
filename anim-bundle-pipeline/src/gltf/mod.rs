pub mod export;
pub mod import;
pub mod uri;

pub use export::*;
pub use import::*;
pub use uri::*;

/// Name of the node group holding a material's occlusion input, as Blender's glTF add-on names it.
pub const OCCLUSION_GROUP: &str = "glTF Material Output";
