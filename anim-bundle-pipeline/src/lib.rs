pub mod asset_io;
pub mod config;
pub mod gltf;
pub mod image;
pub mod material;
pub mod merge;
pub mod purge;
