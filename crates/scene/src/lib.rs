pub mod camera;
pub mod components;
pub mod entity;
pub mod host;
pub mod input;
pub mod picking;
pub mod world;

pub use world::*;
