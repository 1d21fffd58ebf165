pub mod camera;
pub mod config;
pub mod detect;
pub mod frame;
pub mod geometry;
pub mod source;
pub mod stages;
pub mod system;
pub mod viz;
