pub mod camera;
pub mod config;
pub mod entity;
pub mod error;

pub use camera::*;
pub use config::Config;
pub use entity::*;
pub use error::*;
