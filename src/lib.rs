pub mod color;
pub mod config;
pub mod format;
pub mod logging;
pub mod monitor;
pub mod overlay;
pub mod sampler;
pub mod system;
pub mod visibility;
