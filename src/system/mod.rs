//! Kernel counter sources and the sample types built from them.

pub mod disks;
pub mod platform;
pub mod procfs;
pub mod snapshot;
