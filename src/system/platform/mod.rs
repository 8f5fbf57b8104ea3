pub trait PlatformExtensions {
    /// Size of a virtual memory page in bytes.
    fn page_size() -> u64;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(target_os = "linux"))]
mod fallback;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(not(target_os = "linux"))]
use fallback as platform_impl;

pub fn page_size() -> u64 {
    platform_impl::Platform::page_size()
}
