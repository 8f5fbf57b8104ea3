use super::PlatformExtensions;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn page_size() -> u64 {
        4096
    }
}
