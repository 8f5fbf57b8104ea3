use super::PlatformExtensions;

pub struct Platform;

const DEFAULT_PAGE_SIZE: u64 = 4096;

impl PlatformExtensions for Platform {
    fn page_size() -> u64 {
        // Sysconf returns -1 when the limit is indeterminate
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        u64::try_from(size)
            .ok()
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }
}
