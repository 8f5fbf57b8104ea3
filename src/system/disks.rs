use std::path::Path;

use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use sysinfo::Disks;

use super::snapshot::UsagePair;

/// Answers "how full is the filesystem holding this path".
pub trait UsageProbe {
    fn usage(&self, path: &Path) -> Result<UsagePair>;
}

/// Filesystem usage from the mounted disk list.
#[derive(Clone, Copy, Debug, Default)]
pub struct SysinfoDisks;

impl UsageProbe for SysinfoDisks {
    fn usage(&self, path: &Path) -> Result<UsagePair> {
        let target = path
            .canonicalize()
            .wrap_err_with(|| format!("unable to resolve {}", path.display()))?;
        let disks = Disks::new_with_refreshed_list();

        // The innermost mount point wins, so "/home/x" maps to "/home" over "/"
        let disk = disks
            .list()
            .iter()
            .filter(|disk| target.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .ok_or_else(|| eyre!("no mounted filesystem contains {}", path.display()))?;

        Ok(UsagePair {
            free: disk.available_space() as f64,
            total: disk.total_space() as f64,
        })
    }
}

/// A probe answering with fixed readings, or failing when none is set.
#[derive(Clone, Debug, Default)]
pub struct StaticUsage {
    pub reading: Option<UsagePair>,
}

impl UsageProbe for StaticUsage {
    fn usage(&self, path: &Path) -> Result<UsagePair> {
        self.reading
            .ok_or_else(|| eyre!("unable to probe {}", path.display()))
    }
}
