use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "osdmon.jsonl";

/// Where logs go when `--log-file` is not given: the user's state directory,
/// or the local data directory on platforms without one.
pub fn default_log_file() -> Option<PathBuf> {
    log_file_in(dirs::state_dir().or_else(dirs::data_local_dir))
}

fn log_file_in(base: Option<PathBuf>) -> Option<PathBuf> {
    base.map(|dir| dir.join("osdmon").join(LOG_FILE_NAME))
}

/// Installs the global subscriber writing JSON lines to `log_file`, or to the
/// default log file when `None`. Nothing is ever written to the terminal,
/// which belongs to the overlay. Without any usable location events are
/// discarded.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init(level: &str, log_file: Option<&Path>) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level `{level}`"))?;

    let destination = log_file.map(Path::to_path_buf).or_else(default_log_file);
    let installed = match &destination {
        Some(path) => {
            let file = open_log(path)?;
            tracing_subscriber::fmt()
                .with_ansi(false)
                .json()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_ansi(false)
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .try_init(),
    };

    installed.map_err(|e| eyre!("failed to set tracing subscriber: {e}"))?;
    Ok(destination)
}

fn open_log(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }
    File::options()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("failed to open log file {}", path.display()))
}
