use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use tracing::warn;

pub const PROC_STAT: &str = "/proc/stat";
pub const PROC_MEMINFO: &str = "/proc/meminfo";
pub const PROC_VMSTAT: &str = "/proc/vmstat";
pub const PROC_DISKSTATS: &str = "/proc/diskstats";
pub const PROC_NET_DEV: &str = "/proc/net/dev";

/// A source of kernel counter files.
pub trait ProcSource {
    /// Opens the file at `path` for line-oriented reading.
    fn open(&self, path: &Path) -> io::Result<impl BufRead>;
}

/// Counter files read from the real filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcFs;

impl ProcSource for ProcFs {
    fn open(&self, path: &Path) -> io::Result<impl BufRead> {
        File::open(path).map(BufReader::new)
    }
}

/// An in-memory stand-in for `/proc`.
///
/// Each path holds a queue of file contents. Every open consumes the front of
/// the queue, except the final entry, which is returned for all later opens.
#[derive(Debug, Default)]
pub struct MockProcFs {
    files: RefCell<HashMap<PathBuf, VecDeque<String>>>,
}

impl MockProcFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `contents` as the next version of `path`.
    pub fn push(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files
            .borrow_mut()
            .entry(path.into())
            .or_default()
            .push_back(contents.into());
    }

    pub fn with(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.push(path, contents);
        self
    }
}

impl ProcSource for MockProcFs {
    fn open(&self, path: &Path) -> io::Result<impl BufRead> {
        let mut files = self.files.borrow_mut();
        let queue = files
            .get_mut(path)
            .filter(|queue| !queue.is_empty())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))?;
        let contents = if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        };
        Ok(Cursor::new(contents))
    }
}

/// Where a column of a matched line should be stored.
///
/// Column `0` is the first token of the line.
#[derive(Debug)]
pub struct ColumnSlot<'a> {
    pub column: usize,
    pub value: &'a mut f64,
}

impl<'a> ColumnSlot<'a> {
    pub fn new(column: usize, value: &'a mut f64) -> Self {
        Self { column, value }
    }
}

/// Where the value following `key` should be stored.
#[derive(Debug)]
pub struct KeySlot<'a> {
    pub key: &'a str,
    pub value: &'a mut f64,
}

impl<'a> KeySlot<'a> {
    pub fn new(key: &'a str, value: &'a mut f64) -> Self {
        Self { key, value }
    }
}

/// Reads numeric columns from the first line of `path` containing `pattern`.
///
/// Lines are split on whitespace and colons, which covers `/proc/net/dev`'s
/// `eth0:123` layout. `slots` must be sorted by column. Failing to open the
/// file is an error; a missing line or column is logged and leaves the
/// remaining slots untouched. Returns whether every slot was filled.
pub fn read_columns<S: ProcSource>(
    source: &S,
    path: &str,
    pattern: &str,
    slots: &mut [ColumnSlot<'_>],
) -> Result<bool> {
    debug_assert!(
        slots.windows(2).all(|w| w[0].column <= w[1].column),
        "column slots must be sorted"
    );

    let reader = source
        .open(Path::new(path))
        .wrap_err_with(|| format!("unable to open {path}"))?;

    for line in lossy_lines(reader) {
        let line = line.wrap_err_with(|| format!("unable to read {path}"))?;
        if !line.contains(pattern) {
            continue;
        }

        let tokens: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == ':')
            .filter(|t| !t.is_empty())
            .collect();
        for slot in slots.iter_mut() {
            let Some(token) = tokens.get(slot.column) else {
                warn!(path, pattern, column = slot.column, "not enough columns");
                return Ok(false);
            };
            *slot.value = parse_counter(token, path);
        }
        return Ok(true);
    }

    warn!(path, pattern, "line not found");
    Ok(false)
}

/// Reads `key value` lines from `path`, keys in the order they appear.
///
/// The file is scanned once: each key is searched for starting after the
/// line that matched the previous key. A line matches when its first token
/// equals the key. Returns whether every key was found.
pub fn read_lines<S: ProcSource>(source: &S, path: &str, slots: &mut [KeySlot<'_>]) -> Result<bool> {
    let reader = source
        .open(Path::new(path))
        .wrap_err_with(|| format!("unable to open {path}"))?;
    let mut lines = lossy_lines(reader);

    'slots: for slot in slots.iter_mut() {
        for line in lines.by_ref() {
            let line = line.wrap_err_with(|| format!("unable to read {path}"))?;
            let mut tokens = line.split_whitespace();
            if tokens.next() != Some(slot.key) {
                continue;
            }
            match tokens.next() {
                Some(token) => *slot.value = parse_counter(token, path),
                None => warn!(path, key = slot.key, "key has no value"),
            }
            continue 'slots;
        }
        warn!(path, key = slot.key, "not all lines found");
        return Ok(false);
    }

    Ok(true)
}

/// Lines of `reader` with invalid UTF-8 replaced, so an odd interface name
/// cannot hide the lines after it.
fn lossy_lines<R: BufRead>(reader: R) -> impl Iterator<Item = io::Result<String>> {
    reader.split(b'\n').map(|line| {
        line.map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    })
}

fn parse_counter(token: &str, path: &str) -> f64 {
    token.parse().unwrap_or_else(|_| {
        warn!(path, token, "counter is not a number");
        0.0
    })
}
