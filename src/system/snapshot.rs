use std::time::Instant;

use crate::format::{Directives, format_number, format_percent};

/// A two-directional counter, e.g. bytes received and sent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CounterPair {
    pub input: f64,
    pub output: f64,
}

/// A capacity reading: how much of `total` is still free.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UsagePair {
    pub free: f64,
    pub total: f64,
}

/// Cumulative cpu time counters from a `/proc/stat` cpu line.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CpuCounters {
    pub user: f64,
    pub nice: f64,
    pub kernel: f64,
    pub idle: f64,
}

/// The persisted sample of one monitor. Both slots of a sample window always
/// hold the same variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Snapshot {
    Counter(CounterPair),
    Usage(UsagePair),
    Cpu(CpuCounters),
}

impl Snapshot {
    pub fn counter(&self) -> Option<CounterPair> {
        match self {
            Snapshot::Counter(pair) => Some(*pair),
            _ => None,
        }
    }

    pub fn usage(&self) -> Option<UsagePair> {
        match self {
            Snapshot::Usage(pair) => Some(*pair),
            _ => None,
        }
    }

    pub fn cpu(&self) -> Option<CpuCounters> {
        match self {
            Snapshot::Cpu(counters) => Some(*counters),
            _ => None,
        }
    }
}

/// Rate of change per second between two readings.
///
/// A zero elapsed time yields `0.0` rather than an infinite rate.
pub fn speed(now: f64, before: f64, t_now: Instant, t_before: Instant) -> f64 {
    let elapsed = t_now.saturating_duration_since(t_before).as_secs_f64();
    if elapsed == 0.0 {
        return 0.0;
    }
    (now - before) / elapsed
}

impl CounterPair {
    pub fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }

    pub fn total(&self) -> f64 {
        self.input + self.output
    }

    /// Per-second rates of both halves between `before` and `self`.
    pub fn speed_since(&self, before: &CounterPair, t_now: Instant, t_before: Instant) -> Self {
        Self {
            input: speed(self.input, before.input, t_now, t_before),
            output: speed(self.output, before.output, t_now, t_before),
        }
    }
}

impl UsagePair {
    pub fn used(&self) -> f64 {
        self.total - self.free
    }

    /// Used share of the total in percent; an empty total reads as 0%.
    pub fn used_percent(&self) -> f64 {
        Self::percent(self.used(), self.total)
    }

    pub fn free_percent(&self) -> f64 {
        Self::percent(self.free, self.total)
    }

    fn percent(part: f64, total: f64) -> f64 {
        if total <= 0.0 {
            0.0
        } else {
            100.0 * part / total
        }
    }
}

impl CpuCounters {
    /// Busy percentage over the interval from `before` to `self`.
    pub fn utilization_since(&self, before: &CpuCounters) -> f64 {
        let user = self.user - before.user;
        let nice = self.nice - before.nice;
        let kernel = self.kernel - before.kernel;
        let idle = self.idle - before.idle;
        let total = user + nice + kernel + idle;
        if total == 0.0 {
            return 0.0;
        }
        100.0 * (1.0 - idle / total)
    }
}

impl Directives for CounterPair {
    fn directive(&self, ch: char) -> Option<String> {
        match ch {
            'i' => Some(format_number(self.input)),
            'o' => Some(format_number(self.output)),
            't' => Some(format_number(self.total())),
            _ => None,
        }
    }
}

impl Directives for UsagePair {
    fn directive(&self, ch: char) -> Option<String> {
        match ch {
            'f' => Some(format_number(self.free)),
            'F' => Some(format_percent(self.free_percent())),
            'u' => Some(format_number(self.used())),
            'U' => Some(format_percent(self.used_percent())),
            't' => Some(format_number(self.total)),
            _ => None,
        }
    }
}
