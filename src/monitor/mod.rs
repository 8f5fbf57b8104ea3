//! The catalog of monitors and their allocate / retrieve / render
//! capabilities.

mod render;
mod retrieve;

use std::io::Write;
use std::time::Instant;

use color_eyre::Result;
use serde::Serialize;

use crate::color::LevelColorTable;
use crate::system::disks::{SysinfoDisks, UsageProbe};
use crate::system::procfs::{ProcFs, ProcSource};
use crate::system::snapshot::{CounterPair, CpuCounters, Snapshot, UsagePair};

pub use crate::format::OUTPUT_LIMIT;
pub use render::{Rendered, format_clock};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorKind {
    Clock,
    Cpu,
    Ctxt,
    RunPs,
    Mem,
    Swap,
    SwapAct,
    Disk,
    DiskAct,
    Net,
}

/// Which of the three lifecycle hooks a monitor implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub allocate: bool,
    pub retrieve: bool,
    pub render: bool,
}

impl Capabilities {
    const RENDER_ONLY: Self = Self {
        allocate: false,
        retrieve: false,
        render: true,
    };
    const FULL: Self = Self {
        allocate: true,
        retrieve: true,
        render: true,
    };
}

#[derive(Debug, Serialize)]
pub struct MonitorDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub default_device: Option<&'static str>,
    pub default_format: &'static str,
    pub kind: MonitorKind,
}

pub static CATALOG: [MonitorDescriptor; 10] = [
    MonitorDescriptor {
        name: "clock",
        description: "Simple clock, strftime(3) format",
        default_device: None,
        default_format: "%a %b %e %H:%M:%S %G",
        kind: MonitorKind::Clock,
    },
    MonitorDescriptor {
        name: "cpu",
        description: "Cpu activity monitor",
        default_device: Some("cpu0"),
        default_format: "CPU: %.0f%%",
        kind: MonitorKind::Cpu,
    },
    MonitorDescriptor {
        name: "ctxt",
        description: "Context switches per second monitor",
        default_device: None,
        default_format: "ctxt: %i switches/s",
        kind: MonitorKind::Ctxt,
    },
    MonitorDescriptor {
        name: "runps",
        description: "Processes in the RUNNING state monitor",
        default_device: None,
        default_format: "procs: %.0f",
        kind: MonitorKind::RunPs,
    },
    MonitorDescriptor {
        name: "mem",
        description: "Used memory monitor",
        default_device: None,
        default_format: "Mem: %U%%, %uB/%tB",
        kind: MonitorKind::Mem,
    },
    MonitorDescriptor {
        name: "swap",
        description: "Swap usage monitor",
        default_device: None,
        default_format: "Swap: %U%%, %uB/%tB",
        kind: MonitorKind::Swap,
    },
    MonitorDescriptor {
        name: "swapact",
        description: "Swapping activity monitor",
        default_device: None,
        default_format: "swapact: %tB (%iB in/%oB out)",
        kind: MonitorKind::SwapAct,
    },
    MonitorDescriptor {
        name: "disk",
        description: "Disk usage monitor, the device is any path on the filesystem to report",
        default_device: Some("/"),
        default_format: "Disk: %U%%, %uB/%tB",
        kind: MonitorKind::Disk,
    },
    MonitorDescriptor {
        name: "diskact",
        description: "Disk activity monitor",
        default_device: Some("hda"),
        default_format: "diskact: %tB (%iB in/%oB out)",
        kind: MonitorKind::DiskAct,
    },
    MonitorDescriptor {
        name: "net",
        description: "Network activity monitor",
        default_device: Some("eth0"),
        default_format: "eth0: %tB (%iB in/%oB out)",
        kind: MonitorKind::Net,
    },
];

/// Looks a monitor up by name, ignoring case.
pub fn find(name: &str) -> Option<&'static MonitorDescriptor> {
    CATALOG
        .iter()
        .find(|descriptor| descriptor.name.eq_ignore_ascii_case(name))
}

/// The monitor used when none (or an unknown one) is configured.
pub fn default_monitor() -> &'static MonitorDescriptor {
    &CATALOG[0]
}

/// Per-run monitor parameters, fixed once configuration is resolved.
#[derive(Clone, Debug)]
pub struct MonitorSettings {
    pub device: Option<String>,
    pub format: String,
    /// Color used when no level color applies.
    pub color: String,
    pub level_colors: LevelColorTable,
}

impl MonitorSettings {
    pub fn for_monitor(descriptor: &MonitorDescriptor) -> Self {
        Self {
            device: descriptor.default_device.map(str::to_string),
            format: descriptor.default_format.to_string(),
            color: "green".to_string(),
            level_colors: LevelColorTable::default(),
        }
    }

    pub fn device(&self) -> &str {
        self.device.as_deref().unwrap_or_default()
    }

    pub fn color_for(&self, value: f64) -> String {
        self.level_colors.color_for(value, &self.color).to_string()
    }
}

/// Everything monitors read from the running system.
#[derive(Debug, Default)]
pub struct Probes<P = ProcFs, D = SysinfoDisks> {
    pub proc: P,
    pub disks: D,
}

impl<P: ProcSource, D: UsageProbe> Probes<P, D> {
    pub fn new(proc: P, disks: D) -> Self {
        Self { proc, disks }
    }
}

/// The outcome of refreshing a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retrieval {
    /// The snapshot holds the latest reading, or the last good one if the
    /// source was incomplete.
    Updated,
    /// The source could not be probed; nothing should be rendered this cycle.
    Skipped,
    /// The monitor keeps no snapshot.
    Unsupported,
}

/// The two sides of a sample window, as seen by a render call.
#[derive(Clone, Copy, Debug)]
pub struct SampleView<'a> {
    pub t_now: Instant,
    pub t_before: Instant,
    pub now: Option<&'a Snapshot>,
    pub before: Option<&'a Snapshot>,
}

impl MonitorKind {
    pub fn capabilities(self) -> Capabilities {
        match self {
            MonitorKind::Clock | MonitorKind::RunPs => Capabilities::RENDER_ONLY,
            MonitorKind::Cpu
            | MonitorKind::Ctxt
            | MonitorKind::Mem
            | MonitorKind::Swap
            | MonitorKind::SwapAct
            | MonitorKind::Disk
            | MonitorKind::DiskAct
            | MonitorKind::Net => Capabilities::FULL,
        }
    }

    /// A zeroed snapshot of the shape this monitor keeps, if it keeps one.
    pub fn allocate(self) -> Option<Snapshot> {
        match self {
            MonitorKind::Clock | MonitorKind::RunPs => None,
            MonitorKind::Cpu => Some(Snapshot::Cpu(CpuCounters::default())),
            MonitorKind::Ctxt | MonitorKind::SwapAct | MonitorKind::DiskAct | MonitorKind::Net => {
                Some(Snapshot::Counter(CounterPair::default()))
            }
            MonitorKind::Mem | MonitorKind::Swap | MonitorKind::Disk => {
                Some(Snapshot::Usage(UsagePair::default()))
            }
        }
    }

    /// Refreshes `snapshot` in place from the system.
    pub fn retrieve<P, D>(
        self,
        snapshot: &mut Snapshot,
        settings: &MonitorSettings,
        probes: &Probes<P, D>,
    ) -> Result<Retrieval>
    where
        P: ProcSource,
        D: UsageProbe,
    {
        retrieve::retrieve(self, snapshot, settings, probes)
    }

    /// Produces the line to display, or `None` to leave the overlay as is.
    pub fn render<P, D>(
        self,
        settings: &MonitorSettings,
        probes: &Probes<P, D>,
        view: SampleView<'_>,
    ) -> Result<Option<Rendered>>
    where
        P: ProcSource,
        D: UsageProbe,
    {
        render::render(self, settings, probes, view)
    }
}

impl MonitorDescriptor {
    pub fn capabilities(&self) -> Capabilities {
        self.kind.capabilities()
    }
}

/// One catalog row as printed by `--list-monitors`.
#[derive(Debug, Serialize)]
struct Listing {
    name: &'static str,
    description: &'static str,
    device: &'static str,
    format: &'static str,
    capabilities: Capabilities,
}

/// Prints the catalog, one block per monitor, or as a JSON array.
pub fn write_catalog<W: Write>(out: &mut W, json: bool) -> Result<()> {
    let rows: Vec<Listing> = CATALOG
        .iter()
        .map(|m| Listing {
            name: m.name,
            description: m.description,
            device: m.default_device.unwrap_or("Device not used"),
            format: m.default_format,
            capabilities: m.capabilities(),
        })
        .collect();

    if json {
        serde_json::to_writer_pretty(&mut *out, &rows)?;
        writeln!(out)?;
        return Ok(());
    }

    for row in &rows {
        writeln!(out, "{}: {}", row.name, row.description)?;
        writeln!(out, "    default device: {}", row.device)?;
        writeln!(out, "    default format: {}", row.format)?;
    }
    Ok(())
}
