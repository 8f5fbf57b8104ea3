use std::path::Path;

use color_eyre::Result;
use tracing::warn;

use super::{MonitorKind, MonitorSettings, Probes, Retrieval};
use crate::system::disks::UsageProbe;
use crate::system::platform::page_size;
use crate::system::procfs::{
    ColumnSlot, KeySlot, PROC_DISKSTATS, PROC_MEMINFO, PROC_NET_DEV, PROC_STAT, PROC_VMSTAT,
    ProcSource, read_columns, read_lines,
};
use crate::system::snapshot::{CounterPair, CpuCounters, Snapshot, UsagePair};

const SECTOR_SIZE: f64 = 512.0;
const KIB: f64 = 1024.0;

pub(super) fn retrieve<P, D>(
    kind: MonitorKind,
    snapshot: &mut Snapshot,
    settings: &MonitorSettings,
    probes: &Probes<P, D>,
) -> Result<Retrieval>
where
    P: ProcSource,
    D: UsageProbe,
{
    let proc = &probes.proc;
    let device = settings.device();

    // An incomplete source leaves the previous reading in place
    let refreshed = match kind {
        MonitorKind::Clock | MonitorKind::RunPs => return Ok(Retrieval::Unsupported),
        MonitorKind::Cpu => {
            let previous = snapshot.cpu().unwrap_or_default();
            Snapshot::Cpu(cpu(proc, device)?.unwrap_or(previous))
        }
        MonitorKind::Ctxt => counter(snapshot, context_switches(proc)?),
        MonitorKind::SwapAct => counter(snapshot, swap_activity(proc)?),
        MonitorKind::DiskAct => counter(snapshot, disk_activity(proc, device)?),
        MonitorKind::Net => counter(snapshot, network(proc, device)?),
        MonitorKind::Mem => usage(snapshot, memory(proc)?),
        MonitorKind::Swap => usage(snapshot, swap_space(proc)?),
        MonitorKind::Disk => match probes.disks.usage(Path::new(device)) {
            Ok(reading) => Snapshot::Usage(reading),
            Err(err) => {
                warn!(device, error = %err, "unable to probe filesystem usage");
                return Ok(Retrieval::Skipped);
            }
        },
    };

    *snapshot = refreshed;
    Ok(Retrieval::Updated)
}

fn counter(previous: &Snapshot, reading: Option<CounterPair>) -> Snapshot {
    Snapshot::Counter(reading.unwrap_or_else(|| previous.counter().unwrap_or_default()))
}

fn usage(previous: &Snapshot, reading: Option<UsagePair>) -> Snapshot {
    Snapshot::Usage(reading.unwrap_or_else(|| previous.usage().unwrap_or_default()))
}

fn cpu<P: ProcSource>(proc: &P, device: &str) -> Result<Option<CpuCounters>> {
    let mut c = CpuCounters::default();
    let found = read_columns(
        proc,
        PROC_STAT,
        device,
        &mut [
            ColumnSlot::new(1, &mut c.user),
            ColumnSlot::new(2, &mut c.nice),
            ColumnSlot::new(3, &mut c.kernel),
            ColumnSlot::new(4, &mut c.idle),
        ],
    )?;
    Ok(found.then_some(c))
}

fn context_switches<P: ProcSource>(proc: &P) -> Result<Option<CounterPair>> {
    let mut switches = 0.0;
    let found = read_columns(proc, PROC_STAT, "ctxt", &mut [ColumnSlot::new(1, &mut switches)])?;
    Ok(found.then(|| CounterPair::new(switches, 0.0)))
}

/// Number of processes currently runnable.
pub(super) fn running_processes<P: ProcSource>(proc: &P) -> Result<Option<f64>> {
    let mut running = 0.0;
    let found = read_columns(
        proc,
        PROC_STAT,
        "procs_running",
        &mut [ColumnSlot::new(1, &mut running)],
    )?;
    Ok(found.then_some(running))
}

fn swap_activity<P: ProcSource>(proc: &P) -> Result<Option<CounterPair>> {
    let (mut pages_in, mut pages_out) = (0.0, 0.0);
    let found = read_lines(
        proc,
        PROC_VMSTAT,
        &mut [
            KeySlot::new("pswpin", &mut pages_in),
            KeySlot::new("pswpout", &mut pages_out),
        ],
    )?;
    let page = page_size() as f64;
    Ok(found.then(|| CounterPair::new(pages_in * page, pages_out * page)))
}

fn disk_activity<P: ProcSource>(proc: &P, device: &str) -> Result<Option<CounterPair>> {
    let (mut sectors_read, mut sectors_written) = (0.0, 0.0);
    let found = read_columns(
        proc,
        PROC_DISKSTATS,
        device,
        &mut [
            ColumnSlot::new(5, &mut sectors_read),
            ColumnSlot::new(9, &mut sectors_written),
        ],
    )?;
    Ok(found.then(|| {
        CounterPair::new(sectors_read * SECTOR_SIZE, sectors_written * SECTOR_SIZE)
    }))
}

fn network<P: ProcSource>(proc: &P, device: &str) -> Result<Option<CounterPair>> {
    let (mut received, mut sent) = (0.0, 0.0);
    let found = read_columns(
        proc,
        PROC_NET_DEV,
        device,
        &mut [
            ColumnSlot::new(1, &mut received),
            ColumnSlot::new(9, &mut sent),
        ],
    )?;
    Ok(found.then(|| CounterPair::new(received, sent)))
}

/// Buffers and page cache count as free, the way htop reports memory.
fn memory<P: ProcSource>(proc: &P) -> Result<Option<UsagePair>> {
    let (mut total, mut free, mut buffers, mut cached) = (0.0, 0.0, 0.0, 0.0);
    let found = read_lines(
        proc,
        PROC_MEMINFO,
        &mut [
            KeySlot::new("MemTotal:", &mut total),
            KeySlot::new("MemFree:", &mut free),
            KeySlot::new("Buffers:", &mut buffers),
            KeySlot::new("Cached:", &mut cached),
        ],
    )?;
    Ok(found.then(|| UsagePair {
        free: (free + buffers + cached) * KIB,
        total: total * KIB,
    }))
}

fn swap_space<P: ProcSource>(proc: &P) -> Result<Option<UsagePair>> {
    let (mut total, mut free) = (0.0, 0.0);
    let found = read_lines(
        proc,
        PROC_MEMINFO,
        &mut [
            KeySlot::new("SwapTotal:", &mut total),
            KeySlot::new("SwapFree:", &mut free),
        ],
    )?;
    Ok(found.then(|| UsagePair {
        free: free * KIB,
        total: total * KIB,
    }))
}
