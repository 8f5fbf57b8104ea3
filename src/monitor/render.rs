use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, TimeZone};
use color_eyre::Result;
use tracing::warn;

use super::retrieve::running_processes;
use super::{MonitorKind, MonitorSettings, OUTPUT_LIMIT, Probes, SampleView};
use crate::format::{expand, format_scalar, truncate_to_limit};
use crate::system::disks::UsageProbe;
use crate::system::procfs::ProcSource;
use crate::system::snapshot::Snapshot;

/// A line ready for the overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct Rendered {
    pub text: String,
    /// Color to switch to first; `None` keeps the current one.
    pub color: Option<String>,
}

impl Rendered {
    fn plain(text: String) -> Self {
        Self { text, color: None }
    }

    fn colored(text: String, color: String) -> Self {
        Self {
            text,
            color: Some(color),
        }
    }
}

pub(super) fn render<P, D>(
    kind: MonitorKind,
    settings: &MonitorSettings,
    probes: &Probes<P, D>,
    view: SampleView<'_>,
) -> Result<Option<Rendered>>
where
    P: ProcSource,
    D: UsageProbe,
{
    let format = settings.format.as_str();

    let rendered = match kind {
        MonitorKind::Clock => format_clock(format, &Local::now()).map(Rendered::plain),
        MonitorKind::RunPs => running_processes(&probes.proc)?
            .map(|running| Rendered::plain(format_scalar(format, running))),
        MonitorKind::Cpu => {
            let now = slot(view.now, Snapshot::cpu);
            let before = slot(view.before, Snapshot::cpu);
            let busy = now.utilization_since(&before);
            Some(Rendered::colored(
                format_scalar(format, busy),
                settings.color_for(busy),
            ))
        }
        MonitorKind::Ctxt | MonitorKind::SwapAct | MonitorKind::DiskAct | MonitorKind::Net => {
            let now = slot(view.now, Snapshot::counter);
            let before = slot(view.before, Snapshot::counter);
            let rates = now.speed_since(&before, view.t_now, view.t_before);
            Some(Rendered::colored(
                expand(format, &rates, OUTPUT_LIMIT),
                settings.color_for(rates.total()),
            ))
        }
        MonitorKind::Mem | MonitorKind::Swap | MonitorKind::Disk => {
            let usage = slot(view.now, Snapshot::usage);
            Some(Rendered::colored(
                expand(format, &usage, OUTPUT_LIMIT),
                settings.color_for(usage.used_percent()),
            ))
        }
    };

    Ok(rendered)
}

fn slot<T: Default>(snapshot: Option<&Snapshot>, shape: fn(&Snapshot) -> Option<T>) -> T {
    snapshot.and_then(shape).unwrap_or_default()
}

/// Renders `time` with a `strftime(3)` format, cut to fit [`OUTPUT_LIMIT`];
/// `None` if the format is invalid.
pub fn format_clock<Tz>(format: &str, time: &DateTime<Tz>) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        warn!(format, "invalid clock format");
        return None;
    }

    let mut out = String::new();
    if write!(out, "{}", time.format_with_items(items.iter())).is_err() {
        warn!(format, "clock format could not be rendered");
        return None;
    }
    truncate_to_limit(&mut out, OUTPUT_LIMIT);
    Some(out)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::color::LevelColorTable;
    use crate::monitor::find;
    use crate::system::disks::StaticUsage;
    use crate::system::procfs::{MockProcFs, PROC_STAT};
    use crate::system::snapshot::{CounterPair, CpuCounters, UsagePair};

    fn settings(name: &str) -> MonitorSettings {
        let mut settings = MonitorSettings::for_monitor(find(name).unwrap());
        settings.level_colors = LevelColorTable::parse("0:green 50:yellow 80:red").unwrap();
        settings
    }

    fn no_probes() -> Probes<MockProcFs, StaticUsage> {
        Probes::new(MockProcFs::new(), StaticUsage::default())
    }

    fn view<'a>(now: &'a Snapshot, before: &'a Snapshot, secs: u64) -> SampleView<'a> {
        let t_before = Instant::now();
        SampleView {
            t_now: t_before + Duration::from_secs(secs),
            t_before,
            now: Some(now),
            before: Some(before),
        }
    }

    #[test]
    fn cpu_line_and_color() {
        let before = Snapshot::Cpu(CpuCounters {
            user: 100.0,
            nice: 0.0,
            kernel: 50.0,
            idle: 850.0,
        });
        let now = Snapshot::Cpu(CpuCounters {
            user: 120.0,
            nice: 0.0,
            kernel: 60.0,
            idle: 870.0,
        });
        let rendered = MonitorKind::Cpu
            .render(&settings("cpu"), &no_probes(), view(&now, &before, 1))
            .unwrap()
            .unwrap();
        assert_eq!(rendered.text, "CPU: 60%");
        assert_eq!(rendered.color.as_deref(), Some("yellow"));
    }

    #[test]
    fn network_rates() {
        let before = Snapshot::Counter(CounterPair::new(0.0, 0.0));
        let now = Snapshot::Counter(CounterPair::new(4096.0, 2048.0));
        let rendered = MonitorKind::Net
            .render(&settings("net"), &no_probes(), view(&now, &before, 2))
            .unwrap()
            .unwrap();
        assert_eq!(rendered.text, "eth0: 3.0KB (2.0KB in/1.0KB out)");
        assert_eq!(rendered.color.as_deref(), Some("red"));
    }

    #[test]
    fn usage_line() {
        let now = Snapshot::Usage(UsagePair {
            free: 60.0,
            total: 100.0,
        });
        let rendered = MonitorKind::Mem
            .render(&settings("mem"), &no_probes(), view(&now, &now, 1))
            .unwrap()
            .unwrap();
        assert_eq!(rendered.text, "Mem: 40.0%, 40B/100B");
        assert_eq!(rendered.color.as_deref(), Some("green"));
    }

    #[test]
    fn running_processes_are_read_live() {
        let probes = Probes::new(
            MockProcFs::new().with(PROC_STAT, "procs_running 3\nprocs_blocked 0\n"),
            StaticUsage::default(),
        );
        let empty = Snapshot::Counter(CounterPair::default());
        let rendered = MonitorKind::RunPs
            .render(&settings("runps"), &probes, view(&empty, &empty, 1))
            .unwrap()
            .unwrap();
        assert_eq!(rendered, Rendered::plain("procs: 3".to_string()));
    }

    #[test]
    fn clock_formats() {
        let time = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap()
            .and_utc();
        assert_eq!(
            format_clock("%a %b %e %H:%M:%S %G", &time).as_deref(),
            Some("Tue Mar  5 07:08:09 2024")
        );
    }

    #[test]
    fn clock_output_is_bounded() {
        let line = format_clock(&"%Y-%m-%d ".repeat(60), &Utc::now()).unwrap();
        assert_eq!(line.len(), OUTPUT_LIMIT - 1);
    }

    #[test]
    fn cpu_output_is_bounded() {
        let mut settings = settings("cpu");
        settings.format = "CPU %999999999.1f".to_string();
        let cpu = Snapshot::Cpu(CpuCounters::default());
        let rendered = MonitorKind::Cpu
            .render(&settings, &no_probes(), view(&cpu, &cpu, 1))
            .unwrap()
            .unwrap();
        assert_eq!(rendered.text.len(), OUTPUT_LIMIT - 1);
        assert!(rendered.text.starts_with("CPU "));
    }

    #[test]
    fn invalid_clock_format_renders_nothing() {
        assert_eq!(format_clock("%Q", &Utc::now()), None);
    }
}
