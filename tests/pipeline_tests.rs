use std::sync::Arc;
use std::time::{Duration, Instant};

use insta::assert_debug_snapshot;
use osdmon::config::Config;
use osdmon::monitor::Probes;
use osdmon::overlay::{RecordingOverlay, Shown};
use osdmon::sampler::{ManualClock, Sampler, Tick};
use osdmon::system::disks::StaticUsage;
use osdmon::system::procfs::{MockProcFs, PROC_MEMINFO, PROC_NET_DEV, PROC_STAT};
use osdmon::system::snapshot::UsagePair;
use osdmon::visibility::{Visibility, VisibilityChange};

type TestSampler = Sampler<RecordingOverlay, MockProcFs, StaticUsage, Arc<ManualClock>>;

fn sampler_for(
    config: &Config,
    proc: MockProcFs,
    disks: StaticUsage,
) -> (TestSampler, Arc<ManualClock>, Arc<Visibility>) {
    let settings = config.resolve();
    let clock = Arc::new(ManualClock::new(Instant::now()));
    let visibility = Arc::new(Visibility::new());
    let sampler = Sampler::start(
        settings.monitor,
        settings.monitor_settings,
        settings.interval,
        RecordingOverlay::new(&settings.overlay.color),
        Probes::new(proc, disks),
        Arc::clone(&clock),
        Arc::clone(&visibility),
    )
    .unwrap();
    (sampler, clock, visibility)
}

fn config(kind: &str, level_colors: &str) -> Config {
    let mut config = Config::default();
    config.monitor.kind = kind.to_string();
    config.monitor.level_colors = level_colors.to_string();
    config
}

#[test]
fn cpu_utilization_end_to_end() {
    let proc = MockProcFs::new()
        .with(PROC_STAT, "cpu  9 9 9 9\ncpu0 100 0 100 200\nctxt 1\n")
        .with(PROC_STAT, "cpu  9 9 9 9\ncpu0 130 0 130 240\nctxt 2\n");
    let (mut sampler, clock, _) = sampler_for(
        &config("cpu", "0 green 50 yellow 90 red"),
        proc,
        StaticUsage::default(),
    );

    clock.advance(Duration::from_secs(1));
    assert_eq!(sampler.tick().unwrap(), Tick::Rendered);
    assert_eq!(
        sampler.overlay().last(),
        Some(&Shown {
            text: "CPU: 60%".to_string(),
            color: "yellow".to_string(),
        })
    );
}

#[test]
fn network_rates_over_several_cycles() {
    let line = |rx: u64, tx: u64| {
        format!(
            "Inter-|   Receive |  Transmit\n face |bytes packets|bytes packets\n  eth0: {rx} 1 0 0 0 0 0 0 {tx} 1 0 0 0 0 0 0\n"
        )
    };
    let proc = MockProcFs::new();
    for (rx, tx) in [(0, 0), (2048, 1024), (2048, 1024), (1_050_624, 525_312)] {
        proc.push(PROC_NET_DEV, line(rx, tx));
    }
    let (mut sampler, clock, _) = sampler_for(
        &config("net", "0 green 1024 yellow 1048576 red"),
        proc,
        StaticUsage::default(),
    );

    for _ in 0..3 {
        clock.advance(Duration::from_secs(1));
        sampler.tick().unwrap();
    }

    assert_debug_snapshot!(sampler.overlay().shown, @r#"
    [
        Shown {
            text: "eth0: 3.0KB (2.0KB in/1.0KB out)",
            color: "yellow",
        },
        Shown {
            text: "eth0: 0.0B (0.0B in/0.0B out)",
            color: "green",
        },
        Shown {
            text: "eth0: 1.5MB (1.0MB in/512KB out)",
            color: "red",
        },
    ]
    "#);
}

#[test]
fn memory_usage_with_custom_format() {
    let proc = MockProcFs::new().with(
        PROC_MEMINFO,
        "MemTotal: 1000 kB\nMemFree: 100 kB\nBuffers: 50 kB\nCached: 250 kB\nSwapTotal: 0 kB\nSwapFree: 0 kB\n",
    );
    let mut config = config("mem", "");
    config.monitor.format = Some("%U%% used, %fB free".to_string());
    let (mut sampler, clock, _) = sampler_for(&config, proc, StaticUsage::default());

    clock.advance(Duration::from_secs(1));
    sampler.tick().unwrap();
    assert_eq!(sampler.overlay().texts(), ["60.0% used, 400KB free"]);
    assert_eq!(sampler.overlay().last().unwrap().color, "green");
}

#[test]
fn disk_usage_from_probe() {
    let disks = StaticUsage {
        reading: Some(UsagePair {
            free: 25.0 * 1024.0 * 1024.0 * 1024.0,
            total: 100.0 * 1024.0 * 1024.0 * 1024.0,
        }),
    };
    let (mut sampler, clock, _) = sampler_for(&config("disk", ""), MockProcFs::new(), disks);

    clock.advance(Duration::from_secs(1));
    sampler.tick().unwrap();
    assert_eq!(sampler.overlay().texts(), ["Disk: 75.0%, 75GB/100GB"]);
}

#[test]
fn visibility_signals_blank_and_restore() {
    let proc = MockProcFs::new()
        .with(PROC_STAT, "ctxt 0\n")
        .with(PROC_STAT, "ctxt 50\n");
    let (mut sampler, clock, visibility) =
        sampler_for(&config("ctxt", ""), proc, StaticUsage::default());

    visibility.apply(VisibilityChange::Hide);
    assert_eq!(sampler.tick().unwrap(), Tick::Hidden);

    // Hidden cycles keep sampling but only ever show the empty line
    clock.advance(Duration::from_secs(1));
    assert_eq!(sampler.tick().unwrap(), Tick::Hidden);

    visibility.apply(VisibilityChange::Show);
    clock.advance(Duration::from_secs(1));
    assert_eq!(sampler.tick().unwrap(), Tick::Rendered);

    assert_eq!(sampler.overlay().texts(), ["", "", "ctxt: 0.0 switches/s"]);
}

#[test]
fn missing_counter_file_is_fatal() {
    let config = config("ctxt", "");
    let settings = config.resolve();
    let started = Sampler::start(
        settings.monitor,
        settings.monitor_settings,
        settings.interval,
        RecordingOverlay::new("green"),
        Probes::new(MockProcFs::new(), StaticUsage::default()),
        ManualClock::new(Instant::now()),
        Arc::new(Visibility::new()),
    );
    let err = started.err().unwrap();
    assert!(err.to_string().contains("/proc/stat"));
}
