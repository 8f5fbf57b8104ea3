use std::io::{Stdout, stdout};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgGroup, Parser};
use color_eyre::Result;
use osdmon::config::{Config, Settings, load_config, load_config_from_path};
use osdmon::logging;
use osdmon::monitor::{self, Probes};
use osdmon::overlay::{self, HorizontalAnchor, TerminalOverlay, VerticalAnchor};
use osdmon::sampler::{Sampler, SystemClock};
use osdmon::system::disks::SysinfoDisks;
use osdmon::system::procfs::ProcFs;
use osdmon::visibility::{self, Visibility};
use ratatui::backend::CrosstermBackend;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "osdmon",
    version,
    about = "Single-line system monitor overlay",
    after_help = "SIGUSR1 hides the overlay, SIGUSR2 shows it and SIGHUP toggles it."
)]
#[command(group(ArgGroup::new("vertical").args(["top", "vcenter", "bottom"])))]
#[command(group(ArgGroup::new("horizontal").args(["right", "middle", "left"])))]
struct Cli {
    /// Monitor to run, see --list-monitors
    #[arg(short = 'T', long = "type", value_name = "MONITOR")]
    monitor_type: Option<String>,

    /// Device the monitor reads (cpu, disk, network interface, path)
    #[arg(short = 'D', long)]
    device: Option<String>,

    /// Output format template
    #[arg(short = 'F', long)]
    format: Option<String>,

    /// Font name; names containing "bold" draw in bold
    #[arg(short, long)]
    font: Option<String>,

    /// Text color
    #[arg(short, long)]
    color: Option<String>,

    /// Shadow offset in cells
    #[arg(short, long)]
    shadow: Option<u16>,

    /// Outline width, 0 disables the outline
    #[arg(short = 'O', long)]
    outline_width: Option<u16>,

    /// Outline color
    #[arg(short = 'C', long)]
    outline_color: Option<String>,

    /// Colors by value, e.g. "0 green 50 yellow 90 red"
    #[arg(short = 'L', long)]
    level_colors: Option<String>,

    /// Anchor to the top of the screen
    #[arg(short, long)]
    top: bool,

    /// Anchor to the vertical center of the screen
    #[arg(short, long)]
    vcenter: bool,

    /// Anchor to the bottom of the screen
    #[arg(short, long)]
    bottom: bool,

    /// Anchor to the right of the screen
    #[arg(short, long)]
    right: bool,

    /// Anchor to the horizontal center of the screen
    #[arg(short, long)]
    middle: bool,

    /// Anchor to the left of the screen
    #[arg(short, long)]
    left: bool,

    /// Vertical offset from the anchor
    #[arg(short, long, allow_negative_numbers = true)]
    offset: Option<i32>,

    /// Horizontal offset from the anchor
    #[arg(short = 'H', long, allow_negative_numbers = true)]
    hoffset: Option<i32>,

    /// Sampling interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the available monitors and exit
    #[arg(long)]
    list_monitors: bool,

    /// Print --list-monitors as JSON
    #[arg(long, requires = "list_monitors")]
    json: bool,

    /// Log filter: error, warn, info, debug, trace
    #[arg(long)]
    log_level: Option<String>,

    /// Write JSON log lines to this file instead of the default log file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    if cli.list_monitors {
        return monitor::write_catalog(&mut stdout().lock(), cli.json);
    }

    let config = load_config_for_cli(&cli);
    let log_file = logging::init(&config.logging.level, cli.log_file.as_deref())?;
    let settings = config.resolve();
    info!(
        log_file = ?log_file,
        monitor = settings.monitor.name,
        device = settings.monitor_settings.device(),
        interval = ?settings.interval,
        "starting"
    );

    let visibility = Arc::new(Visibility::new());
    let listener = visibility::spawn_signal_listener(Arc::clone(&visibility))?;

    let overlay = TerminalOverlay::open(settings.overlay.clone())?;
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = overlay::restore();
        original_hook(panic_info);
    }));

    let result = run(settings, overlay, visibility).await;
    listener.abort();
    result
}

async fn run(
    settings: Settings,
    overlay: TerminalOverlay<CrosstermBackend<Stdout>>,
    visibility: Arc<Visibility>,
) -> Result<()> {
    let started = Sampler::start(
        settings.monitor,
        settings.monitor_settings,
        settings.interval,
        overlay,
        Probes::new(ProcFs, SysinfoDisks),
        SystemClock,
        visibility,
    );
    let mut sampler = match started {
        Ok(sampler) => sampler,
        Err(err) => {
            overlay::restore()?;
            return Err(err);
        }
    };

    let result = tokio::select! {
        result = sampler.run() => result,
        result = visibility::shutdown_signal() => result,
    };

    sampler.into_overlay().close()?;
    result
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    let monitor = &mut config.monitor;
    if let Some(ref kind) = cli.monitor_type {
        monitor.kind = kind.clone();
    }
    if let Some(ref device) = cli.device {
        monitor.device = Some(device.clone());
    }
    if let Some(ref format) = cli.format {
        monitor.format = Some(format.clone());
    }
    if let Some(ref level_colors) = cli.level_colors {
        monitor.level_colors = level_colors.clone();
    }
    if let Some(interval) = cli.interval {
        monitor.interval_secs = interval;
    }

    let overlay = &mut config.overlay;
    if let Some(ref font) = cli.font {
        overlay.font = font.clone();
    }
    if let Some(ref color) = cli.color {
        overlay.color = color.clone();
    }
    if let Some(ref color) = cli.outline_color {
        overlay.outline_color = color.clone();
    }
    if let Some(width) = cli.outline_width {
        overlay.outline_width = width;
    }
    if let Some(shadow) = cli.shadow {
        overlay.shadow = shadow;
    }
    if let Some(offset) = cli.offset {
        overlay.voffset = offset;
    }
    if let Some(offset) = cli.hoffset {
        overlay.hoffset = offset;
    }
    if cli.top {
        overlay.vertical = VerticalAnchor::Top;
    } else if cli.vcenter {
        overlay.vertical = VerticalAnchor::Middle;
    } else if cli.bottom {
        overlay.vertical = VerticalAnchor::Bottom;
    }
    if cli.right {
        overlay.horizontal = HorizontalAnchor::Right;
    } else if cli.middle {
        overlay.horizontal = HorizontalAnchor::Center;
    } else if cli.left {
        overlay.horizontal = HorizontalAnchor::Left;
    }

    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    config
}
