//! The wake / sample / render loop and its two-slot sample window.

use std::cell::Cell;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::Result;
use tracing::{debug, instrument};

use crate::monitor::{MonitorDescriptor, MonitorSettings, Probes, Retrieval, SampleView};
use crate::overlay::Overlay;
use crate::system::disks::{SysinfoDisks, UsageProbe};
use crate::system::procfs::{ProcFs, ProcSource};
use crate::system::snapshot::Snapshot;
use crate::visibility::Visibility;

/// How often the loop wakes to check the interval and visibility.
pub const WAKE_INTERVAL: Duration = Duration::from_millis(500);

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        C::now(self)
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Two snapshot slots and their timestamps. `now` indexes the slot refreshed
/// next; the other one is "before". Rotation flips the index, never the data.
#[derive(Debug)]
pub struct SampleWindow {
    slots: Option<[Snapshot; 2]>,
    stamps: [Instant; 2],
    now: usize,
}

impl SampleWindow {
    fn new(slots: Option<[Snapshot; 2]>, start: Instant) -> Self {
        Self {
            slots,
            stamps: [start; 2],
            now: 0,
        }
    }

    fn before(&self) -> usize {
        self.now ^ 1
    }

    pub fn t_now(&self) -> Instant {
        self.stamps[self.now]
    }

    pub fn t_before(&self) -> Instant {
        self.stamps[self.before()]
    }

    pub fn now_slot(&self) -> Option<&Snapshot> {
        self.slots.as_ref().map(|slots| &slots[self.now])
    }

    pub fn before_slot(&self) -> Option<&Snapshot> {
        self.slots.as_ref().map(|slots| &slots[self.before()])
    }

    fn now_slot_mut(&mut self) -> Option<&mut Snapshot> {
        let now = self.now;
        self.slots.as_mut().map(|slots| &mut slots[now])
    }

    fn before_slot_mut(&mut self) -> Option<&mut Snapshot> {
        let before = self.before();
        self.slots.as_mut().map(|slots| &mut slots[before])
    }

    fn stamp_now(&mut self, at: Instant) {
        self.stamps[self.now] = at;
    }

    fn stamp_before(&mut self, at: Instant) {
        let before = self.before();
        self.stamps[before] = at;
    }

    fn rotate(&mut self) {
        self.now ^= 1;
    }

    pub fn view(&self) -> SampleView<'_> {
        SampleView {
            t_now: self.t_now(),
            t_before: self.t_before(),
            now: self.now_slot(),
            before: self.before_slot(),
        }
    }
}

/// What one pass of the loop did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// The interval has not elapsed and visibility did not change.
    Waiting,
    /// A line was handed to the overlay.
    Rendered,
    /// The overlay was blanked.
    Hidden,
    /// A sample was taken but nothing was shown.
    Skipped,
}

/// Drives one monitor against one overlay.
pub struct Sampler<O, P = ProcFs, D = SysinfoDisks, C = SystemClock> {
    monitor: &'static MonitorDescriptor,
    settings: MonitorSettings,
    interval: Duration,
    overlay: O,
    probes: Probes<P, D>,
    clock: C,
    visibility: Arc<Visibility>,
    window: SampleWindow,
}

impl<O, P, D, C> Sampler<O, P, D, C>
where
    O: Overlay,
    P: ProcSource,
    D: UsageProbe,
    C: Clock,
{
    /// Allocates the sample window and seeds its "before" slot.
    #[instrument(skip_all, fields(monitor = monitor.name))]
    pub fn start(
        monitor: &'static MonitorDescriptor,
        settings: MonitorSettings,
        interval: Duration,
        overlay: O,
        probes: Probes<P, D>,
        clock: C,
        visibility: Arc<Visibility>,
    ) -> Result<Self> {
        let kind = monitor.kind;
        let slots = kind
            .allocate()
            .and_then(|first| kind.allocate().map(|second| [first, second]));
        let mut window = SampleWindow::new(slots, clock.now());

        if monitor.capabilities().retrieve
            && let Some(before) = window.before_slot_mut()
        {
            kind.retrieve(before, &settings, &probes)?;
        }
        window.stamp_before(clock.now());
        debug!(allocated = window.slots.is_some(), "sampler started");

        Ok(Self {
            monitor,
            settings,
            interval,
            overlay,
            probes,
            clock,
            visibility,
            window,
        })
    }

    /// One wake-up: samples and renders if the interval elapsed or
    /// visibility changed, then swaps the window roles.
    pub fn tick(&mut self) -> Result<Tick> {
        let t_now = self.clock.now();
        let elapsed = t_now.saturating_duration_since(self.window.t_before());
        let changed = self.visibility.take_changed();
        if elapsed < self.interval && !changed {
            return Ok(Tick::Waiting);
        }

        let kind = self.monitor.kind;
        self.window.stamp_now(t_now);
        let retrieval = match self.window.now_slot_mut() {
            Some(slot) if self.monitor.capabilities().retrieve => {
                kind.retrieve(slot, &self.settings, &self.probes)?
            }
            _ => Retrieval::Unsupported,
        };

        let tick = if !self.visibility.is_visible() {
            self.overlay.display("")?;
            Tick::Hidden
        } else if retrieval == Retrieval::Skipped {
            Tick::Skipped
        } else {
            match kind.render(&self.settings, &self.probes, self.window.view())? {
                Some(rendered) => {
                    if let Some(color) = &rendered.color {
                        self.overlay.set_color(color)?;
                    }
                    self.overlay.display(&rendered.text)?;
                    Tick::Rendered
                }
                None => Tick::Skipped,
            }
        };

        self.window.rotate();
        Ok(tick)
    }

    /// Ticks every [`WAKE_INTERVAL`] until an error occurs.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            tokio::time::sleep(WAKE_INTERVAL).await;
            self.tick()?;
        }
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn into_overlay(self) -> O {
        self.overlay
    }
}
