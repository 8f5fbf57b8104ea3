use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use color_eyre::Result;
use tokio::task::JoinHandle;
use tracing::debug;

/// Whether the overlay should currently show anything.
///
/// Signal handling only ever sets these flags; the sampling loop is the
/// single reader and the only one clearing `changed`.
#[derive(Debug)]
pub struct Visibility {
    visible: AtomicBool,
    changed: AtomicBool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisibilityChange {
    Hide,
    Show,
    Toggle,
}

impl Default for Visibility {
    fn default() -> Self {
        Self::new()
    }
}

impl Visibility {
    pub fn new() -> Self {
        Self {
            visible: AtomicBool::new(true),
            changed: AtomicBool::new(false),
        }
    }

    pub fn apply(&self, change: VisibilityChange) {
        match change {
            VisibilityChange::Hide => self.visible.store(false, Ordering::Release),
            VisibilityChange::Show => self.visible.store(true, Ordering::Release),
            VisibilityChange::Toggle => {
                self.visible.fetch_xor(true, Ordering::AcqRel);
            }
        }
        self.changed.store(true, Ordering::Release);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    /// Returns whether visibility changed since the last call, clearing the
    /// flag.
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }
}

/// Listens for `SIGUSR1` (hide), `SIGUSR2` (show) and `SIGHUP` (toggle).
///
/// Must be called from within a tokio runtime.
#[cfg(unix)]
pub fn spawn_signal_listener(visibility: Arc<Visibility>) -> Result<JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hide = signal(SignalKind::user_defined1())?;
    let mut show = signal(SignalKind::user_defined2())?;
    let mut toggle = signal(SignalKind::hangup())?;

    Ok(tokio::spawn(async move {
        loop {
            let change = tokio::select! {
                Some(()) = hide.recv() => VisibilityChange::Hide,
                Some(()) = show.recv() => VisibilityChange::Show,
                Some(()) = toggle.recv() => VisibilityChange::Toggle,
                else => break,
            };
            visibility.apply(change);
            debug!(?change, visible = visibility.is_visible(), "visibility signal");
        }
    }))
}

/// Resolves once `SIGINT` or `SIGTERM` arrives.
#[cfg(unix)]
pub async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = interrupt.recv() => debug!("interrupted"),
        _ = terminate.recv() => debug!("terminated"),
    }
    Ok(())
}

/// Visibility signals do not exist here; the listener never fires.
#[cfg(not(unix))]
pub fn spawn_signal_listener(_visibility: Arc<Visibility>) -> Result<JoinHandle<()>> {
    Ok(tokio::spawn(std::future::pending()))
}

/// Resolves once Ctrl+C is pressed.
#[cfg(not(unix))]
pub async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    debug!("interrupted");
    Ok(())
}
