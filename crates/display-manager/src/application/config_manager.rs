//! DisplayConfigManager: the negotiation engine.
//!
//! The manager owns two snapshots:
//!
//! - **current**: the latest topology a backend reported through
//!   [`DisplayConfigManager::handle_config_changed`].
//! - **saved**: the restore checkpoint, captured lazily on the first exclusive
//!   mode change and consumed by [`DisplayConfigManager::restore_mode`].
//!
//! Both are held as `Arc<DisplayConfig>` and only ever replaced wholesale, so a
//! caller holding an older snapshot keeps a stable view of it.
//!
//! # Negotiation sequence (for beginners)
//!
//! ```text
//! set_mode_exclusive(monitor, mode)
//!   1. fetch     backend.prepare_config_update()      None → ErrorNotImplemented
//!   2. build     build_exclusive_target(...)           failure → return status, no backend call
//!   3. adjust    adjust_display(target, scaling_mode)
//!   4. apply     backend.apply_config(target)          → backend's Status
//! ```
//!
//! Each step is awaited in order.  The engine does not serialise overlapping
//! negotiations: two concurrent calls interleave at their await points, and
//! a change notification may replace `current` between steps.
//!
//! # Locking
//!
//! State sits behind a `std::sync::Mutex` that is never held across an
//! `.await`.  Change handlers and one-shot waiters run after the lock is
//! released, so they may call back into the manager.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use display_core::{
    adjust_display, DisplayConfig, ModeInfo, MonitorId, ScalingMode, ScreenInfo, Status,
};

use super::backend::DisplayBackend;
use super::build_target::{build_exclusive_target, build_restore_target};

/// Callback fired when the reported topology actually changes.
pub type ConfigChangedHandler = Arc<dyn Fn(Arc<DisplayConfig>) + Send + Sync>;

type Waiter = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct ManagerState {
    on_config_changed: Option<ConfigChangedHandler>,
    waiters: Vec<Waiter>,
    current: Option<Arc<DisplayConfig>>,
    saved: Option<Arc<DisplayConfig>>,
}

/// Negotiates display mode changes against a [`DisplayBackend`].
pub struct DisplayConfigManager {
    backend: Arc<dyn DisplayBackend>,
    scaling_mode: ScalingMode,
    state: Mutex<ManagerState>,
}

impl DisplayConfigManager {
    /// Creates a manager with no current or saved configuration.
    pub fn new(backend: Arc<dyn DisplayBackend>, scaling_mode: ScalingMode) -> Self {
        Self {
            backend,
            scaling_mode,
            state: Mutex::new(ManagerState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Installs the change handler, replacing any previous one.
    pub fn init(&self, on_config_changed: impl Fn(Arc<DisplayConfig>) + Send + Sync + 'static) {
        self.state().on_config_changed = Some(Arc::new(on_config_changed));
    }

    /// Drops the change handler and every pending waiter without invoking them.
    ///
    /// In-flight backend calls are not cancelled.
    pub fn invalidate(&self) {
        let mut state = self.state();
        state.on_config_changed = None;
        let dropped = state.waiters.len();
        state.waiters.clear();
        debug!(dropped, "display config manager invalidated");
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn scaling_mode(&self) -> ScalingMode {
        self.scaling_mode
    }

    pub fn has_saved_mode(&self) -> bool {
        self.state().saved.is_some()
    }

    pub fn current_config(&self) -> Option<Arc<DisplayConfig>> {
        self.state().current.clone()
    }

    pub fn saved_config(&self) -> Option<Arc<DisplayConfig>> {
        self.state().saved.clone()
    }

    /// Appends the current topology to `out`.  No-op when nothing has been
    /// reported yet.
    pub fn export_screen_info(&self, out: &mut ScreenInfo) {
        if let Some(current) = self.current_config() {
            out.append_config(&current);
        }
    }

    // ── Change notification ───────────────────────────────────────────────────

    /// Queues `waiter` to run once, after the next replacement of the current
    /// configuration.
    pub fn wait_for_config_notification(&self, waiter: impl FnOnce() + Send + 'static) {
        self.state().waiters.push(Box::new(waiter));
    }

    /// Future form of [`wait_for_config_notification`](Self::wait_for_config_notification).
    ///
    /// The receiver errors if the manager is invalidated first.
    pub fn config_notification(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.wait_for_config_notification(move || {
            let _ = tx.send(());
        });
        rx
    }

    /// Records a topology reported by the backend.
    ///
    /// The snapshot replaces the current one if there is none yet or if it is
    /// strictly newer.  The change handler fires only for the first snapshot
    /// or a newer one that differs structurally; a newer but equal snapshot is
    /// taken silently.  Every replacement drains the one-shot waiters.
    pub fn handle_config_changed(&self, config: impl Into<Arc<DisplayConfig>>) {
        let config = config.into();

        let (handler, waiters, changed) = {
            let mut state = self.state();
            let (replace, changed) = match &state.current {
                None => (true, true),
                Some(current) => {
                    let newer = config.time > current.time;
                    (newer, newer && !current.is_equal(&config))
                }
            };
            if !replace {
                debug!(serial = config.serial, "ignoring display config that is not newer");
                return;
            }
            state.current = Some(Arc::clone(&config));
            let handler = if changed {
                state.on_config_changed.clone()
            } else {
                None
            };
            (handler, std::mem::take(&mut state.waiters), changed)
        };

        if changed {
            info!(
                serial = config.serial,
                monitors = config.monitors.len(),
                "display configuration changed"
            );
        } else {
            debug!(serial = config.serial, "display configuration refreshed without changes");
        }

        if let Some(handler) = handler {
            handler(Arc::clone(&config));
        }
        for waiter in waiters {
            waiter();
        }
    }

    // ── Negotiation ───────────────────────────────────────────────────────────

    /// Switches `monitor` to `mode`, keeping every other monitor on its
    /// recorded mode, and captures the restore checkpoint on first use.
    ///
    /// `monitor` may be [`MonitorId::primary`]; `mode` may be
    /// [`ModeInfo::CURRENT`] or [`ModeInfo::PREFERRED`].
    pub async fn set_mode_exclusive(&self, monitor: MonitorId, mode: ModeInfo) -> Status {
        debug!(%monitor, %mode, "fetching display config for exclusive mode change");
        let Some(data) = self.backend.prepare_config_update().await else {
            warn!("display backend returned no configuration");
            return Status::ErrorNotImplemented;
        };

        let current = data.extract_current();
        let saved = {
            let mut state = self.state();
            let saved = state.saved.get_or_insert_with(|| {
                info!(serial = current.serial, "capturing display restore checkpoint");
                Arc::new(current.clone())
            });
            Arc::clone(saved)
        };

        let (mut target, status) = build_exclusive_target(&data, &current, &saved, &monitor, &mode);
        if !status.is_ok() {
            warn!(%monitor, %mode, ?status, "exclusive target not applied");
            return status;
        }

        adjust_display(&mut target, self.scaling_mode);
        let status = self.backend.apply_config(Arc::new(target)).await;
        info!(%monitor, %mode, ?status, "exclusive mode change finished");
        status
    }

    /// Returns every monitor to the checkpoint captured by
    /// [`set_mode_exclusive`](Self::set_mode_exclusive).
    ///
    /// Without a checkpoint this resolves to
    /// [`Status::ErrorInvalidArgument`] without touching the backend.  The
    /// checkpoint is consumed whether or not the restore can be built.
    pub async fn restore_mode(&self) -> Status {
        if !self.has_saved_mode() {
            warn!("no saved display configuration to restore");
            return Status::ErrorInvalidArgument;
        }

        let Some(data) = self.backend.prepare_config_update().await else {
            warn!("display backend returned no configuration");
            return Status::ErrorNotImplemented;
        };

        let saved = self.state().saved.take();
        let Some(saved) = saved else {
            warn!("saved display configuration was consumed while fetching");
            return Status::ErrorInvalidArgument;
        };

        let Some(mut target) = build_restore_target(&data, &saved) else {
            warn!(serial = saved.serial, "saved display configuration no longer matches; discarded");
            return Status::ErrorInvalidArgument;
        };

        adjust_display(&mut target, self.scaling_mode);
        let status = self.backend.apply_config(Arc::new(target)).await;
        info!(?status, "display mode restore finished");
        status
    }

    /// Non-exclusive mode change, delegated to the backend.
    pub async fn set_mode(&self, monitor: MonitorId, mode: ModeInfo) -> Status {
        let status = self.backend.set_mode(monitor, mode).await;
        debug!(?status, "backend set_mode finished");
        status
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
