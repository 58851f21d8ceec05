//! In-memory display backend for tests and the CLI.
//!
//! [`ScriptedBackend`] holds a topology in memory and behaves like a
//! compositor that accepts every request: fetching returns a fresh copy of the
//! topology, applying marks the requested modes current, takes the requested
//! logical layout, bumps the serial and echoes the new topology back to the
//! attached manager through
//! [`DisplayConfigManager::handle_config_changed`].
//!
//! Tests can also make it fail on purpose (no topology, a fixed apply status)
//! and inspect every target it was asked to apply.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::SystemTime;

use async_trait::async_trait;
use tracing::debug;

use display_core::{DisplayConfig, DisplayMode, NativeId, Status};

use crate::application::backend::DisplayBackend;
use crate::application::config_manager::DisplayConfigManager;

/// Backend-private token attached to every fetched snapshot: the number of
/// configurations the backend has committed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedGeneration(pub u64);

#[derive(Debug)]
struct ScriptedState {
    topology: Option<DisplayConfig>,
    apply_status: Status,
    applied: Vec<Arc<DisplayConfig>>,
    fetches: usize,
    generation: u64,
}

/// A [`DisplayBackend`] backed by an in-memory topology.
#[derive(Debug)]
pub struct ScriptedBackend {
    state: Mutex<ScriptedState>,
    manager: Mutex<Weak<DisplayConfigManager>>,
}

impl ScriptedBackend {
    /// Creates a backend serving `topology`.
    pub fn new(topology: DisplayConfig) -> Self {
        Self::with_topology(Some(topology))
    }

    /// Creates a backend whose fetches return no data.
    pub fn unavailable() -> Self {
        Self::with_topology(None)
    }

    fn with_topology(topology: Option<DisplayConfig>) -> Self {
        Self {
            state: Mutex::new(ScriptedState {
                topology,
                apply_status: Status::Ok,
                applied: Vec::new(),
                fetches: 0,
                generation: 0,
            }),
            manager: Mutex::new(Weak::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ScriptedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Echoes committed topologies to `manager`.  Only a weak reference is
    /// kept, since the manager owns this backend.
    pub fn attach(&self, manager: &Arc<DisplayConfigManager>) {
        *self.manager.lock().unwrap_or_else(PoisonError::into_inner) = Arc::downgrade(manager);
    }

    /// Status returned by every subsequent apply.  Anything other than
    /// [`Status::Ok`] leaves the topology untouched.
    pub fn set_apply_status(&self, status: Status) {
        self.state().apply_status = status;
    }

    /// Replaces the live topology, e.g. to simulate a hot-plug.
    pub fn set_topology(&self, topology: Option<DisplayConfig>) {
        self.state().topology = topology;
    }

    pub fn topology(&self) -> Option<DisplayConfig> {
        self.state().topology.clone()
    }

    /// Every target passed to `apply_config`, oldest first.
    pub fn applied(&self) -> Vec<Arc<DisplayConfig>> {
        self.state().applied.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.state().fetches
    }
}

#[async_trait]
impl DisplayBackend for ScriptedBackend {
    async fn prepare_config_update(&self) -> Option<DisplayConfig> {
        let mut state = self.state();
        state.fetches += 1;
        let generation = state.generation;
        let mut snapshot = state.topology.clone()?;
        snapshot.time = SystemTime::now();
        snapshot.native = Some(Arc::new(ScriptedGeneration(generation)));
        Some(snapshot)
    }

    async fn apply_config(&self, target: Arc<DisplayConfig>) -> Status {
        let committed = {
            let mut state = self.state();
            state.applied.push(Arc::clone(&target));
            if state.apply_status != Status::Ok {
                return state.apply_status;
            }
            let Some(live) = state.topology.as_ref() else {
                return Status::ErrorNotImplemented;
            };
            let committed = commit(live, &target);
            state.topology = Some(committed.clone());
            state.generation += 1;
            committed
        };
        debug!(serial = committed.serial, "scripted backend committed configuration");

        let manager = self
            .manager
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade();
        if let Some(manager) = manager {
            manager.handle_config_changed(committed);
        }
        Status::Ok
    }
}

/// Builds the topology the backend reports after accepting `target`.
///
/// The live mode lists are kept; only the `current` flags move to the mode
/// each monitor was asked to run.  Monitors absent from `target` are left as
/// they are.
fn commit(live: &DisplayConfig, target: &DisplayConfig) -> DisplayConfig {
    let monitors = live
        .monitors
        .iter()
        .map(|monitor| {
            let mut monitor = monitor.clone();
            let requested = target
                .get_monitor(&monitor.id)
                .and_then(|t| t.modes.first());
            if let Some(index) = requested.and_then(|r| live_mode_index(&monitor.modes, r)) {
                for (i, mode) in monitor.modes.iter_mut().enumerate() {
                    mode.current = i == index;
                }
            }
            monitor
        })
        .collect();

    DisplayConfig {
        serial: live.serial.wrapping_add(1),
        desktop_rect: live.desktop_rect,
        monitors,
        logical: target.logical.clone(),
        native: None,
        time: SystemTime::now(),
    }
}

/// Finds the live mode a target asked for.  Backend handles identify it
/// exactly; the timing is only a fallback for targets built without them.
fn live_mode_index(modes: &[DisplayMode], requested: &DisplayMode) -> Option<usize> {
    let by_handle = |m: &DisplayMode| {
        (requested.xid != NativeId::NONE && m.xid == requested.xid)
            || (!requested.id.is_empty() && m.id == requested.id)
    };
    modes
        .iter()
        .position(by_handle)
        .or_else(|| modes.iter().position(|m| m.mode == requested.mode))
}

#[cfg(test)]
mod tests {
    use display_core::{IRect, LogicalDisplay, ModeInfo, MonitorId, PhysicalDisplay};

    use super::*;

    const FHD: ModeInfo = ModeInfo::new(1920, 1080, 60_000);
    const QHD: ModeInfo = ModeInfo::new(2560, 1440, 144_000);

    fn topology() -> DisplayConfig {
        let id = MonitorId::new("DP-1", vec![]);
        DisplayConfig {
            serial: 1,
            monitors: vec![PhysicalDisplay {
                id: id.clone(),
                modes: vec![
                    DisplayMode {
                        mode: FHD,
                        current: true,
                        ..DisplayMode::default()
                    },
                    DisplayMode {
                        mode: QHD,
                        preferred: true,
                        ..DisplayMode::default()
                    },
                ],
                ..PhysicalDisplay::default()
            }],
            logical: vec![LogicalDisplay {
                rect: IRect::new(0, 0, 1920, 1080),
                monitors: vec![id],
                ..LogicalDisplay::default()
            }],
            ..DisplayConfig::default()
        }
    }

    fn qhd_target() -> Arc<DisplayConfig> {
        let mut target = topology();
        target.monitors[0].modes = vec![DisplayMode {
            mode: QHD,
            ..DisplayMode::default()
        }];
        target.logical[0].rect = IRect::new(0, 0, 2560, 1440);
        Arc::new(target)
    }

    #[tokio::test]
    async fn test_fetch_tags_snapshot_with_generation() {
        let backend = ScriptedBackend::new(topology());

        let snapshot = backend.prepare_config_update().await.expect("snapshot");

        let token = snapshot.native.expect("native token");
        assert_eq!(
            token.downcast_ref::<ScriptedGeneration>(),
            Some(&ScriptedGeneration(0))
        );
        assert_eq!(backend.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_backend_fetch_returns_none() {
        let backend = ScriptedBackend::unavailable();
        assert!(backend.prepare_config_update().await.is_none());
        assert_eq!(backend.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_apply_marks_requested_mode_current_and_bumps_serial() {
        // Arrange
        let backend = ScriptedBackend::new(topology());

        // Act
        let status = backend.apply_config(qhd_target()).await;

        // Assert
        assert_eq!(status, Status::Ok);
        let live = backend.topology().expect("topology");
        assert_eq!(live.serial, 2);
        assert_eq!(live.monitors[0].modes.len(), 2);
        assert_eq!(live.monitors[0].get_current().mode, QHD);
        assert_eq!(live.logical[0].rect.width, 2560);
        assert_eq!(backend.applied().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_flags_only_the_requested_duplicate_timing_mode() {
        // Arrange: two live modes share the FHD timing but carry different ids
        let mut live = topology();
        live.monitors[0].modes = vec![
            DisplayMode {
                id: "a".to_string(),
                mode: FHD,
                current: true,
                ..DisplayMode::default()
            },
            DisplayMode {
                id: "b".to_string(),
                mode: FHD,
                ..DisplayMode::default()
            },
        ];
        let backend = ScriptedBackend::new(live.clone());
        let mut target = live;
        target.monitors[0].modes = vec![DisplayMode {
            id: "b".to_string(),
            mode: FHD,
            ..DisplayMode::default()
        }];

        // Act
        let status = backend.apply_config(Arc::new(target)).await;

        // Assert
        assert_eq!(status, Status::Ok);
        let committed = backend.topology().expect("topology");
        let modes = &committed.monitors[0].modes;
        assert_eq!(modes.iter().filter(|m| m.current).count(), 1);
        assert_eq!(committed.monitors[0].get_current().id, "b");
    }

    #[tokio::test]
    async fn test_apply_with_failure_status_keeps_topology() {
        let backend = ScriptedBackend::new(topology());
        backend.set_apply_status(Status::Declined);

        let status = backend.apply_config(qhd_target()).await;

        assert_eq!(status, Status::Declined);
        assert_eq!(backend.topology().expect("topology").serial, 1);
        assert_eq!(backend.applied().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_echoes_committed_topology_to_attached_manager() {
        // Arrange
        let backend = Arc::new(ScriptedBackend::new(topology()));
        let manager = Arc::new(DisplayConfigManager::new(
            Arc::clone(&backend) as Arc<dyn DisplayBackend>,
            display_core::ScalingMode::PostScaling,
        ));
        backend.attach(&manager);

        // Act
        backend.apply_config(qhd_target()).await;

        // Assert
        let current = manager.current_config().expect("echoed");
        assert_eq!(current.serial, 2);
    }
}
