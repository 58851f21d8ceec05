//! The extension surface implemented by window-system adapters.
//!
//! A concrete backend (desktop portal over D-Bus, a Wayland output-management
//! protocol, X11 RandR, Win32) only has to answer two questions: "what does the
//! topology look like right now?" and "please make it look like this".  The
//! manager drives everything else.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use display_core::{DisplayConfig, ModeInfo, MonitorId, Status};

/// Window-system adapter driven by
/// [`DisplayConfigManager`](super::config_manager::DisplayConfigManager).
///
/// Implementations are injected as `Arc<dyn DisplayBackend>`; tests use the
/// generated `MockDisplayBackend` or the in-memory
/// [`ScriptedBackend`](crate::infrastructure::scripted_backend::ScriptedBackend).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DisplayBackend: Send + Sync {
    /// Fetches a fresh snapshot of the live topology.
    ///
    /// Returns `None` when the window system is unavailable or does not
    /// support enumeration.
    async fn prepare_config_update(&self) -> Option<DisplayConfig>;

    /// Pushes `target` to the window system and reports the outcome.
    ///
    /// A backend may defer returning until the compositor has echoed the new
    /// topology, e.g. by awaiting
    /// [`DisplayConfigManager::config_notification`](super::config_manager::DisplayConfigManager::config_notification).
    async fn apply_config(&self, target: Arc<DisplayConfig>) -> Status;

    /// Backend-specific non-exclusive mode change.
    ///
    /// Backends that have no such notion keep the default, which declines.
    async fn set_mode(&self, _monitor: MonitorId, _mode: ModeInfo) -> Status {
        Status::Declined
    }
}

/// Backend used when no window-system adapter is available.
///
/// Fetching yields no data and applying reports
/// [`Status::ErrorNotImplemented`], so every negotiation fails cleanly.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

#[async_trait]
impl DisplayBackend for NullBackend {
    async fn prepare_config_update(&self) -> Option<DisplayConfig> {
        None
    }

    async fn apply_config(&self, _target: Arc<DisplayConfig>) -> Status {
        Status::ErrorNotImplemented
    }
}
