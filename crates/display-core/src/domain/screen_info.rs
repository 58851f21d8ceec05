//! Flattened, read-only view of the current topology.
//!
//! Consumers that only need "which monitors exist, which modes do they
//! support, which one is primary" (a fullscreen picker, a settings page) use
//! [`ScreenInfo`] instead of walking the full [`DisplayConfig`].

use serde::{Deserialize, Serialize};

use super::geometry::{ModeInfo, MonitorId};
use super::snapshot::DisplayConfig;

/// One monitor and its mode menu.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edid: Vec<u8>,
    pub modes: Vec<ModeInfo>,
    /// Index into `modes` of the mode flagged preferred (0 if none is flagged).
    pub preferred_mode: usize,
    /// Index into `modes` of the mode flagged current (0 if none is flagged).
    pub current_mode: usize,
}

impl MonitorInfo {
    /// Stable identity of this monitor.
    pub fn id(&self) -> MonitorId {
        MonitorId::new(self.name.clone(), self.edid.clone())
    }

    pub fn matches(&self, id: &MonitorId) -> bool {
        self.name == id.name && self.edid == id.edid
    }
}

/// Monitors plus the index of the primary one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenInfo {
    pub monitors: Vec<MonitorInfo>,
    pub primary_monitor: usize,
}

impl ScreenInfo {
    pub fn from_config(config: &DisplayConfig) -> Self {
        let mut info = Self::default();
        info.append_config(config);
        info
    }

    /// Appends the monitors of `config` and points `primary_monitor` at the
    /// first monitor of the primary logical display, if it is present.
    pub fn append_config(&mut self, config: &DisplayConfig) {
        for monitor in &config.monitors {
            let mut info = MonitorInfo {
                name: monitor.id.name.clone(),
                edid: monitor.id.edid.clone(),
                ..MonitorInfo::default()
            };
            for (index, mode) in monitor.modes.iter().enumerate() {
                if mode.preferred {
                    info.preferred_mode = index;
                }
                if mode.current {
                    info.current_mode = index;
                }
                info.modes.push(mode.mode);
            }
            self.monitors.push(info);
        }

        let primary = config
            .logical
            .iter()
            .filter(|l| l.primary)
            .flat_map(|l| l.monitors.iter())
            .find_map(|id| self.monitors.iter().position(|m| m.matches(id)));
        if let Some(index) = primary {
            self.primary_monitor = index;
        }
    }

    pub fn primary(&self) -> Option<&MonitorInfo> {
        self.monitors.get(self.primary_monitor)
    }
}
