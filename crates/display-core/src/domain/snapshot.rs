//! Immutable, timestamped snapshots of the whole display topology.
//!
//! A [`DisplayConfig`] is built by a backend on every topology event or
//! on-demand fetch and is never mutated once it has been shared: the manager
//! wraps it in an `Arc` and may hold the same snapshot as both "current" and
//! "saved".  A modified configuration is always a fresh value built from an
//! old one.
//!
//! # Physical vs. logical displays (for beginners)
//!
//! A *physical* display ([`PhysicalDisplay`]) is a real screen with a menu of
//! timing modes.  A *logical* display ([`LogicalDisplay`]) is the compositor's
//! rendering surface: it has a position, a scale and a rotation, and it may be
//! shown on several cloned physical monitors at once.  The link between them is
//! [`LogicalDisplay::monitors`], a list of [`MonitorId`] foreign keys into
//! [`DisplayConfig::monitors`].

use std::any::Any;
use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::geometry::{Extent2, IRect, ModeInfo, MonitorId, NativeId};

/// Lower bound for the millimetres-per-pixel ratio used by [`DisplayConfig::size_mm`].
const MIN_MM_PER_PIXEL: f32 = 0.01;

/// Backend-owned payload carried alongside a snapshot (e.g. raw RandR replies).
///
/// The engine never inspects it; it is forwarded from a fetched snapshot to
/// the target built from it so the backend can find its own bookkeeping again.
pub type NativeToken = Arc<dyn Any + Send + Sync>;

static DISPLAY_MODE_NONE: DisplayMode = DisplayMode {
    xid: NativeId::NONE,
    mode: ModeInfo::new(0, 0, 0),
    id: String::new(),
    name: String::new(),
    scales: Vec::new(),
    preferred: false,
    current: false,
};

// ── DisplayMode ───────────────────────────────────────────────────────────────

/// One concrete, enumerable mode of a physical monitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayMode {
    #[serde(default)]
    pub xid: NativeId,
    pub mode: ModeInfo,
    /// Backend mode identifier (e.g. a GNOME Mutter mode id string).
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Scale factors the compositor accepts for this mode.
    #[serde(default)]
    pub scales: Vec<f32>,
    #[serde(default)]
    pub preferred: bool,
    #[serde(default)]
    pub current: bool,
}

impl DisplayMode {
    /// The empty sentinel returned by [`PhysicalDisplay::get_current`] when a
    /// monitor reports no modes at all.
    pub fn none() -> &'static DisplayMode {
        &DISPLAY_MODE_NONE
    }

    pub fn is_none(&self) -> bool {
        self == Self::none()
    }
}

impl PartialEq<ModeInfo> for DisplayMode {
    fn eq(&self, other: &ModeInfo) -> bool {
        self.mode == *other
    }
}

// ── PhysicalDisplay ───────────────────────────────────────────────────────────

/// One physical monitor as currently detected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalDisplay {
    #[serde(default)]
    pub xid: NativeId,
    #[serde(default)]
    pub index: u32,
    pub id: MonitorId,
    /// Physical size in millimetres.
    #[serde(default)]
    pub mm: Extent2,
    #[serde(default)]
    pub modes: Vec<DisplayMode>,
}

impl PhysicalDisplay {
    /// Copies identity fields only, with an empty mode list.
    pub fn without_modes(&self) -> Self {
        Self {
            xid: self.xid,
            index: self.index,
            id: self.id.clone(),
            mm: self.mm,
            modes: Vec::new(),
        }
    }

    /// Resolves a requested mode against this monitor's mode list.
    ///
    /// [`ModeInfo::CURRENT`] resolves like [`get_current`](Self::get_current);
    /// [`ModeInfo::PREFERRED`] resolves to the flagged-preferred mode, else the
    /// first mode.  Any other value must match a mode structurally.  Returns
    /// `None` when nothing matches or the mode list is empty.
    pub fn get_mode(&self, mode: &ModeInfo) -> Option<&DisplayMode> {
        if self.modes.is_empty() {
            return None;
        }
        if mode.is_current() {
            Some(self.get_current())
        } else if mode.is_preferred() {
            self.modes
                .iter()
                .find(|m| m.preferred)
                .or_else(|| self.modes.first())
        } else {
            self.modes.iter().find(|m| m.mode == *mode)
        }
    }

    /// Returns the active mode.
    ///
    /// Fallback order: flagged current, flagged preferred, first element, and
    /// [`DisplayMode::none`] when the list is empty.
    pub fn get_current(&self) -> &DisplayMode {
        self.modes
            .iter()
            .find(|m| m.current)
            .or_else(|| self.modes.iter().find(|m| m.preferred))
            .or_else(|| self.modes.first())
            .unwrap_or_else(|| DisplayMode::none())
    }
}

// ── LogicalDisplay ────────────────────────────────────────────────────────────

/// One compositor-level output, possibly cloned onto several monitors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalDisplay {
    #[serde(default)]
    pub xid: NativeId,
    pub rect: IRect,
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Backend rotation/reflection code.
    #[serde(default)]
    pub transform: u32,
    #[serde(default)]
    pub primary: bool,
    /// Monitors showing this output; the first one drives its size.
    pub monitors: Vec<MonitorId>,
}

fn default_scale() -> f32 {
    1.0
}

impl Default for LogicalDisplay {
    fn default() -> Self {
        Self {
            xid: NativeId::NONE,
            rect: IRect::default(),
            scale: 1.0,
            transform: 0,
            primary: false,
            monitors: Vec::new(),
        }
    }
}

impl LogicalDisplay {
    pub fn has_monitor(&self, id: &MonitorId) -> bool {
        self.monitors.iter().any(|m| m == id)
    }

    /// Copy of this output showing only `id`, breaking any clone group.
    pub fn single(&self, id: MonitorId) -> Self {
        Self {
            monitors: vec![id],
            ..self.clone()
        }
    }
}

// ── DisplayConfig ─────────────────────────────────────────────────────────────

/// Snapshot of the whole display topology at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Backend configuration serial (Mutter serial, RandR config timestamp, ...).
    #[serde(default)]
    pub serial: u32,
    #[serde(default)]
    pub desktop_rect: IRect,
    #[serde(default)]
    pub monitors: Vec<PhysicalDisplay>,
    #[serde(default)]
    pub logical: Vec<LogicalDisplay>,
    #[serde(skip)]
    pub native: Option<NativeToken>,
    #[serde(skip, default = "SystemTime::now")]
    pub time: SystemTime,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            serial: 0,
            desktop_rect: IRect::default(),
            monitors: Vec::new(),
            logical: Vec::new(),
            native: None,
            time: SystemTime::now(),
        }
    }
}

impl DisplayConfig {
    /// Finds a physical monitor by stable identity.
    ///
    /// [`MonitorId::primary`] resolves to the first monitor of the primary
    /// logical display.
    pub fn get_monitor(&self, id: &MonitorId) -> Option<&PhysicalDisplay> {
        if id.is_primary() {
            if let Some(first) = self
                .logical
                .iter()
                .find(|l| l.primary)
                .and_then(|l| l.monitors.first())
            {
                if !first.is_primary() {
                    return self.get_monitor(first);
                }
            }
        }
        self.monitors.iter().find(|m| m.id == *id)
    }

    /// Finds the logical display showing `id`, preferring one where `id` is
    /// the first (size-driving) monitor.
    pub fn get_logical(&self, id: &MonitorId) -> Option<&LogicalDisplay> {
        self.logical
            .iter()
            .find(|l| l.monitors.first() == Some(id))
            .or_else(|| self.logical.iter().find(|l| l.has_monitor(id)))
    }

    pub fn get_logical_by_xid(&self, xid: NativeId) -> Option<&LogicalDisplay> {
        self.logical.iter().find(|l| l.xid == xid)
    }

    /// Structural equality over `serial`, `monitors` and `logical`.
    ///
    /// `time` and `native` are ignored.
    pub fn is_equal(&self, other: &DisplayConfig) -> bool {
        self.serial == other.serial
            && self.monitors == other.monitors
            && self.logical == other.logical
    }

    /// Size of the desktop covered by all logical displays, measured from the
    /// origin.
    pub fn size(&self) -> Extent2 {
        let (width, height) = self.logical.iter().fold((0i64, 0i64), |(w, h), l| {
            (
                w.max(i64::from(l.rect.x) + i64::from(l.rect.width)),
                h.max(i64::from(l.rect.y) + i64::from(l.rect.height)),
            )
        });
        Extent2::new(clamp_u32(width), clamp_u32(height))
    }

    /// Approximate physical size of the desktop in millimetres, using the
    /// coarsest millimetres-per-pixel ratio among the monitors' preferred modes.
    pub fn size_mm(&self) -> Extent2 {
        let size = self.size();
        let ratio = self
            .monitors
            .iter()
            .filter_map(|m| m.get_mode(&ModeInfo::PREFERRED).map(|mode| (m.mm, mode.mode)))
            .filter(|(_, mode)| mode.width > 0 && mode.height > 0)
            .fold(MIN_MM_PER_PIXEL, |ratio, (mm, mode)| {
                ratio
                    .max(mm.width as f32 / mode.width as f32)
                    .max(mm.height as f32 / mode.height as f32)
            });
        Extent2::new(
            (size.width as f32 * ratio) as u32,
            (size.height as f32 * ratio) as u32,
        )
    }

    /// Reduced copy that keeps only each monitor's active mode.
    ///
    /// Used as the restore checkpoint before an exclusive mode change.
    /// Monitors without any mode keep an empty list.
    pub fn extract_current(&self) -> DisplayConfig {
        let monitors = self
            .monitors
            .iter()
            .map(|m| {
                let mut reduced = m.without_modes();
                if !m.modes.is_empty() {
                    reduced.modes.push(m.get_current().clone());
                }
                reduced
            })
            .collect();

        DisplayConfig {
            serial: self.serial,
            desktop_rect: self.desktop_rect,
            monitors,
            logical: self.logical.clone(),
            native: self.native.clone(),
            time: self.time,
        }
    }
}

fn clamp_u32(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

// ── Tests ─────────────────────────────────────────────────────────────────────
