//! Small value types shared by every snapshot: native handles, timing modes,
//! stable monitor identities, and integer rectangles.
//!
//! # Why two kinds of monitor identity? (for beginners)
//!
//! A window-system backend hands out *transient* handles for outputs and modes
//! (an X11 RandR output id, a Wayland object pointer, a Win32 adapter index).
//! Those handles change when a monitor is unplugged and replugged, or when the
//! backend reconnects.  [`NativeId`] wraps such a handle; the engine only ever
//! compares it for equality.
//!
//! [`MonitorId`] is the *stable* identity: the connector name plus the EDID
//! blob the monitor reports.  It survives replugging and reboots, so it is the
//! key used to match a saved configuration against a freshly fetched one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reserved monitor name used by [`MonitorId::primary`].
const PRIMARY_MONITOR_NAME: &str = "@primary";

// ── NativeId ──────────────────────────────────────────────────────────────────

/// Backend-opaque handle for an output, CRTC, logical monitor or mode.
///
/// Holds either an integer id or a pointer-sized token.  The bits are never
/// interpreted; only equality and lookup are meaningful.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NativeId(pub u64);

impl NativeId {
    /// The "no handle" value.
    pub const NONE: NativeId = NativeId(0);

    /// Wraps a pointer-sized token (e.g. a Wayland proxy address).
    pub fn from_token<T>(token: *const T) -> Self {
        Self(token as usize as u64)
    }

    /// Returns the raw handle bits.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for NativeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<u32> for NativeId {
    fn from(value: u32) -> Self {
        Self(u64::from(value))
    }
}

// ── Extent2 / IRect ───────────────────────────────────────────────────────────

/// Width and height in pixels (or millimetres, depending on context).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent2 {
    pub width: u32,
    pub height: u32,
}

impl Extent2 {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// An integer rectangle in desktop coordinates.
///
/// `x` and `y` are the top-left corner and may be negative (a monitor placed
/// to the left of or above the origin).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl IRect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the rightmost X coordinate (exclusive), saturating at `i32::MAX`.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(saturate_i32(self.width))
    }

    /// Returns the bottommost Y coordinate (exclusive), saturating at `i32::MAX`.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(saturate_i32(self.height))
    }

    /// Returns the size of the rectangle.
    pub fn extent(&self) -> Extent2 {
        Extent2::new(self.width, self.height)
    }
}

fn saturate_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

// ── ModeInfo ──────────────────────────────────────────────────────────────────

/// A display timing mode: resolution, refresh rate and scale.
///
/// `rate` is in millihertz (`60_000` = 60 Hz), the unit most compositor
/// protocols report.  Two sentinel values are part of the contract:
/// [`ModeInfo::CURRENT`] and [`ModeInfo::PREFERRED`].  They are resolved by
/// [`PhysicalDisplay::get_mode`](crate::PhysicalDisplay::get_mode) and must
/// never be compared against real modes directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeInfo {
    pub width: u32,
    pub height: u32,
    pub rate: u32,
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_scale() -> f32 {
    1.0
}

impl ModeInfo {
    /// Sentinel: whatever mode is presently active on the monitor.
    pub const CURRENT: ModeInfo = ModeInfo {
        width: u32::MAX,
        height: u32::MAX,
        rate: u32::MAX,
        scale: 1.0,
    };

    /// Sentinel: the mode the monitor advertises as preferred.
    pub const PREFERRED: ModeInfo = ModeInfo {
        width: u32::MAX,
        height: u32::MAX,
        rate: u32::MAX - 1,
        scale: 1.0,
    };

    /// Creates a mode with a scale of 1.0.
    pub const fn new(width: u32, height: u32, rate: u32) -> Self {
        Self {
            width,
            height,
            rate,
            scale: 1.0,
        }
    }

    pub fn is_current(&self) -> bool {
        *self == Self::CURRENT
    }

    pub fn is_preferred(&self) -> bool {
        *self == Self::PREFERRED
    }

    /// Pixel size of the mode.
    pub fn extent(&self) -> Extent2 {
        Extent2::new(self.width, self.height)
    }
}

impl Default for ModeInfo {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

impl fmt::Display for ModeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_current() {
            return f.write_str("current");
        }
        if self.is_preferred() {
            return f.write_str("preferred");
        }
        write!(
            f,
            "{}x{}@{}.{:03}",
            self.width,
            self.height,
            self.rate / 1000,
            self.rate % 1000
        )
    }
}

/// Error returned when a mode string such as `"1920x1080@60"` cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseModeError {
    #[error("expected WIDTHxHEIGHT[@RATE], got {0:?}")]
    Format(String),
    #[error("invalid number {0:?} in mode string")]
    Number(String),
}

impl FromStr for ModeInfo {
    type Err = ParseModeError;

    /// Parses `current`, `preferred`, or `WIDTHxHEIGHT[@HZ]` where `HZ` may
    /// carry up to three decimals (`59.94`).  A missing rate parses as 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current" => return Ok(Self::CURRENT),
            "preferred" => return Ok(Self::PREFERRED),
            _ => {}
        }

        let (size, rate) = match s.split_once('@') {
            Some((size, rate)) => (size, Some(rate)),
            None => (s, None),
        };
        let (width, height) = size
            .split_once('x')
            .ok_or_else(|| ParseModeError::Format(s.to_string()))?;

        let parse_u32 =
            |v: &str| v.parse::<u32>().map_err(|_| ParseModeError::Number(v.to_string()));

        let rate = match rate {
            Some(rate) => {
                let hz: f64 = rate
                    .parse()
                    .map_err(|_| ParseModeError::Number(rate.to_string()))?;
                if !hz.is_finite() || hz < 0.0 {
                    return Err(ParseModeError::Number(rate.to_string()));
                }
                (hz * 1000.0).round() as u32
            }
            None => 0,
        };

        Ok(Self::new(parse_u32(width)?, parse_u32(height)?, rate))
    }
}

// ── MonitorId ─────────────────────────────────────────────────────────────────

/// Stable identity of a physical monitor: connector name plus EDID blob.
///
/// Two reserved values exist: [`MonitorId::NONE`] ("disable" / no monitor)
/// and [`MonitorId::primary`] ("whichever monitor is primary").
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct MonitorId {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edid: Vec<u8>,
}

impl MonitorId {
    /// The "no monitor" sentinel.
    pub const NONE: MonitorId = MonitorId {
        name: String::new(),
        edid: Vec::new(),
    };

    pub fn new(name: impl Into<String>, edid: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            edid,
        }
    }

    /// The "use the primary monitor" sentinel.
    pub fn primary() -> Self {
        Self {
            name: PRIMARY_MONITOR_NAME.to_string(),
            edid: Vec::new(),
        }
    }

    pub fn is_primary(&self) -> bool {
        self.edid.is_empty() && self.name == PRIMARY_MONITOR_NAME
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("<none>")
        } else {
            f.write_str(&self.name)
        }
    }
}
