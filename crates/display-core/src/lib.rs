//! # display-core
//!
//! Shared library for the display configuration negotiator containing the
//! topology snapshot model, mode resolution, and the multi-monitor layout
//! adjustment algorithm.
//!
//! It has zero dependencies on window-system APIs, async runtimes, or the
//! file system.  The negotiation state machine and backend adapters live in
//! the `display-manager` crate.
//!
//! # Architecture overview (for beginners)
//!
//! A machine has *physical* monitors (real screens, each with a list of
//! supported modes) and *logical* outputs (the compositor's placement of
//! those screens on the desktop, with a scale and rotation).  A backend
//! (D-Bus portal, Wayland protocol, X11 RandR, Win32) reports both as one
//! [`DisplayConfig`] snapshot.
//!
//! - **`domain`** – the snapshot types, mode lookup with sentinel resolution,
//!   and [`adjust_display`], which keeps the desktop gap-free after a mode or
//!   scale change.
//! - **`status`** – the [`Status`] codes every negotiation resolves to.

pub mod domain;
pub mod status;

// Re-export the most-used types at the crate root so callers can write
// `display_core::DisplayConfig` instead of `display_core::domain::snapshot::DisplayConfig`.
pub use domain::geometry::{Extent2, IRect, ModeInfo, MonitorId, NativeId, ParseModeError};
pub use domain::layout::{adjust_display, logical_size, ScalingMode};
pub use domain::screen_info::{MonitorInfo, ScreenInfo};
pub use domain::snapshot::{
    DisplayConfig, DisplayMode, LogicalDisplay, NativeToken, PhysicalDisplay,
};
pub use status::{Status, StatusError};
