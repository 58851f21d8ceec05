//! Domain entities for display configuration negotiation.
//!
//! This module contains pure logic with no infrastructure dependencies: no
//! window-system calls, no async runtime, no file system.
//!
//! # What lives here? (for beginners)
//!
//! - **`geometry`** – small value types: [`NativeId`](geometry::NativeId),
//!   [`ModeInfo`](geometry::ModeInfo), [`MonitorId`](geometry::MonitorId),
//!   rectangles and extents.
//! - **`snapshot`** – the immutable topology snapshot
//!   ([`DisplayConfig`](snapshot::DisplayConfig)) and its physical/logical
//!   display records, plus mode resolution.
//! - **`layout`** – [`adjust_display`](layout::adjust_display), which resizes
//!   logical outputs from their scale and closes the gaps this opens.
//! - **`screen_info`** – a flattened projection for consumers that do not want
//!   the full topology model.
//!
//! Backends and the negotiation state machine (in `display-manager`) depend on
//! this module; it never depends on them.

pub mod geometry;
pub mod layout;
pub mod screen_info;
pub mod snapshot;
