//! Layout adjustment for a candidate display configuration.
//!
//! When a monitor changes mode, or a logical display changes scale, the
//! logical size of that output changes too.  The outputs to its right and
//! below keep their old coordinates, so the desktop ends up with gaps or
//! overlaps.  [`adjust_display`] recomputes each logical size from its
//! monitor's active mode and then snaps neighbours back together.
//!
//! # How the sweep works (for beginners)
//!
//! The logical displays are ordered twice: once by `x` and once by `y`.
//!
//! - **Horizontal pass**: walking the `x` order, each output looks for the
//!   next output (further right in the order) whose vertical extent overlaps
//!   its own.  That neighbour's `x` is moved to exactly the current output's
//!   right edge.
//! - **Vertical pass**: the same walk over the `y` order, moving the first
//!   horizontally-overlapping neighbour's `y` to the current bottom edge.
//!
//! This is a single relaxation pass, not a fixed-point iteration.  Rows and
//! columns come out gap-free; staggered or L-shaped arrangements may keep a
//! residual gap because only the *first* overlapping neighbour is moved.
//!
//! ```text
//!   before (DP-1 grew from 1920 to 2560)      after
//!   ┌────────┬──┐                            ┌──────────┐┌────────┐
//!   │  DP-1  │  │ DP-2                       │   DP-1   ││  DP-2  │
//!   └────────┴──┘                            └──────────┘└────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::geometry::{Extent2, IRect};
use super::snapshot::DisplayConfig;

/// How a logical display's `scale` relates to the buffer size the backend
/// expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalingMode {
    /// The compositor renders at the next integer scale and downsamples
    /// (fractional-scale Wayland compositors): `size * ceil(scale) / scale`.
    #[default]
    #[serde(alias = "post_scaling", rename = "post")]
    PostScaling,
    /// The scale is applied to the buffer directly (X11 RandR, Win32,
    /// Android): `size * scale`.
    #[serde(alias = "direct_scaling", rename = "direct")]
    DirectScaling,
}

/// Computes the logical size of an output showing a `pixels`-sized mode at
/// `scale`.
///
/// A non-finite or non-positive scale is treated as 1.0.
pub fn logical_size(pixels: Extent2, scale: f32, mode: ScalingMode) -> Extent2 {
    let scale = if scale.is_finite() && scale > 0.0 {
        f64::from(scale)
    } else {
        1.0
    };
    let factor = match mode {
        ScalingMode::PostScaling => scale.ceil() / scale,
        ScalingMode::DirectScaling => scale,
    };
    Extent2::new(
        (f64::from(pixels.width) * factor).round() as u32,
        (f64::from(pixels.height) * factor).round() as u32,
    )
}

/// Recomputes logical sizes and removes gaps/overlaps between adjacent
/// logical displays, in place.
///
/// A logical display whose first monitor is missing from `config.monitors`,
/// or reports no modes, keeps its current size.
pub fn adjust_display(config: &mut DisplayConfig, mode: ScalingMode) {
    let sizes: Vec<Option<Extent2>> = config
        .logical
        .iter()
        .map(|logical| {
            let monitor = logical.monitors.first().and_then(|id| config.get_monitor(id))?;
            let current = monitor.get_current();
            if current.is_none() {
                return None;
            }
            Some(logical_size(current.mode.extent(), logical.scale, mode))
        })
        .collect();

    for (logical, size) in config.logical.iter_mut().zip(sizes) {
        match size {
            Some(size) => {
                logical.rect.width = size.width;
                logical.rect.height = size.height;
            }
            None => warn!(
                xid = logical.xid.get(),
                "logical display has no resolvable monitor mode; keeping its size"
            ),
        }
    }

    let by_x = ordered_by(config, |rect| rect.x);
    let by_y = ordered_by(config, |rect| rect.y);

    // Horizontal pass
    for (pos, &index) in by_x.iter().enumerate() {
        let rect = config.logical[index].rect;
        let neighbour = by_x[pos + 1..].iter().copied().find(|&next| {
            let next = &config.logical[next].rect;
            ranges_overlap(rect.y, rect.bottom(), next.y, next.bottom())
        });
        if let Some(next) = neighbour {
            debug!(from = config.logical[next].rect.x, to = rect.right(), "snapping x");
            config.logical[next].rect.x = rect.right();
        }
    }

    // Vertical pass
    for (pos, &index) in by_y.iter().enumerate() {
        let rect = config.logical[index].rect;
        let neighbour = by_y[pos + 1..].iter().copied().find(|&next| {
            let next = &config.logical[next].rect;
            ranges_overlap(rect.x, rect.right(), next.x, next.right())
        });
        if let Some(next) = neighbour {
            debug!(from = config.logical[next].rect.y, to = rect.bottom(), "snapping y");
            config.logical[next].rect.y = rect.bottom();
        }
    }
}

/// Indices of `config.logical` in ascending `key` order.
///
/// Built by ordered insertion: a new entry goes in front of the first entry
/// whose key is not smaller, so ties keep reverse insertion order.
fn ordered_by(config: &DisplayConfig, key: impl Fn(&IRect) -> i32) -> Vec<usize> {
    let mut order: Vec<usize> = Vec::with_capacity(config.logical.len());
    for (index, logical) in config.logical.iter().enumerate() {
        let value = key(&logical.rect);
        let pos = order
            .iter()
            .position(|&i| key(&config.logical[i].rect) >= value)
            .unwrap_or(order.len());
        order.insert(pos, index);
    }
    order
}

/// Returns `true` if the 1-D intervals `[a_start, a_end)` and `[b_start, b_end)` overlap.
///
/// Touching intervals (`a_end == b_start`) do not overlap.
pub fn ranges_overlap(a_start: i32, a_end: i32, b_start: i32, b_end: i32) -> bool {
    a_start < b_end && b_start < a_end
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::{ModeInfo, MonitorId};
    use crate::domain::snapshot::{DisplayMode, LogicalDisplay, PhysicalDisplay};

    fn monitor(name: &str, width: u32, height: u32) -> PhysicalDisplay {
        PhysicalDisplay {
            id: MonitorId::new(name, vec![]),
            modes: vec![DisplayMode {
                mode: ModeInfo::new(width, height, 60_000),
                current: true,
                preferred: true,
                ..DisplayMode::default()
            }],
            ..PhysicalDisplay::default()
        }
    }

    fn output(name: &str, x: i32, y: i32, scale: f32) -> LogicalDisplay {
        LogicalDisplay {
            rect: IRect::new(x, y, 0, 0),
            scale,
            monitors: vec![MonitorId::new(name, vec![])],
            ..LogicalDisplay::default()
        }
    }

    fn config(monitors: Vec<PhysicalDisplay>, logical: Vec<LogicalDisplay>) -> DisplayConfig {
        DisplayConfig {
            monitors,
            logical,
            ..DisplayConfig::default()
        }
    }

    // ── logical_size ──────────────────────────────────────────────────────────

    #[test]
    fn test_logical_size_post_scaling_uses_integer_upscale() {
        let size = logical_size(Extent2::new(1920, 1080), 1.5, ScalingMode::PostScaling);
        assert_eq!(size, Extent2::new(2560, 1440));
    }

    #[test]
    fn test_logical_size_direct_scaling_multiplies() {
        let size = logical_size(Extent2::new(1920, 1080), 1.5, ScalingMode::DirectScaling);
        assert_eq!(size, Extent2::new(2880, 1620));
    }

    #[test]
    fn test_logical_size_integer_scale_is_identity_for_post_scaling() {
        let size = logical_size(Extent2::new(3840, 2160), 2.0, ScalingMode::PostScaling);
        assert_eq!(size, Extent2::new(3840, 2160));
    }

    #[test]
    fn test_logical_size_invalid_scale_is_treated_as_one() {
        for scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            for mode in [ScalingMode::PostScaling, ScalingMode::DirectScaling] {
                assert_eq!(
                    logical_size(Extent2::new(1280, 720), scale, mode),
                    Extent2::new(1280, 720)
                );
            }
        }
    }

    // ── ordered_by ────────────────────────────────────────────────────────────

    #[test]
    fn test_ordered_by_sorts_ascending() {
        let cfg = config(
            vec![],
            vec![
                output("a", 3840, 0, 1.0),
                output("b", 0, 0, 1.0),
                output("c", 1920, 0, 1.0),
            ],
        );
        assert_eq!(ordered_by(&cfg, |r| r.x), vec![1, 2, 0]);
    }

    #[test]
    fn test_ordered_by_places_later_ties_first() {
        let cfg = config(
            vec![],
            vec![output("a", 0, 0, 1.0), output("b", 0, 0, 1.0)],
        );
        assert_eq!(ordered_by(&cfg, |r| r.x), vec![1, 0]);
    }

    // ── adjust_display ────────────────────────────────────────────────────────

    #[test]
    fn test_adjust_display_closes_horizontal_gap() {
        let mut cfg = config(
            vec![monitor("DP-1", 1920, 1080), monitor("DP-2", 1920, 1080)],
            vec![output("DP-1", 0, 0, 1.0), output("DP-2", 2000, 0, 1.0)],
        );

        adjust_display(&mut cfg, ScalingMode::PostScaling);

        assert_eq!(cfg.logical[0].rect, IRect::new(0, 0, 1920, 1080));
        assert_eq!(cfg.logical[1].rect, IRect::new(1920, 0, 1920, 1080));
    }

    #[test]
    fn test_adjust_display_pushes_neighbour_when_output_grows() {
        let mut cfg = config(
            vec![monitor("DP-1", 2560, 1440), monitor("DP-2", 1920, 1080)],
            vec![output("DP-1", 0, 0, 1.0), output("DP-2", 1920, 0, 1.0)],
        );

        adjust_display(&mut cfg, ScalingMode::DirectScaling);

        assert_eq!(cfg.logical[1].rect.x, 2560);
        assert_eq!(cfg.logical[1].rect.y, 0);
    }

    #[test]
    fn test_adjust_display_closes_vertical_gap() {
        let mut cfg = config(
            vec![monitor("top", 1920, 1080), monitor("bottom", 1920, 1080)],
            vec![output("top", 0, 0, 1.0), output("bottom", 0, 1200, 1.0)],
        );

        adjust_display(&mut cfg, ScalingMode::PostScaling);

        assert_eq!(cfg.logical[1].rect.y, 1080);
        assert_eq!(cfg.logical[1].rect.x, 0);
    }

    #[test]
    fn test_adjust_display_applies_scale_before_snapping() {
        let mut cfg = config(
            vec![monitor("DP-1", 1920, 1080), monitor("DP-2", 1920, 1080)],
            vec![output("DP-1", 0, 0, 1.5), output("DP-2", 1920, 0, 1.0)],
        );

        adjust_display(&mut cfg, ScalingMode::PostScaling);

        assert_eq!(cfg.logical[0].rect.width, 2560);
        assert_eq!(cfg.logical[1].rect.x, 2560);
    }

    #[test]
    fn test_adjust_display_leaves_non_overlapping_rows_alone() {
        // DP-2 sits below-right of DP-1 with no shared vertical extent, so the
        // horizontal pass has nothing to snap to.
        let mut cfg = config(
            vec![monitor("DP-1", 1920, 1080), monitor("DP-2", 1920, 1080)],
            vec![output("DP-1", 0, 0, 1.0), output("DP-2", 2500, 1080, 1.0)],
        );

        adjust_display(&mut cfg, ScalingMode::PostScaling);

        assert_eq!(cfg.logical[1].rect.x, 2500);
        assert_eq!(cfg.logical[1].rect.y, 1080);
    }

    #[test]
    fn test_adjust_display_keeps_size_when_monitor_is_missing() {
        let mut orphan = output("ghost", 0, 0, 1.0);
        orphan.rect.width = 800;
        orphan.rect.height = 600;
        let mut cfg = config(vec![], vec![orphan]);

        adjust_display(&mut cfg, ScalingMode::PostScaling);

        assert_eq!(cfg.logical[0].rect, IRect::new(0, 0, 800, 600));
    }

    #[test]
    fn test_adjust_display_on_empty_config_is_noop() {
        let mut cfg = config(vec![], vec![]);
        adjust_display(&mut cfg, ScalingMode::DirectScaling);
        assert!(cfg.logical.is_empty());
    }

    #[test]
    fn test_adjust_display_uses_first_monitor_of_clone_group() {
        let mut group = output("big", 0, 0, 1.0);
        group.monitors.push(MonitorId::new("small", vec![]));
        let mut cfg = config(
            vec![monitor("big", 2560, 1440), monitor("small", 1280, 720)],
            vec![group],
        );

        adjust_display(&mut cfg, ScalingMode::PostScaling);

        assert_eq!(cfg.logical[0].rect.extent(), Extent2::new(2560, 1440));
    }

    // ── ranges_overlap ────────────────────────────────────────────────────────

    #[test]
    fn test_ranges_overlap_returns_true_for_overlapping_ranges() {
        assert!(ranges_overlap(0, 100, 50, 150));
    }

    #[test]
    fn test_ranges_overlap_returns_false_for_adjacent_ranges() {
        assert!(!ranges_overlap(0, 100, 100, 200));
    }

    #[test]
    fn test_ranges_overlap_returns_false_for_separated_ranges() {
        assert!(!ranges_overlap(0, 100, 200, 300));
    }
}
