//! Target construction for exclusive mode changes and restores.
//!
//! Both builders are pure: they read a freshly fetched snapshot plus the
//! manager's checkpoints and return a brand-new [`DisplayConfig`].  Every mode
//! written into a target is taken from the *live* mode list of the fetched
//! snapshot, so backend handles ([`NativeId`](display_core::NativeId)s, mode
//! id strings) from an older backend session never leak into a request.
//!
//! # Best-effort builds (for beginners)
//!
//! A build does not stop at the first monitor it cannot resolve.  It completes
//! the whole topology (falling back to each monitor's current mode) and reports
//! the problem through the returned [`Status`].  The manager then decides not
//! to call the backend at all, so a partial topology is never pushed.

use display_core::{
    DisplayConfig, DisplayMode, LogicalDisplay, ModeInfo, MonitorId, PhysicalDisplay, Status,
};
use tracing::warn;

/// Builds the target snapshot for an exclusive mode change on `target`.
///
/// - The target monitor gets `mode` resolved against its live mode list.
/// - Every other monitor keeps the mode recorded for it in `saved` (else in
///   `current`), resolved against the live list.
/// - Logical displays showing the target monitor are reduced to that monitor
///   alone; all other logical displays are copied unchanged.
///
/// Returns [`Status::Ok`] only when every monitor resolved.  An unresolvable
/// target monitor or mode yields [`Status::ErrorInvalidArgument`]; an
/// unresolvable other monitor yields [`Status::ErrorNotImplemented`].
pub fn build_exclusive_target(
    data: &DisplayConfig,
    current: &DisplayConfig,
    saved: &DisplayConfig,
    target: &MonitorId,
    mode: &ModeInfo,
) -> (DisplayConfig, Status) {
    let target_id = data
        .get_monitor(target)
        .map(|m| m.id.clone())
        .unwrap_or_else(|| target.clone());

    let mut target_resolved = false;
    let mut others_resolved = true;
    let mut monitors = Vec::with_capacity(data.monitors.len());

    for monitor in &data.monitors {
        let mut out = monitor.without_modes();
        if monitor.id == target_id {
            match monitor.get_mode(mode) {
                Some(resolved) => {
                    out.modes.push(resolved.clone());
                    target_resolved = true;
                }
                None => {
                    warn!(monitor = %monitor.id, %mode, "requested mode not found; keeping current");
                    push_current(&mut out, monitor);
                }
            }
        } else {
            let recorded = recorded_mode(saved, &monitor.id)
                .or_else(|| recorded_mode(current, &monitor.id));
            match recorded.and_then(|r| monitor.get_mode(&r.mode)) {
                Some(resolved) => out.modes.push(resolved.clone()),
                None => {
                    warn!(monitor = %monitor.id, "no recorded mode for monitor; keeping current");
                    others_resolved = false;
                    push_current(&mut out, monitor);
                }
            }
        }
        monitors.push(out);
    }

    let logical = data
        .logical
        .iter()
        .map(|l| {
            if l.has_monitor(&target_id) {
                l.single(target_id.clone())
            } else {
                l.clone()
            }
        })
        .collect();

    let status = if !target_resolved {
        Status::ErrorInvalidArgument
    } else if !others_resolved {
        Status::ErrorNotImplemented
    } else {
        Status::Ok
    };

    (derive_from(data, monitors, logical), status)
}

/// Builds the target snapshot that returns the live topology to `saved`.
///
/// Every live monitor must appear in `saved` with at least one recorded mode,
/// and that mode must still exist in the live mode list.  Returns `None` if
/// any monitor cannot be restored.  On success the logical layout is copied
/// verbatim from `saved`.
pub fn build_restore_target(data: &DisplayConfig, saved: &DisplayConfig) -> Option<DisplayConfig> {
    let mut restored = true;
    let mut monitors = Vec::with_capacity(data.monitors.len());

    for monitor in &data.monitors {
        let mut out = monitor.without_modes();
        let resolved = saved
            .get_monitor(&monitor.id)
            .filter(|s| !s.modes.is_empty())
            .and_then(|s| monitor.get_mode(&s.get_current().mode));
        match resolved {
            Some(mode) => out.modes.push(mode.clone()),
            None => {
                warn!(monitor = %monitor.id, "monitor cannot be restored from checkpoint");
                restored = false;
            }
        }
        monitors.push(out);
    }

    restored.then(|| derive_from(data, monitors, saved.logical.clone()))
}

fn recorded_mode<'a>(config: &'a DisplayConfig, id: &MonitorId) -> Option<&'a DisplayMode> {
    config.get_monitor(id).and_then(|m| m.modes.first())
}

fn push_current(out: &mut PhysicalDisplay, live: &PhysicalDisplay) {
    let current = live.get_current();
    if !current.is_none() {
        out.modes.push(current.clone());
    }
}

fn derive_from(
    data: &DisplayConfig,
    monitors: Vec<PhysicalDisplay>,
    logical: Vec<LogicalDisplay>,
) -> DisplayConfig {
    DisplayConfig {
        serial: data.serial,
        desktop_rect: data.desktop_rect,
        monitors,
        logical,
        native: data.native.clone(),
        time: data.time,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
