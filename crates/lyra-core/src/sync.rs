//! Folding surface notifications into one repaint decision.
//!
//! The gutter queues every event it hears and hands the queue to [`plan`]
//! when it synchronises. The result says how much of the widget must be
//! redrawn and whether the gutter width has to be recomputed.

use crate::event::{Invalidation, SurfaceEvent};
use crate::paint::Rect;

/// How much of the editor needs repainting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repaint {
    /// Nothing changed
    #[default]
    Idle,
    /// Content scrolled by `dy` pixels; the gutter shifts with it
    Scroll { dy: i32 },
    /// Content changed inside this widget-space rectangle
    Region(Rect),
    /// Only the highlighted line moved
    CaretOnly,
    /// Everything
    Full,
}

impl Repaint {
    /// Combines two repaint requests into one covering both.
    pub fn merge(self, other: Repaint) -> Repaint {
        use Repaint::*;
        match (self, other) {
            (Idle, other) | (other, Idle) => other,
            (Scroll { dy: a }, Scroll { dy: b }) => Scroll { dy: a + b },
            (Region(a), Region(b)) => Region(a.union(&b)),
            (CaretOnly, CaretOnly) => CaretOnly,
            _ => Full,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Repaint::Idle)
    }
}

/// What one synchronisation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOutcome {
    pub repaint: Repaint,
    /// The gutter width was recalculated and the left margin re-applied
    pub width_recomputed: bool,
    /// The recalculated width differs from the previous one
    pub width_changed: bool,
}

/// Repaint and width decision for a batch of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Plan {
    pub repaint: Repaint,
    pub recompute_width: bool,
}

/// Folds queued events into a single plan. `viewport` is the text area at
/// the time of synchronisation; an edit region covering all of it counts as
/// a layout change.
pub fn plan(events: &[SurfaceEvent], viewport: Rect) -> Plan {
    events.iter().fold(Plan::default(), |acc, event| {
        let (repaint, recompute) = match event {
            SurfaceEvent::CaretLineChanged { .. } => (Repaint::CaretOnly, false),
            SurfaceEvent::GeometryInvalidated(invalidation) => match *invalidation {
                Invalidation::Scrolled { dy } => (Repaint::Scroll { dy }, false),
                Invalidation::Region(rect) => {
                    (Repaint::Region(rect), !viewport.is_empty() && rect.contains(&viewport))
                }
                other => (Repaint::Full, other.affects_width()),
            },
        };
        Plan {
            repaint: acc.repaint.merge(repaint),
            recompute_width: acc.recompute_width || recompute,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Rect = Rect::new(60, 0, 300, 200);

    fn scrolled(dy: i32) -> SurfaceEvent {
        SurfaceEvent::GeometryInvalidated(Invalidation::Scrolled { dy })
    }

    fn region(rect: Rect) -> SurfaceEvent {
        SurfaceEvent::GeometryInvalidated(Invalidation::Region(rect))
    }

    fn caret(previous: usize, current: usize) -> SurfaceEvent {
        SurfaceEvent::CaretLineChanged { previous, current }
    }

    #[test]
    fn test_no_events_is_idle() {
        assert_eq!(plan(&[], VIEWPORT), Plan::default());
        assert!(Plan::default().repaint.is_idle());
    }

    #[test]
    fn test_scrolls_sum() {
        let result = plan(&[scrolled(-20), scrolled(-15), scrolled(5)], VIEWPORT);
        assert_eq!(result.repaint, Repaint::Scroll { dy: -30 });
        assert!(!result.recompute_width);
    }

    #[test]
    fn test_regions_union() {
        let result = plan(
            &[region(Rect::new(60, 20, 300, 20)), region(Rect::new(60, 80, 300, 20))],
            VIEWPORT,
        );
        assert_eq!(result.repaint, Repaint::Region(Rect::new(60, 20, 300, 80)));
        assert!(!result.recompute_width);
    }

    #[test]
    fn test_region_over_whole_viewport_recomputes() {
        let result = plan(&[region(VIEWPORT)], VIEWPORT);
        assert_eq!(result.repaint, Repaint::Region(VIEWPORT));
        assert!(result.recompute_width);
    }

    #[test]
    fn test_caret_only() {
        let result = plan(&[caret(4, 2), caret(2, 3)], VIEWPORT);
        assert_eq!(result.repaint, Repaint::CaretOnly);
        assert!(!result.recompute_width);
    }

    #[test]
    fn test_layout_changes_force_full_with_recompute() {
        for invalidation in [
            Invalidation::LineCountChanged(12),
            Invalidation::Resized { width: 10, height: 10 },
            Invalidation::Reflowed,
        ] {
            let result = plan(&[scrolled(3), SurfaceEvent::GeometryInvalidated(invalidation)], VIEWPORT);
            assert_eq!(result.repaint, Repaint::Full);
            assert!(result.recompute_width);
        }
    }

    #[test]
    fn test_other_mixes_are_full_without_recompute() {
        let result = plan(&[scrolled(-10), caret(0, 1)], VIEWPORT);
        assert_eq!(result, Plan { repaint: Repaint::Full, recompute_width: false });

        let result = plan(&[region(Rect::new(60, 0, 300, 20)), caret(0, 1)], VIEWPORT);
        assert_eq!(result.repaint, Repaint::Full);
        assert!(!result.recompute_width);
    }

    #[test]
    fn test_merge_with_idle_is_identity() {
        let full = Repaint::Full;
        assert_eq!(Repaint::Idle.merge(full), full);
        assert_eq!(Repaint::CaretOnly.merge(Repaint::Idle), Repaint::CaretOnly);
    }
}
