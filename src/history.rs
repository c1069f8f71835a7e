/// Undo/redo state machine over transform records
///
/// History entries are full snapshots, not diffs: the transform is small
/// and fixed-shape, so diffing would add complexity without benefit.
/// This component performs no I/O; its only side effect is the in-memory
/// state change.

use std::collections::VecDeque;

use crate::transform::{Transform, TransformConstraints, TransformPatch};

/// Past/present/future stacks of transform snapshots
///
/// `past` is oldest-first, `future` is next-redo-first. The present
/// value is never duplicated into either stack.
#[derive(Debug, Clone)]
pub struct TransformHistory {
    past: Vec<Transform>,
    present: Transform,
    future: VecDeque<Transform>,
    constraints: TransformConstraints,
}

impl TransformHistory {
    /// Create a history rooted at the given transform
    pub fn new(initial: Transform, constraints: TransformConstraints) -> Self {
        Self {
            past: Vec::new(),
            present: initial.clamped(&constraints),
            future: VecDeque::new(),
            constraints,
        }
    }

    /// The current transform
    pub fn present(&self) -> Transform {
        self.present
    }

    /// The configured field bounds
    pub fn constraints(&self) -> &TransformConstraints {
        &self.constraints
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Merge a patch into the present transform as one history entry
    ///
    /// The previous present is pushed onto `past` and any redo entries
    /// are discarded (a new edit invalidates redo). Callers must coalesce
    /// continuous-drag intermediate values before calling this; every
    /// call here becomes one undo step.
    pub fn update(&mut self, patch: TransformPatch) -> Transform {
        let updated = self.present.apply_clamped(patch, &self.constraints);
        self.past.push(self.present);
        self.present = updated;
        self.future.clear();
        self.present
    }

    /// Step back one entry; no-op when there is nothing to undo
    pub fn undo(&mut self) -> Transform {
        if let Some(previous) = self.past.pop() {
            self.future.push_front(self.present);
            self.present = previous;
        }
        self.present
    }

    /// Step forward one entry; no-op when there is nothing to redo
    pub fn redo(&mut self) -> Transform {
        if let Some(next) = self.future.pop_front() {
            self.past.push(self.present);
            self.present = next;
        }
        self.present
    }

    /// Replace the present and drop all history
    ///
    /// Used when loading a new image or restoring a saved state: history
    /// does not carry across unrelated image content.
    pub fn reset(&mut self, transform: Transform) -> Transform {
        self.present = transform.clamped(&self.constraints);
        self.past.clear();
        self.future.clear();
        self.present
    }
}

impl Default for TransformHistory {
    fn default() -> Self {
        Self::new(Transform::default(), TransformConstraints::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::OverlayType;

    fn history() -> TransformHistory {
        TransformHistory::default()
    }

    #[test]
    fn test_update_then_equal_undos_returns_to_start() {
        let mut h = history();
        let start = h.present();

        h.update(TransformPatch::scale(1.5));
        h.update(TransformPatch::offset(10.0, -10.0));
        h.update(TransformPatch::overlay(OverlayType::Cinematic));

        h.undo();
        h.undo();
        h.undo();

        assert_eq!(h.present(), start);
        assert!(!h.can_undo());
    }

    #[test]
    fn test_update_clears_future() {
        let mut h = history();
        h.update(TransformPatch::scale(1.5));
        h.undo();
        assert!(h.can_redo());

        h.update(TransformPatch::scale(0.5));
        assert!(!h.can_redo());

        // redo after a fresh update is a no-op
        let before = h.present();
        assert_eq!(h.redo(), before);
    }

    #[test]
    fn test_undo_then_redo_is_idempotent() {
        let mut h = history();
        let edited = h.update(TransformPatch::offset(42.0, 0.0));

        h.undo();
        assert_eq!(h.redo(), edited);
        assert_eq!(h.present(), edited);
    }

    #[test]
    fn test_undo_on_empty_past_is_noop() {
        let mut h = history();
        let start = h.present();
        assert_eq!(h.undo(), start);
        assert_eq!(h.present(), start);
    }

    #[test]
    fn test_reset_clears_both_stacks() {
        let mut h = history();
        h.update(TransformPatch::scale(1.5));
        h.update(TransformPatch::scale(0.7));
        h.undo();
        assert!(h.can_undo());
        assert!(h.can_redo());

        let mut target = Transform::default();
        target.offset_x = 5.0;
        h.reset(target);

        assert!(!h.can_undo());
        assert!(!h.can_redo());
        assert_eq!(h.present(), target);
    }

    #[test]
    fn test_reset_clamps_out_of_range_input() {
        let mut h = history();
        let mut wild = Transform::default();
        wild.scale = 100.0;
        h.reset(wild);
        assert_eq!(h.present().scale, h.constraints().max_scale);
    }

    #[test]
    fn test_updates_apply_in_call_order() {
        let mut h = history();
        h.update(TransformPatch::scale(0.5));
        h.update(TransformPatch::scale(1.2));

        assert_eq!(h.present().scale, 1.2);
        h.undo();
        assert_eq!(h.present().scale, 0.5);
    }
}
