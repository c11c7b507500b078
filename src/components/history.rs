use std::collections::VecDeque;

use crate::canvas::Surface;

// ============================================================================
// HISTORY MANAGER — bounded full-surface snapshot undo/redo
// ============================================================================

/// Maximum number of undo steps kept.
pub const HISTORY_CAPACITY: usize = 5;

/// Undo/redo stacks of deep surface snapshots, plus content-modified
/// tracking.
///
/// Caller contract: every mutating operation calls [`save_state`] with the
/// surface **before** applying the mutation. The manager cannot enforce this
/// internally.
///
/// [`save_state`]: HistoryManager::save_state
pub struct HistoryManager {
    undo_stack: VecDeque<Surface>,
    redo_stack: Vec<Surface>,
    capacity: usize,
    /// Set by any mutation since the last save-to-disk.
    dirty: bool,
    /// Checksum of the surface at the last load/save. Defends against
    /// flag-tracking bugs: `is_modified` also compares the live checksum.
    saved_checksum: u64,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl HistoryManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
            dirty: false,
            saved_checksum: 0,
        }
    }

    /// Push a deep copy of `current` onto the undo stack, evicting the oldest
    /// snapshot past capacity. Unconditionally clears the redo stack.
    pub fn save_state(&mut self, current: &Surface) {
        self.redo_stack.clear();
        self.undo_stack.push_back(current.clone());
        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
        }
        self.dirty = true;
    }

    /// Restore the most recent snapshot into `current`. Returns false (and
    /// leaves `current` untouched) when no undo step is available.
    pub fn undo(&mut self, current: &mut Surface) -> bool {
        let Some(previous) = self.undo_stack.pop_back() else {
            return false;
        };
        self.redo_stack.push(current.clone());
        *current = previous;
        log::debug!("undo: {} steps left", self.undo_stack.len());
        true
    }

    /// Symmetric to [`undo`](Self::undo). Only reachable directly after an
    /// undo: any `save_state` clears the redo stack.
    pub fn redo(&mut self, current: &mut Surface) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push_back(current.clone());
        *current = next;
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Forget all history (new document, file load).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// True when the surface differs from the last loaded/saved state, either
    /// per the dirty flag or per checksum divergence.
    pub fn is_modified(&self, current: &Surface) -> bool {
        self.dirty || current.checksum() != self.saved_checksum
    }

    /// Record `current` as the on-disk state (after a successful save or a
    /// fresh load) and reset the dirty flag.
    pub fn mark_saved(&mut self, current: &Surface) {
        self.dirty = false;
        self.saved_checksum = current.checksum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, WHITE};

    #[test]
    fn capacity_evicts_oldest() {
        let mut h = HistoryManager::new(3);
        let mut s = Surface::new(2, 2, WHITE);
        for i in 0..5 {
            h.save_state(&s);
            s.put_pixel(i % 2, 0, BLACK);
        }
        assert_eq!(h.undo_depth(), 3);
        assert!(h.undo(&mut s));
        assert!(h.undo(&mut s));
        assert!(h.undo(&mut s));
        assert!(!h.undo(&mut s));
    }

    #[test]
    fn save_state_clears_redo() {
        let mut h = HistoryManager::default();
        let mut s = Surface::new(2, 2, WHITE);
        h.save_state(&s);
        s.put_pixel(0, 0, BLACK);
        assert!(h.undo(&mut s));
        assert!(h.can_redo());
        h.save_state(&s);
        assert!(!h.can_redo());
    }

    #[test]
    fn modified_tracking_uses_checksum_fallback() {
        let mut h = HistoryManager::default();
        let mut s = Surface::new(2, 2, WHITE);
        h.mark_saved(&s);
        assert!(!h.is_modified(&s));
        // Mutate without going through save_state: the dirty flag stays
        // false but the checksum diverges.
        s.put_pixel(0, 0, BLACK);
        assert!(h.is_modified(&s));
        h.mark_saved(&s);
        assert!(!h.is_modified(&s));
    }
}
