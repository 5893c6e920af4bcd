// ============================================================================
// HISTORY MANAGER - Bounded undo/redo snapshot stack for the mask editor
// ============================================================================

/// Maximum number of snapshots retained. Beyond this the oldest entry is
/// evicted and the cursor shifts to keep pointing at the same logical state.
pub const MAX_HISTORY: usize = 50;

/// A linear sequence of full-buffer pixel snapshots with a cursor.
///
/// The engine pushes one snapshot of its (empty) initial state on
/// construction, so the list is never empty and `can_undo()` starts false.
/// Snapshots are immutable once pushed; only `commit`, `undo` and `redo`
/// touch the stack.
pub struct HistoryManager {
    snapshots: Vec<Vec<u8>>,
    cursor: usize,
}

impl HistoryManager {
    /// Create with the initial state as the first snapshot.
    pub fn new(initial: Vec<u8>) -> Self {
        Self { snapshots: vec![initial], cursor: 0 }
    }

    /// Record a completed edit: drop any abandoned redo branch, append the
    /// snapshot, advance the cursor, and evict the oldest entry when the
    /// stack exceeds [`MAX_HISTORY`].
    pub fn commit(&mut self, snapshot: Vec<u8>) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(snapshot);
        self.cursor += 1;

        if self.snapshots.len() > MAX_HISTORY {
            self.snapshots.remove(0);
            self.cursor -= 1;
        }
    }

    /// Step the cursor back and return the snapshot to restore, or `None`
    /// when already at the oldest state.
    pub fn undo(&mut self) -> Option<&[u8]> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.snapshots[self.cursor])
    }

    /// Step the cursor forward and return the snapshot to restore, or `None`
    /// when already at the newest state.
    pub fn redo(&mut self) -> Option<&[u8]> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        Some(&self.snapshots[self.cursor])
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        // The initial snapshot is always present.
        false
    }
}
