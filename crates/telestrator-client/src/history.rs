/// Result of an undo request
#[derive(Debug, PartialEq)]
pub enum UndoStep<'a, T> {
    /// History ran out; the stack is now empty and the surface should be wiped
    Cleared,
    /// The newest entry was dropped; this is the state to show
    Restore(&'a T),
}

/// Raster history with a cursor. A cursor of `-1` is the cleared state.
#[derive(Debug)]
pub struct UndoStack<T> {
    entries: Vec<T>,
    cursor: isize,
}

impl<T> UndoStack<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: -1,
        }
    }

    pub fn push(&mut self, snapshot: T) {
        self.entries.push(snapshot);
        self.cursor += 1;
    }

    /// Step back one entry. At or below the first entry this behaves as
    /// [`UndoStack::clear`].
    pub fn undo(&mut self) -> UndoStep<'_, T> {
        if self.cursor <= 0 {
            self.clear();
            return UndoStep::Cleared;
        }
        self.cursor -= 1;
        self.entries.pop();
        match self.entries.get(self.cursor as usize) {
            Some(top) => UndoStep::Restore(top),
            None => UndoStep::Cleared,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = -1;
    }

    pub fn cursor(&self) -> isize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for UndoStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_advances_cursor() {
        let mut stack = UndoStack::new();
        assert_eq!(stack.cursor(), -1);
        stack.push("a");
        stack.push("b");
        assert_eq!(stack.cursor(), 1);
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn undo_restores_previous_entry() {
        let mut stack = UndoStack::new();
        stack.push("a");
        stack.push("b");
        assert_eq!(stack.undo(), UndoStep::Restore(&"a"));
        assert_eq!(stack.cursor(), 0);
    }

    #[test]
    fn undoing_every_entry_ends_cleared_and_stays_cleared() {
        let mut stack = UndoStack::new();
        for i in 0..4 {
            stack.push(i);
        }
        for _ in 0..4 {
            stack.undo();
        }
        assert_eq!(stack.cursor(), -1);
        assert!(stack.is_empty());

        assert_eq!(stack.undo(), UndoStep::Cleared);
        assert_eq!(stack.cursor(), -1);
    }

    #[test]
    fn undo_of_single_entry_clears() {
        let mut stack = UndoStack::new();
        stack.push(7);
        assert_eq!(stack.undo(), UndoStep::Cleared);
        assert!(stack.is_empty());
    }
}
