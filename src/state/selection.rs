/// Single-selection state over the collection's positions
///
/// Pure state machine, no I/O. Bounds are checked by the caller.

/// `None`, or exactly one selected position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    SelectedAt(usize),
}

impl Selection {
    /// The selected position, if any
    pub fn selected(&self) -> Option<usize> {
        match *self {
            Selection::None => None,
            Selection::SelectedAt(index) => Some(index),
        }
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, Selection::SelectedAt(_))
    }

    /// Long-press handling.
    ///
    /// Selecting the already-selected position clears the selection;
    /// any other position replaces it. Returns the positions whose styling
    /// changed, sorted and without duplicates.
    pub fn select_or_toggle(&mut self, index: usize) -> Vec<usize> {
        match *self {
            Selection::SelectedAt(current) if current == index => {
                *self = Selection::None;
                vec![index]
            }
            Selection::SelectedAt(current) => {
                *self = Selection::SelectedAt(index);
                let mut affected = vec![current, index];
                affected.sort_unstable();
                affected
            }
            Selection::None => {
                *self = Selection::SelectedAt(index);
                vec![index]
            }
        }
    }

    /// Drop the selection. Returns the position that must be restyled.
    pub fn clear(&mut self) -> Vec<usize> {
        let affected = self.selected().into_iter().collect();
        *self = Selection::None;
        affected
    }

    /// Apply a removal at `removed` that left `new_len` items.
    ///
    /// A selection never survives a removal at or before it, and never
    /// outlives the position it names. Removals strictly after it leave it
    /// untouched. Selections are never renumbered.
    pub fn on_removed(&mut self, removed: usize, new_len: usize) -> Selection {
        if let Selection::SelectedAt(current) = *self {
            if removed <= current || current >= new_len {
                *self = Selection::None;
            }
        }
        *self
    }
}
