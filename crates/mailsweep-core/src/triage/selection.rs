//! Multi-select state for bulk actions.

use indexmap::IndexSet;

use super::model::MessageId;

/// The ids currently marked for a bulk action, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: IndexSet<MessageId>,
}

impl SelectionSet {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the selection state of `id`. Returns the new state.
    pub fn toggle(&mut self, id: &MessageId) -> bool {
        if self.ids.shift_remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    /// Sets the selection state of `id` explicitly (checkbox semantics).
    pub fn set_selected(&mut self, id: &MessageId, selected: bool) {
        if selected {
            self.ids.insert(id.clone());
        } else {
            self.ids.shift_remove(id);
        }
    }

    /// Selects every id in `ids`.
    pub fn select_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a MessageId>) {
        self.ids.extend(ids.into_iter().cloned());
    }

    /// Deselects every id in `ids`.
    pub fn deselect_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a MessageId>) {
        for id in ids {
            self.ids.shift_remove(id);
        }
    }

    /// Returns `true` iff every id in `ids` is selected.
    ///
    /// Vacuously `true` for an empty set of ids.
    pub fn is_all_selected<'a>(&self, ids: impl IntoIterator<Item = &'a MessageId>) -> bool {
        ids.into_iter().all(|id| self.ids.contains(id))
    }

    /// Select-all / deselect-all toggle for one section.
    ///
    /// Deselects `ids` when all of them are selected, otherwise selects them.
    /// Returns `true` if the ids end up selected.
    pub fn toggle_all(&mut self, ids: &[MessageId]) -> bool {
        if self.is_all_selected(ids) {
            self.deselect_all(ids);
            false
        } else {
            self.select_all(ids);
            true
        }
    }

    /// Drops every selected id for which `is_valid` returns `false`.
    ///
    /// Returns the number of ids dropped.
    pub fn prune(&mut self, is_valid: impl Fn(&MessageId) -> bool) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| is_valid(id));
        before - self.ids.len()
    }

    /// Returns `true` if `id` is selected.
    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.ids.contains(id)
    }

    /// Number of selected ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates over the selected ids in selection order.
    pub fn ids(&self) -> impl Iterator<Item = &MessageId> {
        self.ids.iter()
    }

    /// Clears the selection.
    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
