use std::collections::BTreeSet;

use crate::window::{ItemId, OrderedSequenceStore, VisibilityWatcher, WindowEngine};

/// Rows of the list currently on screen, pinned to the identity of the top item
/// so that splices at either end of the window do not move what the user sees.
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    top: Option<ItemId>,
    rows: usize,
}

impl Viewport {
    pub fn rows(&self) -> usize {
        self.rows.max(1)
    }

    pub fn set_rows(&mut self, rows: usize) {
        self.rows = rows.max(1);
    }

    pub fn top_index<S: OrderedSequenceStore>(&self, engine: &WindowEngine<S>) -> usize {
        let max_top = engine.len().saturating_sub(self.rows());
        self.top
            .and_then(|id| engine.position(id))
            .unwrap_or(0)
            .min(max_top)
    }

    pub fn visible_ids<S: OrderedSequenceStore>(&self, engine: &WindowEngine<S>) -> Vec<ItemId> {
        engine
            .items()
            .skip(self.top_index(engine))
            .take(self.rows())
            .map(|item| item.timestamp)
            .collect()
    }

    /// Puts the selection on screen with the configured number of placeholders
    /// above it; the spare buffer items stay out of view.
    pub fn center_on_selection<S: OrderedSequenceStore>(&mut self, engine: &WindowEngine<S>) {
        let Some(selected) = engine.selected_index() else {
            self.top = None;
            return;
        };
        let above = engine
            .configuration()
            .size()
            .before_count
            .min(self.rows() - 1);
        let top = selected.saturating_sub(above);
        self.top = engine.get(top).map(|item| item.timestamp);
    }

    pub fn ensure_visible<S: OrderedSequenceStore>(&mut self, engine: &WindowEngine<S>, id: ItemId) {
        let Some(index) = engine.position(id) else {
            return;
        };
        let top = self.top_index(engine);
        let rows = self.rows();
        let new_top = if index < top {
            index
        } else if index >= top + rows {
            index + 1 - rows
        } else {
            top
        };
        self.top = engine.get(new_top).map(|item| item.timestamp);
    }
}

/// [`VisibilityWatcher`] fed from the viewport after every redraw. A watched id
/// is reported once each time it enters the visible rows, including when it is
/// already visible at the moment it starts being watched.
#[derive(Debug, Clone, Default)]
pub struct ViewportWatcher {
    watched: BTreeSet<ItemId>,
    reported: BTreeSet<ItemId>,
}

impl ViewportWatcher {
    pub fn is_watched(&self, id: ItemId) -> bool {
        self.watched.contains(&id)
    }

    /// Returns the watched ids that became visible since the last poll.
    pub fn poll(&mut self, visible: &[ItemId]) -> Vec<ItemId> {
        let mut entered = Vec::new();
        for &id in &self.watched {
            if visible.contains(&id) {
                if self.reported.insert(id) {
                    entered.push(id);
                }
            } else {
                self.reported.remove(&id);
            }
        }
        entered
    }
}

impl VisibilityWatcher for ViewportWatcher {
    fn observe(&mut self, id: ItemId) {
        self.watched.insert(id);
    }

    fn unobserve(&mut self, id: ItemId) {
        self.watched.remove(&id);
        self.reported.remove(&id);
    }
}
