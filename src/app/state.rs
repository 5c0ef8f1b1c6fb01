use crate::options::{self, RangeKey, SizeKey};
use crate::stepper::StepLabels;
use crate::window::{ItemId, SentinelObserver, WindowEngine};

use super::viewport::{Viewport, ViewportWatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKind {
    Range,
    Size,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOverlay {
    pub kind: PickerKind,
    pub selected: usize,
}

impl PickerOverlay {
    pub fn len(&self) -> usize {
        match self.kind {
            PickerKind::Range => options::range_keys().count(),
            PickerKind::Size => options::size_keys().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn titles(&self) -> Vec<&'static str> {
        match self.kind {
            PickerKind::Range => options::ranges().map(|range| range.title).collect(),
            PickerKind::Size => options::sizes().map(|size| size.title).collect(),
        }
    }
}

pub struct AppState {
    engine: WindowEngine,
    observer: SentinelObserver<ViewportWatcher>,
    viewport: Viewport,
    cursor: ItemId,
    available_rows: usize,
    overlay: Option<PickerOverlay>,
    status_message: Option<String>,
}

impl AppState {
    pub fn new(engine: WindowEngine) -> Self {
        let cursor = engine.selected_id();
        let mut state = Self {
            engine,
            observer: SentinelObserver::new(ViewportWatcher::default()),
            viewport: Viewport::default(),
            cursor,
            available_rows: usize::MAX,
            overlay: None,
            status_message: None,
        };
        state.viewport.set_rows(state.preferred_rows());
        state.recenter();
        state
    }

    pub fn engine(&self) -> &WindowEngine {
        &self.engine
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn cursor(&self) -> ItemId {
        self.cursor
    }

    pub fn cursor_index(&self) -> Option<usize> {
        self.engine.position(self.cursor)
    }

    pub fn overlay(&self) -> Option<&PickerOverlay> {
        self.overlay.as_ref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    pub fn selection_labels(&self) -> StepLabels {
        self.engine.current_selection_labels()
    }

    /// Number of rows the list wants for the active size.
    pub fn preferred_rows(&self) -> usize {
        let size = self.engine.configuration().size();
        (size.before_count + size.after_count).max(1)
    }

    /// Applies the space the terminal can give the list.
    pub fn resize(&mut self, available_rows: usize) {
        self.available_rows = available_rows.max(1);
        let rows = self.preferred_rows().min(self.available_rows);
        if rows == self.viewport.rows() {
            return;
        }
        self.viewport.set_rows(rows);
        if self.cursor == self.engine.selected_id() {
            self.viewport.center_on_selection(&self.engine);
        } else {
            self.viewport.ensure_visible(&self.engine, self.cursor);
        }
        self.process_visibility();
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let Some(current) = self.cursor_index() else {
            self.cursor = self.engine.selected_id();
            return;
        };
        let last = self.engine.len().saturating_sub(1) as isize;
        let next = (current as isize + delta).clamp(0, last) as usize;
        if let Some(item) = self.engine.get(next) {
            self.cursor = item.timestamp;
        }
        self.viewport.ensure_visible(&self.engine, self.cursor);
        self.process_visibility();
    }

    /// Selects the item under the cursor.
    pub fn select_cursor(&mut self) {
        if self.engine.select(self.cursor) {
            let labels = self.engine.current_selection_labels();
            self.set_status_message(Some(format!("Selected {}", labels.long)));
        } else {
            self.set_status_message(Some("That item scrolled away; pick another"));
        }
        self.recenter();
    }

    pub fn jump_to_selection(&mut self) {
        self.recenter();
    }

    pub fn open_picker(&mut self, kind: PickerKind) {
        let configuration = self.engine.configuration();
        let selected = match kind {
            PickerKind::Range => options::range_keys()
                .position(|key| key == configuration.range_key())
                .unwrap_or(0),
            PickerKind::Size => options::size_keys()
                .position(|key| key == configuration.size_key())
                .unwrap_or(0),
        };
        self.overlay = Some(PickerOverlay { kind, selected });
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn picker_move(&mut self, delta: isize) {
        let Some(picker) = self.overlay.as_mut() else {
            return;
        };
        let last = picker.len().saturating_sub(1) as isize;
        picker.selected = (picker.selected as isize + delta).clamp(0, last) as usize;
    }

    pub fn picker_confirm(&mut self) {
        let Some(picker) = self.overlay.take() else {
            return;
        };
        match picker.kind {
            PickerKind::Range => {
                if let Some(key) = options::range_keys().nth(picker.selected) {
                    self.apply_range(key);
                }
            }
            PickerKind::Size => {
                if let Some(key) = options::size_keys().nth(picker.selected) {
                    self.apply_size(key);
                }
            }
        }
    }

    pub fn apply_range(&mut self, key: RangeKey) {
        if self.engine.set_range(key) {
            tracing::info!(range = %key, "range changed");
        }
        self.set_status_message(Some(format!("Range: {}", key.option().title)));
        self.recenter();
    }

    pub fn apply_size(&mut self, key: SizeKey) {
        if self.engine.set_size(key) {
            tracing::info!(size = %key, "size changed");
        }
        self.viewport
            .set_rows(self.preferred_rows().min(self.available_rows));
        self.set_status_message(Some(format!("Size: {}", key.option().title)));
        self.recenter();
    }

    fn recenter(&mut self) {
        self.cursor = self.engine.selected_id();
        self.viewport.center_on_selection(&self.engine);
        self.observer.attach(&self.engine);
        self.process_visibility();
    }

    // Feeds viewport entries to the sentinel observer until nothing new shows up.
    // Each growth spends budget, so this terminates.
    fn process_visibility(&mut self) {
        loop {
            let visible = self.viewport.visible_ids(&self.engine);
            let entered = self.observer.watcher_mut().poll(&visible);
            let mut grew = false;
            for id in entered {
                grew |= self.observer.on_visible(&mut self.engine, id).is_some();
            }
            if !grew {
                break;
            }
        }
        if self.engine.position(self.cursor).is_none() {
            let top = self.viewport.top_index(&self.engine);
            if let Some(item) = self.engine.get(top) {
                self.cursor = item.timestamp;
            }
        }
    }
}
