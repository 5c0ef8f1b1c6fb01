use time::UtcOffset;

use crate::options::{Configuration, RangeKey, SizeKey};
use crate::stepper::{self, Clock, StepLabels};

mod sentinel;
mod store;

pub use sentinel::{SentinelObserver, VisibilityWatcher};
pub use store::{DequeStore, OrderedSequenceStore};

/// Items are identified by their epoch-millisecond timestamp.
pub type ItemId = i64;

/// Extra placeholders kept beyond the configured before-count so one
/// grow/trim cycle never exposes a gap.
pub const BEFORE_BUFFER: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub timestamp: i64,
    pub label: String,
    /// Rendered before the selection.
    pub is_placeholder: bool,
    pub is_selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Before,
    After,
}

impl Edge {
    pub fn opposite(self) -> Self {
        match self {
            Edge::Before => Edge::After,
            Edge::After => Edge::Before,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub scroll_budget: u32,
    pub utc_offset: UtcOffset,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            scroll_budget: 50,
            utc_offset: UtcOffset::UTC,
        }
    }
}

/// Sliding window of time-labelled items around a single selection.
pub struct WindowEngine<S = DequeStore> {
    store: S,
    selected: ItemId,
    configuration: Configuration,
    options: EngineOptions,
    clock: Box<dyn Clock>,
    budget: u32,
    revision: u64,
}

impl WindowEngine<DequeStore> {
    pub fn new(
        configuration: Configuration,
        options: EngineOptions,
        clock: impl Clock + 'static,
    ) -> Self {
        Self::with_store(DequeStore::default(), configuration, options, Box::new(clock))
    }
}

impl<S: OrderedSequenceStore> WindowEngine<S> {
    /// Builds an engine on `store` and seeds it around the clock's "now".
    pub fn with_store(
        store: S,
        configuration: Configuration,
        options: EngineOptions,
        clock: Box<dyn Clock>,
    ) -> Self {
        let mut engine = Self {
            store,
            selected: 0,
            configuration,
            options,
            clock,
            budget: options.scroll_budget,
            revision: 0,
        };
        engine.reseed();
        engine
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.store.iter()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.store.get(index)
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.store.position(id)
    }

    pub fn selected_id(&self) -> ItemId {
        self.selected
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.store.position(self.selected)
    }

    pub fn selected(&self) -> Option<&Item> {
        self.selected_index().and_then(|idx| self.store.get(idx))
    }

    /// Ids of the current first and last items.
    pub fn sentinels(&self) -> Option<(ItemId, ItemId)> {
        let first = self.store.first()?.timestamp;
        let last = self.store.last()?.timestamp;
        Some((first, last))
    }

    /// Bumped on every change to the item sequence.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn budget_remaining(&self) -> u32 {
        self.budget
    }

    pub(crate) fn consume_budget(&mut self) {
        self.budget = self.budget.saturating_sub(1);
    }

    pub fn before_count(&self) -> usize {
        self.selected_index().unwrap_or(0)
    }

    pub fn after_count(&self) -> usize {
        self.selected_index()
            .map(|idx| self.store.len() - idx - 1)
            .unwrap_or(0)
    }

    pub fn current_selection_labels(&self) -> StepLabels {
        let range = self.configuration.range();
        stepper::step_from_millis(self.selected, 0, range.unit, self.options.utc_offset).labels
    }

    /// Throws every item away and starts over from the clock's current time.
    pub fn reseed(&mut self) {
        let range = self.configuration.range();
        let now = self.clock.now();
        let anchor = stepper::step(Some(now), 0, range.unit, self.options.utc_offset);
        self.store.clear();
        self.selected = anchor.timestamp;
        self.store.append(vec![Item {
            timestamp: anchor.timestamp,
            label: anchor.label(range.format).to_string(),
            is_placeholder: false,
            is_selected: true,
        }]);
        tracing::debug!(range = %range.key, anchor = anchor.timestamp, "reseeded window");
        self.settle();
    }

    /// Collapses the window onto the selection and regrows both sides to the
    /// configured counts. Also refills the scroll budget.
    pub fn settle(&mut self) {
        let Some(selected) = self.selected_index() else {
            tracing::warn!(selected = self.selected, "selection missing, reseeding");
            self.reseed();
            return;
        };
        // Both deletions are single range removals so no intermediate state is exposed.
        self.store.delete_range(0..selected);
        self.store.delete_range(1..self.store.len());

        let size = self.configuration.size();
        self.grow_before(size.before_count + BEFORE_BUFFER);
        self.grow_after(size.after_count);
        self.budget = self.options.scroll_budget;
        self.revision += 1;
        tracing::debug!(
            before = self.before_count(),
            after = self.after_count(),
            "settled window"
        );
    }

    /// Appends up to `count` items chained from the current last item.
    pub fn grow_after(&mut self, count: usize) -> usize {
        let Some(last) = self.store.last().map(|item| item.timestamp) else {
            return 0;
        };
        let items = self.chain(last, count, Edge::After);
        let grown = items.len();
        self.store.append(items);
        if grown > 0 {
            self.revision += 1;
        }
        grown
    }

    /// Prepends up to `count` placeholder items chained from the current first item.
    pub fn grow_before(&mut self, count: usize) -> usize {
        let Some(first) = self.store.first().map(|item| item.timestamp) else {
            return 0;
        };
        let mut items = self.chain(first, count, Edge::Before);
        items.reverse();
        let grown = items.len();
        self.store.prepend(items);
        if grown > 0 {
            self.revision += 1;
        }
        grown
    }

    pub fn grow_one_after(&mut self) -> bool {
        self.grow_after(1) == 1
    }

    pub fn grow_one_before(&mut self) -> bool {
        self.grow_before(1) == 1
    }

    /// Removes one item from `edge`, the side opposite the one that just grew.
    /// The selected item is never removed.
    pub fn trim_opposite(&mut self, edge: Edge) -> bool {
        let len = self.store.len();
        let index = match edge {
            Edge::Before => 0,
            Edge::After => match len.checked_sub(1) {
                Some(index) => index,
                None => return false,
            },
        };
        let removable = self
            .store
            .get(index)
            .map(|item| !item.is_selected)
            .unwrap_or(false);
        if !removable {
            return false;
        }
        self.store.delete_range(index..index + 1);
        self.revision += 1;
        true
    }

    /// Moves the selection to `id` and re-centres the window on it. Unknown ids
    /// are ignored and reported as `false`.
    pub fn select(&mut self, id: ItemId) -> bool {
        let Some(index) = self.store.position(id) else {
            tracing::debug!(id, "ignoring selection of item outside the window");
            return false;
        };
        if let Some(previous) = self.selected_index() {
            if let Some(item) = self.store.get_mut(previous) {
                item.is_selected = false;
            }
        }
        if let Some(item) = self.store.get_mut(index) {
            item.is_selected = true;
            item.is_placeholder = false;
        }
        self.selected = id;
        self.settle();
        true
    }

    /// Switches granularity. A change discards the whole window.
    pub fn set_range(&mut self, key: RangeKey) -> bool {
        if !self.configuration.set_range(key) {
            return false;
        }
        self.reseed();
        true
    }

    /// Resizes both sides around the current selection.
    pub fn set_size(&mut self, key: SizeKey) -> bool {
        let changed = self.configuration.set_size(key);
        self.settle();
        changed
    }

    fn chain(&self, from: i64, count: usize, edge: Edge) -> Vec<Item> {
        let range = self.configuration.range();
        let delta = match edge {
            Edge::Before => -range.step,
            Edge::After => range.step,
        };
        let mut items = Vec::with_capacity(count);
        let mut anchor = from;
        for _ in 0..count {
            let next = stepper::step_from_millis(anchor, delta, range.unit, self.options.utc_offset);
            let advanced = match edge {
                Edge::Before => next.timestamp < anchor,
                Edge::After => next.timestamp > anchor,
            };
            if !advanced {
                tracing::warn!(unit = ?range.unit, anchor, "step did not advance, window stays short");
                break;
            }
            items.push(Item {
                timestamp: next.timestamp,
                label: next.label(range.format).to_string(),
                is_placeholder: edge == Edge::Before,
                is_selected: false,
            });
            anchor = next.timestamp;
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{range_keys, size_keys};
    use crate::stepper::{to_epoch_millis, FixedClock};
    use time::macros::{datetime, offset};
    use time::{Duration, OffsetDateTime};

    const D: OffsetDateTime = datetime!(2026-10-17 12:00 +2);

    fn engine(range: RangeKey, size: SizeKey) -> WindowEngine {
        WindowEngine::new(
            Configuration::new(range, size),
            EngineOptions {
                scroll_budget: 50,
                utc_offset: offset!(+2),
            },
            FixedClock(D),
        )
    }

    fn days(n: i64) -> i64 {
        to_epoch_millis(D + Duration::days(n))
    }

    fn ids(engine: &WindowEngine) -> Vec<ItemId> {
        engine.items().map(|item| item.timestamp).collect()
    }

    fn assert_ascending(engine: &WindowEngine) {
        let ids = ids(engine);
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "not ascending: {ids:?}");
    }

    #[test]
    fn initial_window_surrounds_the_anchor() {
        let engine = engine(RangeKey::Day, SizeKey::Size3x6);
        let expected: Vec<_> = (-5..=6).map(days).collect();
        assert_eq!(ids(&engine), expected);
        assert_eq!(engine.selected_id(), days(0));

        let flags: Vec<_> = engine
            .items()
            .map(|item| (item.is_placeholder, item.is_selected))
            .collect();
        assert!(flags[..5].iter().all(|&(placeholder, selected)| placeholder && !selected));
        assert_eq!(flags[5], (false, true));
        assert!(flags[6..].iter().all(|&(placeholder, selected)| !placeholder && !selected));
        assert_eq!(engine.selected().map(|item| item.label.as_str()), Some("17 October"));
    }

    #[test]
    fn settle_bounds_hold_for_every_range_and_size() {
        for range in range_keys() {
            for size in size_keys() {
                let mut engine = engine(range, size);
                let expected = size.option();
                assert_eq!(engine.before_count(), expected.before_count + BEFORE_BUFFER);
                assert_eq!(engine.after_count(), expected.after_count);
                assert_ascending(&engine);

                let target = engine.get(1).map(|item| item.timestamp).expect("item");
                assert!(engine.select(target));
                assert_eq!(engine.before_count(), expected.before_count + BEFORE_BUFFER);
                assert_eq!(engine.after_count(), expected.after_count);
                assert_ascending(&engine);
            }
        }
    }

    #[test]
    fn grow_one_after_then_trim_keeps_length() {
        let mut engine = engine(RangeKey::Day, SizeKey::Size3x6);
        let len = engine.len();
        assert!(engine.grow_one_after());
        assert!(engine.trim_opposite(Edge::Before));
        assert_eq!(engine.len(), len);
        assert_eq!(engine.sentinels(), Some((days(-4), days(7))));
        assert!(!engine.items().last().expect("last").is_placeholder);
    }

    #[test]
    fn grow_one_before_then_trim_keeps_length() {
        let mut engine = engine(RangeKey::Day, SizeKey::Size3x6);
        let len = engine.len();
        assert!(engine.grow_one_before());
        assert!(engine.trim_opposite(Edge::After));
        assert_eq!(engine.len(), len);
        assert_eq!(engine.sentinels(), Some((days(-6), days(5))));
        assert!(engine.items().next().expect("first").is_placeholder);
    }

    #[test]
    fn bulk_growth_is_undone_by_matching_trims() {
        let mut engine = engine(RangeKey::Hours6, SizeKey::Size3x3);
        let len = engine.len();
        assert_eq!(engine.grow_after(4), 4);
        for _ in 0..4 {
            assert!(engine.trim_opposite(Edge::Before));
        }
        assert_eq!(engine.len(), len);
        assert_ascending(&engine);
    }

    #[test]
    fn trimming_never_removes_the_selection() {
        let mut engine = engine(RangeKey::Day, SizeKey::Size0x6);
        assert!(engine.trim_opposite(Edge::Before));
        assert!(engine.trim_opposite(Edge::Before));
        assert_eq!(engine.before_count(), 0);
        assert!(!engine.trim_opposite(Edge::Before));
        assert_eq!(engine.selected_id(), days(0));
    }

    #[test]
    fn select_recentres_and_consumes_the_placeholder() {
        let mut engine = engine(RangeKey::Day, SizeKey::Size3x6);
        assert!(engine.select(days(-2)));
        let expected: Vec<_> = (-7..=4).map(days).collect();
        assert_eq!(ids(&engine), expected);
        let selected = engine.selected().expect("selected");
        assert!(selected.is_selected);
        assert!(!selected.is_placeholder);
        assert_eq!(engine.items().filter(|item| item.is_selected).count(), 1);
    }

    #[test]
    fn selecting_twice_is_idempotent() {
        let mut engine = engine(RangeKey::Month, SizeKey::Size3x6);
        let target = engine.get(8).map(|item| item.timestamp).expect("item");
        engine.select(target);
        let once: Vec<_> = engine.items().cloned().collect();
        engine.select(target);
        let twice: Vec<_> = engine.items().cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn selecting_unknown_item_changes_nothing() {
        let mut engine = engine(RangeKey::Day, SizeKey::Size3x6);
        let before: Vec<_> = engine.items().cloned().collect();
        let revision = engine.revision();
        assert!(!engine.select(days(40)));
        let after: Vec<_> = engine.items().cloned().collect();
        assert_eq!(before, after);
        assert_eq!(engine.revision(), revision);
    }

    #[test]
    fn switching_range_reseeds_weekly() {
        let mut engine = engine(RangeKey::Day, SizeKey::Size3x6);
        assert!(engine.set_range(RangeKey::Week));
        let expected: Vec<_> = (-5..=6).map(|n| days(n * 7)).collect();
        assert_eq!(ids(&engine), expected);
        assert_eq!(engine.selected_id(), days(0));
        assert_eq!(engine.selected().map(|item| item.label.as_str()), Some("17 Oct 2026"));
        assert!(!engine.set_range(RangeKey::Week));
    }

    #[test]
    fn resizing_keeps_the_anchor() {
        let mut engine = engine(RangeKey::Day, SizeKey::Size3x6);
        engine.select(days(3));
        assert!(engine.set_size(SizeKey::Size0x6));
        assert_eq!(engine.selected_id(), days(3));
        assert_eq!(engine.before_count(), BEFORE_BUFFER);
        assert_eq!(engine.after_count(), 6);
    }

    #[test]
    fn settle_refills_the_budget() {
        let mut engine = engine(RangeKey::Day, SizeKey::Size3x6);
        engine.consume_budget();
        engine.consume_budget();
        assert_eq!(engine.budget_remaining(), 48);
        engine.settle();
        assert_eq!(engine.budget_remaining(), 50);
    }

    #[test]
    fn selection_labels_cover_all_projections() {
        let engine = engine(RangeKey::Hour, SizeKey::Size3x3);
        let labels = engine.current_selection_labels();
        assert_eq!(labels.short, "17 October");
        assert_eq!(labels.long, "17 Oct 2026");
        assert_eq!(labels.time, "17 Oct, 12:00");
    }
}
