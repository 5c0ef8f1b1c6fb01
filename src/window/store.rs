use std::collections::VecDeque;
use std::ops::Range;

use super::{Item, ItemId};

/// Ordered item storage the engine splices at either end.
///
/// Implementations must keep items in the order they were given; the engine is
/// responsible for handing them over in ascending timestamp order.
pub trait OrderedSequenceStore {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Option<&Item>;

    fn get_mut(&mut self, index: usize) -> Option<&mut Item>;

    fn position(&self, id: ItemId) -> Option<usize>;

    fn append(&mut self, items: Vec<Item>);

    /// Inserts `items` in front of the current first item, keeping their order.
    fn prepend(&mut self, items: Vec<Item>);

    /// Removes `range` in one step. Empty or out-of-bounds ranges are clamped.
    fn delete_range(&mut self, range: Range<usize>);

    fn clear(&mut self);

    fn iter(&self) -> Box<dyn Iterator<Item = &Item> + '_>;

    fn first(&self) -> Option<&Item> {
        self.get(0)
    }

    fn last(&self) -> Option<&Item> {
        self.len().checked_sub(1).and_then(|idx| self.get(idx))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DequeStore {
    items: VecDeque<Item>,
}

impl OrderedSequenceStore for DequeStore {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut Item> {
        self.items.get_mut(index)
    }

    fn position(&self, id: ItemId) -> Option<usize> {
        self.items
            .binary_search_by_key(&id, |item| item.timestamp)
            .ok()
    }

    fn append(&mut self, items: Vec<Item>) {
        self.items.extend(items);
    }

    fn prepend(&mut self, items: Vec<Item>) {
        for item in items.into_iter().rev() {
            self.items.push_front(item);
        }
    }

    fn delete_range(&mut self, range: Range<usize>) {
        let end = range.end.min(self.items.len());
        let start = range.start.min(end);
        if start == end {
            return;
        }
        self.items.drain(start..end);
    }

    fn clear(&mut self) {
        self.items.clear();
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &Item> + '_> {
        Box::new(self.items.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(timestamp: i64) -> Item {
        Item {
            timestamp,
            label: timestamp.to_string(),
            is_placeholder: false,
            is_selected: false,
        }
    }

    fn ids(store: &DequeStore) -> Vec<ItemId> {
        store.iter().map(|item| item.timestamp).collect()
    }

    #[test]
    fn prepend_keeps_given_order() {
        let mut store = DequeStore::default();
        store.append(vec![item(5)]);
        store.prepend(vec![item(1), item(2), item(3)]);
        store.append(vec![item(8), item(9)]);
        assert_eq!(ids(&store), [1, 2, 3, 5, 8, 9]);
        assert_eq!(store.position(8), Some(4));
        assert_eq!(store.position(4), None);
        assert_eq!(store.first().map(|i| i.timestamp), Some(1));
        assert_eq!(store.last().map(|i| i.timestamp), Some(9));
    }

    #[test]
    fn delete_range_clamps_and_skips_empty_ranges() {
        let mut store = DequeStore::default();
        store.append((1..=5).map(item).collect());
        store.delete_range(2..2);
        assert_eq!(store.len(), 5);
        store.delete_range(3..40);
        assert_eq!(ids(&store), [1, 2, 3]);
        store.delete_range(0..1);
        assert_eq!(ids(&store), [2, 3]);
    }
}
