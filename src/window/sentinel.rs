use super::{Edge, ItemId, OrderedSequenceStore, WindowEngine};

/// Something that can report when a watched item enters the viewport.
pub trait VisibilityWatcher {
    fn observe(&mut self, id: ItemId);
    fn unobserve(&mut self, id: ItemId);
}

/// Keeps a watcher attached to the first and last item of a window and turns
/// their visibility into one-item growth on that side.
#[derive(Debug)]
pub struct SentinelObserver<W> {
    watcher: W,
    first: Option<ItemId>,
    last: Option<ItemId>,
}

impl<W: VisibilityWatcher> SentinelObserver<W> {
    pub fn new(watcher: W) -> Self {
        Self {
            watcher,
            first: None,
            last: None,
        }
    }

    pub fn watcher(&self) -> &W {
        &self.watcher
    }

    pub fn watcher_mut(&mut self) -> &mut W {
        &mut self.watcher
    }

    pub fn tracked(&self) -> (Option<ItemId>, Option<ItemId>) {
        (self.first, self.last)
    }

    /// Re-points the watcher at the engine's current edges.
    pub fn attach<S: OrderedSequenceStore>(&mut self, engine: &WindowEngine<S>) {
        let (first, last) = match engine.sentinels() {
            Some((first, last)) => (Some(first), Some(last)),
            None => (None, None),
        };
        for old in [self.first, self.last].into_iter().flatten() {
            if Some(old) != first && Some(old) != last {
                self.watcher.unobserve(old);
            }
        }
        for new in [first, last].into_iter().flatten() {
            if Some(new) != self.first && Some(new) != self.last {
                self.watcher.observe(new);
            }
        }
        self.first = first;
        self.last = last;
    }

    /// Handles `target` entering the viewport. Returns the edge that grew, if any.
    pub fn on_visible<S: OrderedSequenceStore>(
        &mut self,
        engine: &mut WindowEngine<S>,
        target: ItemId,
    ) -> Option<Edge> {
        if engine.budget_remaining() == 0 {
            return None;
        }
        let edge = if Some(target) == self.first {
            Edge::Before
        } else if Some(target) == self.last {
            Edge::After
        } else {
            tracing::trace!(target, "stale visibility callback");
            return None;
        };

        let grew = match edge {
            Edge::Before => engine.grow_one_before(),
            Edge::After => engine.grow_one_after(),
        };
        if !grew {
            return None;
        }
        engine.trim_opposite(edge.opposite());
        engine.consume_budget();
        self.attach(engine);
        tracing::debug!(?edge, budget = engine.budget_remaining(), "grew window edge");
        Some(edge)
    }
}
