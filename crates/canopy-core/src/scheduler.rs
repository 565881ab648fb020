//! Deduplicated, batched re-render queue.
//!
//! Marking a component inserts it into an insertion-ordered set. The first
//! insertion after a completed flush asks the host for one tick; everything
//! marked before that tick runs in the same flush, in marking order.

use std::cell::Cell;
use std::rc::Rc;

use indexmap::IndexSet;

use crate::adapter::LiveNodeAdapter;
use crate::component::ComponentId;
use crate::engine::Engine;
use crate::error::Result;
use crate::platform::TickScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushState {
    #[default]
    Idle,
    /// A tick was requested and has not run yet.
    Scheduled,
    Flushing,
}

#[derive(Debug, Default)]
pub struct RenderQueue {
    pending: IndexSet<ComponentId>,
    state: Rc<Cell<FlushState>>,
}

/// Returns the queue to `Idle` when dropped, including on early error returns.
pub(crate) struct FlushGuard {
    state: Rc<Cell<FlushState>>,
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        self.state.set(FlushState::Idle);
    }
}

impl RenderQueue {
    /// Queues `id`; returns whether it was not queued already.
    ///
    /// A tick is requested whenever no flush is scheduled or running, so
    /// entries left behind by a failed flush are picked up by the next mark.
    pub fn mark(&mut self, id: ComponentId, ticks: &dyn TickScheduler) -> bool {
        let inserted = self.pending.insert(id);
        if self.state.get() == FlushState::Idle {
            self.state.set(FlushState::Scheduled);
            ticks.schedule_tick();
        }
        inserted
    }

    pub fn remove(&mut self, id: ComponentId) -> bool {
        self.pending.shift_remove(&id)
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.pending.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn state(&self) -> FlushState {
        self.state.get()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub(crate) fn begin_flush(&mut self) -> Option<FlushGuard> {
        if self.state.get() == FlushState::Flushing {
            return None;
        }
        self.state.set(FlushState::Flushing);
        Some(FlushGuard {
            state: Rc::clone(&self.state),
        })
    }

    pub(crate) fn pop_front(&mut self) -> Option<ComponentId> {
        self.pending.shift_remove_index(0)
    }
}

impl<A: LiveNodeAdapter> Engine<A> {
    /// Queues `id` for the next flush. Unknown components are ignored.
    pub fn mark_rerender(&mut self, id: ComponentId) -> bool {
        if !self.components.contains_key(id) {
            return false;
        }
        self.queue.mark(id, &*self.ticks)
    }

    /// Re-renders every queued component, including ones queued during this flush.
    ///
    /// Returns the number of components rendered. A failing render aborts the
    /// flush; components still queued stay queued until the next flush.
    pub fn flush(&mut self) -> Result<usize> {
        let Some(_guard) = self.queue.begin_flush() else {
            return Ok(0);
        };
        let mut rendered = 0;
        while let Some(id) = self.queue.pop_front() {
            if !self.components.contains_key(id) {
                continue;
            }
            self.rerender(id)?;
            rendered += 1;
        }
        if rendered > 0 {
            log::debug!("flush rendered {rendered} component(s)");
        }
        Ok(rendered)
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
