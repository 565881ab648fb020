//! Host hooks for scheduling deferred render passes.
//!
//! The engine never runs a deferred pass on its own: it asks the host for a
//! tick, and the host calls [`Engine::flush`](crate::Engine::flush) when
//! that tick comes around.

/// Requests a deferred tick from the host.
///
/// Called at most once per flush cycle: the first time a component is marked
/// while no flush is scheduled or running. Implementations must be safe to
/// share across threads even though the engine itself is single-threaded.
pub trait TickScheduler: Send + Sync {
    fn schedule_tick(&self);
}

/// Scheduler for hosts that call `flush` themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualTicks;

impl TickScheduler for ManualTicks {
    fn schedule_tick(&self) {}
}
