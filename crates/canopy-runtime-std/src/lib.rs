//! Standard tick scheduling backed by Rust's `std` library.
//!
//! This crate provides a concrete [`TickScheduler`] for hosts that run their
//! own event loop: the engine raises a flag (and optionally wakes the loop)
//! when it wants a deferred render pass, and the loop calls
//! [`StdRuntime::pump`] to run it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use canopy_core::{Engine, EngineConfig, LiveNodeAdapter, TickScheduler};

type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Scheduler that records tick requests in an atomic flag.
pub struct StdTickScheduler {
    tick_requested: AtomicBool,
    tick_waker: RwLock<Option<Waker>>,
}

impl StdTickScheduler {
    pub fn new() -> Self {
        Self {
            tick_requested: AtomicBool::new(false),
            tick_waker: RwLock::new(None),
        }
    }

    /// Returns whether a tick has been requested since the last call.
    pub fn take_tick_request(&self) -> bool {
        self.tick_requested.swap(false, Ordering::SeqCst)
    }

    pub fn has_pending_tick(&self) -> bool {
        self.tick_requested.load(Ordering::SeqCst)
    }

    /// Registers a waker invoked whenever a new tick is requested.
    pub fn set_tick_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self
            .tick_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(waker));
    }

    pub fn clear_tick_waker(&self) {
        *self
            .tick_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn wake(&self) {
        let waker = self
            .tick_waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdTickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdTickScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdTickScheduler")
            .field("tick_requested", &self.tick_requested.load(Ordering::SeqCst))
            .finish()
    }
}

impl TickScheduler for StdTickScheduler {
    fn schedule_tick(&self) {
        self.tick_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Convenience container owning the shared scheduler and driving engines with it.
#[derive(Clone, Default)]
pub struct StdRuntime {
    scheduler: Arc<StdTickScheduler>,
}

impl StdRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an engine that reports its tick requests to this runtime.
    pub fn engine<A: LiveNodeAdapter>(&self, adapter: A, config: EngineConfig) -> Engine<A> {
        Engine::with_scheduler(adapter, self.scheduler.clone(), config)
    }

    pub fn scheduler(&self) -> Arc<StdTickScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn take_tick_request(&self) -> bool {
        self.scheduler.take_tick_request()
    }

    pub fn set_tick_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_tick_waker(waker);
    }

    pub fn clear_tick_waker(&self) {
        self.scheduler.clear_tick_waker();
    }

    /// Runs one flush if a tick was requested. Returns the number of components rendered.
    pub fn pump<A: LiveNodeAdapter>(&self, engine: &mut Engine<A>) -> canopy_core::Result<usize> {
        if !self.take_tick_request() {
            return Ok(0);
        }
        engine.flush()
    }

    /// Flushes until no further tick is requested, logging (and stopping at) a failed flush.
    pub fn pump_until_idle<A: LiveNodeAdapter>(&self, engine: &mut Engine<A>) -> usize {
        let mut rendered = 0;
        while self.take_tick_request() {
            match engine.flush() {
                Ok(count) => rendered += count,
                Err(err) => {
                    log::error!("render flush failed: {err}");
                    break;
                }
            }
        }
        rendered
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
