// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the scene.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! scheduler, the binding lifecycle and input dispatch call into. All method
//! bodies default to no-ops, so implementing only the events you care about
//! is fine.
//!
//! Call sites never hold a sink directly. They build a [`Tracer`] from the
//! scene's sink slot; without the `trace` feature its methods are empty and
//! the event values are never looked at.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) gates [`StyleWriteEvent`] and the
//!   corresponding `TraceSink` method.

use crate::id::{BindingId, UnitId};
use crate::input::{EventName, EventTarget};
use crate::time::{Duration, HostTime};

#[cfg(feature = "trace-rich")]
use crate::backend::{StyleProperty, StyleValue};
#[cfg(feature = "trace-rich")]
use crate::id::NodeId;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted once per scheduler tick, before bindings advance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickEvent {
    /// Monotonic tick counter.
    pub tick_index: u64,
    /// Host time of the tick, if it came from the timer.
    pub now: Option<HostTime>,
    /// Time the bindings advance by.
    pub delta: Duration,
    /// Number of active bindings.
    pub active: usize,
}

/// Scheduler loop transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoopState {
    /// The first binding was enqueued and a tick was requested.
    Started,
    /// The active set drained and the loop stopped requesting ticks.
    Halted,
}

/// A binding lifecycle transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingTransition {
    /// The binding was enqueued.
    Started,
    /// The binding moved to the given act.
    ActAdvanced(usize),
    /// The last act completed and the binding wrapped to act 0.
    Finished,
    /// The binding left the active set.
    Stopped,
    /// The binding was destroyed.
    Unbound,
}

/// Emitted when a binding changes state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BindingEvent {
    /// The binding.
    pub binding: BindingId,
    /// The unit it drives.
    pub unit: UnitId,
    /// What happened.
    pub transition: BindingTransition,
}

/// Emitted for every translated event, delivered or not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DispatchEvent {
    /// Event target.
    pub target: EventTarget,
    /// Event name.
    pub name: EventName,
    /// Whether a registration matched.
    pub delivered: bool,
}

/// A style write on a back end node.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleWriteEvent {
    /// The unit being applied.
    pub unit: UnitId,
    /// Its node.
    pub node: NodeId,
    /// Property written.
    pub property: StyleProperty,
    /// Value written.
    pub value: StyleValue,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the scene.
///
/// Every method defaults to ignoring its event.
pub trait TraceSink {
    /// Called at the start of every scheduler tick.
    fn on_tick(&mut self, e: &TickEvent) {
        _ = e;
    }

    /// Called when the scheduler loop starts or halts.
    fn on_loop(&mut self, state: LoopState) {
        _ = state;
    }

    /// Called on binding lifecycle transitions.
    fn on_binding(&mut self, e: &BindingEvent) {
        _ = e;
    }

    /// Called for every translated event.
    fn on_dispatch(&mut self, e: &DispatchEvent) {
        _ = e;
    }

    /// Called for every style write (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_style_write(&mut self, e: &StyleWriteEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// Ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Borrowed handle to the scene's sink, if it has one.
///
/// Empty without the `trace` feature; with it, each emit is one `Option`
/// check.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Forwards to `sink`.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Forwards nowhere.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer for a scene-owned sink slot.
    #[inline]
    #[must_use]
    pub fn from_slot(slot: &'a mut Option<Box<dyn TraceSink>>) -> Self {
        match slot {
            Some(sink) => Self::new(sink.as_mut()),
            None => Self::none(),
        }
    }

    /// Emits a [`TickEvent`].
    #[inline]
    pub fn tick(&mut self, e: &TickEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_tick(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a loop transition.
    #[inline]
    pub fn loop_state(&mut self, state: LoopState) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_loop(state);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = state;
        }
    }

    /// Emits a [`BindingEvent`].
    #[inline]
    pub fn binding(&mut self, e: &BindingEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_binding(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DispatchEvent`].
    #[inline]
    pub fn dispatch(&mut self, e: &DispatchEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_dispatch(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`StyleWriteEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn style_write(&mut self, e: &StyleWriteEvent) {
        if let Some(s) = &mut self.sink {
            s.on_style_write(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tick() -> TickEvent {
        TickEvent {
            tick_index: 4,
            now: Some(HostTime(40_000)),
            delta: Duration::from_millis(10),
            active: 2,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_tick(&sample_tick());
        sink.on_loop(LoopState::Halted);
        sink.on_binding(&BindingEvent {
            binding: BindingId(0),
            unit: UnitId(1),
            transition: BindingTransition::ActAdvanced(1),
        });
    }

    #[test]
    fn detached_tracer_accepts_events() {
        let mut tracer = Tracer::none();
        tracer.tick(&sample_tick());
        tracer.loop_state(LoopState::Started);
    }

    #[test]
    fn empty_slot_gives_silent_tracer() {
        let mut slot: Option<Box<dyn TraceSink>> = None;
        let mut tracer = Tracer::from_slot(&mut slot);
        tracer.tick(&sample_tick());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn boxed_slot_receives_ticks_and_loop_states() {
        #[derive(Default)]
        struct Counts {
            ticks: Vec<u64>,
            halts: usize,
        }
        impl TraceSink for Counts {
            fn on_tick(&mut self, e: &TickEvent) {
                self.ticks.push(e.tick_index);
            }
            fn on_loop(&mut self, state: LoopState) {
                if state == LoopState::Halted {
                    self.halts += 1;
                }
            }
        }

        let mut counts = Counts::default();
        {
            let mut tracer = Tracer::new(&mut counts);
            tracer.tick(&sample_tick());
            tracer.loop_state(LoopState::Started);
            tracer.loop_state(LoopState::Halted);
        }
        assert_eq!(counts.ticks, [4]);
        assert_eq!(counts.halts, 1);
    }
}
