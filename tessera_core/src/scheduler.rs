// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The animation loop.
//!
//! [`AnimationScheduler`] keeps the set of running bindings and the state of
//! the single timer loop. It never calls the back end itself: the scene asks
//! it whether to arm the timer and for how long.
//!
//! The loop only runs while something is animating. Enqueuing into an idle
//! scheduler starts it; a tick that ends with an empty active set halts it.

use crate::id::BindingId;
use crate::pool::SlotPool;
use crate::time::{Duration, HostTime};

/// Configuration for the [`AnimationScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerConfig {
    /// Upper bound on ticks per second.
    pub max_tick_rate: u32,
}

impl SchedulerConfig {
    /// The default configuration: 100 ticks per second.
    #[must_use]
    pub const fn new() -> Self {
        Self { max_tick_rate: 100 }
    }

    /// The delay between ticks, also used as the delta of the first tick.
    ///
    /// A rate of 0 is treated as 1.
    #[must_use]
    pub const fn frame_interval(&self) -> Duration {
        let rate = if self.max_tick_rate == 0 {
            1
        } else {
            self.max_tick_rate
        };
        Duration::from_micros(1_000_000 / rate as u64)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Active bindings and loop state.
#[derive(Debug)]
pub struct AnimationScheduler {
    config: SchedulerConfig,
    active: SlotPool<BindingId>,
    running: bool,
    last_tick: Option<HostTime>,
    tick_index: u64,
}

impl AnimationScheduler {
    /// Creates an idle scheduler.
    #[must_use]
    pub const fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            active: SlotPool::new(),
            running: false,
            last_tick: None,
            tick_index: 0,
        }
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Whether the loop is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Number of active bindings.
    #[must_use]
    pub const fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Ticks processed so far.
    #[must_use]
    pub const fn tick_index(&self) -> u64 {
        self.tick_index
    }

    /// Adds `binding` to the active set.
    ///
    /// Returns its slot, and `true` if the loop was idle and the caller must
    /// arm the timer.
    pub fn enqueue(&mut self, binding: BindingId) -> (u32, bool) {
        let slot = self.active.allocate(binding);
        let wake = !self.running;
        if wake {
            self.running = true;
            self.last_tick = None;
        }
        (slot, wake)
    }

    /// Removes a slot from the active set. Dead slots are ignored.
    pub fn dequeue(&mut self, slot: u32) -> Option<BindingId> {
        self.active.free(slot)
    }

    /// Halts the loop if nothing is active. Returns `true` if it halted.
    pub fn halt_if_idle(&mut self) -> bool {
        if self.running && self.active.is_empty() {
            self.running = false;
            self.last_tick = None;
            true
        } else {
            false
        }
    }

    /// Starts a timer tick at `now`.
    ///
    /// Returns the delta to advance by, or `None` if the loop is idle and the
    /// tick is stale. The first tick after a start uses the nominal frame
    /// interval.
    pub fn begin_tick(&mut self, now: HostTime) -> Option<Duration> {
        if !self.running {
            return None;
        }
        let delta = self
            .last_tick
            .map_or_else(|| self.config.frame_interval(), |last| now - last);
        self.last_tick = Some(now);
        self.tick_index += 1;
        Some(delta)
    }

    /// Starts a manually driven tick of exactly `delta`.
    ///
    /// Keeps the timer clock consistent so a later timer tick measures from
    /// where this one left off.
    pub fn begin_step(&mut self, delta: Duration) -> bool {
        if !self.running {
            return false;
        }
        self.last_tick = self.last_tick.map(|last| last + delta);
        self.tick_index += 1;
        true
    }

    /// The bindings to advance this tick, in slot order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<BindingId> {
        self.active.iter().map(|(_, id)| *id).collect()
    }

    /// Finishes a tick. Returns `true` if the loop continues and the caller
    /// must re-arm the timer.
    pub fn end_tick(&mut self) -> bool {
        !self.halt_if_idle() && self.running
    }
}
