// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animation programs and their bindings to units.
//!
//! An [`AnimationProgram`] is an immutable list of [`Act`]s. Each act moves
//! a set of channels by fixed deltas, linearly, over its duration. Binding a
//! program to a unit creates an [`AnimationBinding`] that walks the acts as
//! the scheduler feeds it time.
//!
//! Overshoot at the end of an act is carried into the next one, so the sum
//! of act durations stays on the wall clock regardless of tick granularity.
//! After the last act the binding wraps to act 0 and reports
//! [`Advance::Finished`].

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::id::{AnimationId, BindingId, UnitId};
use crate::pool::SlotPool;
use crate::value::Channel;

/// Float residue below which an act counts as exhausted.
const ACT_EPSILON_MS: f64 = 1e-9;

/// One timed step of a program.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Act {
    /// Duration in milliseconds.
    pub duration_ms: f64,
    /// Total change per channel over the act.
    pub deltas: BTreeMap<Channel, f64>,
}

impl Act {
    /// Creates an act with no deltas.
    #[must_use]
    pub fn new(duration_ms: f64) -> Self {
        Self {
            duration_ms,
            deltas: BTreeMap::new(),
        }
    }

    /// Adds a channel delta.
    #[must_use]
    pub fn with(mut self, channel: Channel, delta: f64) -> Self {
        self.deltas.insert(channel, delta);
        self
    }

    fn is_valid(&self) -> bool {
        self.duration_ms.is_finite()
            && self.duration_ms >= 0.0
            && self.deltas.values().all(|d| d.is_finite())
    }
}

/// An immutable, non-empty sequence of acts.
#[derive(Debug)]
pub struct AnimationProgram {
    acts: Rc<[Act]>,
    pub(crate) binds: SlotPool<BindingId>,
}

impl AnimationProgram {
    /// Builds a program, or `None` if `acts` is empty or any act has a
    /// negative or non-finite duration or delta.
    #[must_use]
    pub fn new(acts: Vec<Act>) -> Option<Self> {
        if acts.is_empty() || !acts.iter().all(Act::is_valid) {
            return None;
        }
        Some(Self {
            acts: acts.into(),
            binds: SlotPool::new(),
        })
    }

    /// The acts, in order.
    #[must_use]
    pub fn acts(&self) -> &[Act] {
        &self.acts
    }

    /// Number of bindings referencing this program.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.binds.len()
    }
}

/// What a call to [`AnimationBinding::advance`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Still inside the current act.
    Continue,
    /// The current act finished and the next one began.
    NextAct(usize),
    /// The last act finished; the binding is back at act 0.
    Finished,
}

/// The live pairing of a program with a unit.
#[derive(Debug)]
pub struct AnimationBinding {
    unit: UnitId,
    program: AnimationId,
    program_slot: u32,
    acts: Rc<[Act]>,
    act_index: usize,
    remaining_ms: f64,
    pending: BTreeMap<Channel, f64>,
    pub(crate) scheduler_slot: Option<u32>,
    pub(crate) stop_armed: bool,
}

impl AnimationBinding {
    pub(crate) fn new(
        unit: UnitId,
        program: AnimationId,
        program_slot: u32,
        source: &AnimationProgram,
    ) -> Self {
        let mut binding = Self {
            unit,
            program,
            program_slot,
            acts: Rc::clone(&source.acts),
            act_index: 0,
            remaining_ms: 0.0,
            pending: BTreeMap::new(),
            scheduler_slot: None,
            stop_armed: false,
        };
        binding.enter_act(0, 0.0);
        binding
    }

    /// The unit this binding drives.
    #[must_use]
    pub const fn unit(&self) -> UnitId {
        self.unit
    }

    /// The program this binding runs.
    #[must_use]
    pub const fn program(&self) -> AnimationId {
        self.program
    }

    pub(crate) const fn program_slot(&self) -> u32 {
        self.program_slot
    }

    /// Index of the current act.
    #[must_use]
    pub const fn act_index(&self) -> usize {
        self.act_index
    }

    /// Milliseconds left in the current act.
    #[must_use]
    pub const fn remaining_ms(&self) -> f64 {
        self.remaining_ms
    }

    /// Delta still to be applied to `channel` in the current act.
    #[must_use]
    pub fn pending(&self, channel: Channel) -> Option<f64> {
        self.pending.get(&channel).copied()
    }

    /// Whether the binding is in the scheduler's active set.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.scheduler_slot.is_some()
    }

    fn enter_act(&mut self, index: usize, late_ms: f64) {
        self.act_index = index;
        let act = &self.acts[index];
        self.remaining_ms = act.duration_ms + late_ms;
        self.pending.clone_from(&act.deltas);
    }

    /// Advances by `delta_ms`, pushing each channel's step into `steps`.
    ///
    /// A tick that exhausts the act applies the full pending delta, so an
    /// act always moves its channels by exactly the declared amount.
    pub fn advance(&mut self, delta_ms: f64, steps: &mut Vec<(Channel, f64)>) -> Advance {
        let last = self.remaining_ms - delta_ms <= ACT_EPSILON_MS;
        for (&channel, pending) in &mut self.pending {
            let step = if last {
                *pending
            } else {
                *pending * delta_ms / self.remaining_ms
            };
            *pending -= step;
            steps.push((channel, step));
        }
        self.remaining_ms -= delta_ms;

        if !last {
            return Advance::Continue;
        }
        let late = self.remaining_ms.min(0.0);
        let next = self.act_index + 1;
        if next < self.acts.len() {
            self.enter_act(next, late);
            Advance::NextAct(next)
        } else {
            self.enter_act(0, 0.0);
            Advance::Finished
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(acts: Vec<Act>) -> AnimationProgram {
        AnimationProgram::new(acts).unwrap()
    }

    fn bind(program: &AnimationProgram) -> AnimationBinding {
        AnimationBinding::new(UnitId(1), AnimationId(0), 0, program)
    }

    fn total(steps: &[(Channel, f64)], channel: Channel) -> f64 {
        steps
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, s)| s)
            .sum()
    }

    #[test]
    fn rejects_empty_and_malformed_programs() {
        assert!(AnimationProgram::new(Vec::new()).is_none());
        assert!(AnimationProgram::new(vec![Act::new(-1.0)]).is_none());
        assert!(AnimationProgram::new(vec![Act::new(f64::INFINITY)]).is_none());
        assert!(AnimationProgram::new(vec![Act::new(5.0).with(Channel::X, f64::NAN)]).is_none());
        assert!(AnimationProgram::new(vec![Act::new(0.0)]).is_some());
    }

    #[test]
    fn single_act_moves_exactly_its_delta() {
        let p = program(vec![Act::new(1000.0).with(Channel::X, 90.0)]);
        let mut b = bind(&p);
        let mut steps = Vec::new();
        let mut outcome = Advance::Continue;
        for _ in 0..7 {
            outcome = b.advance(1000.0 / 7.0, &mut steps);
        }
        assert_eq!(outcome, Advance::Finished);
        assert!((total(&steps, Channel::X) - 90.0).abs() < 1e-9);
        assert_eq!(b.act_index(), 0);
    }

    #[test]
    fn linear_step_is_proportional() {
        let p = program(vec![Act::new(100.0).with(Channel::Width, 50.0)]);
        let mut b = bind(&p);
        let mut steps = Vec::new();
        assert_eq!(b.advance(20.0, &mut steps), Advance::Continue);
        assert_eq!(steps, [(Channel::Width, 10.0)]);
        assert_eq!(b.pending(Channel::Width), Some(40.0));
        assert_eq!(b.remaining_ms(), 80.0);
    }

    #[test]
    fn overshoot_carries_into_next_act() {
        let p = program(vec![
            Act::new(100.0).with(Channel::X, 10.0),
            Act::new(100.0).with(Channel::Y, 10.0),
        ]);
        let mut b = bind(&p);
        let mut steps = Vec::new();
        assert_eq!(b.advance(130.0, &mut steps), Advance::NextAct(1));
        assert_eq!(steps, [(Channel::X, 10.0)]);
        assert_eq!(b.remaining_ms(), 70.0);

        steps.clear();
        assert_eq!(b.advance(35.0, &mut steps), Advance::Continue);
        assert_eq!(steps, [(Channel::Y, 5.0)]);
    }

    #[test]
    fn two_act_round_trip_wraps() {
        let p = program(vec![
            Act::new(1000.0).with(Channel::Opacity, 50.0),
            Act::new(500.0).with(Channel::Opacity, -50.0),
        ]);
        let mut b = bind(&p);
        let mut steps = Vec::new();
        assert_eq!(b.advance(1000.0, &mut steps), Advance::NextAct(1));
        assert_eq!(b.advance(500.0, &mut steps), Advance::Finished);
        assert_eq!(total(&steps, Channel::Opacity), 0.0);
        assert_eq!(b.act_index(), 0);
        assert_eq!(b.pending(Channel::Opacity), Some(50.0));
    }

    #[test]
    fn zero_duration_act_completes_on_first_tick() {
        let p = program(vec![Act::new(0.0).with(Channel::Rotation, 45.0)]);
        let mut b = bind(&p);
        let mut steps = Vec::new();
        assert_eq!(b.advance(10.0, &mut steps), Advance::Finished);
        assert_eq!(steps, [(Channel::Rotation, 45.0)]);
    }
}
