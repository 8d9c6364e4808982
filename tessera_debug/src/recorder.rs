// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory binary trace recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a shared
//! byte buffer as little-endian records. [`decode`] reads them back as an
//! iterator of [`RecordedEvent`].
//!
//! The scene owns its sink, so the buffer is shared: keep a clone of the
//! recorder and read it with [`RecorderSink::bytes`] while the scene runs.
//!
//! Style writes store only the unit and node, not the property or value.

use std::cell::RefCell;
use std::rc::Rc;

use tessera_core::id::{BindingId, NodeId, UnitId};
use tessera_core::input::{EventName, EventTarget};
use tessera_core::time::{Duration, HostTime};
use tessera_core::trace::{
    BindingEvent, BindingTransition, DispatchEvent, LoopState, StyleWriteEvent, TickEvent,
    TraceSink,
};

const TAG_TICK: u8 = 1;
const TAG_LOOP: u8 = 2;
const TAG_BINDING: u8 = 3;
const TAG_DISPATCH: u8 = 4;
const TAG_STYLE_WRITE: u8 = 5;

/// Encodes every trace event into a byte buffer.
///
/// Clones share the buffer.
#[derive(Clone, Debug, Default)]
pub struct RecorderSink {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded bytes.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.buf.borrow().clone()
    }

    /// Number of recorded bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.borrow().len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.borrow().is_empty()
    }

    /// Discards everything recorded so far.
    pub fn clear(&self) {
        self.buf.borrow_mut().clear();
    }

    fn put(&mut self, bytes: &[u8]) {
        self.buf.borrow_mut().extend_from_slice(bytes);
    }

    fn write_u8(&mut self, v: u8) {
        self.put(&[v]);
    }

    fn write_u32(&mut self, v: u32) {
        self.put(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.put(&v.to_le_bytes());
    }

    /// Presence byte, then the value (zero when absent).
    fn write_option_u64(&mut self, v: Option<u64>) {
        self.write_u8(u8::from(v.is_some()));
        self.write_u64(v.unwrap_or_default());
    }

    fn write_event_name(&mut self, name: EventName) {
        let idx = EventName::ALL.iter().position(|n| *n == name).unwrap_or(0);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "there are fewer than 256 event names"
        )]
        let idx = idx as u8;
        self.write_u8(idx);
    }
}

impl TraceSink for RecorderSink {
    fn on_tick(&mut self, e: &TickEvent) {
        self.write_u8(TAG_TICK);
        self.write_u64(e.tick_index);
        self.write_option_u64(e.now.map(HostTime::micros));
        self.write_u64(e.delta.micros());
        #[expect(
            clippy::cast_possible_truncation,
            reason = "active count capped at u32::MAX for recording"
        )]
        let active = e.active.min(u32::MAX as usize) as u32;
        self.write_u32(active);
    }

    fn on_loop(&mut self, state: LoopState) {
        self.write_u8(TAG_LOOP);
        self.write_u8(match state {
            LoopState::Started => 0,
            LoopState::Halted => 1,
        });
    }

    fn on_binding(&mut self, e: &BindingEvent) {
        self.write_u8(TAG_BINDING);
        self.write_u32(e.binding.0);
        self.write_u32(e.unit.0);
        let (kind, act) = match e.transition {
            BindingTransition::Started => (0, 0),
            BindingTransition::ActAdvanced(act) => (1, act),
            BindingTransition::Finished => (2, 0),
            BindingTransition::Stopped => (3, 0),
            BindingTransition::Unbound => (4, 0),
        };
        self.write_u8(kind);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "act index capped at u32::MAX for recording"
        )]
        let act = act.min(u32::MAX as usize) as u32;
        self.write_u32(act);
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        self.write_u8(TAG_DISPATCH);
        self.write_u8(match e.target {
            EventTarget::Unit(_) => 0,
            EventTarget::Binding(_) => 1,
        });
        self.write_u32(e.target.raw());
        self.write_event_name(e.name);
        self.write_u8(u8::from(e.delivered));
    }

    fn on_style_write(&mut self, e: &StyleWriteEvent) {
        self.write_u8(TAG_STYLE_WRITE);
        self.write_u32(e.unit.0);
        self.write_u32(e.node.0);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`TickEvent`].
    Tick(TickEvent),
    /// A [`LoopState`] change.
    Loop(LoopState),
    /// A [`BindingEvent`].
    Binding(BindingEvent),
    /// A [`DispatchEvent`].
    Dispatch(DispatchEvent),
    /// A style write, without its property and value.
    StyleWrite {
        /// The unit applied.
        unit: UnitId,
        /// Its node.
        node: NodeId,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter { rest: bytes }
}

/// Iterator over decoded events. Stops at the first truncated record or
/// unknown tag.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    rest: &'a [u8],
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let (head, rest) = self.rest.split_first_chunk::<N>()?;
        self.rest = rest;
        Some(*head)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_option_u64(&mut self) -> Option<Option<u64>> {
        let present = self.read_u8()? != 0;
        let value = self.read_u64()?;
        Some(present.then_some(value))
    }

    fn decode_tick(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Tick(TickEvent {
            tick_index: self.read_u64()?,
            now: self.read_option_u64()?.map(HostTime),
            delta: Duration(self.read_u64()?),
            active: self.read_u32()? as usize,
        }))
    }

    fn decode_loop(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Loop(match self.read_u8()? {
            0 => LoopState::Started,
            _ => LoopState::Halted,
        }))
    }

    fn decode_binding(&mut self) -> Option<RecordedEvent> {
        let binding = BindingId(self.read_u32()?);
        let unit = UnitId(self.read_u32()?);
        let kind = self.read_u8()?;
        let act = self.read_u32()? as usize;
        let transition = match kind {
            0 => BindingTransition::Started,
            1 => BindingTransition::ActAdvanced(act),
            2 => BindingTransition::Finished,
            3 => BindingTransition::Stopped,
            _ => BindingTransition::Unbound,
        };
        Some(RecordedEvent::Binding(BindingEvent {
            binding,
            unit,
            transition,
        }))
    }

    fn decode_dispatch(&mut self) -> Option<RecordedEvent> {
        let kind = self.read_u8()?;
        let raw = self.read_u32()?;
        let target = match kind {
            0 => EventTarget::Unit(UnitId(raw)),
            _ => EventTarget::Binding(BindingId(raw)),
        };
        let name = *EventName::ALL.get(usize::from(self.read_u8()?))?;
        let delivered = self.read_u8()? != 0;
        Some(RecordedEvent::Dispatch(DispatchEvent {
            target,
            name,
            delivered,
        }))
    }

    fn decode_style_write(&mut self) -> Option<RecordedEvent> {
        let unit = UnitId(self.read_u32()?);
        let node = NodeId(self.read_u32()?);
        Some(RecordedEvent::StyleWrite { unit, node })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_TICK => self.decode_tick(),
            TAG_LOOP => self.decode_loop(),
            TAG_BINDING => self.decode_binding(),
            TAG_DISPATCH => self.decode_dispatch(),
            TAG_STYLE_WRITE => self.decode_style_write(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tick() -> TickEvent {
        TickEvent {
            tick_index: 7,
            now: Some(HostTime(1_000_000)),
            delta: Duration::from_millis(10),
            active: 3,
        }
    }

    #[test]
    fn clones_share_the_buffer() {
        let rec = RecorderSink::new();
        let mut boxed: Box<dyn TraceSink> = Box::new(rec.clone());
        boxed.on_loop(LoopState::Started);
        assert!(!rec.is_empty());
        rec.clear();
        assert!(rec.is_empty());
    }

    #[test]
    fn mixed_stream_decodes_in_order() {
        let mut rec = RecorderSink::new();
        let binding = BindingEvent {
            binding: BindingId(2),
            unit: UnitId(5),
            transition: BindingTransition::ActAdvanced(3),
        };
        let dispatch = DispatchEvent {
            target: EventTarget::Unit(UnitId(0)),
            name: EventName::KeyDown,
            delivered: true,
        };
        rec.on_loop(LoopState::Started);
        rec.on_tick(&sample_tick());
        rec.on_binding(&binding);
        rec.on_dispatch(&dispatch);
        rec.on_loop(LoopState::Halted);

        let events: Vec<_> = decode(&rec.bytes()).collect();
        assert_eq!(
            events,
            [
                RecordedEvent::Loop(LoopState::Started),
                RecordedEvent::Tick(sample_tick()),
                RecordedEvent::Binding(binding),
                RecordedEvent::Dispatch(dispatch),
                RecordedEvent::Loop(LoopState::Halted),
            ]
        );
    }

    #[test]
    fn timerless_ticks_keep_their_delta() {
        let mut rec = RecorderSink::new();
        let tick = TickEvent {
            now: None,
            ..sample_tick()
        };
        rec.on_tick(&tick);
        let events: Vec<_> = decode(&rec.bytes()).collect();
        assert_eq!(events, [RecordedEvent::Tick(tick)]);
    }

    #[test]
    fn truncated_buffer_stops_cleanly() {
        let mut rec = RecorderSink::new();
        rec.on_tick(&sample_tick());
        let bytes = rec.bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 2]).collect();
        assert!(events.is_empty());
        assert_eq!(decode(&[]).count(), 0);
    }
}
