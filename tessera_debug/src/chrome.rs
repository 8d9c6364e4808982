// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversion of recordings to the [Chrome Trace Event Format][format].
//!
//! [`export`] takes the bytes of a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes one JSON array of trace events.
//!
//! Only ticks carry a time. Timer ticks set the clock to their host time;
//! manually stepped ticks advance it by their delta. Every other event is
//! stamped with the clock of the tick before it.
//!
//! Each binding gets its own track (`tid = binding + 1`), running from its
//! start to its stop. Track 0 carries ticks, loop transitions and input.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use tessera_core::input::EventTarget;
use tessera_core::trace::{BindingTransition, LoopState};

use crate::recorder::{RecordedEvent, decode};

/// Writes a recording as a trace that `chrome://tracing` and
/// [Perfetto](https://ui.perfetto.dev/) can open.
/// Style writes are summed per tick into a `StyleWrites` counter.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut clock_us: u64 = 0;
    let mut writes: u64 = 0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Tick(e) => {
                if writes > 0 {
                    events.push(style_counter(clock_us, writes));
                    writes = 0;
                }
                clock_us = e
                    .now
                    .map_or(clock_us + e.delta.micros(), |now| now.micros());
                events.push(json!({
                    "ph": "i",
                    "name": "Tick",
                    "cat": "Scheduler",
                    "ts": clock_us,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "tick_index": e.tick_index,
                        "delta_ms": e.delta.as_millis_f64(),
                        "active": e.active,
                        "timer": e.now.is_some(),
                    }
                }));
            }
            RecordedEvent::Loop(state) => {
                let name = match state {
                    LoopState::Started => "LoopStarted",
                    LoopState::Halted => "LoopHalted",
                };
                events.push(json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Scheduler",
                    "ts": clock_us,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                }));
            }
            RecordedEvent::Binding(e) => {
                let tid = u64::from(e.binding.0) + 1;
                let args = json!({
                    "binding": e.binding.0,
                    "unit": e.unit.0,
                });
                let event = match e.transition {
                    BindingTransition::Started => json!({
                        "ph": "B",
                        "name": format!("Binding {}", e.binding.0),
                        "cat": "Animation",
                        "ts": clock_us,
                        "pid": 0,
                        "tid": tid,
                        "args": args,
                    }),
                    BindingTransition::Stopped => json!({
                        "ph": "E",
                        "name": format!("Binding {}", e.binding.0),
                        "cat": "Animation",
                        "ts": clock_us,
                        "pid": 0,
                        "tid": tid,
                        "args": args,
                    }),
                    BindingTransition::ActAdvanced(act) => json!({
                        "ph": "i",
                        "name": "ActAdvanced",
                        "cat": "Animation",
                        "ts": clock_us,
                        "pid": 0,
                        "tid": tid,
                        "s": "t",
                        "args": { "binding": e.binding.0, "unit": e.unit.0, "act": act },
                    }),
                    BindingTransition::Finished | BindingTransition::Unbound => json!({
                        "ph": "i",
                        "name": format!("{:?}", e.transition),
                        "cat": "Animation",
                        "ts": clock_us,
                        "pid": 0,
                        "tid": tid,
                        "s": "t",
                        "args": args,
                    }),
                };
                events.push(event);
            }
            RecordedEvent::Dispatch(e) => {
                let (kind, id) = match e.target {
                    EventTarget::Unit(unit) => ("unit", unit.0),
                    EventTarget::Binding(binding) => ("binding", binding.0),
                };
                events.push(json!({
                    "ph": "i",
                    "name": e.name.name(),
                    "cat": "Input",
                    "ts": clock_us,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "target": format!("{kind} {id}"),
                        "delivered": e.delivered,
                    }
                }));
            }
            RecordedEvent::StyleWrite { .. } => writes += 1,
        }
    }
    if writes > 0 {
        events.push(style_counter(clock_us, writes));
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn style_counter(ts: u64, writes: u64) -> Value {
    json!({
        "ph": "C",
        "name": "StyleWrites",
        "cat": "Rich",
        "ts": ts,
        "pid": 0,
        "args": { "writes": writes },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use tessera_core::backend::{StyleProperty, StyleValue};
    use tessera_core::id::{BindingId, NodeId, UnitId};
    use tessera_core::time::{Duration, HostTime};
    use tessera_core::trace::{BindingEvent, StyleWriteEvent, TickEvent, TraceSink};

    fn tick(now: Option<u64>, delta_ms: u64) -> TickEvent {
        TickEvent {
            tick_index: 0,
            now: now.map(HostTime),
            delta: Duration::from_millis(delta_ms),
            active: 1,
        }
    }

    fn binding(transition: BindingTransition) -> BindingEvent {
        BindingEvent {
            binding: BindingId(0),
            unit: UnitId(1),
            transition,
        }
    }

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_binding(&binding(BindingTransition::Started));
        rec.on_tick(&tick(Some(1_000_000), 10));
        rec.on_style_write(&StyleWriteEvent {
            unit: UnitId(1),
            node: NodeId(1),
            property: StyleProperty::Left,
            value: StyleValue::Pixels(4.0),
        });
        rec.on_tick(&tick(None, 10));
        rec.on_binding(&binding(BindingTransition::Stopped));

        let mut out = Vec::new();
        export(&rec.bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 5);

        // The span opens before the first tick, at clock zero.
        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["ts"], 0);
        assert_eq!(parsed[0]["tid"], 1);

        assert_eq!(parsed[1]["name"], "Tick");
        assert_eq!(parsed[1]["ts"], 1_000_000);

        // Writes are flushed at the next tick boundary.
        assert_eq!(parsed[2]["ph"], "C");
        assert_eq!(parsed[2]["args"]["writes"], 1);

        // A stepped tick advances the clock by its delta.
        assert_eq!(parsed[3]["ts"], 1_010_000);
        assert_eq!(parsed[4]["ph"], "E");
        assert_eq!(parsed[4]["ts"], 1_010_000);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }
}
