// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use tessera_core::input::EventTarget;
use tessera_core::trace::{
    BindingEvent, BindingTransition, DispatchEvent, LoopState, StyleWriteEvent, TickEvent,
    TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    style_writes: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("style_writes", &self.style_writes)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            style_writes: false,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            style_writes: false,
        }
    }

    /// Also prints every style write. These are by far the most frequent
    /// events, so they are off by default.
    #[must_use]
    pub fn with_style_writes(mut self, enabled: bool) -> Self {
        self.style_writes = enabled;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn transition_name(transition: BindingTransition) -> String {
    match transition {
        BindingTransition::Started => "started".into(),
        BindingTransition::ActAdvanced(act) => format!("act={act}"),
        BindingTransition::Finished => "finished".into(),
        BindingTransition::Stopped => "stopped".into(),
        BindingTransition::Unbound => "unbound".into(),
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_tick(&mut self, e: &TickEvent) {
        let now = e
            .now
            .map_or_else(|| "step".to_owned(), |t| format!("{}µs", t.micros()));
        let _ = writeln!(
            self.writer,
            "[tick] index={} now={now} delta={:.1}ms active={}",
            e.tick_index,
            e.delta.as_millis_f64(),
            e.active,
        );
    }

    fn on_loop(&mut self, state: LoopState) {
        let state = match state {
            LoopState::Started => "started",
            LoopState::Halted => "halted",
        };
        let _ = writeln!(self.writer, "[loop] {state}");
    }

    fn on_binding(&mut self, e: &BindingEvent) {
        let _ = writeln!(
            self.writer,
            "[binding] id={} unit={} {}",
            e.binding.0,
            e.unit.0,
            transition_name(e.transition),
        );
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        let target = match e.target {
            EventTarget::Unit(unit) => format!("unit={}", unit.0),
            EventTarget::Binding(binding) => format!("binding={}", binding.0),
        };
        let outcome = if e.delivered { "delivered" } else { "dropped" };
        let _ = writeln!(self.writer, "[event] {target} {} {outcome}", e.name);
    }

    fn on_style_write(&mut self, e: &StyleWriteEvent) {
        if !self.style_writes {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[style] unit={} node={} {}={}",
            e.unit.0,
            e.node.0,
            e.property.css_name(),
            e.value,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::backend::{StyleProperty, StyleValue};
    use tessera_core::id::{BindingId, NodeId, UnitId};
    use tessera_core::input::EventName;
    use tessera_core::time::{Duration, HostTime};

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_writer()).unwrap()
    }

    #[test]
    fn pretty_print_tick() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_tick(&TickEvent {
            tick_index: 1,
            now: Some(HostTime(1_000_000)),
            delta: Duration::from_millis(10),
            active: 2,
        });
        let output = output(sink);
        assert!(output.contains("[tick]"), "got: {output}");
        assert!(output.contains("index=1"), "got: {output}");
        assert!(output.contains("delta=10.0ms"), "got: {output}");
    }

    #[test]
    fn binding_and_dispatch_lines() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_binding(&BindingEvent {
            binding: BindingId(4),
            unit: UnitId(9),
            transition: BindingTransition::ActAdvanced(2),
        });
        sink.on_dispatch(&DispatchEvent {
            target: EventTarget::Unit(UnitId(0)),
            name: EventName::KeyUp,
            delivered: false,
        });
        let output = output(sink);
        assert!(output.contains("[binding] id=4 unit=9 act=2"), "got: {output}");
        assert!(output.contains("[event] unit=0 key_up dropped"), "got: {output}");
    }

    #[test]
    fn style_writes_are_opt_in() {
        let write = StyleWriteEvent {
            unit: UnitId(1),
            node: NodeId(1),
            property: StyleProperty::Width,
            value: StyleValue::Pixels(500.0),
        };
        let mut quiet = PrettyPrintSink::with_writer(Vec::<u8>::new());
        quiet.on_style_write(&write);
        assert!(output(quiet).is_empty());

        let mut loud = PrettyPrintSink::with_writer(Vec::<u8>::new()).with_style_writes(true);
        loud.on_style_write(&write);
        let output = output(loud);
        assert!(output.contains("width=500px"), "got: {output}");
    }
}
