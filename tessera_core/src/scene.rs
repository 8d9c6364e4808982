// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The handle-based scene facade.
//!
//! [`Scene`] is the context object that owns every pool (units, programs,
//! bindings), the scheduler, the input registrations and the back end. All
//! handles it returns are slot ids; an operation on a stale or wrong-kind
//! handle does nothing and reports it through its return value.
//!
//! # Driving a scene
//!
//! ```rust,ignore
//! let mut scene = Scene::new(backend, SceneConfig::default())?;
//! let box_ = scene.unit_create(UnitProperties::new(UnitContent::frame())
//!     .with(Channel::Width, "50%"));
//! scene.unit_attach(UnitId::ROOT, box_);
//!
//! let fade = scene.animation_create(vec![Act::new(1000.0).with(Channel::Opacity, 100.0)]);
//! let binding = scene.animation_bind(box_, fade.unwrap()).unwrap();
//! scene.animation_start(binding);
//!
//! // When the back end's timer fires:
//! scene.tick(now());
//! ```

use core::fmt;

use kurbo::Size;

use crate::animation::{Act, Advance, AnimationBinding, AnimationProgram};
use crate::backend::{Backend, ControlCommand, ControlReply, ListenTarget};
use crate::caps::{Capabilities, CapabilityReport};
use crate::error::SceneError;
use crate::id::{AnimationId, BindingId, UnitId};
use crate::input::{
    Callback, Event, EventData, EventName, EventTarget, InputTranslator, Modifiers, RawEvent,
};
use crate::pool::SlotPool;
use crate::scheduler::{AnimationScheduler, SchedulerConfig};
use crate::time::{Duration, HostTime};
use crate::trace::{
    BindingEvent, BindingTransition, DispatchEvent, LoopState, TickEvent, TraceSink, Tracer,
};
use crate::tree::{UnitGeometry, UnitTree};
use crate::unit::{SceneUnit, UnitContent, UnitKind, UnitProperties};
use crate::value::{Channel, GeometryValue, ValueSpec};

/// Configuration for a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneConfig {
    /// Animation loop settings.
    pub scheduler: SchedulerConfig,
    /// Font size the reference glyph is measured at.
    pub reference_font_size: f64,
}

impl SceneConfig {
    /// The default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            scheduler: SchedulerConfig::new(),
            reference_font_size: 16.0,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A scene graph bound to one back end.
pub struct Scene<B: Backend> {
    backend: B,
    config: SceneConfig,
    tree: UnitTree,
    programs: SlotPool<AnimationProgram>,
    bindings: SlotPool<AnimationBinding>,
    scheduler: AnimationScheduler,
    input: InputTranslator,
    trace: Option<Box<dyn TraceSink>>,
    steps: Vec<(Channel, f64)>,
}

impl<B: Backend + fmt::Debug> fmt::Debug for Scene<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("backend", &self.backend)
            .field("config", &self.config)
            .field("tree", &self.tree)
            .field("programs", &self.programs.len())
            .field("bindings", &self.bindings.len())
            .field("scheduler", &self.scheduler)
            .field("input", &self.input)
            .field("trace", &self.trace.is_some())
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Scene<B> {
    /// Binds a new scene to `backend`.
    ///
    /// Probes the host's capabilities and applies the root unit to the
    /// viewport.
    ///
    /// # Errors
    ///
    /// Fails if the back end has no root node or no viewport size.
    pub fn new(mut backend: B, config: SceneConfig) -> Result<Self, SceneError> {
        let root_node = backend.root_node().ok_or(SceneError::HostUnavailable)?;
        let viewport = backend.viewport().ok_or(SceneError::ViewportUnavailable)?;
        let caps = Capabilities::probe(&mut backend, config.reference_font_size);
        let root = SceneUnit::new(UnitProperties::new(UnitContent::frame()), root_node);

        let mut scene = Self {
            backend,
            config,
            tree: UnitTree::new(root, viewport, caps),
            programs: SlotPool::new(),
            bindings: SlotPool::new(),
            scheduler: AnimationScheduler::new(config.scheduler),
            input: InputTranslator::new(),
            trace: None,
            steps: Vec::new(),
        };
        scene
            .tree
            .apply_all(&mut scene.backend, &mut Tracer::none(), UnitId::ROOT);
        Ok(scene)
    }

    // --- accessors ---

    /// The back end.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The back end, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The configuration the scene was built with.
    #[must_use]
    pub const fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// The unit tree.
    #[must_use]
    pub const fn tree(&self) -> &UnitTree {
        &self.tree
    }

    /// Returns the unit behind `id`, if live.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&SceneUnit> {
        self.tree.get(id)
    }

    /// Returns the program behind `id`, if live.
    #[must_use]
    pub fn program(&self, id: AnimationId) -> Option<&AnimationProgram> {
        self.programs.get(id.0)
    }

    /// Returns the binding behind `id`, if live.
    #[must_use]
    pub fn binding(&self, id: BindingId) -> Option<&AnimationBinding> {
        self.bindings.get(id.0)
    }

    /// The animation scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    /// Installs a trace sink, replacing any previous one.
    pub fn set_trace_sink(&mut self, sink: impl TraceSink + 'static) {
        self.trace = Some(Box::new(sink));
    }

    /// Removes the trace sink.
    pub fn clear_trace_sink(&mut self) {
        self.trace = None;
    }

    /// What the host can render.
    #[must_use]
    pub fn capabilities(&self) -> CapabilityReport {
        self.tree.capabilities().report()
    }

    // --- units ---

    /// Creates a detached unit and applies its declared geometry.
    pub fn unit_create(&mut self, properties: UnitProperties) -> UnitId {
        let node = self.backend.create_node(&properties.content);
        let id = self.tree.insert(SceneUnit::new(properties, node));
        self.tree
            .apply_all(&mut self.backend, &mut Tracer::from_slot(&mut self.trace), id);
        id
    }

    /// Destroys `id` and its whole subtree.
    ///
    /// Bindings targeting destroyed units are stopped silently and unbound;
    /// their event registrations are dropped. The root cannot be destroyed.
    pub fn unit_destroy(&mut self, id: UnitId) -> bool {
        if id.is_root() || !self.tree.contains(id) {
            log::debug!("unit_destroy: ignoring {id:?}");
            return false;
        }
        let removed = self.tree.remove_subtree(&mut self.backend, id);
        for (unit_id, unit) in &removed {
            let bound: Vec<_> = self
                .bindings
                .iter()
                .filter(|(_, binding)| binding.unit() == *unit_id)
                .map(|(slot, _)| BindingId(slot))
                .collect();
            for binding in bound {
                self.stop_binding(binding, false);
                self.release_binding(binding);
            }
            let listen = ListenTarget::Unit {
                unit: *unit_id,
                node: unit.node(),
            };
            for name in self.input.remove_target(EventTarget::Unit(*unit_id)) {
                self.backend.listen(listen, name, false);
            }
            self.backend.release_node(unit.node());
        }
        true
    }

    /// Appends `child` under `parent`, moving it if it already has a parent.
    pub fn unit_attach(&mut self, parent: UnitId, child: UnitId) -> bool {
        let attached = self.tree.attach(
            &mut self.backend,
            &mut Tracer::from_slot(&mut self.trace),
            parent,
            child,
        );
        if !attached {
            log::debug!("unit_attach: rejected {child:?} under {parent:?}");
        }
        attached
    }

    /// Unlinks `id` from its parent without destroying it.
    pub fn unit_detach(&mut self, id: UnitId) -> bool {
        self.tree.detach(&mut self.backend, id)
    }

    /// Reads the box of `id`, in pixels or as declared.
    pub fn unit_get_geometry(&mut self, id: UnitId, in_pixels: bool) -> Option<UnitGeometry> {
        self.tree.geometry(id, in_pixels)
    }

    /// Replaces the declaration of one channel and applies it.
    ///
    /// Malformed declarations fall back to the channel default.
    pub fn unit_set_value(
        &mut self,
        id: UnitId,
        channel: Channel,
        spec: impl Into<ValueSpec>,
    ) -> bool {
        let value = GeometryValue::from_spec(channel, &spec.into());
        self.tree.set_value(
            &mut self.backend,
            &mut Tracer::from_slot(&mut self.trace),
            id,
            value,
        )
    }

    /// Runs a kind-specific command. Returns `None` for stale handles and
    /// commands meant for another kind.
    pub fn unit_control(&mut self, id: UnitId, command: &ControlCommand) -> Option<ControlReply> {
        let unit = self.tree.get(id)?;
        if unit.kind() != command.target_kind() {
            log::debug!(
                "unit_control: {command:?} does not apply to {} unit {id:?}",
                unit.kind().name()
            );
            return None;
        }
        Some(self.backend.control(unit.node(), command))
    }

    /// Re-resolves the whole tree against a new viewport size.
    pub fn resize_viewport(&mut self, viewport: Size) {
        self.tree.set_viewport(
            &mut self.backend,
            &mut Tracer::from_slot(&mut self.trace),
            viewport,
        );
    }

    // --- animation ---

    /// Creates a program. Returns `None` for an empty or malformed act list.
    pub fn animation_create(&mut self, acts: Vec<Act>) -> Option<AnimationId> {
        let Some(program) = AnimationProgram::new(acts) else {
            log::debug!("animation_create: rejected act list");
            return None;
        };
        Some(AnimationId(self.programs.allocate(program)))
    }

    /// Destroys a program that has no bindings.
    pub fn animation_destroy(&mut self, id: AnimationId) -> bool {
        match self.programs.get(id.0) {
            Some(program) if program.binding_count() == 0 => {
                self.programs.free(id.0);
                true
            }
            Some(program) => {
                log::debug!(
                    "animation_destroy: {id:?} still has {} bindings",
                    program.binding_count()
                );
                false
            }
            None => false,
        }
    }

    /// Binds a program to a unit. The binding starts idle at act 0.
    ///
    /// The root cannot be animated; its geometry follows the viewport.
    pub fn animation_bind(&mut self, unit: UnitId, animation: AnimationId) -> Option<BindingId> {
        if unit.is_root() || !self.tree.contains(unit) {
            log::debug!("animation_bind: no animatable unit {unit:?}");
            return None;
        }
        let program = self.programs.get_mut(animation.0)?;
        let slot = self.bindings.allocate_with(|slot| {
            let program_slot = program.binds.allocate(BindingId(slot));
            AnimationBinding::new(unit, animation, program_slot, program)
        });
        Some(BindingId(slot))
    }

    /// Destroys a binding, stopping it first without notification.
    pub fn animation_unbind(&mut self, id: BindingId) -> bool {
        if !self.bindings.contains(id.0) {
            return false;
        }
        self.stop_binding(id, false);
        self.release_binding(id)
    }

    /// Enqueues a binding with the scheduler. Starting a running binding
    /// does nothing.
    pub fn animation_start(&mut self, id: BindingId) -> bool {
        let Some(binding) = self.bindings.get_mut(id.0) else {
            return false;
        };
        if binding.is_running() {
            return true;
        }
        let unit = binding.unit();
        let (slot, wake) = self.scheduler.enqueue(id);
        binding.scheduler_slot = Some(slot);
        self.trace_binding(id, unit, BindingTransition::Started);
        if wake {
            log::trace!("animation loop started");
            Tracer::from_slot(&mut self.trace).loop_state(LoopState::Started);
            let interval = self.scheduler.config().frame_interval();
            self.backend.request_tick(interval);
        }
        true
    }

    /// Dequeues a running binding and fires `animation_stopped` if armed.
    ///
    /// Progress already applied stays applied.
    pub fn animation_stop(&mut self, id: BindingId) -> bool {
        let stopped = self.stop_binding(id, true);
        if stopped {
            self.halt_if_idle();
        }
        stopped
    }

    fn stop_binding(&mut self, id: BindingId, notify: bool) -> bool {
        let Some(binding) = self.bindings.get_mut(id.0) else {
            return false;
        };
        let Some(slot) = binding.scheduler_slot.take() else {
            return false;
        };
        let armed = binding.stop_armed;
        let unit = binding.unit();
        self.scheduler.dequeue(slot);
        self.trace_binding(id, unit, BindingTransition::Stopped);
        if notify && armed {
            self.input.deliver(&Event {
                target: EventTarget::Binding(id),
                name: EventName::AnimationStopped,
                data: EventData::None,
            });
        }
        true
    }

    fn release_binding(&mut self, id: BindingId) -> bool {
        let Some(binding) = self.bindings.free(id.0) else {
            return false;
        };
        if let Some(program) = self.programs.get_mut(binding.program().0) {
            program.binds.free(binding.program_slot());
        }
        self.input.remove_target(EventTarget::Binding(id));
        self.trace_binding(id, binding.unit(), BindingTransition::Unbound);
        self.halt_if_idle();
        true
    }

    fn halt_if_idle(&mut self) {
        if self.scheduler.halt_if_idle() {
            log::trace!("animation loop halted");
            Tracer::from_slot(&mut self.trace).loop_state(LoopState::Halted);
        }
    }

    fn trace_binding(&mut self, binding: BindingId, unit: UnitId, transition: BindingTransition) {
        Tracer::from_slot(&mut self.trace).binding(&BindingEvent {
            binding,
            unit,
            transition,
        });
    }

    /// Handles a timer tick at `now`.
    ///
    /// Advances every active binding by the time since the previous tick and
    /// re-arms the timer while anything is still running. Ticks that arrive
    /// after the loop halted are ignored.
    pub fn tick(&mut self, now: HostTime) {
        let Some(delta) = self.scheduler.begin_tick(now) else {
            log::trace!("ignoring tick while idle");
            return;
        };
        self.run_tick(Some(now), delta);
    }

    /// Advances every active binding by exactly `delta`, without consulting
    /// the clock. Returns whether the loop is still running afterwards.
    pub fn step(&mut self, delta: Duration) -> bool {
        if !self.scheduler.begin_step(delta) {
            return false;
        }
        self.run_tick(None, delta)
    }

    fn run_tick(&mut self, now: Option<HostTime>, delta: Duration) -> bool {
        let active = self.scheduler.snapshot();
        Tracer::from_slot(&mut self.trace).tick(&TickEvent {
            tick_index: self.scheduler.tick_index(),
            now,
            delta,
            active: active.len(),
        });

        let delta_ms = delta.as_millis_f64();
        for id in active {
            self.advance_binding(id, delta_ms);
        }

        let running = self.scheduler.end_tick();
        if running {
            let interval = self.scheduler.config().frame_interval();
            self.backend.request_tick(interval);
        } else {
            log::trace!("animation loop halted");
            Tracer::from_slot(&mut self.trace).loop_state(LoopState::Halted);
        }
        running
    }

    fn advance_binding(&mut self, id: BindingId, delta_ms: f64) {
        let Some(binding) = self.bindings.get_mut(id.0) else {
            return;
        };
        if !binding.is_running() {
            return;
        }
        let unit = binding.unit();
        let mut steps = core::mem::take(&mut self.steps);
        steps.clear();
        let outcome = binding.advance(delta_ms, &mut steps);

        {
            let mut tracer = Tracer::from_slot(&mut self.trace);
            for &(channel, step) in &steps {
                self.tree
                    .nudge(&mut self.backend, &mut tracer, unit, channel, step);
            }
        }
        self.steps = steps;

        match outcome {
            Advance::Continue => {}
            Advance::NextAct(act) => {
                self.trace_binding(id, unit, BindingTransition::ActAdvanced(act));
            }
            Advance::Finished => {
                self.trace_binding(id, unit, BindingTransition::Finished);
                self.stop_binding(id, true);
            }
        }
    }

    // --- events ---

    /// Sets the callback that receives every delivered event.
    pub fn events_callback_set(&mut self, callback: impl FnMut(&Event) + 'static) {
        self.input.set_global(Box::new(callback));
    }

    /// Registers interest in `name` events for `target`, optionally with a
    /// callback of its own.
    ///
    /// Keyboard events are global: registering them on any live unit lands
    /// on the [`UnitId::ROOT`] pair, which is the target every key event
    /// reports. `press`, `text_change` and `time_update` register only on
    /// button, entry and video units respectively;
    /// `animation_stopped` only on bindings. Registering an existing pair
    /// replaces its callback.
    pub fn event_register(
        &mut self,
        target: EventTarget,
        name: EventName,
        callback: Option<Callback>,
    ) -> bool {
        match target {
            EventTarget::Binding(id) => {
                let Some(binding) = self.bindings.get_mut(id.0) else {
                    log::debug!("event_register: no binding {id:?}");
                    return false;
                };
                if name != EventName::AnimationStopped {
                    log::debug!("event_register: bindings only emit animation_stopped");
                    return false;
                }
                binding.stop_armed = true;
                self.input.register(target, name, callback);
                true
            }
            EventTarget::Unit(id) => {
                let Some(listen) = self.listen_target(id, name) else {
                    log::debug!("event_register: {id:?} cannot emit {name}");
                    return false;
                };
                if self.input.register(global_keys(target, name), name, callback) {
                    self.backend.listen(listen, name, true);
                }
                true
            }
        }
    }

    /// Drops a registration. Unknown pairs are ignored.
    pub fn event_unregister(&mut self, target: EventTarget, name: EventName) -> bool {
        if let EventTarget::Unit(id) = target
            && !self.tree.contains(id)
        {
            return false;
        }
        if !self.input.unregister(global_keys(target, name), name) {
            return false;
        }
        match target {
            EventTarget::Binding(id) => {
                if let Some(binding) = self.bindings.get_mut(id.0) {
                    binding.stop_armed = false;
                }
            }
            EventTarget::Unit(id) => {
                if let Some(listen) = self.listen_target(id, name) {
                    self.backend.listen(listen, name, false);
                }
            }
        }
        true
    }

    fn listen_target(&self, id: UnitId, name: EventName) -> Option<ListenTarget> {
        let unit = self.tree.get(id)?;
        let accepted = match name {
            EventName::KeyDown | EventName::KeyUp => true,
            EventName::Press => unit.kind() == UnitKind::Button,
            EventName::TextChange => unit.kind() == UnitKind::Entry,
            EventName::TimeUpdate => unit.kind() == UnitKind::Video,
            EventName::AnimationStopped => false,
            _ => name.is_pointer(),
        };
        if !accepted {
            None
        } else if name.is_key() {
            Some(ListenTarget::Global)
        } else {
            Some(ListenTarget::Unit {
                unit: id,
                node: unit.node(),
            })
        }
    }

    /// Translates a raw host event and delivers it if its pair is
    /// registered. Returns whether it was delivered.
    pub fn dispatch(&mut self, raw: RawEvent) -> bool {
        let Some(event) = self.translate(raw) else {
            return false;
        };
        let delivered = self.input.deliver(&event);
        Tracer::from_slot(&mut self.trace).dispatch(&DispatchEvent {
            target: event.target,
            name: event.name,
            delivered,
        });
        delivered
    }

    fn translate(&mut self, raw: RawEvent) -> Option<Event> {
        let event = match raw {
            RawEvent::Pointer {
                unit,
                kind,
                position,
            } => {
                let (x, y) = self.tree.pointer_frame(unit)?.translate(position);
                Event {
                    target: EventTarget::Unit(unit),
                    name: kind.event_name(),
                    data: EventData::Pointer {
                        pointer_id: 0,
                        x,
                        y,
                    },
                }
            }
            RawEvent::Key {
                kind,
                code,
                ctrl,
                shift,
                alt,
                meta,
            } => Event {
                target: EventTarget::Unit(UnitId::ROOT),
                name: kind.event_name(),
                data: EventData::Key {
                    code,
                    modifiers: Modifiers::from_host(ctrl, shift, alt, meta),
                },
            },
            RawEvent::Press { unit } => Event {
                target: EventTarget::Unit(unit),
                name: EventName::Press,
                data: EventData::None,
            },
            RawEvent::TextChange { unit, text } => Event {
                target: EventTarget::Unit(unit),
                name: EventName::TextChange,
                data: EventData::Text(text),
            },
            RawEvent::TimeUpdate { unit, position_ms } => Event {
                target: EventTarget::Unit(unit),
                name: EventName::TimeUpdate,
                data: EventData::Position(position_ms),
            },
        };
        Some(event)
    }
}

/// Key events always report against the root, so their registrations live there.
fn global_keys(target: EventTarget, name: EventName) -> EventTarget {
    match target {
        EventTarget::Unit(_) if name.is_key() => EventTarget::Unit(UnitId::ROOT),
        _ => target,
    }
}
