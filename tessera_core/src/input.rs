// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input translation and event dispatch.
//!
//! Back ends report [`RawEvent`]s in host coordinates. The scene turns them
//! into [`Event`]s with a fixed vocabulary ([`EventName`]): pointer positions
//! become relative to the unit's resolved origin (and are rescaled into
//! percent space when the unit's size is percent-declared), key events are
//! reported against the root unit with a [`Modifiers`] set.
//!
//! [`InputTranslator`] holds the registrations. An event is delivered only
//! for a registered `(target, name)` pair: first to the pair's own callback,
//! if it has one, then to the global callback.

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

use kurbo::{Point, Size};

use crate::id::{BindingId, UnitId};

/// The event vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EventName {
    /// The pointer entered a unit.
    PointerIn,
    /// The pointer left a unit.
    PointerOut,
    /// A pointer button went down over a unit.
    PointerDown,
    /// A pointer button went up over a unit.
    PointerUp,
    /// The pointer moved over a unit.
    PointerMotion,
    /// A key went down.
    KeyDown,
    /// A key went up.
    KeyUp,
    /// A button unit was pressed.
    Press,
    /// An entry unit's text was committed.
    TextChange,
    /// A video unit's playback position moved.
    TimeUpdate,
    /// A binding stopped.
    AnimationStopped,
}

impl EventName {
    /// Every event name, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::PointerIn,
        Self::PointerOut,
        Self::PointerDown,
        Self::PointerUp,
        Self::PointerMotion,
        Self::KeyDown,
        Self::KeyUp,
        Self::Press,
        Self::TextChange,
        Self::TimeUpdate,
        Self::AnimationStopped,
    ];

    /// The canonical lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PointerIn => "pointer_in",
            Self::PointerOut => "pointer_out",
            Self::PointerDown => "pointer_down",
            Self::PointerUp => "pointer_up",
            Self::PointerMotion => "pointer_motion",
            Self::KeyDown => "key_down",
            Self::KeyUp => "key_up",
            Self::Press => "press",
            Self::TextChange => "text_change",
            Self::TimeUpdate => "time_update",
            Self::AnimationStopped => "animation_stopped",
        }
    }

    /// Whether this is one of the pointer events.
    #[must_use]
    pub const fn is_pointer(self) -> bool {
        matches!(
            self,
            Self::PointerIn
                | Self::PointerOut
                | Self::PointerDown
                | Self::PointerUp
                | Self::PointerMotion
        )
    }

    /// Whether this is one of the keyboard events.
    #[must_use]
    pub const fn is_key(self) -> bool {
        matches!(self, Self::KeyDown | Self::KeyUp)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        Ok(match s {
            "pointer_in" => Self::PointerIn,
            "pointer_out" => Self::PointerOut,
            "pointer_down" => Self::PointerDown,
            "pointer_up" => Self::PointerUp,
            "pointer_motion" => Self::PointerMotion,
            "key_down" => Self::KeyDown,
            "key_up" => Self::KeyUp,
            "press" => Self::Press,
            "text_change" => Self::TextChange,
            "time_update" => Self::TimeUpdate,
            "animation_stopped" => Self::AnimationStopped,
            _ => return Err(()),
        })
    }
}

bitflags::bitflags! {
    /// Pressed keyboard modifiers. Only pressed modifiers are set.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Control.
        const CTRL = 0b001;
        /// Shift.
        const SHIFT = 0b010;
        /// Alt. The host's meta key is reported here as well.
        const ALT = 0b100;
    }
}

impl Modifiers {
    /// Builds the set from host modifier flags.
    #[must_use]
    pub fn from_host(ctrl: bool, shift: bool, alt: bool, meta: bool) -> Self {
        let mut mods = Self::empty();
        mods.set(Self::CTRL, ctrl);
        mods.set(Self::SHIFT, shift);
        mods.set(Self::ALT, alt || meta);
        mods
    }
}

/// Raw pointer transitions reported by a back end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// `mouseover`
    Enter,
    /// `mouseout`
    Leave,
    /// `mousedown`
    Down,
    /// `mouseup`
    Up,
    /// `mousemove`
    Move,
}

impl PointerKind {
    /// The translated event name.
    #[must_use]
    pub const fn event_name(self) -> EventName {
        match self {
            Self::Enter => EventName::PointerIn,
            Self::Leave => EventName::PointerOut,
            Self::Down => EventName::PointerDown,
            Self::Up => EventName::PointerUp,
            Self::Move => EventName::PointerMotion,
        }
    }
}

/// Raw key transitions reported by a back end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// `keydown`
    Down,
    /// `keyup`
    Up,
}

impl KeyKind {
    /// The translated event name.
    #[must_use]
    pub const fn event_name(self) -> EventName {
        match self {
            Self::Down => EventName::KeyDown,
            Self::Up => EventName::KeyUp,
        }
    }
}

/// An untranslated event from the host.
#[derive(Clone, Debug, PartialEq)]
pub enum RawEvent {
    /// A pointer event over `unit`, at host coordinates.
    Pointer {
        /// The unit the listener was installed for.
        unit: UnitId,
        /// Transition.
        kind: PointerKind,
        /// Position in viewport pixels.
        position: Point,
    },
    /// A keyboard event.
    Key {
        /// Transition.
        kind: KeyKind,
        /// Host key code.
        code: u32,
        /// Control held.
        ctrl: bool,
        /// Shift held.
        shift: bool,
        /// Alt held.
        alt: bool,
        /// Meta held.
        meta: bool,
    },
    /// A button unit was pressed.
    Press {
        /// The button.
        unit: UnitId,
    },
    /// An entry unit's text was committed.
    TextChange {
        /// The entry.
        unit: UnitId,
        /// The new text.
        text: String,
    },
    /// A video unit's playback position moved.
    TimeUpdate {
        /// The video.
        unit: UnitId,
        /// Position in milliseconds.
        position_ms: f64,
    },
}

/// What an event is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventTarget {
    /// A unit. Keyboard events target [`UnitId::ROOT`].
    Unit(UnitId),
    /// An animation binding.
    Binding(BindingId),
}

impl EventTarget {
    /// The raw handle value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        match self {
            Self::Unit(id) => id.0,
            Self::Binding(id) => id.0,
        }
    }
}

/// Event payload.
#[derive(Clone, Debug, PartialEq)]
pub enum EventData {
    /// Pointer position relative to the unit.
    Pointer {
        /// Always 0.
        pointer_id: u32,
        /// Horizontal offset, in pixels or percent of the unit width.
        x: f64,
        /// Vertical offset, in pixels or percent of the unit height.
        y: f64,
    },
    /// A key and the modifiers held with it.
    Key {
        /// Host key code.
        code: u32,
        /// Pressed modifiers.
        modifiers: Modifiers,
    },
    /// Entry text.
    Text(String),
    /// Playback position in milliseconds.
    Position(f64),
    /// No payload.
    None,
}

/// A translated event.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// What the event is about.
    pub target: EventTarget,
    /// What happened.
    pub name: EventName,
    /// Payload.
    pub data: EventData,
}

/// A boxed event callback.
pub type Callback = Box<dyn FnMut(&Event)>;

/// A unit's applied box, as needed to translate pointer positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerFrame {
    /// Resolved top-left corner in viewport pixels.
    pub origin: Point,
    /// Resolved size in pixels.
    pub size: Size,
    /// Whether the width channel is percent-declared.
    pub percent_x: bool,
    /// Whether the height channel is percent-declared.
    pub percent_y: bool,
}

impl PointerFrame {
    /// Maps a host position into this frame's coordinate space.
    ///
    /// A percent axis of zero size maps to 0.
    #[must_use]
    pub fn translate(&self, position: Point) -> (f64, f64) {
        let x = position.x - self.origin.x;
        let y = position.y - self.origin.y;
        (
            rescale(x, self.size.width, self.percent_x),
            rescale(y, self.size.height, self.percent_y),
        )
    }
}

fn rescale(offset: f64, extent: f64, percent: bool) -> f64 {
    if !percent {
        offset
    } else if extent == 0.0 {
        0.0
    } else {
        100.0 / extent * offset
    }
}

/// Event registrations and the global callback.
#[derive(Default)]
pub struct InputTranslator {
    global: Option<Callback>,
    registry: BTreeMap<(EventTarget, EventName), Option<Callback>>,
}

impl fmt::Debug for InputTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputTranslator")
            .field("global", &self.global.is_some())
            .field("registered", &self.registry.len())
            .finish()
    }
}

impl InputTranslator {
    /// Creates a translator with no registrations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the global callback.
    pub fn set_global(&mut self, callback: Callback) {
        self.global = Some(callback);
    }

    /// Registers a pair, replacing any previous callback for it.
    ///
    /// Returns `true` if the pair was not registered before.
    pub fn register(
        &mut self,
        target: EventTarget,
        name: EventName,
        callback: Option<Callback>,
    ) -> bool {
        self.registry.insert((target, name), callback).is_none()
    }

    /// Removes a pair. Returns `false` if it was never registered.
    pub fn unregister(&mut self, target: EventTarget, name: EventName) -> bool {
        self.registry.remove(&(target, name)).is_some()
    }

    /// Whether the pair is registered.
    #[must_use]
    pub fn is_registered(&self, target: EventTarget, name: EventName) -> bool {
        self.registry.contains_key(&(target, name))
    }

    /// Drops every registration for `target`, returning the names removed.
    pub fn remove_target(&mut self, target: EventTarget) -> Vec<EventName> {
        let names: Vec<_> = self
            .registry
            .range((target, EventName::PointerIn)..=(target, EventName::AnimationStopped))
            .map(|((_, name), _)| *name)
            .collect();
        for name in &names {
            self.registry.remove(&(target, *name));
        }
        names
    }

    /// Delivers `event` if its pair is registered.
    ///
    /// The pair's own callback runs first, then the global one. Returns
    /// whether the event was delivered.
    pub fn deliver(&mut self, event: &Event) -> bool {
        let Some(own) = self.registry.get_mut(&(event.target, event.name)) else {
            return false;
        };
        if let Some(callback) = own {
            callback(event);
        }
        if let Some(global) = &mut self.global {
            global(event);
        }
        true
    }
}
