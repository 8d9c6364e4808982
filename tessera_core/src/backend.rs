// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for render back ends.
//!
//! Tessera keeps every piece of platform work behind the [`Backend`] trait.
//! A back end owns the native presentation tree (DOM elements, an in-memory
//! tree for tests), the animation timer and the raw input listeners:
//!
//! - **Nodes**: created per unit kind, parented, styled and released on
//!   request. The core never looks inside a node; it only stores the
//!   [`NodeId`] a back end hands out.
//!
//! - **Probes**: [`probe_style`](Backend::probe_style) and
//!   [`measure_glyph`](Backend::measure_glyph) are called once from
//!   [`Scene::new`](crate::scene::Scene::new) to build
//!   [`Capabilities`](crate::caps::Capabilities).
//!
//! - **Timer**: [`request_tick`](Backend::request_tick) arms a single
//!   one-shot timer. When it fires, the host calls
//!   [`Scene::tick`](crate::scene::Scene::tick) with the current time.
//!
//! - **Input**: [`listen`](Backend::listen) installs or removes raw
//!   listeners. Raw events reach the scene through
//!   [`Scene::dispatch`](crate::scene::Scene::dispatch).
//!
//! # Crate boundaries
//!
//! `tessera_core` owns the scene model, resolution, scheduling and this
//! contract. Back end crates depend on `tessera_core` and provide the
//! platform glue; [`HeadlessBackend`](crate::headless::HeadlessBackend) is
//! the in-tree implementation used by tests.

use core::fmt;

use kurbo::Size;

use crate::id::{NodeId, UnitId};
use crate::input::EventName;
use crate::time::Duration;
use crate::unit::{UnitContent, UnitKind};

/// Style-property names under which a rotation may be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransformProperty {
    /// `transform`
    Standard,
    /// `-webkit-transform`
    Webkit,
    /// `-moz-transform`
    Moz,
    /// `-ms-transform`
    Ms,
    /// `-o-transform`
    O,
}

impl TransformProperty {
    /// Probe order, standard name first.
    pub const CANDIDATES: [Self; 5] = [Self::Standard, Self::Webkit, Self::Moz, Self::Ms, Self::O];

    /// The CSS property name.
    #[must_use]
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::Standard => "transform",
            Self::Webkit => "-webkit-transform",
            Self::Moz => "-moz-transform",
            Self::Ms => "-ms-transform",
            Self::O => "-o-transform",
        }
    }
}

/// A style property the core writes on a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    /// Node width.
    Width,
    /// Node height.
    Height,
    /// Left edge, in viewport coordinates.
    Left,
    /// Top edge, in viewport coordinates.
    Top,
    /// Stacking order.
    ZIndex,
    /// Alpha.
    Opacity,
    /// A rotation, under the given property name.
    Transform(TransformProperty),
    /// Text size.
    FontSize,
    /// Text line height.
    LineHeight,
}

impl StyleProperty {
    /// The CSS property name.
    #[must_use]
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::Width => "width",
            Self::Height => "height",
            Self::Left => "left",
            Self::Top => "top",
            Self::ZIndex => "z-index",
            Self::Opacity => "opacity",
            Self::Transform(t) => t.css_name(),
            Self::FontSize => "font-size",
            Self::LineHeight => "line-height",
        }
    }
}

/// A value written to a [`StyleProperty`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StyleValue {
    /// A pixel length.
    Pixels(f64),
    /// A bare number (opacity).
    Number(f64),
    /// An integer (z-index).
    Integer(i64),
    /// A clockwise rotation in degrees.
    RotateDegrees(f64),
    /// Clears the property back to the host default.
    Unset,
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pixels(px) => write!(f, "{px}px"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::RotateDegrees(deg) => write!(f, "rotate({deg}deg)"),
            Self::Unset => f.write_str("unset"),
        }
    }
}

/// A kind-specific command passed through to a node.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlCommand {
    /// Entry: read the current text.
    GetValue,
    /// Entry: replace the current text.
    SetValue(String),
    /// Entry: replace the placeholder.
    SetPlaceholder(String),
    /// Button: replace the label.
    SetLabel(String),
    /// Video: load a new source.
    Load(String),
    /// Video: start playback.
    Play,
    /// Video: pause playback.
    Pause,
    /// Video: seek, in milliseconds.
    SetPosition(f64),
    /// Video: read the playback position in milliseconds.
    GetPosition,
    /// Video: read the media duration in milliseconds.
    GetDuration,
    /// Video: read the volume, 0 to 100.
    GetVolume,
    /// Video: set the volume, 0 to 100.
    SetVolume(f64),
}

impl ControlCommand {
    /// The unit kind this command applies to.
    #[must_use]
    pub const fn target_kind(&self) -> UnitKind {
        match self {
            Self::GetValue | Self::SetValue(_) | Self::SetPlaceholder(_) => UnitKind::Entry,
            Self::SetLabel(_) => UnitKind::Button,
            Self::Load(_)
            | Self::Play
            | Self::Pause
            | Self::SetPosition(_)
            | Self::GetPosition
            | Self::GetDuration
            | Self::GetVolume
            | Self::SetVolume(_) => UnitKind::Video,
        }
    }
}

/// The result of a [`ControlCommand`].
#[derive(Clone, Debug, PartialEq)]
pub enum ControlReply {
    /// The command had no result.
    Done,
    /// A text result.
    Text(String),
    /// A numeric result.
    Number(f64),
}

/// Where a raw listener is installed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenTarget {
    /// A unit's node. Raw events from it carry `unit`.
    Unit {
        /// The unit reported in raw events.
        unit: UnitId,
        /// The node to listen on.
        node: NodeId,
    },
    /// The whole document (keyboard input).
    Global,
}

/// Platform services used by a [`Scene`](crate::scene::Scene).
///
/// Every method is infallible from the core's point of view: a back end that
/// cannot honor a request does nothing. The only fatal conditions are a
/// missing root node or viewport at construction time.
pub trait Backend {
    /// Returns the node that hosts the root unit, or `None` if the host is
    /// unavailable.
    fn root_node(&mut self) -> Option<NodeId>;

    /// Returns the current viewport size in pixels.
    fn viewport(&self) -> Option<Size>;

    /// Creates a detached node for `content`.
    fn create_node(&mut self, content: &UnitContent) -> NodeId;

    /// Destroys a node created by [`create_node`](Self::create_node).
    fn release_node(&mut self, node: NodeId);

    /// Appends `child` as the last child of `parent`.
    fn append_child(&mut self, parent: NodeId, child: NodeId);

    /// Removes `child` from `parent`.
    fn remove_child(&mut self, parent: NodeId, child: NodeId);

    /// Writes one style property. [`StyleValue::Unset`] removes it.
    fn set_style(&mut self, node: NodeId, property: StyleProperty, value: StyleValue);

    /// Writes `value` to `property` on a scratch node and reports whether the
    /// host kept it.
    fn probe_style(&mut self, property: StyleProperty, value: StyleValue) -> bool;

    /// Measures the advance width of `glyph` in the monospace face at
    /// `font_size` pixels.
    fn measure_glyph(&mut self, glyph: char, font_size: f64) -> Option<f64>;

    /// Runs a kind-specific command on `node`.
    fn control(&mut self, node: NodeId, command: &ControlCommand) -> ControlReply;

    /// Installs (`enabled`) or removes a raw listener.
    fn listen(&mut self, target: ListenTarget, event: EventName, enabled: bool);

    /// Arms the animation timer to fire once after `after`.
    fn request_tick(&mut self, after: Duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_values_format_as_css() {
        assert_eq!(StyleValue::Pixels(500.0).to_string(), "500px");
        assert_eq!(StyleValue::Number(0.5).to_string(), "0.5");
        assert_eq!(StyleValue::Integer(-2).to_string(), "-2");
        assert_eq!(StyleValue::RotateDegrees(45.0).to_string(), "rotate(45deg)");
        assert_eq!(StyleValue::Unset.to_string(), "unset");
    }

    #[test]
    fn commands_know_their_kind() {
        assert_eq!(ControlCommand::GetValue.target_kind(), UnitKind::Entry);
        assert_eq!(
            ControlCommand::SetLabel("ok".into()).target_kind(),
            UnitKind::Button
        );
        assert_eq!(ControlCommand::SetVolume(3.0).target_kind(), UnitKind::Video);
    }

    #[test]
    fn transform_candidates_start_with_standard() {
        assert_eq!(
            StyleProperty::Transform(TransformProperty::CANDIDATES[0]).css_name(),
            "transform"
        );
        assert_eq!(StyleProperty::ZIndex.css_name(), "z-index");
    }
}
