// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene units: kinds, construction inputs and per-unit state.

use std::collections::BTreeMap;

use crate::id::{NodeId, UnitId};
use crate::value::{Channel, ChannelSet, GeometryValue, ValueSpec};

/// The fixed set of unit kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UnitKind {
    /// A container with an optional background fill.
    Frame,
    /// A bitmap.
    Image,
    /// Auto-fitted monospace text.
    Text,
    /// A single-line text input.
    Entry,
    /// A push button.
    Button,
    /// A media player.
    Video,
}

impl UnitKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Frame,
        Self::Image,
        Self::Text,
        Self::Entry,
        Self::Button,
        Self::Video,
    ];

    /// The lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Frame => "frame",
            Self::Image => "image",
            Self::Text => "text",
            Self::Entry => "entry",
            Self::Button => "button",
            Self::Video => "video",
        }
    }
}

/// Kind-specific construction payload.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum UnitContent {
    /// A container.
    Frame {
        /// CSS-style background color.
        #[cfg_attr(feature = "serde", serde(default))]
        color: Option<String>,
    },
    /// A bitmap.
    Image {
        /// Source URL.
        #[cfg_attr(feature = "serde", serde(default))]
        source: Option<String>,
    },
    /// Text content, refitted on every resize.
    Text {
        /// The string to show.
        #[cfg_attr(feature = "serde", serde(default))]
        content: String,
        /// CSS-style text color.
        #[cfg_attr(feature = "serde", serde(default))]
        color: Option<String>,
    },
    /// A text input.
    Entry {
        /// Placeholder shown while empty.
        #[cfg_attr(feature = "serde", serde(default))]
        placeholder: Option<String>,
        /// Visible width in characters.
        #[cfg_attr(feature = "serde", serde(default))]
        size: Option<u32>,
    },
    /// A push button.
    Button {
        /// Button label.
        #[cfg_attr(feature = "serde", serde(default))]
        label: String,
    },
    /// A media player.
    Video {
        /// Media URL.
        #[cfg_attr(feature = "serde", serde(default))]
        source: Option<String>,
    },
}

impl UnitContent {
    /// An empty frame.
    #[must_use]
    pub const fn frame() -> Self {
        Self::Frame { color: None }
    }

    /// Text content with the default color.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            color: None,
        }
    }

    /// Returns the tag of this payload.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        match self {
            Self::Frame { .. } => UnitKind::Frame,
            Self::Image { .. } => UnitKind::Image,
            Self::Text { .. } => UnitKind::Text,
            Self::Entry { .. } => UnitKind::Entry,
            Self::Button { .. } => UnitKind::Button,
            Self::Video { .. } => UnitKind::Video,
        }
    }
}

/// Everything needed to create a unit: its content and any channel
/// declarations. Undeclared channels take their defaults.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitProperties {
    /// Kind-specific payload.
    pub content: UnitContent,
    /// Per-channel declarations.
    #[cfg_attr(feature = "serde", serde(default))]
    pub geometry: BTreeMap<Channel, ValueSpec>,
}

impl UnitProperties {
    /// Creates properties with no channel declarations.
    #[must_use]
    pub fn new(content: UnitContent) -> Self {
        Self {
            content,
            geometry: BTreeMap::new(),
        }
    }

    /// Declares one channel.
    #[must_use]
    pub fn with(mut self, channel: Channel, spec: impl Into<ValueSpec>) -> Self {
        self.geometry.insert(channel, spec.into());
        self
    }
}

/// A live node in the scene tree.
#[derive(Clone, Debug)]
pub struct SceneUnit {
    pub(crate) content: UnitContent,
    pub(crate) channels: ChannelSet,
    pub(crate) children: Vec<UnitId>,
    pub(crate) parent: Option<UnitId>,
    pub(crate) node: NodeId,
}

impl SceneUnit {
    pub(crate) fn new(properties: UnitProperties, node: NodeId) -> Self {
        let mut channels = ChannelSet::default();
        for (channel, spec) in &properties.geometry {
            channels.set(GeometryValue::from_spec(*channel, spec));
        }
        Self {
            content: properties.content,
            channels,
            children: Vec::new(),
            parent: None,
            node,
        }
    }

    /// The unit kind.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.content.kind()
    }

    /// The construction payload.
    #[must_use]
    pub const fn content(&self) -> &UnitContent {
        &self.content
    }

    /// The current value of `channel`.
    #[must_use]
    pub fn value(&self, channel: Channel) -> &GeometryValue {
        self.channels.get(channel)
    }

    /// Children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[UnitId] {
        &self.children
    }

    /// The parent, if attached.
    #[must_use]
    pub const fn parent(&self) -> Option<UnitId> {
        self.parent
    }

    /// The back end node this unit renders into.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Character count used by text fitting, zero for non-text units.
    pub(crate) fn text_len(&self) -> usize {
        match &self.content {
            UnitContent::Text { content, .. } => content.chars().count(),
            _ => 0,
        }
    }
}
