// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host capabilities, probed once per scene.

use std::collections::BTreeSet;

use crate::backend::{Backend, StyleProperty, StyleValue, TransformProperty};
use crate::unit::UnitKind;
use crate::value::Channel;

/// The glyph measured to derive the monospace width weight.
pub const REFERENCE_GLYPH: char = 'X';

/// What the host can render, resolved when the scene is created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Capabilities {
    /// Whether opacity writes are honored.
    pub opacity: bool,
    /// The property name rotations are written under, if any works.
    pub rotation: Option<TransformProperty>,
    /// Glyph advance per pixel of font size, if the host could measure it.
    pub glyph_weight: Option<f64>,
}

impl Capabilities {
    /// Probes `backend`.
    ///
    /// Unsupported features are logged at `warn` and degrade to no-ops.
    pub fn probe<B: Backend + ?Sized>(backend: &mut B, reference_font_size: f64) -> Self {
        let opacity = backend.probe_style(StyleProperty::Opacity, StyleValue::Number(0.5));
        if !opacity {
            log::warn!("host ignores opacity; opacity channel writes disabled");
        }

        let rotation = TransformProperty::CANDIDATES.into_iter().find(|&candidate| {
            backend.probe_style(
                StyleProperty::Transform(candidate),
                StyleValue::RotateDegrees(0.0),
            )
        });
        if rotation.is_none() {
            log::warn!("host has no transform property; rotation channel writes disabled");
        }

        let glyph_weight = backend
            .measure_glyph(REFERENCE_GLYPH, reference_font_size)
            .filter(|px| px.is_finite() && *px > 0.0)
            .map(|px| px / reference_font_size)
            .filter(|w| w.is_finite() && *w > 0.0);
        if glyph_weight.is_none() {
            log::warn!("glyph measurement failed; text fits to height only");
        }

        Self {
            opacity,
            rotation,
            glyph_weight,
        }
    }

    /// Builds the externally visible report.
    #[must_use]
    pub fn report(&self) -> CapabilityReport {
        CapabilityReport {
            opacity_supported: self.opacity,
            rotation_supported: self.rotation.is_some(),
            unit_kinds: UnitKind::ALL.into_iter().collect(),
            value_channels: Channel::ALL.into_iter().collect(),
        }
    }
}

/// Capability summary returned by [`Scene::capabilities`](crate::scene::Scene::capabilities).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CapabilityReport {
    /// Whether opacity is rendered.
    pub opacity_supported: bool,
    /// Whether rotation is rendered.
    pub rotation_supported: bool,
    /// Unit kinds the scene can create.
    pub unit_kinds: BTreeSet<UnitKind>,
    /// Channels a unit exposes.
    pub value_channels: BTreeSet<Channel>,
}
