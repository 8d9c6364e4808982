// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The unit tree and geometry resolution.
//!
//! [`UnitTree`] owns every live [`SceneUnit`] in a [`SlotPool`], with the
//! root at slot 0. Geometry is resolved lazily and memoized per value:
//!
//! - pixel values resolve to their own magnitude,
//! - percent `width`/`height` take a share of the parent's resolved size,
//! - percent `x`/`y` offset from the parent's resolved origin by a share of
//!   the parent's size along the same axis,
//! - units without a parent size against the viewport and sit at 0.
//!
//! Every write goes straight to the back end. After writing a geometric
//! channel, [`UnitTree::propagate`] re-applies the dependent channels of
//! every child, forcing fresh resolutions all the way down. There is no
//! dependency graph; trees are shallow and writes are rare compared to idle
//! time.

use kurbo::{Point, Rect, Size};

use crate::backend::{Backend, StyleProperty, StyleValue};
use crate::caps::Capabilities;
use crate::id::{NodeId, UnitId};
use crate::input::PointerFrame;
use crate::pool::SlotPool;
use crate::text::fit_font_size;
use crate::trace::Tracer;
use crate::unit::{SceneUnit, UnitKind};
use crate::value::{Channel, ChannelGroup, GeometryValue};

/// A unit's box, either as declared or resolved to pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UnitGeometry {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl UnitGeometry {
    /// The box as a rectangle.
    #[must_use]
    pub fn to_rect(&self) -> Rect {
        Rect::from_origin_size((self.x, self.y), (self.width, self.height))
    }
}

/// All live units, with the root at [`UnitId::ROOT`].
#[derive(Debug)]
pub struct UnitTree {
    units: SlotPool<SceneUnit>,
    viewport: Size,
    caps: Capabilities,
}

impl UnitTree {
    /// Creates a tree whose root is `root`.
    pub(crate) fn new(root: SceneUnit, viewport: Size, caps: Capabilities) -> Self {
        let mut units = SlotPool::new();
        let root_slot = units.allocate(root);
        debug_assert_eq!(root_slot, UnitId::ROOT.0, "root must occupy slot 0");
        Self {
            units,
            viewport,
            caps,
        }
    }

    /// Returns the unit behind `id`, if live.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&SceneUnit> {
        self.units.get(id.0)
    }

    /// Whether `id` is live.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains(id.0)
    }

    /// Number of live units, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Always `false`; the root is never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Live units in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &SceneUnit)> {
        self.units.iter().map(|(id, unit)| (UnitId(id), unit))
    }

    /// The current viewport size.
    #[must_use]
    pub const fn viewport(&self) -> Size {
        self.viewport
    }

    /// The capabilities geometry is applied with.
    #[must_use]
    pub const fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub(crate) fn insert(&mut self, unit: SceneUnit) -> UnitId {
        UnitId(self.units.allocate(unit))
    }

    /// Returns `true` if `ancestor` is a strict ancestor of `id`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: UnitId, id: UnitId) -> bool {
        let mut cursor = self.get(id).and_then(SceneUnit::parent);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.get(current).and_then(SceneUnit::parent);
        }
        false
    }

    // --- resolution ---

    /// Resolves `channel` of `id` to pixels.
    ///
    /// Returns the memoized value unless `force` is set or nothing is
    /// memoized yet. Parents are read through their memoized values.
    /// Channel-local values (z-order, opacity, rotation) return their
    /// magnitude unchanged.
    pub fn resolve(&mut self, id: UnitId, channel: Channel, force: bool) -> Option<f64> {
        let unit = self.units.get(id.0)?;
        let value = unit.value(channel);
        if channel.group() == ChannelGroup::Local || value.is_pixel() {
            return Some(value.magnitude);
        }
        if !force && let Some(px) = value.cached() {
            return Some(px);
        }

        let magnitude = value.magnitude;
        let parent = unit.parent();
        let px = match (channel.axis_size(), parent) {
            (None, Some(parent)) => {
                self.resolve(parent, channel, false).unwrap_or(0.0) * magnitude / 100.0
            }
            (None, None) => self.viewport_extent(channel) * magnitude / 100.0,
            (Some(size), Some(parent)) => {
                let origin = self.resolve(parent, channel, false).unwrap_or(0.0);
                let extent = self.resolve(parent, size, false).unwrap_or(0.0);
                origin + extent * magnitude / 100.0
            }
            (Some(_), None) => 0.0,
        };

        if let Some(unit) = self.units.get_mut(id.0) {
            unit.channels.get_mut(channel).store(px);
        }
        Some(px)
    }

    fn viewport_extent(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Height => self.viewport.height,
            _ => self.viewport.width,
        }
    }

    /// Reads the box of `id`, resolved to pixels or as declared.
    pub fn geometry(&mut self, id: UnitId, in_pixels: bool) -> Option<UnitGeometry> {
        Some(UnitGeometry {
            x: self.channel_value(id, Channel::X, in_pixels)?,
            y: self.channel_value(id, Channel::Y, in_pixels)?,
            width: self.channel_value(id, Channel::Width, in_pixels)?,
            height: self.channel_value(id, Channel::Height, in_pixels)?,
        })
    }

    fn channel_value(&mut self, id: UnitId, channel: Channel, in_pixels: bool) -> Option<f64> {
        if in_pixels {
            self.resolve(id, channel, false)
        } else {
            Some(self.get(id)?.value(channel).magnitude)
        }
    }

    /// The applied box of `id` for pointer translation.
    pub(crate) fn pointer_frame(&mut self, id: UnitId) -> Option<PointerFrame> {
        let x = self.resolve(id, Channel::X, false)?.round();
        let y = self.resolve(id, Channel::Y, false)?.round();
        let width = self.resolve(id, Channel::Width, false)?.round().abs();
        let height = self.resolve(id, Channel::Height, false)?.round().abs();
        let unit = self.get(id)?;
        Some(PointerFrame {
            origin: Point::new(x, y),
            size: Size::new(width, height),
            percent_x: !unit.value(Channel::Width).is_pixel(),
            percent_y: !unit.value(Channel::Height).is_pixel(),
        })
    }

    // --- application ---

    /// Writes `channel` of `id` to its node, then propagates to children.
    pub(crate) fn apply<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        tracer: &mut Tracer<'_>,
        id: UnitId,
        channel: Channel,
    ) {
        let Some(unit) = self.units.get(id.0) else {
            return;
        };
        let node = unit.node();
        let kind = unit.kind();
        let magnitude = unit.value(channel).magnitude;

        match channel {
            Channel::ZOrder => {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "z-order is a small integer; the cast saturates"
                )]
                let z = magnitude.round() as i64;
                write_style(backend, tracer, id, node, StyleProperty::ZIndex, StyleValue::Integer(z));
            }
            Channel::Opacity => {
                if self.caps.opacity {
                    let alpha = (1.0 - magnitude.abs() / 100.0).max(0.0);
                    write_style(backend, tracer, id, node, StyleProperty::Opacity, StyleValue::Number(alpha));
                }
            }
            Channel::Rotation => {
                if let Some(property) = self.caps.rotation {
                    // Any transform, even a zero rotation, makes the node the
                    // containing block of its fixed-position descendants.
                    let value = if magnitude == 0.0 {
                        StyleValue::Unset
                    } else {
                        StyleValue::RotateDegrees(magnitude)
                    };
                    write_style(
                        backend,
                        tracer,
                        id,
                        node,
                        StyleProperty::Transform(property),
                        value,
                    );
                }
            }
            Channel::Width | Channel::Height | Channel::X | Channel::Y => {
                let Some(px) = self.resolve(id, channel, true) else {
                    return;
                };
                let is_size = channel.group() == ChannelGroup::Size;
                let mut assembled = px.round();
                if is_size {
                    assembled = assembled.abs();
                }
                // `+ 0.0` turns -0 into 0.
                let value = StyleValue::Pixels(assembled + 0.0);
                write_style(backend, tracer, id, node, geometry_property(channel), value);

                if is_size && kind == UnitKind::Text {
                    self.fit_text(backend, tracer, id);
                }
                self.propagate(backend, tracer, id, channel);
            }
        }
    }

    /// Re-applies every child's channels that depend on `channel` of `id`.
    ///
    /// This is the only place invalidation travels down the tree.
    pub fn propagate<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        tracer: &mut Tracer<'_>,
        id: UnitId,
        channel: Channel,
    ) {
        let dependents = channel.dependents();
        if dependents.is_empty() {
            return;
        }
        let children = match self.get(id) {
            Some(unit) if !unit.children().is_empty() => unit.children().to_vec(),
            _ => return,
        };
        for child in children {
            for &dependent in dependents {
                self.apply(backend, tracer, child, dependent);
            }
        }
    }

    /// Applies all seven channels of `id`, sizes first.
    pub(crate) fn apply_all<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        tracer: &mut Tracer<'_>,
        id: UnitId,
    ) {
        for channel in Channel::ALL {
            self.apply(backend, tracer, id, channel);
        }
    }

    fn fit_text<B: Backend + ?Sized>(&mut self, backend: &mut B, tracer: &mut Tracer<'_>, id: UnitId) {
        let (Some(width), Some(height)) = (
            self.resolve(id, Channel::Width, false),
            self.resolve(id, Channel::Height, false),
        ) else {
            return;
        };
        let Some(unit) = self.get(id) else {
            return;
        };
        let node = unit.node();
        let width = width.round().abs();
        let height = height.round().abs();
        let font = fit_font_size(width, height, unit.text_len(), self.caps.glyph_weight);
        write_style(backend, tracer, id, node, StyleProperty::FontSize, StyleValue::Pixels(font));
        write_style(backend, tracer, id, node, StyleProperty::LineHeight, StyleValue::Pixels(height));
    }

    /// Replaces the declaration of one channel and applies it.
    ///
    /// The root's channels are bound to the viewport and cannot be replaced.
    pub(crate) fn set_value<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        tracer: &mut Tracer<'_>,
        id: UnitId,
        value: GeometryValue,
    ) -> bool {
        if id.is_root() {
            return false;
        }
        let channel = value.channel();
        let Some(unit) = self.units.get_mut(id.0) else {
            return false;
        };
        unit.channels.set(value);
        self.apply(backend, tracer, id, channel);
        true
    }

    /// Adds `step` to the magnitude of `channel` and applies it.
    pub(crate) fn nudge<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        tracer: &mut Tracer<'_>,
        id: UnitId,
        channel: Channel,
        step: f64,
    ) {
        let Some(unit) = self.units.get_mut(id.0) else {
            return;
        };
        unit.channels.get_mut(channel).magnitude += step;
        self.apply(backend, tracer, id, channel);
    }

    /// Changes the viewport and re-applies the root, which reaches every
    /// attached unit through propagation. Detached subtrees also size
    /// against the viewport, so they are re-applied too.
    pub(crate) fn set_viewport<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        tracer: &mut Tracer<'_>,
        viewport: Size,
    ) {
        self.viewport = viewport;
        let detached: Vec<UnitId> = self
            .iter()
            .filter(|(id, unit)| !id.is_root() && unit.parent().is_none())
            .map(|(id, _)| id)
            .collect();
        self.apply_all(backend, tracer, UnitId::ROOT);
        for id in detached {
            self.apply_all(backend, tracer, id);
        }
    }

    // --- structure ---

    /// Appends `child` to `parent` and applies the child's whole subtree.
    ///
    /// A child that already has a parent is moved. Rejects the root as a
    /// child, non-frame parents, and anything that would form a cycle.
    pub(crate) fn attach<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        tracer: &mut Tracer<'_>,
        parent: UnitId,
        child: UnitId,
    ) -> bool {
        if child.is_root() || parent == child || !self.contains(child) {
            return false;
        }
        let Some(parent_unit) = self.get(parent) else {
            return false;
        };
        if parent_unit.kind() != UnitKind::Frame || self.is_ancestor(child, parent) {
            return false;
        }
        let parent_node = parent_unit.node();

        self.detach(backend, child);

        let Some(child_unit) = self.units.get_mut(child.0) else {
            return false;
        };
        child_unit.parent = Some(parent);
        let child_node = child_unit.node();
        if let Some(parent_unit) = self.units.get_mut(parent.0) {
            parent_unit.children.push(child);
        }
        backend.append_child(parent_node, child_node);
        self.apply_all(backend, tracer, child);
        true
    }

    /// Unlinks `id` from its parent. The unit stays live.
    pub(crate) fn detach<B: Backend + ?Sized>(&mut self, backend: &mut B, id: UnitId) -> bool {
        let Some(unit) = self.units.get_mut(id.0) else {
            return false;
        };
        let Some(parent) = unit.parent.take() else {
            return false;
        };
        let node = unit.node();
        if let Some(parent_unit) = self.units.get_mut(parent.0) {
            if let Some(pos) = parent_unit.children.iter().rposition(|&c| c == id) {
                parent_unit.children.remove(pos);
            }
            backend.remove_child(parent_unit.node(), node);
        }
        self.invalidate_subtree(id);
        true
    }

    fn invalidate_subtree(&mut self, id: UnitId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(unit) = self.units.get_mut(current.0) else {
                continue;
            };
            for channel in Channel::ALL {
                unit.channels.get_mut(channel).invalidate();
            }
            stack.extend_from_slice(&unit.children);
        }
    }

    /// Detaches `id` and frees it with its whole subtree, children first.
    ///
    /// Returns the freed units so the caller can release their nodes. The
    /// root is never removed.
    pub(crate) fn remove_subtree<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        id: UnitId,
    ) -> Vec<(UnitId, SceneUnit)> {
        if id.is_root() || !self.contains(id) {
            return Vec::new();
        }
        self.detach(backend, id);
        let mut order = Vec::new();
        self.collect_post_order(id, &mut order);
        order
            .into_iter()
            .filter_map(|unit_id| self.units.free(unit_id.0).map(|unit| (unit_id, unit)))
            .collect()
    }

    fn collect_post_order(&self, id: UnitId, out: &mut Vec<UnitId>) {
        if let Some(unit) = self.get(id) {
            for &child in unit.children() {
                self.collect_post_order(child, out);
            }
            out.push(id);
        }
    }
}

fn geometry_property(channel: Channel) -> StyleProperty {
    match channel {
        Channel::Width => StyleProperty::Width,
        Channel::Height => StyleProperty::Height,
        Channel::Y => StyleProperty::Top,
        _ => StyleProperty::Left,
    }
}

fn write_style<B: Backend + ?Sized>(
    backend: &mut B,
    tracer: &mut Tracer<'_>,
    unit: UnitId,
    node: NodeId,
    property: StyleProperty,
    value: StyleValue,
) {
    backend.set_style(node, property, value);
    #[cfg(feature = "trace-rich")]
    tracer.style_write(&crate::trace::StyleWriteEvent {
        unit,
        node,
        property,
        value,
    });
    #[cfg(not(feature = "trace-rich"))]
    {
        _ = (tracer, unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessBackend;
    use crate::unit::{UnitContent, UnitProperties};
    use crate::value::ValueUnit;

    struct Fixture {
        backend: HeadlessBackend,
        tree: UnitTree,
    }

    impl Fixture {
        fn new(width: f64, height: f64) -> Self {
            Self::on(HeadlessBackend::new(width, height))
        }

        fn on(mut backend: HeadlessBackend) -> Self {
            let Size { width, height } = backend.viewport().unwrap();
            let caps = Capabilities::probe(&mut backend, 16.0);
            let root_node = backend.root_node().unwrap();
            let root = SceneUnit::new(UnitProperties::new(UnitContent::frame()), root_node);
            let mut tree = UnitTree::new(root, Size::new(width, height), caps);
            tree.apply_all(&mut backend, &mut Tracer::none(), UnitId::ROOT);
            Self { backend, tree }
        }

        fn create(&mut self, props: UnitProperties) -> UnitId {
            let node = self.backend.create_node(&props.content);
            let id = self.tree.insert(SceneUnit::new(props, node));
            self.tree.apply_all(&mut self.backend, &mut Tracer::none(), id);
            id
        }

        fn attach(&mut self, parent: UnitId, child: UnitId) -> bool {
            self.tree.attach(&mut self.backend, &mut Tracer::none(), parent, child)
        }

        fn style(&self, id: UnitId, property: StyleProperty) -> Option<StyleValue> {
            let node = self.tree.get(id)?.node();
            self.backend.style(node, property)
        }
    }

    fn frame() -> UnitProperties {
        UnitProperties::new(UnitContent::frame())
    }

    #[test]
    fn percent_width_resolves_against_parent() {
        let mut f = Fixture::new(1000.0, 800.0);
        let a = f.create(frame().with(Channel::Width, "50%"));
        assert!(f.attach(UnitId::ROOT, a));
        assert_eq!(f.tree.resolve(a, Channel::Width, false), Some(500.0));
        assert_eq!(f.style(a, StyleProperty::Width), Some(StyleValue::Pixels(500.0)));
    }

    #[test]
    fn reparenting_refreshes_descendants() {
        let mut f = Fixture::new(1000.0, 800.0);
        let child = f.create(frame().with(Channel::Width, "50%"));
        let grandchild = f.create(frame().with(Channel::Width, "50%"));
        f.attach(UnitId::ROOT, child);
        f.attach(child, grandchild);
        assert_eq!(f.tree.resolve(grandchild, Channel::Width, false), Some(250.0));

        let narrow = f.create(frame().with(Channel::Width, "20%"));
        f.attach(UnitId::ROOT, narrow);
        assert!(f.attach(narrow, child));
        assert_eq!(f.tree.resolve(child, Channel::Width, false), Some(100.0));
        assert_eq!(f.tree.resolve(grandchild, Channel::Width, false), Some(50.0));
        assert_eq!(f.style(grandchild, StyleProperty::Width), Some(StyleValue::Pixels(50.0)));
        assert!(f.tree.get(UnitId::ROOT).unwrap().children().contains(&narrow));
        assert!(!f.tree.get(UnitId::ROOT).unwrap().children().contains(&child));
    }

    #[test]
    fn percent_position_offsets_from_parent_origin() {
        let mut f = Fixture::new(1000.0, 800.0);
        let parent = f.create(
            frame()
                .with(Channel::Width, "200px")
                .with(Channel::Height, "100px")
                .with(Channel::X, "100px")
                .with(Channel::Y, "50px"),
        );
        let child = f.create(frame().with(Channel::X, "25%").with(Channel::Y, "50%"));
        f.attach(UnitId::ROOT, parent);
        f.attach(parent, child);
        assert_eq!(f.tree.resolve(child, Channel::X, false), Some(150.0));
        assert_eq!(f.tree.resolve(child, Channel::Y, false), Some(100.0));
        assert_eq!(f.style(child, StyleProperty::Left), Some(StyleValue::Pixels(150.0)));
    }

    #[test]
    fn parent_size_change_moves_percent_children() {
        let mut f = Fixture::new(1000.0, 800.0);
        let parent = f.create(frame().with(Channel::Width, "200px"));
        let child = f.create(frame().with(Channel::X, "50%"));
        f.attach(UnitId::ROOT, parent);
        f.attach(parent, child);
        assert_eq!(f.style(child, StyleProperty::Left), Some(StyleValue::Pixels(100.0)));

        let wider = GeometryValue::new(Channel::Width, 400.0, ValueUnit::Pixel);
        assert!(f.tree.set_value(&mut f.backend, &mut Tracer::none(), parent, wider));
        assert_eq!(f.style(child, StyleProperty::Left), Some(StyleValue::Pixels(200.0)));
    }

    #[test]
    fn negative_sizes_are_written_as_magnitudes() {
        let mut f = Fixture::new(1000.0, 800.0);
        let a = f.create(frame().with(Channel::Width, "-30.4px"));
        f.attach(UnitId::ROOT, a);
        assert_eq!(f.style(a, StyleProperty::Width), Some(StyleValue::Pixels(30.0)));
    }

    #[test]
    fn detached_units_size_against_viewport() {
        let mut f = Fixture::new(640.0, 480.0);
        let a = f.create(frame().with(Channel::Height, "50%").with(Channel::X, "10%"));
        assert_eq!(f.tree.resolve(a, Channel::Height, false), Some(240.0));
        assert_eq!(f.tree.resolve(a, Channel::X, false), Some(0.0));
    }

    #[test]
    fn local_channels_write_directly() {
        let mut f = Fixture::new(100.0, 100.0);
        let a = f.create(
            frame()
                .with(Channel::ZOrder, "2.6")
                .with(Channel::Opacity, "-25%")
                .with(Channel::Rotation, "90deg"),
        );
        assert_eq!(f.style(a, StyleProperty::ZIndex), Some(StyleValue::Integer(3)));
        assert_eq!(f.style(a, StyleProperty::Opacity), Some(StyleValue::Number(0.75)));
        assert_eq!(
            f.style(
                a,
                StyleProperty::Transform(crate::backend::TransformProperty::Standard)
            ),
            Some(StyleValue::RotateDegrees(90.0))
        );
    }

    #[test]
    fn unrotated_units_carry_no_transform() {
        let transform = StyleProperty::Transform(crate::backend::TransformProperty::Standard);
        let mut f = Fixture::new(1000.0, 800.0);
        let parent = f.create(frame().with(Channel::X, "100px").with(Channel::Width, "200px"));
        let child = f.create(frame().with(Channel::X, "25%"));
        assert!(f.attach(UnitId::ROOT, parent));
        assert!(f.attach(parent, child));

        for id in [UnitId::ROOT, parent, child] {
            assert_eq!(f.style(id, transform), None, "{id:?} has a transform");
        }
        assert_eq!(f.style(child, StyleProperty::Left), Some(StyleValue::Pixels(150.0)));

        let mut tracer = Tracer::none();
        f.tree.nudge(&mut f.backend, &mut tracer, parent, Channel::Rotation, 30.0);
        assert_eq!(f.style(parent, transform), Some(StyleValue::RotateDegrees(30.0)));
        f.tree.nudge(&mut f.backend, &mut tracer, parent, Channel::Rotation, -30.0);
        assert_eq!(f.style(parent, transform), None);
    }

    #[test]
    fn rotation_is_skipped_without_a_transform_property() {
        let mut f = Fixture::on(HeadlessBackend::new(100.0, 100.0).with_supported_transforms(&[]));
        assert_eq!(f.tree.capabilities().rotation, None);
        let a = f.create(frame().with(Channel::Rotation, "45deg"));
        let node = f.tree.get(a).unwrap().node();
        let styles = &f.backend.node(node).unwrap().styles;
        assert!(
            !styles
                .keys()
                .any(|p| matches!(p, StyleProperty::Transform(_))),
            "rotation written on a host without transforms: {styles:?}"
        );
        assert_eq!(f.tree.get(a).unwrap().value(Channel::Rotation).magnitude, 45.0);
    }

    #[test]
    fn attach_rejects_cycles_and_non_frames() {
        let mut f = Fixture::new(100.0, 100.0);
        let a = f.create(frame());
        let b = f.create(frame());
        let text = f.create(UnitProperties::new(UnitContent::text("hi")));
        assert!(f.attach(UnitId::ROOT, a));
        assert!(f.attach(a, b));
        assert!(!f.attach(b, a));
        assert!(!f.attach(a, a));
        assert!(!f.attach(a, UnitId::ROOT));
        assert!(!f.attach(text, b));
        assert!(!f.attach(a, UnitId(99)));
        assert_eq!(f.tree.get(b).unwrap().parent(), Some(a));
    }

    #[test]
    fn detach_unlinks_but_keeps_unit() {
        let mut f = Fixture::new(100.0, 100.0);
        let a = f.create(frame());
        f.attach(UnitId::ROOT, a);
        assert!(f.tree.detach(&mut f.backend, a));
        assert!(!f.tree.detach(&mut f.backend, a));
        assert!(f.tree.contains(a));
        assert!(f.tree.get(UnitId::ROOT).unwrap().children().is_empty());
        let node = f.tree.get(a).unwrap().node();
        assert_eq!(f.backend.node(node).unwrap().parent, None);
    }

    #[test]
    fn remove_subtree_frees_children_first() {
        let mut f = Fixture::new(100.0, 100.0);
        let a = f.create(frame());
        let b = f.create(frame());
        let c = f.create(frame());
        f.attach(UnitId::ROOT, a);
        f.attach(a, b);
        f.attach(b, c);
        let removed: Vec<_> = f
            .tree
            .remove_subtree(&mut f.backend, a)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(removed, [c, b, a]);
        assert_eq!(f.tree.len(), 1);
        assert!(f.tree.remove_subtree(&mut f.backend, UnitId::ROOT).is_empty());
    }

    #[test]
    fn text_refits_on_resize() {
        let mut f = Fixture::new(1000.0, 800.0);
        let t = f.create(
            UnitProperties::new(UnitContent::text("0123456789"))
                .with(Channel::Width, "100px")
                .with(Channel::Height, "40px"),
        );
        f.attach(UnitId::ROOT, t);
        // Headless glyphs advance half their font size.
        assert_eq!(f.style(t, StyleProperty::FontSize), Some(StyleValue::Pixels(20.0)));
        assert_eq!(f.style(t, StyleProperty::LineHeight), Some(StyleValue::Pixels(40.0)));

        let short = GeometryValue::new(Channel::Height, 10.0, ValueUnit::Pixel);
        f.tree.set_value(&mut f.backend, &mut Tracer::none(), t, short);
        assert_eq!(f.style(t, StyleProperty::FontSize), Some(StyleValue::Pixels(10.0)));
    }

    #[test]
    fn geometry_reports_declared_or_resolved() {
        let mut f = Fixture::new(1000.0, 500.0);
        let a = f.create(frame().with(Channel::Width, "50%").with(Channel::Height, "10%"));
        f.attach(UnitId::ROOT, a);
        let declared = f.tree.geometry(a, false).unwrap();
        assert_eq!((declared.width, declared.height), (50.0, 10.0));
        let px = f.tree.geometry(a, true).unwrap();
        assert_eq!((px.width, px.height), (500.0, 50.0));
        assert_eq!(px.to_rect(), Rect::new(0.0, 0.0, 500.0, 50.0));
        assert!(f.tree.geometry(UnitId(42), true).is_none());
    }

    #[test]
    fn viewport_resize_reaches_descendants() {
        let mut f = Fixture::new(1000.0, 800.0);
        let a = f.create(frame().with(Channel::Width, "50%"));
        f.attach(UnitId::ROOT, a);
        f.tree
            .set_viewport(&mut f.backend, &mut Tracer::none(), Size::new(600.0, 800.0));
        assert_eq!(f.style(a, StyleProperty::Width), Some(StyleValue::Pixels(300.0)));
    }
}
