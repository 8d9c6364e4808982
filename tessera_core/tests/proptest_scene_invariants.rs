// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property-based invariant tests for slot pools and the unit tree.
//!
//! 1. A pool agrees with a map model and always reuses the smallest free id
//! 2. Parent and child links stay symmetric under arbitrary edits
//! 3. The host node tree mirrors the unit tree
//! 4. Percent widths resolve against the parent's resolved width

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use tessera_core::headless::HeadlessBackend;
use tessera_core::pool::SlotPool;
use tessera_core::unit::{UnitContent, UnitProperties};
use tessera_core::value::Channel;
use tessera_core::{Scene, SceneConfig, UnitId};

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum PoolOp {
    Allocate(u16),
    Free(u32),
}

fn pool_op() -> impl Strategy<Value = PoolOp> {
    prop_oneof![
        any::<u16>().prop_map(PoolOp::Allocate),
        (0u32..32).prop_map(PoolOp::Free),
    ]
}

#[derive(Debug, Clone)]
enum TreeOp {
    Create(u8),
    Attach(u32, u32),
    Detach(u32),
    Destroy(u32),
    SetWidth(u32, u8),
}

fn tree_op() -> impl Strategy<Value = TreeOp> {
    prop_oneof![
        (0u8..=100).prop_map(TreeOp::Create),
        (0u32..12, 0u32..12).prop_map(|(p, c)| TreeOp::Attach(p, c)),
        (0u32..12).prop_map(TreeOp::Detach),
        (0u32..12).prop_map(TreeOp::Destroy),
        (0u32..12, 0u8..=100).prop_map(|(u, w)| TreeOp::SetWidth(u, w)),
    ]
}

fn run_tree_ops(ops: &[TreeOp]) -> Scene<HeadlessBackend> {
    let mut scene = Scene::new(HeadlessBackend::new(1000.0, 600.0), SceneConfig::default())
        .expect("headless host is always available");
    for op in ops {
        match *op {
            TreeOp::Create(pct) => {
                scene.unit_create(
                    UnitProperties::new(UnitContent::frame())
                        .with(Channel::Width, format!("{pct}%")),
                );
            }
            TreeOp::Attach(p, c) => {
                scene.unit_attach(UnitId(p), UnitId(c));
            }
            TreeOp::Detach(u) => {
                scene.unit_detach(UnitId(u));
            }
            TreeOp::Destroy(u) => {
                scene.unit_destroy(UnitId(u));
            }
            TreeOp::SetWidth(u, pct) => {
                scene.unit_set_value(UnitId(u), Channel::Width, format!("{pct}%"));
            }
        }
    }
    scene
}

// ═══════════════════════════════════════════════════════════════════════
// 1. Pool model
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn pool_matches_map_model(ops in prop::collection::vec(pool_op(), 0..200)) {
        let mut pool = SlotPool::new();
        let mut model: BTreeMap<u32, u16> = BTreeMap::new();
        let mut freed: BTreeSet<u32> = BTreeSet::new();

        for op in ops {
            match op {
                PoolOp::Allocate(v) => {
                    let expected = freed.pop_first();
                    let id = pool.allocate(v);
                    if let Some(expected) = expected {
                        prop_assert_eq!(id, expected);
                    } else {
                        prop_assert!(!model.contains_key(&id));
                    }
                    model.insert(id, v);
                }
                PoolOp::Free(id) => {
                    let removed = pool.free(id);
                    prop_assert_eq!(removed, model.remove(&id));
                    if removed.is_some() {
                        freed.insert(id);
                    }
                }
            }
            prop_assert_eq!(pool.len(), model.len());
        }

        let live: Vec<_> = pool.iter().map(|(id, v)| (id, *v)).collect();
        let expected: Vec<_> = model.into_iter().collect();
        prop_assert_eq!(live, expected);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 2-3. Structural consistency
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn links_stay_symmetric(ops in prop::collection::vec(tree_op(), 0..80)) {
        let scene = run_tree_ops(&ops);
        let tree = scene.tree();

        let root = tree.get(UnitId::ROOT).expect("root is never destroyed");
        prop_assert!(root.parent().is_none());

        for (id, unit) in tree.iter() {
            if let Some(parent) = unit.parent() {
                let parent_unit = tree.get(parent).expect("parents are live");
                prop_assert_eq!(
                    parent_unit.children().iter().filter(|&&c| c == id).count(),
                    1
                );
                prop_assert!(!tree.is_ancestor(id, parent));
            }
            for &child in unit.children() {
                prop_assert_eq!(tree.get(child).and_then(|c| c.parent()), Some(id));
            }
        }
    }

    #[test]
    fn host_tree_mirrors_units(ops in prop::collection::vec(tree_op(), 0..80)) {
        let scene = run_tree_ops(&ops);
        let backend = scene.backend();

        // One host node per live unit.
        prop_assert_eq!(backend.node_count(), scene.tree().len());
        for (_, unit) in scene.tree().iter() {
            let node = backend.node(unit.node()).expect("live units own a node");
            let expected: Vec<_> = unit
                .children()
                .iter()
                .filter_map(|&c| scene.tree().get(c))
                .map(|c| c.node())
                .collect();
            prop_assert_eq!(&node.children, &expected);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 4. Percent resolution
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn percent_width_follows_parent(
        outer in 0u8..=100,
        inner in 0u8..=100,
    ) {
        let mut scene = Scene::new(HeadlessBackend::new(1000.0, 600.0), SceneConfig::default())
            .expect("headless host is always available");
        let a = scene.unit_create(
            UnitProperties::new(UnitContent::frame()).with(Channel::Width, format!("{outer}%")),
        );
        let b = scene.unit_create(
            UnitProperties::new(UnitContent::frame()).with(Channel::Width, format!("{inner}%")),
        );
        scene.unit_attach(UnitId::ROOT, a);
        scene.unit_attach(a, b);

        let outer_px = scene.unit_get_geometry(a, true).expect("live").width;
        let inner_px = scene.unit_get_geometry(b, true).expect("live").width;
        prop_assert!((outer_px - 1000.0 * f64::from(outer) / 100.0).abs() < 1e-9);
        prop_assert!((inner_px - outer_px * f64::from(inner) / 100.0).abs() < 1e-9);
    }
}
