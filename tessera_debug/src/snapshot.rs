// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON snapshots of the unit tree.
//!
//! [`snapshot`] walks the tree from the root and records, for every attached
//! unit, its kind, its declared channel values and its resolved pixel box.
//! Detached units are listed separately. Useful for golden tests and for
//! dumping a misbehaving layout.

use std::io::{self, Write};

use serde_json::{Map, Value, json};

use tessera_core::backend::Backend;
use tessera_core::value::Channel;
use tessera_core::{Scene, UnitId};

/// Captures the scene as a JSON value.
///
/// Takes the scene mutably because resolving geometry fills value caches.
pub fn snapshot<B: Backend>(scene: &mut Scene<B>) -> Value {
    let viewport = scene.tree().viewport();
    let caps = scene.capabilities();

    let detached: Vec<UnitId> = scene
        .tree()
        .iter()
        .filter(|(id, unit)| !id.is_root() && unit.parent().is_none())
        .map(|(id, _)| id)
        .collect();

    let root = unit_json(scene, UnitId::ROOT);
    let detached: Vec<Value> = detached.into_iter().map(|id| unit_json(scene, id)).collect();

    json!({
        "viewport": { "width": viewport.width, "height": viewport.height },
        "capabilities": {
            "opacity": caps.opacity_supported,
            "rotation": caps.rotation_supported,
        },
        "units": scene.tree().len(),
        "root": root,
        "detached": detached,
    })
}

/// Writes [`snapshot`] as pretty-printed JSON.
pub fn write_snapshot<B: Backend>(scene: &mut Scene<B>, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, &snapshot(scene))?;
    Ok(())
}

fn unit_json<B: Backend>(scene: &mut Scene<B>, id: UnitId) -> Value {
    let Some(unit) = scene.unit(id) else {
        return Value::Null;
    };
    let kind = unit.kind().name();
    let children = unit.children().to_vec();
    let mut declared = Map::new();
    for channel in Channel::ALL {
        declared.insert(channel.name().to_owned(), json!(unit.value(channel).to_string()));
    }

    let resolved = scene.unit_get_geometry(id, true).map_or(Value::Null, |g| {
        json!({ "x": g.x, "y": g.y, "width": g.width, "height": g.height })
    });
    let children: Vec<Value> = children.into_iter().map(|c| unit_json(scene, c)).collect();

    json!({
        "id": id.0,
        "kind": kind,
        "declared": declared,
        "resolved": resolved,
        "children": children,
    })
}
