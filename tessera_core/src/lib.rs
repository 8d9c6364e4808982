// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained-mode 2D scene graph with percent geometry and scheduled animation.
//!
//! `tessera_core` keeps a tree of rectangular scene units whose geometry is
//! declared in pixels or in percent of the parent, resolves it to absolute
//! viewport pixels, and writes the results to a host through the
//! [`Backend`](backend::Backend) trait. Everything is addressed through
//! integer slot handles owned by a single [`Scene`](scene::Scene).
//!
//! # Architecture
//!
//! ```text
//!   caller ──► Scene (facade, handles)
//!                │
//!     ┌──────────┼──────────────┬────────────────┐
//!     ▼          ▼              ▼                ▼
//!   UnitTree   AnimationProgram AnimationScheduler InputTranslator
//!     │          + Binding        │                ▲
//!     │          │ steps          │ request_tick   │ RawEvent
//!     │◄─────────┘                ▼                │
//!     └── set_style ──────────► Backend ───────────┘
//! ```
//!
//! **[`pool`]**: Dense slot pools with lowest-free-slot reuse. Every handle
//! in the crate is a slot of one of these.
//!
//! **[`value`]**: Geometry channels and their declared values, parsed from
//! strings such as `"50%"` or `"12.5px"`.
//!
//! **[`tree`]**: The unit tree: percent resolution against the parent or the
//! viewport, propagation of size and position changes to descendants, and
//! attach/detach/destroy.
//!
//! **[`animation`]** and **[`scheduler`]**: Act-based programs, their
//! per-unit bindings, and the single timer loop that advances them.
//!
//! **[`input`]**: Normalization of host pointer and keyboard events into
//! unit-relative [`Event`](input::Event)s and their delivery to callbacks.
//!
//! **[`backend`]**: The host seam. [`headless`] implements it in memory.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! loop and binding instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `serde` (disabled by default): Serialization for declarations, programs
//!   and reports.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-write
//!   style events.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod animation;
pub mod backend;
pub mod caps;
pub mod error;
pub mod headless;
pub mod id;
pub mod input;
pub mod pool;
pub mod scene;
pub mod scheduler;
pub mod text;
pub mod time;
pub mod trace;
pub mod tree;
pub mod unit;
pub mod value;

pub use error::SceneError;
pub use id::{AnimationId, BindingId, NodeId, UnitId};
pub use scene::{Scene, SceneConfig};
