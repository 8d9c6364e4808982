// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handle types exposed across the facade boundary.
//!
//! Every handle is a plain slot index issued by a [`SlotPool`](crate::pool::SlotPool).
//! Slots are reused after they are freed, so a handle carries no generation:
//! callers that keep a handle across a destroy/create pair must re-check
//! liveness before using it.

use core::fmt;

/// A handle to a unit in the scene tree.
///
/// `UnitId(0)` is always the implicit root unit.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(pub u32);

impl UnitId {
    /// The root unit, bound to the host viewport.
    pub const ROOT: Self = Self(0);

    /// Returns `true` for the root handle.
    #[inline]
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({})", self.0)
    }
}

/// A handle to an animation program.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnimationId(pub u32);

impl fmt::Debug for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnimationId({})", self.0)
    }
}

/// A handle to a binding of an animation program to a unit.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingId(pub u32);

impl fmt::Debug for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BindingId({})", self.0)
    }
}

/// An opaque reference to a node owned by the render back end.
///
/// Back ends assign these in [`Backend::create_node`](crate::backend::Backend::create_node);
/// the core only stores and passes them back.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}
