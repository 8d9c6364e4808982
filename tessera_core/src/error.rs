// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene construction errors.

/// Host conditions that make a scene impossible to build.
///
/// Everything else (stale handles, malformed declarations, missing optional
/// host features) is absorbed where it happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The back end has no node to host the root unit.
    #[error("host root node is unavailable")]
    HostUnavailable,
    /// The back end cannot report a viewport size.
    #[error("host viewport size is unavailable")]
    ViewportUnavailable,
}
