// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handles for sessions and submitted frames.

use core::fmt;

/// Names one session in a [`SessionStore`](super::SessionStore).
///
/// Layer-surface and frame-callback user data hold a copy. Once the session
/// is destroyed its slot may be reused, but the bumped generation makes every
/// old copy resolve to nothing, so late compositor events are dropped.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl SessionId {
    /// Slot number, for log output.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// How many sessions occupied this slot before this one.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}.{}", self.idx, self.generation)
    }
}

/// Identity of one submitted frame.
///
/// Frame-completion events carry the token of the frame they complete so a
/// late callback from a superseded frame cannot release the gate early.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameToken(pub u64);
