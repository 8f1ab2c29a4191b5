// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configure/acknowledge bookkeeping for one layer surface.

use core::fmt;

/// A surface size in buffer pixels.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Size used for any axis the compositor leaves to the client.
    pub const FALLBACK: Self = Self::new(600, 400);

    /// Creates a size.
    #[inline]
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Replaces each zero axis with the matching axis of `fallback`.
    #[inline]
    #[must_use]
    pub const fn or_axes(self, fallback: Self) -> Self {
        Self {
            width: if self.width == 0 { fallback.width } else { self.width },
            height: if self.height == 0 {
                fallback.height
            } else {
                self.height
            },
        }
    }

    /// Width as a signed GL/EGL dimension, clamped to `i32::MAX`.
    #[must_use]
    pub fn width_i32(self) -> i32 {
        i32::try_from(self.width).unwrap_or(i32::MAX)
    }

    /// Height as a signed GL/EGL dimension, clamped to `i32::MAX`.
    #[must_use]
    pub fn height_i32(self) -> i32 {
        i32::try_from(self.height).unwrap_or(i32::MAX)
    }
}

impl fmt::Debug for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// What a configure event changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigureChange {
    /// The size to build (or rebuild) graphics resources at changed.
    Resized(Size),
    /// Only the serial changed; the size is the same or was ignored.
    Unchanged,
}

/// Tracks the configure handshake of a layer surface.
///
/// Configure events are coalesced: only the newest serial waits for
/// acknowledgement and only the newest size is kept. Before graphics exist a
/// zero axis falls back to [`Size::FALLBACK`]; afterwards a zero axis keeps
/// the current value.
#[derive(Clone, Copy, Debug, Default)]
pub struct Negotiation {
    pending_serial: Option<u32>,
    size: Option<Size>,
    acknowledged: bool,
}

impl Negotiation {
    /// Records a configure event.
    pub fn configure(&mut self, serial: u32, proposed: Size) -> ConfigureChange {
        self.pending_serial = Some(serial);
        let next = match self.size {
            None => proposed.or_axes(Size::FALLBACK),
            Some(current) => proposed.or_axes(current),
        };
        if self.size == Some(next) {
            return ConfigureChange::Unchanged;
        }
        self.size = Some(next);
        ConfigureChange::Resized(next)
    }

    /// Takes the newest unacknowledged serial, marking the handshake done.
    pub fn take_ack(&mut self) -> Option<u32> {
        let serial = self.pending_serial.take()?;
        self.acknowledged = true;
        Some(serial)
    }

    /// Returns whether at least one configure has been acknowledged.
    #[must_use]
    pub const fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }

    /// The negotiated size, once any configure has arrived.
    #[must_use]
    pub const fn size(&self) -> Option<Size> {
        self.size
    }
}
