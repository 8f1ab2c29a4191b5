// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The capability interface implemented by every hack.
//!
//! A hack is created once per session through [`HackFactory::init`] and then
//! lives behind a `Box<dyn Hack>` owned by that session. The registry
//! guarantees the call order:
//!
//! 1. `init` exactly once, with the session's GL context current, before any
//!    other call.
//! 2. `draw` repeatedly; each call returns the microseconds to wait before
//!    the next one.
//! 3. `reshape` only after at least one `draw`, whenever the compositor
//!    resizes the surface.
//! 4. `free` exactly once, after the last `draw` and before the session's GL
//!    resources are released. It consumes the box, so nothing can call into
//!    the hack afterwards.

use crate::options::OptionSpec;
use crate::resources::ResourceDb;
use crate::session::{SessionId, Size};

/// The pixel rectangle a hack renders into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct View {
    /// Left edge, always `0` for a layer surface.
    pub x: i32,
    /// Top edge, always `0` for a layer surface.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl View {
    /// A view covering a whole surface of the given size.
    #[must_use]
    pub const fn covering(size: Size) -> Self {
        Self {
            x: 0,
            y: 0,
            width: size.width,
            height: size.height,
        }
    }
}

/// Where a hack draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Drawable {
    /// An on-screen layer surface owned by a session.
    Window {
        /// The owning session.
        session: SessionId,
        /// The current pixel rectangle.
        view: View,
    },
    /// An off-screen image, e.g. for thumbnails.
    Pixmap {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Bits per pixel.
        depth: u32,
    },
}

impl Drawable {
    /// Returns the drawable's size in pixels.
    #[must_use]
    pub const fn size(&self) -> Size {
        match *self {
            Self::Window { view, .. } => Size::new(view.width, view.height),
            Self::Pixmap { width, height, .. } => Size::new(width, height),
        }
    }
}

/// Input delivered to a hack.
///
/// The Wayland driver does not route compositor input yet; the type exists
/// so hacks can implement [`Hack::handle_event`] against a stable shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum HackEvent {
    /// A key was pressed.
    Key {
        /// The XKB keysym.
        keysym: u32,
    },
    /// A pointer button was pressed at a surface-local position.
    Button {
        /// Linux input button code.
        button: u32,
        /// Surface-local x.
        x: i32,
        /// Surface-local y.
        y: i32,
    },
}

/// Read-only environment handed to every hack callback.
#[derive(Clone, Copy, Debug)]
pub struct HackContext<'a> {
    /// The resource database, for the hack's own settings.
    pub resources: &'a ResourceDb,
    /// The output this session renders to, when known.
    pub output_name: Option<&'a str>,
    /// Whether the user asked for monochrome rendering.
    pub mono: bool,
}

/// A running hack instance.
pub trait Hack {
    /// Renders one frame into the current GL target.
    ///
    /// Returns how many microseconds to wait before the next frame.
    fn draw(&mut self, ctx: &HackContext<'_>, drawable: &Drawable) -> u64;

    /// Reacts to the drawable changing size.
    fn reshape(&mut self, ctx: &HackContext<'_>, drawable: &Drawable, width: u32, height: u32);

    /// Handles an input event, returning whether it was consumed.
    fn handle_event(
        &mut self,
        ctx: &HackContext<'_>,
        drawable: &Drawable,
        event: &HackEvent,
    ) -> bool {
        let _ = (ctx, drawable, event);
        false
    }

    /// Releases everything the hack allocated, with its GL context current.
    fn free(self: Box<Self>, ctx: &HackContext<'_>, drawable: &Drawable);
}

/// Describes a hack and creates its instances.
pub trait HackFactory {
    /// Resource class of the program, e.g. `"Pulse"`.
    fn progclass(&self) -> &str;

    /// Default resource lines, e.g. `"*delay: 20000"`.
    fn defaults(&self) -> &[&'static str] {
        &[]
    }

    /// Hack-specific command-line flags.
    fn options(&self) -> &[OptionSpec] {
        &[]
    }

    /// Creates the per-session hack state. The session's GL context is
    /// current for the duration of this call.
    fn init(&self, ctx: &HackContext<'_>, drawable: &Drawable) -> Box<dyn Hack>;
}

#[cfg(test)]
mod tests {
    use super::{Drawable, View};
    use crate::session::{SessionStore, Size};

    #[test]
    fn drawable_sizes() {
        let mut store = SessionStore::new();
        let session = store.insert(());
        let window = Drawable::Window {
            session,
            view: View::covering(Size::new(1920, 1080)),
        };
        assert_eq!(window.size(), Size::new(1920, 1080));

        let pixmap = Drawable::Pixmap {
            width: 64,
            height: 32,
            depth: 24,
        };
        assert_eq!(pixmap.size(), Size::new(64, 32));
    }

    #[test]
    fn view_starts_at_origin() {
        let view = View::covering(Size::new(10, 20));
        assert_eq!((view.x, view.y), (0, 0), "layer surfaces are unoffset");
    }
}
