// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wayland backend for layerhack.
//!
//! This crate connects the platform-independent session registry in
//! `layerhack_core` to a wlroots-style compositor:
//!
//! - Connection bootstrap: `wl_compositor`, `zwlr_layer_shell_v1` and every
//!   `wl_output` (version 4, for the `name` event)
//! - [`WaylandBackend`]: background layer surfaces, EGL contexts and an
//!   off-screen GL render target per session
//! - Frame-callback gating and configure acknowledgement
//! - [`run`]: the single-threaded render loop

#![expect(
    unsafe_code,
    reason = "EGL, wayland-egl and GL are C APIs without safe wrappers"
)]

mod driver;
mod egl;
mod event_loop;
mod events;
mod framebuffer;
mod globals;
mod surface;
mod time;

pub use driver::run;
pub use event_loop::{OwnedQueue, PumpError};
pub use events::WaylandState;
pub use globals::{BootstrapError, Globals, bootstrap};
pub use surface::{GlResources, LayerSurface, WaylandBackend};
pub use time::now;
