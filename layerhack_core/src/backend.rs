// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for platform integrations.
//!
//! The [`Registry`](crate::registry::Registry) decides *when* surfaces and
//! GL resources are created, resized, drawn and destroyed. A backend decides
//! *how*. The Wayland backend implements this with `zwlr_layer_surface_v1`,
//! EGL and an off-screen framebuffer; tests implement it with a recorder.
//!
//! # Resource ownership
//!
//! Each associated type is owned by exactly one session and is handed back
//! to the backend for destruction, never shared:
//!
//! | Type | Created by | Destroyed by |
//! |---|---|---|
//! | `Output` | the backend's output discovery | [`release_output`](SurfaceBackend::release_output) |
//! | `Surface` | [`create_surface`](SurfaceBackend::create_surface) | [`destroy_surface`](SurfaceBackend::destroy_surface) |
//! | `Graphics` | [`create_graphics`](SurfaceBackend::create_graphics) | [`destroy_graphics`](SurfaceBackend::destroy_graphics) |
//!
//! `Graphics` is always destroyed before its `Surface`, and the hack is freed
//! before either.

use crate::error::Error;
use crate::session::{FrameToken, SessionId, Size};

/// Creates and drives per-output surfaces and GL resources.
pub trait SurfaceBackend {
    /// A bound output handle.
    type Output;
    /// A drawable surface with its layer-surface role.
    type Surface;
    /// A GL context, its window surface and the off-screen render target.
    type Graphics;

    /// Creates a background layer surface anchored to all edges with an
    /// exclusive zone of `-1` and size `(0, 0)`, then commits it.
    ///
    /// `output == None` lets the compositor pick its preferred output.
    fn create_surface(
        &mut self,
        session: SessionId,
        output: Option<&Self::Output>,
    ) -> Result<Self::Surface, Error>;

    /// Acknowledges the configure event with `serial`.
    fn ack_configure(&mut self, surface: &Self::Surface, serial: u32);

    /// Creates the GL context and render target at `size`, leaving the
    /// context current with compositor-synchronized swaps disabled.
    fn create_graphics(
        &mut self,
        surface: &Self::Surface,
        size: Size,
    ) -> Result<Self::Graphics, Error>;

    /// Makes the session's GL context current.
    fn make_current(&mut self, graphics: &Self::Graphics) -> Result<(), Error>;

    /// Recreates the render target at `size`. The context is current.
    fn resize_graphics(&mut self, graphics: &mut Self::Graphics, size: Size) -> Result<(), Error>;

    /// Binds the render target so the hack's draw lands in it.
    fn begin_frame(&mut self, graphics: &Self::Graphics);

    /// Copies the render target to the surface, requests a frame-completion
    /// event tagged with `token`, and submits the buffer.
    fn present(
        &mut self,
        session: SessionId,
        token: FrameToken,
        surface: &mut Self::Surface,
        graphics: &mut Self::Graphics,
    ) -> Result<(), Error>;

    /// Releases the render target, the GL context and its window surface.
    fn destroy_graphics(&mut self, graphics: Self::Graphics);

    /// Drops any outstanding frame callback, then destroys the layer surface
    /// and the surface.
    fn destroy_surface(&mut self, surface: Self::Surface);

    /// Releases a bound output handle.
    fn release_output(&mut self, output: Self::Output);
}
