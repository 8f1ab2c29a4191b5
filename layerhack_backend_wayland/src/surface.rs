// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`SurfaceBackend`] on layer-shell surfaces with EGL window surfaces.

use khronos_egl as egl;
use layerhack_core::Error;
use layerhack_core::backend::SurfaceBackend;
use layerhack_core::session::{FrameToken, SessionId, Size};
use tracing::debug;
use wayland_client::protocol::wl_callback::WlCallback;
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::protocol::wl_output::WlOutput;
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{Proxy, QueueHandle};
use wayland_egl::WlEglSurface;
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_shell_v1::{self, ZwlrLayerShellV1};
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_surface_v1::{
    self, ZwlrLayerSurfaceV1,
};

use crate::egl::EglDriver;
use crate::events::{FrameTag, WaylandState};
use crate::framebuffer::OffscreenTarget;

/// A `wl_surface` with its background layer role.
#[derive(Debug)]
pub struct LayerSurface {
    wl_surface: WlSurface,
    layer_surface: ZwlrLayerSurfaceV1,
    frame_callback: Option<WlCallback>,
}

/// A session's EGL window, context and off-screen render target.
pub struct GlResources {
    target: OffscreenTarget,
    egl_surface: egl::Surface,
    context: egl::Context,
    window: WlEglSurface,
}

impl core::fmt::Debug for GlResources {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GlResources")
            .field("target", &self.target)
            .field("egl_surface", &self.egl_surface)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Creates layer surfaces and GL resources on one connection.
#[derive(Debug)]
pub struct WaylandBackend {
    compositor: WlCompositor,
    layer_shell: ZwlrLayerShellV1,
    qh: QueueHandle<WaylandState>,
    egl: EglDriver,
    namespace: String,
    gl_loaded: bool,
}

impl WaylandBackend {
    pub(crate) fn new(
        compositor: WlCompositor,
        layer_shell: ZwlrLayerShellV1,
        qh: QueueHandle<WaylandState>,
        egl: EglDriver,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            compositor,
            layer_shell,
            qh,
            egl,
            namespace: namespace.into(),
            gl_loaded: false,
        }
    }
}

impl SurfaceBackend for WaylandBackend {
    type Output = WlOutput;
    type Surface = LayerSurface;
    type Graphics = GlResources;

    fn create_surface(
        &mut self,
        session: SessionId,
        output: Option<&WlOutput>,
    ) -> Result<LayerSurface, Error> {
        let wl_surface = self.compositor.create_surface(&self.qh, ());
        let layer_surface = self.layer_shell.get_layer_surface(
            &wl_surface,
            output,
            zwlr_layer_shell_v1::Layer::Background,
            self.namespace.clone(),
            &self.qh,
            session,
        );
        layer_surface.set_anchor(
            zwlr_layer_surface_v1::Anchor::Top
                | zwlr_layer_surface_v1::Anchor::Bottom
                | zwlr_layer_surface_v1::Anchor::Left
                | zwlr_layer_surface_v1::Anchor::Right,
        );
        layer_surface.set_exclusive_zone(-1);
        layer_surface.set_size(0, 0);
        layer_surface.set_keyboard_interactivity(
            zwlr_layer_surface_v1::KeyboardInteractivity::None,
        );
        wl_surface.commit();
        debug!(?session, surface = %wl_surface.id(), "layer surface created");

        Ok(LayerSurface {
            wl_surface,
            layer_surface,
            frame_callback: None,
        })
    }

    fn ack_configure(&mut self, surface: &LayerSurface, serial: u32) {
        surface.layer_surface.ack_configure(serial);
    }

    fn create_graphics(&mut self, surface: &LayerSurface, size: Size) -> Result<GlResources, Error> {
        let window = WlEglSurface::new(surface.wl_surface.id(), size.width_i32(), size.height_i32())
            .map_err(|err| Error::graphics("wl_egl_window_create", err))?;
        let (egl_surface, context) = self.egl.create(&window)?;

        if !self.gl_loaded {
            self.egl.load_gl();
            self.gl_loaded = true;
        }

        let target = match OffscreenTarget::new(size) {
            Ok(target) => target,
            Err(err) => {
                self.egl.destroy(egl_surface, context);
                return Err(Error::graphics("glCheckFramebufferStatus", err));
            }
        };

        Ok(GlResources {
            target,
            egl_surface,
            context,
            window,
        })
    }

    fn make_current(&mut self, graphics: &GlResources) -> Result<(), Error> {
        self.egl.make_current(graphics.egl_surface, graphics.context)
    }

    fn resize_graphics(&mut self, graphics: &mut GlResources, size: Size) -> Result<(), Error> {
        graphics
            .window
            .resize(size.width_i32(), size.height_i32(), 0, 0);
        if graphics.target.size() == size {
            return Ok(());
        }
        graphics.target.delete();
        graphics.target = OffscreenTarget::new(size)
            .map_err(|err| Error::graphics("glCheckFramebufferStatus", err))?;
        Ok(())
    }

    fn begin_frame(&mut self, graphics: &GlResources) {
        graphics.target.bind();
    }

    fn present(
        &mut self,
        session: SessionId,
        token: FrameToken,
        surface: &mut LayerSurface,
        graphics: &mut GlResources,
    ) -> Result<(), Error> {
        graphics.target.blit_to_window();
        // Requested before the swap so the swap's commit carries it.
        let callback = surface
            .wl_surface
            .frame(&self.qh, FrameTag { session, token });
        surface.frame_callback = Some(callback);
        self.egl
            .swap_buffers(graphics.egl_surface)
            .map_err(|err| Error::Present {
                session,
                source: err.into(),
            })
    }

    fn destroy_graphics(&mut self, mut graphics: GlResources) {
        if self.make_current(&graphics).is_ok() {
            graphics.target.delete();
        }
        self.egl.destroy(graphics.egl_surface, graphics.context);
        drop(graphics.window);
    }

    fn destroy_surface(&mut self, mut surface: LayerSurface) {
        if let Some(callback) = surface.frame_callback.take() {
            debug!(callback = %callback.id(), "dropping pending frame callback");
        }
        // The role object goes before the surface it is attached to.
        surface.layer_surface.destroy();
        surface.wl_surface.destroy();
    }

    fn release_output(&mut self, output: WlOutput) {
        if output.version() >= 3 {
            output.release();
        }
    }
}
