// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Off-screen render target: framebuffer, color texture, depth-stencil.
//!
//! Hacks draw into the target; [`OffscreenTarget::blit_to_window`] copies it
//! to the window surface's default framebuffer right before the swap. Every
//! method requires the owning session's context to be current.

use gl::types::{GLenum, GLint, GLuint};
use layerhack_core::session::Size;

#[derive(Debug, thiserror::Error)]
#[error("framebuffer incomplete (status {0:#06x})")]
pub(crate) struct IncompleteFramebuffer(GLenum);

/// GL objects of one session's render target.
#[derive(Debug)]
pub(crate) struct OffscreenTarget {
    framebuffer: GLuint,
    color: GLuint,
    depth_stencil: GLuint,
    size: Size,
}

impl OffscreenTarget {
    /// Allocates a complete target of `size`.
    pub(crate) fn new(size: Size) -> Result<Self, IncompleteFramebuffer> {
        let (width, height) = (size.width_i32(), size.height_i32());
        let mut target = Self {
            framebuffer: 0,
            color: 0,
            depth_stencil: 0,
            size,
        };
        // SAFETY: the caller's context is current and GL is loaded; every
        // pointer passed is to a local of the expected type.
        let status = unsafe {
            gl::GenFramebuffers(1, &mut target.framebuffer);
            gl::BindFramebuffer(gl::FRAMEBUFFER, target.framebuffer);

            gl::GenTextures(1, &mut target.color);
            gl::BindTexture(gl::TEXTURE_2D, target.color);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA8 as GLint,
                width,
                height,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                core::ptr::null(),
            );
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
            gl::FramebufferTexture2D(
                gl::FRAMEBUFFER,
                gl::COLOR_ATTACHMENT0,
                gl::TEXTURE_2D,
                target.color,
                0,
            );

            gl::GenRenderbuffers(1, &mut target.depth_stencil);
            gl::BindRenderbuffer(gl::RENDERBUFFER, target.depth_stencil);
            gl::RenderbufferStorage(gl::RENDERBUFFER, gl::DEPTH24_STENCIL8, width, height);
            gl::FramebufferRenderbuffer(
                gl::FRAMEBUFFER,
                gl::DEPTH_STENCIL_ATTACHMENT,
                gl::RENDERBUFFER,
                target.depth_stencil,
            );

            gl::CheckFramebufferStatus(gl::FRAMEBUFFER)
        };
        if status != gl::FRAMEBUFFER_COMPLETE {
            target.delete();
            return Err(IncompleteFramebuffer(status));
        }
        Ok(target)
    }

    /// The size the target was allocated at.
    pub(crate) fn size(&self) -> Size {
        self.size
    }

    /// Makes the target the draw destination and sets the viewport to cover
    /// it.
    pub(crate) fn bind(&self) {
        // SAFETY: the owning context is current.
        unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, self.framebuffer);
            gl::Viewport(0, 0, self.size.width_i32(), self.size.height_i32());
        }
    }

    /// Copies the color attachment into the window's default framebuffer.
    pub(crate) fn blit_to_window(&self) {
        let (width, height) = (self.size.width_i32(), self.size.height_i32());
        // SAFETY: the owning context is current.
        unsafe {
            gl::BindFramebuffer(gl::READ_FRAMEBUFFER, self.framebuffer);
            gl::BindFramebuffer(gl::DRAW_FRAMEBUFFER, 0);
            gl::BlitFramebuffer(
                0,
                0,
                width,
                height,
                0,
                0,
                width,
                height,
                gl::COLOR_BUFFER_BIT,
                gl::NEAREST,
            );
            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        }
    }

    /// Releases the GL objects.
    pub(crate) fn delete(&mut self) {
        // SAFETY: the owning context is current; zero names are ignored by GL.
        unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
            gl::DeleteFramebuffers(1, &self.framebuffer);
            gl::DeleteTextures(1, &self.color);
            gl::DeleteRenderbuffers(1, &self.depth_stencil);
        }
        self.framebuffer = 0;
        self.color = 0;
        self.depth_stencil = 0;
    }
}
