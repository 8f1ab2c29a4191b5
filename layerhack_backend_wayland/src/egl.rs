// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! EGL display, config and per-session context management.
//!
//! One [`EglDriver`] is created per connection and shared read-only by every
//! session. Contexts and window surfaces are per session and are handed back
//! to the driver for destruction.

use core::ffi::c_void;

use khronos_egl as egl;
use layerhack_core::Error;
use tracing::{debug, info};
use wayland_client::Connection;
use wayland_egl::WlEglSurface;

/// `EGL_PLATFORM_WAYLAND_KHR`.
const PLATFORM_WAYLAND_KHR: egl::Enum = 0x31D8;
/// `EGL_PLATFORM_WAYLAND_EXT`, same value as the KHR token.
const PLATFORM_WAYLAND_EXT: egl::Enum = 0x31D8;

const PREFERRED_EXTENSION: &str = "EGL_KHR_platform_wayland";
const FALLBACK_EXTENSION: &str = "EGL_EXT_platform_wayland";

type Instance = egl::DynamicInstance<egl::EGL1_4>;

/// `eglGetPlatformDisplayEXT` from `EGL_EXT_platform_base`.
type GetPlatformDisplayExt =
    unsafe extern "system" fn(egl::Enum, *mut c_void, *const egl::Int) -> egl::EGLDisplay;

/// Which client extension the display was obtained through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Platform {
    /// `eglGetPlatformDisplay` with `EGL_PLATFORM_WAYLAND_KHR`.
    Khr,
    /// `eglGetPlatformDisplayEXT` with `EGL_PLATFORM_WAYLAND_EXT`.
    Ext,
}

impl Platform {
    /// The EGL entry point that opens a display on this platform.
    pub(crate) const fn entry_point(self) -> &'static str {
        match self {
            Self::Khr => "eglGetPlatformDisplay",
            Self::Ext => "eglGetPlatformDisplayEXT",
        }
    }
}

/// Picks the platform from the client extension string.
pub(crate) fn select_platform(extensions: &str) -> Option<Platform> {
    let mut names = extensions.split_ascii_whitespace();
    if names.clone().any(|name| name == PREFERRED_EXTENSION) {
        Some(Platform::Khr)
    } else if names.any(|name| name == FALLBACK_EXTENSION) {
        Some(Platform::Ext)
    } else {
        None
    }
}

#[derive(Debug, thiserror::Error)]
#[error("neither {PREFERRED_EXTENSION} nor {FALLBACK_EXTENSION} is supported")]
struct NoWaylandPlatform;

#[derive(Debug, thiserror::Error)]
#[error("libEGL does not export {0}")]
struct MissingEntryPoint(&'static str);

#[derive(Debug, thiserror::Error)]
#[error("no display for the wayland connection")]
struct NoDisplay;

#[derive(Debug, thiserror::Error)]
#[error("no EGL config with 8-bit RGB and OpenGL window support")]
struct NoConfig;

/// The EGL display plus the config every session renders with.
pub(crate) struct EglDriver {
    instance: Instance,
    display: egl::Display,
    config: egl::Config,
}

impl core::fmt::Debug for EglDriver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EglDriver")
            .field("display", &self.display.as_ptr())
            .finish_non_exhaustive()
    }
}

impl EglDriver {
    /// Loads `libEGL`, opens the display for `connection` and picks a config.
    pub(crate) fn new(connection: &Connection) -> Result<Self, Error> {
        // SAFETY: loading libEGL runs its initializers; it is a system
        // library with no preconditions on the caller.
        let instance = unsafe { Instance::load_required() }
            .map_err(|err| Error::graphics("load libEGL", err))?;

        let extensions = instance
            .query_string(None, egl::EXTENSIONS)
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        let platform = select_platform(&extensions)
            .ok_or_else(|| Error::graphics("eglQueryString", NoWaylandPlatform))?;

        let native = connection.backend().display_ptr().cast::<c_void>();
        let stage = platform.entry_point();
        let display = match platform {
            Platform::Khr => {
                let egl15 = instance
                    .upcast::<egl::EGL1_5>()
                    .ok_or_else(|| Error::graphics(stage, MissingEntryPoint(stage)))?;
                // SAFETY: `native` is the live `wl_display` of `connection`,
                // which outlives the driver.
                unsafe { egl15.get_platform_display(PLATFORM_WAYLAND_KHR, native, &[egl::ATTRIB_NONE]) }
                    .map_err(|err| Error::graphics(stage, err))?
            }
            Platform::Ext => {
                let entry = instance
                    .get_proc_address(stage)
                    .ok_or_else(|| Error::graphics(stage, MissingEntryPoint(stage)))?;
                // SAFETY: `eglGetPlatformDisplayEXT` has exactly this
                // signature in `EGL_EXT_platform_base`.
                let get_platform_display = unsafe {
                    core::mem::transmute::<extern "system" fn(), GetPlatformDisplayExt>(entry)
                };
                let attributes = [egl::NONE];
                // SAFETY: `native` is the live `wl_display` of `connection`,
                // and the attribute list is `EGL_NONE` terminated.
                let raw = unsafe {
                    get_platform_display(PLATFORM_WAYLAND_EXT, native, attributes.as_ptr())
                };
                if raw.is_null() {
                    return Err(Error::graphics(stage, NoDisplay));
                }
                // SAFETY: non-null handle just returned by EGL.
                unsafe { egl::Display::from_ptr(raw) }
            }
        };

        let (major, minor) = instance
            .initialize(display)
            .map_err(|err| Error::graphics("eglInitialize", err))?;
        instance
            .bind_api(egl::OPENGL_API)
            .map_err(|err| Error::graphics("eglBindAPI", err))?;

        let attributes = [
            egl::RED_SIZE,
            8,
            egl::GREEN_SIZE,
            8,
            egl::BLUE_SIZE,
            8,
            egl::SURFACE_TYPE,
            egl::WINDOW_BIT,
            egl::RENDERABLE_TYPE,
            egl::OPENGL_BIT,
            egl::NONE,
        ];
        let config = instance
            .choose_first_config(display, &attributes)
            .map_err(|err| Error::graphics("eglChooseConfig", err))?
            .ok_or_else(|| Error::graphics("eglChooseConfig", NoConfig))?;

        info!(?platform, major, minor, "EGL initialized");
        Ok(Self {
            instance,
            display,
            config,
        })
    }

    /// Creates a context and a window surface on `window`, makes them current
    /// and disables vsync-throttled swaps.
    pub(crate) fn create(
        &self,
        window: &WlEglSurface,
    ) -> Result<(egl::Surface, egl::Context), Error> {
        let context = self
            .instance
            .create_context(self.display, self.config, None, &[egl::NONE])
            .map_err(|err| Error::graphics("eglCreateContext", err))?;

        // SAFETY: `window` is a live `wl_egl_window`; the caller keeps it
        // alive until after `destroy` has run on the returned surface.
        let surface = unsafe {
            self.instance.create_window_surface(
                self.display,
                self.config,
                window.ptr() as egl::NativeWindowType,
                None,
            )
        };
        let surface = match surface {
            Ok(surface) => surface,
            Err(err) => {
                let _ = self.instance.destroy_context(self.display, context);
                return Err(Error::graphics("eglCreateWindowSurface", err));
            }
        };

        if let Err(err) = self.make_current(surface, context) {
            self.destroy(surface, context);
            return Err(err);
        }
        if let Err(err) = self.instance.swap_interval(self.display, 0) {
            debug!(error = %err, "eglSwapInterval(0) not honored");
        }
        Ok((surface, context))
    }

    pub(crate) fn make_current(
        &self,
        surface: egl::Surface,
        context: egl::Context,
    ) -> Result<(), Error> {
        self.instance
            .make_current(self.display, Some(surface), Some(surface), Some(context))
            .map_err(|err| Error::graphics("eglMakeCurrent", err))
    }

    /// Posts the back buffer, which commits the underlying `wl_surface`.
    pub(crate) fn swap_buffers(&self, surface: egl::Surface) -> Result<(), egl::Error> {
        self.instance.swap_buffers(self.display, surface)
    }

    /// Unbinds and destroys a session's surface and context.
    pub(crate) fn destroy(&self, surface: egl::Surface, context: egl::Context) {
        let _ = self.instance.make_current(self.display, None, None, None);
        if let Err(err) = self.instance.destroy_surface(self.display, surface) {
            debug!(error = %err, "eglDestroySurface failed");
        }
        if let Err(err) = self.instance.destroy_context(self.display, context) {
            debug!(error = %err, "eglDestroyContext failed");
        }
    }

    /// Resolves GL entry points through `eglGetProcAddress`.
    pub(crate) fn load_gl(&self) {
        gl::load_with(|name| {
            self.instance
                .get_proc_address(name)
                .map_or(core::ptr::null(), |f| f as *const c_void)
        });
    }
}

impl Drop for EglDriver {
    fn drop(&mut self) {
        if let Err(err) = self.instance.terminate(self.display) {
            debug!(error = %err, "eglTerminate failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Platform, select_platform};

    #[test]
    fn khr_extension_is_preferred() {
        let extensions = "EGL_EXT_platform_base EGL_EXT_platform_wayland EGL_KHR_platform_wayland";
        assert_eq!(select_platform(extensions), Some(Platform::Khr));
    }

    #[test]
    fn ext_extension_is_the_fallback() {
        let extensions = "EGL_EXT_client_extensions EGL_EXT_platform_wayland";
        assert_eq!(select_platform(extensions), Some(Platform::Ext));
    }

    #[test]
    fn each_platform_opens_through_its_own_entry_point() {
        assert_eq!(Platform::Khr.entry_point(), "eglGetPlatformDisplay");
        assert_eq!(
            Platform::Ext.entry_point(),
            "eglGetPlatformDisplayEXT",
            "the EXT fallback must not use plain eglGetDisplay"
        );
    }

    #[test]
    fn names_must_match_exactly() {
        assert_eq!(
            select_platform("EGL_KHR_platform_wayland_extra EGL_KHR_platform_x11"),
            None,
            "prefix matches do not count"
        );
        assert_eq!(select_platform(""), None);
    }
}
