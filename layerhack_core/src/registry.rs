// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The output registry and the session state machine.
//!
//! The registry exclusively owns every [`Session`]. Backends feed it protocol
//! events (outputs appearing, being named and disappearing, configure,
//! closed and frame-done events) and the render loop calls
//! [`sweep`](Registry::sweep) once per iteration to advance sessions that are
//! ready.
//!
//! # Operating modes
//!
//! - [`SurfaceMode::PerOutput`]: one session per output that passes the
//!   [`OutputFilter`]. With a filter set, an output is activated as soon as
//!   its name matches and discarded, without ever getting a surface, when it
//!   does not.
//! - [`SurfaceMode::Shared`]: one session. Without a filter it is not pinned
//!   and the compositor places the surface on its preferred output; with a
//!   filter it is pinned to the first output whose name matches.
//!
//! Both modes share the same per-session cycle from `AwaitingConfigure` on.
//!
//! # Invariants
//!
//! - No draw happens before a configure was acknowledged.
//! - At most one frame per session is in flight.
//! - `Hack::free` runs exactly once for every session that reached
//!   [`Phase::Active`], before its GL resources are destroyed.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::backend::SurfaceBackend;
use crate::error::Error;
use crate::hack::{HackContext, HackFactory};
use crate::output::{OutputFilter, OutputGlobal};
use crate::resources::ResourceDb;
use crate::session::{
    BoundOutput, ConfigureChange, FrameToken, Phase, Session, SessionId, SessionStore, Size,
};
use crate::time::HostTime;

/// How outputs map to surfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SurfaceMode {
    /// One surface per (matching) output.
    #[default]
    PerOutput,
    /// One surface on the compositor's preferred output.
    Shared,
}

/// Registry-wide settings.
#[derive(Clone, Debug, Default)]
pub struct RegistryConfig {
    /// How outputs map to surfaces.
    pub mode: SurfaceMode,
    /// Which outputs get a session, or which output the shared surface is
    /// pinned to.
    pub filter: OutputFilter,
    /// Passed to hacks through [`HackContext::mono`].
    pub mono: bool,
    /// Log the frame rate of every session once per second.
    pub do_fps: bool,
}

/// Owns all sessions and advances their state machines.
pub struct Registry<B: SurfaceBackend> {
    config: RegistryConfig,
    factory: Box<dyn HackFactory>,
    resources: ResourceDb,
    sessions: SessionStore<Session<B>>,
    by_global: HashMap<OutputGlobal, SessionId>,
    discovery_complete: bool,
    finished: bool,
    activated: Vec<SessionId>,
    next_token: u64,
}

impl<B: SurfaceBackend> core::fmt::Debug for Registry<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("sessions", &self.sessions.len())
            .field("discovery_complete", &self.discovery_complete)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<B: SurfaceBackend> Registry<B> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(config: RegistryConfig, factory: Box<dyn HackFactory>, resources: ResourceDb) -> Self {
        Self {
            config,
            factory,
            resources,
            sessions: SessionStore::new(),
            by_global: HashMap::new(),
            discovery_complete: false,
            finished: false,
            activated: Vec::new(),
            next_token: 0,
        }
    }

    // -- Output lifecycle --

    /// Records a newly bound output.
    ///
    /// An unfiltered shared surface needs no outputs, so the handle is
    /// released right away. Otherwise a `Discovered` session is created; it is
    /// activated immediately when no filter is set and the initial discovery
    /// is already over, otherwise it waits for its name or for
    /// [`complete_discovery`](Self::complete_discovery).
    pub fn output_added(
        &mut self,
        backend: &mut B,
        global: OutputGlobal,
        output: B::Output,
    ) -> Result<(), Error> {
        if !self.pins_outputs() {
            backend.release_output(output);
            return Ok(());
        }
        if let Some(stale) = self.by_global.get(&global).copied() {
            warn!(?global, "output announced twice; replacing its session");
            self.destroy(backend, stale);
        }

        let id = self.sessions.insert(Session::new(Some(BoundOutput {
            global,
            handle: Some(output),
            name: None,
        })));
        self.by_global.insert(global, id);
        debug!(?id, ?global, "output discovered");

        if self.discovery_complete && !self.config.filter.is_set() {
            self.activate(backend, id)?;
        }
        Ok(())
    }

    /// Applies an output's name, activating or discarding it under a filter.
    pub fn output_named(
        &mut self,
        backend: &mut B,
        global: OutputGlobal,
        name: &str,
    ) -> Result<(), Error> {
        let Some(id) = self.by_global.get(&global).copied() else {
            return Ok(());
        };
        let Some(session) = self.sessions.get_mut(id) else {
            return Ok(());
        };
        if let Some(output) = session.output.as_mut() {
            output.name = Some(name.to_owned());
        }
        debug!(?id, ?global, name, "output named");

        if session.phase != Phase::Discovered || !self.config.filter.is_set() {
            return Ok(());
        }
        if self.config.filter.matches(name) && !self.shared_surface_placed() {
            info!(name, "output matches filter");
            self.activate(backend, id)
        } else {
            debug!(name, "output does not match filter; discarding");
            self.destroy(backend, id);
            Ok(())
        }
    }

    /// Destroys the session of an output that went away.
    pub fn output_removed(&mut self, backend: &mut B, global: OutputGlobal) {
        if let Some(id) = self.by_global.get(&global).copied() {
            info!(?id, ?global, "output removed");
            self.destroy(backend, id);
        }
    }

    /// Ends the initial discovery round.
    ///
    /// Fails with [`Error::OutputNotFound`] when a filter is set and no output
    /// matched it. No surface exists in that case.
    pub fn complete_discovery(&mut self, backend: &mut B) -> Result<(), Error> {
        self.discovery_complete = true;

        if !self.pins_outputs() {
            let id = self.sessions.insert(Session::new(None));
            info!(?id, "using one shared surface");
            return self.activate(backend, id);
        }

        let discovered: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.phase == Phase::Discovered)
            .map(|(id, _)| id)
            .collect();

        if let Some(wanted) = self.config.filter.name().map(str::to_owned) {
            // Anything still undecided never reported a name.
            for id in discovered {
                self.destroy(backend, id);
            }
            if self.sessions.is_empty() {
                return Err(Error::OutputNotFound(wanted));
            }
            return Ok(());
        }

        for id in discovered {
            self.activate(backend, id)?;
        }
        Ok(())
    }

    /// Whether sessions are bound to individual outputs.
    fn pins_outputs(&self) -> bool {
        self.config.mode == SurfaceMode::PerOutput || self.config.filter.is_set()
    }

    /// In shared mode, whether some matching output already got the surface.
    fn shared_surface_placed(&self) -> bool {
        self.config.mode == SurfaceMode::Shared
            && self
                .sessions
                .iter()
                .any(|(_, session)| session.phase != Phase::Discovered)
    }

    fn activate(&mut self, backend: &mut B, id: SessionId) -> Result<(), Error> {
        let Some(session) = self.sessions.get_mut(id) else {
            return Ok(());
        };
        debug_assert_eq!(session.phase, Phase::Discovered, "activated twice");
        let output = session
            .output
            .as_ref()
            .and_then(|output| output.handle.as_ref());
        let surface = backend.create_surface(id, output)?;
        session.surface = Some(surface);
        session.phase = Phase::AwaitingConfigure;
        self.activated.push(id);
        debug!(?id, "layer surface committed; awaiting configure");
        Ok(())
    }

    /// Returns sessions activated since the last call, so the caller can
    /// verify their handshake after a round-trip.
    pub fn take_activated(&mut self) -> Vec<SessionId> {
        core::mem::take(&mut self.activated)
    }

    // -- Layer surface events --

    /// Records a configure event. Stale handles are ignored.
    pub fn configure(&mut self, id: SessionId, serial: u32, proposed: Size) {
        let Some(session) = self.sessions.get_mut(id) else {
            debug!(?id, serial, "configure for a destroyed session");
            return;
        };
        let change = session.negotiation.configure(serial, proposed);
        debug!(?id, serial, ?proposed, ?change, "configure");
        if session.phase == Phase::Active
            && let ConfigureChange::Resized(size) = change
        {
            session.resize_pending = size != session.view;
        }
    }

    /// Acknowledges the newest configure of every session that has one.
    pub fn acknowledge_configures(&mut self, backend: &mut B) {
        for (_, session) in self.sessions.iter_mut() {
            let Some(surface) = session.surface.as_ref() else {
                continue;
            };
            let Some(serial) = session.negotiation.take_ack() else {
                continue;
            };
            backend.ack_configure(surface, serial);
            if session.phase == Phase::AwaitingConfigure {
                session.phase = Phase::Configured;
            }
        }
    }

    /// Checks that every listed session got its first configure.
    ///
    /// Sessions destroyed in the meantime are skipped.
    pub fn ensure_configured(&self, ids: &[SessionId]) -> Result<(), Error> {
        for id in ids {
            if let Some(session) = self.sessions.get(*id)
                && session.phase == Phase::AwaitingConfigure
            {
                return Err(Error::ConfigureMissing(*id));
            }
        }
        Ok(())
    }

    /// Handles the compositor closing a layer surface.
    pub fn closed(&mut self, backend: &mut B, id: SessionId) {
        if !self.sessions.is_alive(id) {
            return;
        }
        info!(?id, "layer surface closed by compositor");
        self.destroy(backend, id);
        if self.config.mode == SurfaceMode::Shared || self.sessions.is_empty() {
            self.finished = true;
        }
    }

    /// Releases the frame gate if `token` is the frame in flight.
    pub fn frame_done(&mut self, id: SessionId, token: FrameToken) {
        if let Some(session) = self.sessions.get_mut(id)
            && session.frame_in_flight == Some(token)
        {
            session.frame_in_flight = None;
        }
    }

    // -- Render loop --

    /// The earliest time any session wants the next sweep.
    ///
    /// A session waiting for GL setup wants it now; a frame-gated session
    /// wants nothing until its frame-done event arrives.
    #[must_use]
    pub fn next_deadline(&self, now: HostTime) -> Option<HostTime> {
        self.sessions
            .iter()
            .filter_map(|(_, session)| match session.phase {
                Phase::Configured => Some(now),
                Phase::Active if session.frame_in_flight.is_none() => {
                    Some(session.pacer.deadline().unwrap_or(now))
                }
                _ => None,
            })
            .min()
    }

    /// Advances every session by one step.
    ///
    /// `Configured` sessions get GL resources, a hack and their first frame.
    /// `Active` sessions redraw if no frame is in flight and their delay has
    /// elapsed. Fatal errors are returned; per-session errors destroy only
    /// that session.
    pub fn sweep(&mut self, backend: &mut B, now: HostTime) -> Result<(), Error> {
        for id in self.sessions.ids() {
            let result = match self.sessions.get(id).map(|session| session.phase) {
                Some(Phase::Configured) => self.start(backend, id, now),
                Some(Phase::Active) => self.redraw(backend, id, now),
                _ => Ok(()),
            };
            if let Err(err) = result {
                if err.is_fatal() {
                    return Err(err);
                }
                warn!(?id, error = %err, "dropping session after frame failure");
                self.destroy(backend, id);
                if self.sessions.is_empty() {
                    self.finished = true;
                }
            }
        }
        Ok(())
    }

    fn start(&mut self, backend: &mut B, id: SessionId, now: HostTime) -> Result<(), Error> {
        let Self {
            sessions,
            factory,
            resources,
            config,
            ..
        } = self;
        let Some(session) = sessions.get_mut(id) else {
            return Ok(());
        };
        let Some(surface) = session.surface.as_ref() else {
            return Ok(());
        };
        debug_assert!(
            session.negotiation.is_acknowledged(),
            "graphics built before a configure was acknowledged"
        );
        let size = session.negotiation.size().unwrap_or(Size::FALLBACK);
        let graphics = backend.create_graphics(surface, size)?;
        session.graphics = Some(graphics);
        session.view = size;
        session.resize_pending = false;

        let ctx = HackContext {
            resources,
            output_name: session.output_name(),
            mono: config.mono,
        };
        let hack = factory.init(&ctx, &session.drawable(id));
        session.hack = Some(hack);
        session.phase = Phase::Active;
        info!(?id, output = ?session.output_name(), ?size, "session active");

        self.draw(backend, id, now)
    }

    fn redraw(&mut self, backend: &mut B, id: SessionId, now: HostTime) -> Result<(), Error> {
        let Self {
            sessions,
            resources,
            config,
            ..
        } = self;
        let Some(session) = sessions.get_mut(id) else {
            return Ok(());
        };
        if session.frame_in_flight.is_some() || !session.pacer.is_due(now) {
            return Ok(());
        }
        let Some(graphics) = session.graphics.as_mut() else {
            return Ok(());
        };
        backend.make_current(graphics)?;

        if session.resize_pending {
            let size = session.negotiation.size().unwrap_or(session.view);
            backend.resize_graphics(graphics, size)?;
            session.view = size;
            session.resize_pending = false;
            session.fps.reset();
            debug!(?id, ?size, "render target rebuilt");

            let drawable = session.drawable(id);
            let ctx = HackContext {
                resources,
                output_name: session.output.as_ref().and_then(|o| o.name.as_deref()),
                mono: config.mono,
            };
            if let Some(hack) = session.hack.as_mut() {
                hack.reshape(&ctx, &drawable, size.width, size.height);
            }
        }

        self.draw(backend, id, now)
    }

    fn draw(&mut self, backend: &mut B, id: SessionId, now: HostTime) -> Result<(), Error> {
        let token = FrameToken(self.next_token);
        self.next_token += 1;

        let Self {
            sessions,
            resources,
            config,
            ..
        } = self;
        let Some(session) = sessions.get_mut(id) else {
            return Ok(());
        };
        let drawable = session.drawable(id);
        let ctx = HackContext {
            resources,
            output_name: session.output.as_ref().and_then(|o| o.name.as_deref()),
            mono: config.mono,
        };
        let (Some(surface), Some(graphics), Some(hack)) = (
            session.surface.as_mut(),
            session.graphics.as_mut(),
            session.hack.as_mut(),
        ) else {
            return Ok(());
        };

        backend.begin_frame(graphics);
        let delay_us = hack.draw(&ctx, &drawable);
        backend.present(id, token, surface, graphics)?;
        session.frame_in_flight = Some(token);
        session.pacer.schedule(now, delay_us);

        session.fps.record(now);
        if config.do_fps
            && let Some(fps) = session.fps.report(now)
        {
            info!(?id, output = ?ctx.output_name, "{fps:.1} fps");
        }
        Ok(())
    }

    // -- Teardown --

    /// Tears one session down in resource order and forgets it.
    ///
    /// The hack is freed first (with its context current), then GL
    /// resources, then the surface, then the output handle.
    pub fn destroy(&mut self, backend: &mut B, id: SessionId) {
        let Some(mut session) = self.sessions.remove(id) else {
            return;
        };
        session.phase = Phase::Closing;
        debug!(?id, "closing session");
        if let Some(global) = session.output_global()
            && self.by_global.get(&global) == Some(&id)
        {
            self.by_global.remove(&global);
        }

        if let Some(hack) = session.hack.take() {
            if let Some(graphics) = session.graphics.as_ref()
                && let Err(err) = backend.make_current(graphics)
            {
                warn!(?id, error = %err, "freeing hack without a current context");
            }
            let ctx = HackContext {
                resources: &self.resources,
                output_name: session.output_name(),
                mono: self.config.mono,
            };
            hack.free(&ctx, &session.drawable(id));
        }
        if let Some(graphics) = session.graphics.take() {
            backend.destroy_graphics(graphics);
        }
        if let Some(surface) = session.surface.take() {
            backend.destroy_surface(surface);
        }
        if let Some(handle) = session.output.and_then(|output| output.handle) {
            backend.release_output(handle);
        }
    }

    /// Destroys every session.
    pub fn shutdown(&mut self, backend: &mut B) {
        for id in self.sessions.ids() {
            self.destroy(backend, id);
        }
    }

    // -- Queries --

    /// Returns the session behind a handle.
    #[must_use]
    pub fn session(&self, id: SessionId) -> Option<&Session<B>> {
        self.sessions.get(id)
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` when no session is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Returns whether the compositor closed the last surface.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
