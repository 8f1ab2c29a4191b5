// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render loop.
//!
//! One thread, one connection. Each iteration waits on the socket for at most
//! the pacing quantum, routes whatever arrived to the registry, acknowledges
//! configures, and sweeps the sessions. The loop ends when the exit-after
//! deadline passes or the registry reports that the compositor closed the
//! last surface; a fatal error ends it early. Every remaining session is
//! torn down before the connection closes, on both paths.

use layerhack_core::Error;
use layerhack_core::hack::HackFactory;
use layerhack_core::options::Settings;
use layerhack_core::pacing::sleep_quantum;
use layerhack_core::registry::{Registry, RegistryConfig, SurfaceMode};
use layerhack_core::resources::ResourceDb;
use layerhack_core::time::HostTime;
use tracing::{debug, info, warn};

use crate::egl::EglDriver;
use crate::event_loop::OwnedQueue;
use crate::events::ProtocolEvent;
use crate::globals::{Globals, bootstrap};
use crate::surface::WaylandBackend;
use crate::time::now;

/// Connects to the compositor and renders `factory`'s hack until shutdown.
///
/// `resources` must already hold the hack defaults, the built-in defaults and
/// the command-line overrides; `settings` is the typed view of the same
/// database.
pub fn run(
    factory: Box<dyn HackFactory>,
    resources: ResourceDb,
    settings: &Settings,
) -> Result<(), Error> {
    let mut driver = Driver::connect(factory, resources, settings)?;
    let result = driver.run(settings.exit_after.map(|after| now() + after));
    driver.shutdown();
    result
}

/// Why the render loop should end cleanly, if it should.
fn stop_reason(now: HostTime, exit_at: Option<HostTime>, finished: bool) -> Option<&'static str> {
    if exit_at.is_some_and(|deadline| now >= deadline) {
        Some("exit-after deadline reached")
    } else if finished {
        Some("compositor closed the last surface")
    } else {
        None
    }
}

// Fields drop in declaration order: EGL terminates before the connection.
struct Driver {
    registry: Registry<WaylandBackend>,
    backend: WaylandBackend,
    queue: OwnedQueue,
    globals: Globals,
}

impl Driver {
    fn connect(
        factory: Box<dyn HackFactory>,
        resources: ResourceDb,
        settings: &Settings,
    ) -> Result<Self, Error> {
        let (globals, queue) = bootstrap(settings.output.is_set())?;
        let egl = EglDriver::new(&globals.connection)?;
        let backend = WaylandBackend::new(
            globals.compositor.clone(),
            globals.layer_shell.clone(),
            queue.queue_handle(),
            egl,
            resources.progname(),
        );

        if settings.record_anim > 0 {
            warn!(
                frames = settings.record_anim,
                "animation recording is not supported; rendering normally"
            );
        }
        let config = RegistryConfig {
            mode: if settings.one_surface {
                SurfaceMode::Shared
            } else {
                SurfaceMode::PerOutput
            },
            filter: settings.output.clone(),
            mono: settings.mono,
            do_fps: settings.do_fps,
        };
        debug!(?config, "registry configured");

        Ok(Self {
            registry: Registry::new(config, factory, resources),
            backend,
            queue,
            globals,
        })
    }

    fn run(&mut self, exit_at: Option<HostTime>) -> Result<(), Error> {
        // Output names arrive in reply to the binds made during bootstrap.
        self.queue.roundtrip().map_err(Error::connection)?;
        self.route_pending()?;
        self.registry.complete_discovery(&mut self.backend)?;
        self.check_handshakes()?;
        info!(sessions = self.registry.len(), "discovery complete");

        loop {
            let now = now();
            if let Some(reason) = stop_reason(now, exit_at, self.registry.is_finished()) {
                info!("{reason}");
                return Ok(());
            }

            let next = match (self.registry.next_deadline(now), exit_at) {
                (Some(session), Some(exit)) => Some(session.min(exit)),
                (session, exit) => session.or(exit),
            };
            let wait = sleep_quantum(now, next);
            self.queue
                .dispatch_timeout(wait)
                .map_err(Error::connection)?;
            self.route_pending()?;
            self.check_handshakes()?;
            self.registry.sweep(&mut self.backend, crate::time::now())?;
        }
    }

    /// Routes every recorded event, then acknowledges the newest configure
    /// of each session.
    fn route_pending(&mut self) -> Result<(), Error> {
        for event in self.queue.state_mut().drain() {
            self.route(event)?;
        }
        self.registry.acknowledge_configures(&mut self.backend);
        Ok(())
    }

    fn route(&mut self, event: ProtocolEvent) -> Result<(), Error> {
        let backend = &mut self.backend;
        match event {
            ProtocolEvent::OutputAdded { global, output } => {
                self.registry.output_added(backend, global, output)?;
            }
            ProtocolEvent::OutputNamed { global, name } => {
                self.registry.output_named(backend, global, &name)?;
            }
            ProtocolEvent::OutputRemoved(global) => {
                self.registry.output_removed(backend, global);
            }
            ProtocolEvent::Configure {
                session,
                serial,
                size,
            } => self.registry.configure(session, serial, size),
            ProtocolEvent::Closed(session) => self.registry.closed(backend, session),
            ProtocolEvent::FrameDone(tag) => self.registry.frame_done(tag.session, tag.token),
        }
        Ok(())
    }

    /// Round-trips after activations and fails if a new layer surface was
    /// not configured in reply to its initial commit.
    fn check_handshakes(&mut self) -> Result<(), Error> {
        loop {
            let activated = self.registry.take_activated();
            if activated.is_empty() {
                return Ok(());
            }
            self.queue.roundtrip().map_err(Error::connection)?;
            self.route_pending()?;
            self.registry.ensure_configured(&activated)?;
        }
    }

    fn shutdown(&mut self) {
        self.registry.shutdown(&mut self.backend);
        if let Err(err) = self.globals.connection.flush() {
            debug!(error = %err, "final flush failed");
        }
        info!("shut down");
    }
}

#[cfg(test)]
mod tests {
    use layerhack_core::time::{Duration, HostTime};

    use super::stop_reason;

    #[test]
    fn exit_after_deadline_stops_the_loop() {
        let start = HostTime(1_000);
        let exit_at = Some(start + Duration::from_secs(30));
        assert_eq!(stop_reason(start, exit_at, false), None, "deadline ahead");
        assert_eq!(
            stop_reason(start + Duration::from_secs(30), exit_at, false),
            Some("exit-after deadline reached"),
            "deadline is inclusive"
        );
        assert_eq!(stop_reason(HostTime(u64::MAX), None, false), None, "no deadline set");
    }

    #[test]
    fn closed_registry_stops_the_loop() {
        assert_eq!(
            stop_reason(HostTime(0), None, true),
            Some("compositor closed the last surface")
        );
        assert_eq!(
            stop_reason(HostTime(5), Some(HostTime(5)), true),
            Some("exit-after deadline reached"),
            "deadline reported first"
        );
    }
}
