// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-output session state.
//!
//! A *session* is one output's rendering pipeline: an optional bound output,
//! a layer surface, a GL context with its off-screen render target, and one
//! hack instance. Sessions move through these phases:
//!
//! ```text
//!   Discovered ──activate──► AwaitingConfigure ──ack──► Configured
//!                                                          │ first sweep
//!                                                          ▼
//!                         Closing ◄──closed/removed──── Active ◄─┐
//!                            │                            │      │ frame done
//!                            ▼                            └──────┘
//!                        (removed)
//! ```
//!
//! The transitions themselves are driven by the
//! [`Registry`](crate::registry::Registry); this module holds the data.

mod id;
mod negotiation;
mod store;

use core::fmt;

use crate::backend::SurfaceBackend;
use crate::fps::FpsMeter;
use crate::hack::{Drawable, Hack, View};
use crate::output::OutputGlobal;
use crate::pacing::Pacer;

pub use id::{FrameToken, SessionId};
pub use negotiation::{ConfigureChange, Negotiation, Size};
pub use store::SessionStore;

/// Lifecycle phase of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The output is known but no surface exists yet.
    Discovered,
    /// The layer surface is committed; no configure has been acknowledged.
    AwaitingConfigure,
    /// A configure was acknowledged; GL resources are built on the next
    /// sweep.
    Configured,
    /// GL resources and the hack exist; frames are being drawn.
    Active,
    /// Resources are being torn down.
    Closing,
}

/// The output a session is pinned to.
pub(crate) struct BoundOutput<O> {
    pub(crate) global: OutputGlobal,
    pub(crate) handle: Option<O>,
    pub(crate) name: Option<String>,
}

/// One output's rendering pipeline.
pub struct Session<B: SurfaceBackend> {
    pub(crate) output: Option<BoundOutput<B::Output>>,
    pub(crate) phase: Phase,
    pub(crate) negotiation: Negotiation,
    pub(crate) surface: Option<B::Surface>,
    pub(crate) graphics: Option<B::Graphics>,
    pub(crate) hack: Option<Box<dyn Hack>>,
    pub(crate) view: Size,
    pub(crate) resize_pending: bool,
    pub(crate) frame_in_flight: Option<FrameToken>,
    pub(crate) pacer: Pacer,
    pub(crate) fps: FpsMeter,
}

impl<B: SurfaceBackend> Session<B> {
    pub(crate) fn new(output: Option<BoundOutput<B::Output>>) -> Self {
        Self {
            output,
            phase: Phase::Discovered,
            negotiation: Negotiation::default(),
            surface: None,
            graphics: None,
            hack: None,
            view: Size::default(),
            resize_pending: false,
            frame_in_flight: None,
            pacer: Pacer::default(),
            fps: FpsMeter::default(),
        }
    }

    /// The current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The output name, once the compositor has sent it.
    #[must_use]
    pub fn output_name(&self) -> Option<&str> {
        self.output.as_ref()?.name.as_deref()
    }

    /// The output global this session is pinned to, if any.
    #[must_use]
    pub fn output_global(&self) -> Option<OutputGlobal> {
        self.output.as_ref().map(|output| output.global)
    }

    /// The size the hack currently renders at.
    #[must_use]
    pub fn view(&self) -> Size {
        self.view
    }

    /// Returns whether a resize will be applied before the next draw.
    #[must_use]
    pub fn resize_pending(&self) -> bool {
        self.resize_pending
    }

    pub(crate) fn drawable(&self, id: SessionId) -> Drawable {
        Drawable::Window {
            session: id,
            view: View::covering(self.view),
        }
    }
}

impl<B: SurfaceBackend> fmt::Debug for Session<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("output", &self.output_global())
            .field("name", &self.output_name())
            .field("phase", &self.phase)
            .field("view", &self.view)
            .field("frame_in_flight", &self.frame_in_flight)
            .finish_non_exhaustive()
    }
}
