// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Output sessions, frame pacing and resource lookup for layer-shell screen
//! hacks.
//!
//! `layerhack_core` holds everything about rendering a hack onto compositor
//! outputs that does not depend on a live display connection. The Wayland
//! specifics live in `layerhack_backend_wayland`, which implements the
//! [`SurfaceBackend`](backend::SurfaceBackend) seam defined here.
//!
//! # Architecture
//!
//! ```text
//!   compositor events (output / layer surface / frame callback)
//!       │
//!       ▼
//!   Registry ──► Session state machine ──► SurfaceBackend
//!       │              │                     (surfaces, GL, commits)
//!       │              ▼
//!       │          Box<dyn Hack>  (init / draw / reshape / free)
//!       ▼
//!   pacing::sleep_quantum() ──► driver waits for I/O or the next deadline
//! ```
//!
//! **[`registry`]**: Owns every [`Session`](session::Session) in a
//! generational arena, applies the output-name filter and drives the
//! `Discovered → AwaitingConfigure → Configured → Active → Closing` cycle.
//!
//! **[`session`]**: Per-output state: identity, configure negotiation,
//! frame gating and the hack instance.
//!
//! **[`backend`]**: The [`SurfaceBackend`](backend::SurfaceBackend) trait
//! that platform backends implement to create surfaces and GL resources.
//!
//! **[`hack`]**: The capability interface every hack implements.
//!
//! **[`pacing`]** and **[`fps`]**: Frame-rate limiting and sampling.
//!
//! **[`resources`]** and **[`options`]**: The resource database and the
//! command-line flag table that feeds it.

pub mod backend;
pub mod error;
pub mod fps;
pub mod hack;
pub mod options;
pub mod output;
pub mod pacing;
pub mod registry;
pub mod resources;
pub mod session;
pub mod time;

pub use error::Error;
