// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error taxonomy shared by the registry and the backends.

use crate::session::SessionId;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Everything that can go wrong while bringing up or running sessions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connecting to, or talking over, the display connection failed.
    #[error("display connection failed")]
    Connection(#[source] BoxError),
    /// The compositor does not advertise a global we cannot work without.
    #[error("compositor does not support `{0}`")]
    MissingGlobal(&'static str),
    /// A name filter was given but no output carries that name.
    #[error("no output named `{0}`")]
    OutputNotFound(String),
    /// A layer surface was committed but the compositor never configured it.
    #[error("compositor never configured the surface of {0:?}")]
    ConfigureMissing(SessionId),
    /// Creating a surface or GL resource failed.
    #[error("{stage} failed")]
    Graphics {
        /// Which step failed, e.g. `"eglCreateContext"`.
        stage: &'static str,
        /// The underlying driver error.
        #[source]
        source: BoxError,
    },
    /// Submitting a frame for one session failed.
    #[error("frame submission for {session:?} failed")]
    Present {
        /// The affected session.
        session: SessionId,
        /// The underlying driver error.
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Wraps a driver error raised during graphics setup.
    pub fn graphics(stage: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Graphics {
            stage,
            source: source.into(),
        }
    }

    /// Wraps a connection-level error.
    pub fn connection(source: impl Into<BoxError>) -> Self {
        Self::Connection(source.into())
    }

    /// Returns whether the error must end the process.
    ///
    /// Only frame submission failures are contained to their session; every
    /// other error means the compositor/driver combination is unusable.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Present { .. })
    }
}
