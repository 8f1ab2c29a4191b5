// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event-queue ownership and socket pumping.
//!
//! The backend owns one `EventQueue<WaylandState>`; every proxy that emits
//! events the driver cares about is created with [`OwnedQueue::queue_handle`].
//!
//! ```text
//! driver iteration
//! ----------------
//! dispatch_pending()             run handlers for already-read events
//! flush()                        send queued requests
//! prepare_read() ──► poll(fd, quantum) ──► read()
//! dispatch_pending()             handlers push ProtocolEvents
//! state_mut().drain()            driver routes them to the registry
//! ```
//!
//! Using the wrong queue handle causes silent non-delivery of events.

use std::io::ErrorKind;

use layerhack_core::time::Duration;
use rustix::event::{PollFd, PollFlags, poll};
use rustix::io::Errno;
use tracing::trace;
use wayland_client::backend::WaylandError;
use wayland_client::{DispatchError, EventQueue, QueueHandle};

use crate::events::WaylandState;
use crate::time::duration_to_timespec;

/// Failure while moving protocol traffic.
#[derive(Debug, thiserror::Error)]
pub enum PumpError {
    /// Writing requests or reading events failed.
    #[error("wayland socket I/O failed")]
    Wayland(#[from] WaylandError),
    /// A handler rejected an event, usually a protocol error.
    #[error("event dispatch failed")]
    Dispatch(#[from] DispatchError),
    /// Waiting on the socket failed.
    #[error("poll on the wayland socket failed")]
    Poll(#[from] Errno),
}

/// Backend-owned event queue together with the state it dispatches into.
#[derive(Debug)]
pub struct OwnedQueue {
    event_queue: EventQueue<WaylandState>,
    state: WaylandState,
}

impl OwnedQueue {
    /// Wraps an existing queue.
    #[must_use]
    pub fn new(event_queue: EventQueue<WaylandState>, state: WaylandState) -> Self {
        Self { event_queue, state }
    }

    /// Returns the queue handle that must be used for all backend-relevant
    /// object creation.
    #[must_use]
    pub fn queue_handle(&self) -> QueueHandle<WaylandState> {
        self.event_queue.handle()
    }

    /// Dispatches already-queued events without blocking.
    ///
    /// Only runs handlers for events that have already been read from the
    /// socket; it performs no I/O by itself.
    pub fn dispatch_pending(&mut self) -> Result<usize, DispatchError> {
        self.event_queue.dispatch_pending(&mut self.state)
    }

    /// Blocks until the compositor has processed every request sent so far,
    /// dispatching everything that arrives meanwhile.
    pub fn roundtrip(&mut self) -> Result<usize, DispatchError> {
        self.event_queue.roundtrip(&mut self.state)
    }

    /// Flushes pending outgoing requests to the socket.
    pub fn flush(&self) -> Result<(), WaylandError> {
        self.event_queue.flush()
    }

    /// Flushes, waits up to `timeout` for the socket to become readable,
    /// reads what arrived and dispatches it.
    ///
    /// Interruption by a signal and a spurious wakeup are not errors; they
    /// just end the wait early.
    pub fn dispatch_timeout(&mut self, timeout: Duration) -> Result<usize, PumpError> {
        let mut dispatched = self.dispatch_pending()?;
        match self.flush() {
            Ok(()) => {}
            // The socket buffer is full; the next iteration retries.
            Err(WaylandError::Io(err)) if err.kind() == ErrorKind::WouldBlock => {}
            Err(err) => return Err(err.into()),
        }

        let Some(guard) = self.event_queue.prepare_read() else {
            // Events were queued between dispatch and prepare_read.
            return Ok(dispatched + self.dispatch_pending()?);
        };

        let timespec = duration_to_timespec(timeout);
        let readable = {
            let fd = guard.connection_fd();
            let mut fds = [PollFd::new(&fd, PollFlags::IN)];
            socket_readable(poll(&mut fds, Some(&timespec)))?
        };

        if readable {
            match guard.read() {
                Ok(_) => {}
                Err(WaylandError::Io(err)) if read_retryable(err.kind()) => {}
                Err(err) => return Err(err.into()),
            }
        } else {
            drop(guard);
        }

        dispatched += self.dispatch_pending()?;
        Ok(dispatched)
    }

    /// Returns a mutable reference to the dispatch state.
    pub fn state_mut(&mut self) -> &mut WaylandState {
        &mut self.state
    }
}

/// Interprets a `poll` result. A signal ends the wait with nothing to read.
fn socket_readable(polled: Result<usize, Errno>) -> Result<bool, Errno> {
    match polled {
        Ok(ready) => Ok(ready > 0),
        Err(Errno::INTR) => {
            trace!("poll interrupted by a signal");
            Ok(false)
        }
        Err(errno) => Err(errno),
    }
}

/// Read failures that only mean "try again next iteration".
fn read_retryable(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::WouldBlock | ErrorKind::Interrupted)
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use rustix::io::Errno;

    use super::{read_retryable, socket_readable};

    #[test]
    fn interrupted_poll_is_a_timeout() {
        assert_eq!(socket_readable(Err(Errno::INTR)), Ok(false), "EINTR swallowed");
        assert_eq!(socket_readable(Ok(0)), Ok(false), "timed out");
        assert_eq!(socket_readable(Ok(1)), Ok(true));
        assert_eq!(socket_readable(Err(Errno::BADF)), Err(Errno::BADF), "real failure");
    }

    #[test]
    fn only_transient_read_errors_are_retried() {
        assert!(read_retryable(ErrorKind::WouldBlock));
        assert!(read_retryable(ErrorKind::Interrupted));
        assert!(!read_retryable(ErrorKind::BrokenPipe), "compositor went away");
    }
}
