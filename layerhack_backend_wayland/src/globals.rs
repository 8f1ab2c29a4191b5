// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Connection bootstrap: connect, bind the required globals, bind outputs.

use layerhack_core::Error;
use tracing::{debug, info};
use wayland_client::globals::{BindError, GlobalError, GlobalList, registry_queue_init};
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::{ConnectError, Connection, Proxy, QueueHandle};
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_shell_v1::ZwlrLayerShellV1;

use crate::event_loop::OwnedQueue;
use crate::events::WaylandState;

/// Why the connection could not be brought up.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// No compositor socket could be opened.
    #[error("cannot connect to the wayland display")]
    Connect(#[from] ConnectError),
    /// The initial registry round-trip failed.
    #[error("initial registry round-trip failed")]
    Registry(#[from] GlobalError),
    /// A required global is missing or too old.
    #[error("compositor does not support `{interface}`")]
    Missing {
        /// Interface name of the global.
        interface: &'static str,
        /// Why binding failed.
        #[source]
        source: BindError,
    },
}

impl From<BootstrapError> for Error {
    fn from(err: BootstrapError) -> Self {
        match err {
            BootstrapError::Missing { interface, .. } => Self::MissingGlobal(interface),
            other => Self::connection(other),
        }
    }
}

/// The shared, read-only part of the connection.
#[derive(Debug)]
pub struct Globals {
    /// The display connection.
    pub connection: Connection,
    /// Surface factory.
    pub compositor: WlCompositor,
    /// Layered-surface factory.
    pub layer_shell: ZwlrLayerShellV1,
}

/// Connects to `$WAYLAND_DISPLAY`, binds `wl_compositor` and
/// `zwlr_layer_shell_v1`, and binds every output already announced.
///
/// Bound outputs are queued as `OutputAdded` events in the returned queue's
/// state, so the driver sees them like later hot-plugged outputs. With
/// `require_output_names`, outputs older than `wl_output` v4 are skipped.
pub fn bootstrap(require_output_names: bool) -> Result<(Globals, OwnedQueue), BootstrapError> {
    let connection = Connection::connect_to_env()?;
    let (globals, event_queue) = registry_queue_init::<WaylandState>(&connection)?;
    let qh = event_queue.handle();

    let compositor = globals
        .bind::<WlCompositor, _, _>(&qh, 1..=4, ())
        .map_err(|source| BootstrapError::Missing {
            interface: "wl_compositor",
            source,
        })?;
    let layer_shell = globals
        .bind::<ZwlrLayerShellV1, _, _>(&qh, 1..=4, ())
        .map_err(|source| BootstrapError::Missing {
            interface: "zwlr_layer_shell_v1",
            source,
        })?;
    debug!(
        compositor = compositor.version(),
        layer_shell = layer_shell.version(),
        "bound required globals"
    );

    let mut state = WaylandState::new(require_output_names);
    bind_outputs(&globals, &mut state, &qh);
    info!(outputs = state.events.len(), "connected to compositor");

    Ok((
        Globals {
            connection,
            compositor,
            layer_shell,
        },
        OwnedQueue::new(event_queue, state),
    ))
}

fn bind_outputs(
    globals: &GlobalList,
    state: &mut WaylandState,
    qh: &QueueHandle<WaylandState>,
) {
    let outputs: Vec<(u32, u32)> = globals.contents().with_list(|list| {
        list.iter()
            .filter(|global| global.interface == "wl_output")
            .map(|global| (global.name, global.version))
            .collect()
    });
    for (name, version) in outputs {
        state.bind_output(globals.registry(), name, version, qh);
    }
}
