// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Protocol listeners, flattened into one tagged event stream.
//!
//! Every `Dispatch` impl here only records what happened; the driver drains
//! [`WaylandState::events`] after each dispatch and routes the events to the
//! registry in arrival order. Each proxy carries the identity the driver
//! needs as its user data:
//!
//! | Object | User data |
//! |---|---|
//! | `wl_output` | [`OutputGlobal`] |
//! | `zwlr_layer_surface_v1` | [`SessionId`] |
//! | `wl_callback` (frame) | [`FrameTag`] |

use layerhack_core::output::OutputGlobal;
use layerhack_core::session::{FrameToken, SessionId, Size};
use tracing::{debug, warn};
use wayland_client::globals::GlobalListContents;
use wayland_client::protocol::{wl_callback, wl_compositor, wl_output, wl_registry, wl_surface};
use wayland_client::{Connection, Dispatch, QueueHandle, delegate_noop};
use wayland_protocols_wlr::layer_shell::v1::client::{zwlr_layer_shell_v1, zwlr_layer_surface_v1};

/// Highest `wl_output` version we bind. Version 4 added the `name` event.
pub(crate) const OUTPUT_VERSION: u32 = 4;

/// The version to bind an output at, or `None` to leave it unbound.
///
/// Outputs without the `name` event can never match a name filter, so they
/// are only bound when no filter is set.
pub(crate) fn output_bind_version(advertised: u32, require_names: bool) -> Option<u32> {
    if advertised < OUTPUT_VERSION && require_names {
        None
    } else {
        Some(advertised.min(OUTPUT_VERSION))
    }
}

/// Identifies the frame a frame callback belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FrameTag {
    pub(crate) session: SessionId,
    pub(crate) token: FrameToken,
}

/// One compositor event, already tagged with the object it concerns.
#[derive(Debug)]
pub(crate) enum ProtocolEvent {
    OutputAdded {
        global: OutputGlobal,
        output: wl_output::WlOutput,
    },
    OutputNamed {
        global: OutputGlobal,
        name: String,
    },
    OutputRemoved(OutputGlobal),
    Configure {
        session: SessionId,
        serial: u32,
        size: Size,
    },
    Closed(SessionId),
    FrameDone(FrameTag),
}

/// Backend-owned dispatch state.
#[derive(Debug, Default)]
pub struct WaylandState {
    pub(crate) events: Vec<ProtocolEvent>,
    require_output_names: bool,
}

impl WaylandState {
    /// Creates an empty state.
    ///
    /// With `require_output_names`, outputs too old to report a name are
    /// skipped.
    #[must_use]
    pub const fn new(require_output_names: bool) -> Self {
        Self {
            events: Vec::new(),
            require_output_names,
        }
    }

    /// Takes every event recorded since the last call.
    pub(crate) fn drain(&mut self) -> Vec<ProtocolEvent> {
        core::mem::take(&mut self.events)
    }

    /// Binds an output announced by the registry and records it.
    pub(crate) fn bind_output(
        &mut self,
        registry: &wl_registry::WlRegistry,
        name: u32,
        version: u32,
        qh: &QueueHandle<Self>,
    ) {
        let global = OutputGlobal(name);
        let Some(bind_version) = output_bind_version(version, self.require_output_names) else {
            warn!(?global, version, "skipping wl_output without a name event");
            return;
        };
        if bind_version < OUTPUT_VERSION {
            warn!(?global, version, "wl_output has no name event");
        }
        let output = registry.bind::<wl_output::WlOutput, _, _>(name, bind_version, qh, global);
        debug!(?global, version = bind_version, "bound wl_output");
        self.events.push(ProtocolEvent::OutputAdded { global, output });
    }
}

impl Dispatch<wl_registry::WlRegistry, GlobalListContents> for WaylandState {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _: &GlobalListContents,
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } if interface == "wl_output" => {
                state.bind_output(registry, name, version, qh);
            }
            wl_registry::Event::GlobalRemove { name } => {
                // Removal of non-output globals is ignored by the registry.
                state
                    .events
                    .push(ProtocolEvent::OutputRemoved(OutputGlobal(name)));
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_output::WlOutput, OutputGlobal> for WaylandState {
    fn event(
        state: &mut Self,
        _: &wl_output::WlOutput,
        event: wl_output::Event,
        global: &OutputGlobal,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_output::Event::Name { name } = event {
            state.events.push(ProtocolEvent::OutputNamed {
                global: *global,
                name,
            });
        }
    }
}

impl Dispatch<zwlr_layer_surface_v1::ZwlrLayerSurfaceV1, SessionId> for WaylandState {
    fn event(
        state: &mut Self,
        _: &zwlr_layer_surface_v1::ZwlrLayerSurfaceV1,
        event: zwlr_layer_surface_v1::Event,
        session: &SessionId,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            zwlr_layer_surface_v1::Event::Configure {
                serial,
                width,
                height,
            } => state.events.push(ProtocolEvent::Configure {
                session: *session,
                serial,
                size: Size::new(width, height),
            }),
            zwlr_layer_surface_v1::Event::Closed => {
                state.events.push(ProtocolEvent::Closed(*session));
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_callback::WlCallback, FrameTag> for WaylandState {
    fn event(
        state: &mut Self,
        _: &wl_callback::WlCallback,
        event: wl_callback::Event,
        tag: &FrameTag,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_callback::Event::Done { .. } = event {
            state.events.push(ProtocolEvent::FrameDone(*tag));
        }
    }
}

delegate_noop!(WaylandState: ignore wl_compositor::WlCompositor);
delegate_noop!(WaylandState: ignore wl_surface::WlSurface);
delegate_noop!(WaylandState: ignore zwlr_layer_shell_v1::ZwlrLayerShellV1);

#[cfg(test)]
mod tests {
    use super::{ProtocolEvent, WaylandState, output_bind_version};
    use layerhack_core::output::OutputGlobal;

    #[test]
    fn unnamed_outputs_are_skipped_only_under_a_filter() {
        assert_eq!(output_bind_version(3, true), None, "cannot match a filter");
        assert_eq!(output_bind_version(3, false), Some(3), "usable without a filter");
        assert_eq!(output_bind_version(4, true), Some(4));
        assert_eq!(output_bind_version(9, true), Some(4), "capped at the known version");
    }

    #[test]
    fn drain_empties_the_queue_in_order() {
        let mut state = WaylandState::new(false);
        state.events.push(ProtocolEvent::OutputRemoved(OutputGlobal(3)));
        state.events.push(ProtocolEvent::OutputNamed {
            global: OutputGlobal(4),
            name: "DP-1".into(),
        });

        let drained = state.drain();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], ProtocolEvent::OutputRemoved(OutputGlobal(3))));
        assert!(state.drain().is_empty(), "second drain sees nothing");
    }
}
