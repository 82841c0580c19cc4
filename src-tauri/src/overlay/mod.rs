//! Annotation overlay domain: placement geometry, dismiss rules and the
//! window controller.

pub mod controller;
pub mod input;
pub mod placement;
mod window;

pub use controller::{
    OverlayController, OverlayError, OverlayPayload, OverlayPhase, OverlayState, OverlaySurface,
    Prepared, Viewport,
};
pub use input::OverlayInput;
pub use placement::{place, Anchor, Bubble, Placement};
pub use window::{TauriOverlaySurface, OVERLAY_LABEL};

/// The controller as managed by the running app.
pub type AppOverlay = OverlayController<TauriOverlaySurface>;
