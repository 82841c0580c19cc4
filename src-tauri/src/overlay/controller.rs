//! Lifecycle of the single annotation overlay window.
//!
//! The window is created lazily on first `show`, hidden (not destroyed) on
//! `hide`, and recreated if its host closed it. All transitions run under
//! one async lock, so two `show` calls never interleave mid-transition.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex};

use super::input::OverlayInput;
use super::placement::{place, Placement};
use crate::backend::BoundingBox;

/// Upper bound on waiting for a freshly created window's content to report
/// it is listening.
const READY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    Unshown,
    Shown,
    /// Closed by its host; the next `show` builds a new window.
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Outcome of readying the window for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prepared {
    pub viewport: Viewport,
    /// A new window was built (as opposed to reusing a hidden one).
    pub created: bool,
}

/// What the overlay content is currently displaying.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayState {
    pub visible: bool,
    pub active_bbox: Option<BoundingBox>,
    pub annotation_text: String,
}

/// Pushed to the overlay content on every `show`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayPayload {
    pub bbox: BoundingBox,
    pub text: String,
    pub placement: Placement,
}

/// The windowing operations the controller drives.
pub trait OverlaySurface {
    /// Create the window if missing, sized to cover the primary display.
    fn prepare(&self) -> Result<Prepared, OverlayError>;
    fn show(&self) -> Result<(), OverlayError>;
    /// Blank the content so a reused window starts empty.
    fn clear(&self) -> Result<(), OverlayError>;
    fn hide(&self) -> Result<(), OverlayError>;
    fn deliver(&self, payload: &OverlayPayload) -> Result<(), OverlayError>;
}

struct Inner {
    phase: OverlayPhase,
    viewport: Option<Viewport>,
    state: OverlayState,
}

pub struct OverlayController<S> {
    surface: S,
    delivery_delay: Duration,
    /// Set by the content page of the current window; cleared before a
    /// window is (re)built so a late signal from an old page is not reused.
    ready: watch::Sender<bool>,
    inner: Mutex<Inner>,
}

impl<S: OverlaySurface> OverlayController<S> {
    pub fn new(surface: S, delivery_delay: Duration) -> Self {
        Self {
            surface,
            delivery_delay,
            ready: watch::Sender::new(false),
            inner: Mutex::new(Inner {
                phase: OverlayPhase::Unshown,
                viewport: None,
                state: OverlayState::default(),
            }),
        }
    }

    /// Highlight `bbox` with `text`.
    ///
    /// From `Unshown`/`Destroyed` the window is readied and shown first;
    /// when already `Shown` the content is replaced in place.
    pub async fn show(&self, bbox: BoundingBox, text: &str) -> Result<Placement, OverlayError> {
        let mut inner = self.inner.lock().await;

        let viewport = match (inner.phase, inner.viewport) {
            (OverlayPhase::Shown, Some(viewport)) => viewport,
            (from, _) => {
                self.ready.send_replace(false);
                let prepared = self.surface.prepare()?;
                self.surface.show()?;
                inner.phase = OverlayPhase::Shown;
                inner.viewport = Some(prepared.viewport);

                log::info!(
                    "[OVERLAY] {:?} -> Shown ({} window, {}x{})",
                    from,
                    if prepared.created { "new" } else { "reused" },
                    prepared.viewport.width,
                    prepared.viewport.height
                );

                self.wait_until_ready(prepared.created).await;
                prepared.viewport
            }
        };

        let placement = place(bbox, viewport.width, viewport.height);
        inner.state = OverlayState {
            visible: true,
            active_bbox: Some(bbox),
            annotation_text: text.to_string(),
        };

        self.surface.deliver(&OverlayPayload {
            bbox,
            text: text.to_string(),
            placement,
        })?;

        log::debug!("[OVERLAY] Delivered box, bubble {:?}", placement.bubble.anchor);
        Ok(placement)
    }

    /// Hide without destroying. No-op unless `Shown`.
    pub async fn hide(&self) -> Result<(), OverlayError> {
        let mut inner = self.inner.lock().await;
        self.hide_locked(&mut inner)
    }

    /// Apply input forwarded from the overlay content. Returns whether the
    /// overlay was dismissed.
    pub async fn dismiss(&self, input: &OverlayInput) -> Result<bool, OverlayError> {
        let mut inner = self.inner.lock().await;
        if inner.phase != OverlayPhase::Shown
            || !input.dismisses(inner.state.active_bbox.as_ref())
        {
            return Ok(false);
        }
        self.hide_locked(&mut inner)?;
        Ok(true)
    }

    /// The host closed the window underneath us.
    pub async fn mark_destroyed(&self) {
        let mut inner = self.inner.lock().await;
        log::info!("[OVERLAY] {:?} -> Destroyed", inner.phase);
        inner.phase = OverlayPhase::Destroyed;
        inner.viewport = None;
        inner.state = OverlayState::default();
    }

    /// Called by the overlay content once it listens for data.
    pub fn signal_ready(&self) {
        self.ready.send_replace(true);
    }

    pub async fn phase(&self) -> OverlayPhase {
        self.inner.lock().await.phase
    }

    pub async fn state(&self) -> OverlayState {
        self.inner.lock().await.state.clone()
    }

    fn hide_locked(&self, inner: &mut Inner) -> Result<(), OverlayError> {
        if inner.phase != OverlayPhase::Shown {
            return Ok(());
        }
        if let Err(e) = self.surface.clear() {
            log::warn!("[OVERLAY] Could not clear content: {}", e);
        }
        self.surface.hide()?;
        inner.phase = OverlayPhase::Unshown;
        inner.viewport = None;
        inner.state = OverlayState::default();
        log::info!("[OVERLAY] Shown -> Unshown");
        Ok(())
    }

    async fn wait_until_ready(&self, created: bool) {
        if created {
            let mut ready = self.ready.subscribe();
            let signalled = matches!(
                tokio::time::timeout(READY_TIMEOUT, ready.wait_for(|r| *r)).await,
                Ok(Ok(_))
            );
            if !signalled {
                log::warn!(
                    "[OVERLAY] No ready signal within {}ms, delivering anyway",
                    READY_TIMEOUT.as_millis()
                );
            }
        }
        // Race-avoidance heuristic: give the window time to become visible
        // before the content starts measuring geometry.
        if !self.delivery_delay.is_zero() {
            tokio::time::sleep(self.delivery_delay).await;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("No primary monitor to cover")]
    NoPrimaryMonitor,

    #[error("Overlay window operation failed: {0}")]
    Window(String),

    #[error("Failed to deliver overlay data: {0}")]
    Delivery(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Prepare { created: bool },
        Show,
        Clear,
        Hide,
        Deliver([f64; 4], String),
    }

    #[derive(Default)]
    struct Log {
        calls: Vec<Call>,
        window_alive: bool,
        fail_prepare: bool,
    }

    #[derive(Clone, Default)]
    struct FakeSurface(Arc<StdMutex<Log>>);

    impl FakeSurface {
        fn calls(&self) -> Vec<Call> {
            self.0.lock().unwrap().calls.clone()
        }

        fn close_window(&self) {
            self.0.lock().unwrap().window_alive = false;
        }
    }

    impl OverlaySurface for FakeSurface {
        fn prepare(&self) -> Result<Prepared, OverlayError> {
            let mut log = self.0.lock().unwrap();
            if log.fail_prepare {
                return Err(OverlayError::Window("no compositor".into()));
            }
            let created = !log.window_alive;
            log.window_alive = true;
            log.calls.push(Call::Prepare { created });
            Ok(Prepared {
                viewport: Viewport { width: 1920.0, height: 1080.0 },
                created,
            })
        }

        fn show(&self) -> Result<(), OverlayError> {
            self.0.lock().unwrap().calls.push(Call::Show);
            Ok(())
        }

        fn clear(&self) -> Result<(), OverlayError> {
            self.0.lock().unwrap().calls.push(Call::Clear);
            Ok(())
        }

        fn hide(&self) -> Result<(), OverlayError> {
            self.0.lock().unwrap().calls.push(Call::Hide);
            Ok(())
        }

        fn deliver(&self, payload: &OverlayPayload) -> Result<(), OverlayError> {
            self.0
                .lock()
                .unwrap()
                .calls
                .push(Call::Deliver(payload.bbox.into(), payload.text.clone()));
            Ok(())
        }
    }

    fn controller() -> (OverlayController<FakeSurface>, FakeSurface) {
        let surface = FakeSurface::default();
        let controller = OverlayController::new(surface.clone(), Duration::from_millis(100));
        (controller, surface)
    }

    fn bbox(x1: f64, y1: f64, x2: f64, y2: f64) -> BoundingBox {
        BoundingBox::new(x1, y1, x2, y2).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn first_show_creates_window_then_delivers() {
        let (c, surface) = controller();
        assert_eq!(c.phase().await, OverlayPhase::Unshown);
        assert!(surface.calls().is_empty(), "window is created lazily");

        let placement = c.show(bbox(100.0, 100.0, 300.0, 200.0), "Mixer").await.unwrap();

        assert_eq!(placement.rectangle, bbox(100.0, 100.0, 300.0, 200.0));
        assert_eq!(
            surface.calls(),
            vec![
                Call::Prepare { created: true },
                Call::Show,
                Call::Deliver([100.0, 100.0, 300.0, 200.0], "Mixer".into()),
            ]
        );
        let state = c.state().await;
        assert!(state.visible);
        assert_eq!(state.annotation_text, "Mixer");
        assert_eq!(c.phase().await, OverlayPhase::Shown);
    }

    #[tokio::test(start_paused = true)]
    async fn ready_signal_cuts_the_wait_short() {
        let (c, _surface) = controller();
        let start = tokio::time::Instant::now();

        let (shown, _) = tokio::join!(c.show(bbox(0.0, 0.0, 10.0, 10.0), "x"), async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            c.signal_ready();
        });
        shown.unwrap();

        // 300ms until ready plus the 100ms delivery delay.
        assert!(start.elapsed() >= Duration::from_millis(400));
        assert!(start.elapsed() < READY_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn late_ready_signal_is_not_reused_by_a_new_window() {
        let (c, surface) = controller();
        c.show(bbox(0.0, 0.0, 10.0, 10.0), "x").await.unwrap();

        // The first page reports in only after the wait gave up.
        c.signal_ready();
        surface.close_window();
        c.mark_destroyed().await;

        let start = tokio::time::Instant::now();
        c.show(bbox(0.0, 0.0, 10.0, 10.0), "y").await.unwrap();
        assert!(start.elapsed() >= READY_TIMEOUT, "waited only {:?}", start.elapsed());
    }

    #[tokio::test(start_paused = true)]
    async fn show_while_shown_updates_in_place() {
        let (c, surface) = controller();
        c.show(bbox(0.0, 0.0, 10.0, 10.0), "one").await.unwrap();
        c.show(bbox(50.0, 50.0, 90.0, 90.0), "two").await.unwrap();

        let calls = surface.calls();
        assert_eq!(calls.iter().filter(|c| **c == Call::Show).count(), 1);
        assert!(!calls.contains(&Call::Hide));
        assert_eq!(
            calls.last(),
            Some(&Call::Deliver([50.0, 50.0, 90.0, 90.0], "two".into()))
        );
        assert_eq!(c.state().await.active_bbox, Some(bbox(50.0, 50.0, 90.0, 90.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_shows_do_not_interleave() {
        let (c, surface) = controller();
        let (a, b) = tokio::join!(
            c.show(bbox(0.0, 0.0, 10.0, 10.0), "a"),
            c.show(bbox(20.0, 20.0, 30.0, 30.0), "b"),
        );
        a.unwrap();
        b.unwrap();

        let calls = surface.calls();
        assert_eq!(calls[0], Call::Prepare { created: true });
        assert_eq!(calls[1], Call::Show);
        assert!(matches!(calls[2], Call::Deliver(..)));
        assert!(matches!(calls[3], Call::Deliver(..)));
        assert_eq!(calls.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn hide_is_idempotent_and_resets_state() {
        let (c, surface) = controller();
        c.hide().await.unwrap();
        assert!(surface.calls().is_empty());

        c.show(bbox(0.0, 0.0, 10.0, 10.0), "x").await.unwrap();
        c.hide().await.unwrap();
        c.hide().await.unwrap();

        let calls = surface.calls();
        assert_eq!(calls.iter().filter(|c| **c == Call::Hide).count(), 1);
        assert_eq!(&calls[calls.len() - 2..], &[Call::Clear, Call::Hide]);
        assert_eq!(c.phase().await, OverlayPhase::Unshown);
        assert_eq!(c.state().await, OverlayState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_window_is_reused() {
        let (c, surface) = controller();
        c.show(bbox(0.0, 0.0, 10.0, 10.0), "x").await.unwrap();
        c.hide().await.unwrap();
        c.show(bbox(0.0, 0.0, 10.0, 10.0), "y").await.unwrap();

        assert!(surface.calls().contains(&Call::Prepare { created: false }));
    }

    #[tokio::test(start_paused = true)]
    async fn destroyed_window_is_recreated() {
        let (c, surface) = controller();
        c.show(bbox(0.0, 0.0, 10.0, 10.0), "x").await.unwrap();

        surface.close_window();
        c.mark_destroyed().await;
        assert_eq!(c.phase().await, OverlayPhase::Destroyed);
        assert!(!c.state().await.visible);

        c.hide().await.unwrap();
        assert_eq!(c.phase().await, OverlayPhase::Destroyed);

        c.show(bbox(0.0, 0.0, 10.0, 10.0), "y").await.unwrap();
        let creations = surface
            .calls()
            .iter()
            .filter(|c| **c == Call::Prepare { created: true })
            .count();
        assert_eq!(creations, 2);
        assert_eq!(c.phase().await, OverlayPhase::Shown);
    }

    #[tokio::test(start_paused = true)]
    async fn click_inside_box_does_not_dismiss() {
        let (c, _surface) = controller();
        c.show(bbox(100.0, 100.0, 300.0, 200.0), "x").await.unwrap();

        let inside = OverlayInput::Click { x: 300.0, y: 200.0 };
        assert!(!c.dismiss(&inside).await.unwrap());
        assert_eq!(c.phase().await, OverlayPhase::Shown);

        let outside = OverlayInput::Click { x: 301.0, y: 200.0 };
        assert!(c.dismiss(&outside).await.unwrap());
        assert_eq!(c.phase().await, OverlayPhase::Unshown);
    }

    #[tokio::test(start_paused = true)]
    async fn escape_dismisses() {
        let (c, _surface) = controller();
        c.show(bbox(100.0, 100.0, 300.0, 200.0), "x").await.unwrap();
        let esc = OverlayInput::Key { key: "Escape".into() };
        assert!(c.dismiss(&esc).await.unwrap());
        assert!(!c.dismiss(&esc).await.unwrap(), "nothing left to dismiss");
    }

    #[tokio::test(start_paused = true)]
    async fn creation_failure_leaves_overlay_unshown() {
        let (c, surface) = controller();
        surface.0.lock().unwrap().fail_prepare = true;

        let result = c.show(bbox(0.0, 0.0, 10.0, 10.0), "x").await;
        assert!(matches!(result, Err(OverlayError::Window(_))));
        assert_eq!(c.phase().await, OverlayPhase::Unshown);
        assert!(surface.calls().is_empty());
    }
}
