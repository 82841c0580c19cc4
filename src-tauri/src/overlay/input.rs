//! Input forwarded from the overlay content and the dismiss rule applied
//! to it.

use serde::Deserialize;

use crate::backend::BoundingBox;

const DISMISS_KEY: &str = "Escape";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OverlayInput {
    Key { key: String },
    Click { x: f64, y: f64 },
}

impl OverlayInput {
    /// Escape always dismisses. A click dismisses unless it lands inside
    /// the active box, edges included; with no active box every click
    /// dismisses. Other keys are ignored.
    pub fn dismisses(&self, active: Option<&BoundingBox>) -> bool {
        match self {
            Self::Key { key } => key == DISMISS_KEY,
            Self::Click { x, y } => !active.is_some_and(|b| b.contains(*x, *y)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> BoundingBox {
        BoundingBox::new(100.0, 100.0, 300.0, 200.0).unwrap()
    }

    fn click(x: f64, y: f64) -> OverlayInput {
        OverlayInput::Click { x, y }
    }

    #[test]
    fn click_inside_box_keeps_overlay() {
        let b = active();
        assert!(!click(200.0, 150.0).dismisses(Some(&b)));
        assert!(!click(100.0, 100.0).dismisses(Some(&b)));
        assert!(!click(300.0, 200.0).dismisses(Some(&b)));
    }

    #[test]
    fn click_one_pixel_outside_dismisses() {
        let b = active();
        assert!(click(99.0, 150.0).dismisses(Some(&b)));
        assert!(click(301.0, 150.0).dismisses(Some(&b)));
        assert!(click(200.0, 99.0).dismisses(Some(&b)));
        assert!(click(200.0, 201.0).dismisses(Some(&b)));
    }

    #[test]
    fn click_without_box_dismisses() {
        assert!(click(0.0, 0.0).dismisses(None));
    }

    #[test]
    fn only_escape_key_dismisses() {
        let esc = OverlayInput::Key { key: "Escape".into() };
        let enter = OverlayInput::Key { key: "Enter".into() };
        assert!(esc.dismisses(Some(&active())));
        assert!(!enter.dismisses(None));
    }

    #[test]
    fn deserializes_from_content_events() {
        let input: OverlayInput =
            serde_json::from_str(r#"{"kind":"click","x":5,"y":6.5}"#).unwrap();
        assert_eq!(input, click(5.0, 6.5));
        let input: OverlayInput = serde_json::from_str(r#"{"kind":"key","key":"Escape"}"#).unwrap();
        assert_eq!(input, OverlayInput::Key { key: "Escape".into() });
    }
}
