//! Placement properties over a sweep of boxes and viewports.

use screen_ask_lib::backend::BoundingBox;
use screen_ask_lib::overlay::placement::{BUBBLE_WIDTH, MIN_BUBBLE_HEIGHT, VIEWPORT_MARGIN};
use screen_ask_lib::overlay::{place, Anchor};

fn sweep() -> impl Iterator<Item = (BoundingBox, f64, f64)> {
    let viewports = [(1920.0, 1080.0), (1280.0, 800.0), (400.0, 300.0)];
    viewports.into_iter().flat_map(|(w, h)| {
        (0..12).flat_map(move |i| {
            (0..12).filter_map(move |j| {
                let x1 = w * i as f64 / 12.0;
                let y1 = h * j as f64 / 12.0;
                let size = 40.0 + 30.0 * ((i + j) % 5) as f64;
                BoundingBox::new(x1, y1, (x1 + size).min(w), (y1 + size * 0.6).min(h))
                    .ok()
                    .map(|b| (b, w, h))
            })
        })
    })
}

#[test]
fn bubble_never_overlaps_unless_fallback() {
    for (bbox, w, h) in sweep() {
        let p = place(bbox, w, h);
        if !p.fallback {
            assert!(!p.bubble.overlaps(&bbox), "{:?} in {}x{} -> {:?}", bbox, w, h, p);
        }
    }
}

#[test]
fn first_side_with_room_wins() {
    for (bbox, w, h) in sweep() {
        let p = place(bbox, w, h);
        let expected = if bbox.y1 >= MIN_BUBBLE_HEIGHT {
            Some(Anchor::Above)
        } else if h - bbox.y2 >= MIN_BUBBLE_HEIGHT {
            Some(Anchor::Below)
        } else if w - bbox.x2 >= BUBBLE_WIDTH {
            Some(Anchor::Right)
        } else if bbox.x1 >= BUBBLE_WIDTH {
            Some(Anchor::Left)
        } else {
            None
        };

        match expected {
            Some(anchor) => {
                assert_eq!(p.bubble.anchor, anchor, "{:?} in {}x{}", bbox, w, h);
                assert!(!p.fallback);
            }
            None => {
                assert!(p.fallback);
                assert!(p.bubble.y >= VIEWPORT_MARGIN);
            }
        }
    }
}

#[test]
fn rectangle_is_always_the_input_box() {
    for (bbox, w, h) in sweep() {
        assert_eq!(place(bbox, w, h).rectangle, bbox);
    }
}
