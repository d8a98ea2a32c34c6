//! Landmark geometry classifier.
//!
//! Pure snapshot of one frame's geometry. Image coordinates put `y = 0` at the
//! top, so an extended finger has a *smaller* tip `y` than its PIP joint.

use crate::types::{GestureLabel, HandFrame, MCPS, TIPS};

/// Default FIST threshold on tip-to-MCP distance, in normalized units.
pub const DEFAULT_FIST_THRESHOLD: f64 = 0.10;

/// Labels tried in order; the first whose predicate holds wins.
pub const PRIORITY: [GestureLabel; 4] = [
    GestureLabel::Panic,
    GestureLabel::Fist,
    GestureLabel::Point,
    GestureLabel::Open,
];

const INDEX: usize = 0;
const MIDDLE: usize = 1;
const RING: usize = 2;
const PINKY: usize = 3;

/// Classify with the default FIST threshold.
pub fn classify(frame: &HandFrame) -> GestureLabel {
    classify_with(frame, DEFAULT_FIST_THRESHOLD)
}

/// Classify a frame, returning `None` when no predicate matches.
pub fn classify_with(frame: &HandFrame, fist_threshold: f64) -> GestureLabel {
    PRIORITY
        .into_iter()
        .find(|&label| matches(frame, label, fist_threshold))
        .unwrap_or(GestureLabel::None)
}

fn matches(frame: &HandFrame, label: GestureLabel, fist_threshold: f64) -> bool {
    match label {
        GestureLabel::Panic => {
            frame.is_extended(INDEX)
                && frame.is_extended(MIDDLE)
                && frame.is_folded(RING)
                && frame.is_folded(PINKY)
        }
        GestureLabel::Fist => {
            let t2 = fist_threshold * fist_threshold;
            let close_to_mcp = TIPS
                .iter()
                .zip(MCPS.iter())
                .all(|(&tip, &mcp)| frame.point(tip).dist2(frame.point(mcp)) < t2);
            close_to_mcp && (INDEX..=PINKY).all(|f| frame.is_folded(f))
        }
        GestureLabel::Point => {
            frame.is_extended(INDEX)
                && frame.is_folded(MIDDLE)
                && frame.is_folded(RING)
                && frame.is_folded(PINKY)
        }
        GestureLabel::Open => (INDEX..=PINKY).all(|f| frame.is_extended(f)),
        GestureLabel::None => true,
    }
}
