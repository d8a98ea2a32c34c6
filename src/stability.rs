use crate::types::GestureLabel;

/// Default number of consecutive agreeing frames before a gesture is confirmed.
pub const DEFAULT_STABLE_FRAMES: u32 = 6;

/// Run-length debounce state. Lives for one run of the frame loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StabilityState {
    /// Raw label seen on the previous hand frame.
    pub raw_prev: GestureLabel,
    /// Consecutive hand frames that produced `raw_prev`.
    pub raw_count: u32,
    /// Last confirmed gesture. Sticky until another label is confirmed or the hand is lost.
    pub stable_gesture: GestureLabel,
}

/// Debounces raw per-frame labels into a confirmed gesture signal.
#[derive(Debug, Clone)]
pub struct StabilityTracker {
    threshold: u32,
    state: StabilityState,
}

impl StabilityTracker {
    /// `threshold` is clamped to at least 1.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            state: StabilityState::default(),
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn state(&self) -> &StabilityState {
        &self.state
    }

    pub fn stable_gesture(&self) -> GestureLabel {
        self.state.stable_gesture
    }

    /// Feed one frame. Must be called exactly once per frame.
    ///
    /// Losing the hand resets everything on the spot; while the hand is present
    /// the stable gesture only moves once a label has `threshold` consecutive frames.
    pub fn update(&mut self, hand_present: bool, raw: GestureLabel) -> GestureLabel {
        let s = &mut self.state;
        if !hand_present {
            *s = StabilityState {
                raw_prev: GestureLabel::None,
                raw_count: 0,
                stable_gesture: GestureLabel::None,
            };
            return s.stable_gesture;
        }

        if raw == s.raw_prev {
            s.raw_count = s.raw_count.saturating_add(1);
        } else {
            s.raw_prev = raw;
            s.raw_count = 1;
        }

        if s.raw_count >= self.threshold && s.stable_gesture != raw {
            log::debug!("stable gesture {} -> {}", s.stable_gesture, raw);
            s.stable_gesture = raw;
        }
        s.stable_gesture
    }

    /// Drop all run-length state, as if a fresh loop were starting.
    pub fn reset(&mut self) {
        self.state = StabilityState::default();
    }
}

impl Default for StabilityTracker {
    fn default() -> Self {
        Self::new(DEFAULT_STABLE_FRAMES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirms_on_nth_frame() {
        let mut t = StabilityTracker::new(6);
        for i in 1..6 {
            assert_eq!(t.update(true, GestureLabel::Fist), GestureLabel::None, "frame {}", i);
        }
        assert_eq!(t.state().raw_count, 5);
        assert_eq!(t.update(true, GestureLabel::Fist), GestureLabel::Fist);
        assert_eq!(t.state().raw_count, 6);
    }

    #[test]
    fn test_hand_loss_hard_resets() {
        let mut t = StabilityTracker::new(6);
        for _ in 0..10 {
            t.update(true, GestureLabel::Fist);
        }
        assert_eq!(t.state().raw_count, 10);
        assert_eq!(t.stable_gesture(), GestureLabel::Fist);

        t.update(false, GestureLabel::Fist);
        assert_eq!(
            *t.state(),
            StabilityState {
                raw_prev: GestureLabel::None,
                raw_count: 0,
                stable_gesture: GestureLabel::None,
            }
        );
    }

    #[test]
    fn test_stable_is_sticky_across_flicker() {
        let mut t = StabilityTracker::new(3);
        for _ in 0..3 {
            t.update(true, GestureLabel::Open);
        }
        assert_eq!(t.stable_gesture(), GestureLabel::Open);

        // A short run of another label resets the counter but not the stable gesture.
        t.update(true, GestureLabel::Point);
        t.update(true, GestureLabel::Point);
        assert_eq!(t.state().raw_prev, GestureLabel::Point);
        assert_eq!(t.state().raw_count, 2);
        assert_eq!(t.stable_gesture(), GestureLabel::Open);

        t.update(true, GestureLabel::Point);
        assert_eq!(t.stable_gesture(), GestureLabel::Point);
    }

    #[test]
    fn test_raw_none_with_hand_is_debounced() {
        let mut t = StabilityTracker::new(2);
        t.update(true, GestureLabel::Fist);
        t.update(true, GestureLabel::Fist);
        assert_eq!(t.stable_gesture(), GestureLabel::Fist);

        // Hand present but unrecognized pose: NONE must also earn its way in.
        t.update(true, GestureLabel::None);
        assert_eq!(t.stable_gesture(), GestureLabel::Fist);
        t.update(true, GestureLabel::None);
        assert_eq!(t.stable_gesture(), GestureLabel::None);
    }

    #[test]
    fn test_zero_threshold_clamped() {
        let mut t = StabilityTracker::new(0);
        assert_eq!(t.threshold(), 1);
        assert_eq!(t.update(true, GestureLabel::Panic), GestureLabel::Panic);
    }
}
