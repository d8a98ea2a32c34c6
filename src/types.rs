use std::fmt;

// -- Hand landmark indices (MediaPipe hand model numbering) --
pub const LANDMARK_COUNT: usize = 21;

pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_TIP: usize = 20;

/// Fingertips in finger order: index, middle, ring, pinky.
pub const TIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];
pub const PIPS: [usize; 4] = [INDEX_PIP, MIDDLE_PIP, RING_PIP, PINKY_PIP];
pub const MCPS: [usize; 4] = [INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];

/// One normalized hand landmark.
///
/// `x` and `y` are roughly in `[0, 1]` with the origin at the top-left of the
/// image, so `y` grows downward. `z` is relative depth and is never used for
/// classification.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl LandmarkPoint {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared 2-D distance to `other` (z ignored).
    pub fn dist2(&self, other: &LandmarkPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// All 21 landmarks of one tracked hand for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandFrame {
    points: [LandmarkPoint; LANDMARK_COUNT],
}

impl HandFrame {
    pub fn new(points: [LandmarkPoint; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build a frame from a tracker-provided list, which must hold exactly 21 points.
    pub fn from_points(points: &[LandmarkPoint]) -> crate::Result<Self> {
        let points: [LandmarkPoint; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| crate::PanelError::LandmarkCount(points.len()))?;
        Ok(Self { points })
    }

    /// Landmark by anatomical index. Panics if `index >= 21`.
    pub fn point(&self, index: usize) -> &LandmarkPoint {
        &self.points[index]
    }

    pub fn points(&self) -> &[LandmarkPoint; LANDMARK_COUNT] {
        &self.points
    }

    /// Finger `finger` (0 = index .. 3 = pinky) has its tip above its PIP joint.
    pub fn is_extended(&self, finger: usize) -> bool {
        self.points[TIPS[finger]].y < self.points[PIPS[finger]].y
    }

    /// Finger `finger` has its tip below its PIP joint.
    pub fn is_folded(&self, finger: usize) -> bool {
        self.points[TIPS[finger]].y > self.points[PIPS[finger]].y
    }
}

/// Per-frame gesture label, in increasing classification priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GestureLabel {
    #[default]
    None,
    Open,
    Point,
    Fist,
    Panic,
}

impl GestureLabel {
    pub const ALL: [GestureLabel; 5] = [
        GestureLabel::None,
        GestureLabel::Open,
        GestureLabel::Fist,
        GestureLabel::Point,
        GestureLabel::Panic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GestureLabel::None => "NONE",
            GestureLabel::Open => "OPEN",
            GestureLabel::Fist => "FIST",
            GestureLabel::Point => "POINT",
            GestureLabel::Panic => "PANIC",
        }
    }

    /// The command bound to this gesture. Total over all labels.
    pub fn command(&self) -> Command {
        match self {
            GestureLabel::Open => Command::Disarm,
            GestureLabel::Fist => Command::Arm,
            GestureLabel::Point => Command::Trip,
            GestureLabel::Panic => Command::Panic,
            GestureLabel::None => Command::Noop,
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text command understood by the panel microcontroller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Arm,
    Disarm,
    Trip,
    Panic,
    /// Never transmitted.
    Noop,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Arm => "ARM",
            Command::Disarm => "DISARM",
            Command::Trip => "TRIP",
            Command::Panic => "PANIC",
            Command::Noop => "NOOP",
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Command::Noop)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the hand-tracking collaborator produced for one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    /// A hand was tracked.
    Hand(HandFrame),
    /// The frame was read but no hand was found.
    NoHand,
    /// The operator asked to quit, or the collaborator went away.
    Quit,
}
