/// Errors that can occur while tracking gestures or talking to the panel.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("Serial error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed tracker JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not open capture: {0}")]
    CaptureOpen(String),

    #[error("Expected 21 hand landmarks, got {0}")]
    LandmarkCount(usize),

    #[error("Tracker reported: {0}")]
    TrackerMessage(String),

    #[error("Command send failed: {0}")]
    SendFailed(String),

    #[error("Session already shut down")]
    SessionClosed,
}
