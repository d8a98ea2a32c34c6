use crate::types::{Command, FrameEvent, HandFrame, LandmarkPoint};
use crate::{PanelError, Result};
use serde::Deserialize;

// -- Serial link defaults --
pub const DEFAULT_BAUD: u32 = 115_200;

/// Cap on a partial inbound line before it is discarded.
pub const RX_BUF_MAX: usize = 16 * 1024;

/// Readiness banner some trackers print before their first frame.
pub const TRACKER_READY: &str = "READY";

/// Encode a command for the wire: ASCII name plus `\n`.
/// Returns `None` for `NOOP`, which is never transmitted.
pub fn encode_command(cmd: Command) -> Option<Vec<u8>> {
    if cmd.is_noop() {
        return None;
    }
    let mut buf = Vec::with_capacity(cmd.as_str().len() + 1);
    buf.extend_from_slice(cmd.as_str().as_bytes());
    buf.push(b'\n');
    Some(buf)
}

/// Decode one inbound line, dropping invalid UTF-8 sequences and surrounding
/// whitespace. Valid text, including an encoded U+FFFD, is kept as sent.
pub fn decode_line(raw: &[u8]) -> String {
    let mut text = String::with_capacity(raw.len());
    for chunk in raw.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text.trim().to_string()
}

/// Reassembles newline-terminated lines from arbitrary read chunks.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every line it completed. Blank lines are skipped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &b in chunk {
            if b == b'\n' {
                let line = decode_line(&self.buf);
                self.buf.clear();
                if !line.is_empty() {
                    lines.push(line);
                }
            } else {
                self.buf.push(b);
                if self.buf.len() > RX_BUF_MAX {
                    log::warn!("inbound line exceeded {} bytes, discarding", RX_BUF_MAX);
                    self.buf.clear();
                }
            }
        }
        lines
    }

    /// Bytes held for an unfinished line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

// -- Hand-tracker JSON lines --

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f64,
    y: f64,
    #[serde(default)]
    z: f64,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    landmarks: Vec<LandmarkJson>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    handedness: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TrackerJson {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    quit: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Parse one line from the hand tracker.
///
/// `Ok(None)` means the line carries no frame (blank or the ready banner).
/// A tracker-side `error` is returned as `PanelError::TrackerMessage`.
pub fn parse_tracker_line(line: &str) -> Result<Option<FrameEvent>> {
    let line = line.trim();
    if line.is_empty() || line == TRACKER_READY {
        return Ok(None);
    }

    let msg: TrackerJson = serde_json::from_str(line)?;
    if msg.quit {
        return Ok(Some(FrameEvent::Quit));
    }
    if let Some(err) = msg.error {
        return Err(PanelError::TrackerMessage(err));
    }

    let Some(hand) = msg.hands.into_iter().next() else {
        return Ok(Some(FrameEvent::NoHand));
    };

    let points: Vec<LandmarkPoint> = hand
        .landmarks
        .iter()
        .map(|lm| LandmarkPoint::new(lm.x, lm.y, lm.z))
        .collect();
    let frame = HandFrame::from_points(&points)?;

    log::trace!(
        "hand: {} score={:.2}",
        hand.handedness.as_deref().unwrap_or("?"),
        hand.score.unwrap_or(0.0)
    );
    Ok(Some(FrameEvent::Hand(frame)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::LANDMARK_COUNT;

    /// Serialize a frame the way the tracker would.
    pub(crate) fn hand_line(frame: &HandFrame) -> String {
        let pts: Vec<String> = frame
            .points()
            .iter()
            .map(|p| format!(r#"{{"x":{},"y":{},"z":{}}}"#, p.x, p.y, p.z))
            .collect();
        format!(
            r#"{{"hands":[{{"landmarks":[{}],"score":0.9,"handedness":"Right"}}]}}"#,
            pts.join(",")
        )
    }

    #[test]
    fn test_encode_command() {
        assert_eq!(encode_command(Command::Arm).unwrap(), b"ARM\n");
        assert_eq!(encode_command(Command::Disarm).unwrap(), b"DISARM\n");
        assert_eq!(encode_command(Command::Trip).unwrap(), b"TRIP\n");
        assert_eq!(encode_command(Command::Panic).unwrap(), b"PANIC\n");
        assert!(encode_command(Command::Noop).is_none());
    }

    #[test]
    fn test_decode_line_permissive() {
        assert_eq!(decode_line(b"READY\r"), "READY");
        assert_eq!(decode_line(b"AR\xffMED "), "ARMED");
        assert_eq!(decode_line(b"\xc3ERR\xe2\x82"), "ERR");
    }

    #[test]
    fn test_decode_line_keeps_sent_replacement_char() {
        assert_eq!(decode_line(b"BAD \xef\xbf\xbd\xff"), "BAD \u{FFFD}");
    }

    #[test]
    fn test_line_buffer_split_reads() {
        let mut lb = LineBuffer::new();
        assert!(lb.push(b"BOOT ").is_empty());
        assert_eq!(lb.push(b"OK\r\nREA"), vec!["BOOT OK".to_string()]);
        assert_eq!(lb.pending(), 3);
        assert_eq!(lb.push(b"DY\n\n"), vec!["READY".to_string()]);
        assert_eq!(lb.pending(), 0);
    }

    #[test]
    fn test_line_buffer_overflow_discards() {
        let mut lb = LineBuffer::new();
        let junk = vec![b'x'; RX_BUF_MAX + 10];
        assert!(lb.push(&junk).is_empty());
        assert!(lb.pending() < RX_BUF_MAX);
    }

    #[test]
    fn test_parse_tracker_lines() {
        assert_eq!(parse_tracker_line("READY").unwrap(), None);
        assert_eq!(parse_tracker_line("   ").unwrap(), None);
        assert_eq!(
            parse_tracker_line(r#"{"hands":[]}"#).unwrap(),
            Some(FrameEvent::NoHand)
        );
        assert_eq!(
            parse_tracker_line(r#"{"quit":true}"#).unwrap(),
            Some(FrameEvent::Quit)
        );
        assert!(matches!(
            parse_tracker_line(r#"{"error":"camera busy"}"#),
            Err(PanelError::TrackerMessage(_))
        ));
        assert!(matches!(
            parse_tracker_line("not json"),
            Err(PanelError::Json(_))
        ));
    }

    #[test]
    fn test_parse_tracker_hand() {
        let mut pts = [LandmarkPoint::default(); LANDMARK_COUNT];
        pts[8] = LandmarkPoint::new(0.25, 0.5, -0.1);
        let frame = HandFrame::new(pts);
        let parsed = parse_tracker_line(&hand_line(&frame)).unwrap();
        assert_eq!(parsed, Some(FrameEvent::Hand(frame)));

        let short = r#"{"hands":[{"landmarks":[{"x":0.1,"y":0.2}]}]}"#;
        assert!(matches!(
            parse_tracker_line(short),
            Err(PanelError::LandmarkCount(1))
        ));
    }
}
