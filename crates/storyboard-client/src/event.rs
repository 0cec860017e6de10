/// One storyboard frame as delivered on the wire.
///
/// Immutable once decoded from a `frame` event. Only the discriminating
/// structure is validated; descriptive fields default to empty so a sparse
/// frame still renders.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Frame {
    /// 1-based display number; absent frames fall back to position + 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_number: Option<u32>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub rhyme: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub moral: String,
    #[serde(default)]
    pub shot_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setting: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_objects: Vec<String>,
}

impl Frame {
    /// Display number for a frame sitting at `position` in the board.
    pub fn number_at(&self, position: usize) -> u32 {
        self.frame_number.unwrap_or(position as u32 + 1)
    }
}

/// Decoded stream events, tagged by the wire `type` field.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Narrative text plus the announced frame count (0 when unknown).
    Story {
        #[serde(default)]
        aldar_story: String,
        #[serde(default)]
        total_frames: usize,
    },
    /// A finished frame for the given board position.
    Frame { index: usize, frame: Frame },
    /// Authoritative generation failure.
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Terminal success marker.
    Complete,
}

impl StreamEvent {
    /// Lossy decode of one stream line.
    ///
    /// Blank lines, malformed JSON, unknown event types, and a `frame` event
    /// without its `index` are protocol slack (keep-alives and the like), not
    /// errors: they yield `None` and the session moves on.
    pub fn decode(line: &str) -> Option<StreamEvent> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        serde_json::from_str(line).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_story_event_with_defaults() {
        let event = StreamEvent::decode(r#"{"type":"story","aldar_story":"Once..."}"#)
            .expect("story event");
        assert_eq!(
            event,
            StreamEvent::Story {
                aldar_story: "Once...".into(),
                total_frames: 0,
            }
        );
    }

    #[test]
    fn decodes_frame_event_fields() {
        let line = r#"{"type":"frame","index":2,"frame":{"frame_number":3,"image_url":"/static/generated/f3.png","rhyme":"r","description":"d","moral":"wisdom","shot_type":"wide","setting":"steppe","key_objects":["yurt","horse"]}}"#;
        let event = StreamEvent::decode(line).expect("frame event");
        let StreamEvent::Frame { index, frame } = event else {
            panic!("expected frame event");
        };
        assert_eq!(index, 2);
        assert_eq!(frame.frame_number, Some(3));
        assert_eq!(frame.setting.as_deref(), Some("steppe"));
        assert_eq!(frame.key_objects, vec!["yurt", "horse"]);
    }

    #[test]
    fn frame_without_index_is_skipped() {
        assert_eq!(
            StreamEvent::decode(r#"{"type":"frame","frame":{"rhyme":"r"}}"#),
            None
        );
    }

    #[test]
    fn noise_lines_are_skipped_not_errors() {
        assert_eq!(StreamEvent::decode(""), None);
        assert_eq!(StreamEvent::decode("   "), None);
        assert_eq!(StreamEvent::decode("not json"), None);
        assert_eq!(StreamEvent::decode(r#"{"type":"heartbeat"}"#), None);
        assert_eq!(StreamEvent::decode(r#"{"no_type":true}"#), None);
    }

    #[test]
    fn decodes_error_and_complete() {
        assert_eq!(
            StreamEvent::decode(r#"{"type":"error","message":"model offline"}"#),
            Some(StreamEvent::Error {
                message: Some("model offline".into())
            })
        );
        assert_eq!(
            StreamEvent::decode(r#"{"type":"error"}"#),
            Some(StreamEvent::Error { message: None })
        );
        assert_eq!(
            StreamEvent::decode(r#"{"type":"complete"}"#),
            Some(StreamEvent::Complete)
        );
    }

    #[test]
    fn frame_number_falls_back_to_position() {
        let frame = Frame {
            frame_number: None,
            ..serde_json::from_str("{}").expect("empty frame")
        };
        assert_eq!(frame.number_at(4), 5);
    }
}
