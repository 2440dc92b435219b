use serde::{Deserialize, Serialize};

use crate::types::{Point, Size};

fn default_stroke_style() -> String {
    "black".to_string()
}

fn default_line_width() -> f64 {
    1.0
}

/// Stroke events sent over the direct channel
///
/// Coordinates are already mapped into the sender's video space, so a receiver
/// only has to apply its own scale after a `resize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum DrawMessage {
    /// A stroke begins at this point
    Start { x: f64, y: f64 },

    /// The active stroke extends to this point
    Move {
        x: f64,
        y: f64,
        #[serde(
            rename = "strokeStyle",
            alias = "lineStyle",
            default = "default_stroke_style"
        )]
        stroke_style: String,
        #[serde(rename = "lineWidth", default = "default_line_width")]
        line_width: f64,
    },

    /// The active stroke ended
    Stop,

    /// The sender's displayed and intrinsic video sizes changed
    Resize {
        width: f64,
        height: f64,
        #[serde(rename = "videoWidth")]
        video_width: f64,
        #[serde(rename = "videoHeight")]
        video_height: f64,
    },
}

impl DrawMessage {
    pub fn start(point: Point) -> Self {
        DrawMessage::Start {
            x: point.x,
            y: point.y,
        }
    }

    pub fn move_to(point: Point, stroke_style: impl Into<String>, line_width: f64) -> Self {
        DrawMessage::Move {
            x: point.x,
            y: point.y,
            stroke_style: stroke_style.into(),
            line_width,
        }
    }

    pub fn resize(displayed: Size, intrinsic: Size) -> Self {
        DrawMessage::Resize {
            width: displayed.width,
            height: displayed.height,
            video_width: intrinsic.width,
            video_height: intrinsic.height,
        }
    }
}

/// Notifications the relay itself originates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum RelayNotice {
    /// Renegotiate the peer connection; a new viewer has appeared
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_serializes_with_camel_case_style() {
        let msg = DrawMessage::move_to(Point::new(1.5, 2.0), "red", 3.0);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["action"], "move");
        assert_eq!(json["strokeStyle"], "red");
        assert_eq!(json["lineWidth"], 3.0);
    }

    #[test]
    fn move_accepts_line_style_alias() {
        let msg: DrawMessage =
            serde_json::from_str(r#"{"action":"move","x":4,"y":5,"lineStyle":"blue","lineWidth":2}"#)
                .unwrap();
        assert_eq!(msg, DrawMessage::move_to(Point::new(4.0, 5.0), "blue", 2.0));
    }

    #[test]
    fn move_without_style_uses_defaults() {
        let msg: DrawMessage = serde_json::from_str(r#"{"action":"move","x":0,"y":0}"#).unwrap();
        assert_eq!(msg, DrawMessage::move_to(Point::default(), "black", 1.0));
    }

    #[test]
    fn stop_is_a_bare_action() {
        assert_eq!(
            serde_json::to_string(&DrawMessage::Stop).unwrap(),
            r#"{"action":"stop"}"#
        );
    }

    #[test]
    fn resize_uses_video_field_names() {
        let msg = DrawMessage::resize(Size::new(960.0, 540.0), Size::new(1920.0, 1080.0));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["videoWidth"], 1920.0);
        assert_eq!(json["height"], 540.0);
    }

    #[test]
    fn reset_notice_wire_form() {
        assert_eq!(
            serde_json::to_string(&RelayNotice::Reset).unwrap(),
            r#"{"action":"reset"}"#
        );
    }
}
