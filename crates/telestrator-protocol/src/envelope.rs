//! Relay text framing.
//!
//! The relay never parses JSON: the first character of a text frame picks the
//! route and everything else is opaque.

use crate::error::ProtocolError;

const DRAW_FRAME_TAG: char = 'd';
const LOG_TAG: char = 'l';
const RESET_TAG: char = 'r';

/// A classified relay frame. Every variant keeps the raw text it arrived as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEnvelope {
    /// A raster snapshot as a `data:` URI
    DrawFrame(String),
    /// A diagnostic line from a client
    Log(String),
    /// Ask every other peer to renegotiate
    ResetRequest(String),
    /// Anything else: cached before quorum, broadcast after
    Signal(String),
}

impl RelayEnvelope {
    /// Classify a raw text frame. Unknown or empty frames are signals.
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        match text.chars().next() {
            Some(DRAW_FRAME_TAG) => RelayEnvelope::DrawFrame(text),
            Some(LOG_TAG) => RelayEnvelope::Log(text),
            Some(RESET_TAG) => RelayEnvelope::ResetRequest(text),
            _ => RelayEnvelope::Signal(text),
        }
    }

    /// Wrap a data URI. Data URIs always start with `d`.
    pub fn draw_frame(data_uri: impl Into<String>) -> Self {
        RelayEnvelope::DrawFrame(data_uri.into())
    }

    pub fn log(line: &str) -> Self {
        RelayEnvelope::Log(format!("log: {line}"))
    }

    pub fn reset_request() -> Self {
        RelayEnvelope::ResetRequest("reset".to_string())
    }

    /// Build a signal, refusing payloads that would be routed as something else.
    pub fn signal(payload: impl Into<String>) -> Result<Self, ProtocolError> {
        let payload = payload.into();
        match payload.chars().next() {
            Some(tag @ (DRAW_FRAME_TAG | LOG_TAG | RESET_TAG)) => {
                Err(ProtocolError::ReservedTag(tag))
            }
            _ => Ok(RelayEnvelope::Signal(payload)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RelayEnvelope::DrawFrame(_) => "draw-frame",
            RelayEnvelope::Log(_) => "log",
            RelayEnvelope::ResetRequest(_) => "reset-request",
            RelayEnvelope::Signal(_) => "signal",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RelayEnvelope::DrawFrame(text)
            | RelayEnvelope::Log(text)
            | RelayEnvelope::ResetRequest(text)
            | RelayEnvelope::Signal(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            RelayEnvelope::DrawFrame(text)
            | RelayEnvelope::Log(text)
            | RelayEnvelope::ResetRequest(text)
            | RelayEnvelope::Signal(text) => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_first_character() {
        assert_eq!(
            RelayEnvelope::parse("data:image/png;base64,AAAA").kind(),
            "draw-frame"
        );
        assert_eq!(RelayEnvelope::parse("log: hello").kind(), "log");
        assert_eq!(RelayEnvelope::parse("request host").kind(), "reset-request");
        assert_eq!(RelayEnvelope::parse(r#"{"sdp":"x"}"#).kind(), "signal");
    }

    #[test]
    fn unknown_and_empty_frames_are_signals() {
        assert_eq!(RelayEnvelope::parse(""), RelayEnvelope::Signal(String::new()));
        assert_eq!(RelayEnvelope::parse("zzz").kind(), "signal");
        // Tags are case sensitive
        assert_eq!(RelayEnvelope::parse("Data").kind(), "signal");
    }

    #[test]
    fn constructors_round_trip_through_parse() {
        for envelope in [
            RelayEnvelope::log("peer joined"),
            RelayEnvelope::reset_request(),
            RelayEnvelope::draw_frame("data:image/gif;base64,R0lG"),
        ] {
            assert_eq!(RelayEnvelope::parse(envelope.as_str()), envelope);
        }
    }

    #[test]
    fn signal_rejects_reserved_tags() {
        assert!(matches!(
            RelayEnvelope::signal("ready"),
            Err(ProtocolError::ReservedTag('r'))
        ));
        assert!(RelayEnvelope::signal(r#"{"type":"offer"}"#).is_ok());
    }
}
