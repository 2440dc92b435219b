//! `data:` URI codec (RFC 2397)

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{MediaError, Result};

const PREFIX: &str = "data:";
const DEFAULT_MIME: &str = "text/plain";

/// A decoded `data:` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub data: Vec<u8>,
}

/// Decode a `data:` URI into its media type and bytes.
pub fn decode(uri: &str) -> Result<DataUri> {
    let rest = uri.strip_prefix(PREFIX).ok_or(MediaError::NotDataUri)?;
    let (meta, payload) = rest.split_once(',').ok_or(MediaError::MissingPayload)?;

    let mut params = meta.split(';');
    let mime = match params.next() {
        Some(m) if !m.is_empty() => m.to_ascii_lowercase(),
        _ => DEFAULT_MIME.to_string(),
    };
    let is_base64 = meta
        .rsplit(';')
        .next()
        .is_some_and(|p| p.eq_ignore_ascii_case("base64"));

    let data = if is_base64 {
        STANDARD.decode(payload.trim())?
    } else {
        urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };

    Ok(DataUri { mime, data })
}

/// Encode bytes as a base64 `data:` URI.
pub fn encode(mime: &str, data: &[u8]) -> String {
    format!("{PREFIX}{mime};base64,{}", STANDARD.encode(data))
}
