//! Frame snapshots and multipart MJPEG framing

use bytes::{BufMut, Bytes, BytesMut};

use crate::data_uri;
use crate::error::Result;

/// Boundary token of the broadcast stream
pub const BOUNDARY: &str = "myboundary";

/// A 1x1 transparent GIF, pushed to clear the broadcast output
pub const BLANK_FRAME_URI: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

const BLANK_FRAME_BYTES: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x01, 0x44, 0x00, 0x3b,
];

/// Parts are always labelled JPEG; broadcast consumers sniff the real format.
const PART_CONTENT_TYPE: &str = "image/jpeg";

/// The most recent encoded raster, as pushed by a drawing client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSnapshot {
    pub mime: String,
    pub data: Bytes,
}

impl FrameSnapshot {
    pub fn new(mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            mime: mime.into(),
            data: data.into(),
        }
    }

    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let decoded = data_uri::decode(uri)?;
        Ok(Self::new(decoded.mime, decoded.data))
    }

    /// The transparent frame used to wipe the broadcast output.
    pub fn blank() -> Self {
        Self::new("image/gif", Bytes::from_static(BLANK_FRAME_BYTES))
    }

    /// Encode this frame as one part of a `multipart/x-mixed-replace` stream.
    pub fn to_multipart_part(&self) -> Bytes {
        let header = format!(
            "--{BOUNDARY}\r\nContent-Type: {PART_CONTENT_TYPE}\r\nContent-Length: {}\r\n\r\n",
            self.data.len()
        );
        let mut part = BytesMut::with_capacity(header.len() + self.data.len() + 2);
        part.put_slice(header.as_bytes());
        part.put_slice(&self.data);
        part.put_slice(b"\r\n");
        part.freeze()
    }
}

/// `Content-Type` header value for the broadcast stream.
pub fn multipart_content_type() -> String {
    format!("multipart/x-mixed-replace; boundary={BOUNDARY}")
}

/// Split one part produced by [`FrameSnapshot::to_multipart_part`] from the
/// front of `buf`, returning the body and the number of bytes consumed.
///
/// Returns `None` until the whole part has been buffered.
pub fn read_multipart_part(buf: &[u8]) -> Option<(Bytes, usize)> {
    let header_end = buf.windows(4).position(|w| w == b"\r\n\r\n")? + 4;
    let headers = std::str::from_utf8(&buf[..header_end]).ok()?;
    let length: usize = headers.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("content-length")
            .then(|| value.trim().parse().ok())
            .flatten()
    })?;

    let body_end = header_end + length;
    let consumed = body_end + 2;
    if buf.len() < consumed {
        return None;
    }
    Some((Bytes::copy_from_slice(&buf[header_end..body_end]), consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_frame_matches_its_uri() {
        let decoded = FrameSnapshot::from_data_uri(BLANK_FRAME_URI).unwrap();
        assert_eq!(decoded, FrameSnapshot::blank());
    }

    #[test]
    fn part_carries_length_and_jpeg_label() {
        let frame = FrameSnapshot::new("image/png", vec![9u8; 12]);
        let part = frame.to_multipart_part();
        let text = String::from_utf8_lossy(&part);
        assert!(text.starts_with("--myboundary\r\nContent-Type: image/jpeg\r\nContent-Length: 12\r\n\r\n"));
        assert!(part.ends_with(b"\r\n"));
    }

    #[test]
    fn reads_consecutive_parts() {
        let mut stream = FrameSnapshot::blank().to_multipart_part().to_vec();
        stream.extend_from_slice(&FrameSnapshot::new("image/png", vec![1, 2, 3]).to_multipart_part());

        let (first, used) = read_multipart_part(&stream).unwrap();
        assert_eq!(first, FrameSnapshot::blank().data);
        let (second, _) = read_multipart_part(&stream[used..]).unwrap();
        assert_eq!(&second[..], &[1, 2, 3]);
    }

    #[test]
    fn partial_part_is_not_read() {
        let part = FrameSnapshot::blank().to_multipart_part();
        assert!(read_multipart_part(&part[..part.len() - 3]).is_none());
    }

    #[test]
    fn content_type_names_boundary() {
        assert_eq!(
            multipart_content_type(),
            "multipart/x-mixed-replace; boundary=myboundary"
        );
    }
}
