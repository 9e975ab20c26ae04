//! Data-URL encoding of image bytes.
//!
//! Payloads have the form `data:<mime>;base64,<body>`, which is what the
//! inference service expects and what a browser `FileReader` produces.

use crate::error::EncodingError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Fallback when neither the content nor the file name identify the format.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Bytes and MIME type recovered from an encoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Encode `bytes` as a self-describing payload string.
pub fn encode(bytes: &[u8], mime: &str) -> Result<String, EncodingError> {
    if !is_valid_mime(mime) {
        return Err(EncodingError::InvalidMime(mime.to_string()));
    }
    Ok(format_payload(bytes, mime))
}

/// Parse a payload produced by [`encode`] back into its parts.
pub fn decode(payload: &str) -> Result<DecodedPayload, EncodingError> {
    let rest = payload
        .strip_prefix(SCHEME)
        .ok_or(EncodingError::MissingScheme)?;
    let (mime, body) = rest
        .split_once(BASE64_MARKER)
        .ok_or(EncodingError::MissingBase64Marker)?;
    if !is_valid_mime(mime) {
        return Err(EncodingError::InvalidMime(mime.to_string()));
    }
    let bytes = STANDARD.decode(body)?;
    Ok(DecodedPayload {
        mime: mime.to_string(),
        bytes,
    })
}

/// Guess the MIME type of an image from its content, then from its name.
pub fn detect_mime(bytes: &[u8], name: &str) -> &'static str {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type();
    }
    mime_from_extension(Path::new(name)).unwrap_or(OCTET_STREAM)
}

pub(crate) fn format_payload(bytes: &[u8], mime: &str) -> String {
    let body = STANDARD.encode(bytes);
    let mut out =
        String::with_capacity(SCHEME.len() + mime.len() + BASE64_MARKER.len() + body.len());
    out.push_str(SCHEME);
    out.push_str(mime);
    out.push_str(BASE64_MARKER);
    out.push_str(&body);
    out
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        _ => return None,
    };
    Some(mime)
}

// `type/subtype`, both RFC 2045 tokens.
fn is_valid_mime(mime: &str) -> bool {
    let Some((kind, subtype)) = mime.split_once('/') else {
        return false;
    };
    is_token(kind) && is_token(subtype)
}

fn is_token(part: &str) -> bool {
    !part.is_empty()
        && part
            .bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?=".contains(&b))
}
