//! Parsing of `data:image/<subtype>;base64,<payload>` strings.
//!
//! Pure in-memory work: nothing here touches the filesystem, so malformed
//! input is always rejected before any side effect.

use super::ImageCodec;
use crate::models::DecodedImage;
use crate::{Error, Result};
use base64::Engine as _;

const DATA_URL_PREFIX: &str = "data:image/";
const BASE64_MARKER: &str = ";base64,";

pub fn decode(raw: &str, max_payload_bytes: usize) -> Result<DecodedImage> {
    let (subtype, payload) = raw
        .strip_prefix(DATA_URL_PREFIX)
        .and_then(|rest| rest.split_once(BASE64_MARKER))
        .ok_or_else(|| Error::validation("invalid format"))?;

    let valid_subtype = !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid_subtype {
        return Err(Error::validation("invalid format"));
    }

    let codec = ImageCodec::from_name(subtype)
        .filter(|codec| codec.can_decode())
        .ok_or_else(|| Error::validation(format!("unsupported image type: {}", subtype)))?;

    if payload.is_empty() {
        return Err(Error::validation("empty buffer"));
    }
    // Reject oversized payloads before allocating the decoded buffer.
    if payload.len() / 4 * 3 > max_payload_bytes.saturating_add(3) {
        return Err(Error::validation("payload too large"));
    }

    let data = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| Error::validation("invalid encoding"))?;

    if data.is_empty() {
        return Err(Error::validation("empty buffer"));
    }
    if data.len() > max_payload_bytes {
        return Err(Error::validation("payload too large"));
    }

    Ok(DecodedImage {
        mime: format!("image/{}", subtype.to_ascii_lowercase()),
        codec,
        data,
    })
}

/// Build an embedded-data image string from raw bytes.
pub fn to_data_url(mime: &str, data: &[u8]) -> String {
    format!(
        "data:{}{}{}",
        mime,
        BASE64_MARKER,
        base64::engine::general_purpose::STANDARD.encode(data)
    )
}
