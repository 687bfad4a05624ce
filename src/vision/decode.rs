// Client image decoding and validation
// Author: kelexine (https://github.com/kelexine)

use super::models::{validate_image_size, ImageFormat};
use crate::error::{AppError, Result};
use base64::Engine;
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

lazy_static! {
    static ref DATA_URI_PREFIX: Regex = Regex::new(r"^data:image/(jpeg|jpg|png|webp);base64,").unwrap();
}

/// A validated client image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Canonical base64 payload without any data URI prefix.
    pub base64: String,
    pub byte_len: usize,
    /// Format from magic bytes, falling back to the data URI's declared type.
    pub format: Option<ImageFormat>,
    /// Hex SHA-256 of the decoded bytes.
    pub hash: String,
}

impl DecodedImage {
    /// Data URI accepted by OpenAI-compatible vision endpoints.
    pub fn to_data_url(&self) -> String {
        let mime = self.format.unwrap_or(ImageFormat::Jpeg).mime_type();
        format!("data:{};base64,{}", mime, self.base64)
    }
}

/// Decode a base64 client image, with or without a `data:image/...;base64,` prefix.
pub fn decode_image(input: Option<&str>) -> Result<DecodedImage> {
    let raw = match input {
        Some(s) if !s.trim().is_empty() => s.trim(),
        _ => return Err(AppError::InvalidImage("No image provided.".to_string())),
    };

    let declared = DATA_URI_PREFIX
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| ImageFormat::from_mime_type(&format!("image/{}", m.as_str())));
    let payload = DATA_URI_PREFIX.replace(raw, "");

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| AppError::InvalidImage(format!("Invalid base64 image data: {}", e)))?;

    validate_image_size(bytes.len()).map_err(AppError::InvalidImage)?;

    let format = ImageFormat::detect(&bytes).or(declared);
    let hash = hex::encode(Sha256::digest(&bytes));

    Ok(DecodedImage {
        base64: payload.into_owned(),
        byte_len: bytes.len(),
        format,
        hash,
    })
}
