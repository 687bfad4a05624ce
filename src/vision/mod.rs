//! Image intake for label and meal photos.
//!
//! Client images arrive as base64 strings, optionally wrapped in a
//! `data:image/...;base64,` URI. This module decodes them, detects the
//! format from magic bytes, enforces the size limit, and derives the
//! content hash used as the meal cache key.
//!
//! # Submodules
//!
//! - `models`: Supported formats and validation limits.
//! - `decode`: Base64 decoding and validation of client images.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod decode;
pub mod models;

pub use decode::{decode_image, DecodedImage};
pub use models::{ImageFormat, MAX_IMAGE_SIZE_BYTES};
