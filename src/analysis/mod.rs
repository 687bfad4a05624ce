//! Analysis flows behind the REST API.
//!
//! - `validation`: confidence scoring of label extractions
//! - `pipeline`: the request orchestration over caches, monitor and upstream services
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod pipeline;
pub mod validation;

pub use pipeline::{AnalysisPipeline, Cached, MAX_TTS_CHARS};
pub use validation::{validate_extraction, ExtractionValidation, MIN_CONFIDENCE};
