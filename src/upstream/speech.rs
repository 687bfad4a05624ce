// OpenAI text-to-speech client
// Author: kelexine (https://github.com/kelexine)

use super::{describe_failure, post_json_with_retry, SpeechSynthesizer};
use crate::config::{ModelEndpoint, UpstreamConfig};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'static str,
    speed: f32,
}

/// `audio/speech` client producing MP3 audio.
pub struct OpenAiSpeech {
    http_client: Client,
    endpoint: ModelEndpoint,
    api_key: String,
    voice: String,
    speed: f32,
    max_retries: u32,
}

impl OpenAiSpeech {
    /// `None` when speech is disabled or no API key is available.
    pub fn from_config(http_client: Client, config: &UpstreamConfig) -> Option<Self> {
        let speech = &config.speech;
        if !speech.enabled {
            return None;
        }
        let api_key = speech.endpoint.resolve_api_key()?;
        Some(Self {
            http_client,
            endpoint: speech.endpoint.clone(),
            api_key,
            voice: speech.voice.clone(),
            speed: speech.speed,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn generate_speech(&self, text: &str, language: &str) -> Result<Bytes> {
        info!(language, text_length = text.len(), "Generating speech audio");

        // The model infers the language from the input text
        let request = SpeechRequest {
            model: &self.endpoint.model,
            voice: &self.voice,
            input: text,
            response_format: "mp3",
            speed: self.speed,
        };
        let url = format!("{}/audio/speech", self.endpoint.base_url.trim_end_matches('/'));

        let response = post_json_with_retry(
            &self.http_client,
            &url,
            Some(&self.api_key),
            &request,
            self.max_retries,
            "Speech generation",
        )
        .await
        .map_err(|failure| AppError::Tts(describe_failure("tts", &failure)))?;

        let audio = response.bytes().await?;
        info!(audio_kb = audio.len() / 1024, "Speech generation complete");
        Ok(audio)
    }
}
