//! Pronunciation audio: a Forvo recording first, ElevenLabs speech as fallback.

use async_trait::async_trait;
use forge_core::{CollaboratorError, Language, MediaKind, MediaRef, PronunciationProvider};
use serde::Deserialize;

use super::media::MediaStore;
use super::{download, ensure_success, transport};
use crate::config::MediaConfig;

const FORVO_BASE_URL: &str = "https://apifree.forvo.com";
const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";
const ELEVENLABS_MODEL: &str = "eleven_multilingual_v2";

pub struct AudioService {
    http: reqwest::Client,
    forvo_api_key: Option<String>,
    elevenlabs_api_key: Option<String>,
    voice_id: String,
    store: MediaStore,
}

impl AudioService {
    pub fn new(http: reqwest::Client, config: &MediaConfig, store: MediaStore) -> Self {
        Self {
            http,
            forvo_api_key: config.forvo_api_key.clone(),
            elevenlabs_api_key: config.elevenlabs_api_key.clone(),
            voice_id: config.elevenlabs_voice_id.clone(),
            store,
        }
    }

    /// Top-rated recording on Forvo, if there is one.
    async fn from_forvo(&self, word: &str, language: Language) -> Result<Vec<u8>, CollaboratorError> {
        let key = self
            .forvo_api_key
            .as_deref()
            .ok_or(CollaboratorError::NotConfigured("FORVO_API_KEY"))?;

        let mut url = reqwest::Url::parse(FORVO_BASE_URL)
            .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| CollaboratorError::InvalidResponse("Forvo base url".into()))?
            .pop_if_empty()
            .extend([
                "key",
                key,
                "format",
                "json",
                "action",
                "word-pronunciations",
                "word",
                word,
                "language",
                language.code(),
                "order",
                "rate-desc",
                "limit",
                "1",
            ]);

        let response = self.http.get(url).send().await.map_err(transport)?;
        let response = ensure_success(response).await?;

        #[derive(Deserialize)]
        struct Item {
            pathmp3: Option<String>,
        }
        #[derive(Deserialize)]
        struct Pronunciations {
            #[serde(default)]
            items: Vec<Item>,
        }

        let body: Pronunciations = response
            .json()
            .await
            .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))?;
        let audio_url = body
            .items
            .into_iter()
            .find_map(|item| item.pathmp3)
            .ok_or_else(|| {
                CollaboratorError::InvalidResponse(format!(
                    "no pronunciation found on Forvo for {} in {}",
                    word, language
                ))
            })?;

        download(&self.http, &audio_url).await
    }

    async fn from_elevenlabs(&self, text: &str) -> Result<Vec<u8>, CollaboratorError> {
        let key = self
            .elevenlabs_api_key
            .as_deref()
            .ok_or(CollaboratorError::NotConfigured("ELEVENLABS_API_KEY"))?;

        let response = self
            .http
            .post(format!("{}/text-to-speech/{}", ELEVENLABS_BASE_URL, self.voice_id))
            .header("xi-api-key", key)
            .header("Accept", "audio/mpeg")
            .json(&serde_json::json!({
                "text": text,
                "model_id": ELEVENLABS_MODEL,
                "voice_settings": {
                    "stability": 0.5,
                    "similarity_boost": 0.75
                }
            }))
            .send()
            .await
            .map_err(transport)?;
        let response = ensure_success(response).await?;
        let bytes = response.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl PronunciationProvider for AudioService {
    #[tracing::instrument(skip(self, fallback_text))]
    async fn fetch(
        &self,
        word: &str,
        language: Language,
        fallback_text: Option<&str>,
    ) -> Result<MediaRef, CollaboratorError> {
        let forvo_error = match self.from_forvo(word, language).await {
            Ok(bytes) => {
                let media = self.store.save(MediaKind::Audio, word, "mp3", &bytes).await?;
                return Ok(media.with_source("Forvo"));
            }
            Err(err) => {
                tracing::debug!(error = %err, "no Forvo recording, trying text-to-speech");
                err
            }
        };

        let Some(text) = fallback_text else {
            return Err(forvo_error);
        };
        let bytes = self.from_elevenlabs(text).await?;
        let media = self.store.save(MediaKind::Audio, word, "mp3", &bytes).await?;
        Ok(media.with_source("ElevenLabs"))
    }
}
