//! Sentence illustrations generated on Replicate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use forge_core::{CollaboratorError, ImageProvider, Language, MediaKind, MediaRef};
use serde::Deserialize;

use super::media::MediaStore;
use super::openai::OpenAiClient;
use super::{download, ensure_success, transport};
use crate::config::MediaConfig;

const REPLICATE_PREDICTIONS_URL: &str = "https://api.replicate.com/v1/predictions";
const NEGATIVE_PROMPT: &str =
    "low quality, blurry, distorted, deformed, disfigured, bad anatomy, watermark";
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_POLLS: usize = 60;

#[derive(Debug, Deserialize)]
struct Prediction {
    status: String,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: String,
}

impl Prediction {
    fn is_finished(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "failed" | "canceled")
    }

    /// First image URL; SDXL returns a list, some models a single string.
    fn image_url(&self) -> Option<&str> {
        match self.output.as_ref()? {
            serde_json::Value::Array(items) => items.first().and_then(|v| v.as_str()),
            serde_json::Value::String(url) => Some(url),
            _ => None,
        }
    }
}

pub struct ImageService {
    http: reqwest::Client,
    api_key: Option<String>,
    model_version: String,
    prompts: Arc<OpenAiClient>,
    store: MediaStore,
}

impl ImageService {
    pub fn new(
        http: reqwest::Client,
        config: &MediaConfig,
        prompts: Arc<OpenAiClient>,
        store: MediaStore,
    ) -> Self {
        Self {
            http,
            api_key: config.replicate_api_key.clone(),
            model_version: config.replicate_model.clone(),
            prompts,
            store,
        }
    }

    async fn predict(&self, api_key: &str, prompt: &str) -> Result<String, CollaboratorError> {
        let response = self
            .http
            .post(REPLICATE_PREDICTIONS_URL)
            .bearer_auth(api_key)
            .header("Prefer", "wait")
            .json(&serde_json::json!({
                "version": self.model_version,
                "input": {
                    "prompt": prompt,
                    "negative_prompt": NEGATIVE_PROMPT,
                    "width": 768,
                    "height": 768,
                    "num_outputs": 1,
                    "scheduler": "K_EULER",
                    "num_inference_steps": 30,
                    "guidance_scale": 7.5
                }
            }))
            .send()
            .await
            .map_err(transport)?;
        let mut prediction: Prediction = parse(ensure_success(response).await?).await?;

        let mut polls = 0;
        while !prediction.is_finished() {
            if polls >= MAX_POLLS {
                return Err(CollaboratorError::Transport(
                    "image generation timed out".to_string(),
                ));
            }
            let Some(urls) = &prediction.urls else {
                return Err(CollaboratorError::InvalidResponse(
                    "prediction has no status url".to_string(),
                ));
            };
            tokio::time::sleep(POLL_INTERVAL).await;
            let response = self
                .http
                .get(&urls.get)
                .bearer_auth(api_key)
                .send()
                .await
                .map_err(transport)?;
            prediction = parse(ensure_success(response).await?).await?;
            polls += 1;
        }

        if prediction.status != "succeeded" {
            let reason = prediction
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| prediction.status.clone());
            return Err(CollaboratorError::InvalidResponse(format!(
                "image generation failed: {}",
                reason
            )));
        }

        prediction
            .image_url()
            .map(str::to_string)
            .ok_or_else(|| CollaboratorError::InvalidResponse("no image was generated".to_string()))
    }
}

async fn parse(response: reqwest::Response) -> Result<Prediction, CollaboratorError> {
    response
        .json()
        .await
        .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl ImageProvider for ImageService {
    #[tracing::instrument(skip(self, sentence))]
    async fn generate(
        &self,
        sentence: &str,
        language: Language,
        word: &str,
    ) -> Result<MediaRef, CollaboratorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(CollaboratorError::NotConfigured("REPLICATE_API_KEY"))?;

        let prompt = match self.prompts.refine_image_prompt(sentence, language).await {
            Ok(prompt) if !prompt.is_empty() => prompt,
            Ok(_) => sentence.to_string(),
            Err(err) => {
                tracing::warn!(error = %err, "prompt refinement failed, using the sentence");
                sentence.to_string()
            }
        };

        let url = self.predict(api_key, &prompt).await?;
        let bytes = download(&self.http, &url).await?;
        let media = self.store.save(MediaKind::Image, word, "png", &bytes).await?;
        tracing::info!(file = %media.file_name(), "image generated");
        Ok(media.with_source("Replicate"))
    }
}
