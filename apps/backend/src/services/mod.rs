//! Concrete collaborators backed by external HTTP services.

pub mod anki;
pub mod audio;
pub mod image;
pub mod media;
pub mod openai;

use std::sync::Arc;

use forge_core::{CollaboratorError, Collaborators};

use crate::config::Config;

/// Wire every collaborator from configuration.
pub fn collaborators(config: &Config) -> Collaborators {
    let http = reqwest::Client::new();
    let store = media::MediaStore::new(config.media.dir.clone());
    let openai = Arc::new(openai::OpenAiClient::new(http.clone(), &config.openai));

    Collaborators {
        oracle: openai.clone(),
        definitions: openai.clone(),
        grammar: openai.clone(),
        pronunciation: Arc::new(audio::AudioService::new(
            http.clone(),
            &config.media,
            store.clone(),
        )),
        images: Arc::new(image::ImageService::new(
            http.clone(),
            &config.media,
            openai,
            store,
        )),
        export: Arc::new(anki::AnkiConnect::new(http, &config.anki)),
    }
}

pub(crate) fn transport(err: reqwest::Error) -> CollaboratorError {
    CollaboratorError::Transport(err.to_string())
}

/// Turn a non-success response into a `Status` error carrying the body text.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, CollaboratorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(CollaboratorError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Download a file body, e.g. generated images and recordings.
pub(crate) async fn download(
    http: &reqwest::Client,
    url: &str,
) -> Result<Vec<u8>, CollaboratorError> {
    let response = http.get(url).send().await.map_err(transport)?;
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await.map_err(transport)?;
    Ok(bytes.to_vec())
}
