//! Card export to Anki through the AnkiConnect add-on.

use async_trait::async_trait;
use base64::Engine;
use html_escape::{encode_double_quoted_attribute, encode_text};
use forge_core::{CardArtifact, CollaboratorError, ContentBlock, ExportReceipt, ExportTarget};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ensure_success, transport};
use crate::config::AnkiConfig;

const ANKI_CONNECT_VERSION: u32 = 6;

/// Tags added to every exported note.
const EXPORT_TAGS: &[&str] = &["auto"];

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    error: Option<String>,
}

pub struct AnkiConnect {
    http: reqwest::Client,
    url: String,
    note_model: String,
}

impl AnkiConnect {
    pub fn new(http: reqwest::Client, config: &AnkiConfig) -> Self {
        Self {
            http,
            url: config.url.clone(),
            note_model: config.note_model.clone(),
        }
    }

    /// Call one AnkiConnect action. A `null` result is returned as `None`.
    async fn invoke<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Option<serde_json::Value>,
    ) -> Result<Option<T>, CollaboratorError> {
        let mut body = serde_json::json!({
            "action": action,
            "version": ANKI_CONNECT_VERSION,
        });
        if let Some(params) = params {
            body["params"] = params;
        }

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                CollaboratorError::Transport(format!(
                    "could not reach AnkiConnect at {}: {}",
                    self.url, e
                ))
            })?;
        let envelope: Envelope<T> = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| CollaboratorError::InvalidResponse(format!("{}: {}", action, e)))?;

        match envelope.error {
            Some(error) => Err(CollaboratorError::InvalidResponse(format!(
                "{}: {}",
                action, error
            ))),
            None => Ok(envelope.result),
        }
    }

    async fn create_deck(&self, deck: &str) -> Result<(), CollaboratorError> {
        tracing::info!(deck, "creating Anki deck");
        self.invoke::<i64>("createDeck", Some(serde_json::json!({ "deck": deck })))
            .await?;
        Ok(())
    }

    async fn store_media(&self, path: &std::path::Path) -> Result<(), CollaboratorError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| CollaboratorError::InvalidResponse(format!("{} has no file name", path.display())))?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CollaboratorError::Transport(format!("media file {}: {}", path.display(), e)))?;

        self.invoke::<String>(
            "storeMediaFile",
            Some(serde_json::json!({
                "filename": file_name,
                "data": base64::engine::general_purpose::STANDARD.encode(bytes),
            })),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ExportTarget for AnkiConnect {
    #[tracing::instrument(skip(self, artifact))]
    async fn upload(
        &self,
        artifact: &CardArtifact,
        deck: &str,
    ) -> Result<ExportReceipt, CollaboratorError> {
        let decks = self.deck_names().await?;
        if !decks.iter().any(|d| d == deck) {
            self.create_deck(deck).await?;
        }

        for media in &artifact.media_refs {
            self.store_media(&media.path).await?;
        }

        let mut tags: Vec<String> = artifact.tags.iter().cloned().collect();
        tags.extend(EXPORT_TAGS.iter().map(|t| t.to_string()));
        tags.sort();
        tags.dedup();

        let note = serde_json::json!({
            "note": {
                "deckName": deck,
                "modelName": self.note_model,
                "fields": {
                    "Front": render_front(&artifact.front_blocks),
                    "Back": render_back(&artifact.back_blocks),
                },
                "tags": tags,
                "options": { "allowDuplicate": false }
            }
        });
        let id: i64 = self
            .invoke("addNote", Some(note))
            .await?
            .ok_or_else(|| CollaboratorError::InvalidResponse("addNote returned no note id".into()))?;

        Ok(ExportReceipt {
            id: id.to_string(),
            deck: deck.to_string(),
        })
    }

    async fn deck_names(&self) -> Result<Vec<String>, CollaboratorError> {
        Ok(self
            .invoke::<Vec<String>>("deckNames", None)
            .await?
            .unwrap_or_default())
    }

    async fn check_connection(&self) -> Result<String, CollaboratorError> {
        let version = self
            .invoke::<serde_json::Value>("version", None)
            .await?
            .ok_or_else(|| CollaboratorError::InvalidResponse("version returned nothing".into()))?;
        Ok(match version {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
    }
}

pub fn render_front(blocks: &[ContentBlock]) -> String {
    format!("<div class=\"card-front\">{}</div>", render_blocks(blocks))
}

pub fn render_back(blocks: &[ContentBlock]) -> String {
    format!("<div class=\"card-back\">{}</div>", render_blocks(blocks))
}

fn render_blocks(blocks: &[ContentBlock]) -> String {
    blocks.iter().map(render_block).collect()
}

fn render_block(block: &ContentBlock) -> String {
    match block {
        ContentBlock::Word { text } => div("word", &encode_text(text)),
        ContentBlock::Pronunciation { file } => {
            div("audio", &format!("[sound:{}]", encode_text(file)))
        }
        ContentBlock::Image { file, alt } => div(
            "image",
            &format!(
                "<img src=\"{}\" alt=\"{}\">",
                encode_double_quoted_attribute(file),
                encode_double_quoted_attribute(alt)
            ),
        ),
        ContentBlock::Definition { text } => {
            div("definition", &encode_text(text).replace('\n', "<br>"))
        }
        ContentBlock::Sentence { text } => div("sentence", &encode_text(text)),
        ContentBlock::GrammarNote { text } => div("grammar-note", &encode_text(text)),
        ContentBlock::NounInfo {
            gender,
            plural,
            plural_only,
        } => {
            let mut inner = String::new();
            if let Some(article) = gender {
                inner.push_str(&div("gender", article.gender_name()));
            }
            match plural {
                Some(plural) => inner.push_str(&div("plural", &encode_text(plural))),
                None if *plural_only => inner.push_str(&div("plural", "plural only")),
                None => inner.push_str(&div("plural", "no plural")),
            }
            div("metadata", &inner)
        }
        ContentBlock::Conjugations { rows } => {
            let rows: String = rows
                .iter()
                .map(|row| {
                    format!(
                        "<tr><td>{}</td><td>{}</td></tr>",
                        encode_text(&row.pronoun),
                        encode_text(&row.display())
                    )
                })
                .collect();
            div("conjugations", &format!("<table>{}</table>", rows))
        }
    }
}

fn div(class: &str, inner: &str) -> String {
    format!("<div class=\"{}\">{}</div>", class, inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::{Article, ConjugationRow};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_front() {
        let html = render_front(&[
            ContentBlock::Word {
                text: "der Hund".to_string(),
            },
            ContentBlock::Pronunciation {
                file: "Hund_1.mp3".to_string(),
            },
            ContentBlock::Image {
                file: "Hund_1.png".to_string(),
                alt: "Hund".to_string(),
            },
        ]);
        assert_eq!(
            html,
            "<div class=\"card-front\"><div class=\"word\">der Hund</div>\
             <div class=\"audio\">[sound:Hund_1.mp3]</div>\
             <div class=\"image\"><img src=\"Hund_1.png\" alt=\"Hund\"></div></div>"
        );
    }

    #[test]
    fn test_render_escapes_text() {
        let html = render_back(&[ContentBlock::Sentence {
            text: "<b>Tom & \"Jerry\"</b>".to_string(),
        }]);
        assert!(html.contains("&lt;b&gt;Tom &amp; \"Jerry\"&lt;/b&gt;"));
    }

    #[test]
    fn test_render_escapes_attributes() {
        let html = render_front(&[ContentBlock::Image {
            file: "Hund_1.png".to_string(),
            alt: "\"><script>".to_string(),
        }]);
        assert!(html.contains("alt=\"&quot;&gt;&lt;script&gt;\""));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_render_noun_info() {
        let html = render_back(&[ContentBlock::NounInfo {
            gender: Some(Article::Der),
            plural: Some("die Hunde".to_string()),
            plural_only: false,
        }]);
        assert!(html.contains("<div class=\"gender\">masculine</div>"));
        assert!(html.contains("<div class=\"plural\">die Hunde</div>"));
    }

    #[test]
    fn test_render_conjugations() {
        let html = render_back(&[ContentBlock::Conjugations {
            rows: vec![ConjugationRow {
                pronoun: "er".to_string(),
                submitted: "get".to_string(),
                corrected: Some("geht".to_string()),
            }],
        }]);
        assert!(html.contains("<tr><td>er</td><td>get → geht</td></tr>"));
    }

    #[test]
    fn test_envelope_error() {
        let envelope: Envelope<i64> =
            serde_json::from_str(r#"{"result": null, "error": "deck was not found"}"#).unwrap();
        assert_eq!(envelope.result, None);
        assert_eq!(envelope.error.as_deref(), Some("deck was not found"));
    }
}
