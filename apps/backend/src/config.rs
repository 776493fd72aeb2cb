//! Backend configuration from environment variables.

use std::path::PathBuf;

use anyhow::Context;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo";
pub const DEFAULT_OPENAI_CHECK_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_REPLICATE_MODEL: &str =
    "c221b2b8ef527988fb59bf24a8b97c4561f1c671f73bd389f866bfb27c061316";
pub const DEFAULT_ELEVENLABS_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
pub const DEFAULT_ANKI_CONNECT_URL: &str = "http://localhost:8765";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Model for definitions, grammar checks and image prompts.
    pub model: String,
    /// Lightweight model for fact resolution.
    pub check_model: String,
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub dir: PathBuf,
    pub replicate_api_key: Option<String>,
    /// Replicate model version id used for image generation.
    pub replicate_model: String,
    pub forvo_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_voice_id: String,
}

#[derive(Debug, Clone)]
pub struct AnkiConfig {
    pub url: String,
    pub deck: String,
    pub note_model: String,
}

/// Runtime configuration.
///
/// Missing API keys are not an error here: the service that needs the key
/// reports it as not configured when called.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub openai: OpenAiConfig,
    pub media: MediaConfig,
    pub anki: AnkiConfig,
}

impl Config {
    /// Load from the process environment.
    ///
    /// Variables:
    /// - HOST, PORT: listen address (0.0.0.0:3000)
    /// - OPENAI_API_KEY, OPENAI_BASE_URL, OPENAI_MODEL, OPENAI_CHECK_MODEL
    /// - REPLICATE_API_KEY, REPLICATE_MODEL
    /// - FORVO_API_KEY, ELEVENLABS_API_KEY, ELEVENLABS_VOICE_ID
    /// - ANKI_CONNECT_URL, ANKI_DECK, ANKI_NOTE_MODEL
    /// - MEDIA_DIR: where downloaded audio and images are kept
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        // Blank values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got {}", raw))?,
            None => 3000,
        };

        let media_dir = get("MEDIA_DIR").map(PathBuf::from).unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("card-forge")
                .join("media")
        });

        Ok(Self {
            host: or("HOST", "0.0.0.0"),
            port,
            openai: OpenAiConfig {
                api_key: get("OPENAI_API_KEY"),
                base_url: or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)
                    .trim_end_matches('/')
                    .to_string(),
                model: or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
                check_model: or("OPENAI_CHECK_MODEL", DEFAULT_OPENAI_CHECK_MODEL),
            },
            media: MediaConfig {
                dir: media_dir,
                replicate_api_key: get("REPLICATE_API_KEY"),
                replicate_model: or("REPLICATE_MODEL", DEFAULT_REPLICATE_MODEL),
                forvo_api_key: get("FORVO_API_KEY"),
                elevenlabs_api_key: get("ELEVENLABS_API_KEY"),
                elevenlabs_voice_id: or("ELEVENLABS_VOICE_ID", DEFAULT_ELEVENLABS_VOICE_ID),
            },
            anki: AnkiConfig {
                url: or("ANKI_CONNECT_URL", DEFAULT_ANKI_CONNECT_URL),
                deck: or("ANKI_DECK", "Default"),
                note_model: or("ANKI_NOTE_MODEL", "Basic"),
            },
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
