//! OpenAI chat completions: fact oracle, definitions, grammar checks and
//! image prompt refinement.

use async_trait::async_trait;
use forge_core::{
    CollaboratorError, DefinitionGenerator, DefinitionRequest, GrammarCheck, GrammarChecker,
    Language, LanguageOracle,
};
use serde::Deserialize;

use super::{ensure_success, transport};
use crate::config::OpenAiConfig;

/// Sampling settings for one chat call.
#[derive(Debug, Clone, Copy)]
struct Sampling {
    temperature: f32,
    max_tokens: u32,
    json: bool,
}

const FACT_CHECK: Sampling = Sampling {
    temperature: 0.0,
    max_tokens: 200,
    json: false,
};
const DEFINITION: Sampling = Sampling {
    temperature: 0.7,
    max_tokens: 300,
    json: false,
};
const GRAMMAR: Sampling = Sampling {
    temperature: 0.3,
    max_tokens: 300,
    json: true,
};
const IMAGE_PROMPT: Sampling = Sampling {
    temperature: 0.7,
    max_tokens: 200,
    json: false,
};

/// OpenAI API client
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    check_model: String,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, config: &OpenAiConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            check_model: config.check_model.clone(),
        }
    }

    async fn chat(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
        sampling: Sampling,
    ) -> Result<String, CollaboratorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(CollaboratorError::NotConfigured("OPENAI_API_KEY"))?;

        let mut body = serde_json::json!({
            "model": model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "temperature": sampling.temperature,
            "max_tokens": sampling.max_tokens,
        });
        if sampling.json {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let response = ensure_success(response).await?;

        #[derive(Deserialize)]
        struct Message {
            content: Option<String>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct ApiResponse {
            choices: Vec<Choice>,
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))?;
        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| CollaboratorError::InvalidResponse("OpenAI returned no choices".into()))
    }

    /// Turn an example sentence into a visual prompt for image generation.
    #[tracing::instrument(skip(self))]
    pub async fn refine_image_prompt(
        &self,
        sentence: &str,
        language: Language,
    ) -> Result<String, CollaboratorError> {
        self.chat(
            &self.model,
            "You are an expert at creating detailed, visual prompts for AI image generation.",
            &image_prompt(sentence, language),
            IMAGE_PROMPT,
        )
        .await
    }
}

#[async_trait]
impl LanguageOracle for OpenAiClient {
    async fn resolve(&self, prompt: &str) -> Result<String, CollaboratorError> {
        self.chat(
            &self.check_model,
            "You are a precise linguistic assistant. Answer only in the requested format.",
            prompt,
            FACT_CHECK,
        )
        .await
    }
}

#[async_trait]
impl DefinitionGenerator for OpenAiClient {
    #[tracing::instrument(skip(self, request), fields(word = %request.word))]
    async fn define(&self, request: &DefinitionRequest) -> Result<String, CollaboratorError> {
        let system = format!(
            "You are a {} language teacher providing simple definitions for language learners.",
            request.language
        );
        self.chat(&self.model, &system, &definition_prompt(request), DEFINITION)
            .await
    }
}

#[async_trait]
impl GrammarChecker for OpenAiClient {
    #[tracing::instrument(skip(self, sentence))]
    async fn check(
        &self,
        sentence: &str,
        language: Language,
        word: &str,
    ) -> Result<GrammarCheck, CollaboratorError> {
        let system = format!(
            "You are a {} language teacher checking grammar for language learners.",
            language
        );
        let text = self
            .chat(
                &self.model,
                &system,
                &grammar_prompt(sentence, language, word),
                GRAMMAR,
            )
            .await?;
        parse_grammar_check(&text)
    }
}

/// Nouns are defined with article and plural; everything else as the bare word.
pub fn definition_prompt(request: &DefinitionRequest) -> String {
    let language = request.language.name();
    let word_lines = match (&request.gender, &request.plural) {
        (Some(article), Some(plural)) if request.word_type.is_noun() => {
            format!("Word: {} {}\nPlural: {}", article, request.word, plural)
        }
        (Some(article), None) if request.word_type.is_noun() => {
            format!("Word: {} {}", article, request.word)
        }
        _ => format!("Word: {}", request.word),
    };
    format!(
        "As a {language} language expert, provide a clear and simple definition IN {upper} \
         for the {word_type}:\n\
         \n\
         {word_lines}\n\
         \n\
         Important guidelines:\n\
         1. The definition must be IN {upper} only, not in English or any other language\n\
         2. Use simple {language} that a language learner could understand\n\
         3. Include 1-2 common usage examples\n\
         4. Keep the definition concise (3-5 sentences maximum)\n\
         5. Do not include any translations",
        upper = language.to_uppercase(),
        word_type = request.word_type,
    )
}

fn grammar_prompt(sentence: &str, language: Language, word: &str) -> String {
    format!(
        "As a {language} language expert, check the grammar of this sentence that uses the word \"{word}\":\n\
         \n\
         Sentence: {sentence}\n\
         \n\
         1. Verify if the sentence is grammatically correct in {language}\n\
         2. Check if the word \"{word}\" is used correctly\n\
         3. If there are errors, provide a corrected version\n\
         4. Explain any corrections in simple {language}\n\
         \n\
         Respond with a JSON object with these fields:\n\
         - is_correct: true/false\n\
         - corrected_sentence: (only if is_correct is false)\n\
         - explanation: (explanation in {language})"
    )
}

fn image_prompt(sentence: &str, language: Language) -> String {
    format!(
        "Convert this {language} sentence into a detailed visual scene description in English \
         for AI image generation:\n\
         \n\
         Sentence: {sentence}\n\
         \n\
         Add visual details like colors, lighting, style and mood, keep the core meaning, \
         write it as a comma-separated list of descriptive elements of at most 3 sentences, \
         and reply with the prompt only."
    )
}

/// Parse the grammar checker's JSON object.
///
/// A missing `is_correct` counts as incorrect; a missing correction leaves the
/// learner's sentence in place.
pub fn parse_grammar_check(text: &str) -> Result<GrammarCheck, CollaboratorError> {
    #[derive(Deserialize)]
    struct RawCheck {
        #[serde(default)]
        is_correct: Option<bool>,
        #[serde(default)]
        corrected_sentence: Option<String>,
        #[serde(default)]
        explanation: Option<String>,
    }

    let json = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    let raw: RawCheck = serde_json::from_str(json)
        .map_err(|e| CollaboratorError::InvalidResponse(format!("grammar check: {}", e)))?;

    let is_correct = raw.is_correct.unwrap_or(false);
    Ok(GrammarCheck {
        is_correct,
        corrected_sentence: raw
            .corrected_sentence
            .map(|s| s.trim().to_string())
            .filter(|s| !is_correct && !s.is_empty()),
        explanation: raw
            .explanation
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "No explanation provided.".to_string()),
    })
}
