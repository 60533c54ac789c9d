//! Hugging Face Inference API text generator.
//!
//! Posts the prompt to a hosted text-generation model and returns the
//! completion with the echoed prompt removed. Free-tier models are often
//! cold or rate limited; every failure is reported as a `GenerationError`
//! and the synthesizer falls back.

use super::{GenerationError, TextGenerator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api-inference.huggingface.co/models/gpt2";

/// Completions longer than this are cut.
pub const DEFAULT_MAX_CHARS: usize = 150;

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Generated(Vec<GeneratedText>),
    Failed { error: String },
}

pub struct HuggingFaceGenerator {
    client: reqwest::blocking::Client,
    endpoint: String,
    token: String,
    max_chars: usize,
}

impl HuggingFaceGenerator {
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        max_chars: usize,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
            max_chars,
        })
    }

    fn parse_response(
        prompt: &str,
        body: InferenceResponse,
        max_chars: usize,
    ) -> Result<String, GenerationError> {
        match body {
            InferenceResponse::Generated(items) => {
                let first = items.into_iter().next().ok_or_else(|| {
                    GenerationError::InvalidResponse("empty result list".into())
                })?;
                Ok(extract_completion(prompt, &first.generated_text, max_chars))
            }
            InferenceResponse::Failed { error } => Err(GenerationError::Api {
                status: 200,
                message: error,
            }),
        }
    }
}

impl TextGenerator for HuggingFaceGenerator {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, GenerationError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .timeout(timeout)
            .json(&InferenceRequest { inputs: prompt })
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::Network(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().unwrap_or_else(|_| "unknown error".into());
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: InferenceResponse = resp.json().map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout
            } else {
                GenerationError::InvalidResponse(e.to_string())
            }
        })?;
        Self::parse_response(prompt, body, self.max_chars)
    }
}

/// Text after the last echo of `prompt`, trimmed and cut to `max_chars`.
fn extract_completion(prompt: &str, generated: &str, max_chars: usize) -> String {
    let completion = if prompt.is_empty() {
        generated
    } else {
        generated
            .rsplit_once(prompt)
            .map(|(_, after)| after)
            .unwrap_or(generated)
    }
    .trim();
    completion.chars().take(max_chars).collect()
}
