//! Vendor response envelopes and their mapping into plain text.
//!
//! Each vendor wraps the generated text differently. Rather than probing
//! fields ad hoc, each shape is a typed struct with one explicit extraction
//! path; adapters pick the variant that matches their vendor.

use serde::Deserialize;

use crate::error::GenError;
use crate::message::ProviderId;

/// The response-shape families across the supported vendors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Envelope {
    /// OpenAI-style `choices[0].message.content`. Most vendors speak this.
    ChatChoices,
    /// Anthropic messages: `content` is a list of typed blocks.
    MessageBlocks,
    /// Gemini: `candidates[0].content.parts[*].text`.
    Candidates,
    /// Cohere chat: a single top-level `text` field.
    TextField,
    /// Ollama generate: newline-delimited JSON fragments, each with a
    /// `response` piece; the full text is their concatenation.
    NdjsonFragments,
    /// Hugging Face inference: an array of generation objects.
    Generations,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicMessage {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct CohereChat {
    text: Option<String>,
}

#[derive(Deserialize)]
struct OllamaFragment {
    response: Option<String>,
}

#[derive(Deserialize)]
struct Generation {
    generated_text: Option<String>,
}

/// Extract the generated text from a 2xx body. The text is returned exactly
/// as the vendor produced it; normalization is strictly downstream.
pub fn extract(envelope: Envelope, provider: ProviderId, body: &[u8]) -> Result<String, GenError> {
    let text = match envelope {
        Envelope::ChatChoices => {
            let completion: ChatCompletion = parse(provider, body)?;
            completion
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
        }
        Envelope::MessageBlocks => {
            let message: AnthropicMessage = parse(provider, body)?;
            let text: String = message
                .content
                .into_iter()
                .filter(|b| b.kind == "text")
                .filter_map(|b| b.text)
                .collect();
            (!text.is_empty()).then_some(text)
        }
        Envelope::Candidates => {
            let response: GeminiResponse = parse(provider, body)?;
            let text: String = response
                .candidates
                .into_iter()
                .next()
                .map(|c| {
                    c.content
                        .parts
                        .into_iter()
                        .filter_map(|p| p.text)
                        .collect()
                })
                .unwrap_or_default();
            (!text.is_empty()).then_some(text)
        }
        Envelope::TextField => {
            let chat: CohereChat = parse(provider, body)?;
            chat.text
        }
        Envelope::NdjsonFragments => {
            let mut text = String::new();
            for line in body.split(|b| *b == b'\n') {
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                let fragment: OllamaFragment = parse(provider, line)?;
                if let Some(piece) = fragment.response {
                    text.push_str(&piece);
                }
            }
            (!text.is_empty()).then_some(text)
        }
        Envelope::Generations => {
            let generations: Vec<Generation> = parse(provider, body)?;
            generations
                .into_iter()
                .next()
                .and_then(|g| g.generated_text)
        }
    };

    text.filter(|t| !t.trim().is_empty())
        .ok_or_else(|| GenError::Unknown {
            provider,
            status: None,
            message: "provider returned an empty completion".to_string(),
        })
}

fn parse<'a, T: Deserialize<'a>>(provider: ProviderId, body: &'a [u8]) -> Result<T, GenError> {
    serde_json::from_slice(body).map_err(|e| GenError::Unknown {
        provider,
        status: None,
        message: format!("failed to parse provider response: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_choices() {
        let body = br#"{"choices":[{"message":{"role":"assistant","content":"feat: x"}}]}"#;
        let text = extract(Envelope::ChatChoices, ProviderId::OpenAi, body).unwrap();
        assert_eq!(text, "feat: x");
    }

    #[test]
    fn anthropic_blocks_skip_thinking() {
        let body = br#"{"content":[
            {"type":"thinking","text":"hmm"},
            {"type":"text","text":"fix: y"}
        ]}"#;
        let text = extract(Envelope::MessageBlocks, ProviderId::Anthropic, body).unwrap();
        assert_eq!(text, "fix: y");
    }

    #[test]
    fn gemini_candidates_concatenate_parts() {
        let body = br#"{"candidates":[{"content":{"parts":[{"text":"a"},{"text":"b"}]}}]}"#;
        let text = extract(Envelope::Candidates, ProviderId::Gemini, body).unwrap();
        assert_eq!(text, "ab");
    }

    #[test]
    fn ollama_fragments_concatenate() {
        let body = b"{\"response\":\"fe\"}\n{\"response\":\"at: z\"}\n{\"done\":true}\n";
        let text = extract(Envelope::NdjsonFragments, ProviderId::Ollama, body).unwrap();
        assert_eq!(text, "feat: z");
    }

    #[test]
    fn generations_array() {
        let body = br#"[{"generated_text":"docs: readme"}]"#;
        let text = extract(Envelope::Generations, ProviderId::HuggingFace, body).unwrap();
        assert_eq!(text, "docs: readme");
    }

    #[test]
    fn empty_content_is_an_error() {
        let body = br#"{"choices":[{"message":{"content":null}}]}"#;
        let err = extract(Envelope::ChatChoices, ProviderId::OpenAi, body).unwrap_err();
        assert!(matches!(err, GenError::Unknown { .. }));

        let body = br#"{"text":"   "}"#;
        let err = extract(Envelope::TextField, ProviderId::Cohere, body).unwrap_err();
        assert!(matches!(err, GenError::Unknown { .. }));
    }
}
