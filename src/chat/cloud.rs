use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{ChatContext, ChatError};
use crate::config::Personality;

const ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";
const TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

fn trait_line(personality: Personality) -> &'static str {
    match personality {
        Personality::Playful => "You are playful and mischievous and love making jokes.",
        Personality::Calm => "You are zen, composed and a little philosophical.",
        Personality::Energetic => "You are hyperactive, enthusiastic and always ready for action!",
        Personality::Lazy => "You are lazy, love sleeping and talk slowly, but you are adorable.",
    }
}

/// The full prompt sent for one user message.
pub fn build_prompt(message: &str, ctx: &ChatContext) -> String {
    format!(
        "You are {pet}, a small virtual pet living on {user}'s desktop. {traits}\n\
         Answer factual questions accurately and concisely. For casual chat be warm and brief.\n\
         It is {now}.\n\
         If {user} asks you to remember something, include {{\"action\": \"note\", \"content\": \"...\"}}.\n\
         If {user} asks what they noted about something, include {{\"action\": \"search_notes\", \"query\": \"...\"}}.\n\
         If {user} asks for a reminder, include {{\"action\": \"reminder\", \"time\": \"in 10 minutes\" or \"14:30\", \"message\": \"...\"}}.\n\
         If {user} wants a sweet word, a quote or an idea, include {{\"action\": \"random_message\", \"type\": \"love\" | \"quote\" | \"research\"}}.\n\
         \n\
         Message from {user}: \"{message}\"",
        pet = ctx.pet_name,
        user = ctx.user_name,
        traits = trait_line(ctx.personality),
        now = ctx.now.format("%A %H:%M"),
    )
}

/// Blocking client for Gemini `generateContent`.
pub struct Gemini {
    client: Client,
    api_key: String,
}

impl Gemini {
    pub fn new(api_key: &str) -> Result<Self, ChatError> {
        let client = Client::builder().timeout(TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
        })
    }

    /// Send one message and return the model's raw text.
    pub fn ask(&self, message: &str, ctx: &ChatContext) -> Result<String, ChatError> {
        let prompt = build_prompt(message, ctx);
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: &prompt }],
            }],
        };

        let response = self
            .client
            .post(ENDPOINT)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()?;

        if !response.status().is_success() {
            return Err(ChatError::Status(response.status()));
        }

        let parsed: GenerateResponse = response.json()?;
        let text = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyReply);
        }
        Ok(text.to_string())
    }
}
