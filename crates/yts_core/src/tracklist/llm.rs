//! LLM-backed tracklist extraction over an OpenAI-compatible chat API.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use super::{TracklistError, TracklistExtractor};
use crate::config::TracklistSettings;
use crate::logging::JobLogger;
use crate::models::TimedItem;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);
const USER_AGENT: &str = concat!("yt-spleet/", env!("CARGO_PKG_VERSION"));

const SYSTEM_PROMPT: &str = r#"You are a tracklist parser. Given a comment containing a tracklist/setlist, extract all tracks with their timestamps.

Return a JSON object with this exact structure:
{
  "tracks": [
    {
      "number": 1,
      "title": "Track Title",
      "artist": "Artist Name or null if not specified",
      "start_time": "0:00"
    }
  ]
}

Rules:
- Keep start_time EXACTLY as written in the comment (e.g. "1:23:45" or "45:30")
- If artist is combined with title (e.g. "Artist - Title"), split them
- If only title is given, set artist to null
- Include ALL tracks, even if some say "Unreleased" or "ID"
- If a track has no timestamp, use null for start_time
- Return ONLY valid JSON, no markdown or explanation"#;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LlmTracklist {
    #[serde(default)]
    tracks: Vec<LlmTrack>,
}

/// One track as the model returned it. Fields are loosely typed.
#[derive(Debug, Deserialize)]
struct LlmTrack {
    #[serde(default)]
    number: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    start_time: Option<Value>,
}

/// Extracts tracklists with a chat-completions model.
pub struct LlmExtractor {
    client: reqwest::blocking::Client,
    api_base: String,
    model: String,
    api_key_env: String,
}

impl LlmExtractor {
    pub fn new(
        api_base: impl Into<String>,
        model: impl Into<String>,
        api_key_env: impl Into<String>,
    ) -> Result<Self, TracklistError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.into(),
            model: model.into(),
            api_key_env: api_key_env.into(),
        })
    }

    pub fn from_settings(settings: &TracklistSettings) -> Result<Self, TracklistError> {
        Self::new(&settings.api_base, &settings.model, &settings.api_key_env)
    }

    fn api_key(&self) -> Result<String, TracklistError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| TracklistError::MissingApiKey(self.api_key_env.clone()))
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    fn request_body(&self, text: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": format!("Parse this tracklist comment:\n\n{}", text) },
            ],
            "response_format": { "type": "json_object" },
        })
    }
}

impl TracklistExtractor for LlmExtractor {
    fn name(&self) -> &str {
        &self.model
    }

    fn extract(
        &self,
        text: &str,
        logger: Option<&JobLogger>,
    ) -> Result<Vec<TimedItem>, TracklistError> {
        let api_key = self.api_key()?;
        tracing::debug!(model = %self.model, "Requesting tracklist extraction");
        if let Some(logger) = logger {
            logger.info(&format!("Parsing tracklist with {}", self.model));
        }

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&self.request_body(text))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(TracklistError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json()?;
        let content = chat
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(TracklistError::EmptyResponse)?;

        items_from_content(&content)
    }
}

/// Convert the model's JSON content into items.
///
/// `start_time` is kept verbatim; the model is never trusted with arithmetic.
fn items_from_content(content: &str) -> Result<Vec<TimedItem>, TracklistError> {
    let parsed: LlmTracklist = serde_json::from_str(strip_code_fence(content))?;

    Ok(parsed
        .tracks
        .into_iter()
        .enumerate()
        .map(|(i, track)| {
            let sequence_number = track
                .number
                .as_ref()
                .and_then(value_as_number)
                .unwrap_or(i as u32 + 1);
            let title = track
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Unknown".to_string());
            let artist = track
                .artist
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty() && !a.eq_ignore_ascii_case("null"));
            let raw_timestamp = track.start_time.as_ref().and_then(value_as_text);

            TimedItem::new(sequence_number, title, artist, raw_timestamp)
        })
        .collect())
}

/// A positive track number; zero falls back to the list position.
fn value_as_number(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    n.filter(|&n| n > 0)
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Some models wrap JSON in a Markdown fence despite instructions.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_model_output() {
        let content = r#"{
            "tracks": [
                {"number": 1, "title": "Delilah", "artist": "Fred again..", "start_time": "0:00"},
                {"number": "2", "title": "ID", "artist": null, "start_time": "1:02:03"},
                {"title": "", "artist": "null", "start_time": null},
                {"number": 9, "title": "Late", "start_time": 754}
            ]
        }"#;
        let items = items_from_content(content).unwrap();

        assert_eq!(items.len(), 4);
        assert_eq!(
            items[0],
            TimedItem::new(
                1,
                "Delilah",
                Some("Fred again..".to_string()),
                Some("0:00".to_string())
            )
        );
        assert_eq!(items[1].sequence_number, 2);
        assert_eq!(items[1].raw_timestamp.as_deref(), Some("1:02:03"));
        assert_eq!(items[2].sequence_number, 3);
        assert_eq!(items[2].title, "Unknown");
        assert_eq!(items[2].artist, None);
        assert_eq!(items[2].raw_timestamp, None);
        assert_eq!(items[3].sequence_number, 9);
        assert_eq!(items[3].raw_timestamp.as_deref(), Some("754"));
    }

    #[test]
    fn zero_track_number_uses_position() {
        let content = r#"{"tracks": [
            {"number": 0, "title": "A", "start_time": "0:00"},
            {"number": "0", "title": "B", "start_time": "1:00"},
            {"number": 7, "title": "C", "start_time": "2:00"}
        ]}"#;
        let numbers: Vec<u32> = items_from_content(content)
            .unwrap()
            .iter()
            .map(|i| i.sequence_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 7]);
    }

    #[test]
    fn tolerates_code_fences() {
        let content = "```json\n{\"tracks\": [{\"title\": \"A\", \"start_time\": \"0:00\"}]}\n```";
        let items = items_from_content(content).unwrap();
        assert_eq!(items[0].title, "A");
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            items_from_content("not json"),
            Err(TracklistError::Json(_))
        ));
    }

    #[test]
    fn missing_api_key_is_reported() {
        let extractor = LlmExtractor::new(
            "https://api.example.invalid/v1/",
            "gpt-5-mini",
            "YTS_TEST_KEY_THAT_IS_NEVER_SET",
        )
        .unwrap();
        assert_eq!(
            extractor.endpoint(),
            "https://api.example.invalid/v1/chat/completions"
        );
        assert!(matches!(
            extractor.extract("0:00 A", None),
            Err(TracklistError::MissingApiKey(var)) if var == "YTS_TEST_KEY_THAT_IS_NEVER_SET"
        ));
    }

    #[test]
    fn request_asks_for_json_object() {
        let extractor = LlmExtractor::new("https://api.example.invalid/v1", "m", "K").unwrap();
        let body = extractor.request_body("0:00 A");
        assert_eq!(body["model"], "m");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .ends_with("0:00 A"));
    }
}
