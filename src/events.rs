use serde::{Deserialize, Serialize};

/// Fallback returned when an event log contains no assistant-authored text.
pub const NO_FINAL_REPLY: &str = "Agent did not provide a final text response.";

/// One authored entry in a session's event log.
///
/// Runtimes emit loosely shaped records; every field the gateway reads is
/// optional and checked for presence before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
}

/// A content fragment within an event.
///
/// Text fragments sit alongside tool calls and other structured payloads in
/// the same `parts` array, and some runtimes emit bare values there too.
/// Anything that is not a JSON object lands in `Other` so a single foreign
/// part cannot fail deserialization of the whole log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Fragment {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(flatten)]
        rest: serde_json::Map<String, serde_json::Value>,
    },
    Other(serde_json::Value),
}

impl Part {
    pub fn text(&self) -> Option<&str> {
        match self {
            Part::Fragment { text: Some(t), .. } => Some(t.as_str()),
            _ => None,
        }
    }
}

/// A single user/assistant turn in a normalized transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

/// Extract the final reply text from a turn's event log.
///
/// A logical turn may be split across several events, and a single event may
/// carry several parts (intermediate tool fragments followed by final text).
/// The last text-bearing part of the last model-role event is the
/// authoritative answer, so both scans run newest-first. Events whose
/// content is absent, not model-role, or partless are skipped, as are parts
/// without text. If the whole log yields nothing, [`NO_FINAL_REPLY`] is
/// returned.
pub fn extract_final_reply(events: &[Event]) -> String {
    for event in events.iter().rev() {
        let Some(content) = &event.content else {
            continue;
        };
        if content.role.as_deref() != Some("model") {
            continue;
        }
        let Some(parts) = &content.parts else {
            continue;
        };
        for part in parts.iter().rev() {
            if let Some(text) = part.text() {
                return text.to_string();
            }
        }
    }
    NO_FINAL_REPLY.to_string()
}

/// Convert a session's full event log into a chronological transcript.
///
/// Only USER and MODEL authored events survive; system and tool events are
/// dropped. Unlike [`extract_final_reply`], only the first part of each
/// event is considered — history keeps the primary utterance, not
/// elaboration fragments — and an event whose first part has no text is
/// dropped entirely.
pub fn normalize_history(events: &[Event]) -> Vec<HistoryEntry> {
    let mut history = Vec::new();
    for event in events {
        let role = match event.author.as_deref() {
            Some("USER") => HistoryRole::User,
            Some("MODEL") => HistoryRole::Assistant,
            _ => continue,
        };
        let Some(parts) = event.content.as_ref().and_then(|c| c.parts.as_ref()) else {
            continue;
        };
        let Some(text) = parts.first().and_then(Part::text) else {
            continue;
        };
        if text.is_empty() {
            continue;
        }
        history.push(HistoryEntry {
            role,
            content: text.to_string(),
        });
    }
    history
}
