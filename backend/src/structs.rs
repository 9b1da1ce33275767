use serde::{Deserialize, Serialize};

/// A stored note, as read back from the `Notes` table.
#[derive(Serialize, Deserialize, sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub body: Option<String>,
    pub created: Option<String>,
    pub keywords: Option<String>,
}

/// Inbound note payload. Any `id` in the body is dropped during
/// deserialization; the store or the path supplies it.
#[derive(Deserialize, Debug, Clone)]
pub struct NoteDraft {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
}

impl NoteDraft {
    pub fn into_note(self, id: i64) -> Note {
        Note {
            id,
            title: self.title,
            body: self.body,
            created: self.created,
            keywords: self.keywords,
        }
    }
}

/// `{"note": ...}` wrapper used by request and response bodies.
#[derive(Serialize, Deserialize, Debug)]
pub struct NoteEnvelope<T> {
    pub note: T,
}

/// Lookup result. A miss serializes as `{}`.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct NoteLookup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<Note>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct NoteList {
    pub notes: Vec<Note>,
}

/// Body of 404/405 responses.
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        ApiError {
            code: code.to_string(),
            message: message.into(),
        }
    }
}
