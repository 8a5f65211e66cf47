use chatscrape_common::time::{iso_millis_from_unix_millis, iso_millis_from_unix_seconds};
use serde::{Serialize, Serializer};

/// One typed piece of a message body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { data: String },
    Code { language: String, data: String },
}

impl ContentBlock {
    pub fn text(data: impl Into<String>) -> Self {
        Self::Text { data: data.into() }
    }

    pub fn code(language: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Code {
            language: language.into(),
            data: data.into(),
        }
    }

    pub fn data(&self) -> &str {
        match self {
            Self::Text { data } | Self::Code { data, .. } => data,
        }
    }

    pub fn language(&self) -> Option<&str> {
        match self {
            Self::Text { .. } => None,
            Self::Code { language, .. } => Some(language),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Unknown,
}

impl Role {
    /// Map a page-provided author marker; anything unrecognised is `Unknown`.
    pub fn from_marker(marker: &str) -> Self {
        match marker.trim() {
            "user" => Self::User,
            "assistant" => Self::Assistant,
            _ => Self::Unknown,
        }
    }
}

/// Message creation time, tagged with the unit it was recorded in.
///
/// DOM-discovered turns carry the capture wall clock in milliseconds; turns
/// recovered from embedded payloads carry the page's own value in (fractional)
/// seconds. Both serialize as a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CreateTime {
    UnixMillis(i64),
    UnixSeconds(f64),
}

impl CreateTime {
    /// ISO-8601 rendering of the instant, `None` if it is not representable.
    pub fn to_iso(&self) -> Option<String> {
        match *self {
            Self::UnixMillis(ms) => iso_millis_from_unix_millis(ms),
            Self::UnixSeconds(secs) => iso_millis_from_unix_seconds(secs),
        }
    }
}

impl Serialize for CreateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Self::UnixMillis(ms) => serializer.serialize_i64(ms),
            Self::UnixSeconds(secs) => serializer.serialize_f64(secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub create_time: CreateTime,
    pub content: Vec<ContentBlock>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    pub conversation_id: String,
    pub conversation_title: String,
    pub messages: Vec<Message>,
}

/// Terminal result when extraction could not run at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{error}")]
pub struct ExtractionError {
    pub error: String,
}
