//! Turn discovery.
//!
//! Each strategy locates message turns in a document its own way and hands back
//! raw turns; the [`Extractor`](crate::Extractor) tries them in order until one
//! produces messages. Pages have used three layouts over time, newest first:
//! explicit author-role markers, generic conversation-turn containers, and a
//! JSON payload embedded in a script element.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::dom::{PageDocument, PageElement};
use crate::error::ExtractError;
use crate::model::{CreateTime, Role};
use crate::render;

const AUTHOR_ROLE_SELECTOR: &str =
    "div[data-message-author-role='user'], div[data-message-author-role='assistant']";
const CONVERSATION_TURN_SELECTOR: &str = "[data-testid^='conversation-turn']";
const CONTENT_CONTAINER_SELECTOR: &str = ".whitespace-pre-wrap, .markdown";
const AUTHOR_ROLE_ATTR: &str = "data-message-author-role";

const PAYLOAD_MARKER: &str = "parts\":[";

static PAYLOAD_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)"id":"(.*?)".*?"role":"(user|assistant)".*?"create_time":(.*?),.*?"parts":\["(.*?)"\]"#,
    )
    .expect("payload message pattern")
});

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("leading number pattern")
});

/// One discovered turn before segmentation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTurn {
    pub role: Role,
    /// Rendered text, or the raw payload string for script-recovered turns.
    pub body: String,
    /// `None` when the page carries no time; the assembler stamps it.
    pub created: Option<CreateTime>,
}

pub trait TurnDiscovery<D: PageDocument>: Send + Sync {
    fn name(&self) -> &'static str;

    fn discover(&self, document: &D) -> Result<Vec<RawTurn>, ExtractError>;
}

/// The production chain, most specific layout first.
pub fn default_strategies<D: PageDocument>() -> Vec<Box<dyn TurnDiscovery<D>>> {
    vec![
        Box::new(AuthorRoleDiscovery),
        Box::new(ConversationTurnDiscovery),
        Box::new(ScriptPayloadDiscovery),
    ]
}

/// Render the most specific content container inside `turn`.
fn render_turn<E: PageElement>(turn: &E) -> Result<String, ExtractError> {
    let body = match turn.query_first(CONTENT_CONTAINER_SELECTOR)? {
        Some(container) => render::render(&container),
        None => render::render(turn),
    };
    Ok(body)
}

/// Elements explicitly marked with a `user` or `assistant` author role.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuthorRoleDiscovery;

impl<D: PageDocument> TurnDiscovery<D> for AuthorRoleDiscovery {
    fn name(&self) -> &'static str {
        "author-role"
    }

    fn discover(&self, document: &D) -> Result<Vec<RawTurn>, ExtractError> {
        let turns = document.query_all(AUTHOR_ROLE_SELECTOR)?;
        debug!(target: "extract.strategy", strategy = "author-role", found = turns.len());

        turns
            .iter()
            .map(|turn| {
                let role = turn
                    .attribute(AUTHOR_ROLE_ATTR)
                    .map(|marker| Role::from_marker(&marker))
                    .unwrap_or(Role::Unknown);
                Ok(RawTurn {
                    role,
                    body: render_turn(turn)?,
                    created: None,
                })
            })
            .collect()
    }
}

/// Generic `conversation-turn*` containers. Roles come from the turn's own
/// marker when it has one, otherwise alternate user/assistant by position.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConversationTurnDiscovery;

impl<D: PageDocument> TurnDiscovery<D> for ConversationTurnDiscovery {
    fn name(&self) -> &'static str {
        "conversation-turn"
    }

    fn discover(&self, document: &D) -> Result<Vec<RawTurn>, ExtractError> {
        let turns = document.query_all(CONVERSATION_TURN_SELECTOR)?;
        debug!(target: "extract.strategy", strategy = "conversation-turn", found = turns.len());

        turns
            .iter()
            .enumerate()
            .map(|(index, turn)| {
                let role = turn
                    .attribute(AUTHOR_ROLE_ATTR)
                    .filter(|marker| !marker.trim().is_empty())
                    .map(|marker| Role::from_marker(&marker))
                    .unwrap_or_else(|| positional_role(index));
                Ok(RawTurn {
                    role,
                    body: render_turn(turn)?,
                    created: None,
                })
            })
            .collect()
    }
}

fn positional_role(index: usize) -> Role {
    if index % 2 == 0 {
        Role::User
    } else {
        Role::Assistant
    }
}

/// Messages recovered from a JSON payload embedded in `<script>` elements.
///
/// The document is serialized and re-parsed so the scan sees the page exactly
/// as captured. Bodies are the raw `parts` strings and skip rendering.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptPayloadDiscovery;

impl<D: PageDocument> TurnDiscovery<D> for ScriptPayloadDiscovery {
    fn name(&self) -> &'static str {
        "script-payload"
    }

    fn discover(&self, document: &D) -> Result<Vec<RawTurn>, ExtractError> {
        let reparsed = D::from_html(&document.outer_html());
        let scripts = reparsed.query_all("script")?;

        let mut turns = Vec::new();
        let mut scanned = 0usize;
        for script in &scripts {
            let text = script.text_content();
            if !text.contains(PAYLOAD_MARKER) {
                continue;
            }
            scanned += 1;
            turns.extend(scan_payload(&text));
        }

        debug!(
            target: "extract.strategy",
            strategy = "script-payload",
            scripts = scripts.len(),
            scanned,
            found = turns.len()
        );
        Ok(turns)
    }
}

fn scan_payload(text: &str) -> Vec<RawTurn> {
    PAYLOAD_MESSAGE
        .captures_iter(text)
        .filter_map(|caps| {
            let id = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let raw_time = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
            let Some(seconds) = parse_leading_float(raw_time) else {
                warn!(target: "extract.strategy", id, raw_time, "payload message without usable create_time, skipped");
                return None;
            };
            let created = CreateTime::UnixSeconds(seconds);
            if created.to_iso().is_none() {
                warn!(target: "extract.strategy", id, seconds, "payload create_time out of range, skipped");
                return None;
            }
            Some(RawTurn {
                role: Role::from_marker(&caps[2]),
                body: caps[4].to_string(),
                created: Some(created),
            })
        })
        .collect()
}

/// Longest numeric prefix of `raw` (after leading whitespace), if finite.
fn parse_leading_float(raw: &str) -> Option<f64> {
    let prefix = LEADING_NUMBER.find(raw.trim_start())?;
    prefix.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}
