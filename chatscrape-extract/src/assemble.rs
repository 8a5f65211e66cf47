//! Conversation assembly: strategy chain, segmentation and message metadata.

use std::panic::{AssertUnwindSafe, catch_unwind};

use chatscrape_common::time::iso_millis;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::dom::PageDocument;
use crate::error::ExtractError;
use crate::model::{Conversation, CreateTime, ExtractionError, Message};
use crate::segment::segment;
use crate::strategy::{RawTurn, TurnDiscovery, default_strategies};

/// Message surfaced to callers for every extraction fault.
pub const EXTRACTION_FAILED: &str = "Failed to scrape ChatGPT conversation";

const UNTITLED: &str = "Untitled Conversation";

/// Source of fresh conversation ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Turns one document snapshot into a [`Conversation`].
///
/// Holds no per-run state, so one value can serve any number of documents,
/// from any number of threads.
pub struct Extractor<D: PageDocument> {
    strategies: Vec<Box<dyn TurnDiscovery<D>>>,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
}

impl<D: PageDocument> Default for Extractor<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: PageDocument> Extractor<D> {
    pub fn new() -> Self {
        Self {
            strategies: default_strategies(),
            ids: Box::new(UuidIdGenerator),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the discovery chain. Strategies run in the given order.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn TurnDiscovery<D>>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Extract the conversation, never letting a fault escape.
    ///
    /// Finding no messages is not a failure: the result is a conversation with
    /// an empty message list. Any internal fault (including a panic) is logged
    /// and reported as an [`ExtractionError`] with a fixed message.
    pub fn extract(&self, document: &D) -> Result<Conversation, ExtractionError> {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.try_extract(document)))
            .unwrap_or_else(|payload| Err(ExtractError::Panicked(panic_message(&*payload))));

        outcome.map_err(|err| {
            error!(target: "extract.assemble", error = %err, "conversation extraction failed");
            ExtractionError {
                error: EXTRACTION_FAILED.to_string(),
            }
        })
    }

    fn try_extract(&self, document: &D) -> Result<Conversation, ExtractError> {
        let conversation_id = self.ids.next_id();
        let conversation_title = document.title().unwrap_or_else(|| UNTITLED.to_string());

        let mut messages = Vec::new();
        for strategy in &self.strategies {
            let turns = strategy.discover(document)?;
            let found = turns.len();
            messages = turns
                .into_iter()
                .filter_map(|turn| self.to_message(turn))
                .collect();

            if !messages.is_empty() {
                info!(
                    target: "extract.assemble",
                    strategy = strategy.name(),
                    turns = found,
                    messages = messages.len(),
                    "conversation extracted"
                );
                break;
            }
            debug!(target: "extract.assemble", strategy = strategy.name(), turns = found, "no messages");
        }

        if messages.is_empty() {
            info!(target: "extract.assemble", %conversation_id, "no messages found by any strategy");
        }

        Ok(Conversation {
            conversation_id,
            conversation_title,
            messages,
        })
    }

    fn to_message(&self, turn: RawTurn) -> Option<Message> {
        let content = segment(&turn.body);
        if content.is_empty() {
            return None;
        }

        let (create_time, timestamp) = match turn.created {
            Some(created) => {
                let Some(timestamp) = created.to_iso() else {
                    warn!(target: "extract.assemble", ?created, "unrepresentable create_time, turn dropped");
                    return None;
                };
                (created, timestamp)
            }
            None => {
                let now = self.clock.now();
                (CreateTime::UnixMillis(now.timestamp_millis()), iso_millis(now))
            }
        };

        Some(Message {
            role: turn.role,
            create_time,
            content,
            timestamp,
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlDocument;
    use crate::model::{ContentBlock, Role};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    struct FixedId;

    impl IdGenerator for FixedId {
        fn next_id(&self) -> String {
            "conv-1".to_string()
        }
    }

    fn extractor() -> Extractor<HtmlDocument> {
        let at = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        Extractor::new()
            .with_clock(FixedClock(at))
            .with_id_generator(FixedId)
    }

    fn extract(html: &str) -> Conversation {
        extractor().extract(&HtmlDocument::parse(html)).unwrap()
    }

    #[test]
    fn dom_turns_are_stamped_with_the_clock() {
        let conv = extract(
            r#"<title>Chat</title>
               <div data-message-author-role="user"><div class="whitespace-pre-wrap">Hello</div></div>"#,
        );
        assert_eq!(conv.conversation_id, "conv-1");
        assert_eq!(conv.conversation_title, "Chat");
        let msg = &conv.messages[0];
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.create_time, CreateTime::UnixMillis(1_700_000_000_123));
        assert_eq!(msg.timestamp, "2023-11-14T22:13:20.123Z");
        assert_eq!(msg.content, vec![ContentBlock::text("Hello")]);
    }

    #[test]
    fn turn_containers_without_roles_alternate_user_assistant() {
        let conv = extract(
            r#"<div data-testid="conversation-turn-2"><div class="markdown"><p>Question</p></div></div>
               <div data-testid="conversation-turn-3"><div class="markdown"><p>Answer</p></div></div>"#,
        );
        let roles: Vec<_> = conv.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[test]
    fn empty_turns_are_excluded() {
        let conv = extract(
            r#"<div data-message-author-role="user"><div class="whitespace-pre-wrap">  </div></div>
               <div data-message-author-role="assistant"><div class="markdown"><p>Only me</p></div></div>"#,
        );
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.messages[0].role, Role::Assistant);
    }

    #[test]
    fn all_empty_turns_fall_through_to_the_next_strategy() {
        let conv = extract(
            r#"<div data-message-author-role="user"><div class="markdown"></div></div>
               <div data-testid="conversation-turn-0"><div class="markdown">From turns</div></div>"#,
        );
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.messages[0].content, vec![ContentBlock::text("From turns")]);
    }

    #[test]
    fn payload_turns_keep_page_seconds() {
        let conv = extract(
            r#"<script>{"id":"m1","author":{"role":"assistant"},"create_time":1700000000.5,
                "content":{"parts":["Use this:\n```sh\nls\n```"]}}</script>"#,
        );
        let msg = &conv.messages[0];
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.create_time, CreateTime::UnixSeconds(1_700_000_000.5));
        assert_eq!(msg.timestamp, "2023-11-14T22:13:20.500Z");
        assert_eq!(
            msg.content,
            vec![ContentBlock::text("Use this:"), ContentBlock::code("sh", "ls")]
        );
    }

    #[test]
    fn missing_title_falls_back() {
        let conv = extract("<html><body><p>nothing</p></body></html>");
        assert_eq!(conv.conversation_title, UNTITLED);
        assert!(conv.messages.is_empty());
    }

    #[test]
    fn ids_are_fresh_per_call_by_default() {
        let extractor = Extractor::<HtmlDocument>::new();
        let doc = HtmlDocument::parse("<p></p>");
        let a = extractor.extract(&doc).unwrap().conversation_id;
        let b = extractor.extract(&doc).unwrap().conversation_id;
        assert_ne!(a, b);
    }

    struct Exploding;

    impl TurnDiscovery<HtmlDocument> for Exploding {
        fn name(&self) -> &'static str {
            "exploding"
        }

        fn discover(&self, _: &HtmlDocument) -> Result<Vec<RawTurn>, ExtractError> {
            panic!("boom");
        }
    }

    struct Failing;

    impl TurnDiscovery<HtmlDocument> for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn discover(&self, _: &HtmlDocument) -> Result<Vec<RawTurn>, ExtractError> {
            Err(ExtractError::Selector {
                selector: "div[".into(),
                reason: "unterminated".into(),
            })
        }
    }

    #[test]
    fn faults_become_the_fixed_extraction_error() {
        let doc = HtmlDocument::parse("<p>x</p>");
        for strategies in [
            vec![Box::new(Exploding) as Box<dyn TurnDiscovery<HtmlDocument>>],
            vec![Box::new(Failing) as Box<dyn TurnDiscovery<HtmlDocument>>],
        ] {
            let err = extractor().with_strategies(strategies).extract(&doc).unwrap_err();
            assert_eq!(err.error, EXTRACTION_FAILED);
        }
    }

    #[test]
    fn extraction_error_serializes_as_error_object() {
        let err = ExtractionError {
            error: EXTRACTION_FAILED.to_string(),
        };
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({ "error": "Failed to scrape ChatGPT conversation" })
        );
    }
}
