//! Conversation extraction from rendered chat pages.
//!
//! The pipeline turns one rendered document into a [`Conversation`]:
//!
//! - [`strategy`]: ordered turn-discovery strategies (author-role markers,
//!   conversation-turn containers, embedded script payloads)
//! - [`render`]: flattens a turn's markup into markdown-like text
//! - [`segment`]: splits text into prose and fenced code [`ContentBlock`]s
//! - [`latex`]: rewrites `\(..\)` / `\[..\]` math into `$` / `$$` form
//! - [`assemble`]: the [`Extractor`] that ties the above together
//!
//! The document itself is reached only through the [`dom`] traits; the
//! `scraper`-backed [`HtmlDocument`] is the implementation used in production.
//!
//! ```
//! use chatscrape_extract::{extract_html, ContentBlock, Role};
//!
//! let html = r#"<html><head><title>Arithmetic</title></head><body>
//!   <div data-message-author-role="user"><div class="whitespace-pre-wrap">What is 2+2?</div></div>
//!   <div data-message-author-role="assistant"><div class="markdown"><p>It is 4.</p></div></div>
//! </body></html>"#;
//!
//! let conversation = extract_html(html).expect("extraction succeeds");
//! assert_eq!(conversation.conversation_title, "Arithmetic");
//! assert_eq!(conversation.messages.len(), 2);
//! assert_eq!(conversation.messages[1].role, Role::Assistant);
//! assert_eq!(conversation.messages[1].content, vec![ContentBlock::text("It is 4.")]);
//! ```

pub mod assemble;
pub mod dom;
pub mod error;
pub mod latex;
pub mod model;
pub mod render;
pub mod segment;
pub mod strategy;

pub use assemble::{Clock, Extractor, IdGenerator, SystemClock, UuidIdGenerator};
pub use dom::{DomNode, HtmlDocument, HtmlElement, PageDocument, PageElement};
pub use error::ExtractError;
pub use model::{ContentBlock, Conversation, CreateTime, ExtractionError, Message, Role};

/// Parse `html` and run the default extractor over it.
pub fn extract_html(html: &str) -> Result<Conversation, ExtractionError> {
    let document = HtmlDocument::parse(html);
    Extractor::<HtmlDocument>::new().extract(&document)
}
