//! Split rendered text (or a raw payload string) into typed content blocks.

use std::sync::LazyLock;

use regex::Regex;

use crate::latex;
use crate::model::ContentBlock;

static FENCED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(\S*)(.*?)```").expect("fenced code pattern"));

const DEFAULT_LANGUAGE: &str = "plaintext";

/// Turn `text` into prose and code blocks in source order.
///
/// Literal two-character `\n` sequences (as found in JSON-escaped payloads)
/// become real newlines before fences are located, so a fence opened inside a
/// payload string still reads only its language token. Blocks that are empty
/// after trimming are dropped.
///
/// ```
/// use chatscrape_extract::segment::segment;
/// use chatscrape_extract::ContentBlock;
///
/// let blocks = segment("hello\n```js\nconsole.log(1)\n```\nworld");
/// assert_eq!(
///     blocks,
///     vec![
///         ContentBlock::text("hello"),
///         ContentBlock::code("js", "console.log(1)"),
///         ContentBlock::text("world"),
///     ]
/// );
/// ```
pub fn segment(text: &str) -> Vec<ContentBlock> {
    let text = text.replace("\\n", "\n");
    let text = text.as_str();
    let mut blocks = Vec::new();
    let mut last = 0;

    for caps in FENCED_CODE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };

        push_text(&mut blocks, &text[last..whole.start()]);

        let language = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let language = if language.is_empty() {
            DEFAULT_LANGUAGE
        } else {
            language
        };
        let body = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
        if !body.is_empty() {
            blocks.push(ContentBlock::code(language, body));
        }

        last = whole.end();
    }

    push_text(&mut blocks, &text[last..]);
    blocks
}

fn push_text(blocks: &mut Vec<ContentBlock>, segment: &str) {
    let segment = segment.trim();
    if !segment.is_empty() {
        blocks.push(ContentBlock::text(latex::normalize(segment)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prose_code_prose() {
        let blocks = segment("hello\n```js\nconsole.log(1)\n```\nworld");
        assert_eq!(
            blocks,
            vec![
                ContentBlock::text("hello"),
                ContentBlock::code("js", "console.log(1)"),
                ContentBlock::text("world"),
            ]
        );
    }

    #[test]
    fn adjacent_fences_produce_no_empty_text_between() {
        let blocks = segment("```rust\nfn a() {}\n```\n\n```\nplain\n```");
        assert_eq!(
            blocks,
            vec![
                ContentBlock::code("rust", "fn a() {}"),
                ContentBlock::code("plaintext", "plain"),
            ]
        );
    }

    #[test]
    fn missing_language_defaults_to_plaintext() {
        let blocks = segment("```\nx = 1\n```");
        assert_eq!(blocks, vec![ContentBlock::code("plaintext", "x = 1")]);
    }

    #[test]
    fn no_fences_yields_single_text_block() {
        assert_eq!(segment("  just text  "), vec![ContentBlock::text("just text")]);
        assert!(segment("   \n  ").is_empty());
        assert!(segment("").is_empty());
    }

    #[test]
    fn escaped_newlines_are_expanded_in_text_and_code() {
        let blocks = segment(r"Intro\n\n```python\nprint(1)\nprint(2)\n```\nDone");
        assert_eq!(
            blocks,
            vec![
                ContentBlock::text("Intro"),
                ContentBlock::code("python", "print(1)\nprint(2)"),
                ContentBlock::text("Done"),
            ]
        );
    }

    #[test]
    fn text_blocks_are_latex_normalized_but_code_is_not() {
        let blocks = segment("Solve \\(x^2\\)\n```tex\n\\(x^2\\)\n```");
        assert_eq!(
            blocks,
            vec![
                ContentBlock::text("Solve $x^2$"),
                ContentBlock::code("tex", "\\(x^2\\)"),
            ]
        );
    }

    #[test]
    fn empty_fence_is_dropped() {
        let blocks = segment("before ```py\n   \n``` after");
        assert_eq!(
            blocks,
            vec![ContentBlock::text("before"), ContentBlock::text("after")]
        );
    }

    #[test]
    fn unterminated_fence_stays_text() {
        let blocks = segment("look ```js\nlet a = 1;");
        assert_eq!(blocks, vec![ContentBlock::text("look ```js\nlet a = 1;")]);
    }
}
