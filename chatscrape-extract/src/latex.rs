//! Math delimiter normalization.
//!
//! Chat pages and payloads carry LaTeX in `\(..\)` / `\[..\]` form; consumers
//! expect markdown math. Three passes, each over the whole string, always in
//! this order: inline math, block math, escaped quotes.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static INLINE_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\\((.*?)\\\)").expect("inline math pattern"));

static BLOCK_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\[(.*?)\\\]").expect("block math pattern"));

/// Rewrite `\(x\)` to `$x$`, `\[x\]` to `$$x$$`, and `\"` to `"`.
///
/// Inline bodies are trimmed and never span lines; block bodies are kept
/// verbatim and may span lines.
///
/// ```
/// use chatscrape_extract::latex::normalize;
///
/// assert_eq!(normalize(r"\( x+1 \)"), "$x+1$");
/// assert_eq!(normalize("\\[ a \n b \\]"), "$$ a \n b $$");
/// assert_eq!(normalize(r#"say \"hi\""#), r#"say "hi""#);
/// ```
pub fn normalize(text: &str) -> String {
    let inline = INLINE_MATH.replace_all(text, |caps: &Captures| format!("${}$", caps[1].trim()));
    let block = BLOCK_MATH.replace_all(&inline, |caps: &Captures| format!("$${}$$", &caps[1]));
    block.replace("\\\"", "\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_prose_is_unchanged() {
        for text in [
            "",
            "Just some words.",
            "Costs $5 and (maybe) [more]",
            "a backslash \\ alone\nand a newline",
        ] {
            assert_eq!(normalize(text), text);
        }
    }

    #[test]
    fn inline_math_becomes_single_dollar() {
        assert_eq!(normalize(r"\( x+1 \)"), "$x+1$");
        assert_eq!(
            normalize(r"Let \(a\) and \(b\) be sides."),
            "Let $a$ and $b$ be sides."
        );
    }

    #[test]
    fn inline_math_does_not_span_lines() {
        let text = "\\( a\nb \\)";
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn block_math_spans_lines_and_keeps_body() {
        assert_eq!(normalize("\\[ a \n b \\]"), "$$ a \n b $$");
        assert_eq!(
            normalize("before\n\\[\nE = mc^2\n\\]\nafter"),
            "before\n$$\nE = mc^2\n$$\nafter"
        );
    }

    #[test]
    fn escaped_quotes_are_unescaped_everywhere() {
        assert_eq!(
            normalize(r#"\(\text{\"q\"}\) and \"x\""#),
            r#"$\text{"q"}$ and "x""#
        );
    }

    #[test]
    fn mixed_inline_and_block() {
        assert_eq!(
            normalize("\\(x\\) then \\[y\\]"),
            "$x$ then $$y$$"
        );
    }
}
