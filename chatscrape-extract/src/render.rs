//! Flatten a message's markup into markdown-like text.
//!
//! Only the immediate children of the root are dispatched on. Each special tag
//! reads what it needs from its own subtree (a table reads its rows, a list its
//! items); everything else degrades to its plain text, inline. Nothing here
//! fails: a query that cannot run falls back to the element's text.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::dom::{DomNode, PageElement};
use crate::latex;

static LANGUAGE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"language-([a-zA-Z0-9]+)").expect("language class pattern"));

/// Class marking a rendered math span.
const MATH_SPAN_CLASS: &str = "katex";

pub fn render<E: PageElement>(root: &E) -> String {
    let mut out = String::new();
    for node in root.child_nodes() {
        match node {
            DomNode::Text(text) => out.push_str(text.trim()),
            DomNode::Element(el) => render_element(&el, &mut out),
        }
    }
    out.trim().to_string()
}

fn render_element<E: PageElement>(el: &E, out: &mut String) {
    match el.tag_name().as_str() {
        "h1" => push_line(out, "# ", &el.text_content()),
        "h2" => push_line(out, "## ", &el.text_content()),
        "h3" => push_line(out, "### ", &el.text_content()),
        "p" => push_line(out, "", &el.text_content()),
        "pre" => render_code_block(el, out),
        "table" => render_table(el, out),
        "ul" => render_list(el, out, false),
        "ol" => render_list(el, out, true),
        "span" => render_span(el, out),
        _ => out.push_str(el.text_content().trim()),
    }
}

/// Block-level line. Emitted even when the text is empty.
fn push_line(out: &mut String, prefix: &str, text: &str) {
    out.push_str(prefix);
    out.push_str(text.trim());
    out.push('\n');
}

fn render_code_block<E: PageElement>(pre: &E, out: &mut String) {
    let code = pre.query_first("code").ok().flatten();
    let (language, body) = match &code {
        Some(code) => (
            code.class_capture(&LANGUAGE_CLASS).unwrap_or_default(),
            code.text_content(),
        ),
        None => (String::new(), pre.text_content()),
    };
    out.push_str("```");
    out.push_str(&language);
    out.push('\n');
    out.push_str(body.trim());
    out.push_str("\n```\n");
}

fn render_table<E: PageElement>(table: &E, out: &mut String) {
    let rows = match table.query_all("tr") {
        Ok(rows) if !rows.is_empty() => rows,
        _ => {
            debug!(target: "extract.render", "table without rows, using text");
            out.push_str(table.text_content().trim());
            return;
        }
    };

    for (index, row) in rows.iter().enumerate() {
        let cells: Vec<String> = row
            .element_children()
            .iter()
            .map(|cell| cell.text_content().trim().to_string())
            .collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
        if index == 0 {
            let separator = vec!["---"; cells.len()].join(" | ");
            out.push_str(&format!("| {separator} |\n"));
        }
    }
}

fn render_list<E: PageElement>(list: &E, out: &mut String, ordered: bool) {
    let items = match list.query_all("li") {
        Ok(items) if !items.is_empty() => items,
        _ => {
            out.push_str(list.text_content().trim());
            return;
        }
    };

    for (index, item) in items.iter().enumerate() {
        let marker = if ordered {
            format!("{}. ", index + 1)
        } else {
            "- ".to_string()
        };
        out.push_str(&marker);
        out.push_str(item.text_content().trim());
        out.push('\n');
    }
}

fn render_span<E: PageElement>(span: &E, out: &mut String) {
    let text = span.text_content();
    if span.has_class(MATH_SPAN_CLASS) {
        out.push_str(&latex::normalize(text.trim()));
    } else {
        out.push_str(text.trim());
    }
}
